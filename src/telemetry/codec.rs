//! Uplink and downlink wire codec
//!
//! Binary uplink frame, big-endian fields, fixed-point scaling:
//!
//! ```text
//! [type:1][temp:2][hum:2][pres:2][gas:2][flags:1]
//! ```
//!
//! Temperature is signed centidegrees, humidity centipercent, pressure
//! deci-hPa, gas resistance in raw ohms saturating at the u16 ceiling.
//! Fields whose validity bit is clear are encoded as zero and must be
//! ignored by the receiver.
//!
//! The text encoding is a key/value line for transports that carry strings.

use super::aggregator::{AggregateFrame, ValidFlags};
use crate::command::{CommandFrame, MAX_COMMAND_PAYLOAD};
use core::fmt::Write;
use heapless::{String, Vec};

/// Binary frame length
pub const FRAME_LEN: usize = 10;

/// Frame type byte for a periodic data uplink
pub const FRAME_TYPE_DATA: u8 = 0x01;

/// Text encoding capacity
pub const TEXT_LEN: usize = 160;

/// Downlink decode failures; anything malformed is rejected outright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// No command id byte present
    Undersized,
    /// Payload longer than any command accepts
    Oversized,
}

/// Encode a frame as the binary uplink payload
pub fn encode_binary(frame: &AggregateFrame) -> [u8; FRAME_LEN] {
    let mut out = [0u8; FRAME_LEN];
    out[0] = FRAME_TYPE_DATA;

    if frame.flags.contains(ValidFlags::SENSOR) {
        let temp = scale_i16(frame.sensor.temperature, 100.0);
        let hum = scale_u16(frame.sensor.humidity, 100.0);
        let pres = scale_u16(frame.sensor.pressure, 10.0);
        let gas = scale_u16(frame.sensor.gas_resistance, 1.0);

        out[1..3].copy_from_slice(&temp.to_be_bytes());
        out[3..5].copy_from_slice(&hum.to_be_bytes());
        out[5..7].copy_from_slice(&pres.to_be_bytes());
        out[7..9].copy_from_slice(&gas.to_be_bytes());
    }

    out[9] = frame.flags.bits();
    out
}

/// Encode a frame as a key/value text line
pub fn encode_text(frame: &AggregateFrame) -> String<TEXT_LEN> {
    let mut line: String<TEXT_LEN> = String::new();
    let _ = write!(line, "seq={},flags={:02X}", frame.sequence, frame.flags.bits());

    if frame.flags.contains(ValidFlags::SENSOR) {
        let _ = write!(
            line,
            ",t={:.2},h={:.2},p={:.1},g={}",
            frame.sensor.temperature,
            frame.sensor.humidity,
            frame.sensor.pressure,
            frame.sensor.gas_resistance as u32
        );
    }

    let camera_bits = [ValidFlags::CAMERA_0, ValidFlags::CAMERA_1];
    for (index, bit) in camera_bits.iter().enumerate() {
        if frame.flags.contains(*bit) {
            let d = &frame.detections[index];
            let _ = write!(
                line,
                ",c{}={}:{}",
                index,
                d.class as u8,
                (d.confidence * 100.0) as u8
            );
        }
    }

    line
}

/// Decode raw downlink bytes into a command frame
///
/// Only structural checks happen here. Whether the id is known and the
/// payload length and values are acceptable is the command handler's job.
pub fn decode_command(bytes: &[u8]) -> Result<CommandFrame, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::Undersized);
    }
    if bytes.len() > 1 + MAX_COMMAND_PAYLOAD {
        return Err(CodecError::Oversized);
    }

    let mut payload: Vec<u8, MAX_COMMAND_PAYLOAD> = Vec::new();
    // Length checked above
    let _ = payload.extend_from_slice(&bytes[1..]);

    Ok(CommandFrame {
        id: bytes[0],
        payload,
    })
}

/// Fixed-point scale with round-to-nearest, saturating at the i16 range
fn scale_i16(value: f32, factor: f32) -> i16 {
    let scaled = value * factor;
    let rounded = if scaled >= 0.0 {
        (scaled + 0.5) as i32
    } else {
        (scaled - 0.5) as i32
    };
    rounded.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Fixed-point scale with round-to-nearest, saturating at the u16 range
fn scale_u16(value: f32, factor: f32) -> u16 {
    let scaled = value * factor;
    if scaled <= 0.0 {
        return 0;
    }
    let rounded = (scaled + 0.5) as u32;
    rounded.min(u16::MAX as u32) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::camera::DetectionClass;
    use crate::devices::{DetectionReading, SensorReading};
    use crate::telemetry::aggregator::build_frame;

    fn sensor(valid: bool) -> SensorReading {
        SensorReading {
            temperature: 23.5,
            humidity: 45.0,
            pressure: 1013.2,
            gas_resistance: 50_000.0,
            captured_at_ms: 0,
            valid,
            stale_count: 0,
        }
    }

    fn detection(source_id: u8, valid: bool) -> DetectionReading {
        DetectionReading {
            source_id,
            class: DetectionClass::Animal,
            confidence: 0.87,
            bounding_box: [1, 2, 3, 4],
            captured_at_ms: 0,
            valid,
            stale_count: 0,
        }
    }

    #[test]
    fn test_binary_encoding_scales_fields() {
        let frame = build_frame(1, &sensor(true), &[detection(0, true), detection(1, true)], 0);
        let bytes = encode_binary(&frame);

        assert_eq!(bytes[0], FRAME_TYPE_DATA);
        assert_eq!(i16::from_be_bytes([bytes[1], bytes[2]]), 2350);
        assert_eq!(u16::from_be_bytes([bytes[3], bytes[4]]), 4500);
        assert_eq!(u16::from_be_bytes([bytes[5], bytes[6]]), 10132);
        // Gas rides the wire in raw ohms
        assert_eq!(u16::from_be_bytes([bytes[7], bytes[8]]), 50_000);
        assert_eq!(bytes[9], 0b0000_0111);
    }

    #[test]
    fn test_negative_temperature_encodes_signed() {
        let mut s = sensor(true);
        s.temperature = -12.34;
        let frame = build_frame(0, &s, &[detection(0, false), detection(1, false)], 0);
        let bytes = encode_binary(&frame);

        assert_eq!(i16::from_be_bytes([bytes[1], bytes[2]]), -1234);
    }

    #[test]
    fn test_invalid_sensor_zeroes_fields() {
        let frame = build_frame(0, &sensor(false), &[detection(0, true), detection(1, false)], 0);
        let bytes = encode_binary(&frame);

        assert_eq!(&bytes[1..9], &[0u8; 8]);
        assert_eq!(bytes[9], 0b0000_0010);
    }

    #[test]
    fn test_gas_saturates_at_u16_range() {
        let mut s = sensor(true);
        s.gas_resistance = 9_000_000.0;
        let frame = build_frame(0, &s, &[detection(0, false), detection(1, false)], 0);
        let bytes = encode_binary(&frame);

        assert_eq!(u16::from_be_bytes([bytes[7], bytes[8]]), u16::MAX);
    }

    #[test]
    fn test_text_encoding_skips_invalid_sources() {
        let frame = build_frame(9, &sensor(false), &[detection(0, true), detection(1, false)], 0);
        let line = encode_text(&frame);

        assert_eq!(line.as_str(), "seq=9,flags=02,c0=3:87");
    }

    #[test]
    fn test_text_encoding_full_frame() {
        let frame = build_frame(1, &sensor(true), &[detection(0, true), detection(1, true)], 0);
        let line = encode_text(&frame);

        assert_eq!(
            line.as_str(),
            "seq=1,flags=07,t=23.50,h=45.00,p=1013.2,g=50000,c0=3:87,c1=3:87"
        );
    }

    #[test]
    fn test_decode_command_splits_id_and_payload() {
        let frame = decode_command(&[0x01, 0x60, 0xEA, 0x00, 0x00]).unwrap();
        assert_eq!(frame.id, 0x01);
        assert_eq!(frame.payload.as_slice(), &[0x60, 0xEA, 0x00, 0x00]);
    }

    #[test]
    fn test_decode_command_rejects_empty() {
        assert_eq!(decode_command(&[]), Err(CodecError::Undersized));
    }

    #[test]
    fn test_decode_command_rejects_oversized() {
        let bytes = [0u8; 18];
        assert_eq!(decode_command(&bytes), Err(CodecError::Oversized));
    }
}
