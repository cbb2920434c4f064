//! Frame aggregation
//!
//! Pure snapshot logic: copies the current device reading slots into an
//! [`AggregateFrame`] and computes the validity bitmask. A source's bit is
//! set only when its slot holds a valid reading that has not exceeded the
//! staleness threshold; the receiver must ignore field values whose bit is
//! clear.

use crate::devices::camera::CAMERA_COUNT;
use crate::devices::{DetectionReading, SensorReading};
use bitflags::bitflags;

bitflags! {
    /// Per-source validity bitmask carried in every frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ValidFlags: u8 {
        const SENSOR = 1 << 0;
        const CAMERA_0 = 1 << 1;
        const CAMERA_1 = 1 << 2;
    }
}

/// One aggregated telemetry frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateFrame {
    /// Wrapping frame sequence number
    pub sequence: u16,
    /// Which sources contributed usable data
    pub flags: ValidFlags,
    /// Environmental reading snapshot
    pub sensor: SensorReading,
    /// Camera detection snapshots
    pub detections: [DetectionReading; CAMERA_COUNT],
    /// Aggregation timestamp, milliseconds since boot
    pub captured_at_ms: u64,
}

/// Snapshot the reading slots into a frame
pub fn build_frame(
    sequence: u16,
    sensor: &SensorReading,
    detections: &[DetectionReading; CAMERA_COUNT],
    now_ms: u64,
) -> AggregateFrame {
    let mut flags = ValidFlags::empty();
    if sensor.usable() {
        flags |= ValidFlags::SENSOR;
    }
    if detections[0].usable() {
        flags |= ValidFlags::CAMERA_0;
    }
    if detections[1].usable() {
        flags |= ValidFlags::CAMERA_1;
    }

    AggregateFrame {
        sequence,
        flags,
        sensor: *sensor,
        detections: *detections,
        captured_at_ms: now_ms,
    }
}
