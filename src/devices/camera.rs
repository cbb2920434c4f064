//! Vision peripheral adapters
//!
//! Two identical smart-camera modules report object detections over I2C.
//! Both modules answer at the same fixed address, so each sits on its own
//! multiplexer channel and every exchange is select-then-read.
//!
//! Detection result register layout (12 bytes, big-endian fields):
//!
//! ```text
//! [0xD7][status][class][confidence][x:2][y:2][w:2][h:2]
//! ```
//!
//! status bit 0 set means the module has a detection from its current frame.
//! confidence is 0..=100; class is one of the four wire values below.

use super::{ReadOutcome, STALENESS_THRESHOLD};
use crate::platform::I2cInterface;
use crate::devices::mux::{BusMultiplexer, MuxError};

/// Fixed I2C address shared by both camera modules
pub const CAMERA_ADDRESS: u8 = 0x36;

/// Detection result register
const REG_DETECTION: u8 = 0x10;

/// First byte of every detection response
const RESPONSE_MAGIC: u8 = 0xD7;

/// Detection response length
const RESPONSE_LEN: usize = 12;

/// Number of camera modules in the array
pub const CAMERA_COUNT: usize = 2;

/// Multiplexer channels the modules are wired to
const CAMERA_CHANNELS: [u8; CAMERA_COUNT] = [0, 1];

/// Sensor frame dimensions, for bounding box validation
const FRAME_WIDTH: u16 = 320;
const FRAME_HEIGHT: u16 = 240;

/// Object class reported by a camera module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DetectionClass {
    Unknown = 0,
    Person = 1,
    Vehicle = 2,
    Animal = 3,
}

impl DetectionClass {
    /// Decode the wire value; anything outside the table is invalid data,
    /// not `Unknown`.
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unknown),
            1 => Some(Self::Person),
            2 => Some(Self::Vehicle),
            3 => Some(Self::Animal),
            _ => None,
        }
    }
}

/// One camera module's detection slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionReading {
    /// Which module produced this reading (0 or 1)
    pub source_id: u8,
    /// Detected object class
    pub class: DetectionClass,
    /// Detection confidence, 0.0..=1.0
    pub confidence: f32,
    /// Bounding box as x, y, width, height in frame pixels
    pub bounding_box: [u16; 4],
    /// Capture timestamp, milliseconds since boot
    pub captured_at_ms: u64,
    /// Whether the slot has ever held a valid reading
    pub valid: bool,
    /// Consecutive failed refreshes since the last success
    pub stale_count: u32,
}

impl DetectionReading {
    const fn empty(source_id: u8) -> Self {
        Self {
            source_id,
            class: DetectionClass::Unknown,
            confidence: 0.0,
            bounding_box: [0; 4],
            captured_at_ms: 0,
            valid: false,
            stale_count: 0,
        }
    }

    /// Whether this reading may contribute to an outbound frame
    pub fn usable(&self) -> bool {
        self.valid && self.stale_count <= STALENESS_THRESHOLD
    }
}

/// The two-camera array behind the bus multiplexer
///
/// Owns the I2C bus and the multiplexer driver so channel selection and the
/// subsequent register read cannot be interleaved by another bus user.
pub struct CameraArray<I: I2cInterface> {
    i2c: I,
    mux: BusMultiplexer,
    readings: [DetectionReading; CAMERA_COUNT],
}

impl<I: I2cInterface> CameraArray<I> {
    /// Create the array over the shared bus
    pub fn new(i2c: I) -> Self {
        Self {
            i2c,
            mux: BusMultiplexer::new(),
            readings: [DetectionReading::empty(0), DetectionReading::empty(1)],
        }
    }

    /// Current reading slot for one module
    pub fn reading(&self, index: usize) -> &DetectionReading {
        &self.readings[index]
    }

    /// Mutable access to the underlying bus (for tests)
    pub fn i2c_mut(&mut self) -> &mut I {
        &mut self.i2c
    }

    /// Poll one camera module: select its channel, read the detection
    /// register, validate and store.
    ///
    /// Bus faults and timeouts surface as staleness on the module's slot;
    /// the previously held value is never overwritten by bad data.
    pub fn poll(&mut self, index: usize, now_ms: u64) -> ReadOutcome {
        debug_assert!(index < CAMERA_COUNT);

        match self.mux.select_channel(&mut self.i2c, CAMERA_CHANNELS[index]) {
            Ok(()) => {}
            Err(MuxError::InvalidChannel(_)) | Err(MuxError::Bus) => {
                return self.mark_stale(index, ReadOutcome::Timeout);
            }
        }

        let mut response = [0u8; RESPONSE_LEN];
        if self
            .i2c
            .write_read(CAMERA_ADDRESS, &[REG_DETECTION], &mut response)
            .is_err()
        {
            return self.mark_stale(index, ReadOutcome::Timeout);
        }

        match parse_detection(index as u8, &response, now_ms) {
            Some(reading) => {
                self.readings[index] = reading;
                ReadOutcome::Updated
            }
            None => self.mark_stale(index, ReadOutcome::Invalid),
        }
    }

    /// Poll every module once, in channel order
    pub fn poll_all(&mut self, now_ms: u64) -> [ReadOutcome; CAMERA_COUNT] {
        let mut outcomes = [ReadOutcome::Timeout; CAMERA_COUNT];
        for index in 0..CAMERA_COUNT {
            outcomes[index] = self.poll(index, now_ms);
        }
        outcomes
    }

    /// Release the multiplexer so no downstream segment is driven
    ///
    /// Used during fault recovery; a wedged channel selection would
    /// otherwise survive a session restart.
    pub fn reset_bus(&mut self) {
        if self.mux.deselect_all(&mut self.i2c).is_err() {
            crate::log_warn!("bus multiplexer reset failed");
        }
    }

    fn mark_stale(&mut self, index: usize, outcome: ReadOutcome) -> ReadOutcome {
        let slot = &mut self.readings[index];
        slot.stale_count = slot.stale_count.saturating_add(1);
        outcome
    }
}

/// Validate and decode a detection response
fn parse_detection(source_id: u8, response: &[u8; RESPONSE_LEN], now_ms: u64) -> Option<DetectionReading> {
    if response[0] != RESPONSE_MAGIC {
        return None;
    }
    // status bit 0: detection present in the current frame
    if response[1] & 0x01 == 0 {
        return None;
    }

    let class = DetectionClass::from_wire(response[2])?;

    let raw_confidence = response[3];
    if raw_confidence > 100 {
        return None;
    }

    let x = u16::from_be_bytes([response[4], response[5]]);
    let y = u16::from_be_bytes([response[6], response[7]]);
    let w = u16::from_be_bytes([response[8], response[9]]);
    let h = u16::from_be_bytes([response[10], response[11]]);

    // Box must lie within the sensor frame
    if w == 0 || h == 0 {
        return None;
    }
    if u32::from(x) + u32::from(w) > u32::from(FRAME_WIDTH) {
        return None;
    }
    if u32::from(y) + u32::from(h) > u32::from(FRAME_HEIGHT) {
        return None;
    }

    Some(DetectionReading {
        source_id,
        class,
        confidence: f32::from(raw_confidence) / 100.0,
        bounding_box: [x, y, w, h],
        captured_at_ms: now_ms,
        valid: true,
        stale_count: 0,
    })
}
