//! Device drivers using platform abstraction
//!
//! Each adapter owns its reading slot and its retry/validation policy. An
//! invalid or timed-out exchange never overwrites a previously good value;
//! the slot's staleness count increments instead.

pub mod camera;
pub mod env_sensor;
pub mod mux;

pub use camera::{CameraArray, DetectionClass, DetectionReading};
pub use env_sensor::{EnvSensorAdapter, SensorReading};
pub use mux::{BusMultiplexer, MuxError};

/// Number of refresh cycles a reading may miss before it is excluded from
/// the outbound validity bitmask even though a stale value is still held.
pub const STALENESS_THRESHOLD: u32 = 3;

/// Outcome of a single peripheral request/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A fresh, range-valid reading was stored
    Updated,
    /// The peripheral did not answer within the bounded timeout
    Timeout,
    /// The peripheral answered but the data failed validation
    Invalid,
}
