//! Telemetry aggregation and wire encoding
//!
//! The aggregator snapshots the device reading slots into a single frame
//! with a per-source validity bitmask; the codec turns frames into uplink
//! payloads and downlink bytes into command frames.

pub mod aggregator;
pub mod codec;

pub use aggregator::{build_frame, AggregateFrame, ValidFlags};
pub use codec::{decode_command, encode_binary, encode_text, CodecError, FRAME_LEN};
