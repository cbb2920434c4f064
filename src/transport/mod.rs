//! Uplink transports
//!
//! Two paths carry telemetry off the device: the long-range radio (primary)
//! and an IP network link (fallback). The manager routes each frame to
//! exactly one path. Per-path connection state, retry backoff and failure
//! cooldown live in a shared session state machine.

pub mod manager;
pub mod network;
pub mod radio;
pub mod session;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use manager::{SendOutcome, TransportManager};
pub use network::{NetworkInterface, NetworkTransport};
pub use radio::{DutyCycleTracker, RadioInterface, RadioTransport};
pub use session::{SessionState, TransportSession};

/// Which path carried (or would carry) a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Radio,
    Network,
}

/// Transport-level failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Radio has not joined its network
    NotJoined,
    /// Link is connected but the exchange did not complete in time
    Timeout,
    /// Regulatory airtime budget for the current window is exhausted
    DutyCycleExhausted,
    /// Peer refused the connection or the message
    Rejected,
    /// Path is in a backoff or cooldown window
    Unavailable,
}

/// Transport result alias
pub type TxResult<T> = core::result::Result<T, TransportError>;

/// Link statistics, reported via the status command and cleared on request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Frames handed to a transport
    pub tx_count: u32,
    /// Frames acknowledged by a transport
    pub tx_success: u32,
    /// Frames no transport could carry
    pub tx_fail: u32,
    /// Downlink frames received
    pub rx_count: u32,
}

impl LinkStats {
    /// Reset all counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
