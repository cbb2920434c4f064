//! Gateway control loop
//!
//! A cooperative, single-threaded state machine driven by `tick()` calls
//! from the outer firmware loop. Every tick feeds the watchdog, runs one
//! state's worth of work and returns; no state blocks longer than its
//! peripheral timeouts allow.

pub mod scheduler;

pub use scheduler::Gateway;

/// Control loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    /// One-time setup: watchdog arming, config load, radio parameters
    Init,
    /// Bounded radio join phase
    ConnectRadio,
    /// Bounded network bring-up phase after the radio phase gave up
    ConnectNetwork,
    /// Hub state: drains downlinks, persists config, dispatches work
    Idle,
    /// One round of peripheral request/response exchanges
    ReadPeripherals,
    /// Aggregate and hand one frame to the transport manager
    Transmit,
    /// Sleep until just before the next deadline
    LowPower,
    /// Fault threshold crossed; about to recover
    Error,
    /// Tear down sessions and restart the connect phase
    Recovery,
}
