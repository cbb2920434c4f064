//! Watchdog interface trait
//!
//! The hardware watchdog is re-armed once per control-loop iteration and is
//! the last line of defense against logic lockup: if the loop stops feeding
//! it, the device resets.

use crate::platform::Result;

/// Watchdog interface trait
pub trait WatchdogInterface {
    /// Start the watchdog with the given timeout
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Timer` if the timeout is out of range for the
    /// hardware counter.
    fn start(&mut self, timeout_ms: u32) -> Result<()>;

    /// Re-arm the watchdog counter
    fn feed(&mut self);

    /// Force an immediate system reset
    ///
    /// Used by the reboot downlink command after its acknowledgement has been
    /// transmitted.
    fn trigger_reset(&mut self);
}
