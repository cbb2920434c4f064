//! Timer interface trait
//!
//! Wall-clock timekeeping for the scheduler's due-timer evaluation and for
//! bounded waits. Backed by a hardware timer interrupt on real targets.

use crate::platform::Result;

/// Timer interface trait
pub trait TimerInterface {
    /// Milliseconds since boot
    fn now_ms(&self) -> u64;

    /// Block for `ms` milliseconds
    ///
    /// This is the only form of waiting in the system; every call site passes
    /// a bounded value derived from a timeout or the low-power sleep budget.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Timer` if the duration is unrepresentable.
    fn delay_ms(&mut self, ms: u32) -> Result<()>;
}
