//! Mock Timer implementation for testing

use crate::platform::{traits::TimerInterface, Result};
use core::cell::RefCell;
use std::rc::Rc;

/// Mock Timer implementation
///
/// Simulated millisecond clock. `delay_ms` advances the clock instead of
/// sleeping, and cloned handles share the same clock so tests can advance
/// time while a driver or the scheduler holds its own handle.
#[derive(Debug, Clone)]
pub struct MockTimer {
    now_ms: Rc<RefCell<u64>>,
}

impl MockTimer {
    /// Create a new mock timer at t=0
    pub fn new() -> Self {
        Self {
            now_ms: Rc::new(RefCell::new(0)),
        }
    }

    /// Advance the simulated clock
    pub fn advance_ms(&self, ms: u64) {
        *self.now_ms.borrow_mut() += ms;
    }

    /// Set the simulated clock to an absolute value
    pub fn set_ms(&self, ms: u64) {
        *self.now_ms.borrow_mut() = ms;
    }
}

impl Default for MockTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerInterface for MockTimer {
    fn now_ms(&self) -> u64 {
        *self.now_ms.borrow()
    }

    fn delay_ms(&mut self, ms: u32) -> Result<()> {
        *self.now_ms.borrow_mut() += ms as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_timer_delay_advances_clock() {
        let mut timer = MockTimer::new();
        assert_eq!(timer.now_ms(), 0);

        timer.delay_ms(1000).unwrap();
        assert_eq!(timer.now_ms(), 1000);

        timer.delay_ms(500).unwrap();
        assert_eq!(timer.now_ms(), 1500);
    }

    #[test]
    fn test_mock_timer_shared_handles() {
        let timer = MockTimer::new();
        let handle = timer.clone();

        handle.advance_ms(2500);
        assert_eq!(timer.now_ms(), 2500);
    }
}
