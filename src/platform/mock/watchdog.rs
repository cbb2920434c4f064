//! Mock Watchdog implementation for testing

use crate::platform::{traits::WatchdogInterface, Result};
use core::cell::RefCell;
use std::rc::Rc;

/// Mock Watchdog implementation
///
/// Counts feeds and records reset requests. Cloned handles share state so
/// tests can observe the watchdog while the scheduler owns it.
#[derive(Debug, Clone, Default)]
pub struct MockWatchdog {
    inner: Rc<RefCell<WatchdogState>>,
}

#[derive(Debug, Default)]
struct WatchdogState {
    started_with_ms: Option<u32>,
    feed_count: u32,
    reset_requested: bool,
}

impl MockWatchdog {
    /// Create a new mock watchdog
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeout the watchdog was started with, if any
    pub fn started_with_ms(&self) -> Option<u32> {
        self.inner.borrow().started_with_ms
    }

    /// Number of times the watchdog was fed
    pub fn feed_count(&self) -> u32 {
        self.inner.borrow().feed_count
    }

    /// Whether a forced reset was requested
    pub fn reset_requested(&self) -> bool {
        self.inner.borrow().reset_requested
    }
}

impl WatchdogInterface for MockWatchdog {
    fn start(&mut self, timeout_ms: u32) -> Result<()> {
        self.inner.borrow_mut().started_with_ms = Some(timeout_ms);
        Ok(())
    }

    fn feed(&mut self) {
        self.inner.borrow_mut().feed_count += 1;
    }

    fn trigger_reset(&mut self) {
        self.inner.borrow_mut().reset_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_watchdog_feed_count() {
        let mut wdt = MockWatchdog::new();
        let observer = wdt.clone();

        wdt.start(8000).unwrap();
        wdt.feed();
        wdt.feed();

        assert_eq!(observer.started_with_ms(), Some(8000));
        assert_eq!(observer.feed_count(), 2);
        assert!(!observer.reset_requested());

        wdt.trigger_reset();
        assert!(observer.reset_requested());
    }
}
