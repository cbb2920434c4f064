//! Platform abstraction layer
//!
//! This module provides hardware abstraction for the gateway's peripherals.
//! All platform-specific code must stay behind these traits so the control
//! plane can be exercised on the host with the mock implementations.

pub mod error;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{PlatformError, Result};
pub use traits::{
    AdcInterface, FlashInterface, I2cInterface, TimerInterface, UartInterface, WatchdogInterface,
};
