//! Platform abstraction traits
//!
//! This module defines the traits that platform implementations must provide.

pub mod adc;
pub mod flash;
pub mod i2c;
pub mod timer;
pub mod uart;
pub mod watchdog;

// Re-export trait interfaces
pub use adc::AdcInterface;
pub use flash::FlashInterface;
pub use i2c::{I2cConfig, I2cInterface};
pub use timer::TimerInterface;
pub use uart::{UartConfig, UartInterface};
pub use watchdog::WatchdogInterface;
