//! Mock platform implementations for host testing
//!
//! These mocks record transactions, allow injecting receive data and bus
//! faults, and simulate flash corruption and power loss, so the whole control
//! plane can be exercised without hardware.

pub mod adc;
pub mod flash;
pub mod i2c;
pub mod timer;
pub mod uart;
pub mod watchdog;

pub use adc::MockAdc;
pub use flash::MockFlash;
pub use i2c::{I2cTransaction, MockI2c};
pub use timer::MockTimer;
pub use uart::MockUart;
pub use watchdog::MockWatchdog;
