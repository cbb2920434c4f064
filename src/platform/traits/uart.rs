//! UART interface trait
//!
//! This module defines the serial communication interface used by the
//! environmental sensor board link.

use crate::platform::Result;

/// UART configuration
#[derive(Debug, Clone, Copy)]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baud_rate: u32,
    /// Per-read timeout in milliseconds
    pub timeout_ms: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            timeout_ms: 100,
        }
    }
}

/// UART interface trait
///
/// Reads are non-blocking: `read` returns however many bytes are currently
/// buffered, possibly zero. Callers that need a complete message poll with a
/// bounded deadline; indefinite blocking is never allowed.
pub trait UartInterface {
    /// Write data, returning the number of bytes written
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Uart` if the transmit path fails.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read available data into `buffer`, returning the number of bytes read
    ///
    /// Returns `Ok(0)` when no data is pending.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Uart` on framing or overrun errors.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Set the baud rate
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Uart` if the baud rate is unsupported.
    fn set_baud_rate(&mut self, baud: u32) -> Result<()>;

    /// Check whether receive data is pending
    fn available(&self) -> bool;

    /// Block until all queued transmit data has left the peripheral
    fn flush(&mut self) -> Result<()>;
}
