//! Flash interface trait
//!
//! Non-volatile storage used for the persisted gateway configuration record.

use crate::platform::Result;

/// Flash interface trait
///
/// # Semantics
///
/// - `erase` sets the affected range to 0xFF
/// - `write` can only clear bits (1 -> 0); callers erase before rewriting
/// - Addresses passed to `erase` must be block-aligned
pub trait FlashInterface {
    /// Read `buf.len()` bytes starting at `address`
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash` if the range is out of bounds.
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()>;

    /// Write `data` starting at `address`
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash` if the range is out of bounds or
    /// in a write-protected region.
    fn write(&mut self, address: u32, data: &[u8]) -> Result<()>;

    /// Erase `size` bytes starting at block-aligned `address`
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash` if the address is misaligned or the
    /// range is out of bounds.
    fn erase(&mut self, address: u32, size: u32) -> Result<()>;

    /// Erase block size in bytes
    fn block_size(&self) -> u32;

    /// Total capacity in bytes
    fn capacity(&self) -> u32;
}
