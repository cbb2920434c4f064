//! Bus multiplexer driver
//!
//! The two vision peripherals share one I2C address, so they sit behind a
//! TCA9548A-style channel multiplexer. Selecting a channel routes the bus to
//! exactly one downstream segment; writing the channel bitmask to the mux's
//! control register is the entire protocol.

use crate::platform::{I2cInterface, Result};

/// Default multiplexer address (TCA9548A)
pub const MUX_ADDRESS: u8 = 0x70;

/// Number of downstream channels
pub const CHANNEL_COUNT: u8 = 8;

/// Multiplexer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxError {
    /// Channel index out of range; caller error, never clamped
    InvalidChannel(u8),
    /// Bus-level fault; the previous selection is unchanged
    Bus,
}

/// Bus multiplexer driver
///
/// Tracks the last successfully selected channel so redundant select writes
/// can be skipped. On a bus fault the cached selection is cleared: the mux
/// state is then unknown and the next select always re-issues the write.
#[derive(Debug)]
pub struct BusMultiplexer {
    address: u8,
    selected: Option<u8>,
}

impl BusMultiplexer {
    /// Create a driver for a multiplexer at the default address
    pub fn new() -> Self {
        Self::with_address(MUX_ADDRESS)
    }

    /// Create a driver for a multiplexer at a non-default address
    pub fn with_address(address: u8) -> Self {
        Self {
            address,
            selected: None,
        }
    }

    /// Select a downstream channel
    ///
    /// # Errors
    ///
    /// - `MuxError::InvalidChannel` if `channel >= CHANNEL_COUNT`
    /// - `MuxError::Bus` if the multiplexer does not acknowledge; the
    ///   previous hardware selection is left unchanged
    pub fn select_channel<I: I2cInterface>(
        &mut self,
        i2c: &mut I,
        channel: u8,
    ) -> core::result::Result<(), MuxError> {
        if channel >= CHANNEL_COUNT {
            return Err(MuxError::InvalidChannel(channel));
        }

        if self.selected == Some(channel) {
            return Ok(());
        }

        match i2c.write(self.address, &[1u8 << channel]) {
            Ok(()) => {
                self.selected = Some(channel);
                Ok(())
            }
            Err(_) => {
                // Hardware state is now unknown
                self.selected = None;
                Err(MuxError::Bus)
            }
        }
    }

    /// Disconnect all downstream channels
    ///
    /// The cached selection is cleared first; even on a bus fault the next
    /// select re-issues its write.
    pub fn deselect_all<I: I2cInterface>(&mut self, i2c: &mut I) -> Result<()> {
        self.selected = None;
        i2c.write(self.address, &[0x00])?;
        Ok(())
    }

    /// Last successfully selected channel, if known
    pub fn selected(&self) -> Option<u8> {
        self.selected
    }
}

impl Default for BusMultiplexer {
    fn default() -> Self {
        Self::new()
    }
}
