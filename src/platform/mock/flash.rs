//! Mock Flash implementation for testing
//!
//! Provides in-memory flash simulation for unit tests.

use crate::platform::{error::FlashError, traits::FlashInterface, Result};
use core::cell::RefCell;
use std::vec;
use std::vec::Vec;

/// Flash block size (4 KB)
const BLOCK_SIZE: u32 = 4096;

/// Flash capacity (2 MB)
const FLASH_CAPACITY: u32 = 2 * 1024 * 1024;

/// Firmware region (first 128 KB is write-protected)
const FIRMWARE_SIZE: u32 = 0x20000;

/// Mock Flash implementation
///
/// Simulates flash storage in memory for testing. Supports:
/// - Read/write/erase operations with real flash bit semantics (write can
///   only clear bits)
/// - Corruption injection for testing checksum recovery
/// - Power-loss simulation (partial write) for testing torn-write detection
#[derive(Debug)]
pub struct MockFlash {
    /// Flash storage (initialized to 0xFF - erased state)
    storage: RefCell<Vec<u8>>,
    /// Simulated power loss flag
    power_loss: RefCell<bool>,
}

impl MockFlash {
    /// Create a new mock flash instance
    pub fn new() -> Self {
        Self {
            storage: RefCell::new(vec![0xFF; FLASH_CAPACITY as usize]),
            power_loss: RefCell::new(false),
        }
    }

    /// Get flash contents (for test verification)
    pub fn get_contents(&self, address: u32, len: usize) -> Vec<u8> {
        let storage = self.storage.borrow();
        storage[address as usize..(address as usize + len)].to_vec()
    }

    /// Flip the byte at `address` (for testing checksum recovery)
    pub fn corrupt_byte(&mut self, address: u32) {
        let mut storage = self.storage.borrow_mut();
        storage[address as usize] ^= 0xFF;
    }

    /// Simulate power loss during the next write operation
    ///
    /// The next write will only partially complete, simulating power loss
    /// mid-operation for torn-write testing.
    pub fn simulate_power_loss(&mut self) {
        *self.power_loss.borrow_mut() = true;
    }

    fn is_writable(&self, address: u32) -> bool {
        (FIRMWARE_SIZE..FLASH_CAPACITY).contains(&address)
    }

    fn is_block_aligned(&self, address: u32) -> bool {
        address % BLOCK_SIZE == 0
    }
}

impl Default for MockFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashInterface for MockFlash {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        if address >= FLASH_CAPACITY || address as usize + buf.len() > FLASH_CAPACITY as usize {
            return Err(FlashError::InvalidAddress.into());
        }

        let storage = self.storage.borrow();
        buf.copy_from_slice(&storage[address as usize..(address as usize + buf.len())]);

        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        if !self.is_writable(address) {
            return Err(FlashError::InvalidAddress.into());
        }

        if address as usize + data.len() > FLASH_CAPACITY as usize {
            return Err(FlashError::InvalidAddress.into());
        }

        // Simulate power loss (partial write)
        let write_len = if *self.power_loss.borrow() {
            *self.power_loss.borrow_mut() = false;
            data.len() / 2
        } else {
            data.len()
        };

        // Flash can only change bits from 1 to 0
        let mut storage = self.storage.borrow_mut();
        for i in 0..write_len {
            storage[address as usize + i] &= data[i];
        }

        Ok(())
    }

    fn erase(&mut self, address: u32, size: u32) -> Result<()> {
        if !self.is_writable(address) {
            return Err(FlashError::InvalidAddress.into());
        }

        if !self.is_block_aligned(address) || size % BLOCK_SIZE != 0 {
            return Err(FlashError::InvalidAddress.into());
        }

        if address + size > FLASH_CAPACITY {
            return Err(FlashError::InvalidAddress.into());
        }

        let mut storage = self.storage.borrow_mut();
        for i in 0..size as usize {
            storage[address as usize + i] = 0xFF;
        }

        Ok(())
    }

    fn block_size(&self) -> u32 {
        BLOCK_SIZE
    }

    fn capacity(&self) -> u32 {
        FLASH_CAPACITY
    }
}
