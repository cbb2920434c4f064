//! Mock I2C implementation for testing

use crate::platform::error::I2cError;
use crate::platform::{
    traits::{I2cConfig, I2cInterface},
    Result,
};
use core::cell::RefCell;
use std::collections::VecDeque;
use std::vec::Vec;

/// I2C transaction type for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cTransaction {
    /// Write transaction
    Write { addr: u8, data: Vec<u8> },
    /// Read transaction
    Read { addr: u8, len: usize },
    /// Write-Read transaction
    WriteRead {
        addr: u8,
        write_data: Vec<u8>,
        read_len: usize,
    },
}

/// Mock I2C implementation
///
/// Records all transactions for test verification, allows pre-programming
/// read responses, and can inject NACKs to simulate bus faults.
#[derive(Debug)]
pub struct MockI2c {
    config: I2cConfig,
    transactions: RefCell<Vec<I2cTransaction>>,
    /// Queued read responses, consumed front-first
    read_queue: RefCell<VecDeque<Vec<u8>>>,
    /// Number of upcoming transactions that should NACK
    fail_next: RefCell<u32>,
}

impl MockI2c {
    /// Create a new mock I2C
    pub fn new(config: I2cConfig) -> Self {
        Self {
            config,
            transactions: RefCell::new(Vec::new()),
            read_queue: RefCell::new(VecDeque::new()),
            fail_next: RefCell::new(0),
        }
    }

    /// Get transaction log (for test verification)
    pub fn transactions(&self) -> Vec<I2cTransaction> {
        self.transactions.borrow().clone()
    }

    /// Clear transaction log
    pub fn clear_transactions(&mut self) {
        self.transactions.borrow_mut().clear();
    }

    /// Queue a response for the next read or write-read operation
    pub fn queue_read_data(&mut self, data: &[u8]) {
        self.read_queue.borrow_mut().push_back(data.to_vec());
    }

    /// Make the next `count` transactions fail with a NACK
    pub fn inject_nack(&mut self, count: u32) {
        *self.fail_next.borrow_mut() = count;
    }

    /// Get current frequency
    pub fn frequency(&self) -> u32 {
        self.config.frequency
    }

    fn check_fault(&self) -> Result<()> {
        let mut fail = self.fail_next.borrow_mut();
        if *fail > 0 {
            *fail -= 1;
            return Err(I2cError::Nack.into());
        }
        Ok(())
    }

    fn fill_from_queue(&self, buffer: &mut [u8]) {
        if let Some(data) = self.read_queue.borrow_mut().pop_front() {
            let to_copy = core::cmp::min(buffer.len(), data.len());
            buffer[..to_copy].copy_from_slice(&data[..to_copy]);
        }
    }
}

impl I2cInterface for MockI2c {
    fn write(&mut self, addr: u8, data: &[u8]) -> Result<()> {
        self.transactions.borrow_mut().push(I2cTransaction::Write {
            addr,
            data: data.to_vec(),
        });
        self.check_fault()
    }

    fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<()> {
        self.transactions.borrow_mut().push(I2cTransaction::Read {
            addr,
            len: buffer.len(),
        });
        self.check_fault()?;
        self.fill_from_queue(buffer);
        Ok(())
    }

    fn write_read(&mut self, addr: u8, write_data: &[u8], read_buffer: &mut [u8]) -> Result<()> {
        self.transactions
            .borrow_mut()
            .push(I2cTransaction::WriteRead {
                addr,
                write_data: write_data.to_vec(),
                read_len: read_buffer.len(),
            });
        self.check_fault()?;
        self.fill_from_queue(read_buffer);
        Ok(())
    }

    fn set_frequency(&mut self, frequency: u32) -> Result<()> {
        self.config.frequency = frequency;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_i2c_write() {
        let mut i2c = MockI2c::new(I2cConfig::default());
        i2c.write(0x70, &[0x01]).unwrap();

        let transactions = i2c.transactions();
        assert_eq!(transactions.len(), 1);
        assert_eq!(
            transactions[0],
            I2cTransaction::Write {
                addr: 0x70,
                data: vec![0x01]
            }
        );
    }

    #[test]
    fn test_mock_i2c_read_queue() {
        let mut i2c = MockI2c::new(I2cConfig::default());
        i2c.queue_read_data(&[0xAA, 0xBB, 0xCC]);

        let mut buffer = [0u8; 3];
        i2c.read(0x51, &mut buffer).unwrap();
        assert_eq!(buffer, [0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_mock_i2c_nack_injection() {
        let mut i2c = MockI2c::new(I2cConfig::default());
        i2c.inject_nack(1);

        assert!(i2c.write(0x70, &[0x01]).is_err());
        // Fault is consumed; next transaction succeeds
        assert!(i2c.write(0x70, &[0x02]).is_ok());
    }

    #[test]
    fn test_mock_i2c_write_read() {
        let mut i2c = MockI2c::new(I2cConfig::default());
        i2c.queue_read_data(&[0x12, 0x34]);

        let mut read_buf = [0u8; 2];
        i2c.write_read(0x52, &[0xA0], &mut read_buf).unwrap();
        assert_eq!(read_buf, [0x12, 0x34]);

        let transactions = i2c.transactions();
        assert_eq!(
            transactions[0],
            I2cTransaction::WriteRead {
                addr: 0x52,
                write_data: vec![0xA0],
                read_len: 2
            }
        );
    }
}
