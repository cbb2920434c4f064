//! Mock UART for the serial sensor link
//!
//! Requests land in a transmit log and response bytes are served from a
//! queue one read at a time, matching the byte-wise polling the sensor
//! adapter does. Write faults can be injected to exercise the adapter's
//! failure paths.

use crate::platform::error::UartError;
use crate::platform::{
    traits::{UartConfig, UartInterface},
    Result,
};
use core::cell::RefCell;
use std::collections::VecDeque;
use std::vec::Vec;

/// Mock UART implementation
#[derive(Debug)]
pub struct MockUart {
    config: UartConfig,
    tx_log: RefCell<Vec<u8>>,
    rx_queue: RefCell<VecDeque<u8>>,
    fail_writes: u32,
}

impl MockUart {
    /// Create a new mock UART
    pub fn new(config: UartConfig) -> Self {
        Self {
            config,
            tx_log: RefCell::new(Vec::new()),
            rx_queue: RefCell::new(VecDeque::new()),
            fail_writes: 0,
        }
    }

    /// Everything written so far (for test verification)
    pub fn tx_buffer(&self) -> Vec<u8> {
        self.tx_log.borrow().clone()
    }

    /// Queue response bytes for subsequent reads
    pub fn inject_rx_data(&mut self, data: &[u8]) {
        self.rx_queue.borrow_mut().extend(data.iter().copied());
    }

    /// Make the next `count` writes fail (`u32::MAX` for all)
    pub fn fail_writes(&mut self, count: u32) {
        self.fail_writes = count;
    }
}

impl UartInterface for MockUart {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.fail_writes > 0 {
            if self.fail_writes != u32::MAX {
                self.fail_writes -= 1;
            }
            return Err(UartError::WriteFailed.into());
        }
        self.tx_log.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut rx = self.rx_queue.borrow_mut();
        let mut count = 0;
        while count < buffer.len() {
            match rx.pop_front() {
                Some(byte) => {
                    buffer[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    fn set_baud_rate(&mut self, baud: u32) -> Result<()> {
        self.config.baud_rate = baud;
        Ok(())
    }

    fn available(&self) -> bool {
        !self.rx_queue.borrow().is_empty()
    }

    fn flush(&mut self) -> Result<()> {
        // Writes land in the log immediately
        Ok(())
    }
}
