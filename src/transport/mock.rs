//! Mock transports for testing
//!
//! Record traffic, serve queued downlinks, and fail on demand so routing
//! and backoff logic can be exercised without hardware.

use super::network::NetworkInterface;
use super::radio::RadioInterface;
use super::{TransportError, TxResult};
use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

/// Mock radio modem
#[derive(Debug, Default)]
pub struct MockRadio {
    joined: bool,
    fail_joins: u32,
    fail_sends: u32,
    sent: Vec<Vec<u8>>,
    send_attempts: u32,
    rx_queue: VecDeque<Vec<u8>>,
    data_rate: Option<u8>,
    tx_power: Option<i8>,
    adr: Option<bool>,
}

impl MockRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` join attempts fail (`u32::MAX` for all)
    pub fn fail_joins(&mut self, count: u32) {
        self.fail_joins = count;
    }

    /// Make the next `count` sends fail (`u32::MAX` for all, 0 to clear)
    pub fn fail_sends(&mut self, count: u32) {
        self.fail_sends = count;
    }

    /// Queue a downlink frame for the next receive call
    pub fn queue_downlink(&mut self, bytes: &[u8]) {
        self.rx_queue.push_back(bytes.to_vec());
    }

    /// Frames successfully transmitted
    pub fn sent_frames(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Total send calls, including failed ones
    pub fn send_attempts(&self) -> u32 {
        self.send_attempts
    }

    pub fn data_rate(&self) -> Option<u8> {
        self.data_rate
    }

    pub fn tx_power(&self) -> Option<i8> {
        self.tx_power
    }

    pub fn adr(&self) -> Option<bool> {
        self.adr
    }

    /// `u32::MAX` means "fail forever" and is not decremented
    fn take_fault(counter: &mut u32) -> bool {
        if *counter == 0 {
            return false;
        }
        if *counter != u32::MAX {
            *counter -= 1;
        }
        true
    }
}

impl RadioInterface for MockRadio {
    fn join(&mut self) -> TxResult<()> {
        if Self::take_fault(&mut self.fail_joins) {
            return Err(TransportError::Timeout);
        }
        self.joined = true;
        Ok(())
    }

    fn send(&mut self, payload: &[u8]) -> TxResult<()> {
        self.send_attempts += 1;
        if !self.joined {
            return Err(TransportError::NotJoined);
        }
        if Self::take_fault(&mut self.fail_sends) {
            return Err(TransportError::Timeout);
        }
        self.sent.push(payload.to_vec());
        Ok(())
    }

    fn receive(&mut self, buffer: &mut [u8]) -> TxResult<usize> {
        match self.rx_queue.pop_front() {
            Some(frame) => {
                let len = frame.len().min(buffer.len());
                buffer[..len].copy_from_slice(&frame[..len]);
                Ok(len)
            }
            None => Ok(0),
        }
    }

    fn set_data_rate(&mut self, data_rate: u8) -> TxResult<()> {
        self.data_rate = Some(data_rate);
        Ok(())
    }

    fn set_tx_power(&mut self, dbm: i8) -> TxResult<()> {
        self.tx_power = Some(dbm);
        Ok(())
    }

    fn set_adr(&mut self, enabled: bool) -> TxResult<()> {
        self.adr = Some(enabled);
        Ok(())
    }
}

/// Mock network link
#[derive(Debug, Default)]
pub struct MockNetwork {
    connected: bool,
    fail_connects: u32,
    fail_publishes: u32,
    published: Vec<(String, Vec<u8>)>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` connect attempts fail (`u32::MAX` for all)
    pub fn fail_connects(&mut self, count: u32) {
        self.fail_connects = count;
    }

    /// Make the next `count` publishes fail (`u32::MAX` for all)
    pub fn fail_publishes(&mut self, count: u32) {
        self.fail_publishes = count;
    }

    /// Published (topic, payload) pairs
    pub fn published(&self) -> &[(String, Vec<u8>)] {
        &self.published
    }
}

impl NetworkInterface for MockNetwork {
    fn connect(&mut self) -> TxResult<()> {
        if MockRadio::take_fault(&mut self.fail_connects) {
            return Err(TransportError::Timeout);
        }
        self.connected = true;
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> TxResult<()> {
        if !self.connected {
            return Err(TransportError::Rejected);
        }
        if MockRadio::take_fault(&mut self.fail_publishes) {
            return Err(TransportError::Timeout);
        }
        self.published.push((String::from(topic), payload.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_radio_requires_join() {
        let mut radio = MockRadio::new();
        assert_eq!(radio.send(&[1]), Err(TransportError::NotJoined));

        radio.join().unwrap();
        radio.send(&[1, 2]).unwrap();
        assert_eq!(radio.sent_frames(), &[vec![1, 2]]);
    }

    #[test]
    fn test_mock_radio_fault_injection() {
        let mut radio = MockRadio::new();
        radio.join().unwrap();
        radio.fail_sends(1);

        assert!(radio.send(&[1]).is_err());
        assert!(radio.send(&[2]).is_ok());
        assert_eq!(radio.send_attempts(), 2);
    }

    #[test]
    fn test_mock_radio_downlink_queue() {
        let mut radio = MockRadio::new();
        radio.queue_downlink(&[0xAA, 0xBB]);

        let mut buffer = [0u8; 8];
        assert_eq!(radio.receive(&mut buffer), Ok(2));
        assert_eq!(&buffer[..2], &[0xAA, 0xBB]);
        assert_eq!(radio.receive(&mut buffer), Ok(0));
    }

    #[test]
    fn test_mock_network_records_topic() {
        let mut network = MockNetwork::new();
        network.connect().unwrap();
        network.publish("a/b", &[1]).unwrap();

        assert_eq!(network.published()[0].0, "a/b");
    }
}
