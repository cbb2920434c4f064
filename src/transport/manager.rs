//! Transport routing
//!
//! Every frame goes to exactly one path. The radio is always tried first;
//! the network path only carries a frame the radio could not, and only when
//! fallback is enabled. A frame neither path could carry is dropped, never
//! queued, so telemetry stays current rather than replaying a backlog after
//! an outage.

use super::network::{NetworkInterface, NetworkTransport};
use super::radio::{RadioInterface, RadioTransport};
use super::{LinkStats, TransportKind, TxResult};
use crate::telemetry::codec::{encode_binary, encode_text};
use crate::telemetry::AggregateFrame;

/// How a frame left the device, if it did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent(TransportKind),
    Dropped,
}

/// Routes frames between the radio and network paths
pub struct TransportManager<R: RadioInterface, N: NetworkInterface> {
    radio: RadioTransport<R>,
    network: NetworkTransport<N>,
    stats: LinkStats,
}

impl<R: RadioInterface, N: NetworkInterface> TransportManager<R, N> {
    pub fn new(radio: RadioTransport<R>, network: NetworkTransport<N>) -> Self {
        Self {
            radio,
            network,
            stats: LinkStats::default(),
        }
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn radio(&mut self) -> &mut RadioTransport<R> {
        &mut self.radio
    }

    pub fn network(&mut self) -> &mut NetworkTransport<N> {
        &mut self.network
    }

    /// Whether the radio path is joined
    pub fn radio_connected(&self) -> bool {
        self.radio.session().is_connected()
    }

    /// Drive a radio join attempt if one is due
    pub fn ensure_radio(&mut self, now_ms: u64) -> TxResult<()> {
        self.radio.connect(now_ms)
    }

    /// Send one frame over exactly one path
    pub fn send_aggregate(
        &mut self,
        frame: &AggregateFrame,
        now_ms: u64,
        fallback_enabled: bool,
    ) -> SendOutcome {
        self.stats.tx_count = self.stats.tx_count.wrapping_add(1);

        let radio_result = self
            .radio
            .connect(now_ms)
            .and_then(|_| self.radio.send_frame(&encode_binary(frame), now_ms));

        if radio_result.is_ok() {
            self.stats.tx_success = self.stats.tx_success.wrapping_add(1);
            return SendOutcome::Sent(TransportKind::Radio);
        }

        if fallback_enabled {
            let line = encode_text(frame);
            if self.network.send_line(line.as_bytes(), now_ms).is_ok() {
                self.stats.tx_success = self.stats.tx_success.wrapping_add(1);
                return SendOutcome::Sent(TransportKind::Network);
            }
        }

        self.stats.tx_fail = self.stats.tx_fail.wrapping_add(1);
        crate::log_warn!("frame {} dropped, no transport available", frame.sequence);
        SendOutcome::Dropped
    }

    /// Fetch pending downlink bytes from the radio
    pub fn poll_downlink(&mut self, buffer: &mut [u8]) -> Option<usize> {
        match self.radio.receive(buffer) {
            Ok(0) | Err(_) => None,
            Ok(len) => {
                self.stats.rx_count = self.stats.rx_count.wrapping_add(1);
                Some(len)
            }
        }
    }

    /// Mutable counter access for the command layer (clear-stats)
    pub fn stats_mut(&mut self) -> &mut LinkStats {
        &mut self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{DetectionReading, SensorReading};
    use crate::telemetry::aggregator::build_frame;
    use crate::transport::mock::{MockNetwork, MockRadio};
    use crate::transport::session::{COOLDOWN_MS, MAX_CONSECUTIVE_FAILURES};
    use crate::transport::TransportKind;

    fn frame(sequence: u16) -> AggregateFrame {
        let sensor = SensorReading {
            temperature: 20.0,
            humidity: 50.0,
            pressure: 1000.0,
            gas_resistance: 40_000.0,
            captured_at_ms: 0,
            valid: true,
            stale_count: 0,
        };
        let detections = [
            DetectionReading {
                source_id: 0,
                class: crate::devices::camera::DetectionClass::Unknown,
                confidence: 0.0,
                bounding_box: [0; 4],
                captured_at_ms: 0,
                valid: false,
                stale_count: 0,
            };
            2
        ];
        build_frame(sequence, &sensor, &detections, 0)
    }

    fn manager(radio: MockRadio, network: MockNetwork) -> TransportManager<MockRadio, MockNetwork> {
        TransportManager::new(RadioTransport::new(radio, 3), NetworkTransport::new(network))
    }

    #[test]
    fn test_radio_success_never_touches_network() {
        let mut mgr = manager(MockRadio::new(), MockNetwork::new());

        let outcome = mgr.send_aggregate(&frame(1), 0, true);
        assert_eq!(outcome, SendOutcome::Sent(TransportKind::Radio));

        assert_eq!(mgr.radio().radio_mut().sent_frames().len(), 1);
        assert!(mgr.network().network_mut().published().is_empty());
        assert_eq!(mgr.stats().tx_success, 1);
    }

    #[test]
    fn test_radio_failure_falls_back_to_network() {
        let mut radio = MockRadio::new();
        radio.fail_joins(u32::MAX);
        let mut mgr = manager(radio, MockNetwork::new());

        let outcome = mgr.send_aggregate(&frame(1), 0, true);
        assert_eq!(outcome, SendOutcome::Sent(TransportKind::Network));
        assert_eq!(mgr.network().network_mut().published().len(), 1);
        assert_eq!(mgr.stats().tx_success, 1);
    }

    #[test]
    fn test_fallback_disabled_drops_frame() {
        let mut radio = MockRadio::new();
        radio.fail_joins(u32::MAX);
        let mut mgr = manager(radio, MockNetwork::new());

        let outcome = mgr.send_aggregate(&frame(1), 0, false);
        assert_eq!(outcome, SendOutcome::Dropped);
        assert!(mgr.network().network_mut().published().is_empty());
        assert_eq!(mgr.stats().tx_fail, 1);
    }

    #[test]
    fn test_repeated_radio_send_failures_route_to_network_until_cooldown() {
        let mut radio = MockRadio::new();
        radio.fail_sends(u32::MAX);
        let mut mgr = manager(radio, MockNetwork::new());
        mgr.ensure_radio(0).unwrap();

        // Each failed radio send falls back to the network
        let mut now = 0;
        for seq in 0..MAX_CONSECUTIVE_FAILURES as u16 {
            let outcome = mgr.send_aggregate(&frame(seq), now, true);
            assert_eq!(outcome, SendOutcome::Sent(TransportKind::Network));
            now += 1_000;
        }

        // Radio is now in cooldown; no further modem traffic
        let sends_before = mgr.radio().radio_mut().send_attempts();
        mgr.send_aggregate(&frame(99), now, true);
        assert_eq!(mgr.radio().radio_mut().send_attempts(), sends_before);

        // After the cooldown the radio is retried
        mgr.radio().radio_mut().fail_sends(0);
        let outcome = mgr.send_aggregate(&frame(100), now + COOLDOWN_MS, true);
        assert_eq!(outcome, SendOutcome::Sent(TransportKind::Radio));
    }

    #[test]
    fn test_repeated_join_failures_put_radio_in_cooldown() {
        let mut radio = MockRadio::new();
        radio.fail_joins(u32::MAX);
        let mut mgr = manager(radio, MockNetwork::new());

        assert!(mgr.ensure_radio(0).is_err());
        assert!(mgr.ensure_radio(1_000).is_err());
        assert!(mgr.ensure_radio(3_000).is_err());

        // Third join failure took the radio path down; well after the short
        // backoffs would have expired, frames still ride the fallback
        mgr.radio().radio_mut().fail_joins(0);
        let outcome = mgr.send_aggregate(&frame(1), 30_000, true);
        assert_eq!(outcome, SendOutcome::Sent(TransportKind::Network));

        // Cooldown over: the join is retried and the radio carries traffic
        let outcome = mgr.send_aggregate(&frame(2), 3_000 + COOLDOWN_MS, true);
        assert_eq!(outcome, SendOutcome::Sent(TransportKind::Radio));
    }

    #[test]
    fn test_both_paths_down_drops_without_queueing() {
        let mut radio = MockRadio::new();
        radio.fail_joins(u32::MAX);
        let mut network = MockNetwork::new();
        network.fail_connects(u32::MAX);
        let mut mgr = manager(radio, network);

        assert_eq!(mgr.send_aggregate(&frame(1), 0, true), SendOutcome::Dropped);
        assert_eq!(mgr.stats().tx_fail, 1);

        // Recovery carries only the new frame, not the dropped one
        mgr.radio().radio_mut().fail_joins(0);
        let outcome = mgr.send_aggregate(&frame(2), 120_000, true);
        assert_eq!(outcome, SendOutcome::Sent(TransportKind::Radio));
        assert_eq!(mgr.radio().radio_mut().sent_frames().len(), 1);
    }

    #[test]
    fn test_poll_downlink_counts_frames() {
        let mut radio = MockRadio::new();
        radio.queue_downlink(&[0x00]);
        let mut mgr = manager(radio, MockNetwork::new());
        mgr.ensure_radio(0).unwrap();

        let mut buffer = [0u8; 32];
        assert_eq!(mgr.poll_downlink(&mut buffer), Some(1));
        assert_eq!(buffer[0], 0x00);
        assert_eq!(mgr.stats().rx_count, 1);

        assert_eq!(mgr.poll_downlink(&mut buffer), None);
        assert_eq!(mgr.stats().rx_count, 1);
    }
}
