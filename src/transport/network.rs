//! IP network fallback transport
//!
//! Carries the text encoding of a frame when the radio path cannot. The
//! link is brought up lazily on first use and shares the session state
//! machine with the radio path.

use super::session::TransportSession;
use super::{TransportError, TxResult};

/// Topic telemetry lines are published under
pub const TELEMETRY_TOPIC: &str = "fieldgate/telemetry";

/// Network link interface
pub trait NetworkInterface {
    /// Bring the link up. Blocks up to the link's connect timeout.
    fn connect(&mut self) -> TxResult<()>;

    /// Publish one payload under a topic.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> TxResult<()>;
}

/// Network path over any [`NetworkInterface`]
pub struct NetworkTransport<N: NetworkInterface> {
    network: N,
    session: TransportSession,
}

impl<N: NetworkInterface> NetworkTransport<N> {
    pub fn new(network: N) -> Self {
        Self {
            network,
            session: TransportSession::new(),
        }
    }

    pub fn session(&self) -> &TransportSession {
        &self.session
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    /// Bring the link up, respecting the session's backoff window
    pub fn connect(&mut self, now_ms: u64) -> TxResult<()> {
        if self.session.is_connected() {
            return Ok(());
        }
        if !self.session.can_attempt(now_ms) {
            return Err(TransportError::Unavailable);
        }

        self.session.begin_connect();
        match self.network.connect() {
            Ok(()) => {
                self.session.connect_succeeded();
                Ok(())
            }
            Err(err) => {
                self.session.connect_failed(now_ms);
                crate::log_warn!("network connect failed");
                Err(err)
            }
        }
    }

    /// Drop the session, clearing any backoff or cooldown window
    pub fn reset_session(&mut self) {
        self.session.reset();
    }

    /// Publish one telemetry line, connecting on demand
    pub fn send_line(&mut self, line: &[u8], now_ms: u64) -> TxResult<()> {
        self.connect(now_ms)?;

        match self.network.publish(TELEMETRY_TOPIC, line) {
            Ok(()) => {
                self.session.send_succeeded();
                Ok(())
            }
            Err(err) => {
                if self.session.send_failed(now_ms) {
                    crate::log_warn!("network path down, entering cooldown");
                }
                Err(err)
            }
        }
    }
}
