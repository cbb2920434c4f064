//! Connection session state machine
//!
//! Shared by both transports. Connect failures back off exponentially, and
//! a third consecutive failure (connect or send) puts the path into a long
//! cooldown so the scheduler stops burning airtime and battery on a dead
//! link.

/// Base connect retry delay
pub const BACKOFF_BASE_MS: u64 = 1_000;

/// Connect retry delay ceiling
pub const BACKOFF_CAP_MS: u64 = 60_000;

/// Consecutive send failures before the path is declared down
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// How long a declared-down path stays out of rotation
pub const COOLDOWN_MS: u64 = 300_000;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No link; a connect attempt is allowed
    Disconnected,
    /// Connect attempt in flight
    Connecting,
    /// Link established
    Connected,
    /// Waiting out a backoff or cooldown window
    Backoff,
}

/// Per-transport session tracker
#[derive(Debug)]
pub struct TransportSession {
    state: SessionState,
    connect_attempts: u32,
    consecutive_failures: u32,
    wait_until_ms: u64,
}

impl TransportSession {
    pub const fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
            connect_attempts: 0,
            consecutive_failures: 0,
            wait_until_ms: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Whether a connect attempt is allowed right now
    pub fn can_attempt(&self, now_ms: u64) -> bool {
        match self.state {
            SessionState::Disconnected => true,
            SessionState::Backoff => now_ms >= self.wait_until_ms,
            SessionState::Connecting | SessionState::Connected => false,
        }
    }

    /// Mark a connect attempt as started
    pub fn begin_connect(&mut self) {
        self.state = SessionState::Connecting;
    }

    /// Record a successful connect
    pub fn connect_succeeded(&mut self) {
        self.state = SessionState::Connected;
        self.connect_attempts = 0;
        self.consecutive_failures = 0;
    }

    /// Record a failed connect
    ///
    /// Backs off exponentially; at `MAX_CONSECUTIVE_FAILURES` attempts the
    /// path is taken down for the full cooldown window instead, and the
    /// attempt counter restarts from the base delay afterwards.
    pub fn connect_failed(&mut self, now_ms: u64) {
        self.connect_attempts = self.connect_attempts.saturating_add(1);
        self.state = SessionState::Backoff;
        if self.connect_attempts >= MAX_CONSECUTIVE_FAILURES {
            self.connect_attempts = 0;
            self.wait_until_ms = now_ms + COOLDOWN_MS;
        } else {
            self.wait_until_ms = now_ms + backoff_delay_ms(self.connect_attempts);
        }
    }

    /// Record a successful send
    pub fn send_succeeded(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Record a failed send on an established link
    ///
    /// Returns true when the failure threshold is crossed and the path has
    /// been taken down for the cooldown window.
    pub fn send_failed(&mut self, now_ms: u64) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
            self.state = SessionState::Backoff;
            self.connect_attempts = 0;
            self.wait_until_ms = now_ms + COOLDOWN_MS;
            return true;
        }
        false
    }

    /// Tear the session down without a penalty window
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for TransportSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Exponential backoff: 1s, 2s, 4s, ... capped at 60s
fn backoff_delay_ms(attempt: u32) -> u64 {
    let shift = attempt.saturating_sub(1).min(6);
    (BACKOFF_BASE_MS << shift).min(BACKOFF_CAP_MS)
}
