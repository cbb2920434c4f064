//! Tick-driven gateway scheduler
//!
//! Owns every peripheral adapter, the transport manager and the persisted
//! configuration. The outer loop calls [`Gateway::tick`] forever; each tick
//! feeds the watchdog and advances exactly one state.
//!
//! Deadline bookkeeping uses absolute timestamps. `Idle` dispatches at most
//! one due activity per tick, in fixed priority order (peripheral reads,
//! then transmit, then heartbeat), so a busy uplink can never starve
//! sampling. Downlinks are drained at one fixed point, at the top of every
//! `Idle` tick, from a bounded queue.

use super::GatewayState;
use crate::command::{handle_downlink, status_report, CommandContext, PostAction};
use crate::config::ConfigStore;
use crate::devices::{CameraArray, EnvSensorAdapter, ReadOutcome};
use crate::platform::{
    AdcInterface, FlashInterface, I2cInterface, TimerInterface, UartInterface, WatchdogInterface,
};
use crate::telemetry::aggregator::build_frame;
use crate::transport::network::NetworkTransport;
use crate::transport::radio::RadioTransport;
use crate::transport::{NetworkInterface, RadioInterface, TransportManager};
use heapless::{Deque, Vec};

/// Peripheral sampling cadence
pub const SAMPLE_INTERVAL_MS: u64 = 10_000;

/// Periodic status uplink cadence
pub const HEARTBEAT_INTERVAL_MS: u64 = 3_600_000;

/// Time budget for the initial radio join phase
const CONNECT_RADIO_BUDGET_MS: u64 = 30_000;

/// Time budget for the network bring-up phase
const CONNECT_NETWORK_BUDGET_MS: u64 = 15_000;

/// Consecutive all-peripherals-failed sampling rounds before escalating
pub const FAULT_THRESHOLD: u32 = 5;

/// Hardware watchdog timeout
const WATCHDOG_TIMEOUT_MS: u32 = 8_000;

/// Longest single low-power sleep, well under the watchdog timeout
const MAX_SLEEP_MS: u64 = 4_000;

/// Wake this early ahead of the next deadline
const LOW_POWER_MARGIN_MS: u64 = 50;

/// Largest downlink frame the queue accepts
const DOWNLINK_MAX: usize = 32;

/// Downlink queue depth; overflow drops the newest frame
const DOWNLINK_QUEUE_DEPTH: usize = 4;

/// The gateway control loop
pub struct Gateway<U, I, R, N, F, T, W, A>
where
    U: UartInterface,
    I: I2cInterface,
    R: RadioInterface,
    N: NetworkInterface,
    F: FlashInterface,
    T: TimerInterface,
    W: WatchdogInterface,
    A: AdcInterface,
{
    state: GatewayState,
    env: EnvSensorAdapter<U>,
    cameras: CameraArray<I>,
    transport: TransportManager<R, N>,
    config: ConfigStore,
    flash: F,
    timer: T,
    watchdog: W,
    adc: A,
    downlink: Deque<Vec<u8, DOWNLINK_MAX>, DOWNLINK_QUEUE_DEPTH>,
    sequence: u16,
    next_sample_ms: u64,
    next_transmit_ms: u64,
    next_heartbeat_ms: u64,
    phase_deadline_ms: u64,
    fault_streak: u32,
}

impl<U, I, R, N, F, T, W, A> Gateway<U, I, R, N, F, T, W, A>
where
    U: UartInterface,
    I: I2cInterface,
    R: RadioInterface,
    N: NetworkInterface,
    F: FlashInterface,
    T: TimerInterface,
    W: WatchdogInterface,
    A: AdcInterface,
{
    /// Assemble the gateway from its platform resources
    pub fn new(
        env_uart: U,
        i2c: I,
        radio: R,
        network: N,
        mut flash: F,
        timer: T,
        watchdog: W,
        adc: A,
    ) -> Self {
        let config = ConfigStore::load(&mut flash);
        let radio = RadioTransport::new(radio, config.config().radio_data_rate);

        Self {
            state: GatewayState::Init,
            env: EnvSensorAdapter::new(env_uart),
            cameras: CameraArray::new(i2c),
            transport: TransportManager::new(radio, NetworkTransport::new(network)),
            config,
            flash,
            timer,
            watchdog,
            adc,
            downlink: Deque::new(),
            sequence: 0,
            next_sample_ms: 0,
            next_transmit_ms: 0,
            next_heartbeat_ms: 0,
            phase_deadline_ms: 0,
            fault_streak: 0,
        }
    }

    /// Current control loop state
    pub fn state(&self) -> GatewayState {
        self.state
    }

    /// Current configuration store
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Transport manager access (for tests)
    pub fn transport_mut(&mut self) -> &mut TransportManager<R, N> {
        &mut self.transport
    }

    /// Environmental sensor adapter access (for tests)
    pub fn env_mut(&mut self) -> &mut EnvSensorAdapter<U> {
        &mut self.env
    }

    /// Camera array access (for tests)
    pub fn cameras_mut(&mut self) -> &mut CameraArray<I> {
        &mut self.cameras
    }

    /// Flash access (for tests)
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Run one scheduler step
    pub fn tick(&mut self) {
        self.watchdog.feed();
        let now = self.timer.now_ms();

        match self.state {
            GatewayState::Init => self.tick_init(now),
            GatewayState::ConnectRadio => self.tick_connect_radio(now),
            GatewayState::ConnectNetwork => self.tick_connect_network(now),
            GatewayState::Idle => self.tick_idle(now),
            GatewayState::ReadPeripherals => self.tick_read_peripherals(now),
            GatewayState::Transmit => self.tick_transmit(now),
            GatewayState::LowPower => self.tick_low_power(now),
            GatewayState::Error => {
                crate::log_error!("fault threshold crossed, recovering");
                self.state = GatewayState::Recovery;
            }
            GatewayState::Recovery => self.tick_recovery(now),
        }
    }

    fn tick_init(&mut self, now: u64) {
        if self.watchdog.start(WATCHDOG_TIMEOUT_MS).is_err() {
            crate::log_error!("watchdog start failed");
        }
        self.apply_radio_params();

        self.next_sample_ms = now;
        self.next_transmit_ms = now + self.config.config().transmit_interval_ms as u64;
        self.next_heartbeat_ms = now + HEARTBEAT_INTERVAL_MS;
        self.phase_deadline_ms = now + CONNECT_RADIO_BUDGET_MS;
        self.state = GatewayState::ConnectRadio;
    }

    fn tick_connect_radio(&mut self, now: u64) {
        if self.transport.ensure_radio(now).is_ok() {
            crate::log_info!("radio joined");
            self.state = GatewayState::Idle;
            return;
        }

        if now >= self.phase_deadline_ms {
            // Proceed without the radio; sends will keep retrying the join
            // under the session's backoff
            if self.config.config().network_fallback_enabled {
                self.phase_deadline_ms = now + CONNECT_NETWORK_BUDGET_MS;
                self.state = GatewayState::ConnectNetwork;
            } else {
                self.state = GatewayState::Idle;
            }
        }
    }

    fn tick_connect_network(&mut self, now: u64) {
        if self.transport.network().connect(now).is_ok() || now >= self.phase_deadline_ms {
            self.state = GatewayState::Idle;
        }
    }

    fn tick_idle(&mut self, now: u64) {
        if self.drain_downlink(now) {
            // Reboot was triggered while draining
            return;
        }

        if self.config.save(&mut self.flash).is_err() {
            crate::log_error!("config save failed");
        }

        if now >= self.next_sample_ms {
            self.state = GatewayState::ReadPeripherals;
        } else if now >= self.next_transmit_ms {
            self.state = GatewayState::Transmit;
        } else if now >= self.next_heartbeat_ms {
            self.send_heartbeat(now);
        } else if self.config.config().low_power_enabled {
            self.state = GatewayState::LowPower;
        }
    }

    fn tick_read_peripherals(&mut self, now: u64) {
        let env_outcome = self.env.request_reading(&mut self.timer);
        let camera_outcomes = self.cameras.poll_all(now);

        // Invalid data still proves the peripherals are talking; only a
        // round where nothing answered at all counts toward the fault streak
        let all_silent = env_outcome == ReadOutcome::Timeout
            && camera_outcomes.iter().all(|o| *o == ReadOutcome::Timeout);
        if all_silent {
            self.fault_streak = self.fault_streak.saturating_add(1);
            crate::log_warn!("sampling round silent, streak {}", self.fault_streak);
        } else {
            self.fault_streak = 0;
        }

        self.next_sample_ms = now + SAMPLE_INTERVAL_MS;
        self.state = if self.fault_streak >= FAULT_THRESHOLD {
            GatewayState::Error
        } else {
            GatewayState::Idle
        };
    }

    fn tick_transmit(&mut self, now: u64) {
        let detections = [*self.cameras.reading(0), *self.cameras.reading(1)];
        let frame = build_frame(self.sequence, self.env.reading(), &detections, now);

        let fallback = self.config.config().network_fallback_enabled;
        self.transport.send_aggregate(&frame, now, fallback);

        self.sequence = self.sequence.wrapping_add(1);
        self.next_transmit_ms = now + self.config.config().transmit_interval_ms as u64;
        self.state = GatewayState::Idle;
    }

    fn tick_low_power(&mut self, now: u64) {
        let next_deadline = self
            .next_sample_ms
            .min(self.next_transmit_ms)
            .min(self.next_heartbeat_ms);

        // Outside the margin, sleep toward it in watchdog-safe chunks.
        // Inside it, finish the wait in one step; the minimum of 1 ms keeps
        // the loop advancing even with the deadline at hand.
        let sleep = if next_deadline > now + LOW_POWER_MARGIN_MS {
            (next_deadline - now - LOW_POWER_MARGIN_MS).min(MAX_SLEEP_MS)
        } else {
            next_deadline.saturating_sub(now).max(1)
        };
        let _ = self.timer.delay_ms(sleep as u32);
        self.state = GatewayState::Idle;
    }

    fn tick_recovery(&mut self, now: u64) {
        self.transport.radio().reset_session();
        self.transport.network().reset_session();
        self.cameras.reset_bus();
        self.apply_radio_params();
        self.fault_streak = 0;
        self.phase_deadline_ms = now + CONNECT_RADIO_BUDGET_MS;
        self.state = GatewayState::ConnectRadio;
    }

    /// Pull pending downlinks into the bounded queue, then process them all.
    /// Returns true when a reboot was triggered.
    fn drain_downlink(&mut self, now: u64) -> bool {
        let mut buffer = [0u8; DOWNLINK_MAX];
        for _ in 0..DOWNLINK_QUEUE_DEPTH {
            match self.transport.poll_downlink(&mut buffer) {
                Some(len) => {
                    let mut msg: Vec<u8, DOWNLINK_MAX> = Vec::new();
                    let _ = msg.extend_from_slice(&buffer[..len]);
                    if self.downlink.push_back(msg).is_err() {
                        crate::log_warn!("downlink queue full, dropping frame");
                        break;
                    }
                }
                None => break,
            }
        }

        while let Some(msg) = self.downlink.pop_front() {
            if self.process_command(&msg, now) {
                return true;
            }
        }
        false
    }

    /// Process one downlink. Returns true when a reboot was triggered.
    fn process_command(&mut self, bytes: &[u8], now: u64) -> bool {
        let battery_mv = self.adc.read_battery_mv();
        let outcome = {
            let mut ctx = CommandContext {
                config: &mut self.config,
                stats: self.transport.stats_mut(),
                battery_mv,
            };
            handle_downlink(bytes, &mut ctx)
        };

        let Some(outcome) = outcome else {
            return false;
        };

        let encoded = outcome.response.encode();
        if self.transport.radio().send_frame(&encoded, now).is_err() {
            crate::log_warn!("command response not sent");
        }

        match outcome.action {
            Some(PostAction::Reboot) => {
                // Persist pending changes; the ack already went out above
                let _ = self.config.save(&mut self.flash);
                self.watchdog.trigger_reset();
                true
            }
            Some(PostAction::ApplyRadioParams) => {
                self.apply_radio_params();
                false
            }
            None => false,
        }
    }

    fn send_heartbeat(&mut self, now: u64) {
        let report = status_report(self.config.config(), self.transport.stats());
        let encoded = report.encode();
        if self.transport.radio().send_frame(&encoded, now).is_err() {
            crate::log_warn!("heartbeat not sent");
        }
        self.next_heartbeat_ms = now + HEARTBEAT_INTERVAL_MS;
    }

    fn apply_radio_params(&mut self) {
        let config = *self.config.config();
        if self
            .transport
            .radio()
            .apply_params(config.radio_data_rate, config.radio_tx_power, config.adr_enabled)
            .is_err()
        {
            crate::log_warn!("radio parameter update failed");
        }
    }
}
