//! Downlink command processing
//!
//! Commands arrive as `[id][payload...]`. Validation is strict and ordered:
//! unknown id first, then exact payload length, then value range. Any
//! failure produces an error response and leaves all state untouched.
//! Configuration is only ever mutated through [`ConfigStore::apply`], so
//! the command layer inherits its range rules.
//!
//! Responses: `0x80` ack, `0x81` error, `0x82` status, `0x83` battery.

use crate::config::{ConfigChange, ConfigStore};
use crate::telemetry::codec::{decode_command, CodecError};
use crate::transport::LinkStats;
use heapless::Vec;

/// Largest accepted command payload
pub const MAX_COMMAND_PAYLOAD: usize = 16;

/// Largest response payload (status report)
pub const MAX_RESPONSE_PAYLOAD: usize = 20;

/// Response ids
pub const RESPONSE_ACK: u8 = 0x80;
pub const RESPONSE_ERROR: u8 = 0x81;
pub const RESPONSE_STATUS: u8 = 0x82;
pub const RESPONSE_BATTERY: u8 = 0x83;

/// Battery voltage endpoints for the percent estimate
const BATTERY_EMPTY_MV: u16 = 3_000;
const BATTERY_FULL_MV: u16 = 4_200;

/// A structurally decoded downlink command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    pub id: u8,
    pub payload: Vec<u8, MAX_COMMAND_PAYLOAD>,
}

/// Known command ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandId {
    Ping = 0x00,
    SetInterval = 0x01,
    SetDataRate = 0x02,
    SetTxPower = 0x03,
    Reboot = 0x04,
    GetStatus = 0x05,
    SetLed = 0x06,
    SetAlarm = 0x07,
    GetBattery = 0x08,
    SetAdr = 0x09,
    ClearStats = 0x0A,
}

impl CommandId {
    fn from_wire(id: u8) -> Option<Self> {
        match id {
            0x00 => Some(Self::Ping),
            0x01 => Some(Self::SetInterval),
            0x02 => Some(Self::SetDataRate),
            0x03 => Some(Self::SetTxPower),
            0x04 => Some(Self::Reboot),
            0x05 => Some(Self::GetStatus),
            0x06 => Some(Self::SetLed),
            0x07 => Some(Self::SetAlarm),
            0x08 => Some(Self::GetBattery),
            0x09 => Some(Self::SetAdr),
            0x0A => Some(Self::ClearStats),
            _ => None,
        }
    }

    /// Exact payload length each command requires
    fn payload_len(self) -> usize {
        match self {
            Self::SetInterval => 4,
            Self::SetDataRate
            | Self::SetTxPower
            | Self::SetLed
            | Self::SetAlarm
            | Self::SetAdr => 1,
            Self::Ping
            | Self::Reboot
            | Self::GetStatus
            | Self::GetBattery
            | Self::ClearStats => 0,
        }
    }
}

/// Error codes carried in `0x81` responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    UnknownCommand = 0x01,
    InvalidParameter = 0x02,
    NotImplemented = 0x03,
    BufferOverflow = 0x04,
    ChecksumFailed = 0x05,
    NotJoined = 0x06,
}

/// Uplink response to a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    pub id: u8,
    pub payload: Vec<u8, MAX_RESPONSE_PAYLOAD>,
}

impl ResponseFrame {
    fn ack(command_id: u8) -> Self {
        let mut payload = Vec::new();
        let _ = payload.push(command_id);
        Self {
            id: RESPONSE_ACK,
            payload,
        }
    }

    /// Error payload leads with the code; the offending command id follows
    fn error(command_id: u8, code: ErrorCode) -> Self {
        let mut payload = Vec::new();
        let _ = payload.push(code as u8);
        let _ = payload.push(command_id);
        Self {
            id: RESPONSE_ERROR,
            payload,
        }
    }

    /// Serialize as `[id][payload...]` for the uplink
    pub fn encode(&self) -> Vec<u8, { MAX_RESPONSE_PAYLOAD + 1 }> {
        let mut bytes = Vec::new();
        let _ = bytes.push(self.id);
        let _ = bytes.extend_from_slice(&self.payload);
        bytes
    }
}

/// Side effect the caller must carry out after sending the response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    /// Reset the unit. The ack must go out first.
    Reboot,
    /// A radio parameter changed; push the new values to the modem.
    ApplyRadioParams,
}

/// Result of processing one downlink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub response: ResponseFrame,
    pub action: Option<PostAction>,
}

impl CommandOutcome {
    fn reply(response: ResponseFrame) -> Self {
        Self {
            response,
            action: None,
        }
    }
}

/// Mutable state a command may touch
pub struct CommandContext<'a> {
    pub config: &'a mut ConfigStore,
    pub stats: &'a mut LinkStats,
    /// Battery voltage sampled by the caller
    pub battery_mv: u16,
}

/// Process one raw downlink
///
/// Returns `None` only for an empty downlink, which carries nothing to
/// respond to. Every other input, however malformed, gets a response.
pub fn handle_downlink(bytes: &[u8], ctx: &mut CommandContext<'_>) -> Option<CommandOutcome> {
    let frame = match decode_command(bytes) {
        Ok(frame) => frame,
        Err(CodecError::Undersized) => return None,
        Err(CodecError::Oversized) => {
            return Some(CommandOutcome::reply(ResponseFrame::error(
                bytes[0],
                ErrorCode::BufferOverflow,
            )));
        }
    };

    let Some(id) = CommandId::from_wire(frame.id) else {
        crate::log_warn!("unknown command {:#04x}", frame.id);
        return Some(CommandOutcome::reply(ResponseFrame::error(
            frame.id,
            ErrorCode::UnknownCommand,
        )));
    };

    if frame.payload.len() != id.payload_len() {
        return Some(CommandOutcome::reply(ResponseFrame::error(
            frame.id,
            ErrorCode::InvalidParameter,
        )));
    }

    Some(execute(id, &frame, ctx))
}

fn execute(id: CommandId, frame: &CommandFrame, ctx: &mut CommandContext<'_>) -> CommandOutcome {
    let p = frame.payload.as_slice();
    match id {
        CommandId::Ping => CommandOutcome::reply(ResponseFrame::ack(frame.id)),

        CommandId::SetInterval => {
            let ms = u32::from_le_bytes([p[0], p[1], p[2], p[3]]);
            apply_change(frame, ctx, ConfigChange::TransmitInterval(ms), None)
        }

        CommandId::SetDataRate => apply_change(
            frame,
            ctx,
            ConfigChange::DataRate(p[0]),
            Some(PostAction::ApplyRadioParams),
        ),

        CommandId::SetTxPower => apply_change(
            frame,
            ctx,
            ConfigChange::TxPower(p[0] as i8),
            Some(PostAction::ApplyRadioParams),
        ),

        CommandId::Reboot => CommandOutcome {
            response: ResponseFrame::ack(frame.id),
            action: Some(PostAction::Reboot),
        },

        CommandId::GetStatus => CommandOutcome::reply(status_response(ctx)),

        CommandId::SetLed => apply_flag(frame, ctx, p[0], ConfigChange::Led),

        CommandId::SetAlarm => apply_flag(frame, ctx, p[0], ConfigChange::Alarm),

        CommandId::GetBattery => CommandOutcome::reply(battery_response(ctx.battery_mv)),

        CommandId::SetAdr => {
            let outcome = apply_flag(frame, ctx, p[0], ConfigChange::Adr);
            if outcome.response.id == RESPONSE_ACK {
                CommandOutcome {
                    action: Some(PostAction::ApplyRadioParams),
                    ..outcome
                }
            } else {
                outcome
            }
        }

        CommandId::ClearStats => {
            ctx.stats.clear();
            CommandOutcome::reply(ResponseFrame::ack(frame.id))
        }
    }
}

fn apply_change(
    frame: &CommandFrame,
    ctx: &mut CommandContext<'_>,
    change: ConfigChange,
    action: Option<PostAction>,
) -> CommandOutcome {
    match ctx.config.apply(change) {
        Ok(()) => CommandOutcome {
            response: ResponseFrame::ack(frame.id),
            action,
        },
        Err(_) => CommandOutcome::reply(ResponseFrame::error(
            frame.id,
            ErrorCode::InvalidParameter,
        )),
    }
}

/// Boolean payloads accept exactly 0 or 1
fn apply_flag(
    frame: &CommandFrame,
    ctx: &mut CommandContext<'_>,
    raw: u8,
    change: fn(bool) -> ConfigChange,
) -> CommandOutcome {
    match raw {
        0 | 1 => apply_change(frame, ctx, change(raw == 1), None),
        _ => CommandOutcome::reply(ResponseFrame::error(
            frame.id,
            ErrorCode::InvalidParameter,
        )),
    }
}

fn status_response(ctx: &CommandContext<'_>) -> ResponseFrame {
    status_report(ctx.config.config(), ctx.stats)
}

/// Status payload: interval, radio params, flags, link counters
///
/// Also used as the periodic heartbeat uplink.
pub fn status_report(config: &crate::config::SystemConfig, stats: &LinkStats) -> ResponseFrame {
    let mut payload: Vec<u8, MAX_RESPONSE_PAYLOAD> = Vec::new();
    let _ = payload.extend_from_slice(&config.transmit_interval_ms.to_le_bytes());
    let _ = payload.push(config.radio_data_rate);
    let _ = payload.push(config.radio_tx_power as u8);
    let _ = payload.push(config.adr_enabled as u8);
    let _ = payload.push(config.led_enabled as u8);
    let _ = payload.push(config.alarm_enabled as u8);
    let _ = payload.extend_from_slice(&stats.tx_count.to_le_bytes());
    let _ = payload.extend_from_slice(&stats.rx_count.to_le_bytes());

    ResponseFrame {
        id: RESPONSE_STATUS,
        payload,
    }
}

/// Battery payload: `[percent][decivolts]`
fn battery_response(battery_mv: u16) -> ResponseFrame {
    let percent = battery_percent(battery_mv);
    let decivolts = (battery_mv / 100) as u8;

    let mut payload = Vec::new();
    let _ = payload.push(percent);
    let _ = payload.push(decivolts);
    ResponseFrame {
        id: RESPONSE_BATTERY,
        payload,
    }
}

/// Linear estimate between the empty and full voltage endpoints
fn battery_percent(battery_mv: u16) -> u8 {
    if battery_mv <= BATTERY_EMPTY_MV {
        return 0;
    }
    if battery_mv >= BATTERY_FULL_MV {
        return 100;
    }
    let span = u32::from(BATTERY_FULL_MV - BATTERY_EMPTY_MV);
    (u32::from(battery_mv - BATTERY_EMPTY_MV) * 100 / span) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockFlash;

    fn context(flash: &mut MockFlash) -> (ConfigStore, LinkStats) {
        (ConfigStore::load(flash), LinkStats::default())
    }

    fn handle(
        bytes: &[u8],
        config: &mut ConfigStore,
        stats: &mut LinkStats,
    ) -> Option<CommandOutcome> {
        let mut ctx = CommandContext {
            config,
            stats,
            battery_mv: 4_000,
        };
        handle_downlink(bytes, &mut ctx)
    }

    #[test]
    fn test_ping_acks() {
        let mut flash = MockFlash::new();
        let (mut config, mut stats) = context(&mut flash);

        let outcome = handle(&[0x00], &mut config, &mut stats).unwrap();
        assert_eq!(outcome.response.id, RESPONSE_ACK);
        assert_eq!(outcome.response.payload.as_slice(), &[0x00]);
        assert_eq!(outcome.action, None);
    }

    #[test]
    fn test_unknown_command_is_error_not_silence() {
        let mut flash = MockFlash::new();
        let (mut config, mut stats) = context(&mut flash);

        let outcome = handle(&[0x7F], &mut config, &mut stats).unwrap();
        assert_eq!(outcome.response.id, RESPONSE_ERROR);
        // Error code first, then the offending id
        assert_eq!(
            outcome.response.payload.as_slice(),
            &[ErrorCode::UnknownCommand as u8, 0x7F]
        );
    }

    #[test]
    fn test_set_interval_applies_and_persists_intent() {
        let mut flash = MockFlash::new();
        let (mut config, mut stats) = context(&mut flash);

        let outcome = handle(&[0x01, 0x60, 0xEA, 0x00, 0x00], &mut config, &mut stats).unwrap();
        assert_eq!(outcome.response.id, RESPONSE_ACK);
        assert_eq!(config.config().transmit_interval_ms, 60_000);
        assert!(config.is_dirty());
    }

    #[test]
    fn test_below_floor_interval_rejected_and_unchanged() {
        let mut flash = MockFlash::new();
        let (mut config, mut stats) = context(&mut flash);
        let before = config.config().transmit_interval_ms;

        // 5000 ms is below the 10 s floor
        let outcome = handle(&[0x01, 0x88, 0x13, 0x00, 0x00], &mut config, &mut stats).unwrap();
        assert_eq!(outcome.response.id, RESPONSE_ERROR);
        assert_eq!(
            outcome.response.payload.as_slice(),
            &[ErrorCode::InvalidParameter as u8, 0x01]
        );
        assert_eq!(config.config().transmit_interval_ms, before);
    }

    #[test]
    fn test_wrong_payload_length_rejected() {
        let mut flash = MockFlash::new();
        let (mut config, mut stats) = context(&mut flash);

        let outcome = handle(&[0x01, 0x10], &mut config, &mut stats).unwrap();
        assert_eq!(outcome.response.id, RESPONSE_ERROR);

        let outcome = handle(&[0x00, 0xFF], &mut config, &mut stats).unwrap();
        assert_eq!(outcome.response.id, RESPONSE_ERROR);
    }

    #[test]
    fn test_reboot_acks_with_post_action() {
        let mut flash = MockFlash::new();
        let (mut config, mut stats) = context(&mut flash);

        let outcome = handle(&[0x04], &mut config, &mut stats).unwrap();
        assert_eq!(outcome.response.id, RESPONSE_ACK);
        assert_eq!(outcome.action, Some(PostAction::Reboot));
    }

    #[test]
    fn test_data_rate_change_triggers_radio_reconfig() {
        let mut flash = MockFlash::new();
        let (mut config, mut stats) = context(&mut flash);

        let outcome = handle(&[0x02, 0x05], &mut config, &mut stats).unwrap();
        assert_eq!(outcome.response.id, RESPONSE_ACK);
        assert_eq!(outcome.action, Some(PostAction::ApplyRadioParams));
        assert_eq!(config.config().radio_data_rate, 5);

        let outcome = handle(&[0x02, 0x06], &mut config, &mut stats).unwrap();
        assert_eq!(outcome.response.id, RESPONSE_ERROR);
    }

    #[test]
    fn test_flag_commands_accept_only_zero_or_one() {
        let mut flash = MockFlash::new();
        let (mut config, mut stats) = context(&mut flash);

        let outcome = handle(&[0x06, 0x01], &mut config, &mut stats).unwrap();
        assert_eq!(outcome.response.id, RESPONSE_ACK);
        assert!(config.config().led_enabled);

        let outcome = handle(&[0x06, 0x02], &mut config, &mut stats).unwrap();
        assert_eq!(outcome.response.id, RESPONSE_ERROR);
    }

    #[test]
    fn test_status_layout() {
        let mut flash = MockFlash::new();
        let (mut config, mut stats) = context(&mut flash);
        stats.tx_count = 7;
        stats.rx_count = 2;

        let outcome = handle(&[0x05], &mut config, &mut stats).unwrap();
        assert_eq!(outcome.response.id, RESPONSE_STATUS);

        let p = outcome.response.payload.as_slice();
        assert_eq!(p.len(), 17);
        assert_eq!(u32::from_le_bytes([p[0], p[1], p[2], p[3]]), 60_000);
        assert_eq!(p[4], 3); // data rate
        assert_eq!(p[5] as i8, 14); // tx power
        assert_eq!(u32::from_le_bytes([p[9], p[10], p[11], p[12]]), 7);
        assert_eq!(u32::from_le_bytes([p[13], p[14], p[15], p[16]]), 2);
    }

    #[test]
    fn test_battery_report() {
        let mut flash = MockFlash::new();
        let (mut config, mut stats) = context(&mut flash);

        let outcome = handle(&[0x08], &mut config, &mut stats).unwrap();
        assert_eq!(outcome.response.id, RESPONSE_BATTERY);

        let p = outcome.response.payload.as_slice();
        // 4000 mV: 83% of the 3000..4200 span, 40 decivolts
        assert_eq!(p[0], 83);
        assert_eq!(p[1], 40);
    }

    #[test]
    fn test_clear_stats() {
        let mut flash = MockFlash::new();
        let (mut config, mut stats) = context(&mut flash);
        stats.tx_count = 10;
        stats.tx_fail = 4;

        let outcome = handle(&[0x0A], &mut config, &mut stats).unwrap();
        assert_eq!(outcome.response.id, RESPONSE_ACK);
        assert_eq!(stats, LinkStats::default());
    }

    #[test]
    fn test_empty_downlink_gets_no_response() {
        let mut flash = MockFlash::new();
        let (mut config, mut stats) = context(&mut flash);
        assert!(handle(&[], &mut config, &mut stats).is_none());
    }

    #[test]
    fn test_oversized_downlink_reports_overflow() {
        let mut flash = MockFlash::new();
        let (mut config, mut stats) = context(&mut flash);

        let bytes = [0x01u8; 20];
        let outcome = handle(&bytes, &mut config, &mut stats).unwrap();
        assert_eq!(outcome.response.id, RESPONSE_ERROR);
        assert_eq!(
            outcome.response.payload.as_slice(),
            &[ErrorCode::BufferOverflow as u8, 0x01]
        );
    }
}
