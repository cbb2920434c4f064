//! Persisted gateway configuration
//!
//! A single fixed-size record in flash: magic, version, the tunable fields,
//! and a trailing CRC-16/MODBUS over everything before it. On any mismatch
//! (magic, version, checksum, short read) the store falls back to compiled
//! defaults and persists them, so a unit that lost its record converges to a
//! known state instead of running on garbage.
//!
//! Writes are dirty-flag gated; callers may invoke [`ConfigStore::save`]
//! every cycle and flash only wears when something actually changed.

use crate::platform::{FlashInterface, Result};
use crc::{Crc, CRC_16_MODBUS};

/// Record checksum algorithm
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Record magic, "FGC1"
const CONFIG_MAGIC: u32 = 0x4647_4331;

/// Record format version
const CONFIG_VERSION: u8 = 1;

/// Flash offset of the config record (last 4 KB block, clear of firmware)
pub const CONFIG_ADDR: u32 = 0x1F_F000;

/// Serialized record length
const RECORD_LEN: usize = 14;

/// Transmit interval bounds, milliseconds
pub const INTERVAL_MIN_MS: u32 = 10_000;
pub const INTERVAL_MAX_MS: u32 = 3_600_000;

/// Radio data rate bounds (DR0..DR5)
pub const DATA_RATE_MAX: u8 = 5;

/// Radio transmit power bounds, dBm
pub const TX_POWER_MIN_DBM: i8 = 2;
pub const TX_POWER_MAX_DBM: i8 = 20;

/// Tunable gateway configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemConfig {
    /// Telemetry transmit interval, milliseconds
    pub transmit_interval_ms: u32,
    /// Radio data rate index
    pub radio_data_rate: u8,
    /// Radio transmit power, dBm
    pub radio_tx_power: i8,
    /// Whether the network path may be used when the radio path fails
    pub network_fallback_enabled: bool,
    /// Whether the scheduler may enter low-power waits
    pub low_power_enabled: bool,
    /// Local alarm output on detection
    pub alarm_enabled: bool,
    /// Status LED
    pub led_enabled: bool,
    /// Radio adaptive data rate
    pub adr_enabled: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            transmit_interval_ms: 60_000,
            radio_data_rate: 3,
            radio_tx_power: 14,
            network_fallback_enabled: true,
            low_power_enabled: true,
            alarm_enabled: false,
            led_enabled: true,
            adr_enabled: false,
        }
    }
}

/// A validated change to one configuration field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    TransmitInterval(u32),
    DataRate(u8),
    TxPower(i8),
    NetworkFallback(bool),
    LowPower(bool),
    Alarm(bool),
    Led(bool),
    Adr(bool),
}

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Requested value is outside the accepted range; config unchanged
    OutOfRange,
}

/// Configuration store with flash persistence
#[derive(Debug)]
pub struct ConfigStore {
    config: SystemConfig,
    dirty: bool,
}

impl ConfigStore {
    /// Load the record from flash, falling back to defaults on any mismatch
    pub fn load<F: FlashInterface>(flash: &mut F) -> Self {
        let mut record = [0u8; RECORD_LEN];
        let loaded = flash.read(CONFIG_ADDR, &mut record).is_ok();

        match loaded.then(|| deserialize(&record)).flatten() {
            Some(config) => Self {
                config,
                dirty: false,
            },
            None => {
                crate::log_warn!("config record invalid, restoring defaults");
                let mut store = Self {
                    config: SystemConfig::default(),
                    dirty: true,
                };
                let _ = store.save(flash);
                store
            }
        }
    }

    /// Current configuration
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Whether an unsaved change is pending
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply a change after range validation
    ///
    /// On rejection the stored configuration is untouched.
    pub fn apply(&mut self, change: ConfigChange) -> core::result::Result<(), ConfigError> {
        match change {
            ConfigChange::TransmitInterval(ms) => {
                if !(INTERVAL_MIN_MS..=INTERVAL_MAX_MS).contains(&ms) {
                    return Err(ConfigError::OutOfRange);
                }
                self.config.transmit_interval_ms = ms;
            }
            ConfigChange::DataRate(dr) => {
                if dr > DATA_RATE_MAX {
                    return Err(ConfigError::OutOfRange);
                }
                self.config.radio_data_rate = dr;
            }
            ConfigChange::TxPower(dbm) => {
                if !(TX_POWER_MIN_DBM..=TX_POWER_MAX_DBM).contains(&dbm) {
                    return Err(ConfigError::OutOfRange);
                }
                self.config.radio_tx_power = dbm;
            }
            ConfigChange::NetworkFallback(on) => self.config.network_fallback_enabled = on,
            ConfigChange::LowPower(on) => self.config.low_power_enabled = on,
            ConfigChange::Alarm(on) => self.config.alarm_enabled = on,
            ConfigChange::Led(on) => self.config.led_enabled = on,
            ConfigChange::Adr(on) => self.config.adr_enabled = on,
        }
        self.dirty = true;
        Ok(())
    }

    /// Persist the record if a change is pending
    pub fn save<F: FlashInterface>(&mut self, flash: &mut F) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let record = serialize(&self.config);
        flash.erase(CONFIG_ADDR, flash.block_size())?;
        flash.write(CONFIG_ADDR, &record)?;
        self.dirty = false;
        Ok(())
    }
}

fn serialize(config: &SystemConfig) -> [u8; RECORD_LEN] {
    let mut record = [0u8; RECORD_LEN];
    record[0..4].copy_from_slice(&CONFIG_MAGIC.to_le_bytes());
    record[4] = CONFIG_VERSION;
    record[5..9].copy_from_slice(&config.transmit_interval_ms.to_le_bytes());
    record[9] = config.radio_data_rate;
    record[10] = config.radio_tx_power as u8;

    let mut flags = 0u8;
    if config.network_fallback_enabled {
        flags |= 1 << 0;
    }
    if config.low_power_enabled {
        flags |= 1 << 1;
    }
    if config.alarm_enabled {
        flags |= 1 << 2;
    }
    if config.led_enabled {
        flags |= 1 << 3;
    }
    if config.adr_enabled {
        flags |= 1 << 4;
    }
    record[11] = flags;

    let crc = CRC16.checksum(&record[..RECORD_LEN - 2]);
    record[12..14].copy_from_slice(&crc.to_le_bytes());
    record
}

fn deserialize(record: &[u8; RECORD_LEN]) -> Option<SystemConfig> {
    let stored_crc = u16::from_le_bytes([record[12], record[13]]);
    if CRC16.checksum(&record[..RECORD_LEN - 2]) != stored_crc {
        return None;
    }
    if u32::from_le_bytes([record[0], record[1], record[2], record[3]]) != CONFIG_MAGIC {
        return None;
    }
    if record[4] != CONFIG_VERSION {
        return None;
    }

    let interval = u32::from_le_bytes([record[5], record[6], record[7], record[8]]);
    let flags = record[11];
    let config = SystemConfig {
        transmit_interval_ms: interval,
        radio_data_rate: record[9],
        radio_tx_power: record[10] as i8,
        network_fallback_enabled: flags & (1 << 0) != 0,
        low_power_enabled: flags & (1 << 1) != 0,
        alarm_enabled: flags & (1 << 2) != 0,
        led_enabled: flags & (1 << 3) != 0,
        adr_enabled: flags & (1 << 4) != 0,
    };

    // A record written by older firmware could hold now-invalid values
    if !(INTERVAL_MIN_MS..=INTERVAL_MAX_MS).contains(&config.transmit_interval_ms) {
        return None;
    }
    if config.radio_data_rate > DATA_RATE_MAX {
        return None;
    }
    if !(TX_POWER_MIN_DBM..=TX_POWER_MAX_DBM).contains(&config.radio_tx_power) {
        return None;
    }

    Some(config)
}
