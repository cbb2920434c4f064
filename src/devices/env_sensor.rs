//! Environmental sensor board adapter
//!
//! The sensor board hangs off a serial link and speaks a line-oriented text
//! protocol: the gateway writes `ENV?\n` and the board answers one line of
//! the form `ENV:<temp>,<humidity>,<pressure>,<gas>\n` with temperature in
//! degrees C, relative humidity in percent, pressure in hPa and gas
//! resistance in ohms.
//!
//! The adapter owns the single reading slot. Every field is range-validated
//! against the sensor's documented operating envelope; out-of-range data is
//! rejected, never coerced, and never overwrites the previously held value.

use super::{ReadOutcome, STALENESS_THRESHOLD};
use crate::platform::{TimerInterface, UartInterface};
use heapless::Vec;

/// Request line sent to the sensor board
const REQUEST: &[u8] = b"ENV?\n";

/// Response tag
const RESPONSE_TAG: &str = "ENV:";

/// Bounded wait for a complete response line
const RESPONSE_TIMEOUT_MS: u32 = 200;

/// Poll interval while waiting for response bytes
const POLL_INTERVAL_MS: u32 = 5;

/// Maximum response line length (tag + four numeric fields)
const LINE_MAX: usize = 64;

/// Documented operating envelope (BME680-class sensor board)
const TEMP_MIN_C: f32 = -40.0;
const TEMP_MAX_C: f32 = 85.0;
const HUMIDITY_MIN_PCT: f32 = 0.0;
const HUMIDITY_MAX_PCT: f32 = 100.0;
const PRESSURE_MIN_HPA: f32 = 300.0;
const PRESSURE_MAX_HPA: f32 = 1100.0;
const GAS_MIN_OHM: f32 = 0.0;
const GAS_MAX_OHM: f32 = 10_000_000.0;

/// Environmental sensor reading
///
/// Single slot, overwritten in place only by a fresh valid reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Temperature in degrees Celsius
    pub temperature: f32,
    /// Relative humidity in percent
    pub humidity: f32,
    /// Barometric pressure in hPa
    pub pressure: f32,
    /// Gas sensor resistance in ohms
    pub gas_resistance: f32,
    /// Capture timestamp, milliseconds since boot
    pub captured_at_ms: u64,
    /// Whether the slot has ever held a valid reading
    pub valid: bool,
    /// Consecutive failed refreshes since the last success
    pub stale_count: u32,
}

impl SensorReading {
    /// Empty slot
    pub const fn empty() -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            pressure: 0.0,
            gas_resistance: 0.0,
            captured_at_ms: 0,
            valid: false,
            stale_count: 0,
        }
    }

    /// Whether this reading may contribute to an outbound frame
    pub fn usable(&self) -> bool {
        self.valid && self.stale_count <= STALENESS_THRESHOLD
    }
}

/// Environmental sensor adapter
pub struct EnvSensorAdapter<U: UartInterface> {
    uart: U,
    reading: SensorReading,
}

impl<U: UartInterface> EnvSensorAdapter<U> {
    /// Create a new adapter over the sensor board's serial link
    pub fn new(uart: U) -> Self {
        Self {
            uart,
            reading: SensorReading::empty(),
        }
    }

    /// Current reading slot
    pub fn reading(&self) -> &SensorReading {
        &self.reading
    }

    /// Mutable access to the underlying UART (for tests)
    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }

    /// Request a fresh reading from the sensor board
    ///
    /// Sends the request line, then polls for the response within a bounded
    /// timeout. On timeout or validation failure the held value is kept and
    /// the staleness count increments.
    pub fn request_reading<T: TimerInterface>(&mut self, timer: &mut T) -> ReadOutcome {
        // The deadline starts once the request has fully left the wire
        if self.uart.write(REQUEST).is_err() || self.uart.flush().is_err() {
            return self.mark_stale(ReadOutcome::Timeout);
        }

        let mut line: Vec<u8, LINE_MAX> = Vec::new();
        let deadline = timer.now_ms() + RESPONSE_TIMEOUT_MS as u64;

        loop {
            if !self.uart.available() {
                if timer.now_ms() >= deadline {
                    return self.mark_stale(ReadOutcome::Timeout);
                }
                let _ = timer.delay_ms(POLL_INTERVAL_MS);
                continue;
            }

            // Byte-wise so nothing past the terminator is consumed
            let mut byte = [0u8; 1];
            if self.uart.read(&mut byte).is_err() {
                return self.mark_stale(ReadOutcome::Timeout);
            }

            if byte[0] == b'\n' {
                let now = timer.now_ms();
                return match parse_line(&line) {
                    Some(fields) => self.store(fields, now),
                    None => self.mark_stale(ReadOutcome::Invalid),
                };
            }
            if line.push(byte[0]).is_err() {
                // Oversized garbage line
                return self.mark_stale(ReadOutcome::Invalid);
            }
        }
    }

    fn store(&mut self, fields: [f32; 4], now_ms: u64) -> ReadOutcome {
        let [temperature, humidity, pressure, gas_resistance] = fields;

        let in_range = (TEMP_MIN_C..=TEMP_MAX_C).contains(&temperature)
            && (HUMIDITY_MIN_PCT..=HUMIDITY_MAX_PCT).contains(&humidity)
            && (PRESSURE_MIN_HPA..=PRESSURE_MAX_HPA).contains(&pressure)
            && gas_resistance > GAS_MIN_OHM
            && gas_resistance <= GAS_MAX_OHM;

        if !in_range {
            return self.mark_stale(ReadOutcome::Invalid);
        }

        self.reading = SensorReading {
            temperature,
            humidity,
            pressure,
            gas_resistance,
            captured_at_ms: now_ms,
            valid: true,
            stale_count: 0,
        };
        ReadOutcome::Updated
    }

    fn mark_stale(&mut self, outcome: ReadOutcome) -> ReadOutcome {
        self.reading.stale_count = self.reading.stale_count.saturating_add(1);
        outcome
    }
}

/// Parse `ENV:t,h,p,g` into four floats
fn parse_line(line: &[u8]) -> Option<[f32; 4]> {
    let text = core::str::from_utf8(line).ok()?;
    let body = text.strip_prefix(RESPONSE_TAG)?;

    let mut fields = [0.0f32; 4];
    let mut count = 0;
    for part in body.split(',') {
        if count == 4 {
            return None; // too many fields
        }
        fields[count] = part.trim().parse::<f32>().ok()?;
        count += 1;
    }
    if count != 4 {
        return None;
    }
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{MockTimer, MockUart};
    use crate::platform::traits::UartConfig;

    fn adapter() -> (EnvSensorAdapter<MockUart>, MockTimer) {
        let uart = MockUart::new(UartConfig::default());
        (EnvSensorAdapter::new(uart), MockTimer::new())
    }

    #[test]
    fn test_valid_response_updates_slot() {
        let (mut env, mut timer) = adapter();
        env.uart_mut().inject_rx_data(b"ENV:23.50,45.00,1013.20,50000\n");

        assert_eq!(env.request_reading(&mut timer), ReadOutcome::Updated);

        let r = env.reading();
        assert!(r.valid);
        assert_eq!(r.stale_count, 0);
        assert!((r.temperature - 23.5).abs() < 0.001);
        assert!((r.humidity - 45.0).abs() < 0.001);
        assert!((r.pressure - 1013.2).abs() < 0.001);
        assert!((r.gas_resistance - 50000.0).abs() < 0.1);
    }

    #[test]
    fn test_request_line_is_sent() {
        let (mut env, mut timer) = adapter();
        env.uart_mut().inject_rx_data(b"ENV:20.0,50.0,1000.0,40000\n");

        env.request_reading(&mut timer);
        assert_eq!(&env.uart_mut().tx_buffer()[..5], b"ENV?\n");
    }

    #[test]
    fn test_out_of_range_temperature_rejected() {
        let (mut env, mut timer) = adapter();
        env.uart_mut().inject_rx_data(b"ENV:23.50,45.00,1013.20,50000\n");
        env.request_reading(&mut timer);

        // 200 C is outside the sensor envelope
        env.uart_mut().inject_rx_data(b"ENV:200.0,45.00,1013.20,50000\n");
        assert_eq!(env.request_reading(&mut timer), ReadOutcome::Invalid);

        // Previously held value unchanged, staleness incremented
        let r = env.reading();
        assert!((r.temperature - 23.5).abs() < 0.001);
        assert!(r.valid);
        assert_eq!(r.stale_count, 1);
    }

    #[test]
    fn test_write_failure_counts_as_timeout() {
        let (mut env, mut timer) = adapter();
        env.uart_mut().inject_rx_data(b"ENV:23.50,45.00,1013.20,50000\n");
        env.request_reading(&mut timer);

        env.uart_mut().fail_writes(1);
        assert_eq!(env.request_reading(&mut timer), ReadOutcome::Timeout);

        let r = env.reading();
        assert!(r.valid);
        assert_eq!(r.stale_count, 1);
    }

    #[test]
    fn test_timeout_increments_staleness() {
        let (mut env, mut timer) = adapter();

        assert_eq!(env.request_reading(&mut timer), ReadOutcome::Timeout);
        assert_eq!(env.reading().stale_count, 1);
        assert!(!env.reading().valid);

        assert_eq!(env.request_reading(&mut timer), ReadOutcome::Timeout);
        assert_eq!(env.reading().stale_count, 2);
    }

    #[test]
    fn test_malformed_line_rejected() {
        let (mut env, mut timer) = adapter();

        env.uart_mut().inject_rx_data(b"ENV:23.50,45.00\n");
        assert_eq!(env.request_reading(&mut timer), ReadOutcome::Invalid);

        env.uart_mut().inject_rx_data(b"GPS:1,2,3,4\n");
        assert_eq!(env.request_reading(&mut timer), ReadOutcome::Invalid);

        env.uart_mut().inject_rx_data(b"ENV:a,b,c,d\n");
        assert_eq!(env.request_reading(&mut timer), ReadOutcome::Invalid);
    }

    #[test]
    fn test_staleness_threshold_gates_usability() {
        let (mut env, mut timer) = adapter();
        env.uart_mut().inject_rx_data(b"ENV:23.50,45.00,1013.20,50000\n");
        env.request_reading(&mut timer);
        assert!(env.reading().usable());

        for _ in 0..STALENESS_THRESHOLD {
            env.request_reading(&mut timer);
        }
        // At the threshold the value is still usable
        assert!(env.reading().usable());

        env.request_reading(&mut timer);
        // One past the threshold it no longer is
        assert!(!env.reading().usable());
        assert!(env.reading().valid);
    }
}
