//! ADC interface trait
//!
//! Battery voltage sensing for the get-battery downlink command and the
//! low-battery status flag.

/// ADC interface trait
pub trait AdcInterface {
    /// Battery voltage in millivolts, already corrected for the board's
    /// voltage divider
    fn read_battery_mv(&mut self) -> u16;
}
