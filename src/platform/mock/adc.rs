//! Mock ADC implementation for testing

use crate::platform::traits::AdcInterface;

/// Mock ADC implementation returning a configurable battery voltage
#[derive(Debug)]
pub struct MockAdc {
    battery_mv: u16,
}

impl MockAdc {
    /// Create a mock ADC reporting the given battery voltage
    pub fn new(battery_mv: u16) -> Self {
        Self { battery_mv }
    }

    /// Change the reported battery voltage
    pub fn set_battery_mv(&mut self, mv: u16) {
        self.battery_mv = mv;
    }
}

impl Default for MockAdc {
    fn default() -> Self {
        // Healthy single-cell LiPo
        Self::new(4000)
    }
}

impl AdcInterface for MockAdc {
    fn read_battery_mv(&mut self) -> u16 {
        self.battery_mv
    }
}
