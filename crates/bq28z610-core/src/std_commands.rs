//! Standard SBS data commands (TRM chapter 12.1): fixed word registers read
//! by arming the register and clocking two bytes back, little-endian.

use crate::error::Result;
use crate::events::GaugeObserver;
use crate::gauge::Gauge;
use crate::protocol::constants::{
    REG_AVERAGE_CURRENT, REG_BATTERY_STATUS, REG_CHARGING_CURRENT, REG_CHARGING_VOLTAGE,
    REG_CURRENT, REG_CYCLE_COUNT, REG_DESIGN_CAPACITY, REG_FULL_CHARGE_CAPACITY,
    REG_MANUFACTURER_ACCESS_CONTROL, REG_RELATIVE_STATE_OF_CHARGE, REG_REMAINING_CAPACITY,
    REG_STATE_OF_HEALTH, REG_TEMPERATURE, REG_VOLTAGE,
};
use crate::transport::GaugeTransport;

pub const KELVIN_OFFSET: f32 = 273.15;

impl<T: GaugeTransport, O: GaugeObserver> Gauge<T, O> {
    /// Control bits mirror (12.1.1). The SEC bits here are unreliable; use
    /// [`Gauge::security_mode`] which decodes OperationStatus instead.
    pub fn manufacturer_access_control(&self) -> Result<u16> {
        self.read_register_word(REG_MANUFACTURER_ACCESS_CONTROL)
    }

    /// Pack temperature in 0.1 K units (12.1.4).
    pub fn temperature_dk(&self) -> Result<u16> {
        self.read_register_word(REG_TEMPERATURE)
    }

    /// Pack temperature in degrees Celsius.
    pub fn temperature_c(&self) -> Result<f32> {
        Ok(0.1 * f32::from(self.temperature_dk()?) - KELVIN_OFFSET)
    }

    /// Sum of the measured cell voltages, mV (12.1.5).
    pub fn voltage_mv(&self) -> Result<u16> {
        self.read_register_word(REG_VOLTAGE)
    }

    /// Status word with alarm and error bits (12.1.6); decode with
    /// [`crate::flags::battery_status`].
    pub fn battery_status(&self) -> Result<u16> {
        self.read_register_word(REG_BATTERY_STATUS)
    }

    /// Momentary discharge/charge current, mA, negative when discharging (12.1.7).
    pub fn current_ma(&self) -> Result<i16> {
        Ok(self.read_register_word(REG_CURRENT)? as i16)
    }

    /// Predicted remaining capacity, mAh (12.1.9).
    pub fn remaining_capacity_mah(&self) -> Result<u16> {
        self.read_register_word(REG_REMAINING_CAPACITY)
    }

    /// Predicted full-charge capacity, mAh (12.1.10).
    pub fn full_charge_capacity_mah(&self) -> Result<u16> {
        self.read_register_word(REG_FULL_CHARGE_CAPACITY)
    }

    /// Rolling-average current, mA (12.1.11).
    pub fn average_current_ma(&self) -> Result<i16> {
        Ok(self.read_register_word(REG_AVERAGE_CURRENT)? as i16)
    }

    /// Discharge cycles the pack has seen (12.1.22).
    pub fn cycle_count(&self) -> Result<u16> {
        self.read_register_word(REG_CYCLE_COUNT)
    }

    /// Relative state of charge, percent of full-charge capacity (12.1.23).
    pub fn relative_state_of_charge(&self) -> Result<u16> {
        self.read_register_word(REG_RELATIVE_STATE_OF_CHARGE)
    }

    /// State of health, percent of design capacity (12.1.24).
    pub fn state_of_health(&self) -> Result<u16> {
        self.read_register_word(REG_STATE_OF_HEALTH)
    }

    /// Desired charging voltage, mV (12.1.25).
    pub fn charging_voltage_mv(&self) -> Result<u16> {
        self.read_register_word(REG_CHARGING_VOLTAGE)
    }

    /// Desired charging current, mA (12.1.26).
    pub fn charging_current_ma(&self) -> Result<i16> {
        Ok(self.read_register_word(REG_CHARGING_CURRENT)? as i16)
    }

    /// Theoretical pack capacity, mAh (12.1.30).
    pub fn design_capacity_mah(&self) -> Result<u16> {
        self.read_register_word(REG_DESIGN_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    fn gauge_with(mock: &MockTransport) -> Gauge<MockTransport> {
        Gauge::without_delays(mock.clone())
    }

    #[test]
    fn voltage_arms_register_then_reads_word() {
        let mock = MockTransport::new();
        mock.queue_word(7400);
        let gauge = gauge_with(&mock);
        assert_eq!(gauge.voltage_mv().unwrap(), 7400);
        assert_eq!(mock.writes(), vec![(REG_VOLTAGE, vec![])]);
    }

    #[test]
    fn current_is_sign_extended() {
        let mock = MockTransport::new();
        mock.queue_word(0xFF38); // -200 mA
        let gauge = gauge_with(&mock);
        assert_eq!(gauge.current_ma().unwrap(), -200);
    }

    #[test]
    fn temperature_converts_deci_kelvin_to_celsius() {
        let mock = MockTransport::new();
        mock.queue_word(2982); // 298.2 K = 25.05 C
        let gauge = gauge_with(&mock);
        let celsius = gauge.temperature_c().unwrap();
        assert!((celsius - 25.05).abs() < 0.01);
    }
}
