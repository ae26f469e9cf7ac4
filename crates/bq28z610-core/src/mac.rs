//! AltManufacturerAccess subcommand getters and toggles (TRM chapter 12.2).
//!
//! The block engine accepts any 16-bit code; everything here is a typed
//! convenience over [`Gauge::read_subcommand`] / [`Gauge::send_subcommand`]
//! for the documented catalog.

use crate::error::Result;
use crate::events::GaugeObserver;
use crate::gauge::Gauge;
use crate::protocol::codec::{self, CodecError, WordOrder};
use crate::protocol::constants::{
    PF_CLEAR_SETTLE, SUBCMD_CHARGING_STATUS, SUBCMD_CHEMICAL_ID, SUBCMD_CHG_FET,
    SUBCMD_DA_STATUS_1, SUBCMD_DEVICE_RESET, SUBCMD_DEVICE_TYPE, SUBCMD_DSG_FET,
    SUBCMD_FET_CONTROL, SUBCMD_FIRMWARE_VERSION, SUBCMD_GAUGE_EN, SUBCMD_GAUGING_STATUS,
    SUBCMD_HARDWARE_VERSION, SUBCMD_IT_STATUS_1, SUBCMD_IT_STATUS_2, SUBCMD_IT_STATUS_3,
    SUBCMD_LIFETIME_DATA_RESET, SUBCMD_MANUFACTURING_STATUS, SUBCMD_OPERATION_STATUS,
    SUBCMD_PERMANENT_FAIL_DATA_RESET, SUBCMD_PF_ALERT, SUBCMD_PF_STATUS, SUBCMD_SAFETY_ALERT,
    SUBCMD_SAFETY_STATUS, SUBCOMMAND_TOGGLE_SETTLE,
};
use crate::transport::GaugeTransport;

/// Parsed FirmwareVersion() response (12.2.2), wire layout
/// `ddDDvvVVbbBBTTzzZZ` with big-endian fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub device_number: u16,
    pub version: u16,
    pub build: u16,
    pub firmware_type: u8,
    pub impedance_track_version: u16,
}

impl FirmwareVersion {
    pub fn parse(payload: &[u8]) -> std::result::Result<Self, CodecError> {
        if payload.len() < 9 {
            return Err(CodecError::InvalidRange);
        }
        Ok(Self {
            device_number: codec::compose_word(payload, 1, WordOrder::BigEndian)?,
            version: codec::compose_word(payload, 3, WordOrder::BigEndian)?,
            build: codec::compose_word(payload, 5, WordOrder::BigEndian)?,
            firmware_type: payload[6],
            impedance_track_version: codec::compose_word(payload, 8, WordOrder::BigEndian)?,
        })
    }
}

/// Parsed DAStatus1() response (12.2.37): per-cell voltages, currents and
/// power, little-endian words at fixed offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaStatus1 {
    pub cell_voltage_1_mv: u16,
    pub cell_voltage_2_mv: u16,
    pub bat_voltage_mv: u16,
    pub pack_voltage_mv: u16,
    pub cell_current_1_ma: i16,
    pub cell_current_2_ma: i16,
    pub cell_power_1_cw: i16,
    pub cell_power_2_cw: i16,
    pub power_cw: i16,
    pub average_power_cw: i16,
}

impl DaStatus1 {
    pub fn parse(payload: &[u8]) -> std::result::Result<Self, CodecError> {
        let word = |i| codec::compose_word(payload, i, WordOrder::LittleEndian);
        Ok(Self {
            cell_voltage_1_mv: word(0)?,
            cell_voltage_2_mv: word(2)?,
            bat_voltage_mv: word(8)?,
            pack_voltage_mv: word(10)?,
            cell_current_1_ma: word(12)? as i16,
            cell_current_2_ma: word(14)? as i16,
            cell_power_1_cw: word(20)? as i16,
            cell_power_2_cw: word(22)? as i16,
            power_cw: word(28)? as i16,
            average_power_cw: word(30)? as i16,
        })
    }
}

/// Parsed ITStatus3() response (12.2.41): Impedance Track Qmax state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItStatus3 {
    pub qmax_cell_1: u16,
    pub qmax_cell_2: u16,
    pub qmax_dod0_1: u16,
    pub qmax_dod0_2: u16,
    pub qmax_passed_q: u16,
    pub qmax_time: u16,
    pub tk: u16,
    pub ta: u16,
    pub raw_dod0_1: u16,
    pub raw_dod0_2: u16,
}

impl ItStatus3 {
    pub fn parse(payload: &[u8]) -> std::result::Result<Self, CodecError> {
        let word = |i| codec::compose_word(payload, i, WordOrder::LittleEndian);
        Ok(Self {
            qmax_cell_1: word(0)?,
            qmax_cell_2: word(2)?,
            qmax_dod0_1: word(4)?,
            qmax_dod0_2: word(6)?,
            qmax_passed_q: word(8)?,
            qmax_time: word(10)?,
            tk: word(12)?,
            ta: word(14)?,
            raw_dod0_1: word(16)?,
            raw_dod0_2: word(18)?,
        })
    }
}

/// Offset of DOD0 Passed Q inside the ITStatus2 payload.
const IT_STATUS_2_DOD0_PASSED_Q: usize = 14;

impl<T: GaugeTransport, O: GaugeObserver> Gauge<T, O> {
    // ==================== identification ====================

    /// Device type, 0x2610 for this part (12.2.1).
    pub fn device_type(&self) -> Result<u16> {
        self.read_subcommand_word(SUBCMD_DEVICE_TYPE)
    }

    pub fn firmware_version(&self) -> Result<FirmwareVersion> {
        let payload = self.read_subcommand(SUBCMD_FIRMWARE_VERSION)?;
        Ok(FirmwareVersion::parse(&payload)?)
    }

    pub fn hardware_version(&self) -> Result<u16> {
        self.read_subcommand_word(SUBCMD_HARDWARE_VERSION)
    }

    pub fn chemical_id(&self) -> Result<u16> {
        self.read_subcommand_word(SUBCMD_CHEMICAL_ID)
    }

    // ==================== toggles ====================

    /// Full device reset (12.2.12).
    pub fn device_reset(&self) -> Result<()> {
        self.toggle(SUBCMD_DEVICE_RESET)
    }

    /// Toggle the charge FET in manufacturing test mode (12.2.13).
    pub fn toggle_charge_fet(&self) -> Result<()> {
        self.toggle(SUBCMD_CHG_FET)
    }

    /// Toggle the discharge FET in manufacturing test mode (12.2.14).
    pub fn toggle_discharge_fet(&self) -> Result<()> {
        self.toggle(SUBCMD_DSG_FET)
    }

    /// Toggle gas gauging (12.2.15).
    pub fn toggle_gauging(&self) -> Result<()> {
        self.toggle(SUBCMD_GAUGE_EN)
    }

    /// Toggle ManufacturingStatus[FET_EN] (12.2.16).
    pub fn toggle_fet_control(&self) -> Result<()> {
        self.toggle(SUBCMD_FET_CONTROL)
    }

    /// Clear lifetime data in data flash (12.2.19).
    pub fn lifetime_data_reset(&self) -> Result<()> {
        self.toggle(SUBCMD_LIFETIME_DATA_RESET)
    }

    /// Clear permanent-fail flags; the gauge takes a while to recover
    /// (12.2.20).
    pub fn permanent_fail_data_reset(&self) -> Result<()> {
        self.send_subcommand(SUBCMD_PERMANENT_FAIL_DATA_RESET)?;
        self.wait(PF_CLEAR_SETTLE);
        Ok(())
    }

    fn toggle(&self, subcommand: u16) -> Result<()> {
        self.send_subcommand(subcommand)?;
        self.wait(SUBCOMMAND_TOGGLE_SETTLE);
        Ok(())
    }

    // ==================== status words ====================

    pub fn safety_alert(&self) -> Result<u32> {
        self.read_subcommand_dword(SUBCMD_SAFETY_ALERT)
    }

    pub fn safety_status(&self) -> Result<u32> {
        self.read_subcommand_dword(SUBCMD_SAFETY_STATUS)
    }

    pub fn pf_alert(&self) -> Result<u32> {
        self.read_subcommand_dword(SUBCMD_PF_ALERT)
    }

    pub fn pf_status(&self) -> Result<u32> {
        self.read_subcommand_dword(SUBCMD_PF_STATUS)
    }

    pub fn operation_status(&self) -> Result<u32> {
        self.read_subcommand_dword(SUBCMD_OPERATION_STATUS)
    }

    pub fn charging_status(&self) -> Result<u16> {
        self.read_subcommand_word(SUBCMD_CHARGING_STATUS)
    }

    pub fn gauging_status(&self) -> Result<u32> {
        self.read_subcommand_dword(SUBCMD_GAUGING_STATUS)
    }

    pub fn manufacturing_status(&self) -> Result<u16> {
        self.read_subcommand_word(SUBCMD_MANUFACTURING_STATUS)
    }

    // ==================== measurement blocks ====================

    pub fn da_status_1(&self) -> Result<DaStatus1> {
        let payload = self.read_subcommand(SUBCMD_DA_STATUS_1)?;
        Ok(DaStatus1::parse(&payload)?)
    }

    /// Raw ITStatus1 payload (12.2.39): DOD and true capacity words.
    pub fn it_status_1(&self) -> Result<Vec<u8>> {
        self.read_subcommand(SUBCMD_IT_STATUS_1)
    }

    /// Raw ITStatus2 payload (12.2.40).
    pub fn it_status_2(&self) -> Result<Vec<u8>> {
        self.read_subcommand(SUBCMD_IT_STATUS_2)
    }

    /// Passed charge since DOD0, from ITStatus2.
    pub fn dod0_passed_q(&self) -> Result<u16> {
        let payload = self.read_subcommand(SUBCMD_IT_STATUS_2)?;
        Ok(codec::compose_word(
            &payload,
            IT_STATUS_2_DOD0_PASSED_Q,
            WordOrder::LittleEndian,
        )?)
    }

    pub fn it_status_3(&self) -> Result<ItStatus3> {
        let payload = self.read_subcommand(SUBCMD_IT_STATUS_3)?;
        Ok(ItStatus3::parse(&payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    #[test]
    fn device_type_reads_word() {
        let mock = MockTransport::new();
        mock.queue_frame(SUBCMD_DEVICE_TYPE, &[0x10, 0x26]);
        let gauge = Gauge::without_delays(mock.clone());
        assert_eq!(gauge.device_type().unwrap(), 0x2610);
    }

    #[test]
    fn firmware_version_fields_are_big_endian() {
        // dd DD vv VV bb BB TT zz ZZ
        let payload = [0x26, 0x10, 0x00, 0x17, 0x00, 0x04, 0x01, 0x03, 0x0A, 0x00, 0x00];
        let fw = FirmwareVersion::parse(&payload).unwrap();
        assert_eq!(fw.device_number, 0x2610);
        assert_eq!(fw.version, 0x0017);
        assert_eq!(fw.build, 0x0004);
        assert_eq!(fw.firmware_type, 0x01);
        assert_eq!(fw.impedance_track_version, 0x030A);
    }

    #[test]
    fn firmware_version_rejects_truncated_payload() {
        assert_eq!(
            FirmwareVersion::parse(&[0x26, 0x10, 0x00]),
            Err(CodecError::InvalidRange)
        );
    }

    #[test]
    fn da_status_1_parses_fixed_offsets() {
        let mut payload = [0u8; 32];
        payload[0..2].copy_from_slice(&3700u16.to_le_bytes()); // cell 1
        payload[2..4].copy_from_slice(&3698u16.to_le_bytes()); // cell 2
        payload[8..10].copy_from_slice(&7398u16.to_le_bytes()); // BAT
        payload[10..12].copy_from_slice(&7400u16.to_le_bytes()); // PACK
        payload[12..14].copy_from_slice(&(-150i16).to_le_bytes()); // cell current 1
        let da = DaStatus1::parse(&payload).unwrap();
        assert_eq!(da.cell_voltage_1_mv, 3700);
        assert_eq!(da.cell_voltage_2_mv, 3698);
        assert_eq!(da.bat_voltage_mv, 7398);
        assert_eq!(da.pack_voltage_mv, 7400);
        assert_eq!(da.cell_current_1_ma, -150);
    }

    #[test]
    fn it_status_3_parses_qmax_words() {
        let mut payload = [0u8; 32];
        payload[0..2].copy_from_slice(&5000u16.to_le_bytes());
        payload[2..4].copy_from_slice(&4990u16.to_le_bytes());
        payload[8..10].copy_from_slice(&1234u16.to_le_bytes());
        let it = ItStatus3::parse(&payload).unwrap();
        assert_eq!(it.qmax_cell_1, 5000);
        assert_eq!(it.qmax_cell_2, 4990);
        assert_eq!(it.qmax_passed_q, 1234);
    }

    #[test]
    fn safety_status_uses_its_own_subcommand() {
        let mock = MockTransport::new();
        mock.queue_frame(SUBCMD_SAFETY_STATUS, &[0x01, 0x00, 0x00, 0x00]);
        let gauge = Gauge::without_delays(mock.clone());
        assert_eq!(gauge.safety_status().unwrap(), 0x0000_0001);
        assert_eq!(mock.writes()[0], (0x3E, vec![0x51, 0x00]));
    }

    #[test]
    fn pf_status_uses_its_own_subcommand() {
        let mock = MockTransport::new();
        mock.queue_frame(SUBCMD_PF_STATUS, &[0x00, 0x00, 0x00, 0x00]);
        let gauge = Gauge::without_delays(mock.clone());
        gauge.pf_status().unwrap();
        assert_eq!(mock.writes()[0], (0x3E, vec![0x53, 0x00]));
    }

    #[test]
    fn toggles_write_subcommand_only() {
        let mock = MockTransport::new();
        let gauge = Gauge::without_delays(mock.clone());
        gauge.toggle_charge_fet().unwrap();
        gauge.toggle_discharge_fet().unwrap();
        gauge.toggle_fet_control().unwrap();
        assert_eq!(
            mock.writes(),
            vec![
                (0x3E, vec![0x1F, 0x00]),
                (0x3E, vec![0x20, 0x00]),
                (0x3E, vec![0x22, 0x00]),
            ]
        );
    }
}
