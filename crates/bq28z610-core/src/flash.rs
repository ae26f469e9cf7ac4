//! Data-flash access (TRM chapter 13).
//!
//! Reads go through the block engine with the flash address as the
//! subcommand. Writes send `[addr LE ++ data]` to AltManufacturerAccess and
//! the checksum + length trailer to MACDataChecksum, then wait out the
//! commit time. Every access is gated: address window, payload size, then
//! the sealed check (last, because it costs a status read).

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{PreconditionError, Result};
use crate::events::{GaugeEvent, GaugeObserver};
use crate::gauge::Gauge;
use crate::protocol::codec::{self, WordOrder};
use crate::protocol::constants::{
    ADDR_SIZE, DF_CELL0_RA_FLAG, DF_CELL1_RA_FLAG, DF_CHARGE_TERM_TAPER_CURRENT, DF_CYCLE_COUNT,
    DF_DA_CONFIGURATION, DF_DESIGN_CAPACITY_CWH, DF_DESIGN_CAPACITY_MAH, DF_DEVICE_CHEMISTRY,
    DF_DEVICE_NAME, DF_FET_OPTIONS, DF_GAS_GAUGING_UPDATE_STATUS, DF_MANUFACTURER_NAME,
    DF_MAX_ADDR, DF_MIN_ADDR, DF_OCC_THRESHOLD, DF_OTC_RECOVERY, DF_OTC_THRESHOLD, DF_QMAX_CELL_1,
    DF_QMAX_CELL_2, DF_QMAX_PACK, DF_SOC_FLAG_CONFIG_A, DF_TC_CLEAR_RSOC_THRESHOLD,
    DF_TC_SET_RSOC_THRESHOLD, DF_X_CELL0_RA_FLAG, DF_X_CELL1_RA_FLAG, FLASH_COMMIT, PAYLOAD_MAX,
    RA_TABLE_NEVER_USED, RA_TABLE_USED_NOT_UPDATED, REG_ALT_MANUFACTURER_ACCESS,
    REG_MAC_DATA_CHECKSUM, SERVICE_SIZE,
};
use crate::security::SecurityMode;
use crate::transport::GaugeTransport;

/// The four Ra-flag words and their learning-cycle reset values, in the
/// order the reset writes them.
pub const RA_TABLE_RESET: [(u16, u16); 4] = [
    (DF_CELL0_RA_FLAG, RA_TABLE_USED_NOT_UPDATED),
    (DF_CELL1_RA_FLAG, RA_TABLE_USED_NOT_UPDATED),
    (DF_X_CELL0_RA_FLAG, RA_TABLE_NEVER_USED),
    (DF_X_CELL1_RA_FLAG, RA_TABLE_NEVER_USED),
];

fn check_address(address: u16) -> std::result::Result<(), PreconditionError> {
    if !(DF_MIN_ADDR..=DF_MAX_ADDR).contains(&address) {
        return Err(PreconditionError::AddressOutOfRange {
            address,
            min: DF_MIN_ADDR,
            max: DF_MAX_ADDR,
        });
    }
    Ok(())
}

fn check_payload_len(len: usize) -> std::result::Result<(), PreconditionError> {
    if len == 0 || len > PAYLOAD_MAX {
        return Err(PreconditionError::PayloadSize {
            len,
            max: PAYLOAD_MAX,
        });
    }
    Ok(())
}

impl<T: GaugeTransport, O: GaugeObserver> Gauge<T, O> {
    fn ensure_unsealed(&self) -> Result<()> {
        if self.security_mode()? == SecurityMode::Sealed {
            return Err(PreconditionError::DeviceSealed.into());
        }
        Ok(())
    }

    /// Read `len` bytes of data flash starting at `address`.
    pub fn read_flash(&self, address: u16, len: usize) -> Result<Vec<u8>> {
        check_address(address)?;
        check_payload_len(len)?;
        self.ensure_unsealed()?;
        let mut data = self.read_subcommand(address)?;
        data.resize(len, 0);
        Ok(data)
    }

    /// Write `data` to data flash at `address`. The gauge commits the row
    /// internally; there is no automatic read-back verify.
    pub fn write_flash(&self, address: u16, data: &[u8]) -> Result<()> {
        check_address(address)?;
        check_payload_len(data.len())?;
        self.ensure_unsealed()?;

        let mut buf = Vec::with_capacity(ADDR_SIZE + data.len());
        let mut addr_bytes = [0u8; ADDR_SIZE];
        LittleEndian::write_u16(&mut addr_bytes, address);
        buf.extend_from_slice(&addr_bytes);
        buf.extend_from_slice(data);

        self.send_data(REG_ALT_MANUFACTURER_ACCESS, &buf)?;
        let trailer = [codec::checksum(&buf), (data.len() + SERVICE_SIZE) as u8];
        self.send_data(REG_MAC_DATA_CHECKSUM, &trailer)?;
        self.wait(FLASH_COMMIT);

        self.emit(GaugeEvent::FlashWrite {
            address,
            length: data.len(),
        });
        Ok(())
    }

    // ==================== typed helpers ====================

    pub fn read_flash_u8(&self, address: u16) -> Result<u8> {
        Ok(self.read_flash(address, 1)?[0])
    }

    pub fn write_flash_u8(&self, address: u16, value: u8) -> Result<()> {
        self.write_flash(address, &[value])
    }

    pub fn read_flash_i8(&self, address: u16) -> Result<i8> {
        Ok(self.read_flash_u8(address)? as i8)
    }

    pub fn write_flash_i8(&self, address: u16, value: i8) -> Result<()> {
        self.write_flash_u8(address, value as u8)
    }

    pub fn read_flash_word(&self, address: u16) -> Result<u16> {
        let data = self.read_flash(address, 2)?;
        Ok(codec::compose_word(&data, 0, WordOrder::LittleEndian)?)
    }

    pub fn write_flash_word(&self, address: u16, value: u16) -> Result<()> {
        self.write_flash(address, &value.to_le_bytes())
    }

    pub fn read_flash_i16(&self, address: u16) -> Result<i16> {
        Ok(self.read_flash_word(address)? as i16)
    }

    pub fn write_flash_i16(&self, address: u16, value: i16) -> Result<()> {
        self.write_flash_word(address, value as u16)
    }

    /// Read an S-type field: first byte is the string length, the text
    /// follows.
    pub fn read_flash_string(&self, address: u16) -> Result<String> {
        let data = self.read_flash(address, PAYLOAD_MAX)?;
        let len = usize::from(data[0]).min(data.len() - 1);
        Ok(String::from_utf8_lossy(&data[1..1 + len]).into_owned())
    }

    // ==================== named fields ====================

    pub fn manufacturer_name(&self) -> Result<String> {
        self.read_flash_string(DF_MANUFACTURER_NAME)
    }

    pub fn device_name(&self) -> Result<String> {
        self.read_flash_string(DF_DEVICE_NAME)
    }

    pub fn device_chemistry(&self) -> Result<String> {
        self.read_flash_string(DF_DEVICE_CHEMISTRY)
    }

    pub fn read_qmax_cell_1(&self) -> Result<i16> {
        self.read_flash_i16(DF_QMAX_CELL_1)
    }

    pub fn read_qmax_cell_2(&self) -> Result<i16> {
        self.read_flash_i16(DF_QMAX_CELL_2)
    }

    pub fn read_qmax_pack(&self) -> Result<i16> {
        self.read_flash_i16(DF_QMAX_PACK)
    }

    /// Write the per-cell Qmax values; the pack Qmax is always the smaller
    /// of the two.
    pub fn write_qmax(&self, cell_1: u16, cell_2: u16) -> Result<()> {
        self.write_flash_word(DF_QMAX_CELL_1, cell_1)?;
        self.write_flash_word(DF_QMAX_CELL_2, cell_2)?;
        self.write_flash_word(DF_QMAX_PACK, cell_1.min(cell_2))
    }

    pub fn read_update_status(&self) -> Result<u8> {
        self.read_flash_u8(DF_GAS_GAUGING_UPDATE_STATUS)
    }

    pub fn write_update_status(&self, value: u8) -> Result<()> {
        self.write_flash_u8(DF_GAS_GAUGING_UPDATE_STATUS, value)
    }

    pub fn read_flash_cycle_count(&self) -> Result<u16> {
        self.read_flash_word(DF_CYCLE_COUNT)
    }

    pub fn write_flash_cycle_count(&self, value: u16) -> Result<()> {
        self.write_flash_word(DF_CYCLE_COUNT, value)
    }

    pub fn read_design_capacity_mah(&self) -> Result<i16> {
        self.read_flash_i16(DF_DESIGN_CAPACITY_MAH)
    }

    pub fn write_design_capacity_mah(&self, value: i16) -> Result<()> {
        self.write_flash_i16(DF_DESIGN_CAPACITY_MAH, value)
    }

    pub fn read_design_capacity_cwh(&self) -> Result<i16> {
        self.read_flash_i16(DF_DESIGN_CAPACITY_CWH)
    }

    pub fn write_design_capacity_cwh(&self, value: i16) -> Result<()> {
        self.write_flash_i16(DF_DESIGN_CAPACITY_CWH, value)
    }

    pub fn read_fet_options(&self) -> Result<u8> {
        self.read_flash_u8(DF_FET_OPTIONS)
    }

    pub fn write_fet_options(&self, value: u8) -> Result<()> {
        self.write_flash_u8(DF_FET_OPTIONS, value)
    }

    pub fn read_da_configuration(&self) -> Result<u8> {
        self.read_flash_u8(DF_DA_CONFIGURATION)
    }

    pub fn read_soc_flag_config_a(&self) -> Result<u16> {
        self.read_flash_word(DF_SOC_FLAG_CONFIG_A)
    }

    pub fn write_soc_flag_config_a(&self, value: u16) -> Result<()> {
        self.write_flash_word(DF_SOC_FLAG_CONFIG_A, value)
    }

    pub fn read_tc_set_rsoc_threshold(&self) -> Result<u8> {
        self.read_flash_u8(DF_TC_SET_RSOC_THRESHOLD)
    }

    pub fn write_tc_set_rsoc_threshold(&self, value: u8) -> Result<()> {
        self.write_flash_u8(DF_TC_SET_RSOC_THRESHOLD, value)
    }

    pub fn read_tc_clear_rsoc_threshold(&self) -> Result<u8> {
        self.read_flash_u8(DF_TC_CLEAR_RSOC_THRESHOLD)
    }

    pub fn write_tc_clear_rsoc_threshold(&self, value: u8) -> Result<()> {
        self.write_flash_u8(DF_TC_CLEAR_RSOC_THRESHOLD, value)
    }

    pub fn read_taper_current(&self) -> Result<i16> {
        self.read_flash_i16(DF_CHARGE_TERM_TAPER_CURRENT)
    }

    pub fn write_taper_current(&self, value: i16) -> Result<()> {
        self.write_flash_i16(DF_CHARGE_TERM_TAPER_CURRENT, value)
    }

    pub fn read_occ_threshold(&self) -> Result<i16> {
        self.read_flash_i16(DF_OCC_THRESHOLD)
    }

    pub fn read_otc_threshold(&self) -> Result<i16> {
        self.read_flash_i16(DF_OTC_THRESHOLD)
    }

    pub fn read_otc_recovery(&self) -> Result<i16> {
        self.read_flash_i16(DF_OTC_RECOVERY)
    }

    // ==================== compound operations ====================

    /// Reset the Ra-flag words to their learning-cycle defaults: the live
    /// tables to "used, not updated" and the shadow tables to "never used".
    pub fn reset_ra_table_flags(&self) -> Result<()> {
        for (address, value) in RA_TABLE_RESET {
            self.write_flash_word(address, value)?;
        }
        Ok(())
    }

    /// Current Ra-flag words, in table order.
    pub fn read_ra_table_flags(&self) -> Result<[(u16, u16); 4]> {
        let mut flags = [(0u16, 0u16); 4];
        for (slot, (address, _)) in flags.iter_mut().zip(RA_TABLE_RESET) {
            *slot = (address, self.read_flash_word(address)?);
        }
        Ok(flags)
    }

    /// Dump the whole data-flash region in 32-byte strides.
    pub fn dump_flash(&self) -> Result<Vec<(u16, Vec<u8>)>> {
        let mut rows = Vec::new();
        let mut address = DF_MIN_ADDR;
        while address <= DF_MAX_ADDR - (PAYLOAD_MAX as u16 - 1) {
            rows.push((address, self.read_flash(address, PAYLOAD_MAX)?));
            address += PAYLOAD_MAX as u16;
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GaugeError;
    use crate::protocol::constants::SUBCMD_OPERATION_STATUS;
    use crate::transport::MockTransport;

    const UNSEALED_STATUS: [u8; 4] = [0x00, 0x02, 0x00, 0x00];
    const SEALED_STATUS: [u8; 4] = [0x00, 0x03, 0x00, 0x00];

    fn gauge_with(mock: &MockTransport) -> Gauge<MockTransport> {
        Gauge::without_delays(mock.clone())
    }

    /// Queue the security check plus a flash block response.
    fn queue_flash_read(mock: &MockTransport, address: u16, data: &[u8]) {
        mock.queue_frame(SUBCMD_OPERATION_STATUS, &UNSEALED_STATUS);
        let mut padded = data.to_vec();
        padded.resize(PAYLOAD_MAX, 0);
        mock.queue_frame(address, &padded);
    }

    #[test]
    fn read_flash_word_returns_stored_value() {
        let mock = MockTransport::new();
        queue_flash_read(&mock, 0x4206, &[0x94, 0x13]);
        let gauge = gauge_with(&mock);
        assert_eq!(gauge.read_flash_word(0x4206).unwrap(), 0x1394);
    }

    #[test]
    fn address_below_window_is_rejected_without_bus_traffic() {
        let mock = MockTransport::new();
        let gauge = gauge_with(&mock);
        let err = gauge.read_flash(0x3000, 2).unwrap_err();
        assert!(matches!(
            err,
            GaugeError::Precondition(PreconditionError::AddressOutOfRange { .. })
        ));
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn zero_and_oversize_lengths_are_rejected_without_bus_traffic() {
        let mock = MockTransport::new();
        let gauge = gauge_with(&mock);
        for len in [0, 33] {
            let err = gauge.read_flash(0x4000, len).unwrap_err();
            assert!(matches!(
                err,
                GaugeError::Precondition(PreconditionError::PayloadSize { .. })
            ));
        }
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn sealed_device_rejects_writes_after_status_read_only() {
        let mock = MockTransport::new();
        mock.queue_frame(SUBCMD_OPERATION_STATUS, &SEALED_STATUS);
        let gauge = gauge_with(&mock);
        let err = gauge.write_flash(0x4206, &[0x94, 0x13]).unwrap_err();
        assert!(matches!(
            err,
            GaugeError::Precondition(PreconditionError::DeviceSealed)
        ));
        // Only the OperationStatus dispatch and re-arm went out.
        let writes = mock.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], (0x3E, vec![0x54, 0x00]));
        assert_eq!(writes[1], (0x3E, vec![]));
    }

    #[test]
    fn write_flash_sends_buffer_then_checksum_trailer() {
        let mock = MockTransport::new();
        mock.queue_frame(SUBCMD_OPERATION_STATUS, &UNSEALED_STATUS);
        let gauge = gauge_with(&mock);
        gauge.write_flash(0x4206, &[0x94, 0x13]).unwrap();

        let writes = mock.writes();
        // [status dispatch, re-arm, data buffer, trailer]
        assert_eq!(writes.len(), 4);
        assert_eq!(writes[2], (0x3E, vec![0x06, 0x42, 0x94, 0x13]));
        // checksum(!(0x06+0x42+0x94+0x13)) = 0x10, length = 2 + 4
        assert_eq!(writes[3], (0x60, vec![0x10, 0x06]));
    }

    #[test]
    fn write_qmax_derives_pack_minimum() {
        let mock = MockTransport::new();
        for _ in 0..3 {
            mock.queue_frame(SUBCMD_OPERATION_STATUS, &UNSEALED_STATUS);
        }
        let gauge = gauge_with(&mock);
        gauge.write_qmax(5000, 4900).unwrap();

        let payloads: Vec<Vec<u8>> = mock
            .writes()
            .into_iter()
            .filter(|(reg, data)| *reg == 0x3E && data.len() == 4)
            .map(|(_, data)| data)
            .collect();
        assert_eq!(payloads.len(), 3);
        assert_eq!(payloads[0], vec![0x06, 0x42, 0x88, 0x13]); // cell 1 = 5000
        assert_eq!(payloads[1], vec![0x08, 0x42, 0x24, 0x13]); // cell 2 = 4900
        assert_eq!(payloads[2], vec![0x0A, 0x42, 0x24, 0x13]); // pack = min
    }

    #[test]
    fn ra_reset_writes_exactly_four_words_in_order() {
        let mock = MockTransport::new();
        for _ in 0..4 {
            mock.queue_frame(SUBCMD_OPERATION_STATUS, &UNSEALED_STATUS);
        }
        let gauge = gauge_with(&mock);
        gauge.reset_ra_table_flags().unwrap();

        let payloads: Vec<Vec<u8>> = mock
            .writes()
            .into_iter()
            .filter(|(reg, data)| *reg == 0x3E && data.len() == 4)
            .map(|(_, data)| data)
            .collect();
        assert_eq!(
            payloads,
            vec![
                vec![0x00, 0x41, 0x55, 0xFF],
                vec![0x40, 0x41, 0x55, 0xFF],
                vec![0x80, 0x41, 0xFF, 0xFF],
                vec![0xC0, 0x41, 0xFF, 0xFF],
            ]
        );
    }

    #[test]
    fn flash_string_is_length_prefixed() {
        let mock = MockTransport::new();
        let mut field = vec![4u8];
        field.extend_from_slice(b"LION");
        queue_flash_read(&mock, DF_DEVICE_CHEMISTRY, &field);
        let gauge = gauge_with(&mock);
        assert_eq!(gauge.device_chemistry().unwrap(), "LION");
    }
}
