//! Security mode decoding and the seal/unseal sequences (TRM 9.5).

use std::fmt;

use crate::error::Result;
use crate::events::{GaugeEvent, GaugeObserver};
use crate::gauge::Gauge;
use crate::protocol::constants::{
    DEFAULT_FULL_ACCESS_KEY, DEFAULT_UNSEAL_KEY, REG_ALT_MANUFACTURER_ACCESS,
    SUBCMD_SEAL_DEVICE, SUBCOMMAND_TOGGLE_SETTLE, UNSEAL_KEY_GAP, UNSEAL_SETTLE,
};
use crate::transport::GaugeTransport;

/// Access level, from OperationStatus bits 9:8 ([SEC1][SEC0]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    Reserved,
    FullAccess,
    Unsealed,
    Sealed,
}

/// Bit position of SEC0 in OperationStatus.
pub const OPERATION_STATUS_SEC_SHIFT: u32 = 8;

impl SecurityMode {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b01 => SecurityMode::FullAccess,
            0b10 => SecurityMode::Unsealed,
            0b11 => SecurityMode::Sealed,
            _ => SecurityMode::Reserved,
        }
    }

    /// Decode from a full OperationStatus dword.
    pub fn from_operation_status(status: u32) -> Self {
        Self::from_bits((status >> OPERATION_STATUS_SEC_SHIFT) as u8)
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityMode::Reserved => write!(f, "Reserved"),
            SecurityMode::FullAccess => write!(f, "Full Access"),
            SecurityMode::Unsealed => write!(f, "Unsealed"),
            SecurityMode::Sealed => write!(f, "Sealed"),
        }
    }
}

impl<T: GaugeTransport, O: GaugeObserver> Gauge<T, O> {
    /// Current security mode. Always re-reads OperationStatus; the mode is
    /// never cached because the device can reseal underneath the host.
    pub fn security_mode(&self) -> Result<SecurityMode> {
        let status = self.operation_status()?;
        let mode = SecurityMode::from_operation_status(status);
        self.emit(GaugeEvent::SecurityModeRead { mode });
        Ok(mode)
    }

    /// SEALED to UNSEALED: the key goes out as two little-endian word
    /// writes, low word first, with the settle times the datasheet requires.
    pub fn unseal(&self, key: u32) -> Result<()> {
        self.send_command(REG_ALT_MANUFACTURER_ACCESS, (key & 0xFFFF) as u16)?;
        self.wait(UNSEAL_KEY_GAP);
        self.send_command(REG_ALT_MANUFACTURER_ACCESS, (key >> 16) as u16)?;
        self.wait(UNSEAL_SETTLE);
        Ok(())
    }

    pub fn unseal_default(&self) -> Result<()> {
        self.unseal(DEFAULT_UNSEAL_KEY)
    }

    /// UNSEALED to FULL ACCESS: same two-word sequence with the full-access
    /// key.
    pub fn full_access(&self, key: u32) -> Result<()> {
        self.unseal(key)
    }

    pub fn full_access_default(&self) -> Result<()> {
        self.full_access(DEFAULT_FULL_ACCESS_KEY)
    }

    /// Return to SEALED via the SealDevice subcommand.
    pub fn seal(&self) -> Result<()> {
        self.send_subcommand(SUBCMD_SEAL_DEVICE)?;
        self.wait(SUBCOMMAND_TOGGLE_SETTLE);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::SUBCMD_OPERATION_STATUS;
    use crate::transport::MockTransport;

    #[test]
    fn mode_decode_table() {
        assert_eq!(SecurityMode::from_bits(0b00), SecurityMode::Reserved);
        assert_eq!(SecurityMode::from_bits(0b01), SecurityMode::FullAccess);
        assert_eq!(SecurityMode::from_bits(0b10), SecurityMode::Unsealed);
        assert_eq!(SecurityMode::from_bits(0b11), SecurityMode::Sealed);
    }

    #[test]
    fn mode_comes_from_bits_9_8() {
        assert_eq!(
            SecurityMode::from_operation_status(0x0000_0300),
            SecurityMode::Sealed
        );
        assert_eq!(
            SecurityMode::from_operation_status(0x0000_0200),
            SecurityMode::Unsealed
        );
        assert_eq!(
            SecurityMode::from_operation_status(0x0000_0100),
            SecurityMode::FullAccess
        );
    }

    #[test]
    fn security_mode_reads_operation_status() {
        let mock = MockTransport::new();
        mock.queue_frame(SUBCMD_OPERATION_STATUS, &[0x00, 0x02, 0x00, 0x00]);
        let gauge = Gauge::without_delays(mock.clone());
        assert_eq!(gauge.security_mode().unwrap(), SecurityMode::Unsealed);
    }

    #[test]
    fn unseal_writes_key_low_word_first() {
        let mock = MockTransport::new();
        let gauge = Gauge::without_delays(mock.clone());
        gauge.unseal(0x3672_0414).unwrap();
        assert_eq!(
            mock.writes(),
            vec![(0x3E, vec![0x14, 0x04]), (0x3E, vec![0x72, 0x36])]
        );
    }

    #[test]
    fn seal_sends_seal_device_subcommand() {
        let mock = MockTransport::new();
        let gauge = Gauge::without_delays(mock.clone());
        gauge.seal().unwrap();
        assert_eq!(mock.writes(), vec![(0x3E, vec![0x30, 0x00])]);
    }
}
