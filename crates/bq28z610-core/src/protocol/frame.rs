//! AltManufacturerAccess block frame.
//!
//! Every block response is 36 bytes on the wire: a 2-byte little-endian echo
//! of the requested subcommand/address, 32 payload bytes (zero padded), a
//! checksum byte and a total-length byte. The length counts the payload plus
//! the 4 service bytes.

use byteorder::{ByteOrder, LittleEndian};

use crate::protocol::codec;
use crate::protocol::constants::{
    ADDR_SIZE, CHECKSUM_INDEX, DATA_INDEX, FRAME_SIZE, LENGTH_INDEX, PAYLOAD_MAX, SERVICE_SIZE,
};

/// A raw 36-byte block response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFrame {
    bytes: [u8; FRAME_SIZE],
}

impl BlockFrame {
    pub fn new(bytes: [u8; FRAME_SIZE]) -> Self {
        Self { bytes }
    }

    /// Assemble a well-formed frame for `address` carrying `payload`.
    ///
    /// Used by the mock side of the world; payload must fit in 32 bytes.
    pub fn build(address: u16, payload: &[u8]) -> Self {
        debug_assert!(payload.len() <= PAYLOAD_MAX);
        let mut bytes = [0u8; FRAME_SIZE];
        LittleEndian::write_u16(&mut bytes[..ADDR_SIZE], address);
        let n = payload.len().min(PAYLOAD_MAX);
        bytes[DATA_INDEX..DATA_INDEX + n].copy_from_slice(&payload[..n]);
        let length = n + SERVICE_SIZE;
        bytes[LENGTH_INDEX] = length as u8;
        bytes[CHECKSUM_INDEX] = codec::checksum(&bytes[..length - TRAILER_CHECKED]);
        Self { bytes }
    }

    /// The echoed subcommand / flash address.
    pub fn address(&self) -> u16 {
        LittleEndian::read_u16(&self.bytes[..ADDR_SIZE])
    }

    pub fn checksum(&self) -> u8 {
        self.bytes[CHECKSUM_INDEX]
    }

    /// Total length field: payload length + 4 service bytes.
    pub fn total_length(&self) -> u8 {
        self.bytes[LENGTH_INDEX]
    }

    /// Verify the frame the way the gauge arms it.
    ///
    /// The checksum byte is the one's complement of the sum of the first
    /// `length - 2` bytes, so adding it back makes a correct frame sum to
    /// 0xFF. The truncated sum is zero only for an all-zero response (sealed
    /// device or bus glitch), so nonzero is taken as valid.
    pub fn is_valid(&self) -> bool {
        let length = usize::from(self.total_length());
        if !(SERVICE_SIZE..=FRAME_SIZE).contains(&length) {
            return false;
        }
        let sum = self.bytes[..length - TRAILER_CHECKED]
            .iter()
            .fold(self.checksum(), |acc, &b| acc.wrapping_add(b));
        sum != 0
    }

    /// Payload slice, `length - 4` bytes starting after the address echo.
    pub fn payload(&self) -> &[u8] {
        let n = usize::from(self.total_length())
            .saturating_sub(SERVICE_SIZE)
            .min(PAYLOAD_MAX);
        &self.bytes[DATA_INDEX..DATA_INDEX + n]
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.bytes
    }
}

/// Bytes excluded from the checksum: the checksum and length fields.
const TRAILER_CHECKED: usize = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_produces_expected_layout() {
        let frame = BlockFrame::build(0x4206, &[0x94, 0x13]);
        let bytes = frame.as_bytes();
        assert_eq!(&bytes[..4], &[0x06, 0x42, 0x94, 0x13]);
        assert!(bytes[4..CHECKSUM_INDEX].iter().all(|&b| b == 0));
        // !(0x06 + 0x42 + 0x94 + 0x13) = 0x10
        assert_eq!(frame.checksum(), 0x10);
        assert_eq!(frame.total_length(), 6);
    }

    #[test]
    fn valid_frame_sums_to_ff() {
        let frame = BlockFrame::build(0x0054, &[0x00, 0x02, 0x00, 0x00]);
        let length = usize::from(frame.total_length());
        let sum = frame.as_bytes()[..length - 2]
            .iter()
            .fold(frame.checksum(), |acc, &b| acc.wrapping_add(b));
        assert_eq!(sum, 0xFF);
        assert!(frame.is_valid());
    }

    #[test]
    fn corrupted_checksum_is_rejected_when_sum_cancels() {
        // Craft a frame whose truncated sum lands exactly on zero.
        let mut bytes = [0u8; FRAME_SIZE];
        bytes[LENGTH_INDEX] = 4;
        bytes[CHECKSUM_INDEX] = 0x00;
        let frame = BlockFrame::new(bytes);
        assert!(!frame.is_valid());
    }

    #[test]
    fn out_of_range_length_is_rejected() {
        let mut bytes = [0u8; FRAME_SIZE];
        bytes[LENGTH_INDEX] = 3;
        bytes[CHECKSUM_INDEX] = 0x01;
        assert!(!BlockFrame::new(bytes).is_valid());

        bytes[LENGTH_INDEX] = 37;
        assert!(!BlockFrame::new(bytes).is_valid());
    }

    #[test]
    fn payload_spans_length_minus_service_bytes() {
        let frame = BlockFrame::build(0x0002, &[0x12, 0x08, 0x00, 0x37, 0x00, 0x01, 0x00]);
        assert_eq!(frame.payload(), &[0x12, 0x08, 0x00, 0x37, 0x00, 0x01, 0x00]);
        assert_eq!(frame.address(), 0x0002);
    }

    #[test]
    fn full_payload_round_trips() {
        let payload: Vec<u8> = (0..32).collect();
        let frame = BlockFrame::build(0x4000, &payload);
        assert!(frame.is_valid());
        assert_eq!(frame.payload(), payload.as_slice());
        assert_eq!(frame.total_length(), 36);
    }
}
