//! Byte-level helpers shared by the frame layer and the typed getters.

use thiserror::Error;

/// Errors from value composition over raw buffers.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// The requested byte range does not describe a value inside the buffer.
    #[error("invalid byte range for value composition")]
    InvalidRange,
}

/// Byte order of a two-byte field inside a response buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordOrder {
    /// MSB follows the LSB (`buf[lsb + 1]`).
    LittleEndian,
    /// MSB precedes the LSB (`buf[lsb - 1]`).
    BigEndian,
}

/// Compose a 16-bit word from the byte at `lsb_index` and its neighbor.
pub fn compose_word(buf: &[u8], lsb_index: usize, order: WordOrder) -> Result<u16, CodecError> {
    let msb_index = match order {
        WordOrder::LittleEndian => lsb_index.checked_add(1),
        WordOrder::BigEndian => lsb_index.checked_sub(1),
    }
    .ok_or(CodecError::InvalidRange)?;
    if lsb_index >= buf.len() || msb_index >= buf.len() {
        return Err(CodecError::InvalidRange);
    }
    Ok(u16::from(buf[msb_index]) << 8 | u16::from(buf[lsb_index]))
}

/// Compose a little-endian word from the first two bytes of `buf`.
pub fn compose_word_le(buf: &[u8]) -> Result<u16, CodecError> {
    compose_word(buf, 0, WordOrder::LittleEndian)
}

/// Fold the little-endian byte range `[first, last]` into an integer.
///
/// `last` must be strictly greater than `first` and inside the buffer.
pub fn compose_value(buf: &[u8], first: usize, last: usize) -> Result<u32, CodecError> {
    if last <= first || last >= buf.len() {
        return Err(CodecError::InvalidRange);
    }
    let mut value: u32 = 0;
    for i in (first..=last).rev() {
        value = (value << 8) | u32::from(buf[i]);
    }
    Ok(value)
}

/// Compose a little-endian dword from the first four bytes of `buf`.
pub fn compose_dword(buf: &[u8]) -> Result<u32, CodecError> {
    compose_value(buf, 0, 3)
}

/// One's complement of the mod-256 sum, as the gauge computes it.
pub fn checksum(data: &[u8]) -> u8 {
    !data.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_word_little_endian() {
        let buf = [0x94, 0x13, 0xFF];
        assert_eq!(compose_word(&buf, 0, WordOrder::LittleEndian), Ok(0x1394));
    }

    #[test]
    fn compose_word_big_endian() {
        let buf = [0x13, 0x94];
        assert_eq!(compose_word(&buf, 1, WordOrder::BigEndian), Ok(0x1394));
    }

    #[test]
    fn compose_word_rejects_out_of_bounds() {
        let buf = [0x01, 0x02];
        assert_eq!(
            compose_word(&buf, 1, WordOrder::LittleEndian),
            Err(CodecError::InvalidRange)
        );
        assert_eq!(
            compose_word(&buf, 0, WordOrder::BigEndian),
            Err(CodecError::InvalidRange)
        );
    }

    #[test]
    fn compose_value_folds_little_endian() {
        let buf = [0x78, 0x56, 0x34, 0x12];
        assert_eq!(compose_value(&buf, 0, 3), Ok(0x1234_5678));
        assert_eq!(compose_value(&buf, 1, 2), Ok(0x3456));
    }

    #[test]
    fn compose_value_rejects_degenerate_ranges() {
        let buf = [0x01, 0x02, 0x03];
        assert_eq!(compose_value(&buf, 2, 2), Err(CodecError::InvalidRange));
        assert_eq!(compose_value(&buf, 2, 1), Err(CodecError::InvalidRange));
        assert_eq!(compose_value(&buf, 0, 3), Err(CodecError::InvalidRange));
    }

    #[test]
    fn checksum_is_ones_complement_of_sum() {
        assert_eq!(checksum(&[]), 0xFF);
        assert_eq!(checksum(&[0x01]), 0xFE);
        // 0x06 + 0x42 + 0x94 + 0x13 = 0xEF -> !0xEF = 0x10
        assert_eq!(checksum(&[0x06, 0x42, 0x94, 0x13]), 0x10);
    }

    #[test]
    fn checksum_wraps_mod_256() {
        assert_eq!(checksum(&[0xFF, 0xFF]), !0xFEu8);
    }
}
