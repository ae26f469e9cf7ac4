//! Transport abstraction over the I2C link to the gauge.

use thiserror::Error;

/// Errors from the bus backend.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I2C write failed: {0}")]
    WriteFailed(String),

    #[error("I2C read failed: {0}")]
    ReadFailed(String),

    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("Device disconnected")]
    Disconnected,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A blocking byte pipe to a fixed device address.
///
/// The backend owns the address and serializes access, so methods take
/// `&self` and the trait is safe to share behind an `Arc`.
pub trait GaugeTransport: Send + Sync {
    /// Write `data` to `register` in a single bus transaction.
    ///
    /// Returns the number of payload bytes written.
    fn write(&self, register: u8, data: &[u8]) -> Result<usize, TransportError>;

    /// Read up to `len` bytes from the current register pointer.
    fn read(&self, len: usize) -> Result<Vec<u8>, TransportError>;

    /// Read exactly `len` bytes, turning a short read into an error.
    fn read_exact(&self, len: usize) -> Result<Vec<u8>, TransportError> {
        let data = self.read(len)?;
        if data.len() != len {
            return Err(TransportError::ShortRead {
                expected: len,
                actual: data.len(),
            });
        }
        Ok(data)
    }
}
