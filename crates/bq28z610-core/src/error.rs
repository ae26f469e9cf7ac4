//! Crate-level error types.

use thiserror::Error;

use crate::protocol::codec::CodecError;
use crate::transport::TransportError;

/// A data-flash request rejected before (or instead of) touching the bus.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("flash address {address:#06X} outside {min:#06X}..={max:#06X}")]
    AddressOutOfRange { address: u16, min: u16, max: u16 },

    #[error("payload length {len} outside 1..={max}")]
    PayloadSize { len: usize, max: usize },

    #[error("device is sealed; unseal before accessing data flash")]
    DeviceSealed,
}

#[derive(Error, Debug)]
pub enum GaugeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Block response failed checksum/length validation.
    #[error("invalid block response for subcommand {subcommand:#06X}")]
    InvalidFrame { subcommand: u16 },

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub type Result<T> = std::result::Result<T, GaugeError>;
