//! Observer interface for gauge diagnostics.
//!
//! The core emits events instead of printing; callers attach a sink if they
//! want visibility. The default [`NullObserver`] keeps the library silent.

use std::fmt;

use crate::security::SecurityMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketDirection {
    Tx,
    Rx,
}

impl fmt::Display for PacketDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketDirection::Tx => write!(f, "TX"),
            PacketDirection::Rx => write!(f, "RX"),
        }
    }
}

/// Events emitted during gauge interaction.
#[derive(Debug, Clone)]
pub enum GaugeEvent {
    /// Raw bus traffic. `register` is `None` for reads (the chip uses an
    /// internal register pointer armed by the preceding write).
    Packet {
        direction: PacketDirection,
        register: Option<u8>,
        data: Vec<u8>,
    },
    /// A subcommand was dispatched to AltManufacturerAccess.
    SubCommand { code: u16 },
    /// A block response passed validation.
    BlockRead { subcommand: u16, payload_len: usize },
    /// A block response failed checksum/length validation.
    InvalidFrame { subcommand: u16 },
    /// A data-flash write sequence completed.
    FlashWrite { address: u16, length: usize },
    /// Security mode was read from OperationStatus.
    SecurityModeRead { mode: SecurityMode },
    /// Free-form diagnostic message.
    Log { level: LogLevel, message: String },
}

/// Observer for gauge events.
pub trait GaugeObserver: Send + Sync {
    fn on_event(&self, event: &GaugeEvent);
}

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl GaugeObserver for NullObserver {
    fn on_event(&self, _event: &GaugeEvent) {}
}

/// Bridges events to the `tracing` ecosystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl GaugeObserver for TracingObserver {
    fn on_event(&self, event: &GaugeEvent) {
        match event {
            GaugeEvent::Packet {
                direction,
                register,
                data,
            } => match register {
                Some(register) => tracing::trace!(
                    %direction,
                    register = %format_args!("{register:#04X}"),
                    len = data.len(),
                    data = ?data,
                    "packet"
                ),
                None => tracing::trace!(%direction, len = data.len(), data = ?data, "packet"),
            },
            GaugeEvent::SubCommand { code } => {
                tracing::debug!(code = %format_args!("{code:#06X}"), "subcommand");
            }
            GaugeEvent::BlockRead {
                subcommand,
                payload_len,
            } => {
                tracing::debug!(
                    subcommand = %format_args!("{subcommand:#06X}"),
                    payload_len,
                    "block read"
                );
            }
            GaugeEvent::InvalidFrame { subcommand } => {
                tracing::warn!(
                    subcommand = %format_args!("{subcommand:#06X}"),
                    "invalid block response"
                );
            }
            GaugeEvent::FlashWrite { address, length } => {
                tracing::info!(
                    address = %format_args!("{address:#06X}"),
                    length,
                    "flash write"
                );
            }
            GaugeEvent::SecurityModeRead { mode } => {
                tracing::debug!(%mode, "security mode");
            }
            GaugeEvent::Log { level, message } => match level {
                LogLevel::Trace => tracing::trace!("{message}"),
                LogLevel::Debug => tracing::debug!("{message}"),
                LogLevel::Info => tracing::info!("{message}"),
                LogLevel::Warn => tracing::warn!("{message}"),
                LogLevel::Error => tracing::error!("{message}"),
            },
        }
    }
}
