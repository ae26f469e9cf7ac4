//! Host-side driver for the TI BQ28Z610 battery fuel gauge.
//!
//! The gauge speaks a block protocol over I2C: subcommands are dispatched
//! through the AltManufacturerAccess register (0x3E) and answered with a
//! 36-byte checksummed frame. On top of that sit the data-flash layer (the
//! configuration memory at 0x4000..0x5FFF), the security gate and the
//! standard SBS word registers.
//!
//! ```no_run
//! use bq28z610_core::{Gauge, MockTransport};
//!
//! # fn main() -> anyhow::Result<()> {
//! // Production code hands `Gauge` a `HalTransport` over a real I2C bus.
//! let gauge = Gauge::new(MockTransport::new());
//! let voltage = gauge.voltage_mv()?;
//! let qmax = gauge.read_qmax_pack()?; // fails if the device is sealed
//! # Ok(())
//! # }
//! ```

pub mod delay;
pub mod error;
pub mod events;
pub mod flags;
pub mod flash;
pub mod gauge;
pub mod mac;
pub mod protocol;
pub mod security;
pub mod service;
pub mod std_commands;
pub mod transport;

pub use delay::{DelaySource, NoopDelay, WallClockDelay};
pub use error::{GaugeError, PreconditionError, Result};
pub use events::{GaugeEvent, GaugeObserver, LogLevel, NullObserver, PacketDirection, TracingObserver};
pub use gauge::Gauge;
pub use mac::{DaStatus1, FirmwareVersion, ItStatus3};
pub use protocol::{BlockFrame, CodecError};
pub use security::SecurityMode;
pub use service::{LearningCycleConfig, LearningSnapshot};
pub use transport::{GaugeTransport, HalTransport, MockTransport, TransportError};
