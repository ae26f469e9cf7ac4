//! Production transport over any `embedded-hal` 1.0 I2C bus.

use std::sync::Mutex;

use embedded_hal::i2c::I2c;

use crate::protocol::constants::DEVICE_ADDRESS;
use crate::transport::traits::{GaugeTransport, TransportError};

/// Adapts a blocking `embedded_hal::i2c::I2c` bus to [`GaugeTransport`].
///
/// The bus handle needs `&mut self`, so it lives behind a `Mutex`; the
/// transport itself stays shareable.
pub struct HalTransport<I> {
    bus: Mutex<I>,
    address: u8,
}

impl<I> HalTransport<I> {
    pub fn new(bus: I) -> Self {
        Self::with_address(bus, DEVICE_ADDRESS)
    }

    pub fn with_address(bus: I, address: u8) -> Self {
        Self {
            bus: Mutex::new(bus),
            address,
        }
    }

    pub fn into_inner(self) -> I {
        self.bus.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<I> GaugeTransport for HalTransport<I>
where
    I: I2c + Send,
{
    fn write(&self, register: u8, data: &[u8]) -> Result<usize, TransportError> {
        let mut buf = Vec::with_capacity(1 + data.len());
        buf.push(register);
        buf.extend_from_slice(data);
        let mut bus = self.bus.lock().unwrap_or_else(|e| e.into_inner());
        bus.write(self.address, &buf)
            .map_err(|e| TransportError::WriteFailed(format!("{e:?}")))?;
        Ok(data.len())
    }

    fn read(&self, len: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; len];
        let mut bus = self.bus.lock().unwrap_or_else(|e| e.into_inner());
        bus.read(self.address, &mut buf)
            .map_err(|e| TransportError::ReadFailed(format!("{e:?}")))?;
        Ok(buf)
    }
}
