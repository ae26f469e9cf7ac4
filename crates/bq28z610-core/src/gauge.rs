//! The gauge handle and the AltManufacturerAccess block engine.

use std::sync::Arc;
use std::time::Duration;

use byteorder::{ByteOrder, LittleEndian};

use crate::delay::{DelaySource, NoopDelay, WallClockDelay};
use crate::error::{GaugeError, Result};
use crate::events::{GaugeEvent, GaugeObserver, NullObserver, PacketDirection};
use crate::protocol::constants::{
    ADDR_SIZE, CHECKSUM_INDEX, FRAME_SIZE, PAYLOAD_MAX, REG_ALT_MANUFACTURER_ACCESS,
    SUBCOMMAND_SETTLE, TRAILER_SIZE,
};
use crate::protocol::frame::BlockFrame;
use crate::protocol::{codec, WordOrder};
use crate::transport::GaugeTransport;

/// Handle to a single BQ28Z610 behind a transport.
///
/// The gauge is the sole owner of the device: all methods take `&self` and
/// issue bus transactions in program order with the datasheet delays in
/// between. A multi-threaded host wraps the whole handle in its own lock.
pub struct Gauge<T: GaugeTransport, O: GaugeObserver = NullObserver> {
    transport: T,
    observer: Arc<O>,
    delay: Box<dyn DelaySource>,
}

impl<T: GaugeTransport> Gauge<T, NullObserver> {
    /// A silent gauge with wall-clock delays.
    pub fn new(transport: T) -> Self {
        Self::with_observer(transport, Arc::new(NullObserver))
    }

    /// Shorthand for tests: silent observer, no sleeping.
    pub fn without_delays(transport: T) -> Self {
        Self::new(transport).with_delay(Box::new(NoopDelay))
    }
}

impl<T: GaugeTransport, O: GaugeObserver> Gauge<T, O> {
    pub fn with_observer(transport: T, observer: Arc<O>) -> Self {
        Self {
            transport,
            observer,
            delay: Box::new(WallClockDelay),
        }
    }

    /// Replace the delay source. Tests pass [`NoopDelay`].
    pub fn with_delay(mut self, delay: Box<dyn DelaySource>) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn emit(&self, event: GaugeEvent) {
        self.observer.on_event(&event);
    }

    pub(crate) fn wait(&self, duration: Duration) {
        self.delay.delay(duration);
    }

    // ==================== bus helpers ====================

    /// Arm the register pointer without sending data.
    pub(crate) fn send_register(&self, register: u8) -> Result<()> {
        self.transport.write(register, &[])?;
        self.emit(GaugeEvent::Packet {
            direction: PacketDirection::Tx,
            register: Some(register),
            data: Vec::new(),
        });
        Ok(())
    }

    /// Write a little-endian word to `register`.
    pub(crate) fn send_command(&self, register: u8, command: u16) -> Result<()> {
        let mut data = [0u8; 2];
        LittleEndian::write_u16(&mut data, command);
        self.send_data(register, &data)
    }

    pub(crate) fn send_data(&self, register: u8, data: &[u8]) -> Result<()> {
        self.transport.write(register, data)?;
        self.emit(GaugeEvent::Packet {
            direction: PacketDirection::Tx,
            register: Some(register),
            data: data.to_vec(),
        });
        Ok(())
    }

    /// Read exactly `len` bytes from the armed register pointer.
    pub(crate) fn request_bytes(&self, len: usize) -> Result<Vec<u8>> {
        let data = self.transport.read_exact(len)?;
        self.emit(GaugeEvent::Packet {
            direction: PacketDirection::Rx,
            register: None,
            data: data.clone(),
        });
        Ok(data)
    }

    /// Arm `register` and read a little-endian word back.
    pub(crate) fn read_register_word(&self, register: u8) -> Result<u16> {
        self.send_register(register)?;
        let data = self.request_bytes(2)?;
        Ok(codec::compose_word(&data, 0, WordOrder::LittleEndian)?)
    }

    // ==================== block engine ====================

    /// Dispatch `subcommand` without reading a response back.
    pub fn send_subcommand(&self, subcommand: u16) -> Result<()> {
        self.send_command(REG_ALT_MANUFACTURER_ACCESS, subcommand)?;
        self.emit(GaugeEvent::SubCommand { code: subcommand });
        Ok(())
    }

    /// Full block read cycle: dispatch, settle, re-arm, read the 36-byte
    /// frame as three bus transactions, validate, extract the payload.
    pub fn read_subcommand(&self, subcommand: u16) -> Result<Vec<u8>> {
        self.send_subcommand(subcommand)?;
        self.wait(SUBCOMMAND_SETTLE);
        // Reset the register pointer before reading the response out.
        self.send_register(REG_ALT_MANUFACTURER_ACCESS)?;

        let mut raw = [0u8; FRAME_SIZE];
        let head = self.request_bytes(ADDR_SIZE)?;
        raw[..ADDR_SIZE].copy_from_slice(&head);
        let body = self.request_bytes(PAYLOAD_MAX)?;
        raw[ADDR_SIZE..CHECKSUM_INDEX].copy_from_slice(&body);
        let tail = self.request_bytes(TRAILER_SIZE)?;
        raw[CHECKSUM_INDEX..].copy_from_slice(&tail);

        let frame = BlockFrame::new(raw);
        if !frame.is_valid() {
            self.emit(GaugeEvent::InvalidFrame { subcommand });
            return Err(GaugeError::InvalidFrame { subcommand });
        }
        self.emit(GaugeEvent::BlockRead {
            subcommand,
            payload_len: frame.payload().len(),
        });
        Ok(frame.payload().to_vec())
    }

    /// Block read returning a little-endian word from the payload head.
    pub fn read_subcommand_word(&self, subcommand: u16) -> Result<u16> {
        let payload = self.read_subcommand(subcommand)?;
        Ok(codec::compose_word_le(&payload)?)
    }

    /// Block read returning a little-endian dword from the payload head.
    pub fn read_subcommand_dword(&self, subcommand: u16) -> Result<u32> {
        let payload = self.read_subcommand(subcommand)?;
        Ok(codec::compose_dword(&payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, TransportError};

    fn quiet_gauge(mock: &MockTransport) -> Gauge<MockTransport> {
        Gauge::new(mock.clone()).with_delay(Box::new(NoopDelay))
    }

    #[test]
    fn read_subcommand_issues_dispatch_and_rearm() {
        let mock = MockTransport::new();
        mock.queue_frame(0x0001, &[0x10, 0x06]);
        let gauge = quiet_gauge(&mock);

        let payload = gauge.read_subcommand(0x0001).unwrap();
        assert_eq!(payload, vec![0x10, 0x06]);
        // Dispatch write, then the bare re-arm write.
        assert_eq!(
            mock.writes(),
            vec![(0x3E, vec![0x01, 0x00]), (0x3E, vec![])]
        );
    }

    #[test]
    fn read_subcommand_word_decodes_little_endian() {
        let mock = MockTransport::new();
        mock.queue_frame(0x0001, &[0x10, 0x06]);
        let gauge = quiet_gauge(&mock);
        assert_eq!(gauge.read_subcommand_word(0x0001).unwrap(), 0x0610);
    }

    #[test]
    fn invalid_frame_is_rejected() {
        let mock = MockTransport::new();
        // All-zero response: length byte 0, truncated sum 0.
        mock.queue_read(vec![0x00; 2]);
        mock.queue_read(vec![0x00; 32]);
        mock.queue_read(vec![0x00; 2]);
        let gauge = quiet_gauge(&mock);

        let err = gauge.read_subcommand(0x0054).unwrap_err();
        assert!(matches!(
            err,
            GaugeError::InvalidFrame { subcommand: 0x0054 }
        ));
    }

    #[test]
    fn short_read_surfaces_as_transport_error() {
        let mock = MockTransport::new();
        mock.queue_read(vec![0x54, 0x00]);
        mock.queue_read(vec![0x01, 0x02, 0x03]); // 3 of 32 payload bytes
        let gauge = quiet_gauge(&mock);

        let err = gauge.read_subcommand(0x0054).unwrap_err();
        assert!(matches!(
            err,
            GaugeError::Transport(TransportError::ShortRead {
                expected: 32,
                actual: 3
            })
        ));
    }

    #[test]
    fn send_subcommand_writes_word_only() {
        let mock = MockTransport::new();
        let gauge = quiet_gauge(&mock);
        gauge.send_subcommand(0x0030).unwrap();
        assert_eq!(mock.writes(), vec![(0x3E, vec![0x30, 0x00])]);
        assert_eq!(mock.queued_reads(), 0);
    }

    #[test]
    fn read_register_word_arms_then_reads() {
        let mock = MockTransport::new();
        mock.queue_word(0x0BB8); // 3000
        let gauge = quiet_gauge(&mock);
        assert_eq!(gauge.read_register_word(0x08).unwrap(), 3000);
        assert_eq!(mock.writes(), vec![(0x08, vec![])]);
    }
}
