//! Mock transport for tests: queued read chunks, captured writes and a
//! disconnect switch. Handles are cloneable; clones share the same queues so
//! a test can hold one while the gauge owns another.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::protocol::constants::{ADDR_SIZE, CHECKSUM_INDEX, PAYLOAD_MAX};
use crate::protocol::frame::BlockFrame;
use crate::transport::traits::{GaugeTransport, TransportError};

#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    read_queue: Arc<Mutex<VecDeque<Vec<u8>>>>,
    write_log: Arc<Mutex<Vec<(u8, Vec<u8>)>>>,
    disconnected: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one read chunk; each `read` call pops one chunk.
    pub fn queue_read(&self, data: Vec<u8>) {
        self.read_queue.lock().unwrap().push_back(data);
    }

    /// Queue a full block response for `address` as the three chunks the
    /// engine reads: address echo, 32-byte payload, checksum + length.
    pub fn queue_frame(&self, address: u16, payload: &[u8]) {
        let frame = BlockFrame::build(address, payload);
        let bytes = frame.as_bytes();
        self.queue_read(bytes[..ADDR_SIZE].to_vec());
        self.queue_read(bytes[ADDR_SIZE..ADDR_SIZE + PAYLOAD_MAX].to_vec());
        self.queue_read(bytes[CHECKSUM_INDEX..].to_vec());
    }

    /// Queue a raw frame verbatim, split into the three read chunks.
    pub fn queue_frame_bytes(&self, frame: &BlockFrame) {
        let bytes = frame.as_bytes();
        self.queue_read(bytes[..ADDR_SIZE].to_vec());
        self.queue_read(bytes[ADDR_SIZE..ADDR_SIZE + PAYLOAD_MAX].to_vec());
        self.queue_read(bytes[CHECKSUM_INDEX..].to_vec());
    }

    /// Queue a 2-byte little-endian register read.
    pub fn queue_word(&self, value: u16) {
        self.queue_read(value.to_le_bytes().to_vec());
    }

    /// All `(register, payload)` writes seen so far, in order.
    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.write_log.lock().unwrap().clone()
    }

    pub fn clear_writes(&self) {
        self.write_log.lock().unwrap().clear();
    }

    pub fn queued_reads(&self) -> usize {
        self.read_queue.lock().unwrap().len()
    }

    pub fn set_disconnected(&self, disconnected: bool) {
        self.disconnected.store(disconnected, Ordering::SeqCst);
    }
}

impl GaugeTransport for MockTransport {
    fn write(&self, register: u8, data: &[u8]) -> Result<usize, TransportError> {
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(TransportError::Disconnected);
        }
        self.write_log
            .lock()
            .unwrap()
            .push((register, data.to_vec()));
        Ok(data.len())
    }

    fn read(&self, len: usize) -> Result<Vec<u8>, TransportError> {
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(TransportError::Disconnected);
        }
        let chunk = self
            .read_queue
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::ReadFailed("read queue empty".into()))?;
        Ok(chunk.into_iter().take(len).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_logged_in_order() {
        let mock = MockTransport::new();
        mock.write(0x3E, &[0x54, 0x00]).unwrap();
        mock.write(0x60, &[0xAB, 0x06]).unwrap();
        assert_eq!(
            mock.writes(),
            vec![(0x3E, vec![0x54, 0x00]), (0x60, vec![0xAB, 0x06])]
        );
    }

    #[test]
    fn queued_frame_pops_as_three_chunks() {
        let mock = MockTransport::new();
        mock.queue_frame(0x0001, &[0x10, 0x06]);
        assert_eq!(mock.read(2).unwrap(), vec![0x01, 0x00]);
        assert_eq!(mock.read(32).unwrap().len(), 32);
        assert_eq!(mock.read(2).unwrap().len(), 2);
        assert_eq!(mock.queued_reads(), 0);
    }

    #[test]
    fn disconnect_fails_both_directions() {
        let mock = MockTransport::new();
        mock.queue_word(0x1234);
        mock.set_disconnected(true);
        assert!(matches!(
            mock.write(0x00, &[]),
            Err(TransportError::Disconnected)
        ));
        assert!(matches!(mock.read(2), Err(TransportError::Disconnected)));
    }

    #[test]
    fn short_read_is_detected_by_read_exact() {
        let mock = MockTransport::new();
        mock.queue_read(vec![0x01]);
        let err = mock.read_exact(2).unwrap_err();
        assert!(matches!(
            err,
            TransportError::ShortRead {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn clones_share_state() {
        let mock = MockTransport::new();
        let handle = mock.clone();
        handle.queue_word(0x0102);
        assert_eq!(mock.read(2).unwrap(), vec![0x02, 0x01]);
    }
}
