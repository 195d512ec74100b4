//! Mock badge reader.
//!
//! Bytes pushed through the handle show up in the reader's next
//! `read_available` call, just like bytes arriving on a serial port.

use bytes::BytesMut;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;

use crate::{HardwareError, Result, traits::BadgeReader};
use interlock_core::constants::{FRAME_END, FRAME_START};

/// Mock badge reader for testing and development.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use interlock_hardware::mock::MockBadgeReader;
/// use interlock_hardware::traits::BadgeReader;
///
/// #[tokio::main]
/// async fn main() -> interlock_hardware::Result<()> {
///     let (mut reader, handle) = MockBadgeReader::new();
///
///     handle.tap("01AB123456")?;
///
///     let mut buf = BytesMut::new();
///     reader.read_available(&mut buf).await?;
///     assert_eq!(&buf[..], b"\x0A01AB123456\x0D");
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockBadgeReader {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    state: Arc<ReaderState>,
}

#[derive(Debug, Default)]
struct ReaderState {
    enabled: AtomicBool,
    disconnected: AtomicBool,
    discards: AtomicUsize,
}

impl MockBadgeReader {
    /// Create a new mock reader and its control handle.
    pub fn new() -> (Self, MockBadgeReaderHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(ReaderState::default());

        let reader = Self {
            rx,
            state: Arc::clone(&state),
        };
        let handle = MockBadgeReaderHandle { tx, state };

        (reader, handle)
    }
}

impl BadgeReader for MockBadgeReader {
    async fn read_available(&mut self, buf: &mut BytesMut) -> Result<usize> {
        if self.state.disconnected.load(Ordering::SeqCst) {
            return Err(HardwareError::disconnected("mock badge reader"));
        }

        let mut total = 0;
        while let Ok(bytes) = self.rx.try_recv() {
            // A disabled reader has no RF field, so nothing it "saw" arrives.
            if self.state.enabled.load(Ordering::SeqCst) {
                total += bytes.len();
                buf.extend_from_slice(&bytes);
            }
        }
        Ok(total)
    }

    async fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.state.enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    async fn discard_pending(&mut self) -> Result<()> {
        while self.rx.try_recv().is_ok() {}
        self.state.discards.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Handle for controlling a mock badge reader.
#[derive(Debug, Clone)]
pub struct MockBadgeReaderHandle {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    state: Arc<ReaderState>,
}

impl MockBadgeReaderHandle {
    /// Deliver raw bytes to the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub fn send_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.tx
            .send(bytes.to_vec())
            .map_err(|_| HardwareError::disconnected("mock badge reader dropped"))
    }

    /// Deliver a complete frame for the 10-character payload, including the
    /// trailing stop byte real readers send.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub fn tap(&self, payload: &str) -> Result<()> {
        let mut frame = Vec::with_capacity(payload.len() + 2);
        frame.push(FRAME_START);
        frame.extend_from_slice(payload.as_bytes());
        frame.push(FRAME_END);
        self.send_bytes(&frame)
    }

    /// Whether the reader's RF field is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.state.enabled.load(Ordering::SeqCst)
    }

    /// Number of times pending input was discarded.
    pub fn discard_count(&self) -> usize {
        self.state.discards.load(Ordering::SeqCst)
    }

    /// Make subsequent reads fail as if the cable were unplugged.
    pub fn set_disconnected(&self, disconnected: bool) {
        self.state.disconnected.store(disconnected, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_reader_drops_input() {
        let (mut reader, handle) = MockBadgeReader::new();

        handle.tap("01AB123456").unwrap();
        let mut buf = BytesMut::new();
        assert_eq!(reader.read_available(&mut buf).await.unwrap(), 0);
        assert!(buf.is_empty());

        reader.set_enabled(true).await.unwrap();
        assert!(handle.is_enabled());
        handle.tap("01AB123456").unwrap();
        assert_eq!(reader.read_available(&mut buf).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_discard_pending() {
        let (mut reader, handle) = MockBadgeReader::new();
        reader.set_enabled(true).await.unwrap();

        handle.send_bytes(b"\x0A01").unwrap();
        reader.discard_pending().await.unwrap();

        let mut buf = BytesMut::new();
        assert_eq!(reader.read_available(&mut buf).await.unwrap(), 0);
        assert_eq!(handle.discard_count(), 1);
    }

    #[tokio::test]
    async fn test_disconnected_reader_errors() {
        let (mut reader, handle) = MockBadgeReader::new();
        handle.set_disconnected(true);

        let mut buf = BytesMut::new();
        let result = reader.read_available(&mut buf).await;
        assert!(matches!(result, Err(HardwareError::Disconnected { .. })));
    }
}
