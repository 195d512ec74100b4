//! Polled badge decoder with reader debounce.
//!
//! Wraps a [`BadgeReader`] and a [`BadgeFrameCodec`]. Each call to
//! [`BadgeDecoder::poll`] reads whatever the reader has buffered and returns
//! at most one badge. After a successful read the reader is disabled and its
//! input discarded for the quiescent period, so a card held against the
//! antenna yields one badge rather than a burst of identical frames.

use std::time::{Duration, Instant};

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::{debug, trace, warn};

use interlock_core::BadgeId;

use crate::codec::BadgeFrameCodec;
use crate::traits::BadgeReader;

/// Badge decoder over a polled reader.
#[derive(Debug)]
pub struct BadgeDecoder<R> {
    reader: R,
    codec: BadgeFrameCodec,
    buffer: BytesMut,
    quiet_period: Duration,
    assembly_timeout: Duration,
    quiet_until: Option<Instant>,
    partial_since: Option<Instant>,
    enabled: bool,
}

impl<R: BadgeReader> BadgeDecoder<R> {
    /// Create a decoder.
    ///
    /// * `quiet_period` - reads stay disabled this long after a badge
    /// * `assembly_timeout` - partial frames older than this are dropped
    pub fn new(reader: R, quiet_period: Duration, assembly_timeout: Duration) -> Self {
        Self {
            reader,
            codec: BadgeFrameCodec::new(),
            buffer: BytesMut::with_capacity(64),
            quiet_period,
            assembly_timeout,
            quiet_until: None,
            partial_since: None,
            enabled: false,
        }
    }

    /// Whether reads are suspended at `now`.
    pub fn is_quiet(&self, now: Instant) -> bool {
        self.quiet_until.is_some_and(|until| now < until)
    }

    /// Poll the reader once.
    ///
    /// Returns a badge only for a complete, valid frame. Reader errors and
    /// malformed frames are logged and yield `None`.
    pub async fn poll(&mut self, now: Instant) -> Option<BadgeId> {
        if let Some(until) = self.quiet_until {
            if now < until {
                return None;
            }
            self.quiet_until = None;
            debug!("Reader quiet period over");
            self.flush().await;
        }

        if !self.enabled {
            match self.reader.set_enabled(true).await {
                Ok(()) => self.enabled = true,
                Err(e) => {
                    warn!("Failed to enable badge reader: {}", e);
                    return None;
                }
            }
        }

        match self.reader.read_available(&mut self.buffer).await {
            Ok(0) => {}
            Ok(n) => trace!(bytes = n, "Reader bytes received"),
            Err(e) => {
                warn!("Badge reader read failed: {}", e);
                if e.is_disconnected() {
                    // Re-assert the enable line once the reader is back.
                    self.enabled = false;
                }
                return None;
            }
        }

        loop {
            match self.codec.decode(&mut self.buffer) {
                Ok(Some(badge)) => {
                    debug!(badge = %badge, "Badge frame decoded");
                    self.begin_quiet_period(now).await;
                    return Some(badge);
                }
                Ok(None) => break,
                Err(e) => debug!("Discarding badge frame: {}", e),
            }
        }

        self.expire_partial_frame(now);
        None
    }

    /// Drop everything buffered here and in the reader.
    ///
    /// Called when the controller returns to idle so that taps made during a
    /// session are not replayed.
    pub async fn flush(&mut self) {
        self.buffer.clear();
        self.partial_since = None;
        if let Err(e) = self.reader.discard_pending().await {
            warn!("Failed to discard reader input: {}", e);
        }
    }

    async fn begin_quiet_period(&mut self, now: Instant) {
        if let Err(e) = self.reader.set_enabled(false).await {
            warn!("Failed to disable badge reader: {}", e);
        }
        self.enabled = false;
        self.quiet_until = Some(now + self.quiet_period);
        self.flush().await;
    }

    fn expire_partial_frame(&mut self, now: Instant) {
        if self.buffer.is_empty() {
            self.partial_since = None;
            return;
        }

        let since = *self.partial_since.get_or_insert(now);
        if now.duration_since(since) > self.assembly_timeout {
            debug!(bytes = self.buffer.len(), "Dropping stale partial frame");
            self.buffer.clear();
            self.partial_since = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBadgeReader, MockBadgeReaderHandle};

    const QUIET: Duration = Duration::from_millis(1500);
    const ASSEMBLY: Duration = Duration::from_millis(1000);

    fn decoder() -> (BadgeDecoder<MockBadgeReader>, MockBadgeReaderHandle) {
        let (reader, handle) = MockBadgeReader::new();
        (BadgeDecoder::new(reader, QUIET, ASSEMBLY), handle)
    }

    #[tokio::test]
    async fn test_first_poll_enables_reader() {
        let (mut decoder, handle) = decoder();
        assert!(!handle.is_enabled());

        assert_eq!(decoder.poll(Instant::now()).await, None);
        assert!(handle.is_enabled());
    }

    #[tokio::test]
    async fn test_decodes_tap() {
        let (mut decoder, handle) = decoder();
        let t0 = Instant::now();
        decoder.poll(t0).await;

        handle.tap("01AB123456").unwrap();
        assert_eq!(decoder.poll(t0).await, Some(BadgeId::new(0xAB12_3456)));
    }

    #[tokio::test]
    async fn test_quiet_period_after_read() {
        let (mut decoder, handle) = decoder();
        let t0 = Instant::now();
        decoder.poll(t0).await;

        handle.tap("01AB123456").unwrap();
        assert!(decoder.poll(t0).await.is_some());
        assert!(!handle.is_enabled());
        assert!(decoder.is_quiet(t0 + Duration::from_millis(1000)));

        // Card still held against the antenna: nothing comes through.
        handle.tap("01AB123456").unwrap();
        assert_eq!(decoder.poll(t0 + Duration::from_millis(1000)).await, None);

        let after = t0 + QUIET;
        assert!(!decoder.is_quiet(after));
        assert_eq!(decoder.poll(after).await, None);
        assert!(handle.is_enabled());

        handle.tap("01AB123456").unwrap();
        assert!(decoder.poll(after).await.is_some());
    }

    #[tokio::test]
    async fn test_frame_split_across_polls() {
        let (mut decoder, handle) = decoder();
        let t0 = Instant::now();
        decoder.poll(t0).await;

        handle.send_bytes(b"\x0A01AB1").unwrap();
        assert_eq!(decoder.poll(t0).await, None);
        handle.send_bytes(b"23456\x0D").unwrap();
        assert_eq!(
            decoder.poll(t0 + Duration::from_millis(50)).await,
            Some(BadgeId::new(0xAB12_3456))
        );
    }

    #[tokio::test]
    async fn test_stale_partial_frame_dropped() {
        let (mut decoder, handle) = decoder();
        let t0 = Instant::now();
        decoder.poll(t0).await;

        handle.send_bytes(b"\x0A01AB1").unwrap();
        decoder.poll(t0).await;
        decoder.poll(t0 + Duration::from_millis(1100)).await;

        // Tail of the old frame alone is not a badge.
        handle.send_bytes(b"23456\x0D").unwrap();
        assert_eq!(decoder.poll(t0 + Duration::from_millis(1150)).await, None);
    }

    #[tokio::test]
    async fn test_malformed_frame_yields_nothing() {
        let (mut decoder, handle) = decoder();
        let t0 = Instant::now();
        decoder.poll(t0).await;

        handle.tap("01ABZZ3456").unwrap();
        assert_eq!(decoder.poll(t0).await, None);
        assert!(handle.is_enabled());
    }

    #[tokio::test]
    async fn test_flush_discards_pending() {
        let (mut decoder, handle) = decoder();
        let t0 = Instant::now();
        decoder.poll(t0).await;

        handle.send_bytes(b"\x0A01AB1").unwrap();
        decoder.poll(t0).await;
        decoder.flush().await;

        handle.send_bytes(b"23456\x0D").unwrap();
        assert_eq!(decoder.poll(t0).await, None);
        assert!(handle.discard_count() >= 1);
    }

    #[tokio::test]
    async fn test_reader_error_is_absorbed() {
        let (mut decoder, handle) = decoder();
        handle.set_disconnected(true);
        assert_eq!(decoder.poll(Instant::now()).await, None);

        handle.set_disconnected(false);
        decoder.poll(Instant::now()).await;
        handle.tap("01AB123456").unwrap();
        assert_eq!(
            decoder.poll(Instant::now()).await,
            Some(BadgeId::new(0xAB12_3456))
        );
    }
}
