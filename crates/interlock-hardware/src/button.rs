//! Debounced manual stop input.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::Result;
use crate::traits::{DigitalInput, StopSignal};

/// Stop button that asserts only after a continuous press.
///
/// The raw input is read on every call. A release or read error restarts
/// the debounce interval.
#[derive(Debug)]
pub struct DebouncedStopButton<I> {
    input: I,
    debounce: Duration,
    active_since: Option<Instant>,
}

impl<I: DigitalInput> DebouncedStopButton<I> {
    pub fn new(input: I, debounce: Duration) -> Self {
        Self {
            input,
            debounce,
            active_since: None,
        }
    }
}

impl<I: DigitalInput> StopSignal for DebouncedStopButton<I> {
    async fn is_asserted(&mut self, now: Instant) -> Result<bool> {
        let active = match self.input.is_active().await {
            Ok(active) => active,
            Err(e) => {
                warn!("Stop button read failed: {}", e);
                self.active_since = None;
                return Err(e);
            }
        };

        if !active {
            if self.active_since.take().is_some() {
                debug!("Stop button released");
            }
            return Ok(false);
        }

        let since = *self.active_since.get_or_insert(now);
        Ok(now.duration_since(since) >= self.debounce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDigitalInput;

    const DEBOUNCE: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn test_press_must_be_held() {
        let (input, handle) = MockDigitalInput::new();
        let mut button = DebouncedStopButton::new(input, DEBOUNCE);
        let t0 = Instant::now();

        handle.set_active(true);
        assert!(!button.is_asserted(t0).await.unwrap());
        assert!(!button.is_asserted(t0 + Duration::from_millis(10)).await.unwrap());
        assert!(button.is_asserted(t0 + DEBOUNCE).await.unwrap());
        assert!(button.is_asserted(t0 + Duration::from_millis(500)).await.unwrap());
    }

    #[tokio::test]
    async fn test_bounce_restarts_interval() {
        let (input, handle) = MockDigitalInput::new();
        let mut button = DebouncedStopButton::new(input, DEBOUNCE);
        let t0 = Instant::now();

        handle.set_active(true);
        button.is_asserted(t0).await.unwrap();
        handle.set_active(false);
        button.is_asserted(t0 + Duration::from_millis(15)).await.unwrap();
        handle.set_active(true);
        assert!(!button.is_asserted(t0 + Duration::from_millis(25)).await.unwrap());
        assert!(button.is_asserted(t0 + Duration::from_millis(45)).await.unwrap());
    }

    #[tokio::test]
    async fn test_read_error_resets_and_propagates() {
        let (input, handle) = MockDigitalInput::new();
        let mut button = DebouncedStopButton::new(input, DEBOUNCE);
        let t0 = Instant::now();

        handle.set_active(true);
        button.is_asserted(t0).await.unwrap();
        handle.set_failing(true);
        assert!(button.is_asserted(t0 + Duration::from_millis(10)).await.is_err());
        handle.set_failing(false);
        assert!(!button.is_asserted(t0 + Duration::from_millis(25)).await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_debounce_asserts_immediately() {
        let (input, handle) = MockDigitalInput::new();
        let mut button = DebouncedStopButton::new(input, Duration::ZERO);

        handle.set_active(true);
        assert!(button.is_asserted(Instant::now()).await.unwrap());
    }
}
