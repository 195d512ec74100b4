//! Peak-detecting current sensor.
//!
//! The tool's supply runs through a current transformer biased to mid-scale,
//! so an idle tool reads close to the midpoint and a running tool swings
//! above it. A short burst of samples is enough to catch at least one peak
//! of the mains waveform.

use std::time::Duration;

use tracing::trace;

use crate::Result;
use crate::traits::{AnalogInput, CurrentSensor};

/// Current sensor that compares the peak of a sample window to a threshold.
#[derive(Debug)]
pub struct PeakCurrentSensor<A> {
    input: A,
    threshold: u16,
    window: usize,
    interval: Duration,
}

impl<A: AnalogInput> PeakCurrentSensor<A> {
    /// Create a sensor taking `window` samples `interval` apart.
    ///
    /// A window of zero is treated as one sample.
    pub fn new(input: A, threshold: u16, window: usize, interval: Duration) -> Self {
        Self {
            input,
            threshold,
            window: window.max(1),
            interval,
        }
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Take one window of samples and return the largest.
    ///
    /// # Errors
    ///
    /// Returns the first sampling error; the rest of the window is skipped.
    pub async fn sample_peak(&mut self) -> Result<u16> {
        let mut peak = 0;
        for i in 0..self.window {
            if i > 0 && !self.interval.is_zero() {
                tokio::time::sleep(self.interval).await;
            }
            peak = peak.max(self.input.read_sample().await?);
        }
        Ok(peak)
    }
}

impl<A: AnalogInput> CurrentSensor for PeakCurrentSensor<A> {
    async fn is_drawing_power(&mut self) -> Result<bool> {
        let peak = self.sample_peak().await?;
        let drawing = peak > self.threshold;
        trace!(peak, threshold = self.threshold, drawing, "Current sampled");
        Ok(drawing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAnalogInput;
    use rstest::rstest;

    fn sensor(resting: u16) -> (PeakCurrentSensor<MockAnalogInput>, crate::mock::MockAnalogInputHandle) {
        let (input, handle) = MockAnalogInput::new(resting);
        (
            PeakCurrentSensor::new(input, 514, 20, Duration::from_millis(1)),
            handle,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_takes_full_window() {
        let (mut sensor, handle) = sensor(512);
        sensor.is_drawing_power().await.unwrap();
        assert_eq!(handle.read_count(), 20);
    }

    #[rstest]
    #[case::idle(512, false)]
    #[case::at_threshold(514, false)]
    #[case::just_above(515, true)]
    #[case::full_scale(1023, true)]
    #[tokio::test(start_paused = true)]
    async fn test_threshold_is_strict(#[case] peak: u16, #[case] drawing: bool) {
        let (mut sensor, handle) = sensor(500);
        handle.push_samples(&[505, 510, peak, 508]);
        assert_eq!(sensor.is_drawing_power().await.unwrap(), drawing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_peak_late_in_window() {
        let (mut sensor, handle) = sensor(500);
        let mut samples = vec![500; 19];
        samples.push(700);
        handle.push_samples(&samples);

        assert_eq!(sensor.sample_peak().await.unwrap(), 700);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sampling_error_propagates() {
        let (mut sensor, handle) = sensor(512);
        handle.set_failing(true);
        assert!(sensor.is_drawing_power().await.is_err());
        assert_eq!(handle.read_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_spacing() {
        let (mut sensor, _handle) = sensor(512);
        let start = tokio::time::Instant::now();
        sensor.sample_peak().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(19));
    }
}
