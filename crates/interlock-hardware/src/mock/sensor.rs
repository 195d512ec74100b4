//! Mock current sensor.
//!
//! Skips sampling entirely; the handle decides whether the tool is running.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{HardwareError, Result, traits::CurrentSensor};

#[derive(Debug)]
pub struct MockCurrentSensor {
    state: Arc<SensorState>,
}

#[derive(Debug, Default)]
struct SensorState {
    drawing: AtomicBool,
    fail: AtomicBool,
    polls: AtomicUsize,
}

impl MockCurrentSensor {
    /// Create a sensor reporting "not drawing".
    pub fn new() -> (Self, MockCurrentSensorHandle) {
        let state = Arc::new(SensorState::default());
        (
            Self {
                state: Arc::clone(&state),
            },
            MockCurrentSensorHandle { state },
        )
    }
}

impl CurrentSensor for MockCurrentSensor {
    async fn is_drawing_power(&mut self) -> Result<bool> {
        self.state.polls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail.load(Ordering::SeqCst) {
            return Err(HardwareError::bus("mock current sensor failed"));
        }
        Ok(self.state.drawing.load(Ordering::SeqCst))
    }
}

/// Handle for controlling a mock current sensor.
#[derive(Debug, Clone)]
pub struct MockCurrentSensorHandle {
    state: Arc<SensorState>,
}

impl MockCurrentSensorHandle {
    /// Set whether the simulated tool is running.
    pub fn set_drawing(&self, drawing: bool) {
        self.state.drawing.store(drawing, Ordering::SeqCst);
    }

    pub fn set_failing(&self, fail: bool) {
        self.state.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of times the sensor was polled.
    pub fn poll_count(&self) -> usize {
        self.state.polls.load(Ordering::SeqCst)
    }
}
