//! Mock analog input.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::{HardwareError, Result, traits::AnalogInput};

/// Analog input that plays back scripted samples.
///
/// Queued samples are returned first, in order. Once the queue is empty the
/// resting level is returned on every read.
#[derive(Debug)]
pub struct MockAnalogInput {
    state: Arc<Mutex<AnalogState>>,
}

#[derive(Debug)]
struct AnalogState {
    queued: VecDeque<u16>,
    resting: u16,
    fail: bool,
    reads: usize,
}

impl MockAnalogInput {
    /// Create a mock input resting at `resting`.
    pub fn new(resting: u16) -> (Self, MockAnalogInputHandle) {
        let state = Arc::new(Mutex::new(AnalogState {
            queued: VecDeque::new(),
            resting,
            fail: false,
            reads: 0,
        }));

        (
            Self {
                state: Arc::clone(&state),
            },
            MockAnalogInputHandle { state },
        )
    }
}

impl AnalogInput for MockAnalogInput {
    async fn read_sample(&mut self) -> Result<u16> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| HardwareError::bus("mock analog state poisoned"))?;

        state.reads += 1;
        if state.fail {
            return Err(HardwareError::bus("mock analog read failed"));
        }
        let resting = state.resting;
        Ok(state.queued.pop_front().unwrap_or(resting))
    }
}

/// Handle for scripting a mock analog input.
#[derive(Debug, Clone)]
pub struct MockAnalogInputHandle {
    state: Arc<Mutex<AnalogState>>,
}

impl MockAnalogInputHandle {
    /// Queue samples to be returned before the resting level.
    pub fn push_samples(&self, samples: &[u16]) {
        if let Ok(mut state) = self.state.lock() {
            state.queued.extend(samples.iter().copied());
        }
    }

    /// Change the level returned once the queue is drained.
    pub fn set_resting(&self, value: u16) {
        if let Ok(mut state) = self.state.lock() {
            state.resting = value;
        }
    }

    /// Make reads fail.
    pub fn set_failing(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail = fail;
        }
    }

    /// Total number of reads attempted.
    pub fn read_count(&self) -> usize {
        self.state.lock().map(|s| s.reads).unwrap_or(0)
    }
}
