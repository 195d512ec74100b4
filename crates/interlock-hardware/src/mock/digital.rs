//! Mock digital input.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{HardwareError, Result, traits::DigitalInput};

/// Digital input whose level is set from a handle.
#[derive(Debug)]
pub struct MockDigitalInput {
    state: Arc<DigitalState>,
}

#[derive(Debug, Default)]
struct DigitalState {
    active: AtomicBool,
    fail: AtomicBool,
}

impl MockDigitalInput {
    /// Create an inactive mock input.
    pub fn new() -> (Self, MockDigitalInputHandle) {
        let state = Arc::new(DigitalState::default());
        (
            Self {
                state: Arc::clone(&state),
            },
            MockDigitalInputHandle { state },
        )
    }
}

impl DigitalInput for MockDigitalInput {
    async fn is_active(&mut self) -> Result<bool> {
        if self.state.fail.load(Ordering::SeqCst) {
            return Err(HardwareError::bus("mock digital read failed"));
        }
        Ok(self.state.active.load(Ordering::SeqCst))
    }
}

/// Handle for driving a mock digital input.
#[derive(Debug, Clone)]
pub struct MockDigitalInputHandle {
    state: Arc<DigitalState>,
}

impl MockDigitalInputHandle {
    pub fn set_active(&self, active: bool) {
        self.state.active.store(active, Ordering::SeqCst);
    }

    pub fn set_failing(&self, fail: bool) {
        self.state.fail.store(fail, Ordering::SeqCst);
    }
}
