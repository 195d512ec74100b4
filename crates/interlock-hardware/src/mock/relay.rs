//! Mock relay output.
//!
//! Records every command so tests can check both the final relay state and
//! how many times it was driven.

use std::sync::{Arc, Mutex};

use crate::{HardwareError, Result, traits::RelayOutput};

/// Relay output that records commands.
///
/// # Examples
///
/// ```
/// use interlock_hardware::mock::MockRelay;
/// use interlock_hardware::traits::RelayOutput;
///
/// #[tokio::main]
/// async fn main() -> interlock_hardware::Result<()> {
///     let (mut relay, handle) = MockRelay::new();
///
///     relay.set_energized(true).await?;
///     relay.set_energized(false).await?;
///
///     assert!(!handle.is_energized());
///     assert_eq!(handle.commands(), vec![true, false]);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockRelay {
    state: Arc<Mutex<RelayState>>,
}

#[derive(Debug, Default)]
struct RelayState {
    energized: bool,
    commands: Vec<bool>,
    fail: bool,
}

impl MockRelay {
    /// Create a de-energized mock relay.
    pub fn new() -> (Self, MockRelayHandle) {
        let state = Arc::new(Mutex::new(RelayState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockRelayHandle { state },
        )
    }
}

impl RelayOutput for MockRelay {
    async fn set_energized(&mut self, energized: bool) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| HardwareError::bus("mock relay state poisoned"))?;

        if state.fail {
            return Err(HardwareError::bus("mock relay write failed"));
        }
        state.energized = energized;
        state.commands.push(energized);
        Ok(())
    }
}

/// Handle for inspecting a mock relay.
#[derive(Debug, Clone)]
pub struct MockRelayHandle {
    state: Arc<Mutex<RelayState>>,
}

impl MockRelayHandle {
    /// Current relay state.
    pub fn is_energized(&self) -> bool {
        self.state.lock().map(|s| s.energized).unwrap_or(false)
    }

    /// Every command received, oldest first.
    pub fn commands(&self) -> Vec<bool> {
        self.state
            .lock()
            .map(|s| s.commands.clone())
            .unwrap_or_default()
    }

    /// Make writes fail.
    pub fn set_failing(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail = fail;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_write_leaves_state() {
        let (mut relay, handle) = MockRelay::new();
        relay.set_energized(true).await.unwrap();

        handle.set_failing(true);
        assert!(relay.set_energized(false).await.is_err());
        assert!(handle.is_energized());
        assert_eq!(handle.commands(), vec![true]);
    }
}
