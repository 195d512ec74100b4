//! Power actuator.
//!
//! Owns the relay and remembers what it last commanded. Both operations are
//! idempotent: they always drive the relay, so a repeated command re-asserts
//! the line without changing any state.

use std::time::Instant;

use tracing::{debug, info};

use interlock_hardware::Result;
use interlock_hardware::traits::RelayOutput;

use crate::session::AccessSession;

#[derive(Debug)]
pub struct PowerActuator<O> {
    relay: O,
    energized: bool,
}

impl<O: RelayOutput> PowerActuator<O> {
    /// Wrap a relay that is already de-energized.
    pub fn new(relay: O) -> Self {
        Self {
            relay,
            energized: false,
        }
    }

    /// Commanded relay state.
    pub fn is_energized(&self) -> bool {
        self.energized
    }

    pub fn relay(&self) -> &O {
        &self.relay
    }

    /// Apply power and, for a positive grant, start timing idle from `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay cannot be driven; the timer is left
    /// untouched in that case.
    pub async fn turn_on(&mut self, session: &mut AccessSession, now: Instant) -> Result<()> {
        self.relay.set_energized(true).await?;
        if !self.energized {
            info!("Power on");
        }
        self.energized = true;

        if !session.granted_duration().is_zero() {
            session.timer_mut().enable(now);
        }
        Ok(())
    }

    /// Remove power and stop the idle timer.
    ///
    /// The relay counts as off from the moment this is called, even if the
    /// write fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay cannot be driven.
    pub async fn turn_off(&mut self, session: &mut AccessSession) -> Result<()> {
        session.timer_mut().disable();
        if self.energized {
            info!("Power off");
        } else {
            debug!("Power off (already off)");
        }
        self.energized = false;
        self.relay.set_energized(false).await
    }
}
