//! Access session state.
//!
//! [`AccessSession`] is the single value holding everything one tap can
//! change: the current state, the idle timer, who is using the tool, and
//! for how long. The controller threads it through the actuator and timer
//! by `&mut`.
//!
//! # States
//!
//! - `Idle`: waiting for a badge
//! - `AwaitingAuthorization`: request sent, waiting for the verdict
//! - `Denied`: the verdict was no; cleared on the next tick
//! - `SessionActive`: power on, idle time tracked against the grant
//!
//! # Valid Transitions
//!
//! - Idle → AwaitingAuthorization → SessionActive → Idle
//! - AwaitingAuthorization → Denied → Idle
//! - AwaitingAuthorization → Idle (timeout or transport failure)
//!
//! # Examples
//!
//! ```
//! use std::time::Instant;
//! use interlock_controller::{AccessSession, SessionState};
//!
//! let now = Instant::now();
//! let mut session = AccessSession::new(now);
//! assert_eq!(session.state(), SessionState::Idle);
//!
//! session.transition_to(SessionState::AwaitingAuthorization, now).unwrap();
//! assert!(session.transition_to(SessionState::AwaitingAuthorization, now).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use interlock_core::constants::MAX_TRANSITION_HISTORY;
use interlock_core::{BadgeId, Error, Result, SessionId};

use crate::event::{EndReason, SessionSummary};
use crate::timer::IdleTimer;

/// Phase of the access flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for a badge.
    Idle,

    /// Request sent, waiting for the server.
    AwaitingAuthorization,

    /// The server denied the badge.
    Denied,

    /// Power is on for an authorized user.
    SessionActive,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            SessionState::Idle => "Idle",
            SessionState::AwaitingAuthorization => "AwaitingAuthorization",
            SessionState::Denied => "Denied",
            SessionState::SessionActive => "SessionActive",
        };
        write!(f, "{}", state_str)
    }
}

impl SessionState {
    /// Check if transition to target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use interlock_controller::SessionState;
    ///
    /// assert!(SessionState::Idle.can_transition_to(&SessionState::AwaitingAuthorization));
    /// assert!(!SessionState::Idle.can_transition_to(&SessionState::SessionActive));
    /// ```
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        matches!(
            (self, target),
            // From Idle
            (SessionState::Idle, SessionState::AwaitingAuthorization)
            // From AwaitingAuthorization
            | (
                SessionState::AwaitingAuthorization,
                SessionState::SessionActive | SessionState::Denied | SessionState::Idle
            )
            // From Denied
            | (SessionState::Denied, SessionState::Idle)
            // From SessionActive
            | (SessionState::SessionActive, SessionState::Idle)
        )
    }
}

/// A single state transition with timestamp.
///
/// The `timestamp` is process-local and is not serialized; deserializing
/// sets it to the time of deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: SessionState,
    pub to: SessionState,

    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

#[derive(Debug, Clone)]
struct Grant {
    session: SessionId,
    started_at: DateTime<Utc>,
}

/// Everything one access attempt can change.
#[derive(Debug)]
pub struct AccessSession {
    state: SessionState,
    state_entered_at: Instant,
    timer: IdleTimer,
    badge: Option<BadgeId>,
    granted: Duration,
    grant: Option<Grant>,
    history: VecDeque<StateTransition>,
}

impl AccessSession {
    /// Start idle, with power off and the timer disabled.
    pub fn new(now: Instant) -> Self {
        Self {
            state: SessionState::Idle,
            state_entered_at: now,
            timer: IdleTimer::new(),
            badge: None,
            granted: Duration::ZERO,
            grant: None,
            history: VecDeque::with_capacity(MAX_TRANSITION_HISTORY),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn time_in_state(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.state_entered_at)
    }

    pub fn timer(&self) -> &IdleTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut IdleTimer {
        &mut self.timer
    }

    /// Badge of the attempt or session in progress.
    pub fn badge(&self) -> Option<BadgeId> {
        self.badge
    }

    /// Idle allowance of the current session; zero outside a session.
    pub fn granted_duration(&self) -> Duration {
        self.granted
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.grant.as_ref().map(|g| g.session)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.grant.as_ref().map(|g| g.started_at)
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Get the last N state transitions.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    /// Transition to a new state, validating the transition.
    ///
    /// Entering `Idle` clears the badge and any grant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] if the move is not allowed;
    /// nothing changes in that case.
    pub fn transition_to(&mut self, new_state: SessionState, now: Instant) -> Result<StateTransition> {
        if !self.state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition {
            from: self.state,
            to: new_state,
            timestamp: now,
        };

        self.state = new_state;
        self.state_entered_at = now;
        if new_state == SessionState::Idle {
            self.badge = None;
            self.granted = Duration::ZERO;
            self.grant = None;
        }

        self.history.push_back(transition.clone());
        if self.history.len() > MAX_TRANSITION_HISTORY {
            self.history.pop_front();
        }

        Ok(transition)
    }

    /// Remember whose tap is being authorized.
    pub fn begin_attempt(&mut self, badge: BadgeId) {
        self.badge = Some(badge);
        self.granted = Duration::ZERO;
        self.grant = None;
    }

    /// Record an authorization and open a new session.
    pub fn grant(&mut self, duration: Duration) -> SessionId {
        let session = SessionId::new();
        self.granted = duration;
        self.grant = Some(Grant {
            session,
            started_at: Utc::now(),
        });
        session
    }

    /// Close the current session.
    ///
    /// Returns `None` when no session was open.
    pub fn finish(&self, reason: EndReason) -> Option<SessionSummary> {
        let grant = self.grant.as_ref()?;
        Some(SessionSummary {
            session: grant.session,
            badge: self.badge?,
            granted: self.granted,
            started_at: grant.started_at,
            ended_at: Utc::now(),
            reason,
        })
    }
}
