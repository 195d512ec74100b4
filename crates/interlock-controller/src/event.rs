//! Events produced by controller ticks.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use interlock_core::{BadgeId, SessionId};

/// Why an active session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The tool sat idle longer than the grant.
    IdleExpired,

    /// The stop button was pressed.
    ManualStop,

    /// The relay could not be energized.
    RelayFault,

    /// The controller was shut down mid-session.
    Shutdown,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            EndReason::IdleExpired => "idle expired",
            EndReason::ManualStop => "manual stop",
            EndReason::RelayFault => "relay fault",
            EndReason::Shutdown => "shutdown",
        };
        write!(f, "{}", reason)
    }
}

/// Record of one completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session: SessionId,
    pub badge: BadgeId,
    pub granted: Duration,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub reason: EndReason,
}

impl SessionSummary {
    /// Wall-clock length of the session.
    pub fn duration(&self) -> chrono::Duration {
        self.ended_at - self.started_at
    }
}

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A badge was decoded while idle.
    BadgeRead { badge: BadgeId },

    /// The server could not be reached; the tap is denied.
    ConnectFailed { badge: BadgeId, reason: String },

    /// The request is on its way; waiting for the verdict.
    RequestSent { badge: BadgeId },

    /// Access granted and power applied.
    Granted {
        badge: BadgeId,
        session: SessionId,
        duration: Duration,
    },

    /// The server said no.
    Denied { badge: BadgeId },

    /// No complete reply before the deadline.
    AuthorizationTimedOut { badge: BadgeId },

    /// The exchange broke before a reply arrived.
    TransportFailed { badge: BadgeId, reason: String },

    /// The tool started drawing current.
    ToolStarted { session: SessionId },

    /// The tool stopped drawing current.
    ToolStopped { session: SessionId },

    /// Power was removed and the session closed.
    SessionEnded(SessionSummary),
}
