use crate::{
    Result,
    constants::{BADGE_HEX_LEN, DEFAULT_TOOL_ID},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Badge number decoded from a reader frame.
///
/// Displays as decimal, which is how the authorization service expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BadgeId(u32);

impl BadgeId {
    /// Wrap a raw badge number.
    #[must_use]
    pub fn new(id: u32) -> Self {
        BadgeId(id)
    }

    /// Parse the 8-character hexadecimal badge number.
    ///
    /// # Errors
    /// Returns `Error::InvalidBadgeId` unless the input is exactly
    /// eight ASCII hex digits. Signs, whitespace and short input are
    /// rejected rather than partially parsed.
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() != BADGE_HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidBadgeId(format!(
                "expected {BADGE_HEX_LEN} hex digits, got {hex:?}"
            )));
        }
        u32::from_str_radix(hex, 16)
            .map(BadgeId)
            .map_err(|e| Error::InvalidBadgeId(format!("{hex:?}: {e}")))
    }

    /// Get the raw badge number.
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BadgeId {
    fn from(id: u32) -> Self {
        BadgeId(id)
    }
}

/// Identifier of the tool guarded by this interlock.
///
/// Restricted to URL-safe characters so it can be placed in a query
/// string without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToolId(String);

impl ToolId {
    /// Create a tool identifier with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidToolId` if the identifier is empty or contains
    /// anything other than ASCII letters, digits, `-`, `_`, `.` or `~`.
    pub fn new(id: &str) -> Result<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidToolId("tool id cannot be empty".to_string()));
        }
        if !id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~'))
        {
            return Err(Error::InvalidToolId(format!(
                "{id:?} contains characters not allowed in a query string"
            )));
        }
        Ok(ToolId(id.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ToolId {
    fn default() -> Self {
        ToolId(DEFAULT_TOOL_ID.to_string())
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ToolId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ToolId::new(s)
    }
}

impl TryFrom<String> for ToolId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        ToolId::new(&value)
    }
}

impl From<ToolId> for String {
    fn from(id: ToolId) -> Self {
        id.0
    }
}

/// Identifier attached to one access session, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    #[must_use]
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One authorization attempt: which badge wants to use which tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub badge: BadgeId,
    pub tool: ToolId,
}

impl AuthorizationRequest {
    #[must_use]
    pub fn new(badge: BadgeId, tool: ToolId) -> Self {
        Self { badge, tool }
    }

    /// Query parameters in wire order: `badge=<decimal>&tool=<id>`.
    #[must_use]
    pub fn query(&self) -> String {
        format!("badge={}&tool={}", self.badge, self.tool)
    }
}

/// Verdict extracted from the authorization service's reply.
///
/// The default value is a denial with no session budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    /// Whether the badge may use the tool.
    pub authorized: bool,

    /// Idle allowance for the session.
    pub granted_duration: Duration,
}

impl AuthorizationResponse {
    /// Fail-closed verdict: denied, zero duration.
    #[must_use]
    pub fn denied() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn granted(duration: Duration) -> Self {
        Self {
            authorized: true,
            granted_duration: duration,
        }
    }
}
