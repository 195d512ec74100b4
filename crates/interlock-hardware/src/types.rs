//! Common types shared across hardware device implementations.

use serde::{Deserialize, Serialize};

/// Electrical level that means "active" on a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveLevel {
    /// A raw `1` is active.
    #[default]
    High,

    /// A raw `0` is active.
    Low,
}

impl ActiveLevel {
    /// Build from the `active_low` configuration flag.
    pub fn from_active_low(active_low: bool) -> Self {
        if active_low { Self::Low } else { Self::High }
    }

    /// Interpret a raw line value.
    pub fn is_active(self, raw: u8) -> bool {
        match self {
            Self::High => raw != 0,
            Self::Low => raw == 0,
        }
    }

    /// Raw line value for the requested logical state.
    pub fn raw(self, active: bool) -> u8 {
        match (self, active) {
            (Self::High, true) | (Self::Low, false) => 1,
            (Self::High, false) | (Self::Low, true) => 0,
        }
    }
}
