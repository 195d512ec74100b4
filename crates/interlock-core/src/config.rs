//! Interlock configuration.
//!
//! All values default to the build-time constants in [`crate::constants`].
//! A deployment may override them from a TOML file read once at startup;
//! nothing is reloaded while the interlock runs.
//!
//! ```
//! use interlock_core::InterlockConfig;
//!
//! let config = InterlockConfig::from_toml_str(r#"
//!     [server]
//!     host = "auth.example.org"
//!     tool_id = "lathe"
//!
//!     [stop_button]
//!     line = 17
//! "#).unwrap();
//!
//! assert_eq!(config.server.host, "auth.example.org");
//! assert_eq!(config.server.port, 80);
//! assert!(config.stop_button.enabled);
//! assert_eq!(config.stop_button.line, 17);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, ToolId, constants::*};

/// Complete interlock configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterlockConfig {
    pub server: ServerConfig,
    pub timing: TimingConfig,
    pub reader: ReaderConfig,
    pub sensor: SensorConfig,
    pub relay: RelayConfig,
    pub stop_button: StopButtonConfig,
}

impl InterlockConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    /// Returns `Error::ConfigParse` for malformed TOML or unknown keys and
    /// `Error::Config` when a value fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: InterlockConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, otherwise the errors
    /// of [`InterlockConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(Error::Config("server.host cannot be empty".to_string()));
        }
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be greater than 0".to_string()));
        }
        if !self.server.path.starts_with('/') {
            return Err(Error::Config(format!(
                "server.path must start with '/', got {:?}",
                self.server.path
            )));
        }
        if self.server.path.contains(char::is_whitespace) {
            return Err(Error::Config("server.path cannot contain whitespace".to_string()));
        }
        if self.timing.auth_deadline_ms == 0 {
            return Err(Error::Config(
                "timing.auth_deadline_ms must be greater than 0".to_string(),
            ));
        }
        if self.timing.tick_interval_ms == 0 {
            return Err(Error::Config(
                "timing.tick_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.reader.baud_rate == 0 {
            return Err(Error::Config("reader.baud_rate must be greater than 0".to_string()));
        }
        if self.sensor.window == 0 {
            return Err(Error::Config("sensor.window must be at least 1".to_string()));
        }
        if self.stop_button.enabled
            && self.stop_button.chip == self.relay.chip
            && self.stop_button.line == self.relay.line
        {
            return Err(Error::Config(format!(
                "stop_button and relay share line {} on {}",
                self.relay.line, self.relay.chip
            )));
        }
        Ok(())
    }
}

/// Authorization service endpoint and request identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request path, possibly with its own query string.
    pub path: String,
    pub tool_id: ToolId,
    pub user_agent: String,
    pub connect_timeout_ms: u64,
}

impl ServerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            path: DEFAULT_SERVER_PATH.to_string(),
            tool_id: ToolId::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

/// Deadlines and periods used by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    pub auth_deadline_ms: u64,
    pub response_window_ms: u64,
    pub reader_quiet_ms: u64,
    pub frame_assembly_timeout_ms: u64,
    pub tick_interval_ms: u64,
}

impl TimingConfig {
    pub fn auth_deadline(&self) -> Duration {
        Duration::from_millis(self.auth_deadline_ms)
    }

    pub fn response_window(&self) -> Duration {
        Duration::from_millis(self.response_window_ms)
    }

    pub fn reader_quiet(&self) -> Duration {
        Duration::from_millis(self.reader_quiet_ms)
    }

    pub fn frame_assembly_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_assembly_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            auth_deadline_ms: DEFAULT_AUTH_DEADLINE_MS,
            response_window_ms: DEFAULT_RESPONSE_WINDOW_MS,
            reader_quiet_ms: DEFAULT_READER_QUIET_MS,
            frame_assembly_timeout_ms: DEFAULT_FRAME_ASSEMBLY_TIMEOUT_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

/// Serial badge reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderConfig {
    pub device: String,
    pub baud_rate: u32,
    /// The reader's enable input is active low (Parallax style).
    pub enable_active_low: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_READER_DEVICE.to_string(),
            baud_rate: DEFAULT_READER_BAUD_RATE,
            enable_active_low: true,
        }
    }
}

/// Analog current sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorConfig {
    pub sample_path: PathBuf,
    pub threshold: u16,
    pub window: usize,
    pub sample_interval_ms: u64,
}

impl SensorConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sample_path: PathBuf::from(DEFAULT_CURRENT_SAMPLE_PATH),
            threshold: DEFAULT_CURRENT_THRESHOLD,
            window: DEFAULT_CURRENT_WINDOW,
            sample_interval_ms: DEFAULT_CURRENT_SAMPLE_INTERVAL_MS,
        }
    }
}

/// Relay output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    pub chip: String,
    pub line: u32,
    pub active_low: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            chip: DEFAULT_GPIO_CHIP.to_string(),
            line: DEFAULT_RELAY_LINE,
            active_low: false,
        }
    }
}

/// Manual stop button input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StopButtonConfig {
    pub enabled: bool,
    pub chip: String,
    pub line: u32,
    pub active_low: bool,
    pub debounce_ms: u64,
}

impl StopButtonConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for StopButtonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chip: DEFAULT_GPIO_CHIP.to_string(),
            line: DEFAULT_STOP_BUTTON_LINE,
            active_low: true,
            debounce_ms: DEFAULT_STOP_DEBOUNCE_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = InterlockConfig::default();
        assert_eq!(config.server.port, DEFAULT_SERVER_PORT);
        assert_eq!(config.server.tool_id.as_str(), DEFAULT_TOOL_ID);
        assert_eq!(config.timing.auth_deadline(), Duration::from_millis(2000));
        assert_eq!(config.timing.reader_quiet(), Duration::from_millis(1500));
        assert_eq!(config.sensor.threshold, 514);
        assert_eq!(config.sensor.window, 20);
        assert!(config.stop_button.enabled);
        assert_ne!(config.stop_button.line, config.relay.line);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = InterlockConfig::from_toml_str("").unwrap();
        assert_eq!(config, InterlockConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = InterlockConfig::from_toml_str(
            r#"
            [timing]
            auth_deadline_ms = 5000

            [relay]
            line = 12
            active_low = true
            "#,
        )
        .unwrap();

        assert_eq!(config.timing.auth_deadline_ms, 5000);
        assert_eq!(config.timing.response_window_ms, DEFAULT_RESPONSE_WINDOW_MS);
        assert_eq!(config.relay.line, 12);
        assert!(config.relay.active_low);
        assert_eq!(config.relay.chip, DEFAULT_GPIO_CHIP);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = InterlockConfig::from_toml_str("[server]\nhostname = \"x\"\n");
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_invalid_tool_id_rejected() {
        let result = InterlockConfig::from_toml_str("[server]\ntool_id = \"a b\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_deadline_rejected() {
        let result = InterlockConfig::from_toml_str("[timing]\nauth_deadline_ms = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_relative_path_rejected() {
        let result = InterlockConfig::from_toml_str("[server]\npath = \"api\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_stop_button_sharing_relay_line_rejected() {
        let result = InterlockConfig::from_toml_str(
            r#"
            [relay]
            line = 5

            [stop_button]
            enabled = true
            line = 5
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_stop_button_can_be_disabled() {
        let config = InterlockConfig::from_toml_str("[stop_button]\nenabled = false\n").unwrap();
        assert!(!config.stop_button.enabled);
    }

    #[test]
    fn test_load_missing_file() {
        let result = InterlockConfig::load(Path::new("/nonexistent/interlock.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
