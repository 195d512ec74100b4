//! Build-time constants for the power interlock.
//!
//! Every tunable value used by the interlock has its default defined here.
//! [`InterlockConfig`](crate::config::InterlockConfig) starts from these
//! values; a deployment file may override the site-specific ones (server,
//! device paths, pins) once at startup.
//!
//! # Badge Frame
//!
//! The reader emits one frame per tap:
//!
//! ```text
//! 0x0A  S S H H H H H H H H  [0x0D]
//! start  site  badge (hex)    stop
//! ```
//!
//! - `0x0A` - start marker ([`FRAME_START`])
//! - 10 ASCII payload bytes ([`FRAME_PAYLOAD_LEN`])
//! - the first two payload characters are a site/facility code and are
//!   discarded; the next eight are the badge number in hexadecimal
//! - an optional `0x0D` stop byte, which the decoder ignores
//!
//! # Usage
//!
//! ```
//! use interlock_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(FRAME_LEN, 11);
//! let deadline = Duration::from_millis(DEFAULT_AUTH_DEADLINE_MS);
//! assert_eq!(deadline.as_secs(), 2);
//! ```

// ============================================================================
// Badge Frame
// ============================================================================

/// Start-of-frame marker emitted by the reader (line feed).
pub const FRAME_START: u8 = 0x0A;

/// End-of-frame marker emitted by the reader (carriage return).
///
/// Not required for a valid frame; it is skipped like any other byte
/// between frames.
pub const FRAME_END: u8 = 0x0D;

/// Number of payload bytes following the start marker.
pub const FRAME_PAYLOAD_LEN: usize = 10;

/// Total frame length including the start marker.
pub const FRAME_LEN: usize = 1 + FRAME_PAYLOAD_LEN;

/// Offset of the badge number inside the payload.
///
/// The two characters before it are the site/facility code.
pub const BADGE_HEX_OFFSET: usize = 2;

/// Length of the hexadecimal badge number inside the payload.
pub const BADGE_HEX_LEN: usize = 8;

/// Reader quiescent period after a successful read, in milliseconds.
pub const DEFAULT_READER_QUIET_MS: u64 = 1500;

/// Partial frame bytes older than this are discarded, in milliseconds.
pub const DEFAULT_FRAME_ASSEMBLY_TIMEOUT_MS: u64 = 1000;

/// Reader serial baud rate.
pub const DEFAULT_READER_BAUD_RATE: u32 = 2400;

/// Default reader serial device.
pub const DEFAULT_READER_DEVICE: &str = "/dev/ttyUSB0";

// ============================================================================
// Authorization Service
// ============================================================================

/// Default authorization host.
pub const DEFAULT_SERVER_HOST: &str = "dallasmakerspace.org";

/// Default authorization port.
pub const DEFAULT_SERVER_PORT: u16 = 80;

/// Default request path. `badge` and `tool` are appended as query parameters.
pub const DEFAULT_SERVER_PATH: &str = "/makermanager/index.php?r=api/toolValidate";

/// Identifier of the tool this interlock guards.
pub const DEFAULT_TOOL_ID: &str = "1";

/// `User-Agent` header sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("interlock/", env!("CARGO_PKG_VERSION"));

/// Maximum time to establish the TCP connection, in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2000;

/// Deadline for a complete authorization response, in milliseconds.
///
/// Measured by the idle timer from the moment the request was sent.
pub const DEFAULT_AUTH_DEADLINE_MS: u64 = 2000;

/// Window over which response bytes are accumulated, in milliseconds.
///
/// Once the window has elapsed, whatever has arrived is the response.
pub const DEFAULT_RESPONSE_WINDOW_MS: u64 = 2000;

/// Response bytes beyond this limit are read and dropped.
pub const MAX_RESPONSE_BYTES: usize = 1024;

// ============================================================================
// Response Markers
// ============================================================================

/// Marker preceding the authorization flag.
pub const AUTHORIZED_MARKER: &str = "authorized";

/// Distance from the start of [`AUTHORIZED_MARKER`] to the flag character.
///
/// Skips `authorized":`.
pub const AUTHORIZED_VALUE_OFFSET: usize = 12;

/// Marker preceding the granted session length in seconds.
pub const TIMEOUT_MARKER: &str = "timeout";

/// Distance from the start of [`TIMEOUT_MARKER`] to the first digit.
///
/// Skips `timeout":`.
pub const TIMEOUT_VALUE_OFFSET: usize = 9;

/// The flag counts as granted only when it starts with this character.
pub const AUTHORIZED_TRUE_CHAR: char = 't';

// ============================================================================
// Current Sensing
// ============================================================================

/// Peak raw sample above which the tool is drawing power (10-bit ADC).
pub const DEFAULT_CURRENT_THRESHOLD: u16 = 514;

/// Number of samples in one sensing window.
pub const DEFAULT_CURRENT_WINDOW: usize = 20;

/// Delay between samples in a sensing window, in milliseconds.
pub const DEFAULT_CURRENT_SAMPLE_INTERVAL_MS: u64 = 1;

/// Default IIO sysfs file providing raw current samples.
pub const DEFAULT_CURRENT_SAMPLE_PATH: &str = "/sys/bus/iio/devices/iio:device0/in_voltage0_raw";

// ============================================================================
// Relay and Stop Button
// ============================================================================

/// Default GPIO character device.
pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";

/// Default relay line.
pub const DEFAULT_RELAY_LINE: u32 = 3;

/// Default stop button line.
pub const DEFAULT_STOP_BUTTON_LINE: u32 = 4;

/// Stop button must read active this long before it counts, in milliseconds.
pub const DEFAULT_STOP_DEBOUNCE_MS: u64 = 20;

// ============================================================================
// Scheduling
// ============================================================================

/// Interval between controller ticks, in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10;

/// Number of state transitions kept in the controller history.
pub const MAX_TRANSITION_HISTORY: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_number_fits_inside_payload() {
        assert!(BADGE_HEX_OFFSET + BADGE_HEX_LEN <= FRAME_PAYLOAD_LEN);
    }

    #[test]
    fn test_markers_fit_their_offsets() {
        assert_eq!(AUTHORIZED_VALUE_OFFSET, AUTHORIZED_MARKER.len() + 2);
        assert_eq!(TIMEOUT_VALUE_OFFSET, TIMEOUT_MARKER.len() + 2);
    }

    #[test]
    fn test_frame_start_is_not_hex_digit() {
        assert!(!FRAME_START.is_ascii_hexdigit());
        assert!(!FRAME_END.is_ascii_hexdigit());
    }
}
