//! Authorization response interpretation.
//!
//! The server replies with a JSON body, but the reply is scanned for two
//! markers rather than parsed, so headers, chunk framing, or a truncated
//! body do not matter as long as the markers survive:
//!
//! ```text
//! ..."authorized":true,"timeout":45...
//!     ^marker     ^+12  ^marker ^+9
//! ```
//!
//! Anything that cannot be read is treated as a denial with no time.

use std::time::Duration;

use tracing::trace;

use interlock_core::AuthorizationResponse;
use interlock_core::constants::{
    AUTHORIZED_MARKER, AUTHORIZED_TRUE_CHAR, AUTHORIZED_VALUE_OFFSET, TIMEOUT_MARKER,
    TIMEOUT_VALUE_OFFSET,
};

/// Extract the verdict and idle allowance from a raw server reply.
///
/// * `authorized` is true only when the byte at the fixed offset after the
///   first `authorized` marker is `t`.
/// * `granted_duration` is the run of decimal digits at the fixed offset
///   after the first `timeout` marker, in seconds. A missing marker, an
///   empty run, or a value too large to represent gives zero.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use interlock_network::interpret;
///
/// let response = interpret(r#"{"authorized":true,"timeout":45}"#);
/// assert!(response.authorized);
/// assert_eq!(response.granted_duration, Duration::from_secs(45));
///
/// let response = interpret("HTTP/1.1 500 Internal Server Error\r\n\r\n");
/// assert!(!response.authorized);
/// assert_eq!(response.granted_duration, Duration::ZERO);
/// ```
pub fn interpret(text: &str) -> AuthorizationResponse {
    let authorized = text
        .find(AUTHORIZED_MARKER)
        .and_then(|at| text.as_bytes().get(at + AUTHORIZED_VALUE_OFFSET))
        .is_some_and(|&b| char::from(b) == AUTHORIZED_TRUE_CHAR);

    let granted_duration = text
        .find(TIMEOUT_MARKER)
        .and_then(|at| text.get(at + TIMEOUT_VALUE_OFFSET..))
        .map(leading_seconds)
        .unwrap_or(Duration::ZERO);

    trace!(authorized, granted_ms = granted_duration.as_millis() as u64, "Response interpreted");
    AuthorizationResponse {
        authorized,
        granted_duration,
    }
}

fn leading_seconds(text: &str) -> Duration {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text[..end]
        .parse::<u64>()
        .map(Duration::from_secs)
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    const HEADERS: &str = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n";

    #[test]
    fn test_granted_with_timeout() {
        let text = format!(r#"{HEADERS}{{"authorized":true,"timeout":45}}"#);
        assert_eq!(
            interpret(&text),
            AuthorizationResponse::granted(Duration::from_millis(45_000))
        );
    }

    #[test]
    fn test_denied_without_timeout() {
        let response = interpret(r#"{"authorized":false}"#);
        assert_eq!(response, AuthorizationResponse::denied());
    }

    #[rstest]
    #[case::empty("")]
    #[case::html("<html><body>502 Bad Gateway</body></html>")]
    #[case::marker_at_end(r#"{"authorized"#)]
    #[case::marker_one_short(r#"{"authorized":"#)]
    #[case::wrong_quoting(r#"{authorized:true}"#)]
    #[case::capitalized(r#"{"authorized":True}"#)]
    fn test_not_authorized(#[case] text: &str) {
        assert!(!interpret(text).authorized);
    }

    #[rstest]
    #[case::zero(r#""timeout":0"#, 0)]
    #[case::stops_at_non_digit(r#""timeout":12abc"#, 12)]
    #[case::quoted_value(r#""timeout":"30""#, 0)]
    #[case::negative(r#""timeout":-5"#, 0)]
    #[case::at_end_of_text(r#""timeout":"#, 0)]
    #[case::overflow(r#""timeout":99999999999999999999999"#, 0)]
    #[case::leading_zeros(r#""timeout":0007"#, 7)]
    fn test_timeout_parsing(#[case] text: &str, #[case] seconds: u64) {
        assert_eq!(interpret(text).granted_duration, Duration::from_secs(seconds));
    }

    #[test]
    fn test_timeout_without_grant_is_not_authorization() {
        let response = interpret(r#"{"authorized":false,"timeout":45}"#);
        assert!(!response.authorized);
        assert_eq!(response.granted_duration, Duration::from_secs(45));
    }

    #[test]
    fn test_first_marker_wins() {
        let response = interpret(r#"{"authorized":false,"note":"authorized":true}"#);
        assert!(!response.authorized);
    }

    proptest! {
        #[test]
        fn prop_no_marker_means_denied(text in "[^a]*") {
            prop_assert!(!interpret(&text).authorized);
        }

        #[test]
        fn prop_never_panics(text in "\\PC*") {
            let _ = interpret(&text);
        }

        #[test]
        fn prop_granted_seconds_round_trip(seconds in 0u32..1_000_000) {
            let text = format!(r#"{{"authorized":true,"timeout":{}}}"#, seconds);
            let response = interpret(&text);
            prop_assert!(response.authorized);
            prop_assert_eq!(response.granted_duration, Duration::from_secs(u64::from(seconds)));
        }
    }
}
