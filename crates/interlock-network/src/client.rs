//! HTTP authorization client.
//!
//! Each badge tap is one short exchange with the membership server:
//!
//! ```text
//! AccessController
//!     │
//!     └─> AuthClient ───(TCP, HTTP/1.1 GET)───> membership server
//!            │
//!            └─> poll_response() each tick until the reply is complete
//! ```
//!
//! The client never waits for the reply. `send_request` connects and writes
//! the request (both bounded by the connect timeout), then every controller
//! tick calls `poll_response`, which takes whatever bytes have arrived. The
//! reply is complete when the server closes the connection, when the
//! response window has passed with something buffered, or when the buffer
//! is full.
//!
//! # Design Principles
//!
//! - **No automatic retry**: a failed connect is a denial for that tap
//! - **One exchange at a time**: a new request tears down the previous one
//! - **Bounded buffer**: replies beyond the size cap are cut off

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info, trace, warn};

use interlock_core::AuthorizationRequest;
use interlock_core::InterlockConfig;
use interlock_core::constants::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_RESPONSE_WINDOW_MS, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PATH, DEFAULT_SERVER_PORT, DEFAULT_USER_AGENT, MAX_RESPONSE_BYTES,
};

use crate::transport::{AuthTransport, ResponsePoll};

/// Configuration for the authorization client.
///
/// # Example
///
/// ```
/// use interlock_network::AuthClientConfig;
/// use std::time::Duration;
///
/// let config = AuthClientConfig {
///     host: "127.0.0.1".to_string(),
///     port: 8080,
///     connect_timeout: Duration::from_millis(500),
///     ..Default::default()
/// };
/// assert_eq!(config.max_response_bytes, 1024);
/// ```
#[derive(Debug, Clone)]
pub struct AuthClientConfig {
    /// Server host name or address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    /// Request path, possibly with a fixed query already attached
    pub path: String,

    /// Value of the `User-Agent` header
    pub user_agent: String,

    /// Bound on connecting and on writing the request
    pub connect_timeout: Duration,

    /// How long to keep collecting reply bytes before treating them as complete
    pub response_window: Duration,

    /// Reply bytes kept; anything beyond is dropped
    pub max_response_bytes: usize,
}

impl Default for AuthClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            path: DEFAULT_SERVER_PATH.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            response_window: Duration::from_millis(DEFAULT_RESPONSE_WINDOW_MS),
            max_response_bytes: MAX_RESPONSE_BYTES,
        }
    }
}

impl AuthClientConfig {
    /// Take the server and timing settings from the interlock configuration.
    pub fn from_config(config: &InterlockConfig) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            path: config.server.path.clone(),
            user_agent: config.server.user_agent.clone(),
            connect_timeout: config.server.connect_timeout(),
            response_window: config.timing.response_window(),
            max_response_bytes: MAX_RESPONSE_BYTES,
        }
    }
}

/// Errors that can occur while talking to the authorization server
#[derive(Debug, Error)]
pub enum AuthClientError {
    /// No exchange is open
    #[error("Not connected to server")]
    NotConnected,

    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Writing the request timed out
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Connection was lost during the exchange
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render the HTTP request for one authorization attempt.
///
/// The badge and tool parameters are appended to `path`, after any query it
/// already carries.
///
/// # Example
///
/// ```
/// use interlock_core::{AuthorizationRequest, BadgeId, ToolId};
/// use interlock_network::{AuthClientConfig, build_request};
///
/// let request = AuthorizationRequest::new(BadgeId::new(42), ToolId::default());
/// let text = build_request(&AuthClientConfig::default(), &request);
/// assert!(text.starts_with("GET /makermanager/index.php?r=api/toolValidate&badge=42&tool=1 HTTP/1.1\r\n"));
/// assert!(text.ends_with("\r\n\r\n"));
/// ```
pub fn build_request(config: &AuthClientConfig, request: &AuthorizationRequest) -> String {
    let separator = if config.path.contains('?') { '&' } else { '?' };
    format!(
        "GET {}{}{} HTTP/1.1\r\nHost: {}\r\nUser-Agent: {}\r\nConnection: close\r\n\r\n",
        config.path,
        separator,
        request.query(),
        config.host,
        config.user_agent
    )
}

#[derive(Debug)]
struct Exchange {
    stream: TcpStream,
    buffer: Vec<u8>,
    sent_at: Instant,
}

/// Authorization client over plain TCP.
///
/// # Connection Lifecycle
///
/// 1. `send_request()` closes any previous connection, connects, writes the request
/// 2. `poll_response()` on every tick until `Complete` or `Failed`
/// 3. `close()` releases the socket
///
/// # Example
///
/// ```
/// use interlock_network::{AuthClient, AuthClientConfig, AuthTransport};
///
/// let client = AuthClient::new(AuthClientConfig::default());
/// assert!(!client.is_connected());
/// ```
#[derive(Debug)]
pub struct AuthClient {
    config: AuthClientConfig,
    exchange: Option<Exchange>,
}

impl AuthClient {
    pub fn new(config: AuthClientConfig) -> Self {
        debug!(
            "Creating authorization client for {}:{}",
            config.host, config.port
        );
        Self {
            config,
            exchange: None,
        }
    }

    pub fn config(&self) -> &AuthClientConfig {
        &self.config
    }

    async fn connect(&self) -> Result<TcpStream, AuthClientError> {
        let addr = (self.config.host.as_str(), self.config.port);
        let timeout = self.config.connect_timeout;

        info!("Connecting to {}:{}", self.config.host, self.config.port);

        match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    warn!("Failed to set TCP_NODELAY: {}", e);
                }
                Ok(stream)
            }
            Ok(Err(e)) => {
                warn!("Connection failed: {}", e);
                Err(e.into())
            }
            Err(_) => {
                warn!("Connection timeout after {}ms", timeout.as_millis());
                Err(AuthClientError::ConnectionTimeout(timeout.as_millis() as u64))
            }
        }
    }

    fn finish(&mut self, outcome: ResponsePoll) -> ResponsePoll {
        // Dropping the stream closes the socket.
        self.exchange = None;
        outcome
    }
}

impl AuthTransport for AuthClient {
    async fn send_request(
        &mut self,
        request: &AuthorizationRequest,
        now: Instant,
    ) -> Result<(), AuthClientError> {
        self.close().await?;

        let mut stream = self.connect().await?;
        let text = build_request(&self.config, request);
        let timeout = self.config.connect_timeout;

        trace!(badge = %request.badge, tool = %request.tool, "Sending authorization request");
        match tokio::time::timeout(timeout, stream.write_all(text.as_bytes())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Failed to send request: {}", e);
                return Err(e.into());
            }
            Err(_) => {
                warn!("Send timeout after {}ms", timeout.as_millis());
                return Err(AuthClientError::WriteTimeout(timeout.as_millis() as u64));
            }
        }

        self.exchange = Some(Exchange {
            stream,
            buffer: Vec::with_capacity(self.config.max_response_bytes),
            sent_at: now,
        });
        debug!(badge = %request.badge, "Authorization request sent");
        Ok(())
    }

    async fn poll_response(&mut self, now: Instant) -> ResponsePoll {
        let max = self.config.max_response_bytes;
        let window = self.config.response_window;

        let Some(exchange) = self.exchange.as_mut() else {
            return ResponsePoll::Failed(AuthClientError::NotConnected.to_string());
        };

        let mut chunk = [0u8; 256];
        loop {
            if exchange.buffer.len() >= max {
                debug!(bytes = exchange.buffer.len(), "Response buffer full");
                let text = String::from_utf8_lossy(&exchange.buffer).into_owned();
                return self.finish(ResponsePoll::Complete(text));
            }

            match exchange.stream.try_read(&mut chunk) {
                Ok(0) => {
                    if exchange.buffer.is_empty() {
                        let reason = AuthClientError::ConnectionLost(
                            "server closed connection without replying".to_string(),
                        );
                        return self.finish(ResponsePoll::Failed(reason.to_string()));
                    }
                    trace!(bytes = exchange.buffer.len(), "Server closed connection");
                    let text = String::from_utf8_lossy(&exchange.buffer).into_owned();
                    return self.finish(ResponsePoll::Complete(text));
                }
                Ok(n) => {
                    let take = n.min(max - exchange.buffer.len());
                    exchange.buffer.extend_from_slice(&chunk[..take]);
                    trace!(bytes = n, "Response bytes received");
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("Failed to read response: {}", e);
                    return self.finish(ResponsePoll::Failed(e.to_string()));
                }
            }
        }

        if !exchange.buffer.is_empty() && now.duration_since(exchange.sent_at) >= window {
            debug!(
                bytes = exchange.buffer.len(),
                "Response window elapsed, using what arrived"
            );
            let text = String::from_utf8_lossy(&exchange.buffer).into_owned();
            return self.finish(ResponsePoll::Complete(text));
        }

        ResponsePoll::Pending
    }

    async fn close(&mut self) -> Result<(), AuthClientError> {
        if let Some(mut exchange) = self.exchange.take() {
            debug!("Closing connection to {}", self.config.host);

            let shutdown_timeout = Duration::from_millis(500);
            match tokio::time::timeout(shutdown_timeout, exchange.stream.shutdown()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Error during shutdown: {}", e),
                Err(_) => warn!(
                    "Shutdown timeout during close ({}ms)",
                    shutdown_timeout.as_millis()
                ),
            }
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.exchange.is_some()
    }
}

impl Drop for AuthClient {
    fn drop(&mut self) {
        if self.exchange.is_some() {
            debug!("AuthClient dropped mid-exchange - connection will be closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interlock_core::{BadgeId, ToolId};

    fn request() -> AuthorizationRequest {
        AuthorizationRequest::new(BadgeId::new(0xAB12_3456), ToolId::default())
    }

    #[test]
    fn test_config_default() {
        let config = AuthClientConfig::default();
        assert_eq!(config.port, 80);
        assert_eq!(config.connect_timeout.as_millis(), 2000);
        assert_eq!(config.response_window.as_millis(), 2000);
    }

    #[test]
    fn test_config_from_interlock_config() {
        let mut config = InterlockConfig::default();
        config.server.host = "auth.local".to_string();
        config.timing.response_window_ms = 750;

        let client_config = AuthClientConfig::from_config(&config);
        assert_eq!(client_config.host, "auth.local");
        assert_eq!(client_config.response_window, Duration::from_millis(750));
    }

    #[test]
    fn test_request_format() {
        let text = build_request(&AuthClientConfig::default(), &request());
        let lines: Vec<&str> = text.split("\r\n").collect();

        assert_eq!(
            lines[0],
            "GET /makermanager/index.php?r=api/toolValidate&badge=2870096982&tool=1 HTTP/1.1"
        );
        assert_eq!(lines[1], "Host: dallasmakerspace.org");
        assert!(lines[2].starts_with("User-Agent: interlock/"));
        assert_eq!(lines[3], "Connection: close");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "");
    }

    #[test]
    fn test_request_path_without_query() {
        let config = AuthClientConfig {
            path: "/api/validate".to_string(),
            ..Default::default()
        };
        let text = build_request(&config, &request());
        assert!(text.starts_with("GET /api/validate?badge=2870096982&tool=1 HTTP/1.1\r\n"));
    }

    #[test]
    fn test_client_not_connected_initially() {
        let client = AuthClient::new(AuthClientConfig::default());
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_poll_without_request() {
        let mut client = AuthClient::new(AuthClientConfig::default());
        let result = client.poll_response(Instant::now()).await;
        assert!(matches!(result, ResponsePoll::Failed(_)));
    }

    #[tokio::test]
    async fn test_connection_timeout() {
        // TEST-NET-1 (RFC 5737), not routable
        let config = AuthClientConfig {
            host: "192.0.2.1".to_string(),
            port: 9999,
            connect_timeout: Duration::from_millis(100),
            ..Default::default()
        };

        let mut client = AuthClient::new(config);
        let result = client.send_request(&request(), Instant::now()).await;

        assert!(matches!(
            result,
            Err(AuthClientError::ConnectionTimeout(100)) | Err(AuthClientError::Io(_))
        ));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_multiple_close_calls() {
        let mut client = AuthClient::new(AuthClientConfig::default());

        client.close().await.unwrap();
        client.close().await.unwrap();
        assert!(!client.is_connected());
    }
}
