//! Mock authorization transport for testing and development.
//!
//! The handle scripts what the "server" does with the next request:
//! refuse the connection, stay silent, reply, or hang up.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use interlock_core::AuthorizationRequest;

use crate::client::AuthClientError;
use crate::transport::{AuthTransport, ResponsePoll};

/// What the simulated server does with one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockExchange {
    /// Connection refused.
    Refuse,

    /// Accept and never answer.
    Silent,

    /// Accept and answer with this text once `polls` polls have passed.
    Reply { text: String, polls: usize },

    /// Accept and close without answering.
    HangUp,
}

#[derive(Debug, Default)]
struct TransportState {
    script: VecDeque<MockExchange>,
    current: Option<(MockExchange, usize)>,
    requests: Vec<AuthorizationRequest>,
    closes: usize,
}

/// Scripted [`AuthTransport`].
///
/// With nothing scripted, every request is accepted and never answered.
///
/// # Examples
///
/// ```
/// use std::time::Instant;
/// use interlock_core::{AuthorizationRequest, BadgeId, ToolId};
/// use interlock_network::{AuthTransport, MockTransport, ResponsePoll};
///
/// #[tokio::main]
/// async fn main() {
///     let (mut transport, handle) = MockTransport::new();
///     handle.reply(r#"{"authorized":true,"timeout":30}"#);
///
///     let request = AuthorizationRequest::new(BadgeId::new(7), ToolId::default());
///     transport.send_request(&request, Instant::now()).await.unwrap();
///
///     let poll = transport.poll_response(Instant::now()).await;
///     assert!(matches!(poll, ResponsePoll::Complete(_)));
///     assert_eq!(handle.requests().len(), 1);
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    state: Arc<Mutex<TransportState>>,
}

impl MockTransport {
    pub fn new() -> (Self, MockTransportHandle) {
        let state = Arc::new(Mutex::new(TransportState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockTransportHandle { state },
        )
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, TransportState>, AuthClientError> {
        self.state
            .lock()
            .map_err(|_| AuthClientError::ConnectionLost("mock state poisoned".to_string()))
    }
}

impl AuthTransport for MockTransport {
    async fn send_request(
        &mut self,
        request: &AuthorizationRequest,
        _now: Instant,
    ) -> Result<(), AuthClientError> {
        let mut state = self.lock()?;
        state.current = None;
        state.requests.push(request.clone());

        let exchange = state.script.pop_front().unwrap_or(MockExchange::Silent);
        if exchange == MockExchange::Refuse {
            return Err(AuthClientError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "mock server refused connection",
            )));
        }
        state.current = Some((exchange, 0));
        Ok(())
    }

    async fn poll_response(&mut self, _now: Instant) -> ResponsePoll {
        let mut state = match self.lock() {
            Ok(state) => state,
            Err(e) => return ResponsePoll::Failed(e.to_string()),
        };

        let Some((exchange, polls)) = state.current.as_mut() else {
            return ResponsePoll::Failed(AuthClientError::NotConnected.to_string());
        };
        *polls += 1;

        let outcome = match exchange {
            MockExchange::Refuse | MockExchange::Silent => return ResponsePoll::Pending,
            MockExchange::Reply { text, polls: wait } => {
                if *polls <= *wait {
                    return ResponsePoll::Pending;
                }
                ResponsePoll::Complete(text.clone())
            }
            MockExchange::HangUp => ResponsePoll::Failed(
                AuthClientError::ConnectionLost("mock server hung up".to_string()).to_string(),
            ),
        };
        state.current = None;
        outcome
    }

    async fn close(&mut self) -> Result<(), AuthClientError> {
        let mut state = self.lock()?;
        state.current = None;
        state.closes += 1;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state
            .lock()
            .map(|s| s.current.is_some())
            .unwrap_or(false)
    }
}

/// Handle for scripting a [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    state: Arc<Mutex<TransportState>>,
}

impl MockTransportHandle {
    /// Queue the server's behavior for the next unscripted request.
    pub fn script(&self, exchange: MockExchange) {
        if let Ok(mut state) = self.state.lock() {
            state.script.push_back(exchange);
        }
    }

    /// Answer the next request on its first poll.
    pub fn reply(&self, text: &str) {
        self.script(MockExchange::Reply {
            text: text.to_string(),
            polls: 0,
        });
    }

    /// Refuse the next connection.
    pub fn refuse(&self) {
        self.script(MockExchange::Refuse);
    }

    /// Every request sent so far.
    pub fn requests(&self) -> Vec<AuthorizationRequest> {
        self.state
            .lock()
            .map(|s| s.requests.clone())
            .unwrap_or_default()
    }

    /// Number of `close` calls.
    pub fn close_count(&self) -> usize {
        self.state.lock().map(|s| s.closes).unwrap_or(0)
    }
}
