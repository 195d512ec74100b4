//! Transport seam between the controller and the authorization server.

#![allow(async_fn_in_trait)]

use std::time::Instant;

use interlock_core::AuthorizationRequest;

use crate::client::AuthClientError;

/// Outcome of polling an in-flight exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePoll {
    /// Still waiting for the server.
    Pending,

    /// The server's reply, decoded lossily as text.
    Complete(String),

    /// The exchange ended without a usable reply.
    Failed(String),
}

/// One authorization exchange at a time.
///
/// [`send_request`](AuthTransport::send_request) tears down any previous
/// connection before opening a new one, so at most one exchange is ever in
/// flight. Once [`poll_response`](AuthTransport::poll_response) returns
/// `Complete` or `Failed` the exchange is over.
pub trait AuthTransport: Send {
    /// Connect and write the request.
    ///
    /// `now` marks the start of the response window.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or the
    /// request cannot be written. No retry is attempted.
    async fn send_request(
        &mut self,
        request: &AuthorizationRequest,
        now: Instant,
    ) -> Result<(), AuthClientError>;

    /// Collect whatever the server has sent without waiting.
    async fn poll_response(&mut self, now: Instant) -> ResponsePoll;

    /// Release the connection. Safe to call when nothing is open.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown fails; the connection is dropped
    /// either way.
    async fn close(&mut self) -> Result<(), AuthClientError>;

    fn is_connected(&self) -> bool;
}
