//! Network layer for the power interlock.
//!
//! Asks the membership server whether a badge may use this tool, and turns
//! the server's reply into an [`AuthorizationResponse`](interlock_core::AuthorizationResponse).
//!
//! # Components
//!
//! - **AuthClient**: HTTP/1.1 over a short-lived TCP connection, one exchange at a time
//! - **AuthTransport**: the seam the controller talks to, implemented by `AuthClient`
//!   and by `MockTransport`
//! - **interpret**: marker scan over the raw response text
//!
//! # Example
//!
//! ```no_run
//! use std::time::Instant;
//! use interlock_core::{AuthorizationRequest, BadgeId, ToolId};
//! use interlock_network::{AuthClient, AuthClientConfig, AuthTransport, ResponsePoll, interpret};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = AuthClient::new(AuthClientConfig::default());
//! let request = AuthorizationRequest::new(BadgeId::new(0xAB12_3456), ToolId::default());
//!
//! client.send_request(&request, Instant::now()).await?;
//! loop {
//!     match client.poll_response(Instant::now()).await {
//!         ResponsePoll::Pending => tokio::time::sleep(std::time::Duration::from_millis(10)).await,
//!         ResponsePoll::Complete(text) => {
//!             println!("{:?}", interpret(&text));
//!             break;
//!         }
//!         ResponsePoll::Failed(reason) => {
//!             println!("no answer: {}", reason);
//!             break;
//!         }
//!     }
//! }
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod interpret;
pub mod mock;
mod transport;

pub use client::{AuthClient, AuthClientConfig, AuthClientError, build_request};
pub use interpret::interpret;
pub use mock::{MockExchange, MockTransport, MockTransportHandle};
pub use transport::{AuthTransport, ResponsePoll};
