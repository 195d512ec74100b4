//! Access control for a powered tool.
//!
//! A member taps a badge, the server decides whether they may use the tool
//! and for how long it may sit idle, and the relay feeding the tool follows
//! that decision.
//!
//! - [`AccessController`]: the tick-driven control loop
//! - [`AccessSession`]: state, idle timer and grant for the current user
//! - [`PowerActuator`]: relay commands
//! - [`IdleTimer`]: idle time accumulation
//! - [`SessionEvent`]: what each tick did

pub mod actuator;
pub mod controller;
pub mod event;
pub mod session;
pub mod timer;

pub use actuator::PowerActuator;
pub use controller::{AccessController, ControllerSettings, PowerState};
pub use event::{EndReason, SessionEvent, SessionSummary};
pub use session::{AccessSession, SessionState, StateTransition};
pub use timer::IdleTimer;
