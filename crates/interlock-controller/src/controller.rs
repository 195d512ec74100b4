//! Access controller.
//!
//! Drives one [`AccessSession`] from the devices and the authorization
//! transport. Nothing here blocks on the outside world: the controller is
//! advanced by calling [`AccessController::tick_at`] on a fixed interval,
//! and each tick runs the same steps in order:
//!
//! 1. badge decoding (only while idle)
//! 2. current sensing and the stop input
//! 3. idle timer accumulation
//! 4. state transitions
//!
//! Every failure is mapped to its fail-closed outcome and logged. A
//! connect or transport failure denies the tap, a missing reply times out,
//! a sensor error counts as "not drawing" and a stop input error counts as
//! a stop.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, trace, warn};

use interlock_core::constants::DEFAULT_AUTH_DEADLINE_MS;
use interlock_core::{AuthorizationRequest, BadgeId, InterlockConfig, ToolId};
use interlock_hardware::BadgeDecoder;
use interlock_hardware::traits::{BadgeReader, CurrentSensor, RelayOutput, StopSignal};
use interlock_network::{AuthTransport, ResponsePoll, interpret};

use crate::actuator::PowerActuator;
use crate::event::{EndReason, SessionEvent, SessionSummary};
use crate::session::{AccessSession, SessionState, StateTransition};

/// Controller settings that do not belong to a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Tool identifier sent with every request.
    pub tool: ToolId,

    /// How long to wait for a verdict after the request is sent.
    pub auth_deadline: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            tool: ToolId::default(),
            auth_deadline: Duration::from_millis(DEFAULT_AUTH_DEADLINE_MS),
        }
    }
}

impl ControllerSettings {
    pub fn from_config(config: &InterlockConfig) -> Self {
        Self {
            tool: config.server.tool_id.clone(),
            auth_deadline: config.timing.auth_deadline(),
        }
    }
}

/// Relay and sensor state as of the last tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PowerState {
    /// What the relay was last told.
    pub energized: bool,

    /// Whether the tool was drawing current.
    pub drawing: bool,
}

/// The interlock's control loop.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use interlock_controller::{AccessController, ControllerSettings, SessionState};
/// use interlock_hardware::BadgeDecoder;
/// use interlock_hardware::devices::AnyStopSignal;
/// use interlock_hardware::mock::{MockBadgeReader, MockCurrentSensor, MockRelay};
/// use interlock_network::MockTransport;
///
/// #[tokio::main]
/// async fn main() {
///     let (reader, badges) = MockBadgeReader::new();
///     let (sensor, _current) = MockCurrentSensor::new();
///     let (relay, relay_handle) = MockRelay::new();
///     let (transport, server) = MockTransport::new();
///     server.reply(r#"{"authorized":true,"timeout":60}"#);
///
///     let decoder = BadgeDecoder::new(reader, Duration::from_millis(1500), Duration::from_secs(1));
///     let mut controller = AccessController::new(
///         decoder,
///         sensor,
///         AnyStopSignal::Disabled,
///         relay,
///         transport,
///         ControllerSettings::default(),
///     );
///
///     let t0 = Instant::now();
///     controller.tick_at(t0).await;
///     badges.tap("01AB123456").unwrap();
///     controller.tick_at(t0 + Duration::from_millis(10)).await;
///     controller.tick_at(t0 + Duration::from_millis(20)).await;
///
///     assert_eq!(controller.state(), SessionState::SessionActive);
///     assert!(relay_handle.is_energized());
/// }
/// ```
#[derive(Debug)]
pub struct AccessController<R, S, P, O, T> {
    decoder: BadgeDecoder<R>,
    sensor: S,
    stop: P,
    actuator: PowerActuator<O>,
    transport: T,
    session: AccessSession,
    settings: ControllerSettings,
    drawing: bool,
}

impl<R, S, P, O, T> AccessController<R, S, P, O, T>
where
    R: BadgeReader,
    S: CurrentSensor,
    P: StopSignal,
    O: RelayOutput,
    T: AuthTransport,
{
    /// Build a controller in the idle state.
    ///
    /// The relay is assumed to be de-energized already; drivers open their
    /// outputs in the inactive state.
    pub fn new(
        decoder: BadgeDecoder<R>,
        sensor: S,
        stop: P,
        relay: O,
        transport: T,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            decoder,
            sensor,
            stop,
            actuator: PowerActuator::new(relay),
            transport,
            session: AccessSession::new(Instant::now()),
            settings,
            drawing: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &AccessSession {
        &self.session
    }

    pub fn power_state(&self) -> PowerState {
        PowerState {
            energized: self.actuator.is_energized(),
            drawing: self.drawing,
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &StateTransition> {
        self.session.history().iter()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one tick at the current time.
    pub async fn tick(&mut self) -> Vec<SessionEvent> {
        self.tick_at(Instant::now()).await
    }

    /// Run one tick as if the clock read `now`.
    pub async fn tick_at(&mut self, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        let badge = if self.session.state() == SessionState::Idle {
            self.decoder.poll(now).await
        } else {
            None
        };

        let drawing = match self.sensor.is_drawing_power().await {
            Ok(drawing) => drawing,
            Err(e) => {
                warn!("Current sensing failed, treating tool as idle: {}", e);
                false
            }
        };
        self.track_drawing(drawing, &mut events);

        let stop_requested = match self.stop.is_asserted(now).await {
            Ok(asserted) => asserted,
            Err(e) => {
                warn!("Stop input unreadable, treating as pressed: {}", e);
                true
            }
        };

        self.session.timer_mut().advance(now);

        match self.session.state() {
            SessionState::Idle => {
                if let Some(badge) = badge {
                    self.on_badge(badge, now, &mut events).await;
                }
            }
            SessionState::AwaitingAuthorization => self.on_awaiting(now, &mut events).await,
            SessionState::Denied => {
                if let Some(badge) = self.session.badge() {
                    warn!(badge = %badge, "Access denied");
                }
                self.return_to_idle(now).await;
            }
            SessionState::SessionActive => {
                self.on_active(drawing, stop_requested, now, &mut events)
                    .await
            }
        }

        events
    }

    /// Remove power and drop any open exchange.
    ///
    /// Ends an active session with [`EndReason::Shutdown`].
    pub async fn shutdown(&mut self) -> Vec<SessionEvent> {
        let now = Instant::now();
        let mut events = Vec::new();
        info!(state = %self.session.state(), "Shutting down controller");

        match self.session.state() {
            SessionState::SessionActive => {
                self.end_session(EndReason::Shutdown, now, &mut events)
                    .await
            }
            SessionState::Idle => self.power_off().await,
            SessionState::AwaitingAuthorization | SessionState::Denied => {
                self.power_off().await;
                self.close_transport().await;
                self.return_to_idle(now).await;
            }
        }
        self.close_transport().await;

        events
    }

    fn track_drawing(&mut self, drawing: bool, events: &mut Vec<SessionEvent>) {
        if drawing == self.drawing {
            return;
        }
        self.drawing = drawing;

        if let Some(session) = self.session.session_id()
            && self.session.state() == SessionState::SessionActive
        {
            if drawing {
                debug!(session = %session, "Tool started");
                events.push(SessionEvent::ToolStarted { session });
            } else {
                debug!(session = %session, "Tool stopped");
                events.push(SessionEvent::ToolStopped { session });
            }
        }
    }

    async fn on_badge(&mut self, badge: BadgeId, now: Instant, events: &mut Vec<SessionEvent>) {
        info!(badge = %badge, "Badge read");
        events.push(SessionEvent::BadgeRead { badge });

        let request = AuthorizationRequest::new(badge, self.settings.tool.clone());
        match self.transport.send_request(&request, now).await {
            Ok(()) => {
                self.session.begin_attempt(badge);
                self.enter(SessionState::AwaitingAuthorization, now);
                self.session.timer_mut().enable(now);
                events.push(SessionEvent::RequestSent { badge });
            }
            Err(e) => {
                warn!(badge = %badge, "Authorization server unreachable, access denied: {}", e);
                self.close_transport().await;
                events.push(SessionEvent::ConnectFailed {
                    badge,
                    reason: e.to_string(),
                });
            }
        }
    }

    async fn on_awaiting(&mut self, now: Instant, events: &mut Vec<SessionEvent>) {
        let Some(badge) = self.session.badge() else {
            error!("Awaiting authorization without a badge");
            self.close_transport().await;
            self.return_to_idle(now).await;
            return;
        };

        // A reply that only becomes readable after the deadline is not honored.
        if self.session.timer().exceeded(self.settings.auth_deadline) {
            warn!(
                badge = %badge,
                "No authorization response within {}ms, access denied",
                self.settings.auth_deadline.as_millis()
            );
            self.close_transport().await;
            events.push(SessionEvent::AuthorizationTimedOut { badge });
            self.return_to_idle(now).await;
            return;
        }

        match self.transport.poll_response(now).await {
            ResponsePoll::Complete(text) => {
                self.close_transport().await;
                let response = interpret(&text);
                debug!(
                    badge = %badge,
                    authorized = response.authorized,
                    granted_ms = response.granted_duration.as_millis() as u64,
                    "Authorization response received"
                );

                if response.authorized {
                    self.start_session(badge, response.granted_duration, now, events)
                        .await;
                } else {
                    self.enter(SessionState::Denied, now);
                    self.session.timer_mut().disable();
                    events.push(SessionEvent::Denied { badge });
                }
            }
            ResponsePoll::Failed(reason) => {
                warn!(badge = %badge, "Authorization exchange failed, access denied: {}", reason);
                self.close_transport().await;
                events.push(SessionEvent::TransportFailed { badge, reason });
                self.return_to_idle(now).await;
            }
            ResponsePoll::Pending => trace!(badge = %badge, "Awaiting authorization response"),
        }
    }

    async fn start_session(
        &mut self,
        badge: BadgeId,
        duration: Duration,
        now: Instant,
        events: &mut Vec<SessionEvent>,
    ) {
        self.enter(SessionState::SessionActive, now);
        self.session.timer_mut().disable();
        let session = self.session.grant(duration);
        info!(
            badge = %badge,
            session = %session,
            granted_secs = duration.as_secs(),
            "Access granted"
        );

        match self.actuator.turn_on(&mut self.session, now).await {
            Ok(()) => events.push(SessionEvent::Granted {
                badge,
                session,
                duration,
            }),
            Err(e) => {
                error!(session = %session, "Failed to energize relay: {}", e);
                self.end_session(EndReason::RelayFault, now, events).await;
            }
        }
    }

    async fn on_active(
        &mut self,
        drawing: bool,
        stop_requested: bool,
        now: Instant,
        events: &mut Vec<SessionEvent>,
    ) {
        let timer = self.session.timer_mut();
        if drawing {
            timer.disable();
        } else if !timer.is_enabled() {
            timer.enable(now);
        }

        if stop_requested {
            self.end_session(EndReason::ManualStop, now, events).await;
        } else if self.session.timer().exceeded(self.session.granted_duration()) {
            self.end_session(EndReason::IdleExpired, now, events).await;
        }
    }

    async fn end_session(&mut self, reason: EndReason, now: Instant, events: &mut Vec<SessionEvent>) {
        self.power_off().await;

        if let Some(summary) = self.session.finish(reason) {
            log_summary(&summary);
            events.push(SessionEvent::SessionEnded(summary));
        }
        self.return_to_idle(now).await;
    }

    async fn power_off(&mut self) {
        if let Err(e) = self.actuator.turn_off(&mut self.session).await {
            error!("Failed to de-energize relay: {}", e);
        }
    }

    async fn close_transport(&mut self) {
        if let Err(e) = self.transport.close().await {
            debug!("Error closing authorization connection: {}", e);
        }
    }

    async fn return_to_idle(&mut self, now: Instant) {
        self.session.timer_mut().disable();
        self.enter(SessionState::Idle, now);
        self.decoder.flush().await;
    }

    fn enter(&mut self, state: SessionState, now: Instant) {
        let dwell = self.session.time_in_state(now);
        match self.session.transition_to(state, now) {
            Ok(transition) => debug!(
                from = %transition.from,
                to = %transition.to,
                after_ms = dwell.as_millis() as u64,
                "State transition"
            ),
            Err(e) => error!("{}", e),
        }
    }
}

fn log_summary(summary: &SessionSummary) {
    info!(
        session = %summary.session,
        badge = %summary.badge,
        reason = %summary.reason,
        duration_secs = summary.duration().num_seconds(),
        "Session ended"
    );
}
