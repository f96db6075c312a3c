//! Stream playback controller
//!
//! Binds a display target to a remote stream. Sessions are created lazily,
//! the transport is polled until it has loaded, and a "stream does not exist"
//! negotiation failure is recovered by reconnecting after a short delay.
//!
//! Public operations are synchronous and never fail; problems surface through
//! the [`DiagnosticSink`] and the `tracing` log. They must be called from
//! inside a Tokio runtime, because timers and event delivery run as tasks.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::timer::{self, ScheduledTask, Ticket};
use super::transport::{
    DiagnosticSink, DisplayTarget, EventSink, Session, TracingDiagnostics, Transport,
    TransportError,
};
use crate::config::Timings;
use crate::models::{EventCategory, PlaybackConfig, SessionId, TransportEvent};

/// The session currently owned by the controller
struct ActiveSession {
    id: SessionId,
    handle: Box<dyn Session>,
}

impl ActiveSession {
    fn close(mut self) {
        debug!(session = %self.id, "closing session");
        self.handle.close();
    }
}

/// Mutable controller state. Only ever touched under the controller's lock.
#[derive(Default)]
struct ControllerState {
    config: PlaybackConfig,
    session: Option<ActiveSession>,
    retry_timer: Option<ScheduledTask>,
    poll_timer: Option<ScheduledTask>,
    present_timer: Option<ScheduledTask>,
    last_ticket: Ticket,
}

impl ControllerState {
    fn next_ticket(&mut self) -> Ticket {
        self.last_ticket += 1;
        self.last_ticket
    }

    fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }
}

/// Take the timer in `slot` if it carries `ticket`, releasing it without abort
fn take_if_current(slot: &mut Option<ScheduledTask>, ticket: Ticket) -> bool {
    match slot.take() {
        Some(task) if task.ticket() == ticket => {
            task.finish();
            true
        }
        other => {
            *slot = other;
            false
        }
    }
}

struct Inner {
    transport: Arc<dyn Transport>,
    target: Arc<dyn DisplayTarget>,
    diagnostics: Arc<dyn DiagnosticSink>,
    timings: Timings,
    events: mpsc::UnboundedSender<(SessionId, TransportEvent)>,
    state: Mutex<ControllerState>,
}

impl Inner {
    fn configure(self: &Arc<Self>, config: PlaybackConfig) {
        debug!(source = ?config.source(), "applying playback config");
        self.state.lock().config = config;
        self.pause();
        self.play();
    }

    fn create_session(&self) {
        let mut state = self.state.lock();
        let result = self.create_session_locked(&mut state);
        drop(state);
        if let Err(err) = result {
            self.report_connect_error(err);
        }
    }

    /// Build a new session from the current config, closing any previous one
    fn create_session_locked(&self, state: &mut ControllerState) -> Result<(), TransportError> {
        if !state.config.has_source() {
            return Ok(());
        }
        state.close_session();

        let options = state.config.resolve();
        let id = SessionId::new();
        let sink = EventSink::new(id, self.events.clone());
        let handle = self
            .transport
            .connect(&options, Arc::clone(&self.target), sink)?;

        info!(session = %id, source = %options.source, "session created");
        state.session = Some(ActiveSession { id, handle });
        Ok(())
    }

    fn play(self: &Arc<Self>) {
        let mut state = self.state.lock();
        if !state.config.has_source() {
            return;
        }

        if !self.transport.is_ready() {
            if state.poll_timer.is_none() {
                self.schedule_poll(&mut state);
            }
            return;
        }

        let result = if state.session.is_none() {
            self.create_session_locked(&mut state)
        } else {
            Ok(())
        };
        timer::clear(&mut state.poll_timer);
        self.schedule_present(&mut state);
        drop(state);

        if let Err(err) = result {
            self.report_connect_error(err);
        }
    }

    fn pause(&self) {
        let mut state = self.state.lock();
        if state.session.is_none() {
            return;
        }
        timer::clear(&mut state.retry_timer);
        timer::clear(&mut state.present_timer);
        state.close_session();
    }

    fn destroy(&self) {
        let mut state = self.state.lock();
        timer::clear(&mut state.retry_timer);
        timer::clear(&mut state.poll_timer);
        timer::clear(&mut state.present_timer);
        state.close_session();
    }

    fn schedule_poll(self: &Arc<Self>, state: &mut ControllerState) {
        let ticket = state.next_ticket();
        let on_tick = Arc::downgrade(self);
        let on_expire = Arc::downgrade(self);
        debug!(ticket, "transport not ready, polling");

        let task = ScheduledTask::repeating(
            ticket,
            self.timings.poll_interval(),
            self.timings.poll_timeout(),
            move || {
                if let Some(inner) = on_tick.upgrade() {
                    inner.poll_tick(ticket);
                }
            },
            move || {
                if let Some(inner) = on_expire.upgrade() {
                    inner.poll_expired(ticket);
                }
            },
        );
        timer::replace(&mut state.poll_timer, task);
    }

    fn poll_tick(self: &Arc<Self>, ticket: Ticket) {
        let current = self
            .state
            .lock()
            .poll_timer
            .as_ref()
            .is_some_and(|t| t.ticket() == ticket);
        if current {
            self.play();
        }
    }

    fn poll_expired(&self, ticket: Ticket) {
        let mut state = self.state.lock();
        let gave_up = take_if_current(&mut state.poll_timer, ticket) && state.session.is_none();
        drop(state);
        if gave_up {
            debug!(ticket, "readiness poll timed out");
            self.report_connect_error(TransportError::NotLoaded);
        }
    }

    fn schedule_present(self: &Arc<Self>, state: &mut ControllerState) {
        let ticket = state.next_ticket();
        let weak = Arc::downgrade(self);
        let task = ScheduledTask::once(ticket, self.timings.present_delay(), move || {
            if let Some(inner) = weak.upgrade() {
                inner.present(ticket);
            }
        });
        timer::replace(&mut state.present_timer, task);
    }

    fn present(&self, ticket: Ticket) {
        if !take_if_current(&mut self.state.lock().present_timer, ticket) {
            return;
        }
        debug!("presenting stream");
        self.target.play();
    }

    fn schedule_reconnect(self: &Arc<Self>, state: &mut ControllerState) {
        let ticket = state.next_ticket();
        let weak = Arc::downgrade(self);
        let task = ScheduledTask::once(ticket, self.timings.retry_delay(), move || {
            if let Some(inner) = weak.upgrade() {
                inner.reconnect(ticket);
            }
        });
        timer::replace(&mut state.retry_timer, task);
    }

    fn reconnect(&self, ticket: Ticket) {
        let mut state = self.state.lock();
        if !take_if_current(&mut state.retry_timer, ticket) {
            return;
        }
        info!("stream not found, reconnecting");
        let result = self.create_session_locked(&mut state);
        drop(state);
        if let Err(err) = result {
            self.report_connect_error(err);
        }
    }

    fn handle_event(self: &Arc<Self>, session: SessionId, event: TransportEvent) {
        self.diagnostics.event(event.category(), &event.message());

        let TransportEvent::OfferAnswerExchangeFailed(failure) = &event else {
            return;
        };
        warn!(
            session = %session,
            code = failure.code,
            "offer/answer exchange failed: {}",
            failure.message
        );
        if !failure.is_stream_not_found() {
            return;
        }

        // session check and retry install share one lock
        let mut state = self.state.lock();
        let current = state.session.as_ref().is_some_and(|s| s.id == session);
        if !current {
            debug!(session = %session, "event from a session that is no longer active");
            return;
        }
        self.schedule_reconnect(&mut state);
    }

    fn report_connect_error(&self, err: TransportError) {
        warn!(error = %err, "no session could be created");
        self.diagnostics
            .event(EventCategory::ConnectError, &err.to_string());
    }
}

/// Builder for [`StreamPlaybackController`]
pub struct ControllerBuilder {
    transport: Arc<dyn Transport>,
    target: Arc<dyn DisplayTarget>,
    diagnostics: Arc<dyn DiagnosticSink>,
    timings: Timings,
}

impl ControllerBuilder {
    /// Use custom timings instead of the defaults
    pub fn timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Send diagnostics somewhere other than the `tracing` log
    pub fn diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Arc::new(sink);
        self
    }

    /// Build the controller and start its event dispatcher.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn build(self) -> StreamPlaybackController {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            transport: self.transport,
            target: self.target,
            diagnostics: self.diagnostics,
            timings: self.timings,
            events: tx,
            state: Mutex::new(ControllerState::default()),
        });
        let dispatcher = tokio::spawn(dispatch(Arc::downgrade(&inner), rx));
        StreamPlaybackController { inner, dispatcher }
    }
}

/// Route transport events to the controller until it goes away
async fn dispatch(
    inner: Weak<Inner>,
    mut rx: mpsc::UnboundedReceiver<(SessionId, TransportEvent)>,
) {
    while let Some((session, event)) = rx.recv().await {
        let Some(controller) = inner.upgrade() else {
            break;
        };
        controller.handle_event(session, event);
    }
}

/// Drives one remote stream into one display target.
///
/// Dropping the controller tears everything down like [`destroy`](Self::destroy).
pub struct StreamPlaybackController {
    inner: Arc<Inner>,
    dispatcher: JoinHandle<()>,
}

impl StreamPlaybackController {
    /// Start building a controller over `transport` that presents into `target`
    pub fn builder(
        transport: Arc<dyn Transport>,
        target: Arc<dyn DisplayTarget>,
    ) -> ControllerBuilder {
        ControllerBuilder {
            transport,
            target,
            diagnostics: Arc::new(TracingDiagnostics),
            timings: Timings::default(),
        }
    }

    /// Controller with default timings that logs diagnostics via `tracing`
    pub fn new(transport: Arc<dyn Transport>, target: Arc<dyn DisplayTarget>) -> Self {
        Self::builder(transport, target).build()
    }

    /// Apply a new configuration: tear down the current session, then play.
    ///
    /// Call this on first activation and whenever the caller's options change.
    pub fn configure(&self, config: PlaybackConfig) {
        self.inner.configure(config);
    }

    /// Build a new session from the current configuration.
    ///
    /// Does nothing without a source. Any existing session is closed first.
    pub fn create_session(&self) {
        self.inner.create_session();
    }

    /// Start playback, waiting for the transport to load if needed
    pub fn play(&self) {
        self.inner.play();
    }

    /// Close the current session, if any
    pub fn pause(&self) {
        self.inner.pause();
    }

    /// Cancel every timer and release the session. Safe to call repeatedly.
    pub fn destroy(&self) {
        self.inner.destroy();
    }

    pub fn has_session(&self) -> bool {
        self.inner.state.lock().session.is_some()
    }

    /// Id of the active session
    pub fn session_id(&self) -> Option<SessionId> {
        self.inner.state.lock().session.as_ref().map(|s| s.id)
    }

    /// Whether the underlying transport has finished loading
    pub fn is_transport_ready(&self) -> bool {
        self.inner.transport.is_ready()
    }

    /// The configuration last passed to [`configure`](Self::configure)
    pub fn config(&self) -> PlaybackConfig {
        self.inner.state.lock().config.clone()
    }

    pub fn timings(&self) -> Timings {
        self.inner.timings
    }

    /// Whether a readiness poll is in flight
    pub fn is_polling(&self) -> bool {
        self.inner.state.lock().poll_timer.is_some()
    }

    /// Whether a stream-not-found reconnect is scheduled
    pub fn is_reconnect_pending(&self) -> bool {
        self.inner.state.lock().retry_timer.is_some()
    }
}

impl Drop for StreamPlaybackController {
    fn drop(&mut self) {
        self.inner.destroy();
        self.dispatcher.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickets_increase() {
        let mut state = ControllerState::default();
        let a = state.next_ticket();
        let b = state.next_ticket();
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_take_if_current_ignores_stale_ticket() {
        let mut slot = Some(ScheduledTask::once(5, std::time::Duration::from_secs(60), || {}));
        assert!(!take_if_current(&mut slot, 4));
        assert!(slot.is_some());
        assert!(take_if_current(&mut slot, 5));
        assert!(slot.is_none());
    }
}
