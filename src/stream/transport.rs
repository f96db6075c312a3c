//! Seams to the outside world
//!
//! The controller never talks to a WebRTC stack or a video surface directly.
//! Callers plug in a [`Transport`] (the session library), a [`DisplayTarget`]
//! (whatever presents the media) and optionally a [`DiagnosticSink`].

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::models::{EventCategory, SessionId, SessionOptions, TransportEvent};

/// Errors a transport may return when asked for a session
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport library is not loaded")]
    NotLoaded,
    #[error("Failed to connect to {source_url}: {reason}")]
    ConnectFailed { source_url: String, reason: String },
}

/// Something that can present a remote stream (a video element, a window, a sink)
pub trait DisplayTarget: Send + Sync {
    /// Start presenting whatever stream is bound to this target
    fn play(&self);
}

/// A live transport session
pub trait Session: Send {
    /// Release every transport resource held by the session
    fn close(&mut self);
}

/// The session library
pub trait Transport: Send + Sync {
    /// Whether the library has finished loading and can build sessions
    fn is_ready(&self) -> bool;

    /// Build a session bound to `target`.
    ///
    /// The session reports its events through `events`. Emitting from inside
    /// `connect` is allowed; delivery happens after `connect` returns.
    fn connect(
        &self,
        options: &SessionOptions,
        target: Arc<dyn DisplayTarget>,
        events: EventSink,
    ) -> Result<Box<dyn Session>, TransportError>;
}

/// Receives one diagnostic per transport event.
///
/// Sinks must not call back into the controller that owns them.
pub trait DiagnosticSink: Send + Sync {
    fn event(&self, category: EventCategory, message: &str);
}

impl<F> DiagnosticSink for F
where
    F: Fn(EventCategory, &str) + Send + Sync,
{
    fn event(&self, category: EventCategory, message: &str) {
        (self)(category, message)
    }
}

/// Default sink: writes every diagnostic to the `tracing` log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn event(&self, category: EventCategory, message: &str) {
        if category.is_error() {
            tracing::warn!(category = %category, "RTC event: {}", message);
        } else {
            tracing::info!(category = %category, "RTC event: {}", message);
        }
    }
}

/// Handle a session uses to report its events back to the controller
#[derive(Debug, Clone)]
pub struct EventSink {
    session: SessionId,
    tx: UnboundedSender<(SessionId, TransportEvent)>,
}

impl EventSink {
    pub(crate) fn new(
        session: SessionId,
        tx: UnboundedSender<(SessionId, TransportEvent)>,
    ) -> Self {
        Self { session, tx }
    }

    /// Deliver an event. Returns `false` once the controller is gone.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.tx.send((self.session, event)).is_ok()
    }
}
