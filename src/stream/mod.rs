//! Playback infrastructure
//!
//! - Controller: session lifecycle, readiness polling and reconnect
//! - Transport: traits the caller implements (session library, display target, diagnostics)
//! - Timer: cancellable one-shot and repeating tasks

pub mod controller;
pub mod timer;
pub mod transport;

pub use controller::{ControllerBuilder, StreamPlaybackController};
pub use timer::ScheduledTask;
pub use transport::{
    DiagnosticSink, DisplayTarget, EventSink, Session, TracingDiagnostics, Transport,
    TransportError,
};
