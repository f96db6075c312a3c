//! rtcplay - WebRTC stream playback with automatic reconnect
//!
//! Drives a remote media stream into a display target: creates the transport
//! session lazily, waits for the transport library to load, and reconnects
//! when the server reports that the stream does not exist yet.
//!
//! # Modules
//!
//! - `models` - Playback options, transport events, session ids
//! - `stream` - Playback controller, transport traits, timers
//! - `config` - Settings file and timings
//! - `logging` - tracing subscriber setup

pub mod config;
pub mod logging;
pub mod models;
pub mod stream;

// Re-export commonly used types
pub use config::{Settings, Timings};
pub use models::{
    EventCategory, NegotiationFailure, PlaybackConfig, SessionId, SessionOptions,
    TransportEvent,
};
pub use stream::{
    DiagnosticSink, DisplayTarget, EventSink, Session, StreamPlaybackController, Transport,
    TransportError,
};
