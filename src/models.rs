//! Data structures shared across the playback stack
//!
//! - **Config**: caller-supplied playback options and their resolved form
//! - **Events**: transport events and the diagnostic categories they map to
//! - **Session**: identity of a transport session

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Playback Configuration
// =============================================================================

/// Caller-supplied playback options.
///
/// Every field is optional so a caller only names what it overrides. Unset
/// fields take the defaults of [`SessionOptions::default`] when a session is
/// built. The aliases accept the key names the transport uses on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Stream source address. Absent or empty disables playback.
    #[serde(alias = "zlmsdpUrl", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Ask the transport to print its own debug log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(alias = "simulecast", skip_serializing_if = "Option::is_none")]
    pub simulcast: Option<bool>,
    /// Capture the local camera
    #[serde(alias = "useCamera", skip_serializing_if = "Option::is_none")]
    pub use_camera: Option<bool>,
    #[serde(alias = "audioEnable", skip_serializing_if = "Option::is_none")]
    pub audio_enable: Option<bool>,
    #[serde(alias = "videoEnable", skip_serializing_if = "Option::is_none")]
    pub video_enable: Option<bool>,
    /// Receive-only session (no local media is published)
    #[serde(alias = "recvOnly", skip_serializing_if = "Option::is_none")]
    pub recv_only: Option<bool>,
}

impl PlaybackConfig {
    /// Config that only sets the stream source
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    /// The stream source, or `None` when absent or empty
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref().filter(|s| !s.is_empty())
    }

    /// Whether playback is enabled at all
    pub fn has_source(&self) -> bool {
        self.source().is_some()
    }

    /// Layer `self` over `base`: fields set here win, unset fields come from `base`.
    pub fn merged_over(&self, base: &PlaybackConfig) -> PlaybackConfig {
        PlaybackConfig {
            source: self.source.clone().or_else(|| base.source.clone()),
            debug: self.debug.or(base.debug),
            simulcast: self.simulcast.or(base.simulcast),
            use_camera: self.use_camera.or(base.use_camera),
            audio_enable: self.audio_enable.or(base.audio_enable),
            video_enable: self.video_enable.or(base.video_enable),
            recv_only: self.recv_only.or(base.recv_only),
        }
    }

    /// Resolve into the full option set handed to the transport
    pub fn resolve(&self) -> SessionOptions {
        SessionOptions::default().merge(self)
    }
}

/// Fully-resolved options a transport session is constructed with.
///
/// Serializes to the option object the transport constructor expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
    #[serde(rename = "zlmsdpUrl")]
    pub source: String,
    pub debug: bool,
    #[serde(rename = "simulecast")]
    pub simulcast: bool,
    pub use_camera: bool,
    pub audio_enable: bool,
    pub video_enable: bool,
    pub recv_only: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            source: String::new(),
            debug: false,
            simulcast: false,
            use_camera: false,
            audio_enable: false,
            video_enable: false,
            recv_only: true,
        }
    }
}

impl SessionOptions {
    /// Overwrite every field the config sets
    pub fn merge(mut self, config: &PlaybackConfig) -> Self {
        if let Some(source) = &config.source {
            self.source = source.clone();
        }
        if let Some(debug) = config.debug {
            self.debug = debug;
        }
        if let Some(simulcast) = config.simulcast {
            self.simulcast = simulcast;
        }
        if let Some(use_camera) = config.use_camera {
            self.use_camera = use_camera;
        }
        if let Some(audio_enable) = config.audio_enable {
            self.audio_enable = audio_enable;
        }
        if let Some(video_enable) = config.video_enable {
            self.video_enable = video_enable;
        }
        if let Some(recv_only) = config.recv_only {
            self.recv_only = recv_only;
        }
        self
    }

    /// JSON object form, for transports that take their options as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

// =============================================================================
// Transport Events
// =============================================================================

/// Error code the media server sends when the requested stream is not published
pub const STREAM_NOT_FOUND_CODE: i32 = -400;

/// Messages that accompany [`STREAM_NOT_FOUND_CODE`] for a missing stream
pub const STREAM_NOT_FOUND_MESSAGES: &[&str] = &["流不存在", "stream does not exist"];

/// Offer/answer exchange failure reported by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationFailure {
    pub code: i32,
    #[serde(alias = "msg")]
    pub message: String,
}

impl NegotiationFailure {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The failure the server reports when the stream is not (yet) published
    pub fn stream_not_found() -> Self {
        Self::new(STREAM_NOT_FOUND_CODE, STREAM_NOT_FOUND_MESSAGES[0])
    }

    /// True for the one failure that is recovered by reconnecting
    pub fn is_stream_not_found(&self) -> bool {
        self.code == STREAM_NOT_FOUND_CODE
            && STREAM_NOT_FOUND_MESSAGES.contains(&self.message.as_str())
    }
}

impl fmt::Display for NegotiationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// Events a transport session emits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// ICE candidate negotiation failed; the session stays up
    IceNegotiationError,
    /// Remote media arrived and can be presented
    RemoteStreamAvailable,
    /// SDP offer/answer exchange with the server failed
    OfferAnswerExchangeFailed(NegotiationFailure),
    /// Local capture stream is available
    LocalStreamAvailable,
}

impl TransportEvent {
    /// Diagnostic category for this event
    pub fn category(&self) -> EventCategory {
        match self {
            TransportEvent::IceNegotiationError => EventCategory::IceError,
            TransportEvent::RemoteStreamAvailable => EventCategory::Playing,
            TransportEvent::OfferAnswerExchangeFailed(_) => EventCategory::OfferAnswerError,
            TransportEvent::LocalStreamAvailable => EventCategory::LocalStream,
        }
    }

    /// Human-readable message for the diagnostic sink
    pub fn message(&self) -> String {
        match self {
            TransportEvent::IceNegotiationError => "ICE negotiation failed".to_string(),
            TransportEvent::RemoteStreamAvailable => "remote stream playing".to_string(),
            TransportEvent::OfferAnswerExchangeFailed(failure) => {
                format!("offer/answer exchange failed: {}", failure)
            }
            TransportEvent::LocalStreamAvailable => "local stream available".to_string(),
        }
    }
}

/// Category tag delivered with every diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    IceError,
    Playing,
    OfferAnswerError,
    LocalStream,
    /// The transport refused to create a session
    ConnectError,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::IceError => "ICE ERROR",
            EventCategory::Playing => "playing",
            EventCategory::OfferAnswerError => "OFFER ANSWER ERROR",
            EventCategory::LocalStream => "LOCAL STREAM",
            EventCategory::ConnectError => "CONNECT ERROR",
        }
    }

    /// Whether this category reports a failure
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            EventCategory::IceError | EventCategory::OfferAnswerError | EventCategory::ConnectError
        )
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Identity of one transport session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session_options() {
        let options = SessionOptions::default();
        assert_eq!(options.source, "");
        assert!(!options.debug);
        assert!(!options.simulcast);
        assert!(!options.use_camera);
        assert!(!options.audio_enable);
        assert!(!options.video_enable);
        assert!(options.recv_only);
    }

    #[test]
    fn test_resolve_keeps_defaults_for_unset_fields() {
        let config = PlaybackConfig {
            source: Some("rtsp://x".into()),
            audio_enable: Some(true),
            ..Default::default()
        };
        let options = config.resolve();
        assert_eq!(options.source, "rtsp://x");
        assert!(options.audio_enable);
        assert!(options.recv_only);
        assert!(!options.video_enable);
    }

    #[test]
    fn test_empty_source_disables_playback() {
        assert!(!PlaybackConfig::default().has_source());
        assert!(!PlaybackConfig::with_source("").has_source());
        assert!(PlaybackConfig::with_source("rtsp://x").has_source());
    }

    #[test]
    fn test_merged_over_prefers_own_fields() {
        let base = PlaybackConfig {
            source: Some("rtsp://base".into()),
            video_enable: Some(true),
            recv_only: Some(false),
            ..Default::default()
        };
        let over = PlaybackConfig {
            source: Some("rtsp://over".into()),
            recv_only: Some(true),
            ..Default::default()
        };
        let merged = over.merged_over(&base);
        assert_eq!(merged.source(), Some("rtsp://over"));
        assert_eq!(merged.video_enable, Some(true));
        assert_eq!(merged.recv_only, Some(true));
        assert_eq!(merged.audio_enable, None);
    }

    #[test]
    fn test_config_accepts_wire_names() {
        let json = r#"{"zlmsdpUrl": "http://srv/index/api/webrtc?app=live&stream=cam", "audioEnable": true, "recvOnly": false}"#;
        let config: PlaybackConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.source(),
            Some("http://srv/index/api/webrtc?app=live&stream=cam")
        );
        assert_eq!(config.audio_enable, Some(true));
        assert_eq!(config.recv_only, Some(false));
    }

    #[test]
    fn test_session_options_json_uses_wire_names() {
        let json = PlaybackConfig::with_source("rtsp://x").resolve().to_json();
        assert_eq!(json["zlmsdpUrl"], "rtsp://x");
        assert_eq!(json["recvOnly"], true);
        assert_eq!(json["simulecast"], false);
        assert_eq!(json["useCamera"], false);
    }

    #[test]
    fn test_stream_not_found_detection() {
        assert!(NegotiationFailure::stream_not_found().is_stream_not_found());
        assert!(NegotiationFailure::new(-400, "stream does not exist").is_stream_not_found());
        assert!(!NegotiationFailure::new(-400, "auth failed").is_stream_not_found());
        assert!(!NegotiationFailure::new(-500, "流不存在").is_stream_not_found());
    }

    #[test]
    fn test_event_categories() {
        assert_eq!(TransportEvent::RemoteStreamAvailable.category().as_str(), "playing");
        assert_eq!(TransportEvent::IceNegotiationError.category(), EventCategory::IceError);
        assert_eq!(
            TransportEvent::OfferAnswerExchangeFailed(NegotiationFailure::stream_not_found())
                .category(),
            EventCategory::OfferAnswerError
        );
        assert!(EventCategory::ConnectError.is_error());
        assert!(!EventCategory::Playing.is_error());
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
