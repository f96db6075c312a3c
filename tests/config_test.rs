//! Settings Tests
//!
//! Round-trips the settings file through disk and checks how playback
//! defaults from the file combine with a caller's options.

use rtcplay::config::{Settings, Timings};
use rtcplay::models::PlaybackConfig;

/// Saved settings load back unchanged
#[test]
fn test_settings_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut settings = Settings::default();
    settings.timings = Timings {
        retry_delay_ms: 500,
        poll_timeout_ms: 12_000,
        ..Default::default()
    };
    settings.playback = PlaybackConfig {
        source: Some("http://media/index/api/webrtc?app=live&stream=door".into()),
        video_enable: Some(true),
        ..Default::default()
    };
    settings.logging.level = "debug".into();

    settings.save_to(&path).unwrap();
    let loaded = Settings::load_from(&path).unwrap();

    assert_eq!(loaded, settings);
}

/// A missing file is an error when loaded explicitly
#[test]
fn test_load_from_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = Settings::load_from(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read"));
}

/// The file may use the transport's own key names
#[test]
fn test_settings_accept_wire_key_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[playback]
zlmsdpUrl = "rtsp://cam"
audioEnable = true
recvOnly = false

[logging]
format = "json"
"#,
    )
    .unwrap();

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.playback.source(), Some("rtsp://cam"));
    assert_eq!(settings.playback.audio_enable, Some(true));
    assert_eq!(settings.playback.recv_only, Some(false));
    assert_eq!(settings.logging.format, "json");
    assert_eq!(settings.logging.level, "info");
    assert_eq!(settings.timings, Timings::default());
}

/// Caller options win over file defaults; the result resolves over built-in defaults
#[test]
fn test_file_defaults_under_caller_options() {
    let settings = Settings::from_toml(
        r#"
[playback]
source = "rtsp://default"
debug = true
"#,
    )
    .unwrap();

    let config = settings.playback_for(&PlaybackConfig {
        source: Some("rtsp://override".into()),
        ..Default::default()
    });
    let options = config.resolve();

    assert_eq!(options.source, "rtsp://override");
    assert!(options.debug);
    assert!(options.recv_only);
    assert!(!options.audio_enable);
}

/// An unknown log format in the file is rejected instead of falling back to text
#[test]
fn test_load_from_rejects_unknown_log_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[logging]\nformat = \"yaml\"\n").unwrap();

    let err = Settings::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Invalid log format 'yaml'"));
}
