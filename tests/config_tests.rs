//! Settings file tests against a real filesystem.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use tokio::sync::mpsc;

use pomodoro_hotkey::config::{
    load_or_default, load_settings, ConfigError, ConfigStore, JsonConfigStore, SettingsOrigin,
};
use pomodoro_hotkey::daemon::StageEngine;
use pomodoro_hotkey::types::{Settings, Stage, StageSounds, StageTimes};

fn create_store() -> (TempDir, JsonConfigStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonConfigStore::new(dir.path().join("settings.json"));
    (dir, store)
}

fn custom_settings() -> Settings {
    Settings {
        hotkey: "alt+f9".to_string(),
        sounds: StageSounds {
            work: PathBuf::from("/usr/share/sounds/bell.wav"),
            short_break: PathBuf::from("chime.ogg"),
            long_break: PathBuf::from("gong.flac"),
        },
        times: StageTimes {
            work: 50,
            short_break: 10,
            long_break: 30,
        },
    }
}

// ============================================================================
// Round Trip
// ============================================================================

#[test]
fn test_saved_settings_load_back_identical() {
    let (_dir, store) = create_store();
    let settings = custom_settings();

    store.save(&settings).unwrap();

    assert_eq!(store.load().unwrap(), settings);
}

#[test]
fn test_file_shape() {
    let (_dir, store) = create_store();
    store.save(&Settings::default()).unwrap();

    let text = fs::read_to_string(store.path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(value["hotkey"], "ctrl+shift+p");
    assert_eq!(value["times"]["work"], 25);
    assert_eq!(value["times"]["short_break"], 5);
    assert_eq!(value["times"]["long_break"], 15);
    assert_eq!(value["sounds"]["short_break"], "sounds/short_break.wav");
    assert!(text.contains("\n    \"hotkey\""));
}

#[test]
fn test_key_order_and_extra_keys_ignored() {
    let (_dir, store) = create_store();
    fs::write(
        store.path(),
        r#"{
            "times": {"long_break": 20, "work": 40, "short_break": 8, "focus": 99},
            "theme": "dark",
            "sounds": {"long_break": "c.wav", "short_break": "b.wav", "work": "a.wav"}
        }"#,
    )
    .unwrap();

    let settings = store.load().unwrap();

    assert_eq!(settings.hotkey, "ctrl+shift+p");
    assert_eq!(settings.times.minutes(Stage::Work), 40);
    assert_eq!(settings.times.minutes(Stage::LongBreak), 20);
    assert_eq!(settings.sounds.clip(Stage::Work), PathBuf::from("a.wav"));
}

#[test]
fn test_save_replaces_existing_file() {
    let (_dir, store) = create_store();
    store.save(&Settings::default()).unwrap();
    store.save(&custom_settings()).unwrap();

    assert_eq!(store.load().unwrap(), custom_settings());
}

// ============================================================================
// Recovery
// ============================================================================

#[test]
fn test_missing_file_replaced_with_defaults() {
    let (_dir, store) = create_store();

    let settings = load_or_default(&store);

    assert_eq!(settings, Settings::default());
    assert_eq!(store.load().unwrap(), Settings::default());
}

#[test]
fn test_malformed_file_replaced_with_defaults() {
    let (_dir, store) = create_store();
    fs::write(store.path(), "{ not json").unwrap();

    let settings = load_or_default(&store);

    assert_eq!(settings, Settings::default());
    assert_eq!(store.load().unwrap(), Settings::default());
}

#[test]
fn test_missing_stage_key_reported_and_file_kept() {
    let (_dir, store) = create_store();
    let text = r#"{
        "hotkey": "ctrl+alt+t",
        "sounds": {"work": "a.wav", "short_break": "b.wav", "long_break": "c.wav"},
        "times": {"work": 30, "short_break": 5}
    }"#;
    fs::write(store.path(), text).unwrap();

    let err = store.load().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingStage {
            section: "times",
            stage: Stage::LongBreak
        }
    ));
    assert!(err.to_string().contains("long_break"));

    assert_eq!(load_or_default(&store), Settings::default());
    assert_eq!(fs::read_to_string(store.path()).unwrap(), text);
}

#[test]
fn test_zero_duration_reported_and_file_kept() {
    let (_dir, store) = create_store();
    let text = r#"{
        "sounds": {"work": "a.wav", "short_break": "b.wav", "long_break": "c.wav"},
        "times": {"work": 0, "short_break": 5, "long_break": 15}
    }"#;
    fs::write(store.path(), text).unwrap();

    assert!(matches!(
        store.load(),
        Err(ConfigError::InvalidDuration {
            stage: Stage::Work,
            minutes: 0
        })
    ));
    assert_eq!(load_or_default(&store), Settings::default());
    assert_eq!(fs::read_to_string(store.path()).unwrap(), text);
}

#[test]
fn test_starting_timer_keeps_incomplete_file() {
    let (_dir, store) = create_store();
    let text = r#"{"sounds": {}, "times": {"work": 30, "short_break": 5}}"#;
    fs::write(store.path(), text).unwrap();
    let path = store.path().to_path_buf();

    let (settings, origin) = load_settings(&store);
    assert_eq!(origin, SettingsOrigin::Fallback);

    let (tx, _rx) = mpsc::unbounded_channel();
    let mut engine = StageEngine::new(settings, Box::new(store), tx)
        .with_save_on_start(origin.may_overwrite());
    assert!(engine.toggle());
    engine.toggle();
    engine.toggle();

    assert_eq!(fs::read(&path).unwrap(), text.as_bytes());
}

#[test]
fn test_manual_save_replaces_incomplete_file() {
    let (_dir, store) = create_store();
    fs::write(store.path(), r#"{"sounds": {}, "times": {"work": 0}}"#).unwrap();
    let path = store.path().to_path_buf();

    let (settings, origin) = load_settings(&store);
    assert_eq!(origin, SettingsOrigin::Fallback);
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut engine = StageEngine::new(settings, Box::new(store), tx)
        .with_save_on_start(origin.may_overwrite());
    engine.save_settings().unwrap();

    assert_eq!(
        JsonConfigStore::new(&path).load().unwrap(),
        Settings::default()
    );
}

#[test]
fn test_starting_timer_saves_valid_file() {
    let (_dir, store) = create_store();
    fs::write(store.path(), serde_json::to_string(&custom_settings()).unwrap()).unwrap();
    let path = store.path().to_path_buf();

    let (settings, origin) = load_settings(&store);
    assert_eq!(origin, SettingsOrigin::Stored);
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut engine = StageEngine::new(settings, Box::new(store), tx)
        .with_save_on_start(origin.may_overwrite());
    engine.toggle();

    // Rewritten in the pretty-printed form.
    assert!(fs::read_to_string(&path).unwrap().contains("\n    \"hotkey\""));
    assert_eq!(JsonConfigStore::new(&path).load().unwrap(), custom_settings());
}

#[test]
fn test_unwritable_location_is_a_write_error() {
    let (dir, _store) = create_store();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();
    let store = JsonConfigStore::new(blocker.join("settings.json"));

    let err = store.save(&Settings::default()).unwrap_err();

    assert!(matches!(err, ConfigError::Write { .. }));
    // Loading still works from defaults even though they cannot be written.
    assert_eq!(load_or_default(&store), Settings::default());
}
