//! Pomodoro Hotkey Timer Library
//!
//! This library provides the core functionality for the Pomodoro timer:
//! - Stage engine cycling work, short break and long break
//! - Single-writer runner applying commands and one-second ticks
//! - Global hotkey listener posting start/pause toggles
//! - JSON settings store with atomic writes
//! - Fire-and-forget sound playback at stage changes
//! - CLI command parsing and terminal display

pub mod cli;
pub mod config;
pub mod daemon;
pub mod hotkey;
pub mod sound;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{format_clock, Settings, Stage, StageSounds, StageState, StageTimes};

// Re-export engine types
pub use daemon::{
    command_channel, CommandSender, EngineCommand, EngineEvent, EngineRunner, StageEngine,
    TickOutcome, TriggerSource,
};

// Re-export config types
pub use config::{
    load_or_default, load_settings, ConfigError, ConfigStore, JsonConfigStore, MockConfigStore,
    SettingsOrigin,
};

// Re-export hotkey types
pub use hotkey::{HotkeyCombo, HotkeyError, HotkeyListener};

// Re-export sound types
pub use sound::{try_create_player, MockSoundPlayer, RodioSoundPlayer, SoundError, SoundPlayer};
