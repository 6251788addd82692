//! Core data types for the Pomodoro timer.
//!
//! This module defines the data structures used for:
//! - Stage identity and the work/break cycle
//! - Persisted settings with validation
//! - The mutable countdown state owned by the engine

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Default global hotkey.
pub const DEFAULT_HOTKEY: &str = "ctrl+shift+p";

/// Number of completed work stages per cycle; every N-th break is long.
pub const CYCLE_LENGTH: u32 = 4;

// ============================================================================
// Stage
// ============================================================================

/// The current phase of the Pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Focused work
    #[default]
    Work,
    /// Short break between work stages
    ShortBreak,
    /// Long break after every fourth work stage
    LongBreak,
}

impl Stage {
    /// All stages, in settings-file order.
    pub const ALL: [Stage; 3] = [Stage::Work, Stage::ShortBreak, Stage::LongBreak];

    /// Returns the key used for this stage in the settings file.
    pub fn key(&self) -> &'static str {
        match self {
            Stage::Work => "work",
            Stage::ShortBreak => "short_break",
            Stage::LongBreak => "long_break",
        }
    }

    /// Returns the human-readable label shown on stage change.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Work => "Work",
            Stage::ShortBreak => "Short break",
            Stage::LongBreak => "Long break",
        }
    }

    /// Returns true for either break stage.
    pub fn is_break(&self) -> bool {
        matches!(self, Stage::ShortBreak | Stage::LongBreak)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ============================================================================
// StageTimes / StageSounds
// ============================================================================

/// Stage durations in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageTimes {
    pub work: u32,
    pub short_break: u32,
    pub long_break: u32,
}

impl Default for StageTimes {
    fn default() -> Self {
        Self {
            work: 25,
            short_break: 5,
            long_break: 15,
        }
    }
}

impl StageTimes {
    /// Returns the duration of `stage` in minutes.
    pub fn minutes(&self, stage: Stage) -> u32 {
        match stage {
            Stage::Work => self.work,
            Stage::ShortBreak => self.short_break,
            Stage::LongBreak => self.long_break,
        }
    }

    /// Returns a copy with `stage` set to `minutes`.
    #[must_use]
    pub fn with_minutes(mut self, stage: Stage, minutes: u32) -> Self {
        match stage {
            Stage::Work => self.work = minutes,
            Stage::ShortBreak => self.short_break = minutes,
            Stage::LongBreak => self.long_break = minutes,
        }
        self
    }

    /// Returns the duration of `stage` in seconds.
    pub fn seconds(&self, stage: Stage) -> u32 {
        self.minutes(stage).saturating_mul(60)
    }

    /// Checks that every duration is a positive number of minutes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for stage in Stage::ALL {
            let minutes = self.minutes(stage);
            if minutes == 0 {
                return Err(ConfigError::InvalidDuration { stage, minutes });
            }
        }
        Ok(())
    }
}

/// Sound clip paths played when a stage begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSounds {
    pub work: PathBuf,
    pub short_break: PathBuf,
    pub long_break: PathBuf,
}

impl Default for StageSounds {
    fn default() -> Self {
        Self {
            work: PathBuf::from("sounds/work_complete.wav"),
            short_break: PathBuf::from("sounds/short_break.wav"),
            long_break: PathBuf::from("sounds/long_break.wav"),
        }
    }
}

impl StageSounds {
    /// Returns the clip path for `stage`.
    pub fn clip(&self, stage: Stage) -> &Path {
        match stage {
            Stage::Work => &self.work,
            Stage::ShortBreak => &self.short_break,
            Stage::LongBreak => &self.long_break,
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

fn default_hotkey() -> String {
    DEFAULT_HOTKEY.to_string()
}

/// Settings as they appear on disk, before the stage keys are checked.
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default = "default_hotkey")]
    hotkey: String,
    sounds: BTreeMap<String, PathBuf>,
    times: BTreeMap<String, u32>,
}

fn take_stage<T>(
    map: &mut BTreeMap<String, T>,
    section: &'static str,
    stage: Stage,
) -> Result<T, ConfigError> {
    map.remove(stage.key())
        .ok_or(ConfigError::MissingStage { section, stage })
}

/// User-configurable settings persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSettings")]
pub struct Settings {
    /// Global key combination, e.g. "ctrl+shift+p"
    pub hotkey: String,
    /// Sound clip per stage
    pub sounds: StageSounds,
    /// Duration per stage in minutes
    pub times: StageTimes,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotkey: default_hotkey(),
            sounds: StageSounds::default(),
            times: StageTimes::default(),
        }
    }
}

impl TryFrom<RawSettings> for Settings {
    type Error = ConfigError;

    fn try_from(mut raw: RawSettings) -> Result<Self, Self::Error> {
        let sounds = StageSounds {
            work: take_stage(&mut raw.sounds, "sounds", Stage::Work)?,
            short_break: take_stage(&mut raw.sounds, "sounds", Stage::ShortBreak)?,
            long_break: take_stage(&mut raw.sounds, "sounds", Stage::LongBreak)?,
        };
        let times = StageTimes {
            work: take_stage(&mut raw.times, "times", Stage::Work)?,
            short_break: take_stage(&mut raw.times, "times", Stage::ShortBreak)?,
            long_break: take_stage(&mut raw.times, "times", Stage::LongBreak)?,
        };

        let settings = Self {
            hotkey: raw.hotkey,
            sounds,
            times,
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Settings {
    /// Parses settings from JSON text.
    ///
    /// Malformed JSON yields `ConfigError::Parse`; a well-formed document with
    /// a missing stage key or a zero duration yields the specific error so the
    /// caller can tell a broken file from an incomplete one.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let raw: RawSettings = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        Self::try_from(raw)
    }

    /// Validates durations and the hotkey string.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hotkey.trim().is_empty() {
            return Err(ConfigError::EmptyHotkey);
        }
        self.times.validate()
    }
}

// ============================================================================
// StageState
// ============================================================================

/// The mutable countdown state. Only `StageEngine` mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StageState {
    /// Current stage of the cycle
    pub current_stage: Stage,
    /// Completed work stages this session
    pub stage_count: u32,
    /// Seconds left in the current stage; `None` until the first start
    pub seconds_remaining: Option<u32>,
    /// Whether the countdown is running
    pub running: bool,
}

impl StageState {
    /// Creates the initial state: Work, paused, countdown unset.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Formats seconds as `MM:SS`.
pub fn format_clock(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

// ============================================================================
// Tests
// ============================================================================
