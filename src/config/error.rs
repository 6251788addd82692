//! Settings error types.
//!
//! Every variant degrades to "use defaults" or "keep the in-memory copy";
//! none of them stops the timer.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Stage;

/// Errors that can occur while loading, validating or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("failed to read settings file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON or has the wrong shape.
    #[error("settings are not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// A stage entry is missing from `times` or `sounds`.
    #[error("settings section `{section}` has no `{stage}` entry")]
    MissingStage { section: &'static str, stage: Stage },

    /// A stage duration is not a positive number of minutes.
    #[error("duration for `{stage}` must be at least 1 minute (got {minutes})")]
    InvalidDuration { stage: Stage, minutes: u32 },

    /// The hotkey string is empty.
    #[error("hotkey must not be empty")]
    EmptyHotkey,

    /// Settings could not be serialized.
    #[error("failed to encode settings: {0}")]
    Encode(#[source] serde_json::Error),

    /// The settings file could not be written.
    #[error("failed to write settings file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Returns true if the file should be replaced with defaults.
    ///
    /// A missing, unreadable or malformed file is overwritten. A file that
    /// parses but is incomplete or out of range is left alone so the user
    /// can fix it.
    #[must_use]
    pub fn is_recoverable_with_defaults(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Parse(_))
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Read { .. } | Self::Parse(_) => "default settings were written in its place",
            Self::MissingStage { .. } => {
                "add the missing entry (work, short_break, long_break) to the settings file"
            }
            Self::InvalidDuration { .. } => "use a whole number of minutes greater than zero",
            Self::EmptyHotkey => "set a key combination such as \"ctrl+shift+p\"",
            Self::Encode(_) | Self::Write { .. } => {
                "check free disk space and permissions of the settings directory"
            }
        }
    }
}
