//! Command definitions for the Pomodoro hotkey timer.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::hotkey::HotkeyCombo;
use crate::types::Settings;

// ============================================================================
// CLI Structure
// ============================================================================

/// Pomodoro timer controlled by a global hotkey
#[derive(Parser, Debug)]
#[command(
    name = "pomodoro-hotkey",
    version,
    about = "Pomodoro timer with a global start/pause hotkey",
    long_about = "Alternates work and break stages, plays a sound at every stage change \
                  and toggles start/pause from anywhere with a global hotkey.\n\
                  Without a subcommand the timer session is started.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the timer session (default)
    Run(RunArgs),

    /// Show or change the saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Start the first work stage immediately
    #[arg(short, long)]
    pub start: bool,

    /// Disable stage change sounds
    #[arg(long)]
    pub no_sound: bool,

    /// Do not register the global hotkey
    #[arg(long)]
    pub no_hotkey: bool,
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the effective settings
    Show,

    /// Change and save settings
    #[command(long_about = "Change and save settings.\n\n\
                            A timer session that is already running keeps the settings it \
                            started with and saves them every time the timer starts, which \
                            overwrites changes made here. Set durations inside the session \
                            with `work N`, `short N` or `long N`, or quit it first.")]
    Set(SetArgs),

    /// Overwrite the settings file with defaults
    Reset,

    /// Print the settings file location
    Path,
}

// ============================================================================
// Set Command Arguments
// ============================================================================

/// Arguments for `config set`
#[derive(Args, Debug, Clone, Default)]
pub struct SetArgs {
    /// Work duration in minutes
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub work: Option<u32>,

    /// Short break duration in minutes
    #[arg(short = 'b', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub short_break: Option<u32>,

    /// Long break duration in minutes
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub long_break: Option<u32>,

    /// Global hotkey, e.g. "ctrl+shift+p"
    #[arg(long, value_parser = validate_hotkey)]
    pub hotkey: Option<String>,

    /// Clip played when a work stage begins
    #[arg(long, value_name = "PATH")]
    pub work_sound: Option<PathBuf>,

    /// Clip played when a short break begins
    #[arg(long, value_name = "PATH")]
    pub short_break_sound: Option<PathBuf>,

    /// Clip played when a long break begins
    #[arg(long, value_name = "PATH")]
    pub long_break_sound: Option<PathBuf>,
}

impl SetArgs {
    /// Returns true if no option was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.work.is_none()
            && self.short_break.is_none()
            && self.long_break.is_none()
            && self.hotkey.is_none()
            && self.work_sound.is_none()
            && self.short_break_sound.is_none()
            && self.long_break_sound.is_none()
    }

    /// Writes the given options into `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(work) = self.work {
            settings.times.work = work;
        }
        if let Some(short_break) = self.short_break {
            settings.times.short_break = short_break;
        }
        if let Some(long_break) = self.long_break {
            settings.times.long_break = long_break;
        }
        if let Some(hotkey) = &self.hotkey {
            settings.hotkey = hotkey.clone();
        }
        if let Some(path) = &self.work_sound {
            settings.sounds.work = path.clone();
        }
        if let Some(path) = &self.short_break_sound {
            settings.sounds.short_break = path.clone();
        }
        if let Some(path) = &self.long_break_sound {
            settings.sounds.long_break = path.clone();
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates a hotkey with the listener's parser and normalizes it.
fn validate_hotkey(s: &str) -> Result<String, String> {
    s.parse::<HotkeyCombo>()
        .map(|combo| combo.to_string())
        .map_err(|e| e.to_string())
}

// ============================================================================
// Tests
// ============================================================================
