//! Stage engine for the Pomodoro timer.
//!
//! This module provides the core timer functionality:
//! - Start/pause toggling with save-on-start
//! - One-second countdown steps
//! - Work → break → work transitions, long break after every 4th work stage
//! - Events for the display and stage sounds
//!
//! The engine is a plain synchronous state machine. Timing and
//! serialization of callers are the runner's job (see `runner.rs`).

use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::config::{ConfigError, ConfigStore};
use crate::sound::SoundPlayer;
use crate::types::{format_clock, Settings, Stage, StageState, StageTimes, CYCLE_LENGTH};

/// Button text while the timer is running.
pub const RUNNING_LABEL: &str = "Pause";

/// Button text while the timer is paused.
pub const PAUSED_LABEL: &str = "Start";

/// Returns the run/pause button text for `running`.
pub fn run_label(running: bool) -> &'static str {
    if running {
        RUNNING_LABEL
    } else {
        PAUSED_LABEL
    }
}

/// Returns the break that follows the `completed_work`-th work stage.
pub fn break_after(completed_work: u32) -> Stage {
    if completed_work % CYCLE_LENGTH == 0 {
        Stage::LongBreak
    } else {
        Stage::ShortBreak
    }
}

// ============================================================================
// EngineEvent
// ============================================================================

/// Notifications for the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The countdown changed
    TimeUpdated {
        /// Remaining time as `MM:SS`
        text: String,
    },
    /// A new stage began
    StageChanged {
        stage: Stage,
        /// Human-readable stage name
        label: String,
        /// Full duration of the new stage
        duration_seconds: u32,
    },
    /// The timer was started or paused
    RunStateChanged {
        running: bool,
        /// Button text for the new state
        label: &'static str,
    },
}

/// Result of a single `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer was paused; nothing changed
    Ignored,
    /// One second was counted down
    Counted,
    /// The countdown reached zero and the next stage began
    StageAdvanced,
}

// ============================================================================
// StageEngine
// ============================================================================

/// Sole owner and mutator of the stage state.
pub struct StageEngine {
    state: StageState,
    settings: Settings,
    store: Box<dyn ConfigStore + Send>,
    sound: Option<Box<dyn SoundPlayer + Send>>,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    save_on_start: bool,
}

impl StageEngine {
    /// Creates an engine at Work, paused, with the countdown unset.
    pub fn new(
        settings: Settings,
        store: Box<dyn ConfigStore + Send>,
        event_tx: mpsc::UnboundedSender<EngineEvent>,
    ) -> Self {
        Self {
            state: StageState::new(),
            settings,
            store,
            sound: None,
            event_tx,
            save_on_start: true,
        }
    }

    /// Sets whether starting the timer saves the settings.
    ///
    /// Turned off when the stored settings are invalid and were replaced by
    /// defaults for this session only. A successful `save_settings` turns it
    /// back on.
    #[must_use]
    pub fn with_save_on_start(mut self, enabled: bool) -> Self {
        self.save_on_start = enabled;
        self
    }

    /// Attaches a sound player for stage clips.
    #[must_use]
    pub fn with_sound_player(mut self, player: Box<dyn SoundPlayer + Send>) -> Self {
        self.sound = Some(player);
        self
    }

    /// Flips between running and paused. Returns the new running flag.
    ///
    /// Starting fills in the countdown on first run and saves the current
    /// settings; a failed save is logged and the timer starts anyway.
    pub fn toggle(&mut self) -> bool {
        if self.state.running {
            self.pause();
        } else {
            self.start();
        }
        self.state.running
    }

    /// Applies a hotkey activation. Same as a toggle from the display.
    pub fn on_external_trigger(&mut self) -> bool {
        debug!("External trigger");
        self.toggle()
    }

    fn start(&mut self) {
        self.state.running = true;
        let stage = self.state.current_stage;
        let times = self.settings.times;
        let remaining = *self
            .state
            .seconds_remaining
            .get_or_insert_with(|| times.seconds(stage));

        if !self.save_on_start {
            debug!("Stored settings are invalid, not overwriting them");
        } else if let Err(e) = self.store.save(&self.settings) {
            warn!("Could not save settings: {} ({})", e, e.suggestion());
        }

        info!("Timer started: {} with {} left", stage, format_clock(remaining));
        self.emit(EngineEvent::RunStateChanged {
            running: true,
            label: run_label(true),
        });
    }

    fn pause(&mut self) {
        self.state.running = false;
        info!(
            "Timer paused: {} with {} left",
            self.state.current_stage,
            format_clock(self.state.seconds_remaining.unwrap_or(0))
        );
        self.emit(EngineEvent::RunStateChanged {
            running: false,
            label: run_label(false),
        });
    }

    /// Counts down one second.
    ///
    /// A tick that arrives while paused changes nothing. When the countdown
    /// reaches zero the next stage begins before the display sees `00:00`.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.running {
            trace!("Tick ignored while paused");
            return TickOutcome::Ignored;
        }

        let stage = self.state.current_stage;
        let current = self
            .state
            .seconds_remaining
            .unwrap_or_else(|| self.settings.times.seconds(stage));
        let remaining = current.saturating_sub(1);
        self.state.seconds_remaining = Some(remaining);

        if remaining == 0 {
            self.advance_stage();
            self.emit(EngineEvent::TimeUpdated {
                text: format_clock(0),
            });
            TickOutcome::StageAdvanced
        } else {
            self.emit(EngineEvent::TimeUpdated {
                text: format_clock(remaining),
            });
            TickOutcome::Counted
        }
    }

    /// Moves to the next stage and resets the countdown to its full length.
    ///
    /// Work is followed by a short break, or a long break when the completed
    /// work count is a multiple of four; any break is followed by work. The
    /// running flag is left as it is.
    pub fn advance_stage(&mut self) -> Stage {
        let next = match self.state.current_stage {
            Stage::Work => {
                self.state.stage_count += 1;
                break_after(self.state.stage_count)
            }
            Stage::ShortBreak | Stage::LongBreak => Stage::Work,
        };

        let duration = self.settings.times.seconds(next);
        self.state.current_stage = next;
        self.state.seconds_remaining = Some(duration);

        info!(
            "Stage changed to {} ({} work stages completed)",
            next, self.state.stage_count
        );

        self.play_clip(next);
        self.emit(EngineEvent::StageChanged {
            stage: next,
            label: next.label().to_string(),
            duration_seconds: duration,
        });
        next
    }

    /// Replaces the stage durations.
    ///
    /// The running countdown keeps its value; new durations apply from the
    /// next stage (or first start). They reach disk on the next start or
    /// `save_settings`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDuration` if any duration is zero; the
    /// current durations are kept.
    pub fn update_times(&mut self, times: StageTimes) -> Result<(), ConfigError> {
        times.validate()?;
        debug!(
            "Durations updated: work={} short_break={} long_break={}",
            times.work, times.short_break, times.long_break
        );
        self.settings.times = times;
        Ok(())
    }

    /// Changes the duration of a single stage. Same rules as `update_times`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDuration` if `minutes` is zero.
    pub fn set_stage_minutes(&mut self, stage: Stage, minutes: u32) -> Result<(), ConfigError> {
        self.update_times(self.settings.times.with_minutes(stage, minutes))
    }

    /// Writes the current settings through the store.
    ///
    /// This is an explicit save, so it also replaces invalid stored settings
    /// and re-enables save-on-start.
    ///
    /// # Errors
    ///
    /// Returns the store's error; in-memory settings are unaffected.
    pub fn save_settings(&mut self) -> Result<(), ConfigError> {
        self.store.save(&self.settings)?;
        self.save_on_start = true;
        Ok(())
    }

    fn play_clip(&self, stage: Stage) {
        let Some(player) = &self.sound else {
            return;
        };
        let clip = self.settings.sounds.clip(stage);
        match player.play(clip) {
            Ok(()) => {}
            Err(e) if e.is_file_error() => {
                warn!("Skipping {} sound: {} ({})", stage, e, e.suggestion());
            }
            Err(e) => error!("Sound playback failed: {}", e),
        }
    }

    fn emit(&self, event: EngineEvent) {
        if self.event_tx.send(event).is_err() {
            trace!("Display receiver dropped, event discarded");
        }
    }

    /// Returns a reference to the current state.
    pub fn state(&self) -> &StageState {
        &self.state
    }

    /// Returns the in-memory settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn current_stage(&self) -> Stage {
        self.state.current_stage
    }

    pub fn stage_count(&self) -> u32 {
        self.state.stage_count
    }

    pub fn seconds_remaining(&self) -> Option<u32> {
        self.state.seconds_remaining
    }
}

impl std::fmt::Debug for StageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageEngine")
            .field("state", &self.state)
            .field("settings", &self.settings)
            .field("sound", &self.sound.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
