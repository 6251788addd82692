//! Single-writer loop for the stage engine.
//!
//! Every mutation of the engine happens on the task running
//! [`EngineRunner::run`]. Other contexts (hotkey thread, stdin reader,
//! display) only post [`EngineCommand`]s to its channel. Commands are applied
//! in the order they were posted, interleaved with ticks, never concurrently
//! with them.

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::engine::{StageEngine, TickOutcome};
use super::scheduler::TickScheduler;
use crate::types::{Stage, StageTimes};

/// Where a toggle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// Start/pause button in the display
    Display,
    /// Global hotkey
    Hotkey,
}

/// Messages accepted by the engine runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Start or pause the timer
    Toggle(TriggerSource),
    /// Replace stage durations and save them
    SetTimes(StageTimes),
    /// Change one stage's duration; saved on the next start
    SetStageMinutes(Stage, u32),
    /// Stop the runner
    Shutdown,
}

/// Sending half of the engine's command channel.
pub type CommandSender = mpsc::UnboundedSender<EngineCommand>;

/// Creates the engine's command channel.
pub fn command_channel() -> (CommandSender, mpsc::UnboundedReceiver<EngineCommand>) {
    mpsc::unbounded_channel()
}

/// Owns the engine and drives it from commands and ticks.
#[derive(Debug)]
pub struct EngineRunner {
    engine: StageEngine,
    commands: mpsc::UnboundedReceiver<EngineCommand>,
    scheduler: TickScheduler,
}

impl EngineRunner {
    pub fn new(engine: StageEngine, commands: mpsc::UnboundedReceiver<EngineCommand>) -> Self {
        Self {
            engine,
            commands,
            scheduler: TickScheduler::new(),
        }
    }

    /// Runs until `Shutdown` is received or every sender is dropped, then
    /// returns the engine.
    pub async fn run(mut self) -> StageEngine {
        if self.engine.is_running() {
            self.scheduler.arm();
        }

        loop {
            tokio::select! {
                // Commands already queued win over a tick that is due at the
                // same time.
                biased;

                command = self.commands.recv() => match command {
                    Some(EngineCommand::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                () = self.scheduler.tick() => self.on_tick(),
            }
        }

        self.scheduler.disarm();
        debug!("Engine runner stopped");
        self.engine
    }

    fn apply(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Toggle(source) => {
                let running = match source {
                    TriggerSource::Display => self.engine.toggle(),
                    TriggerSource::Hotkey => self.engine.on_external_trigger(),
                };
                if running {
                    self.scheduler.arm();
                } else {
                    self.scheduler.disarm();
                }
                trace!("Toggle from {:?}, ticks armed: {}", source, self.scheduler.is_armed());
            }
            EngineCommand::SetTimes(times) => {
                if let Err(e) = self.engine.update_times(times) {
                    warn!("Rejected durations: {}", e);
                } else if let Err(e) = self.engine.save_settings() {
                    warn!("Could not save settings: {}", e);
                }
            }
            EngineCommand::SetStageMinutes(stage, minutes) => {
                if let Err(e) = self.engine.set_stage_minutes(stage, minutes) {
                    warn!("Rejected duration: {}", e);
                }
            }
            EngineCommand::Shutdown => {}
        }
    }

    fn on_tick(&mut self) {
        match self.engine.tick() {
            // The next stage gets a fresh one-second cadence.
            TickOutcome::StageAdvanced => self.scheduler.arm(),
            TickOutcome::Counted => {}
            TickOutcome::Ignored => self.scheduler.disarm(),
        }
    }
}
