//! Timing core for the Pomodoro timer.
//!
//! - `engine`: stage state machine (toggle, tick, stage transitions)
//! - `scheduler`: one-second tick source that can be armed and disarmed
//! - `runner`: single-writer loop that serializes commands and ticks

pub mod engine;
pub mod runner;
pub mod scheduler;

pub use engine::{break_after, run_label, EngineEvent, StageEngine, TickOutcome};
pub use runner::{command_channel, CommandSender, EngineCommand, EngineRunner, TriggerSource};
pub use scheduler::TickScheduler;
