//! CLI module for the Pomodoro hotkey timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Terminal rendering of engine events
//! - `input`: Stdin reader posting user intents to the engine

pub mod commands;
pub mod display;
pub mod input;

pub use commands::{Cli, Commands, ConfigAction, RunArgs, SetArgs};
pub use display::{Display, Frame};
pub use input::{parse_input, spawn_input_reader};
