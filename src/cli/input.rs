//! Stdin commands for the timer session.
//!
//! The reader thread forwards user intents to the engine runner; it never
//! touches timer state itself.

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use tracing::debug;

use super::display::Display;
use crate::daemon::{CommandSender, EngineCommand, TriggerSource};
use crate::types::Stage;

/// Maps one line of input to an engine command.
///
/// An empty line (Enter), `t` or `toggle` toggles; `q`, `quit` or `exit`
/// shuts down. `work N`, `short N` and `long N` set a stage's duration to a
/// positive number of minutes. Anything else is not a command.
pub fn parse_input(line: &str) -> Option<EngineCommand> {
    let line = line.trim().to_ascii_lowercase();
    let mut words = line.split_whitespace();
    let command = match (words.next(), words.next()) {
        (None, _) => return Some(EngineCommand::Toggle(TriggerSource::Display)),
        (Some(command), None) => command,
        (Some(stage), Some(minutes)) => return parse_duration(stage, minutes, words.next()),
    };

    match command {
        "t" | "toggle" => Some(EngineCommand::Toggle(TriggerSource::Display)),
        "q" | "quit" | "exit" => Some(EngineCommand::Shutdown),
        _ => None,
    }
}

fn parse_duration(stage: &str, minutes: &str, rest: Option<&str>) -> Option<EngineCommand> {
    if rest.is_some() {
        return None;
    }
    let stage = match stage {
        "work" | "w" => Stage::Work,
        "short" | "short_break" | "s" => Stage::ShortBreak,
        "long" | "long_break" | "l" => Stage::LongBreak,
        _ => return None,
    };
    match minutes.parse::<u32>() {
        Ok(minutes) if minutes > 0 => Some(EngineCommand::SetStageMinutes(stage, minutes)),
        _ => None,
    }
}

/// Starts the stdin reader thread.
///
/// The thread ends at end of input or once the engine is gone. End of input
/// leaves the session running so the hotkey keeps working.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn_input_reader(commands: CommandSender) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || read_commands(io::stdin().lock(), &commands))
}

fn read_commands(input: impl BufRead, commands: &CommandSender) {
    for line in input.lines() {
        let Ok(line) = line else { break };
        match parse_input(&line) {
            Some(command) => {
                if let EngineCommand::SetStageMinutes(stage, minutes) = command {
                    Display::show_duration_set(stage, minutes);
                }
                if commands.send(command).is_err() {
                    break;
                }
            }
            None => Display::show_input_help(line.trim()),
        }
    }
    debug!("Stdin reader finished");
}
