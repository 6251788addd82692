//! Terminal display for the timer session.
//!
//! Renders [`EngineEvent`]s as a one-line title: `🍅 MM:SS` during
//! work, `☕ MM:SS` during breaks and `⏸` while paused. The countdown line is
//! redrawn in place; stage changes get their own line.

use std::io::{self, Write};
use std::path::Path;

use tokio::sync::mpsc;

use crate::daemon::{run_label, EngineEvent};
use crate::types::{format_clock, Settings, Stage};

const WORK_ICON: &str = "🍅";
const BREAK_ICON: &str = "☕";
const PAUSED_ICON: &str = "⏸";

/// One piece of output produced for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Replaces the current countdown line
    Clock(String),
    /// Printed on its own line
    Notice(String),
}

// ============================================================================
// Display
// ============================================================================

/// Display collaborator for terminals.
#[derive(Debug)]
pub struct Display {
    stage: Stage,
    running: bool,
    clock: String,
}

impl Display {
    /// Creates a display showing the initial, paused work stage.
    pub fn new(settings: &Settings) -> Self {
        Self {
            stage: Stage::Work,
            running: false,
            clock: format_clock(settings.times.seconds(Stage::Work)),
        }
    }

    /// Title for the current state.
    pub fn title(&self) -> String {
        if !self.running {
            return format!("{} {}", PAUSED_ICON, self.clock);
        }
        let icon = if self.stage.is_break() {
            BREAK_ICON
        } else {
            WORK_ICON
        };
        format!("{} {}", icon, self.clock)
    }

    /// Updates the display state and returns what to print.
    pub fn render(&mut self, event: &EngineEvent) -> Vec<Frame> {
        match event {
            EngineEvent::TimeUpdated { text } => {
                // The tick that ends a stage reports `00:00` after the
                // StageChanged for the next stage, so the new stage's icon is
                // shown with 00:00 for one second before its countdown starts.
                self.clock.clone_from(text);
                vec![Frame::Clock(self.title())]
            }
            EngineEvent::StageChanged {
                stage,
                label,
                duration_seconds,
            } => {
                self.stage = *stage;
                self.clock = format_clock(*duration_seconds);
                vec![
                    Frame::Notice(format!("{} ({} min)", label, duration_seconds / 60)),
                    Frame::Clock(self.title()),
                ]
            }
            EngineEvent::RunStateChanged { running, label } => {
                self.running = *running;
                vec![Frame::Clock(format!("{}  [{}]", self.title(), label))]
            }
        }
    }

    /// Prints events until the engine drops its sender.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<EngineEvent>) {
        while let Some(event) = events.recv().await {
            for frame in self.render(&event) {
                Self::print_frame(&frame);
            }
        }
        println!();
    }

    fn print_frame(frame: &Frame) {
        let mut stdout = io::stdout().lock();
        // Write errors (closed stdout) only cost us the display.
        let _ = match frame {
            Frame::Clock(line) => write!(stdout, "\r\x1b[2K{}", line),
            Frame::Notice(line) => write!(stdout, "\r\x1b[2K{}\n", line),
        };
        let _ = stdout.flush();
    }

    /// Shows the session banner.
    pub fn show_welcome(&self, hotkey: Option<&str>) {
        println!("Pomodoro timer");
        println!("─────────────────────────────");
        match hotkey {
            Some(hotkey) => println!("Hotkey: {} (start/pause)", hotkey),
            None => println!("Hotkey: disabled"),
        }
        println!("Enter or 't' to start/pause, 'q' to quit");
        println!("'work N', 'short N' or 'long N' sets a duration in minutes");
        print!("{}  [{}]", self.title(), run_label(self.running));
        let _ = io::stdout().flush();
    }

    /// Shows a hint for unrecognized input.
    pub fn show_input_help(input: &str) {
        eprintln!(
            "\nunknown input `{}`: Enter or 't' toggles, 'q' quits, 'work|short|long N' sets minutes",
            input
        );
    }

    /// Confirms a duration change typed during the session.
    pub fn show_duration_set(stage: Stage, minutes: u32) {
        println!(
            "\n* {} set to {} min (saved on next start)",
            stage.label(),
            minutes
        );
    }

    /// Shows the effective settings.
    pub fn show_settings(settings: &Settings, path: &Path) {
        println!("Settings ({})", path.display());
        println!("─────────────────────────────");
        println!("hotkey: {}", settings.hotkey);
        for stage in Stage::ALL {
            println!(
                "{:<12} {:>3} min  {}",
                stage.label(),
                settings.times.minutes(stage),
                settings.sounds.clip(stage).display()
            );
        }
    }

    /// Shows a success message after saving settings.
    pub fn show_saved(path: &Path) {
        println!("* Settings saved to {}", path.display());
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("error: {}", message);
    }
}

// ============================================================================
// Tests
// ============================================================================
