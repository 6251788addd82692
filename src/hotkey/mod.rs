//! Global hotkey support.
//!
//! The hotkey listener runs on its own threads and only ever posts
//! [`EngineCommand::Toggle`](crate::daemon::EngineCommand::Toggle) to the
//! engine runner. Failure to register the hotkey is not fatal; the timer
//! stays usable from the terminal.

mod combo;
mod error;
mod listener;

pub use combo::{ComboMatcher, HotkeyCombo, KeyEvent, Modifier};
pub use error::HotkeyError;
pub use listener::{HookMessage, HotkeyListener, POLL_INTERVAL};
