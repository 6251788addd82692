//! Settings storage for the Pomodoro timer.
//!
//! Settings live in a JSON file:
//!
//! ```text
//! {
//!     "hotkey": "ctrl+shift+p",
//!     "sounds": { "work": "...", "short_break": "...", "long_break": "..." },
//!     "times":  { "work": 25, "short_break": 5, "long_break": 15 }
//! }
//! ```
//!
//! The engine only sees the [`ConfigStore`] trait; [`JsonConfigStore`] is the
//! on-disk implementation and [`MockConfigStore`] the in-memory one used by
//! tests.

mod error;
mod store;

pub use error::ConfigError;
pub use store::{
    default_settings_path, load_or_default, load_settings, ConfigStore, JsonConfigStore,
    MockConfigStore, SettingsOrigin,
};
