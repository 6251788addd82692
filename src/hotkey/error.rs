//! Hotkey error types.

use thiserror::Error;

/// Errors that can occur while setting up the global hotkey.
///
/// All of them disable the hotkey only; the timer stays usable from the
/// display.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HotkeyError {
    /// The configured key combination could not be parsed.
    #[error("invalid hotkey `{combo}`: {reason}")]
    InvalidCombo { combo: String, reason: String },

    /// The OS refused the global keyboard hook.
    #[error("global hotkey registration failed: {0}")]
    Registration(String),

    /// The listener thread could not be started.
    #[error("failed to start hotkey thread: {0}")]
    Spawn(String),
}

impl HotkeyError {
    pub(crate) fn invalid(combo: &str, reason: impl Into<String>) -> Self {
        Self::InvalidCombo {
            combo: combo.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true if the hotkey string itself is at fault.
    #[must_use]
    pub fn is_invalid_combo(&self) -> bool {
        matches!(self, Self::InvalidCombo { .. })
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::InvalidCombo { .. } => {
                "use modifiers and one key joined by '+', e.g. \"ctrl+shift+p\""
            }
            Self::Registration(_) => {
                "grant input monitoring/accessibility permission or run under X11; \
                 the timer still works from the terminal"
            }
            Self::Spawn(_) => "restart the application",
        }
    }
}
