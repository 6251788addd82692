//! Sound playback system for the Pomodoro timer.
//!
//! Each stage has a clip path in the settings. When a stage begins, the
//! engine asks the [`SoundPlayer`] to play that clip and moves on:
//!
//! - Playback is fire-and-forget; the engine never waits for audio
//! - A missing or undecodable clip is logged and skipped
//! - No audio device means no player at all, not a failure
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   PathBuf   ┌──────────────────┐
//! │ RodioSoundPlayer │ ──────────▶ │   audio thread   │
//! │  (engine side)   │  crossbeam  │ (owns the rodio  │
//! └──────────────────┘             │  output stream)  │
//!                                  └──────────────────┘
//! ```

mod error;
mod player;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub use error::SoundError;
pub use player::{try_create_player, RodioSoundPlayer};

/// Trait for sound playback implementations.
///
/// This trait abstracts the sound playback functionality, allowing for
/// different implementations (e.g., rodio-based, mock for testing).
pub trait SoundPlayer {
    /// Plays the clip at `clip` in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the clip cannot be queued for playback.
    fn play(&self, clip: &Path) -> Result<(), SoundError>;
}

impl SoundPlayer for RodioSoundPlayer {
    fn play(&self, clip: &Path) -> Result<(), SoundError> {
        RodioSoundPlayer::play(self, clip)
    }
}

impl<T: SoundPlayer + ?Sized> SoundPlayer for Arc<T> {
    fn play(&self, clip: &Path) -> Result<(), SoundError> {
        (**self).play(clip)
    }
}

/// Mock sound player for testing.
#[derive(Debug, Default)]
pub struct MockSoundPlayer {
    play_calls: Mutex<Vec<PathBuf>>,
    should_fail: AtomicBool,
}

impl MockSoundPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.get_play_calls().len()
    }

    #[must_use]
    pub fn get_play_calls(&self) -> Vec<PathBuf> {
        self.play_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.play_calls.lock() {
            calls.clear();
        }
    }
}

impl SoundPlayer for MockSoundPlayer {
    fn play(&self, clip: &Path) -> Result<(), SoundError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::FileNotFound(clip.display().to_string()));
        }
        if let Ok(mut calls) = self.play_calls.lock() {
            calls.push(clip.to_path_buf());
        }
        Ok(())
    }
}
