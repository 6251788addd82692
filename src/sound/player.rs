//! Sound player implementation using rodio.
//!
//! The rodio output stream is not `Send`, so it lives on a dedicated audio
//! thread. `RodioSoundPlayer` only holds the sending half of a channel and can
//! be moved into the engine freely; `play` hands the clip path over and
//! returns immediately.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{bounded, unbounded, Sender};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, error, warn};

use super::error::SoundError;

/// A sound player that uses rodio for audio playback.
pub struct RodioSoundPlayer {
    /// Clip paths queued for the audio thread.
    clips: Sender<PathBuf>,
}

impl RodioSoundPlayer {
    /// Creates a new sound player and its audio thread.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available, or `SoundError::StreamError` if the audio thread
    /// cannot be spawned.
    pub fn new() -> Result<Self, SoundError> {
        let (clip_tx, clip_rx) = unbounded::<PathBuf>();
        let (ready_tx, ready_rx) = bounded::<Result<(), SoundError>>(1);

        thread::Builder::new()
            .name("audio".to_string())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => {
                        let _ = ready_tx.send(Ok(()));
                        pair
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(SoundError::DeviceNotAvailable(e.to_string())));
                        return;
                    }
                };
                debug!("Audio output stream initialized");

                // Ends when the player (the only sender) is dropped.
                for clip in clip_rx {
                    if let Err(e) = play_file(&handle, &clip) {
                        warn!("Failed to play '{}': {}", clip.display(), e);
                    }
                }
                debug!("Audio thread stopped");
            })
            .map_err(|e| SoundError::StreamError(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))??;

        Ok(Self { clips: clip_tx })
    }

    /// Queues `clip` for playback.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::FileNotFound` if the clip does not exist, or
    /// `SoundError::PlaybackError` if the audio thread has stopped. Decode
    /// failures happen on the audio thread and are logged there.
    pub fn play(&self, clip: &Path) -> Result<(), SoundError> {
        if !clip.is_file() {
            return Err(SoundError::FileNotFound(clip.display().to_string()));
        }

        self.clips
            .send(clip.to_path_buf())
            .map_err(|_| SoundError::PlaybackError("audio thread has stopped".to_string()))
    }
}

impl std::fmt::Debug for RodioSoundPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioSoundPlayer")
            .field("queued", &self.clips.len())
            .finish_non_exhaustive()
    }
}

/// Decodes `path` and starts playing it without waiting for it to finish.
fn play_file(handle: &OutputStreamHandle, path: &Path) -> Result<(), SoundError> {
    let file = File::open(path)
        .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    let decoder =
        Decoder::new(BufReader::new(file)).map_err(|e| SoundError::DecodeError(e.to_string()))?;

    let sink = Sink::try_new(handle).map_err(|e| SoundError::StreamError(e.to_string()))?;
    sink.append(decoder);
    sink.detach();

    debug!("Sound playback started: {}", path.display());
    Ok(())
}

/// Creates a sound player, returning None if audio is unavailable.
///
/// A missing device is expected on headless machines and only warned about;
/// anything else is logged as an error. Either way the session runs silent.
#[must_use]
pub fn try_create_player() -> Option<RodioSoundPlayer> {
    match RodioSoundPlayer::new() {
        Ok(player) => Some(player),
        Err(e) if e.is_device_error() => {
            warn!("Audio not available, sound disabled: {} ({})", e, e.suggestion());
            None
        }
        Err(e) => {
            error!("Could not start audio playback: {} ({})", e, e.suggestion());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests skip themselves in environments without audio hardware
    // (e.g., CI containers).

    #[test]
    fn test_missing_clip_is_file_error() {
        let player = match RodioSoundPlayer::new() {
            Ok(p) => p,
            Err(_) => return,
        };

        let err = player
            .play(Path::new("/nonexistent/path/to/sound.wav"))
            .unwrap_err();
        assert!(err.is_file_error());
    }

    #[test]
    fn test_try_create_player_does_not_panic() {
        let _ = try_create_player();
    }

    #[test]
    fn test_debug_impl() {
        let player = match RodioSoundPlayer::new() {
            Ok(p) => p,
            Err(_) => return,
        };

        let debug_str = format!("{:?}", player);
        assert!(debug_str.contains("RodioSoundPlayer"));
        assert!(debug_str.contains("queued"));
    }
}
