//! Settings persistence.
//!
//! `JsonConfigStore` keeps the settings in a single JSON file and replaces it
//! atomically on save, so a crash mid-write never leaves a torn file behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, error, warn};

use super::error::ConfigError;
use crate::types::Settings;

/// Directory name under the platform config directory.
const APP_DIR: &str = "pomodoro-hotkey";

/// Settings file name.
const SETTINGS_FILE: &str = "settings.json";

/// Indentation used when writing the settings file.
const INDENT: &[u8] = b"    ";

/// Returns the default settings path (`<config_dir>/pomodoro-hotkey/settings.json`).
///
/// Falls back to `settings.json` in the working directory when the platform
/// has no config directory.
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
}

/// Durable key/value settings storage.
pub trait ConfigStore {
    /// Loads and validates the stored settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are missing, malformed or invalid.
    fn load(&self) -> Result<Settings, ConfigError>;

    /// Persists `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be written.
    fn save(&self, settings: &Settings) -> Result<(), ConfigError>;
}

impl<T: ConfigStore + ?Sized> ConfigStore for Arc<T> {
    fn load(&self) -> Result<Settings, ConfigError> {
        (**self).load()
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        (**self).save(settings)
    }
}

/// Where a session's settings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsOrigin {
    /// Read from the store
    Stored,
    /// Defaults, written to the store because it was missing or malformed
    Defaults,
    /// Defaults for this session only; the stored settings are incomplete
    /// and must not be overwritten
    Fallback,
}

impl SettingsOrigin {
    /// Returns true if the session may write its settings back.
    #[must_use]
    pub fn may_overwrite(&self) -> bool {
        !matches!(self, Self::Fallback)
    }
}

/// Loads settings, falling back to defaults, and reports where they came from.
///
/// A missing or malformed file is replaced by the defaults on disk. An
/// incomplete file (missing stage key, zero duration) is reported and left
/// untouched; the defaults are used for this session only.
pub fn load_settings<S: ConfigStore + ?Sized>(store: &S) -> (Settings, SettingsOrigin) {
    match store.load() {
        Ok(settings) => (settings, SettingsOrigin::Stored),
        Err(e) if e.is_recoverable_with_defaults() => {
            warn!("{}; using defaults", e);
            let defaults = Settings::default();
            if let Err(e) = store.save(&defaults) {
                warn!("Could not write default settings: {}", e);
            }
            (defaults, SettingsOrigin::Defaults)
        }
        Err(e) => {
            error!("Invalid settings: {} ({})", e, e.suggestion());
            (Settings::default(), SettingsOrigin::Fallback)
        }
    }
}

/// Loads settings, falling back to defaults. See [`load_settings`].
pub fn load_or_default<S: ConfigStore + ?Sized>(store: &S) -> Settings {
    load_settings(store).0
}

// ============================================================================
// JsonConfigStore
// ============================================================================

/// Settings stored as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    /// Creates a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the default location.
    pub fn at_default_path() -> Self {
        Self::new(default_settings_path())
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode(settings: &Settings) -> Result<Vec<u8>, ConfigError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        settings
            .serialize(&mut serializer)
            .map_err(ConfigError::Encode)?;
        buf.push(b'\n');
        Ok(buf)
    }

    fn write_err(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl ConfigStore for JsonConfigStore {
    fn load(&self) -> Result<Settings, ConfigError> {
        let text = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        let settings = Settings::from_json(&text)?;
        debug!("Loaded settings from {}", self.path.display());
        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let bytes = Self::encode(settings)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| self.write_err(e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.write_err(e))?;
        tmp.write_all(&bytes).map_err(|e| self.write_err(e))?;
        tmp.as_file().sync_all().map_err(|e| self.write_err(e))?;
        tmp.persist(&self.path).map_err(|e| self.write_err(e.error))?;

        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

// ============================================================================
// MockConfigStore
// ============================================================================

/// In-memory store for testing.
#[derive(Debug, Default)]
pub struct MockConfigStore {
    stored: Mutex<Option<Settings>>,
    save_calls: AtomicUsize,
    should_fail_save: AtomicBool,
}

impl MockConfigStore {
    /// Creates an empty store; `load` reports a missing file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `settings`.
    #[must_use]
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            stored: Mutex::new(Some(settings)),
            ..Self::default()
        }
    }

    pub fn set_should_fail_save(&self, should_fail: bool) {
        self.should_fail_save.store(should_fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Returns the last saved settings.
    #[must_use]
    pub fn stored(&self) -> Option<Settings> {
        self.stored.lock().ok().and_then(|guard| guard.clone())
    }
}

impl ConfigStore for MockConfigStore {
    fn load(&self) -> Result<Settings, ConfigError> {
        self.stored()
            .ok_or_else(|| ConfigError::Read {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no settings stored"),
            })
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        if self.should_fail_save.load(Ordering::SeqCst) {
            return Err(ConfigError::Write {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "mock failure"),
            });
        }
        if let Ok(mut guard) = self.stored.lock() {
            *guard = Some(settings.clone());
        }
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
