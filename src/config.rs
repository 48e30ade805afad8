//! Store configuration
//!
//! Mirrors the option object of the store: every field is optional and falls
//! back to the defaults in `constants::defaults`. Environment variables can
//! override whatever the caller passed, then `validate_and_clamp` repairs
//! values that would make the store misbehave.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::constants::{defaults, env as env_keys, validation};
use crate::host::AppDirs;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// File name of the state file
    pub file: String,

    /// Directory holding the state file (host user-data dir when unset)
    pub path: Option<PathBuf>,

    /// Re-maximize on `manage` when the saved state was maximized
    pub maximize: bool,

    /// Re-enter fullscreen on `manage` when the saved state was fullscreen
    pub full_screen: bool,

    pub default_width: u32,
    pub default_height: u32,

    /// Quiet period after move/resize before geometry is captured
    pub debounce_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file: defaults::FILE_NAME.to_string(),
            path: None,
            maximize: true,
            full_screen: true,
            default_width: defaults::WIDTH,
            default_height: defaults::HEIGHT,
            debounce_ms: defaults::DEBOUNCE_MS,
        }
    }
}

impl StoreConfig {
    /// Full path of the state file: `path/file`, with the host's user-data
    /// directory standing in for an unset `path`
    pub fn state_file(&self, app_dirs: &dyn AppDirs) -> PathBuf {
        let dir = self
            .path
            .clone()
            .unwrap_or_else(|| app_dirs.user_data_dir());
        dir.join(&self.file)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    fn parse_override<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
        let raw = lookup(key)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(key = key, value = %raw, "Ignoring unparseable override");
                None
            }
        }
    }

    /// Apply `WINDOW_STATE_*` environment overrides on top of the current values
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from any key/value source using the `WINDOW_STATE_*` names
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(file) = lookup(env_keys::FILE).filter(|f| !f.trim().is_empty()) {
            self.file = file;
        }
        if let Some(path) = lookup(env_keys::PATH).filter(|p| !p.trim().is_empty()) {
            self.path = Some(PathBuf::from(path));
        }
        if let Some(maximize) = Self::parse_override(&lookup, env_keys::MAXIMIZE) {
            self.maximize = maximize;
        }
        if let Some(full_screen) = Self::parse_override(&lookup, env_keys::FULL_SCREEN) {
            self.full_screen = full_screen;
        }
        if let Some(width) = Self::parse_override(&lookup, env_keys::DEFAULT_WIDTH) {
            self.default_width = width;
        }
        if let Some(height) = Self::parse_override(&lookup, env_keys::DEFAULT_HEIGHT) {
            self.default_height = height;
        }
        if let Some(debounce_ms) = Self::parse_override(&lookup, env_keys::DEBOUNCE_MS) {
            self.debounce_ms = debounce_ms;
        }
    }

    /// Repair values that would make the store misbehave
    pub fn validate_and_clamp(&mut self) {
        use validation::*;

        if self.file.trim().is_empty() {
            warn!(using = defaults::FILE_NAME, "Empty state file name, using default");
            self.file = defaults::FILE_NAME.to_string();
        }

        // A zero default size means "not configured"
        if self.default_width == 0 {
            self.default_width = defaults::WIDTH;
        } else if self.default_width > MAX_DIMENSION {
            warn!(default_width = self.default_width, max = MAX_DIMENSION, "default_width exceeds maximum, clamping");
            self.default_width = MAX_DIMENSION;
        }

        if self.default_height == 0 {
            self.default_height = defaults::HEIGHT;
        } else if self.default_height > MAX_DIMENSION {
            warn!(default_height = self.default_height, max = MAX_DIMENSION, "default_height exceeds maximum, clamping");
            self.default_height = MAX_DIMENSION;
        }

        if self.debounce_ms > MAX_DEBOUNCE_MS {
            warn!(debounce_ms = self.debounce_ms, max = MAX_DEBOUNCE_MS, "debounce_ms exceeds maximum, clamping");
            self.debounce_ms = MAX_DEBOUNCE_MS;
        }
    }
}
