//! Application-wide constants
//!
//! Defaults for the window state store and the X11 atom names the adapter
//! interns, kept in one place so the store, the config layer and the CLI agree.

/// Defaults applied when the caller leaves an option unset
pub mod defaults {
    /// File name of the persisted state inside the state directory
    pub const FILE_NAME: &str = "window-state.json";

    /// Fallback window width when no valid saved state exists
    pub const WIDTH: u32 = 800;

    /// Fallback window height when no valid saved state exists
    pub const HEIGHT: u32 = 600;

    /// Quiet period after the last move/resize before geometry is captured
    pub const DEBOUNCE_MS: u64 = 100;
}

/// Bounds enforced on configuration values
pub mod validation {
    /// Largest accepted default width/height
    pub const MAX_DIMENSION: u32 = 16384;

    /// Longest accepted debounce delay
    pub const MAX_DEBOUNCE_MS: u64 = 10_000;
}

/// Filesystem locations
pub mod paths {
    /// Directory name under the user's config dir when no app name is given
    pub const APP_DIR: &str = "window-state";

    /// Extension of the scratch file used for atomic writes
    pub const TMP_EXTENSION: &str = "tmp";
}

/// Environment variable names read by `StoreConfig::apply_env_overrides`
pub mod env {
    pub const FILE: &str = "WINDOW_STATE_FILE";
    pub const PATH: &str = "WINDOW_STATE_PATH";
    pub const MAXIMIZE: &str = "WINDOW_STATE_MAXIMIZE";
    pub const FULL_SCREEN: &str = "WINDOW_STATE_FULL_SCREEN";
    pub const DEFAULT_WIDTH: &str = "WINDOW_STATE_DEFAULT_WIDTH";
    pub const DEFAULT_HEIGHT: &str = "WINDOW_STATE_DEFAULT_HEIGHT";
    pub const DEBOUNCE_MS: &str = "WINDOW_STATE_DEBOUNCE_MS";
}

/// X11 protocol constants
pub mod x11 {
    /// EWMH `_NET_WM_STATE` action: remove the property
    pub const NET_WM_STATE_REMOVE: u32 = 0;

    /// EWMH `_NET_WM_STATE` action: add the property
    pub const NET_WM_STATE_ADD: u32 = 1;

    /// Source indication for client messages (1 = normal application)
    pub const SOURCE_APPLICATION: u32 = 1;

    /// Max number of atoms read from `_NET_WM_STATE`
    pub const WM_STATE_MAX_LEN: u32 = 1024;
}
