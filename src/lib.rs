//! Persist and restore a desktop window's geometry across restarts.
//!
//! A [`WindowStateStore`] loads the last saved position, size and
//! maximize/fullscreen flags from a JSON file, discards them if the display
//! they were saved on is gone, and tracks a live window so the file is
//! refreshed when the window closes. The windowing host is reached only
//! through the traits in [`host`]; [`x11`] implements them for X11.

#![forbid(unsafe_code)]

pub mod config;
pub mod constants;
pub mod debounce;
pub mod error;
pub mod geometry;
pub mod host;
pub mod record;
pub mod storage;
pub mod store;
pub mod x11;

#[cfg(test)]
pub(crate) mod testing;

pub use config::StoreConfig;
pub use error::StateError;
pub use geometry::Rect;
pub use host::{AppDirs, DirsAppDirs, DisplayQuery, EventHandler, ListenerId, WindowEvent, WindowHandle};
pub use record::WindowStateRecord;
pub use storage::{JsonFileStorage, StateStorage};
pub use store::{StoreBuilder, WindowStateStore};
