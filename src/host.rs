//! Capabilities the store needs from the windowing host
//!
//! The store never talks to a toolkit directly. A window, the display layout
//! and the user-data directory all come in through these traits, so the X11
//! adapter and the test doubles plug in the same way.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::constants::paths;
use crate::geometry::Rect;

/// Window notifications the store listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowEvent {
    Resize,
    Move,
    /// Window is about to close; bounds are still reliable
    Close,
    /// Window is gone
    Closed,
}

impl WindowEvent {
    pub const ALL: [WindowEvent; 4] = [
        WindowEvent::Resize,
        WindowEvent::Move,
        WindowEvent::Close,
        WindowEvent::Closed,
    ];
}

/// Identity of one subscription, handed back by `WindowHandle::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

pub type EventHandler = Arc<dyn Fn(WindowEvent) + Send + Sync>;

/// A live window the store can inspect, restore and listen to.
///
/// Implementations must not hold internal locks while invoking handlers: a
/// handler may call straight back into `unsubscribe` or any query method.
pub trait WindowHandle: Send + Sync {
    /// Outer bounds in root/screen coordinates
    fn bounds(&self) -> Result<Rect>;
    fn is_maximized(&self) -> Result<bool>;
    fn is_minimized(&self) -> Result<bool>;
    fn is_full_screen(&self) -> Result<bool>;

    fn maximize(&self) -> Result<()>;
    fn set_full_screen(&self, full_screen: bool) -> Result<()>;

    fn subscribe(&self, event: WindowEvent, handler: EventHandler) -> ListenerId;
    fn unsubscribe(&self, event: WindowEvent, id: ListenerId);
}

/// Display layout queries
pub trait DisplayQuery: Send + Sync {
    /// Bounds of the display that best contains `rect`
    fn display_matching(&self, rect: Rect) -> Result<Rect>;
}

/// Per-user writable directory of the host application
pub trait AppDirs: Send + Sync {
    fn user_data_dir(&self) -> PathBuf;
}

/// `AppDirs` backed by the platform config directory (`~/.config/<app>` on Linux)
#[derive(Debug, Clone)]
pub struct DirsAppDirs {
    app_name: String,
}

impl DirsAppDirs {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Default for DirsAppDirs {
    fn default() -> Self {
        Self::new(paths::APP_DIR)
    }
}

impl AppDirs for DirsAppDirs {
    fn user_data_dir(&self) -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(&self.app_name);
        path
    }
}
