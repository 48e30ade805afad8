//! In-memory host doubles shared by the unit tests

use anyhow::{Result, anyhow, bail};
use parking_lot::Mutex;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::StateError;
use crate::geometry::{Rect, match_display};
use crate::host::{AppDirs, DisplayQuery, EventHandler, ListenerId, WindowEvent, WindowHandle};
use crate::storage::StateStorage;

#[derive(Debug, Clone, Default)]
pub struct WindowCalls {
    pub bounds: usize,
    pub maximize: usize,
    pub set_full_screen: Vec<bool>,
    pub subscribe: Vec<WindowEvent>,
    pub unsubscribe: Vec<(WindowEvent, ListenerId)>,
}

#[derive(Debug, Clone, Copy)]
struct Layout {
    bounds: Rect,
    maximized: bool,
    minimized: bool,
    full_screen: bool,
}

pub struct FakeWindow {
    layout: Mutex<Layout>,
    listeners: Mutex<Vec<(WindowEvent, ListenerId, EventHandler)>>,
    next_id: AtomicU64,
    broken: AtomicBool,
    calls: Mutex<WindowCalls>,
}

impl FakeWindow {
    pub fn new(bounds: Rect) -> Arc<Self> {
        Arc::new(Self {
            layout: Mutex::new(Layout {
                bounds,
                maximized: false,
                minimized: false,
                full_screen: false,
            }),
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            broken: AtomicBool::new(false),
            calls: Mutex::new(WindowCalls::default()),
        })
    }

    pub fn set_bounds(&self, bounds: Rect) {
        self.layout.lock().bounds = bounds;
    }

    pub fn set_maximized(&self, maximized: bool) {
        self.layout.lock().maximized = maximized;
    }

    pub fn set_minimized(&self, minimized: bool) {
        self.layout.lock().minimized = minimized;
    }

    /// Make every query fail, like a window whose native handle is gone
    pub fn break_queries(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> WindowCalls {
        self.calls.lock().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Deliver `event` to its subscribers the way a toolkit would
    pub fn emit(&self, event: WindowEvent) {
        let handlers: Vec<EventHandler> = self
            .listeners
            .lock()
            .iter()
            .filter(|(e, _, _)| *e == event)
            .map(|(_, _, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    fn check(&self) -> Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            bail!("window handle is no longer valid");
        }
        Ok(())
    }
}

impl WindowHandle for FakeWindow {
    fn bounds(&self) -> Result<Rect> {
        self.check()?;
        self.calls.lock().bounds += 1;
        Ok(self.layout.lock().bounds)
    }

    fn is_maximized(&self) -> Result<bool> {
        self.check()?;
        Ok(self.layout.lock().maximized)
    }

    fn is_minimized(&self) -> Result<bool> {
        self.check()?;
        Ok(self.layout.lock().minimized)
    }

    fn is_full_screen(&self) -> Result<bool> {
        self.check()?;
        Ok(self.layout.lock().full_screen)
    }

    fn maximize(&self) -> Result<()> {
        self.check()?;
        self.calls.lock().maximize += 1;
        self.layout.lock().maximized = true;
        Ok(())
    }

    fn set_full_screen(&self, full_screen: bool) -> Result<()> {
        self.check()?;
        self.calls.lock().set_full_screen.push(full_screen);
        self.layout.lock().full_screen = full_screen;
        Ok(())
    }

    fn subscribe(&self, event: WindowEvent, handler: EventHandler) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.calls.lock().subscribe.push(event);
        self.listeners.lock().push((event, id, handler));
        id
    }

    fn unsubscribe(&self, event: WindowEvent, id: ListenerId) {
        self.calls.lock().unsubscribe.push((event, id));
        self.listeners
            .lock()
            .retain(|(e, existing, _)| !(*e == event && *existing == id));
    }
}

pub struct FakeDisplays {
    displays: Vec<Rect>,
}

impl FakeDisplays {
    pub fn new(displays: Vec<Rect>) -> Arc<Self> {
        Arc::new(Self { displays })
    }
}

impl DisplayQuery for FakeDisplays {
    fn display_matching(&self, rect: Rect) -> Result<Rect> {
        match_display(&rect, &self.displays).ok_or_else(|| anyhow!("no displays attached"))
    }
}

/// Storage that keeps the "file" in memory and records every call
#[derive(Default)]
pub struct FakeStorage {
    content: Mutex<Option<Value>>,
    fail_writes: AtomicBool,
    fail_create_dir: AtomicBool,
    pub reads: Mutex<Vec<PathBuf>>,
    pub created_dirs: Mutex<Vec<PathBuf>>,
    pub writes: Mutex<Vec<(PathBuf, Value)>>,
}

impl FakeStorage {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_content(content: Value) -> Arc<Self> {
        let storage = Self::default();
        *storage.content.lock() = Some(content);
        Arc::new(storage)
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn fail_create_dir(&self) {
        self.fail_create_dir.store(true, Ordering::SeqCst);
    }

    pub fn last_write(&self) -> Option<(PathBuf, Value)> {
        self.writes.lock().last().cloned()
    }
}

impl StateStorage for FakeStorage {
    fn read_json(&self, path: &Path) -> Result<Value, StateError> {
        self.reads.lock().push(path.to_path_buf());
        self.content.lock().clone().ok_or_else(|| StateError::Read {
            path: path.to_path_buf(),
            source: io::Error::from(io::ErrorKind::NotFound),
        })
    }

    fn create_dir_all(&self, dir: &Path) -> Result<(), StateError> {
        if self.fail_create_dir.load(Ordering::SeqCst) {
            return Err(StateError::CreateDir {
                path: dir.to_path_buf(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }
        self.created_dirs.lock().push(dir.to_path_buf());
        Ok(())
    }

    fn write_json(&self, path: &Path, value: &Value) -> Result<(), StateError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StateError::Write {
                path: path.to_path_buf(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }
        self.writes.lock().push((path.to_path_buf(), value.clone()));
        *self.content.lock() = Some(value.clone());
        Ok(())
    }
}

pub struct FixedDirs(pub &'static str);

impl AppDirs for FixedDirs {
    fn user_data_dir(&self) -> PathBuf {
        PathBuf::from(self.0)
    }
}
