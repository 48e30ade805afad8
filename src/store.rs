//! Window state store
//!
//! Loads the saved geometry once at build time, keeps it current while a
//! window is managed, and writes it back when the window closes. Nothing in
//! here returns an error to the caller: load, validation and write failures
//! are logged, handed to the `on_error` hook, and the store carries on with
//! defaults or its in-memory record.

use parking_lot::Mutex;
use std::error::Error as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::debounce::Debouncer;
use crate::error::StateError;
use crate::geometry::Rect;
use crate::host::{
    AppDirs, DirsAppDirs, DisplayQuery, EventHandler, ListenerId, WindowEvent, WindowHandle,
};
use crate::record::{WindowSnapshot, WindowStateRecord};
use crate::storage::{JsonFileStorage, StateStorage};

pub type ErrorHook = Arc<dyn Fn(&StateError) + Send + Sync>;

pub struct StoreBuilder {
    config: StoreConfig,
    displays: Arc<dyn DisplayQuery>,
    storage: Arc<dyn StateStorage>,
    app_dirs: Arc<dyn AppDirs>,
    runtime: Option<Handle>,
    on_error: Option<ErrorHook>,
}

impl StoreBuilder {
    pub fn storage(mut self, storage: Arc<dyn StateStorage>) -> Self {
        self.storage = storage;
        self
    }

    pub fn app_dirs(mut self, app_dirs: Arc<dyn AppDirs>) -> Self {
        self.app_dirs = app_dirs;
        self
    }

    /// Runtime the move/resize debounce is scheduled on
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Called for every absorbed failure except a missing state file
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&StateError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Load, validate and merge the saved state. Never fails.
    pub fn build(self) -> WindowStateStore {
        let mut config = self.config;
        config.validate_and_clamp();

        let state_file = config.state_file(self.app_dirs.as_ref());
        if self.runtime.is_none() {
            warn!("No tokio runtime available, move/resize updates will not be debounced");
        }
        let debouncer = Debouncer::new(config.debounce(), self.runtime);

        let shared = Arc::new(Shared {
            state_file,
            displays: self.displays,
            storage: self.storage,
            on_error: self.on_error,
            debouncer,
            sessions: AtomicU64::new(0),
            inner: Mutex::new(Inner {
                record: WindowStateRecord::default(),
                tracked: None,
            }),
            config,
        });

        let loaded = shared.load().and_then(|record| match shared.validate(&record) {
            Ok(()) => Some(record),
            Err(err) => {
                shared.report(err);
                None
            }
        });
        if loaded.is_some() {
            info!(path = %shared.state_file.display(), "Restored saved window state");
        }

        shared.inner.lock().record = WindowStateRecord::with_defaults(
            loaded,
            shared.config.default_width,
            shared.config.default_height,
        );

        WindowStateStore { shared }
    }
}

struct Tracked {
    session: u64,
    window: Arc<dyn WindowHandle>,
    listeners: Vec<(WindowEvent, ListenerId)>,
}

struct Inner {
    record: WindowStateRecord,
    tracked: Option<Tracked>,
}

struct Shared {
    config: StoreConfig,
    state_file: PathBuf,
    displays: Arc<dyn DisplayQuery>,
    storage: Arc<dyn StateStorage>,
    on_error: Option<ErrorHook>,
    debouncer: Debouncer,
    sessions: AtomicU64,
    inner: Mutex<Inner>,
}

impl Shared {
    fn report(&self, err: StateError) {
        match err.source() {
            Some(cause) => warn!(error = %err, cause = %cause, "Window state error"),
            None => warn!(error = %err, "Window state error"),
        }
        if let Some(hook) = self.on_error.as_ref() {
            hook(&err);
        }
    }

    fn load(&self) -> Option<WindowStateRecord> {
        let value = match self.storage.read_json(&self.state_file) {
            Ok(value) => value,
            Err(err) if err.is_missing_file() => {
                debug!(path = %self.state_file.display(), "No saved window state");
                return None;
            }
            Err(err) => {
                self.report(err);
                return None;
            }
        };

        match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(source) => {
                self.report(StateError::Shape {
                    path: self.state_file.clone(),
                    source,
                });
                None
            }
        }
    }

    /// Accept the record only with complete bounds, and only if its saved
    /// display is still exactly where it was
    fn validate(&self, record: &WindowStateRecord) -> Result<(), StateError> {
        let bounds = record.bounds().ok_or(StateError::MissingBounds)?;
        if let Some(saved) = record.display_bounds {
            let current = self
                .displays
                .display_matching(bounds)
                .map_err(StateError::Display)?;
            if saved != current {
                return Err(StateError::StaleDisplay { saved, current });
            }
        }
        Ok(())
    }

    fn snapshot(&self, window: &dyn WindowHandle) -> Result<WindowSnapshot, StateError> {
        let bounds = window.bounds().map_err(StateError::Window)?;
        let is_maximized = window.is_maximized().map_err(StateError::Window)?;
        let is_minimized = window.is_minimized().map_err(StateError::Window)?;
        let is_full_screen = window.is_full_screen().map_err(StateError::Window)?;
        let display_bounds = self
            .displays
            .display_matching(bounds)
            .map_err(StateError::Display)?;

        Ok(WindowSnapshot {
            bounds,
            is_normal: !is_maximized && !is_minimized && !is_full_screen,
            is_maximized,
            is_full_screen,
            display_bounds,
        })
    }

    fn persist(&self, record: &WindowStateRecord) -> Result<(), StateError> {
        if let Some(dir) = self.state_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.storage.create_dir_all(dir)?;
        }
        let value = serde_json::to_value(record).map_err(StateError::Serialize)?;
        self.storage.write_json(&self.state_file, &value)?;
        info!(path = %self.state_file.display(), "Saved window state");
        Ok(())
    }

    fn detach(&self) -> bool {
        let Some(tracked) = self.inner.lock().tracked.take() else {
            return false;
        };
        for (event, id) in tracked.listeners {
            tracked.window.unsubscribe(event, id);
        }
        self.debouncer.cancel();
        true
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Persists one window's geometry across restarts.
///
/// Cheap to clone; clones share the same record and tracked window.
#[derive(Clone)]
pub struct WindowStateStore {
    shared: Arc<Shared>,
}

impl WindowStateStore {
    pub fn builder(config: StoreConfig, displays: Arc<dyn DisplayQuery>) -> StoreBuilder {
        StoreBuilder {
            config,
            displays,
            storage: Arc::new(JsonFileStorage),
            app_dirs: Arc::new(DirsAppDirs::default()),
            runtime: Handle::try_current().ok(),
            on_error: None,
        }
    }

    pub fn x(&self) -> Option<i32> {
        self.shared.inner.lock().record.x
    }

    pub fn y(&self) -> Option<i32> {
        self.shared.inner.lock().record.y
    }

    pub fn width(&self) -> u32 {
        self.shared
            .inner
            .lock()
            .record
            .width
            .unwrap_or(self.shared.config.default_width)
    }

    pub fn height(&self) -> u32 {
        self.shared
            .inner
            .lock()
            .record
            .height
            .unwrap_or(self.shared.config.default_height)
    }

    pub fn is_maximized(&self) -> Option<bool> {
        self.shared.inner.lock().record.is_maximized
    }

    pub fn is_full_screen(&self) -> Option<bool> {
        self.shared.inner.lock().record.is_full_screen
    }

    /// Last normal bounds, once a position is known
    pub fn bounds(&self) -> Option<Rect> {
        self.shared.inner.lock().record.bounds()
    }

    pub fn display_bounds(&self) -> Option<Rect> {
        self.shared.inner.lock().record.display_bounds
    }

    pub fn record(&self) -> WindowStateRecord {
        self.shared.inner.lock().record.clone()
    }

    pub fn state_file(&self) -> &Path {
        &self.shared.state_file
    }

    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    pub fn is_managed(&self) -> bool {
        self.shared.inner.lock().tracked.is_some()
    }

    /// Start tracking `window`, restoring maximize/fullscreen first.
    ///
    /// Any previously managed window is released before the new one is taken.
    pub fn manage(&self, window: Arc<dyn WindowHandle>) {
        self.unmanage();

        let (maximize, full_screen) = {
            let inner = self.shared.inner.lock();
            (
                self.shared.config.maximize && inner.record.is_maximized == Some(true),
                self.shared.config.full_screen && inner.record.is_full_screen == Some(true),
            )
        };

        // Called without the lock held: toolkits may emit resize synchronously
        if maximize {
            if let Err(err) = window.maximize() {
                self.shared
                    .report(StateError::Window(err.context("failed to maximize window")));
            }
        }
        if full_screen {
            if let Err(err) = window.set_full_screen(true) {
                self.shared
                    .report(StateError::Window(err.context("failed to enter fullscreen")));
            }
        }

        let session = self.shared.sessions.fetch_add(1, Ordering::SeqCst) + 1;
        let weak = Arc::downgrade(&self.shared);
        let listeners = WindowEvent::ALL
            .into_iter()
            .map(|event| {
                let id = window.subscribe(event, event_handler(weak.clone(), session));
                (event, id)
            })
            .collect();

        self.shared.inner.lock().tracked = Some(Tracked {
            session,
            window,
            listeners,
        });
        info!(session = session, maximize = maximize, full_screen = full_screen, "Managing window");
    }

    /// Stop tracking the current window. No-op when nothing is tracked.
    pub fn unmanage(&self) {
        if self.shared.detach() {
            info!("Stopped managing window");
        }
    }

    /// Refresh the record from `window`, or from the managed window when
    /// `None`. Does nothing if there is neither.
    pub fn update_state(&self, window: Option<&dyn WindowHandle>) {
        let tracked;
        let window: &dyn WindowHandle = match window {
            Some(window) => window,
            None => {
                tracked = match self.shared.inner.lock().tracked.as_ref() {
                    Some(t) => Arc::clone(&t.window),
                    None => return,
                };
                &*tracked
            }
        };

        match self.shared.snapshot(window) {
            Ok(snapshot) => {
                debug!(bounds = ?snapshot.bounds, normal = snapshot.is_normal, "Captured window geometry");
                self.shared.inner.lock().record.apply(&snapshot);
            }
            Err(err) => self.shared.report(err),
        }
    }

    /// Refresh from `window` when given, then write the record to disk.
    /// Best effort: failures are reported, never returned.
    pub fn save_state(&self, window: Option<&dyn WindowHandle>) {
        if let Some(window) = window {
            self.update_state(Some(window));
        }
        let record = self.record();
        if let Err(err) = self.shared.persist(&record) {
            self.shared.report(err);
        }
    }

    fn is_session(&self, session: u64) -> bool {
        self.shared
            .inner
            .lock()
            .tracked
            .as_ref()
            .is_some_and(|t| t.session == session)
    }

    fn handle_event(&self, session: u64, event: WindowEvent) {
        // Listener of a window that has since been released
        if !self.is_session(session) {
            return;
        }

        match event {
            WindowEvent::Resize | WindowEvent::Move => {
                let weak = Arc::downgrade(&self.shared);
                self.shared.debouncer.schedule(move || {
                    if let Some(shared) = weak.upgrade() {
                        WindowStateStore { shared }.update_state(None);
                    }
                });
            }
            WindowEvent::Close => self.update_state(None),
            WindowEvent::Closed => {
                self.unmanage();
                self.save_state(None);
            }
        }
    }
}

fn event_handler(store: Weak<Shared>, session: u64) -> EventHandler {
    Arc::new(move |event| {
        if let Some(shared) = store.upgrade() {
            WindowStateStore { shared }.handle_event(session, event);
        }
    })
}
