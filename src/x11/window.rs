use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use super::{CachedAtoms, WmState, read_wm_state, request_wm_state};
use crate::geometry::Rect;
use crate::host::{EventHandler, ListenerId, WindowEvent, WindowHandle};

/// A top-level X11 client window tracked through EWMH.
///
/// The caller owns the event loop and feeds every event to `dispatch`;
/// notifications for this window are translated into `WindowEvent`s.
pub struct X11Window {
    conn: Arc<RustConnection>,
    root: Window,
    window: Window,
    atoms: Arc<CachedAtoms>,
    listeners: Mutex<Vec<(WindowEvent, ListenerId, EventHandler)>>,
    next_id: AtomicU64,
    last_size: Mutex<Option<(u16, u16)>>,
}

impl X11Window {
    /// Start receiving structure and property events for `window`
    pub fn attach(
        conn: Arc<RustConnection>,
        root: Window,
        window: Window,
        atoms: Arc<CachedAtoms>,
    ) -> Result<Self> {
        conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new()
                .event_mask(EventMask::STRUCTURE_NOTIFY | EventMask::PROPERTY_CHANGE),
        )
        .context(format!("Failed to select events on window {}", window))?;

        let geometry = conn
            .get_geometry(window)
            .context(format!("Failed to query geometry for window {}", window))?
            .reply()
            .context(format!("Window {} does not exist", window))?;

        Ok(Self {
            conn,
            root,
            window,
            atoms,
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            last_size: Mutex::new(Some((geometry.width, geometry.height))),
        })
    }

    pub fn id(&self) -> Window {
        self.window
    }

    /// Move and resize to the saved normal geometry; size only when no
    /// position was saved
    pub fn place(&self, position: Option<(i32, i32)>, width: u32, height: u32) -> Result<()> {
        self.conn
            .configure_window(self.window, &placement(position, width, height))
            .context(format!("Failed to place window {} at {:?} {}x{}", self.window, position, width, height))?;
        self.conn
            .flush()
            .context("Failed to flush X11 connection after placing window")?;
        Ok(())
    }

    /// Translate an X event into window notifications.
    /// Returns `true` once the window has been destroyed.
    pub fn dispatch(&self, event: &Event) -> bool {
        match event {
            Event::ConfigureNotify(e) if e.window == self.window => {
                let kind = classify_configure(&mut self.last_size.lock(), e.width, e.height);
                self.emit(kind);
            }
            Event::PropertyNotify(e)
                if e.window == self.window && e.atom == self.atoms.net_wm_state =>
            {
                // Maximize/fullscreen toggles change the layout without a guaranteed configure
                self.emit(WindowEvent::Resize);
            }
            Event::UnmapNotify(e) if e.window == self.window => {
                self.emit(WindowEvent::Close);
            }
            Event::DestroyNotify(e) if e.window == self.window => {
                self.emit(WindowEvent::Closed);
                return true;
            }
            _ => {}
        }
        false
    }

    fn emit(&self, event: WindowEvent) {
        // Clone out so handlers can unsubscribe while we iterate
        let handlers: Vec<EventHandler> = self
            .listeners
            .lock()
            .iter()
            .filter(|(e, _, _)| *e == event)
            .map(|(_, _, handler)| Arc::clone(handler))
            .collect();
        debug!(window = self.window, event = ?event, handlers = handlers.len(), "Dispatching window event");
        for handler in handlers {
            handler(event);
        }
    }

    fn wm_state(&self) -> Result<WmState> {
        let state = read_wm_state(&self.conn, &self.atoms, self.window)?;
        Ok(WmState::decode(&self.atoms, &state))
    }
}

fn placement(position: Option<(i32, i32)>, width: u32, height: u32) -> ConfigureWindowAux {
    let aux = ConfigureWindowAux::new().width(width).height(height);
    match position {
        Some((x, y)) => aux.x(x).y(y),
        None => aux,
    }
}

/// Size change means resize, anything else (position, stacking) means move
fn classify_configure(last_size: &mut Option<(u16, u16)>, width: u16, height: u16) -> WindowEvent {
    let size = (width, height);
    if last_size.replace(size) == Some(size) {
        WindowEvent::Move
    } else {
        WindowEvent::Resize
    }
}

impl WindowHandle for X11Window {
    fn bounds(&self) -> Result<Rect> {
        let geometry = self
            .conn
            .get_geometry(self.window)
            .context(format!("Failed to query geometry for window {}", self.window))?
            .reply()
            .context(format!("Failed to get geometry reply for window {}", self.window))?;
        let origin = self
            .conn
            .translate_coordinates(self.window, self.root, 0, 0)
            .context(format!("Failed to translate coordinates for window {}", self.window))?
            .reply()
            .context(format!("Failed to get translate reply for window {}", self.window))?;

        Ok(Rect::new(
            origin.dst_x as i32,
            origin.dst_y as i32,
            geometry.width as u32,
            geometry.height as u32,
        ))
    }

    fn is_maximized(&self) -> Result<bool> {
        Ok(self.wm_state()?.maximized)
    }

    fn is_minimized(&self) -> Result<bool> {
        Ok(self.wm_state()?.hidden)
    }

    fn is_full_screen(&self) -> Result<bool> {
        Ok(self.wm_state()?.full_screen)
    }

    fn maximize(&self) -> Result<()> {
        request_wm_state(
            &self.conn,
            self.root,
            &self.atoms,
            self.window,
            true,
            self.atoms.net_wm_state_maximized_vert,
            self.atoms.net_wm_state_maximized_horz,
        )
    }

    fn set_full_screen(&self, full_screen: bool) -> Result<()> {
        request_wm_state(
            &self.conn,
            self.root,
            &self.atoms,
            self.window,
            full_screen,
            self.atoms.net_wm_state_fullscreen,
            0,
        )
    }

    fn subscribe(&self, event: WindowEvent, handler: EventHandler) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().push((event, id, handler));
        id
    }

    fn unsubscribe(&self, event: WindowEvent, id: ListenerId) {
        self.listeners
            .lock()
            .retain(|(e, existing, _)| !(*e == event && *existing == id));
    }
}
