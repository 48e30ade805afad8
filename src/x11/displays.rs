use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;
use x11rb::protocol::randr::ConnectionExt as RandrExt;
use x11rb::protocol::xproto::Window;
use x11rb::rust_connection::RustConnection;

use crate::geometry::{Rect, match_display};
use crate::host::DisplayQuery;

/// Display layout from RandR monitors, re-read on every query so hot-plugged
/// monitors are seen immediately
pub struct X11Displays {
    conn: Arc<RustConnection>,
    root: Window,
    screen: Rect,
}

impl X11Displays {
    pub fn new(conn: Arc<RustConnection>, root: Window, screen_width: u16, screen_height: u16) -> Self {
        Self {
            conn,
            root,
            screen: Rect::new(0, 0, screen_width as u32, screen_height as u32),
        }
    }

    /// Active monitors; the whole root screen when RandR has nothing to say
    pub fn monitors(&self) -> Result<Vec<Rect>> {
        let reply = match self.conn.randr_get_monitors(self.root, true) {
            Ok(cookie) => cookie.reply(),
            Err(e) => {
                debug!(error = %e, "RandR unavailable, using root screen as the only display");
                return Ok(vec![self.screen]);
            }
        };
        let monitors: Vec<Rect> = reply
            .context("Failed to get reply for RandR monitor query")?
            .monitors
            .iter()
            .map(|m| Rect::new(m.x as i32, m.y as i32, m.width as u32, m.height as u32))
            .collect();

        if monitors.is_empty() {
            return Ok(vec![self.screen]);
        }
        Ok(monitors)
    }
}

impl DisplayQuery for X11Displays {
    fn display_matching(&self, rect: Rect) -> Result<Rect> {
        let monitors = self.monitors()?;
        Ok(match_display(&rect, &monitors).unwrap_or(self.screen))
    }
}
