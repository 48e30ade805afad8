//! X11 host adapter
//!
//! Implements the store's host traits on top of an x11rb connection: EWMH
//! `_NET_WM_STATE` for the maximize/fullscreen/hidden toggles and RandR
//! monitors for the display layout.

use anyhow::{Context, Result};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

mod displays;
mod window;

pub use displays::X11Displays;
pub use window::X11Window;

use crate::constants::x11;

/// Pre-cached X11 atoms to avoid repeated roundtrips
#[derive(Debug, Clone)]
pub struct CachedAtoms {
    pub net_wm_state: Atom,
    pub net_wm_state_maximized_vert: Atom,
    pub net_wm_state_maximized_horz: Atom,
    pub net_wm_state_fullscreen: Atom,
    pub net_wm_state_hidden: Atom,
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .context(format!("Failed to intern {} atom", name))?
        .reply()
        .context(format!("Failed to get reply for {} atom", name))?
        .atom)
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        // Do all intern_atom roundtrips once at startup
        Ok(Self {
            net_wm_state: intern(conn, "_NET_WM_STATE")?,
            net_wm_state_maximized_vert: intern(conn, "_NET_WM_STATE_MAXIMIZED_VERT")?,
            net_wm_state_maximized_horz: intern(conn, "_NET_WM_STATE_MAXIMIZED_HORZ")?,
            net_wm_state_fullscreen: intern(conn, "_NET_WM_STATE_FULLSCREEN")?,
            net_wm_state_hidden: intern(conn, "_NET_WM_STATE_HIDDEN")?,
        })
    }
}

/// Layout toggles decoded from a `_NET_WM_STATE` atom list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WmState {
    pub maximized: bool,
    pub hidden: bool,
    pub full_screen: bool,
}

impl WmState {
    /// Maximized means both axes; a half-maximized window still counts as normal
    pub fn decode(atoms: &CachedAtoms, state: &[Atom]) -> Self {
        Self {
            maximized: state.contains(&atoms.net_wm_state_maximized_vert)
                && state.contains(&atoms.net_wm_state_maximized_horz),
            hidden: state.contains(&atoms.net_wm_state_hidden),
            full_screen: state.contains(&atoms.net_wm_state_fullscreen),
        }
    }
}

/// Read a window's `_NET_WM_STATE` atom list
pub fn read_wm_state(conn: &RustConnection, atoms: &CachedAtoms, window: Window) -> Result<Vec<Atom>> {
    let reply = conn
        .get_property(false, window, atoms.net_wm_state, AtomEnum::ATOM, 0, x11::WM_STATE_MAX_LEN)
        .context(format!("Failed to query _NET_WM_STATE for window {}", window))?
        .reply()
        .context(format!("Failed to get _NET_WM_STATE reply for window {}", window))?;
    Ok(reply.value32().map(|atoms| atoms.collect()).unwrap_or_default())
}

/// Ask the window manager to add or remove up to two `_NET_WM_STATE` properties
pub fn request_wm_state(
    conn: &RustConnection,
    root: Window,
    atoms: &CachedAtoms,
    window: Window,
    add: bool,
    first: Atom,
    second: Atom,
) -> Result<()> {
    let action = if add {
        x11::NET_WM_STATE_ADD
    } else {
        x11::NET_WM_STATE_REMOVE
    };

    let event = ClientMessageEvent {
        response_type: CLIENT_MESSAGE_EVENT,
        format: 32,
        sequence: 0,
        window,
        type_: atoms.net_wm_state,
        data: ClientMessageData::from([
            action,
            first,
            second,
            x11::SOURCE_APPLICATION,
            0,
        ]),
    };

    conn.send_event(
        false,
        root,
        EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
        &event,
    )
    .context(format!("Failed to send _NET_WM_STATE request for window {}", window))?;

    conn.flush()
        .context("Failed to flush X11 connection after _NET_WM_STATE request")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atoms() -> CachedAtoms {
        CachedAtoms {
            net_wm_state: 100,
            net_wm_state_maximized_vert: 101,
            net_wm_state_maximized_horz: 102,
            net_wm_state_fullscreen: 103,
            net_wm_state_hidden: 104,
        }
    }

    #[test]
    fn test_decode_empty_state_is_normal() {
        assert_eq!(WmState::decode(&atoms(), &[]), WmState::default());
    }

    #[test]
    fn test_decode_requires_both_axes_for_maximized() {
        let atoms = atoms();
        assert!(!WmState::decode(&atoms, &[101]).maximized);
        assert!(!WmState::decode(&atoms, &[102]).maximized);
        assert!(WmState::decode(&atoms, &[102, 7, 101]).maximized);
    }

    #[test]
    fn test_decode_hidden_and_full_screen() {
        let state = WmState::decode(&atoms(), &[104, 103]);
        assert!(state.hidden);
        assert!(state.full_screen);
        assert!(!state.maximized);
    }
}
