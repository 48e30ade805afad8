use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geometry::Rect;

/// Persisted window geometry.
///
/// Bounds hold the last *normal* placement (not maximized, minimized or
/// fullscreen), so they survive a session that ends maximized. Keys missing
/// from the file stay `None` and are omitted again on write. Unknown keys are
/// carried along untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStateRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_maximized: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_full_screen: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_bounds: Option<Rect>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WindowStateRecord {
    /// All four bounds fields present
    pub fn has_bounds(&self) -> bool {
        self.bounds().is_some()
    }

    pub fn bounds(&self) -> Option<Rect> {
        Some(Rect::new(self.x?, self.y?, self.width?, self.height?))
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.x = Some(bounds.x);
        self.y = Some(bounds.y);
        self.width = Some(bounds.width);
        self.height = Some(bounds.height);
    }

    /// Fold a live window reading into the record. Bounds only move while the
    /// window is in its normal layout; the toggles and display always refresh.
    pub fn apply(&mut self, snapshot: &WindowSnapshot) {
        if snapshot.is_normal {
            self.set_bounds(snapshot.bounds);
        }
        self.is_maximized = Some(snapshot.is_maximized);
        self.is_full_screen = Some(snapshot.is_full_screen);
        self.display_bounds = Some(snapshot.display_bounds);
    }

    /// Defaults underneath an optional loaded record: only `width`/`height`
    /// have defaults, and only absent values take them.
    pub fn with_defaults(loaded: Option<Self>, default_width: u32, default_height: u32) -> Self {
        let mut record = loaded.unwrap_or_default();
        record.width.get_or_insert(default_width);
        record.height.get_or_insert(default_height);
        record
    }
}

/// One reading of a live window's geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub bounds: Rect,
    pub is_normal: bool,
    pub is_maximized: bool,
    pub is_full_screen: bool,
    pub display_bounds: Rect,
}
