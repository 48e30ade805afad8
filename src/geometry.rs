use serde::{Deserialize, Serialize};

/// Screen-space rectangle, used for both window bounds and display bounds.
///
/// Equality is strict on all four fields; a saved display rect only matches a
/// live display when it is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn left(&self) -> i64 {
        self.x as i64
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn top(&self) -> i64 {
        self.y as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Overlapping region, or `None` when the rectangles only touch or are apart
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect {
            x: left as i32,
            y: top as i32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }

    /// Squared length of the gap between two rectangles (0 when they touch or overlap)
    pub fn distance_to(&self, other: &Rect) -> u64 {
        let dx = (other.left() - self.right())
            .max(self.left() - other.right())
            .max(0);
        let dy = (other.top() - self.bottom())
            .max(self.top() - other.bottom())
            .max(0);
        (dx * dx + dy * dy) as u64
    }
}

/// Pick the display a rectangle belongs to.
///
/// The display sharing the largest area with `target` wins. When nothing
/// overlaps (window parked off-screen) the nearest display is used instead.
/// Ties keep the earliest display in `displays`.
pub fn match_display(target: &Rect, displays: &[Rect]) -> Option<Rect> {
    let mut best: Option<(Rect, u64)> = None;
    for display in displays {
        let overlap = target.intersection(display).map_or(0, |r| r.area());
        if overlap > 0 && best.as_ref().map_or(true, |(_, area)| overlap > *area) {
            best = Some((*display, overlap));
        }
    }
    if let Some((display, _)) = best {
        return Some(display);
    }

    let mut nearest: Option<(Rect, u64)> = None;
    for display in displays {
        let distance = target.distance_to(display);
        if nearest.as_ref().map_or(true, |(_, d)| distance < *d) {
            nearest = Some((*display, distance));
        }
    }
    nearest.map(|(display, _)| display)
}
