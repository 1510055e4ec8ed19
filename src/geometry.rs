//! Window frames and placement.
//!
//! Placement happens once at creation: descriptor defaults are merged with
//! request-supplied overrides, then the frame is either centered relative to
//! the parent (or the screen when there is no parent) or anchored to an
//! explicit/default origin.

use serde::{Deserialize, Serialize};

/// A window frame in logical screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// A frame of the given size centered within this one.
    #[must_use]
    pub fn center_frame(&self, width: f64, height: f64) -> Self {
        Self {
            x: self.x + (self.width - width) / 2.0,
            y: self.y + (self.height - height) / 2.0,
            width,
            height,
        }
    }
}

/// Width/height pair for descriptor defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self { Self { width, height } }
}

/// Geometry overrides supplied with an open request.
///
/// Unset fields fall back to the descriptor defaults (size) or the computed
/// placement (position).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeometryOverride {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl GeometryOverride {
    /// Whether the request pins an explicit position.
    #[must_use]
    pub const fn has_position(&self) -> bool { self.x.is_some() && self.y.is_some() }
}

/// Computes the creation frame for a new window.
///
/// Size is the descriptor default unless overridden. When `move_center` is
/// set the frame is centered within `anchor` (the parent's frame) or the
/// screen, unless the request pins both coordinates. Otherwise the frame is
/// placed at the override position, falling back to `fallback_origin` (the
/// kind's last-used position) and finally the screen origin.
#[must_use]
pub fn resolve_frame(
    defaults: Size,
    overrides: GeometryOverride,
    move_center: bool,
    anchor: Option<Rect>,
    fallback_origin: Option<(f64, f64)>,
    screen: Rect,
) -> Rect {
    let width = overrides.width.unwrap_or(defaults.width);
    let height = overrides.height.unwrap_or(defaults.height);

    if move_center && !overrides.has_position() {
        return anchor.unwrap_or(screen).center_frame(width, height);
    }

    let (default_x, default_y) = fallback_origin.unwrap_or((screen.x, screen.y));
    Rect {
        x: overrides.x.unwrap_or(default_x),
        y: overrides.y.unwrap_or(default_y),
        width,
        height,
    }
}
