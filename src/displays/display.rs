//! Physical display geometry.

use serde::{Deserialize, Serialize};

/// Identifier of a physical display, stable while it stays connected.
pub type DisplayId = u32;

/// A point in the global desktop coordinate space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A rectangle in the global desktop coordinate space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle from its origin and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` if the point lies inside the rectangle.
    ///
    /// The left and top edges are inclusive, the right and bottom edges are
    /// exclusive so that adjacent displays never both contain a point.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    /// A rectangle with no area cannot host a window.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A physical display as reported by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Display {
    pub id: DisplayId,
    #[serde(default)]
    pub name: String,
    pub bounds: Rect,
    /// Whether the host designates this display as the main one.
    #[serde(default)]
    pub is_primary: bool,
}

impl Display {
    /// Creates a display named after its id.
    pub fn new(id: DisplayId, bounds: Rect, is_primary: bool) -> Self {
        Display {
            id,
            name: format!("display-{}", id),
            bounds,
            is_primary,
        }
    }
}
