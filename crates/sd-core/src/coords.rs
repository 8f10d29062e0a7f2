//! The boundary between screen pixels and logical canvas units.
//!
//! Pointer events arrive in screen pixels relative to the page; the scene
//! is expressed in logical units of the target device (e.g. 1284×2778).
//! A canvas is shown at `display_scale` (fit-to-column) and then multiplied
//! by the editor zoom. Raw pointer coordinates are wrapped in [`ScreenPoint`]
//! and only become [`Point`]s by going through [`ViewTransform`].

use crate::geometry::Point;

/// A pointer position in screen (CSS) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Maps screen pixels to logical units for one canvas on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Screen pixels per logical unit at zoom 1.
    pub display_scale: f32,
    /// Active editor zoom.
    pub zoom: f32,
    /// Screen position of the canvas' logical origin.
    pub origin: ScreenPoint,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        display_scale: 1.0,
        zoom: 1.0,
        origin: ScreenPoint::new(0.0, 0.0),
    };

    pub fn new(display_scale: f32, zoom: f32, origin: ScreenPoint) -> Self {
        Self {
            display_scale,
            zoom,
            origin,
        }
    }

    /// Screen pixels per logical unit. Degenerate values collapse to 1 so a
    /// zero zoom can never produce infinite deltas.
    pub fn factor(&self) -> f32 {
        let f = self.display_scale * self.zoom;
        if f.is_finite() && f > f32::EPSILON { f } else { 1.0 }
    }

    pub fn screen_to_logical(&self, p: ScreenPoint) -> Point {
        let f = self.factor();
        Point::new((p.x - self.origin.x) / f, (p.y - self.origin.y) / f)
    }

    pub fn logical_to_screen(&self, p: Point) -> ScreenPoint {
        let f = self.factor();
        ScreenPoint::new(p.x * f + self.origin.x, p.y * f + self.origin.y)
    }

    /// Convert a pointer delta (screen px) into logical units.
    pub fn screen_delta_to_logical(&self, dx: f32, dy: f32) -> (f32, f32) {
        let f = self.factor();
        (dx / f, dy / f)
    }

    /// Logical length covering `px` screen pixels (handle sizes, dash lengths).
    pub fn screen_len_to_logical(&self, px: f32) -> f32 {
        px / self.factor()
    }
}
