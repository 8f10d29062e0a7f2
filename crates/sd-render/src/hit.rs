//! Hit testing: point → element and point → transform handle.
//!
//! Walks the canvas front-to-back (reverse paint order) and maps the
//! pointer into each element's unrotated frame before an axis-aligned
//! containment check. Bounds come from [`sd_core::layout::element_bounds`],
//! the same function the selection outline is drawn from.

use sd_core::geometry::{Point, Rect};
use sd_core::layout::{LayoutContext, element_bounds, rotated_corners, to_local};
use sd_core::{CanvasInstance, Element, ElementId, ViewTransform};

/// Extra margin around text bounds so thin or small text is easy to grab.
pub const DEFAULT_TEXT_HIT_PADDING: f32 = 20.0;

/// The nine transform handles. Sides and corners are named by compass
/// direction in the element's local (unrotated) frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
    Rotate,
}

impl Handle {
    pub fn is_side(self) -> bool {
        matches!(self, Handle::N | Handle::E | Handle::S | Handle::W)
    }

    /// Direction the handle moves the edge it owns: `(-1|0|1, -1|0|1)`.
    pub fn direction(self) -> (f32, f32) {
        match self {
            Handle::N => (0.0, -1.0),
            Handle::NE => (1.0, -1.0),
            Handle::E => (1.0, 0.0),
            Handle::SE => (1.0, 1.0),
            Handle::S => (0.0, 1.0),
            Handle::SW => (-1.0, 1.0),
            Handle::W => (-1.0, 0.0),
            Handle::NW => (-1.0, -1.0),
            Handle::Rotate => (0.0, 0.0),
        }
    }

    /// CSS cursor for hovering the handle (unrotated).
    pub fn cursor(self) -> &'static str {
        match self {
            Handle::N | Handle::S => "ns-resize",
            Handle::E | Handle::W => "ew-resize",
            Handle::NE | Handle::SW => "nesw-resize",
            Handle::NW | Handle::SE => "nwse-resize",
            Handle::Rotate => "grab",
        }
    }
}

/// Handle geometry in logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleMetrics {
    /// Side length of a square resize handle.
    pub size: f32,
    /// Distance of the rotation knob above the top edge.
    pub rotate_offset: f32,
    /// Radius of the rotation knob.
    pub rotate_radius: f32,
}

impl HandleMetrics {
    /// Handles keep a constant on-screen size whatever the zoom.
    pub fn from_screen(size_px: f32, rotate_offset_px: f32, view: &ViewTransform) -> Self {
        Self {
            size: view.screen_len_to_logical(size_px),
            rotate_offset: view.screen_len_to_logical(rotate_offset_px),
            rotate_radius: view.screen_len_to_logical(size_px * 0.6),
        }
    }
}

/// Local-frame centers of every handle of `bounds`.
pub fn handle_positions(bounds: &Rect, metrics: &HandleMetrics) -> [(Handle, Point); 9] {
    let c = bounds.center();
    let at = |h: Handle| {
        let (dx, dy) = h.direction();
        Point::new(
            c.x + dx * bounds.width / 2.0,
            c.y + dy * bounds.height / 2.0,
        )
    };
    [
        (Handle::NW, at(Handle::NW)),
        (Handle::N, at(Handle::N)),
        (Handle::NE, at(Handle::NE)),
        (Handle::E, at(Handle::E)),
        (Handle::SE, at(Handle::SE)),
        (Handle::S, at(Handle::S)),
        (Handle::SW, at(Handle::SW)),
        (Handle::W, at(Handle::W)),
        (Handle::Rotate, Point::new(c.x, bounds.y - metrics.rotate_offset)),
    ]
}

/// Bounds used for picking: layout bounds, padded for text.
pub fn hit_bounds(el: &Element, ctx: &LayoutContext<'_>, text_padding: f32) -> Rect {
    let b = element_bounds(el, ctx);
    if el.is_text() { b.inflate(text_padding) } else { b }
}

/// Does `p` fall inside `el`'s rotated hit region?
pub fn element_contains(el: &Element, ctx: &LayoutContext<'_>, p: Point, text_padding: f32) -> bool {
    // Padding is symmetric, so padded and unpadded bounds share a center.
    let bounds = hit_bounds(el, ctx, text_padding);
    bounds.contains(to_local(p, &bounds, el.rotation))
}

/// Find the topmost element at `p`. Returns `None` over empty canvas.
pub fn hit_test(
    canvas: &CanvasInstance,
    ctx: &LayoutContext<'_>,
    p: Point,
    text_padding: f32,
) -> Option<ElementId> {
    // Last painted = topmost
    canvas
        .paint_order()
        .into_iter()
        .rev()
        .find(|el| element_contains(el, ctx, p, text_padding))
        .map(|el| el.id)
}

/// Find the handle of `el` under `p`. The rotation knob wins over resize
/// handles when they overlap.
pub fn hit_test_handle(
    el: &Element,
    ctx: &LayoutContext<'_>,
    p: Point,
    metrics: &HandleMetrics,
) -> Option<Handle> {
    let bounds = element_bounds(el, ctx);
    let local = to_local(p, &bounds, el.rotation);
    let positions = handle_positions(&bounds, metrics);

    let (_, knob) = positions[8];
    if local.distance(knob) <= metrics.rotate_radius.max(metrics.size / 2.0) {
        return Some(Handle::Rotate);
    }
    positions[..8]
        .iter()
        .find(|(_, c)| Rect::from_center(*c, metrics.size, metrics.size).contains(local))
        .map(|(h, _)| *h)
}

/// Find all elements whose rotated bounds intersect `rect`.
/// Used for marquee (box) selection.
pub fn hit_test_rect(canvas: &CanvasInstance, ctx: &LayoutContext<'_>, rect: &Rect) -> Vec<ElementId> {
    canvas
        .paint_order()
        .into_iter()
        .filter(|el| {
            let corners = rotated_corners(&element_bounds(el, ctx), el.rotation);
            let (min_x, max_x) = corners
                .iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.x), hi.max(p.x)));
            let (min_y, max_y) = corners
                .iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
            Rect::new(min_x, min_y, max_x - min_x, max_y - min_y).intersects(rect)
        })
        .map(|el| el.id)
        .collect()
}
