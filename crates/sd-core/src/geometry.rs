//! Pure geometry helpers shared by layout, hit testing and rendering.
//!
//! Everything here works in the logical coordinate space of a canvas.
//! Nothing in this module knows about display scale or zoom; see
//! [`crate::coords`] for that boundary.

use crate::model::{Color, TextAlign};
use serde::{Deserialize, Serialize};

/// A point in logical canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned rectangle in logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle of the given size centered on `center`.
    pub fn from_center(center: Point, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Grow the rectangle by `pad` on every side.
    pub fn inflate(&self, pad: f32) -> Self {
        Self::new(
            self.x - pad,
            self.y - pad,
            self.width + pad * 2.0,
            self.height + pad * 2.0,
        )
    }

    /// Check if this rectangle overlaps another (AABB overlap).
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// Linear per-channel interpolation between two colors.
/// `t` is clamped to `[0, 1]` before use.
pub fn interpolate_color(c1: Color, c2: Color, t: f32) -> Color {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let lerp = |a: f32, b: f32| a + (b - a) * t;
    Color::rgba(
        lerp(c1.r, c2.r),
        lerp(c1.g, c2.g),
        lerp(c1.b, c2.b),
        lerp(c1.a, c2.a),
    )
}

/// Rotate `point` about `center` by `degrees` (positive = clockwise in a
/// y-down coordinate system, matching canvas `rotate()`).
pub fn rotate_point(point: Point, center: Point, degrees: f32) -> Point {
    if degrees == 0.0 {
        return point;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

/// Normalize an angle in degrees into `(-180, 180]`.
pub fn normalize_rotation(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let r = degrees.rem_euclid(360.0);
    if r > 180.0 { r - 360.0 } else { r }
}

/// Width of a line once letter spacing is added between every character pair.
pub fn spaced_width(measure: impl Fn(&str) -> f32, line: &str, letter_spacing: f32) -> f32 {
    let gaps = line.chars().count().saturating_sub(1) as f32;
    measure(line) + letter_spacing * gaps
}

/// Greedy word wrap.
///
/// Explicit `\n` breaks are honored first (empty lines survive), then words
/// are packed while the spaced width stays within `max_width`. A word wider
/// than `max_width` sits alone on its line and is never split.
pub fn wrap_text(
    measure: impl Fn(&str) -> f32,
    text: &str,
    max_width: f32,
    letter_spacing: f32,
) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if spaced_width(&measure, &candidate, letter_spacing) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }

    lines
}

/// Bounding box of wrapped text in unrotated local space.
///
/// `line_widths` are the measured (spaced) widths of each wrapped line. The
/// anchor is the top of the first line; its x is the left edge, midpoint or
/// right edge depending on `align`.
pub fn compute_text_bounds(
    line_widths: &[f32],
    anchor: Point,
    align: TextAlign,
    line_advance: f32,
) -> Rect {
    let width = line_widths.iter().copied().fold(0.0_f32, f32::max);
    let height = line_widths.len() as f32 * line_advance;
    let x = match align {
        TextAlign::Left => anchor.x,
        TextAlign::Center => anchor.x - width / 2.0,
        TextAlign::Right => anchor.x - width,
    };
    Rect::new(x, anchor.y, width, height)
}
