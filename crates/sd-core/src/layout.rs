//! Element layout: local (unrotated) bounds for every element kind.
//!
//! Hit testing and the selection outline both go through
//! [`element_bounds`], so what is drawn and what is clickable cannot drift
//! apart. Each element rotates about the center of these bounds.

use crate::geometry::{Point, Rect, compute_text_bounds, rotate_point, spaced_width, wrap_text};
use crate::model::{Element, ElementKind, FontWeight, TextElement};

/// Default wrap width for text without an explicit frame, as a fraction of
/// the canvas width.
pub const DEFAULT_TEXT_WIDTH_FRACTION: f32 = 0.9;

/// A resolved font request.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub weight: FontWeight,
    /// Pixel size in logical units (font size × element scale).
    pub size: f32,
}

impl FontSpec {
    /// CSS `font` shorthand, e.g. `700 64px "Inter", sans-serif`.
    pub fn css(&self) -> String {
        format!(
            "{} {}px \"{}\", sans-serif",
            self.weight.css(),
            self.size,
            self.family
        )
    }
}

/// Text measurement, supplied by the drawing surface.
pub trait TextMeasure {
    /// Advance width of `text` (no letter spacing) in logical units.
    fn measure(&self, text: &str, font: &FontSpec) -> f32;
}

/// Deterministic width estimate for surfaces without a shaping engine.
///
/// Uses fixed em fractions per character class. Good enough for wrapping
/// decisions in headless export and tests; browser surfaces measure for real.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxMeasure;

impl TextMeasure for ApproxMeasure {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        let bold = if font.weight == FontWeight::Bold { 1.05 } else { 1.0 };
        let em: f32 = text
            .chars()
            .map(|c| match c {
                ' ' => 0.28,
                'i' | 'l' | 'j' | '.' | ',' | '\'' | '!' | '|' => 0.28,
                'm' | 'w' | 'M' | 'W' => 0.85,
                c if c.is_ascii_uppercase() || c.is_ascii_digit() => 0.65,
                c if c.is_ascii() => 0.55,
                // CJK and emoji are roughly square.
                _ => 1.0,
            })
            .sum();
        em * font.size * bold
    }
}

/// Inputs needed to lay out elements on one canvas.
pub struct LayoutContext<'a> {
    pub measure: &'a dyn TextMeasure,
    pub canvas_width: f32,
    pub text_width_fraction: f32,
}

impl<'a> LayoutContext<'a> {
    pub fn new(measure: &'a dyn TextMeasure, canvas_width: f32) -> Self {
        Self {
            measure,
            canvas_width,
            text_width_fraction: DEFAULT_TEXT_WIDTH_FRACTION,
        }
    }
}

/// Wrapped lines and geometry of a text element.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<String>,
    /// Spaced width of each line.
    pub widths: Vec<f32>,
    pub font: FontSpec,
    pub letter_spacing: f32,
    /// Distance between consecutive line tops.
    pub line_advance: f32,
    pub max_width: f32,
    pub bounds: Rect,
}

impl TextLayout {
    /// Left edge of line `i` for the element's alignment.
    pub fn line_x(&self, i: usize, anchor_x: f32, align: crate::model::TextAlign) -> f32 {
        let w = self.widths.get(i).copied().unwrap_or(0.0);
        match align {
            crate::model::TextAlign::Left => anchor_x,
            crate::model::TextAlign::Center => anchor_x - w / 2.0,
            crate::model::TextAlign::Right => anchor_x - w,
        }
    }
}

/// Font used to draw `text` at `scale`.
pub fn font_for(text: &TextElement, scale: f32) -> FontSpec {
    FontSpec {
        family: text.font_family.clone(),
        weight: text.weight,
        size: text.font_size * scale,
    }
}

/// Wrap and measure a text element.
pub fn layout_text(el: &Element, text: &TextElement, ctx: &LayoutContext<'_>) -> TextLayout {
    let font = font_for(text, el.scale);
    let letter_spacing = text.letter_spacing * el.scale;
    // The frame is in unscaled units either way, so scaling never rewraps.
    let frame = text
        .width
        .unwrap_or(ctx.canvas_width * ctx.text_width_fraction);
    let max_width = frame * el.scale;
    let measure = |s: &str| ctx.measure.measure(s, &font);

    let lines = wrap_text(measure, &text.content, max_width, letter_spacing);
    let widths: Vec<f32> = lines
        .iter()
        .map(|l| spaced_width(measure, l, letter_spacing))
        .collect();
    let line_advance = font.size * text.line_height;
    let bounds = compute_text_bounds(&widths, el.position, text.align, line_advance);

    TextLayout {
        lines,
        widths,
        font,
        letter_spacing,
        line_advance,
        max_width,
        bounds,
    }
}

/// Local, unrotated bounds of an element.
pub fn element_bounds(el: &Element, ctx: &LayoutContext<'_>) -> Rect {
    match &el.kind {
        ElementKind::Text(text) => layout_text(el, text, ctx).bounds,
        ElementKind::Mockup(m) => {
            Rect::from_center(el.position, m.base_width * el.scale, m.base_height * el.scale)
        }
        ElementKind::Visual(v) => {
            Rect::from_center(el.position, v.width * el.scale, v.height * el.scale)
        }
    }
}

/// Map a canvas point into the element's unrotated frame.
pub fn to_local(p: Point, bounds: &Rect, rotation: f32) -> Point {
    rotate_point(p, bounds.center(), -rotation)
}

/// The four corners of `bounds` after rotating about its center,
/// clockwise from top-left.
pub fn rotated_corners(bounds: &Rect, rotation: f32) -> [Point; 4] {
    let c = bounds.center();
    [
        Point::new(bounds.x, bounds.y),
        Point::new(bounds.right(), bounds.y),
        Point::new(bounds.right(), bounds.bottom()),
        Point::new(bounds.x, bounds.bottom()),
    ]
    .map(|p| rotate_point(p, c, rotation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TextAlign, create_mockup_element, create_text_element, create_visual_element};

    struct Mono;
    impl TextMeasure for Mono {
        fn measure(&self, text: &str, font: &FontSpec) -> f32 {
            text.chars().count() as f32 * font.size * 0.5
        }
    }

    #[test]
    fn tap_to_edit_is_a_single_line() {
        let el = create_text_element("Tap to edit", Point::new(100.0, 100.0));
        let ctx = LayoutContext {
            measure: &ApproxMeasure,
            canvas_width: 1000.0 / DEFAULT_TEXT_WIDTH_FRACTION,
            text_width_fraction: DEFAULT_TEXT_WIDTH_FRACTION,
        };
        let layout = layout_text(&el, el.as_text().unwrap(), &ctx);
        assert!((layout.max_width - 1000.0).abs() < 1e-3);
        assert_eq!(layout.lines, vec!["Tap to edit".to_string()]);
    }

    #[test]
    fn text_bounds_scale_with_element() {
        let mut el = create_text_element("abcd", Point::new(500.0, 0.0));
        if let ElementKind::Text(t) = &mut el.kind {
            t.font_size = 20.0;
            t.line_height = 1.5;
            t.align = TextAlign::Left;
        }
        let ctx = LayoutContext::new(&Mono, 1000.0);
        let b1 = element_bounds(&el, &ctx);
        assert_eq!(b1, Rect::new(500.0, 0.0, 40.0, 30.0));

        el.scale = 2.0;
        let b2 = element_bounds(&el, &ctx);
        assert_eq!(b2, Rect::new(500.0, 0.0, 80.0, 60.0));
    }

    #[test]
    fn scaling_wrapped_text_keeps_its_line_breaks() {
        let mut el = create_text_element("one two three four", Point::new(0.0, 0.0));
        if let ElementKind::Text(t) = &mut el.kind {
            t.font_size = 20.0;
            t.letter_spacing = 0.0;
        }
        // 100 px frame: "one two" is 70 px, "one two three" 130 px.
        let ctx = LayoutContext {
            measure: &Mono,
            canvas_width: 100.0,
            text_width_fraction: 1.0,
        };
        let before = layout_text(&el, el.as_text().unwrap(), &ctx);
        assert_eq!(before.lines, vec!["one two", "three four"]);

        for scale in [0.5, 2.0, 3.0] {
            el.scale = scale;
            let after = layout_text(&el, el.as_text().unwrap(), &ctx);
            assert_eq!(after.lines, before.lines, "scale {scale}");
            assert!((after.bounds.width - before.bounds.width * scale).abs() < 1e-3);
            assert!((after.bounds.height - before.bounds.height * scale).abs() < 1e-3);
        }
    }

    #[test]
    fn mockup_and_visual_are_centered_on_position() {
        let ctx = LayoutContext::new(&Mono, 1284.0);
        let mut m = create_mockup_element("iphone-15-pro", None, Point::new(642.0, 1400.0));
        m.scale = 0.5;
        assert_eq!(element_bounds(&m, &ctx), Rect::new(467.0, 1050.0, 350.0, 700.0));

        let v = create_visual_element("badge.png", 200.0, 100.0, Point::new(100.0, 100.0));
        assert_eq!(element_bounds(&v, &ctx), Rect::new(0.0, 50.0, 200.0, 100.0));
    }

    #[test]
    fn rotated_corners_keep_center() {
        let b = Rect::new(0.0, 0.0, 100.0, 50.0);
        let corners = rotated_corners(&b, 90.0);
        let cx = corners.iter().map(|p| p.x).sum::<f32>() / 4.0;
        let cy = corners.iter().map(|p| p.y).sum::<f32>() / 4.0;
        assert!((cx - 50.0).abs() < 1e-3 && (cy - 25.0).abs() < 1e-3);
        // Top-left moves to where the top-right of a portrait box would be.
        assert!((corners[0].x - 75.0).abs() < 1e-3);
        assert!((corners[0].y - (-25.0)).abs() < 1e-3);
    }
}
