//! Text element drawing.
//!
//! Surfaces draw plain runs only, so letter spacing is applied here by
//! placing each glyph individually.

use crate::surface::Surface;
use sd_core::geometry::Point;
use sd_core::layout::{FontSpec, TextLayout, TextMeasure};
use sd_core::{Color, Element, TextElement};

/// One positioned run of text.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub text: String,
    /// Top-left corner of the run.
    pub origin: Point,
}

/// Split a laid-out text element into positioned runs, in unrotated local
/// space. Without letter spacing there is one run per line.
pub fn glyph_runs(
    el: &Element,
    text: &TextElement,
    layout: &TextLayout,
    measure: &dyn TextMeasure,
) -> Vec<GlyphRun> {
    // Glyphs sit vertically centered in their line box.
    let leading = (layout.line_advance - layout.font.size) / 2.0;
    let mut runs = Vec::new();

    for (i, line) in layout.lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let y = layout.bounds.y + i as f32 * layout.line_advance + leading;
        let mut x = layout.line_x(i, el.position.x, text.align);

        if layout.letter_spacing == 0.0 {
            runs.push(GlyphRun {
                text: line.clone(),
                origin: Point::new(x, y),
            });
            continue;
        }
        let mut buf = [0u8; 4];
        for ch in line.chars() {
            let glyph: &str = ch.encode_utf8(&mut buf);
            runs.push(GlyphRun {
                text: glyph.to_string(),
                origin: Point::new(x, y),
            });
            x += measure.measure(glyph, &layout.font) + layout.letter_spacing;
        }
    }
    runs
}

/// Draw prepared runs. The caller has already applied the element's
/// rotation about its bounds center.
pub fn paint_runs<S: Surface>(surface: &mut S, runs: &[GlyphRun], font: &FontSpec, color: Color) {
    for run in runs {
        surface.fill_text(&run.text, run.origin, font, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sd_core::layout::{LayoutContext, layout_text};
    use sd_core::{TextAlign, create_text_element};

    struct Mono;
    impl TextMeasure for Mono {
        fn measure(&self, text: &str, font: &FontSpec) -> f32 {
            text.chars().count() as f32 * font.size * 0.5
        }
    }

    fn el(content: &str, align: TextAlign, spacing: f32) -> Element {
        let mut el = create_text_element(content, Point::new(500.0, 100.0));
        if let sd_core::ElementKind::Text(t) = &mut el.kind {
            t.font_size = 20.0;
            t.line_height = 1.5;
            t.align = align;
            t.letter_spacing = spacing;
        }
        el
    }

    #[test]
    fn lines_follow_alignment_and_line_height() {
        let el = el("abcd\nab", TextAlign::Right, 0.0);
        let text = el.as_text().unwrap();
        let layout = layout_text(&el, text, &LayoutContext::new(&Mono, 1000.0));
        let runs = glyph_runs(&el, text, &layout, &Mono);
        assert_eq!(
            runs,
            vec![
                GlyphRun {
                    text: "abcd".into(),
                    origin: Point::new(460.0, 105.0)
                },
                GlyphRun {
                    text: "ab".into(),
                    origin: Point::new(480.0, 135.0)
                },
            ]
        );
    }

    #[test]
    fn letter_spacing_places_each_glyph() {
        let el = el("abc", TextAlign::Left, 4.0);
        let text = el.as_text().unwrap();
        let layout = layout_text(&el, text, &LayoutContext::new(&Mono, 1000.0));
        let xs: Vec<f32> = glyph_runs(&el, text, &layout, &Mono)
            .iter()
            .map(|r| r.origin.x)
            .collect();
        assert_eq!(xs, vec![500.0, 514.0, 528.0]);
        // Spaced width: 3 glyphs of 10 plus two gaps of 4.
        assert_eq!(layout.widths, vec![38.0]);
    }
}
