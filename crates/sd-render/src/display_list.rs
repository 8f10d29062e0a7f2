//! A recording surface.
//!
//! Captures every draw call as a [`DrawCmd`]. Two render passes over equal
//! inputs produce equal lists, which is how determinism is checked, and the
//! headless exporter replays the list onto a real surface.

use crate::surface::{FillStyle, StrokeStyle, Surface, SurfaceImage};
use sd_core::Color;
use sd_core::geometry::{Point, Rect};
use sd_core::layout::{ApproxMeasure, FontSpec, TextMeasure};

/// Stand-in bitmap: a key and a size.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedImage {
    pub key: String,
    pub width: f32,
    pub height: f32,
}

impl RecordedImage {
    pub fn new(key: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            key: key.into(),
            width,
            height,
        }
    }
}

impl SurfaceImage for RecordedImage {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Save,
    Restore,
    Translate(f32, f32),
    Rotate(f32),
    Alpha(f32),
    FillRect(Rect, FillStyle),
    FillRoundedRect(Rect, f32, FillStyle),
    StrokeRect(Rect, StrokeStyle),
    FillCircle(Point, f32, FillStyle),
    StrokeCircle(Point, f32, StrokeStyle),
    Line(Point, Point, StrokeStyle),
    ClipRoundedRect(Rect, f32),
    Image(String, Rect),
    Text {
        text: String,
        origin: Point,
        font: FontSpec,
        color: Color,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    pub commands: Vec<DrawCmd>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Every text run drawn, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCmd::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Every image drawn, in order.
    pub fn images(&self) -> Vec<(&str, Rect)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCmd::Image(key, rect) => Some((key.as_str(), *rect)),
                _ => None,
            })
            .collect()
    }

    /// Dashed rectangles, i.e. selection outlines.
    pub fn dashed_rects(&self) -> Vec<Rect> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCmd::StrokeRect(rect, stroke) if stroke.dash.is_some() => Some(*rect),
                _ => None,
            })
            .collect()
    }

    /// Replay onto another surface. `resolve` maps recorded image keys to
    /// that surface's images; unresolved images are skipped.
    pub fn replay<S: Surface>(
        &self,
        target: &mut S,
        mut resolve: impl FnMut(&str) -> Option<S::Image>,
    ) {
        for cmd in &self.commands {
            match cmd {
                DrawCmd::Save => target.save(),
                DrawCmd::Restore => target.restore(),
                DrawCmd::Translate(dx, dy) => target.translate(*dx, *dy),
                DrawCmd::Rotate(deg) => target.rotate(*deg),
                DrawCmd::Alpha(a) => target.set_alpha(*a),
                DrawCmd::FillRect(r, f) => target.fill_rect(*r, f),
                DrawCmd::FillRoundedRect(r, radius, f) => target.fill_rounded_rect(*r, *radius, f),
                DrawCmd::StrokeRect(r, s) => target.stroke_rect(*r, s),
                DrawCmd::FillCircle(c, radius, f) => target.fill_circle(*c, *radius, f),
                DrawCmd::StrokeCircle(c, radius, s) => target.stroke_circle(*c, *radius, s),
                DrawCmd::Line(a, b, s) => target.stroke_line(*a, *b, s),
                DrawCmd::ClipRoundedRect(r, radius) => target.clip_rounded_rect(*r, *radius),
                DrawCmd::Image(key, dest) => {
                    if let Some(img) = resolve(key) {
                        target.draw_image(&img, *dest);
                    }
                }
                DrawCmd::Text {
                    text,
                    origin,
                    font,
                    color,
                } => target.fill_text(text, *origin, font, *color),
            }
        }
    }
}

impl TextMeasure for DisplayList {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        ApproxMeasure.measure(text, font)
    }
}

impl Surface for DisplayList {
    type Image = RecordedImage;

    fn save(&mut self) {
        self.commands.push(DrawCmd::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCmd::Restore);
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.commands.push(DrawCmd::Translate(dx, dy));
    }

    fn rotate(&mut self, degrees: f32) {
        self.commands.push(DrawCmd::Rotate(degrees));
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.commands.push(DrawCmd::Alpha(alpha));
    }

    fn fill_rect(&mut self, rect: Rect, fill: &FillStyle) {
        self.commands.push(DrawCmd::FillRect(rect, *fill));
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, fill: &FillStyle) {
        self.commands
            .push(DrawCmd::FillRoundedRect(rect, radius, *fill));
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: &StrokeStyle) {
        self.commands.push(DrawCmd::StrokeRect(rect, *stroke));
    }

    fn fill_circle(&mut self, center: Point, radius: f32, fill: &FillStyle) {
        self.commands.push(DrawCmd::FillCircle(center, radius, *fill));
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, stroke: &StrokeStyle) {
        self.commands
            .push(DrawCmd::StrokeCircle(center, radius, *stroke));
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: &StrokeStyle) {
        self.commands.push(DrawCmd::Line(from, to, *stroke));
    }

    fn clip_rounded_rect(&mut self, rect: Rect, radius: f32) {
        self.commands.push(DrawCmd::ClipRoundedRect(rect, radius));
    }

    fn draw_image(&mut self, image: &RecordedImage, dest: Rect) {
        self.commands.push(DrawCmd::Image(image.key.clone(), dest));
    }

    fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, color: Color) {
        self.commands.push(DrawCmd::Text {
            text: text.to_string(),
            origin,
            font: font.clone(),
            color,
        });
    }
}
