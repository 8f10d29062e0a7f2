//! The 2D immediate-mode drawing surface the renderer paints through.
//!
//! Hosts supply the implementation: Canvas2D in the browser, a Vello scene
//! for native export, or the [`crate::display_list::DisplayList`] recorder
//! in tests. All coordinates are logical canvas units; the surface owns the
//! mapping to device pixels.

use sd_core::Color;
use sd_core::geometry::{Point, Rect};
use sd_core::layout::{FontSpec, TextMeasure};

/// Anything the surface can draw as a bitmap.
pub trait SurfaceImage {
    /// Intrinsic size in pixels.
    fn size(&self) -> (f32, f32);
}

/// How a closed shape is filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillStyle {
    Solid(Color),
    /// Two-stop linear gradient between two points.
    Linear {
        from: Point,
        to: Point,
        start: Color,
        end: Color,
    },
}

/// Stroke parameters. Widths and dash lengths are logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f32,
    /// `(on, off)` dash pattern.
    pub dash: Option<(f32, f32)>,
}

impl StrokeStyle {
    pub fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub fn dashed(color: Color, width: f32, on: f32, off: f32) -> Self {
        Self {
            color,
            width,
            dash: Some((on, off)),
        }
    }
}

/// The primitive set the renderer needs. State calls nest like Canvas2D's
/// `save`/`restore`: transforms, alpha and clips pushed after a `save` are
/// undone by the matching `restore`.
pub trait Surface: TextMeasure {
    type Image: SurfaceImage;

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    /// Rotate clockwise by `degrees` about the current origin.
    fn rotate(&mut self, degrees: f32);
    /// Multiply the current global alpha.
    fn set_alpha(&mut self, alpha: f32);

    fn fill_rect(&mut self, rect: Rect, fill: &FillStyle);
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, fill: &FillStyle);
    fn stroke_rect(&mut self, rect: Rect, stroke: &StrokeStyle);
    fn fill_circle(&mut self, center: Point, radius: f32, fill: &FillStyle);
    fn stroke_circle(&mut self, center: Point, radius: f32, stroke: &StrokeStyle);
    fn stroke_line(&mut self, from: Point, to: Point, stroke: &StrokeStyle);
    /// Intersect the clip with a rounded rectangle.
    fn clip_rounded_rect(&mut self, rect: Rect, radius: f32);

    /// Draw `image` stretched into `dest`.
    fn draw_image(&mut self, image: &Self::Image, dest: Rect);

    /// Draw a run of text with its top-left corner at `origin`.
    fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, color: Color);
}
