//! Vello scene surface for native export.
//!
//! Emits fills, strokes, clips and images into a `vello::Scene`. The
//! caller presents or rasterizes the scene. Text needs a shaping context
//! and is not drawn here yet; export hosts that need text replay a
//! [`crate::display_list::DisplayList`] onto a text-capable surface.

use crate::assets::DecodedImage;
use crate::surface::{FillStyle, StrokeStyle, Surface, SurfaceImage};
use kurbo::{Affine, Circle, Line, Rect as KRect, RoundedRect, Shape, Stroke};
use peniko::{Blob, Fill, Gradient, ImageFormat as Format, Image, Mix};
use sd_core::geometry::{Point, Rect};
use sd_core::layout::{ApproxMeasure, FontSpec, TextMeasure};
use sd_core::Color;
use vello::Scene;

impl SurfaceImage for Image {
    fn size(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }
}

/// Wrap a decoded bitmap for drawing with Vello.
pub fn image_from_decoded(decoded: &DecodedImage) -> Image {
    Image::new(
        Blob::new(decoded.rgba8_premul.clone()),
        Format::Rgba8,
        decoded.width,
        decoded.height,
    )
}

#[derive(Debug, Clone, Copy)]
struct State {
    transform: Affine,
    alpha: f32,
    /// Clip layers pushed since the matching `save`.
    layers: usize,
}

impl Default for State {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            alpha: 1.0,
            layers: 0,
        }
    }
}

pub struct VelloSurface {
    pub scene: Scene,
    state: State,
    stack: Vec<State>,
}

impl Default for VelloSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloSurface {
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            state: State::default(),
            stack: Vec::new(),
        }
    }

    /// Start a fresh frame with `base` as the root transform (e.g. a
    /// logical → device pixel scale).
    pub fn reset(&mut self, base: Affine) {
        self.scene.reset();
        self.stack.clear();
        self.state = State {
            transform: base,
            ..State::default()
        };
    }

    fn color(&self, c: Color) -> peniko::Color {
        let [r, g, b, a] = c.with_opacity(self.state.alpha).to_rgba8();
        peniko::Color::from_rgba8(r, g, b, a)
    }

    fn fill_shape(&mut self, shape: &impl Shape, fill: &FillStyle) {
        let t = self.state.transform;
        match *fill {
            FillStyle::Solid(c) => {
                let color = self.color(c);
                self.scene.fill(Fill::NonZero, t, color, None, shape);
            }
            FillStyle::Linear {
                from,
                to,
                start,
                end,
            } => {
                let gradient = Gradient::new_linear(pt(from), pt(to))
                    .with_stops([self.color(start), self.color(end)]);
                self.scene.fill(Fill::NonZero, t, &gradient, None, shape);
            }
        }
    }

    fn stroke_shape(&mut self, shape: &impl Shape, stroke: &StrokeStyle) {
        let mut ks = Stroke::new(stroke.width as f64);
        if let Some((on, off)) = stroke.dash {
            ks = ks.with_dashes(0.0, [on as f64, off as f64]);
        }
        let color = self.color(stroke.color);
        self.scene
            .stroke(&ks, self.state.transform, color, None, shape);
    }
}

fn pt(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x as f64, p.y as f64)
}

fn krect(r: Rect) -> KRect {
    KRect::new(
        r.x as f64,
        r.y as f64,
        r.right() as f64,
        r.bottom() as f64,
    )
}

fn rounded(r: Rect, radius: f32) -> RoundedRect {
    let radius = radius.min(r.width / 2.0).min(r.height / 2.0).max(0.0);
    krect(r).to_rounded_rect(radius as f64)
}

impl TextMeasure for VelloSurface {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        ApproxMeasure.measure(text, font)
    }
}

impl Surface for VelloSurface {
    type Image = Image;

    fn save(&mut self) {
        self.stack.push(self.state);
        self.state.layers = 0;
    }

    fn restore(&mut self) {
        for _ in 0..self.state.layers {
            self.scene.pop_layer();
        }
        self.state = self.stack.pop().unwrap_or_default();
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.state.transform *= Affine::translate((dx as f64, dy as f64));
    }

    fn rotate(&mut self, degrees: f32) {
        self.state.transform *= Affine::rotate((degrees as f64).to_radians());
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha *= alpha.clamp(0.0, 1.0);
    }

    fn fill_rect(&mut self, rect: Rect, fill: &FillStyle) {
        self.fill_shape(&krect(rect), fill);
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, fill: &FillStyle) {
        self.fill_shape(&rounded(rect, radius), fill);
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: &StrokeStyle) {
        self.stroke_shape(&krect(rect), stroke);
    }

    fn fill_circle(&mut self, center: Point, radius: f32, fill: &FillStyle) {
        self.fill_shape(&Circle::new(pt(center), radius as f64), fill);
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, stroke: &StrokeStyle) {
        self.stroke_shape(&Circle::new(pt(center), radius as f64), stroke);
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: &StrokeStyle) {
        self.stroke_shape(&Line::new(pt(from), pt(to)), stroke);
    }

    fn clip_rounded_rect(&mut self, rect: Rect, radius: f32) {
        self.scene
            .push_layer(Mix::Clip, 1.0, self.state.transform, &rounded(rect, radius));
        self.state.layers += 1;
    }

    fn draw_image(&mut self, image: &Image, dest: Rect) {
        let (w, h) = image.size();
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let t = self.state.transform
            * Affine::translate((dest.x as f64, dest.y as f64))
            * Affine::scale_non_uniform((dest.width / w) as f64, (dest.height / h) as f64);
        if self.state.alpha < 1.0 {
            let faded = image.clone().with_alpha(self.state.alpha);
            self.scene.draw_image(&faded, t);
        } else {
            self.scene.draw_image(image, t);
        }
    }

    fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, _color: Color) {
        // Full text shaping requires a font context; not wired into the
        // Vello path yet.
        log::trace!("TEXT {:?} {} at ({}, {})", text, font.css(), origin.x, origin.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_pops_clip_layers_and_state() {
        let mut s = VelloSurface::new();
        s.save();
        s.translate(10.0, 0.0);
        s.set_alpha(0.5);
        s.clip_rounded_rect(Rect::new(0.0, 0.0, 10.0, 10.0), 2.0);
        s.clip_rounded_rect(Rect::new(0.0, 0.0, 5.0, 5.0), 0.0);
        assert_eq!(s.state.layers, 2);
        s.restore();
        assert_eq!(s.state.layers, 0);
        assert_eq!(s.state.alpha, 1.0);
        assert_eq!(s.state.transform, Affine::IDENTITY);
        assert!(s.stack.is_empty());
    }

    #[test]
    fn decoded_image_keeps_size() {
        let decoded = DecodedImage {
            width: 4,
            height: 2,
            rgba8_premul: std::sync::Arc::new(vec![0; 32]),
        };
        assert_eq!(image_from_decoded(&decoded).size(), (4.0, 2.0));
    }
}
