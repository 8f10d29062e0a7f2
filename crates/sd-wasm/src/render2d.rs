//! Canvas2D drawing surface.
//!
//! Implements the renderer's [`Surface`] on a `CanvasRenderingContext2d`.
//! The renderer draws in logical canvas units; [`Canvas2d::begin`] installs
//! the view transform that maps them to device pixels.

use sd_core::geometry::{Point, Rect};
use sd_core::layout::{FontSpec, TextMeasure};
use sd_core::{Color, ScreenPoint, ViewTransform};
use sd_render::{FillStyle, StrokeStyle, Surface, SurfaceImage};
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

const MARQUEE_FILL: &str = "rgba(79, 195, 247, 0.08)";
const MARQUEE_STROKE: &str = "#4FC3F7";

/// A loaded `<img>` the renderer can draw.
#[derive(Debug, Clone)]
pub struct BrowserImage(pub HtmlImageElement);

impl SurfaceImage for BrowserImage {
    fn size(&self) -> (f32, f32) {
        (
            self.0.natural_width() as f32,
            self.0.natural_height() as f32,
        )
    }
}

pub struct Canvas2d<'a> {
    ctx: &'a CanvasRenderingContext2d,
}

impl<'a> Canvas2d<'a> {
    /// Clear the whole backing store and map logical units through `view`.
    pub fn begin(
        ctx: &'a CanvasRenderingContext2d,
        view: &ViewTransform,
        width: f64,
        height: f64,
    ) -> Self {
        let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        ctx.clear_rect(0.0, 0.0, width, height);
        ctx.set_global_alpha(1.0);
        let f = view.factor() as f64;
        let _ = ctx.set_transform(
            f,
            0.0,
            0.0,
            f,
            view.origin.x as f64,
            view.origin.y as f64,
        );
        Self { ctx }
    }

    fn apply_fill(&self, fill: &FillStyle) {
        match *fill {
            FillStyle::Solid(color) => self.ctx.set_fill_style_str(&color.to_hex()),
            FillStyle::Linear {
                from,
                to,
                start,
                end,
            } => {
                let grad = self.ctx.create_linear_gradient(
                    from.x as f64,
                    from.y as f64,
                    to.x as f64,
                    to.y as f64,
                );
                let _ = grad.add_color_stop(0.0, &start.to_hex());
                let _ = grad.add_color_stop(1.0, &end.to_hex());
                self.ctx.set_fill_style_canvas_gradient(&grad);
            }
        }
    }

    fn apply_stroke(&self, stroke: &StrokeStyle) {
        self.ctx.set_stroke_style_str(&stroke.color.to_hex());
        self.ctx.set_line_width(stroke.width as f64);
        let dash = match stroke.dash {
            Some((on, off)) => js_sys::Array::of2(
                &JsValue::from_f64(on as f64),
                &JsValue::from_f64(off as f64),
            ),
            None => js_sys::Array::new(),
        };
        let _ = self.ctx.set_line_dash(&dash);
    }

    fn circle_path(&self, center: Point, radius: f32) {
        self.ctx.begin_path();
        let _ = self.ctx.arc(
            center.x as f64,
            center.y as f64,
            radius.max(0.0) as f64,
            0.0,
            std::f64::consts::TAU,
        );
    }
}

impl TextMeasure for Canvas2d<'_> {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        measure_with(self.ctx, text, font)
    }
}

impl Surface for Canvas2d<'_> {
    type Image = BrowserImage;

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        let _ = self.ctx.translate(dx as f64, dy as f64);
    }

    fn rotate(&mut self, degrees: f32) {
        let _ = self.ctx.rotate((degrees as f64).to_radians());
    }

    fn set_alpha(&mut self, alpha: f32) {
        let current = self.ctx.global_alpha();
        self.ctx.set_global_alpha(current * alpha.clamp(0.0, 1.0) as f64);
    }

    fn fill_rect(&mut self, rect: Rect, fill: &FillStyle) {
        self.apply_fill(fill);
        self.ctx.fill_rect(
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
        );
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, fill: &FillStyle) {
        rounded_rect_path(self.ctx, rect, radius);
        self.apply_fill(fill);
        self.ctx.fill();
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: &StrokeStyle) {
        self.apply_stroke(stroke);
        self.ctx.stroke_rect(
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
        );
    }

    fn fill_circle(&mut self, center: Point, radius: f32, fill: &FillStyle) {
        self.circle_path(center, radius);
        self.apply_fill(fill);
        self.ctx.fill();
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, stroke: &StrokeStyle) {
        self.circle_path(center, radius);
        self.apply_stroke(stroke);
        self.ctx.stroke();
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: &StrokeStyle) {
        self.apply_stroke(stroke);
        self.ctx.begin_path();
        self.ctx.move_to(from.x as f64, from.y as f64);
        self.ctx.line_to(to.x as f64, to.y as f64);
        self.ctx.stroke();
    }

    fn clip_rounded_rect(&mut self, rect: Rect, radius: f32) {
        rounded_rect_path(self.ctx, rect, radius);
        self.ctx.clip();
    }

    fn draw_image(&mut self, image: &BrowserImage, dest: Rect) {
        if let Err(e) = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
            &image.0,
            dest.x as f64,
            dest.y as f64,
            dest.width as f64,
            dest.height as f64,
        ) {
            log::debug!("drawImage failed: {e:?}");
        }
    }

    fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, color: Color) {
        self.ctx.set_font(&font.css());
        self.ctx.set_text_align("left");
        self.ctx.set_text_baseline("top");
        self.ctx.set_fill_style_str(&color.to_hex());
        let _ = self.ctx.fill_text(text, origin.x as f64, origin.y as f64);
    }
}

/// Text measurement against a long-lived context, for layout outside a
/// render pass (hit-testing, gestures).
pub struct ContextMeasure(pub CanvasRenderingContext2d);

impl TextMeasure for ContextMeasure {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        self.0.save();
        let width = measure_with(&self.0, text, font);
        self.0.restore();
        width
    }
}

fn measure_with(ctx: &CanvasRenderingContext2d, text: &str, font: &FontSpec) -> f32 {
    ctx.set_font(&font.css());
    ctx.measure_text(text)
        .map(|m| m.width() as f32)
        .unwrap_or(0.0)
}

/// Draw the rubber band in screen pixels, on top of everything.
pub fn draw_marquee(ctx: &CanvasRenderingContext2d, from: ScreenPoint, to: ScreenPoint) {
    let (x, y) = (from.x.min(to.x) as f64, from.y.min(to.y) as f64);
    let (w, h) = ((to.x - from.x).abs() as f64, (to.y - from.y).abs() as f64);
    if w < 1.0 && h < 1.0 {
        return;
    }

    ctx.save();
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.set_fill_style_str(MARQUEE_FILL);
    ctx.fill_rect(x, y, w, h);
    ctx.set_stroke_style_str(MARQUEE_STROKE);
    ctx.set_line_width(1.0);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &JsValue::from_f64(4.0),
        &JsValue::from_f64(4.0),
    ));
    ctx.stroke_rect(x, y, w, h);
    ctx.restore();
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, rect: Rect, r: f32) {
    let (x, y, w, h) = (
        rect.x as f64,
        rect.y as f64,
        rect.width as f64,
        rect.height as f64,
    );
    let r = (r.max(0.0) as f64).min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}
