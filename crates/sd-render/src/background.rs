//! Canvas backgrounds, including the gradient that flows across canvases.
//!
//! A gradient is defined once for the whole row of canvases. Horizontal
//! directions slice it: canvas `i` of `n` shows the colors between offsets
//! `i/n` and `(i+1)/n`, so neighbours meet with the same color. Vertical
//! directions run the full gradient on every canvas.

use crate::assets::{AssetCache, BACKGROUND_SLOT, fit_image};
use crate::surface::{FillStyle, Surface, SurfaceImage};
use sd_core::geometry::{Point, Rect, interpolate_color};
use sd_core::{Background, Color, GradientAngle};

/// Upper bound on tiles drawn for a tiled background image.
const MAX_TILES: usize = 4096;

/// Local start/end colors of canvas `index` of `count`, in the direction
/// of the gradient axis on that canvas.
pub fn slice_colors(
    start: Color,
    end: Color,
    angle: GradientAngle,
    index: usize,
    count: usize,
) -> (Color, Color) {
    if !angle.is_horizontal() {
        return (start, end);
    }
    let n = count.max(1) as f32;
    let t0 = index as f32 / n;
    let t1 = (index + 1) as f32 / n;
    match angle {
        GradientAngle::ToLeft => (
            interpolate_color(start, end, 1.0 - t0),
            interpolate_color(start, end, 1.0 - t1),
        ),
        _ => (
            interpolate_color(start, end, t0),
            interpolate_color(start, end, t1),
        ),
    }
}

/// Fill style for one canvas slice of the overall gradient.
///
/// Horizontal slices always run left → right on the canvas (the colors
/// are already swapped for right-to-left). Vertical gradients run from the
/// edge the start color sits on.
pub fn gradient_fill(
    start: Color,
    end: Color,
    angle: GradientAngle,
    index: usize,
    count: usize,
    size: (f32, f32),
) -> FillStyle {
    let (w, h) = size;
    let (c0, c1) = slice_colors(start, end, angle, index, count);
    let (from, to) = match angle {
        GradientAngle::ToRight | GradientAngle::ToLeft => {
            (Point::new(0.0, h / 2.0), Point::new(w, h / 2.0))
        }
        GradientAngle::ToBottom => (Point::new(w / 2.0, 0.0), Point::new(w / 2.0, h)),
        GradientAngle::ToTop => (Point::new(w / 2.0, h), Point::new(w / 2.0, 0.0)),
    };
    FillStyle::Linear {
        from,
        to,
        start: c0,
        end: c1,
    }
}

/// Paint the background of canvas `index` of `count`.
pub fn paint_background<S: Surface>(
    surface: &mut S,
    background: &Background,
    index: usize,
    count: usize,
    size: (f32, f32),
    assets: &AssetCache<S::Image>,
) {
    let area = Rect::new(0.0, 0.0, size.0, size.1);
    match background {
        Background::Solid { color } => surface.fill_rect(area, &FillStyle::Solid(*color)),
        Background::Gradient { start, end, angle } => {
            let fill = gradient_fill(*start, *end, *angle, index, count, size);
            surface.fill_rect(area, &fill);
        }
        Background::Image { url, fit, opacity } => {
            surface.fill_rect(area, &FillStyle::Solid(Color::WHITE));
            let Some(image) = assets.get(BACKGROUND_SLOT) else {
                log::trace!("background {url} not loaded yet");
                return;
            };
            surface.save();
            surface.clip_rounded_rect(area, 0.0);
            surface.set_alpha(opacity.clamp(0.0, 1.0));
            for dest in fit_image(*fit, image.size(), size, MAX_TILES) {
                surface.draw_image(image, dest);
            }
            surface.restore();
        }
    }
}
