//! Canvas → drawing surface.
//!
//! One read-only pass per canvas: background, elements in paint order,
//! then editor overlays. The pass holds no state between calls, so equal
//! inputs always produce the same sequence of draw calls.

use crate::assets::{AssetCache, frame_slot, mockup_source, screenshot_slot, visual_slot};
use crate::background::paint_background;
use crate::fonts::{FallbackMeasure, FontBook};
use crate::hit::{HandleMetrics, handle_positions};
use crate::surface::{FillStyle, StrokeStyle, Surface, SurfaceImage};
use crate::text::{GlyphRun, glyph_runs, paint_runs};
use sd_core::geometry::{Point, Rect};
use sd_core::layout::{
    DEFAULT_TEXT_WIDTH_FRACTION, FontSpec, LayoutContext, TextMeasure, element_bounds, layout_text,
};
use sd_core::{
    CanvasInstance, Color, DeviceClass, Element, ElementId, ElementKind, GlobalSettings,
    MockupElement, SceneModel, VisualElement,
};

const FRAME_COLOR: Color = Color::rgba(0.11, 0.11, 0.12, 1.0);
const SCREEN_PLACEHOLDER: Color = Color::rgba(0.23, 0.23, 0.25, 1.0);
const SELECTION_COLOR: Color = Color::rgba(0.31, 0.76, 0.97, 1.0);
const HOVER_COLOR: Color = Color::rgba(0.31, 0.76, 0.97, 0.5);

/// Editor decorations drawn on top of the canvas. [`Overlay::none`] for
/// export passes.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub selected: Vec<ElementId>,
    pub hovered: Option<ElementId>,
    /// Text element being edited in place; not drawn by the renderer.
    pub editing: Option<ElementId>,
    /// Handles for a single selected element.
    pub handles: Option<HandleMetrics>,
    /// Logical units per screen pixel, for zoom-independent line widths.
    pub px: f32,
}

impl Overlay {
    pub fn none() -> Self {
        Self {
            selected: Vec::new(),
            hovered: None,
            editing: None,
            handles: None,
            px: 1.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.hovered.is_none()
    }
}

impl Default for Overlay {
    fn default() -> Self {
        Self::none()
    }
}

/// Everything one render pass reads.
pub struct RenderInput<'a, I> {
    pub scene: &'a SceneModel,
    pub canvas_index: usize,
    pub assets: &'a AssetCache<I>,
    pub fonts: &'a FontBook,
    pub overlay: &'a Overlay,
    pub text_width_fraction: f32,
}

impl<'a, I> RenderInput<'a, I> {
    /// Export pass: no overlays.
    pub fn export(
        scene: &'a SceneModel,
        canvas_index: usize,
        assets: &'a AssetCache<I>,
        fonts: &'a FontBook,
    ) -> Self {
        static NONE: std::sync::LazyLock<Overlay> = std::sync::LazyLock::new(Overlay::none);
        Self {
            scene,
            canvas_index,
            assets,
            fonts,
            overlay: &NONE,
            text_width_fraction: DEFAULT_TEXT_WIDTH_FRACTION,
        }
    }
}

/// Layout context for a canvas of the given settings.
pub fn layout_context<'a>(
    measure: &'a dyn TextMeasure,
    settings: &GlobalSettings,
    text_width_fraction: f32,
) -> LayoutContext<'a> {
    LayoutContext {
        measure,
        canvas_width: settings.device_class().canvas_size().0,
        text_width_fraction,
    }
}

/// Render one canvas. Missing canvases draw nothing.
pub fn render_canvas<S: Surface>(surface: &mut S, input: &RenderInput<'_, S::Image>) {
    let scene = input.scene;
    let Some(canvas) = scene.canvas(input.canvas_index) else {
        log::debug!("render of missing canvas {}", input.canvas_index);
        return;
    };
    let settings = scene.settings();
    let size = settings.device_class().canvas_size();

    paint_background(
        surface,
        &settings.background,
        input.canvas_index,
        scene.canvases().len(),
        size,
        input.assets,
    );

    // Layout is computed up front: the surface is both the measurer and the
    // draw target, and cannot be borrowed as both at once.
    let plans: Vec<Plan<'_>> = {
        let measure = FallbackMeasure {
            book: input.fonts,
            inner: &*surface,
        };
        let ctx = layout_context(&measure, settings, input.text_width_fraction);
        canvas
            .paint_order()
            .into_iter()
            .map(|el| match &el.kind {
                ElementKind::Text(t) => {
                    let layout = layout_text(el, t, &ctx);
                    Plan {
                        el,
                        bounds: layout.bounds,
                        text: Some(PlannedText {
                            runs: glyph_runs(el, t, &layout, &measure),
                            font: input.fonts.resolve_spec(&layout.font),
                            color: t.color,
                        }),
                    }
                }
                _ => Plan {
                    el,
                    bounds: element_bounds(el, &ctx),
                    text: None,
                },
            })
            .collect()
    };

    for plan in &plans {
        let el = plan.el;
        if input.overlay.editing == Some(el.id) {
            continue;
        }
        log::trace!("paint {} {:?}", el.id, plan.bounds);
        surface.save();
        rotate_about(surface, plan.bounds.center(), el.rotation);
        match &el.kind {
            ElementKind::Mockup(m) => {
                paint_mockup(surface, canvas, el, m, &plan.bounds, input.assets)
            }
            ElementKind::Visual(v) => paint_visual(surface, v, &plan.bounds, input.assets),
            ElementKind::Text(_) => {
                if let Some(text) = &plan.text {
                    paint_runs(surface, &text.runs, &text.font, text.color);
                }
            }
        }
        surface.restore();
    }

    paint_overlays(surface, &plans, input.overlay);
}

struct PlannedText {
    runs: Vec<GlyphRun>,
    font: FontSpec,
    color: Color,
}

/// An element with its layout resolved for one pass.
struct Plan<'a> {
    el: &'a Element,
    bounds: Rect,
    text: Option<PlannedText>,
}

fn rotate_about<S: Surface>(surface: &mut S, center: Point, degrees: f32) {
    if degrees == 0.0 {
        return;
    }
    surface.translate(center.x, center.y);
    surface.rotate(degrees);
    surface.translate(-center.x, -center.y);
}

fn paint_mockup<S: Surface>(
    surface: &mut S,
    canvas: &CanvasInstance,
    el: &Element,
    m: &MockupElement,
    bounds: &Rect,
    assets: &AssetCache<S::Image>,
) {
    let device = DeviceClass::from_frame_id(&m.device_frame);
    let radius = device.screen_corner_radius() * el.scale;
    let bezel = device.bezel() * el.scale;
    let frame = assets.get(&frame_slot(&m.device_frame));

    if frame.is_none() {
        surface.fill_rounded_rect(*bounds, radius + bezel, &FillStyle::Solid(FRAME_COLOR));
    }

    let screen = bounds.inflate(-bezel);
    surface.save();
    surface.clip_rounded_rect(screen, radius);
    let shot = mockup_source(canvas, m.screenshot.as_deref())
        .and_then(|src| assets.get(&screenshot_slot(src)));
    match shot {
        Some(image) => surface.draw_image(image, cover_rect(image.size(), &screen)),
        None => {
            log::trace!("mockup {} without screenshot", el.id);
            surface.fill_rect(screen, &FillStyle::Solid(SCREEN_PLACEHOLDER));
        }
    }
    surface.restore();

    if let Some(frame) = frame {
        surface.draw_image(frame, *bounds);
    }
}

fn paint_visual<S: Surface>(
    surface: &mut S,
    v: &VisualElement,
    bounds: &Rect,
    assets: &AssetCache<S::Image>,
) {
    let Some(image) = assets.get(&visual_slot(&v.asset)) else {
        log::trace!("visual {} not loaded", v.asset);
        return;
    };
    surface.save();
    surface.set_alpha(v.opacity.clamp(0.0, 1.0));
    surface.draw_image(image, *bounds);
    surface.restore();
}

/// Scale `image` to cover `area`, centered. The caller clips.
fn cover_rect(image: (f32, f32), area: &Rect) -> Rect {
    let (iw, ih) = image;
    if iw <= 0.0 || ih <= 0.0 {
        return *area;
    }
    let s = (area.width / iw).max(area.height / ih);
    Rect::from_center(area.center(), iw * s, ih * s)
}

fn paint_overlays<S: Surface>(surface: &mut S, plans: &[Plan<'_>], overlay: &Overlay) {
    if overlay.is_empty() {
        return;
    }
    let px = overlay.px;

    if let Some(hovered) = overlay.hovered
        && !overlay.selected.contains(&hovered)
        && let Some(plan) = plans.iter().find(|p| p.el.id == hovered)
    {
        surface.save();
        rotate_about(surface, plan.bounds.center(), plan.el.rotation);
        surface.stroke_rect(plan.bounds, &StrokeStyle::solid(HOVER_COLOR, px));
        surface.restore();
    }

    let single = overlay.selected.len() == 1;
    for plan in plans.iter().filter(|p| overlay.selected.contains(&p.el.id)) {
        let bounds = &plan.bounds;
        surface.save();
        rotate_about(surface, bounds.center(), plan.el.rotation);
        surface.stroke_rect(
            *bounds,
            &StrokeStyle::dashed(SELECTION_COLOR, 2.0 * px, 6.0 * px, 4.0 * px),
        );
        if single && let Some(metrics) = &overlay.handles {
            paint_handles(surface, bounds, metrics, px);
        }
        surface.restore();
    }
}

fn paint_handles<S: Surface>(surface: &mut S, bounds: &Rect, metrics: &HandleMetrics, px: f32) {
    let positions = handle_positions(bounds, metrics);
    let edge = StrokeStyle::solid(SELECTION_COLOR, 1.5 * px);
    let (_, knob) = positions[8];

    surface.stroke_line(Point::new(knob.x, bounds.y), knob, &edge);
    for (_, center) in &positions[..8] {
        let r = Rect::from_center(*center, metrics.size, metrics.size);
        surface.fill_rect(r, &FillStyle::Solid(Color::WHITE));
        surface.stroke_rect(r, &edge);
    }
    surface.fill_circle(knob, metrics.rotate_radius, &FillStyle::Solid(Color::WHITE));
    surface.stroke_circle(knob, metrics.rotate_radius, &edge);
}
