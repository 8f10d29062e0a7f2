//! Handle-driven transforms: resize, rotate and move.
//!
//! A gesture captures the element and its bounds at pointer-down. Every
//! pointer-move recomputes the patch from that captured state and the total
//! pointer delta, so rounding never accumulates across frames.
//!
//! Resize works in the element's local frame: the logical delta is rotated
//! by `-rotation`, applied to the edge(s) the handle owns, and the center
//! shift is rotated back so the opposite edge stays put on screen.

use crate::config::EditorConfig;
use crate::input::Modifiers;
use sd_core::geometry::{Point, Rect, normalize_rotation, rotate_point};
use sd_core::layout::{LayoutContext, element_bounds};
use sd_core::{
    Element, ElementId, ElementKind, ElementPatch, SceneModel, ScreenPoint, TextAlign,
    ViewTransform,
};
use sd_render::Handle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Move,
    Resize(Handle),
    Rotate,
}

impl GestureKind {
    pub fn from_handle(handle: Handle) -> Self {
        match handle {
            Handle::Rotate => GestureKind::Rotate,
            h => GestureKind::Resize(h),
        }
    }
}

#[derive(Debug, Clone)]
struct Captured {
    element: Element,
    bounds: Rect,
}

/// An in-progress transform.
#[derive(Debug, Clone)]
pub struct Gesture {
    pub kind: GestureKind,
    pub canvas: usize,
    items: Vec<Captured>,
    start: ScreenPoint,
    start_logical: Point,
    /// Pointer angle about the element center at pointer-down (rotate).
    start_angle: f32,
}

#[derive(Debug, Clone)]
pub struct TransformController {
    config: EditorConfig,
}

impl Default for TransformController {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl TransformController {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Start a gesture on `ids`. Resize and rotate act on the last ID only.
    /// Returns `None` when none of the elements exist.
    pub fn begin(
        &self,
        scene: &SceneModel,
        ctx: &LayoutContext<'_>,
        canvas: usize,
        ids: &[ElementId],
        kind: GestureKind,
        at: ScreenPoint,
        view: &ViewTransform,
    ) -> Option<Gesture> {
        let ids = match kind {
            GestureKind::Move => ids,
            _ => ids.last().map(std::slice::from_ref).unwrap_or_default(),
        };
        let items: Vec<Captured> = ids
            .iter()
            .filter_map(|id| scene.element(canvas, *id))
            .map(|el| Captured {
                element: el.clone(),
                bounds: element_bounds(el, ctx),
            })
            .collect();
        let first = items.first()?;

        let start_logical = view.screen_to_logical(at);
        let start_angle = angle_about(first.bounds.center(), start_logical);
        log::debug!(
            "begin {:?} on {} element(s) of canvas {canvas}",
            kind,
            items.len()
        );
        Some(Gesture {
            kind,
            canvas,
            items,
            start: at,
            start_logical,
            start_angle,
        })
    }

    /// Patches for the pointer now at `at` (screen pixels).
    pub fn update(
        &self,
        gesture: &Gesture,
        at: ScreenPoint,
        view: &ViewTransform,
        modifiers: Modifiers,
    ) -> Vec<(ElementId, ElementPatch)> {
        let delta = view.screen_delta_to_logical(at.x - gesture.start.x, at.y - gesture.start.y);
        self.update_logical(gesture, delta, modifiers)
    }

    /// Patches for a total pointer delta already in logical units.
    pub fn update_logical(
        &self,
        gesture: &Gesture,
        delta: (f32, f32),
        modifiers: Modifiers,
    ) -> Vec<(ElementId, ElementPatch)> {
        match gesture.kind {
            GestureKind::Move => move_items(&gesture.items, delta, modifiers.shift),
            GestureKind::Rotate => gesture
                .items
                .iter()
                .map(|c| {
                    let current =
                        Point::new(gesture.start_logical.x + delta.0, gesture.start_logical.y + delta.1);
                    (c.element.id, self.rotate(c, gesture.start_angle, current, modifiers.shift))
                })
                .collect(),
            GestureKind::Resize(handle) => gesture
                .items
                .iter()
                .map(|c| (c.element.id, self.resize(c, handle, delta, modifiers)))
                .collect(),
        }
    }

    fn rotate(&self, c: &Captured, start_angle: f32, current: Point, snap: bool) -> ElementPatch {
        let angle = angle_about(c.bounds.center(), current);
        let mut rotation = c.element.rotation + angle - start_angle;
        if snap {
            let step = self.config.rotation_snap_degrees;
            rotation = (rotation / step).round() * step;
        }
        ElementPatch {
            rotation: Some(normalize_rotation(rotation)),
            ..Default::default()
        }
    }

    fn resize(
        &self,
        c: &Captured,
        handle: Handle,
        delta: (f32, f32),
        modifiers: Modifiers,
    ) -> ElementPatch {
        let el = &c.element;
        let b = c.bounds;
        let (hx, hy) = handle.direction();
        let local = rotate_point(Point::new(delta.0, delta.1), Point::ZERO, -el.rotation);
        // Alt anchors at the center: both edges move, so the size changes twice as fast
        let k = if modifiers.alt { 2.0 } else { 1.0 };

        let w0 = b.width.max(f32::EPSILON);
        let h0 = b.height.max(f32::EPSILON);
        let w1 = w0 + hx * local.x * k;
        let h1 = h0 + hy * local.y * k;
        // The floor only holds back elements that start above it; smaller
        // ones are bounded by the scale limits alone.
        let min = self.config.min_size;
        let floor_w = if w0 >= min.width { min.width } else { 0.0 };
        let floor_h = if h0 >= min.height { min.height } else { 0.0 };

        let stretch = handle.is_side()
            && !modifiers.shift
            && match el.kind {
                ElementKind::Visual(_) => true,
                ElementKind::Text(_) => hx != 0.0,
                ElementKind::Mockup(_) => false,
            };
        if stretch {
            let w = if hx != 0.0 { w1.max(floor_w) } else { w0 };
            let h = if hy != 0.0 { h1.max(floor_h) } else { h0 };
            return stretch_patch(el, &b, (hx, hy), (w, h), modifiers.alt);
        }

        let factor = match (hx != 0.0, hy != 0.0) {
            (true, true) => (w1 / w0).max(h1 / h0),
            (true, false) => w1 / w0,
            (false, true) => h1 / h0,
            (false, false) => 1.0,
        };
        let factor = if factor.is_finite() { factor } else { 1.0 };

        let s0 = el.scale;
        let floor_scale = (floor_w * s0 / w0).max(floor_h * s0 / h0);
        let s1 = self.config.limits_for(el).clamp((s0 * factor).max(floor_scale));
        let f = s1 / s0;

        let (w, h) = (w0 * f, h0 * f);
        let center = shifted_center(el, &b, (hx, hy), (w, h), modifiers.alt);
        let position = match el.kind {
            ElementKind::Text(_) => Point::new(
                center.x + (el.position.x - b.center().x) * f,
                center.y + (el.position.y - b.center().y) * f,
            ),
            ElementKind::Mockup(_) | ElementKind::Visual(_) => center,
        };
        ElementPatch::transform(position, s1, el.rotation)
    }
}

/// Center after resizing `b` to `size`, keeping the edges opposite the
/// handle fixed in canvas space (or the center, with Alt).
fn shifted_center(el: &Element, b: &Rect, dir: (f32, f32), size: (f32, f32), alt: bool) -> Point {
    let c0 = b.center();
    if alt {
        return c0;
    }
    let local = Point::new(
        dir.0 * (size.0 - b.width) / 2.0,
        dir.1 * (size.1 - b.height) / 2.0,
    );
    let world = rotate_point(local, Point::ZERO, el.rotation);
    Point::new(c0.x + world.x, c0.y + world.y)
}

/// Side-handle resize that changes the element's own size instead of its
/// scale: a visual's width/height, or a text block's wrap width.
fn stretch_patch(el: &Element, b: &Rect, dir: (f32, f32), size: (f32, f32), alt: bool) -> ElementPatch {
    let center = shifted_center(el, b, dir, size, alt);
    let (w, h) = size;
    match &el.kind {
        ElementKind::Visual(_) => ElementPatch {
            position: Some(center),
            width: Some(w / el.scale),
            height: Some(h / el.scale),
            ..Default::default()
        },
        ElementKind::Text(t) => {
            let dx = match t.align {
                TextAlign::Left => -w / 2.0,
                TextAlign::Center => 0.0,
                TextAlign::Right => w / 2.0,
            };
            ElementPatch {
                position: Some(Point::new(
                    center.x + dx,
                    center.y + (el.position.y - b.center().y),
                )),
                text_width: Some(Some(w / el.scale)),
                ..Default::default()
            }
        }
        ElementKind::Mockup(_) => ElementPatch::default(),
    }
}

fn move_items(items: &[Captured], delta: (f32, f32), constrain: bool) -> Vec<(ElementId, ElementPatch)> {
    let (mut dx, mut dy) = delta;
    // Shift: constrain to the dominant axis
    if constrain {
        if dx.abs() > dy.abs() {
            dy = 0.0;
        } else {
            dx = 0.0;
        }
    }
    items
        .iter()
        .map(|c| {
            let p = c.element.position;
            (
                c.element.id,
                ElementPatch {
                    position: Some(Point::new(p.x + dx, p.y + dy)),
                    ..Default::default()
                },
            )
        })
        .collect()
}

/// Angle of `p` around `center` in degrees, clockwise from +x (y-down).
fn angle_about(center: Point, p: Point) -> f32 {
    (p.y - center.y).atan2(p.x - center.x).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_core::layout::ApproxMeasure;
    use sd_core::{
        CanvasId, CanvasInstance, GlobalSettings, create_mockup_element, create_text_element,
        create_visual_element,
    };

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn scene_with(el: Element) -> (SceneModel, ElementId) {
        let mut scene = SceneModel::new(GlobalSettings::default());
        scene.add_canvas(CanvasInstance::new(CanvasId::new("c"), None, 0));
        let id = scene.add_element(0, el).unwrap();
        (scene, id)
    }

    fn apply(scene: &mut SceneModel, patches: Vec<(ElementId, ElementPatch)>) {
        for (id, patch) in patches {
            scene.update_element(0, id, &patch);
        }
    }

    fn gesture(scene: &SceneModel, id: ElementId, kind: GestureKind, at: Point) -> Gesture {
        let ctx = LayoutContext::new(&ApproxMeasure, 1284.0);
        TransformController::default()
            .begin(
                scene,
                &ctx,
                0,
                &[id],
                kind,
                ScreenPoint::new(at.x, at.y),
                &ViewTransform::IDENTITY,
            )
            .unwrap()
    }

    fn bounds(scene: &SceneModel, id: ElementId) -> Rect {
        let ctx = LayoutContext::new(&ApproxMeasure, 1284.0);
        element_bounds(scene.element(0, id).unwrap(), &ctx)
    }

    // ─── Resize ─────────────────────────────────────────────────────────

    #[test]
    fn corner_resize_scales_uniformly_and_pins_opposite_corner() {
        let (mut scene, id) = scene_with(create_mockup_element(
            "iphone-15-pro",
            None,
            Point::new(642.0, 1389.0),
        ));
        let before = bounds(&scene, id);
        let g = gesture(&scene, id, GestureKind::Resize(Handle::SE), Point::new(992.0, 2089.0));
        let patches =
            TransformController::default().update_logical(&g, (140.0, 280.0), Modifiers::NONE);
        apply(&mut scene, patches);

        let el = scene.element(0, id).unwrap();
        assert!(close(el.scale, 1.2), "scale {}", el.scale);
        assert_eq!(el.rotation, 0.0);
        let after = bounds(&scene, id);
        assert!(close(after.x, before.x) && close(after.y, before.y));
    }

    #[test]
    fn larger_axis_factor_wins() {
        let (mut scene, id) = scene_with(create_visual_element("a.png", 200.0, 100.0, Point::new(500.0, 500.0)));
        let g = gesture(&scene, id, GestureKind::Resize(Handle::SE), Point::new(600.0, 550.0));
        // x: 250/200 = 1.25, y: 110/100 = 1.1
        apply(
            &mut scene,
            TransformController::default().update_logical(&g, (50.0, 10.0), Modifiers::NONE),
        );
        let after = bounds(&scene, id);
        assert!(close(after.width / after.height, 2.0));
        assert!(close(scene.element(0, id).unwrap().scale, 1.25));
    }

    #[test]
    fn rotated_resize_works_in_the_local_frame() {
        let mut m = create_mockup_element("iphone-15-pro", None, Point::new(642.0, 1389.0));
        m.rotation = 90.0;
        let (mut scene, id) = scene_with(m);
        let before = bounds(&scene, id);
        let pinned = rotate_point(Point::new(before.x, before.y), before.center(), 90.0);

        let g = gesture(&scene, id, GestureKind::Resize(Handle::SE), Point::ZERO);
        // World (-280, 140) is local (140, 280) at 90°.
        apply(
            &mut scene,
            TransformController::default().update_logical(&g, (-280.0, 140.0), Modifiers::NONE),
        );

        let el = scene.element(0, id).unwrap();
        assert!(close(el.scale, 1.2), "scale {}", el.scale);
        assert_eq!(el.rotation, 90.0);
        let after = bounds(&scene, id);
        let pinned_after = rotate_point(Point::new(after.x, after.y), after.center(), 90.0);
        assert!(pinned.distance(pinned_after) < 1e-2);
    }

    #[test]
    fn alt_resizes_about_the_center() {
        let (mut scene, id) = scene_with(create_visual_element("a.png", 200.0, 200.0, Point::new(500.0, 500.0)));
        let g = gesture(&scene, id, GestureKind::Resize(Handle::NE), Point::ZERO);
        apply(
            &mut scene,
            TransformController::default().update_logical(&g, (50.0, 0.0), Modifiers::alt()),
        );
        let el = scene.element(0, id).unwrap();
        assert!(close(el.scale, 1.5));
        assert_eq!(el.position, Point::new(500.0, 500.0));
    }

    #[test]
    fn scale_clamps_per_kind() {
        let (mut scene, id) = scene_with(create_mockup_element("iphone-15-pro", None, Point::new(642.0, 1389.0)));
        let g = gesture(&scene, id, GestureKind::Resize(Handle::SE), Point::ZERO);
        let ctl = TransformController::default();
        apply(&mut scene, ctl.update_logical(&g, (5000.0, 5000.0), Modifiers::NONE));
        assert!(close(scene.element(0, id).unwrap().scale, 2.5));
        apply(&mut scene, ctl.update_logical(&g, (-690.0, -1390.0), Modifiers::NONE));
        assert!(close(scene.element(0, id).unwrap().scale, 0.3));
    }

    #[test]
    fn size_floor_blocks_degenerate_results() {
        let (mut scene, id) = scene_with(create_visual_element("a.png", 100.0, 200.0, Point::new(500.0, 500.0)));
        let g = gesture(&scene, id, GestureKind::Resize(Handle::SE), Point::ZERO);
        apply(
            &mut scene,
            TransformController::default().update_logical(&g, (-99.0, -199.0), Modifiers::NONE),
        );
        let after = bounds(&scene, id);
        assert!(close(after.width, 50.0) && close(after.height, 100.0));
    }

    #[test]
    fn elements_below_the_floor_still_shrink() {
        let ctl = TransformController::default();

        // 200×80 banner: shorter than the 100 px floor from the start.
        let (mut scene, id) = scene_with(create_visual_element("banner.png", 200.0, 80.0, Point::new(500.0, 500.0)));
        let g = gesture(&scene, id, GestureKind::Resize(Handle::SE), Point::ZERO);
        apply(&mut scene, ctl.update_logical(&g, (-100.0, -40.0), Modifiers::NONE));
        assert!(close(scene.element(0, id).unwrap().scale, 0.5));

        // Default text is under 100 px tall.
        let (mut scene, id) = scene_with(create_text_element("Hello", Point::new(500.0, 500.0)));
        let b = bounds(&scene, id);
        assert!(b.height < 100.0);
        let g = gesture(&scene, id, GestureKind::Resize(Handle::SE), Point::ZERO);
        apply(
            &mut scene,
            ctl.update_logical(&g, (-b.width / 2.0, -b.height / 2.0), Modifiers::NONE),
        );
        assert!(close(scene.element(0, id).unwrap().scale, 0.5));

        // The scale limit still applies.
        apply(&mut scene, ctl.update_logical(&g, (-b.width, -b.height), Modifiers::NONE));
        assert!(close(scene.element(0, id).unwrap().scale, 0.1));
    }

    #[test]
    fn side_handle_stretches_visuals() {
        let (mut scene, id) = scene_with(create_visual_element("a.png", 200.0, 100.0, Point::new(500.0, 500.0)));
        let g = gesture(&scene, id, GestureKind::Resize(Handle::E), Point::ZERO);
        apply(
            &mut scene,
            TransformController::default().update_logical(&g, (100.0, 30.0), Modifiers::NONE),
        );
        let after = bounds(&scene, id);
        assert!(close(after.x, 400.0));
        assert!(close(after.width, 300.0));
        assert!(close(after.height, 100.0));
        assert_eq!(scene.element(0, id).unwrap().scale, 1.0);
    }

    #[test]
    fn shift_side_handle_scales_uniformly() {
        let (mut scene, id) = scene_with(create_visual_element("a.png", 200.0, 100.0, Point::new(500.0, 500.0)));
        let g = gesture(&scene, id, GestureKind::Resize(Handle::E), Point::ZERO);
        apply(
            &mut scene,
            TransformController::default().update_logical(&g, (100.0, 0.0), Modifiers::shift()),
        );
        let after = bounds(&scene, id);
        assert!(close(after.width, 300.0) && close(after.height, 150.0));
    }

    #[test]
    fn text_side_handle_sets_frame_width() {
        let mut t = create_text_element("one two three four five", Point::new(100.0, 100.0));
        if let ElementKind::Text(text) = &mut t.kind {
            text.align = TextAlign::Left;
            text.width = Some(400.0);
        }
        let (mut scene, id) = scene_with(t);
        let b = bounds(&scene, id);
        let g = gesture(&scene, id, GestureKind::Resize(Handle::E), Point::ZERO);
        apply(
            &mut scene,
            TransformController::default().update_logical(&g, (200.0, 0.0), Modifiers::NONE),
        );
        let el = scene.element(0, id).unwrap();
        assert_eq!(el.as_text().unwrap().width, Some(b.width + 200.0));
        // Left-aligned text keeps its left edge.
        assert!(close(el.position.x, 100.0));
    }

    // ─── Rotate ─────────────────────────────────────────────────────────

    #[test]
    fn rotation_follows_pointer_angle() {
        let (mut scene, id) = scene_with(create_visual_element("a.png", 100.0, 100.0, Point::new(500.0, 500.0)));
        // Start straight above the center, end straight to its right: +90°.
        let g = gesture(&scene, id, GestureKind::Rotate, Point::new(500.0, 400.0));
        apply(
            &mut scene,
            TransformController::default().update_logical(&g, (100.0, 100.0), Modifiers::NONE),
        );
        assert!(close(scene.element(0, id).unwrap().rotation, 90.0));
    }

    #[test]
    fn shift_snaps_rotation() {
        let (mut scene, id) = scene_with(create_visual_element("a.png", 100.0, 100.0, Point::new(0.0, 0.0)));
        let g = gesture(&scene, id, GestureKind::Rotate, Point::new(100.0, 0.0));
        let to = rotate_point(Point::new(100.0, 0.0), Point::ZERO, 50.0);
        apply(
            &mut scene,
            TransformController::default().update_logical(&g, (to.x - 100.0, to.y), Modifiers::shift()),
        );
        assert!(close(scene.element(0, id).unwrap().rotation, 45.0));
    }

    #[test]
    fn rotation_stays_normalized() {
        let mut v = create_visual_element("a.png", 100.0, 100.0, Point::ZERO);
        v.rotation = 170.0;
        let (mut scene, id) = scene_with(v);
        let g = gesture(&scene, id, GestureKind::Rotate, Point::new(100.0, 0.0));
        let to = rotate_point(Point::new(100.0, 0.0), Point::ZERO, 30.0);
        apply(
            &mut scene,
            TransformController::default().update_logical(&g, (to.x - 100.0, to.y), Modifiers::NONE),
        );
        assert!(close(scene.element(0, id).unwrap().rotation, -160.0));
    }

    // ─── Move and view conversion ───────────────────────────────────────

    #[test]
    fn screen_deltas_go_through_the_view_transform() {
        let (mut scene, id) = scene_with(create_mockup_element("iphone-15-pro", None, Point::new(642.0, 1389.0)));
        let view = ViewTransform::new(0.25, 2.0, ScreenPoint::new(10.0, 10.0));
        let ctx = LayoutContext::new(&ApproxMeasure, 1284.0);
        let ctl = TransformController::default();
        let g = ctl
            .begin(
                &scene,
                &ctx,
                0,
                &[id],
                GestureKind::Resize(Handle::SE),
                ScreenPoint::new(300.0, 300.0),
                &view,
            )
            .unwrap();
        apply(
            &mut scene,
            ctl.update(&g, ScreenPoint::new(370.0, 440.0), &view, Modifiers::NONE),
        );
        assert!(close(scene.element(0, id).unwrap().scale, 1.2));
    }

    #[test]
    fn shift_move_locks_to_dominant_axis() {
        let (mut scene, id) = scene_with(create_text_element("Hi", Point::new(100.0, 100.0)));
        let g = gesture(&scene, id, GestureKind::Move, Point::new(100.0, 110.0));
        apply(
            &mut scene,
            TransformController::default().update_logical(&g, (40.0, 5.0), Modifiers::shift()),
        );
        assert_eq!(scene.element(0, id).unwrap().position, Point::new(140.0, 100.0));
    }
}
