//! The scene model: the single source of truth for an editing session.
//!
//! Every mutation goes through the methods here. Element records are held
//! as `Arc<Element>` and are replaced, never mutated in place, so a clone
//! taken by the renderer, the undo stack or the persistence bridge is a
//! stable snapshot that costs one refcount per element.

use crate::geometry::{Point, normalize_rotation};
use crate::id::ElementId;
use crate::model::*;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

/// Partial update for an element. Kind-specific fields are ignored when the
/// element is of another kind.
///
/// Deserializes from the property panel's camelCase JSON; an explicit
/// `null` for `textWidth` or `screenshot` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementPatch {
    pub position: Option<Point>,
    pub scale: Option<f32>,
    pub rotation: Option<f32>,
    pub z_index: Option<i32>,

    // Text
    pub content: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub color: Option<Color>,
    pub weight: Option<FontWeight>,
    pub align: Option<TextAlign>,
    #[serde(deserialize_with = "present")]
    pub text_width: Option<Option<f32>>,
    pub letter_spacing: Option<f32>,
    pub line_height: Option<f32>,

    // Mockup
    pub device_frame: Option<String>,
    #[serde(deserialize_with = "present")]
    pub screenshot: Option<Option<String>>,

    // Visual
    pub asset: Option<String>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub opacity: Option<f32>,
}

/// A field that is present maps to `Some`, even when it is `null`.
fn present<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

impl ElementPatch {
    /// Patch carrying only transform fields.
    pub fn transform(position: Point, scale: f32, rotation: f32) -> Self {
        Self {
            position: Some(position),
            scale: Some(scale),
            rotation: Some(rotation),
            ..Default::default()
        }
    }

    /// Apply onto `el`, enforcing the element invariants.
    fn apply_to(&self, el: &mut Element) {
        if let Some(p) = self.position
            && p.x.is_finite()
            && p.y.is_finite()
        {
            el.position = p;
        }
        // scale > 0: non-positive or non-finite values are dropped
        if let Some(s) = self.scale
            && s.is_finite()
            && s > 0.0
        {
            el.scale = s;
        }
        if let Some(r) = self.rotation {
            el.rotation = normalize_rotation(r);
        }
        if let Some(z) = self.z_index {
            el.z_index = z;
        }

        match &mut el.kind {
            ElementKind::Text(t) => {
                if let Some(c) = &self.content {
                    t.content = c.clone();
                }
                if let Some(f) = &self.font_family {
                    t.font_family = f.clone();
                }
                if let Some(s) = self.font_size.filter(|s| *s > 0.0) {
                    t.font_size = s;
                }
                if let Some(c) = self.color {
                    t.color = c;
                }
                if let Some(w) = self.weight {
                    t.weight = w;
                }
                if let Some(a) = self.align {
                    t.align = a;
                }
                if let Some(w) = self.text_width {
                    t.width = w.filter(|w| *w > 0.0);
                }
                if let Some(ls) = self.letter_spacing {
                    t.letter_spacing = ls;
                }
                if let Some(lh) = self.line_height.filter(|lh| *lh > 0.0) {
                    t.line_height = lh;
                }
            }
            ElementKind::Mockup(m) => {
                if let Some(frame) = &self.device_frame {
                    let (w, h) = DeviceClass::from_frame_id(frame).mockup_base_size();
                    m.device_frame = frame.clone();
                    m.base_width = w;
                    m.base_height = h;
                }
                if let Some(s) = &self.screenshot {
                    m.screenshot = s.clone();
                }
            }
            ElementKind::Visual(v) => {
                if let Some(a) = &self.asset {
                    v.asset = a.clone();
                }
                if let Some(w) = self.width.filter(|w| *w > 0.0) {
                    v.width = w;
                }
                if let Some(h) = self.height.filter(|h| *h > 0.0) {
                    v.height = h;
                }
                if let Some(o) = self.opacity {
                    v.opacity = o.clamp(0.0, 1.0);
                }
            }
        }
    }
}

/// Partial update for the global settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsPatch {
    pub background: Option<Background>,
    pub device_frame: Option<String>,
    pub view: Option<ViewState>,
}

/// Z-order moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    Forward,
    Backward,
    ToFront,
    ToBack,
}

/// All canvases of a project plus their shared settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneModel {
    canvases: Vec<CanvasInstance>,
    settings: GlobalSettings,
    /// Bumped on every effective change.
    version: u64,
}

impl SceneModel {
    pub fn new(settings: GlobalSettings) -> Self {
        Self {
            canvases: Vec::new(),
            settings,
            version: 0,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn canvases(&self) -> &[CanvasInstance] {
        &self.canvases
    }

    pub fn canvas(&self, index: usize) -> Option<&CanvasInstance> {
        self.canvases.get(index)
    }

    pub fn canvas_index(&self, id: &CanvasId) -> Option<usize> {
        self.canvases.iter().position(|c| &c.id == id)
    }

    pub fn element(&self, canvas: usize, id: ElementId) -> Option<&Element> {
        self.canvas(canvas)?.element(id)
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    // ─── Canvases ────────────────────────────────────────────────────────

    /// Append a canvas and return its index.
    pub fn add_canvas(&mut self, canvas: CanvasInstance) -> usize {
        self.canvases.push(canvas);
        self.touch();
        self.canvases.len() - 1
    }

    pub fn remove_canvas(&mut self, index: usize) -> Option<CanvasInstance> {
        if index >= self.canvases.len() {
            return None;
        }
        let removed = self.canvases.remove(index);
        self.touch();
        Some(removed)
    }

    /// Point a canvas at a new source screenshot. Loads of the previous
    /// source are keyed by it and go stale on their own.
    pub fn set_canvas_source(&mut self, index: usize, source: Option<String>) -> bool {
        let Some(canvas) = self.canvases.get_mut(index) else {
            return false;
        };
        if canvas.source == source {
            return false;
        }
        canvas.source = source;
        self.touch();
        true
    }

    // ─── Elements ────────────────────────────────────────────────────────

    /// Add an element on top of the canvas. Returns `None` when the canvas
    /// does not exist or the ID is already taken there.
    pub fn add_element(&mut self, canvas: usize, mut element: Element) -> Option<ElementId> {
        let c = self.canvases.get_mut(canvas)?;
        if c.element(element.id).is_some() {
            log::warn!("duplicate element id {} on canvas {}", element.id, c.id);
            return None;
        }
        element.z_index = c.elements.iter().map(|e| e.z_index.saturating_add(1)).max().unwrap_or(0);
        element.rotation = normalize_rotation(element.rotation);
        if !(element.scale.is_finite() && element.scale > 0.0) {
            element.scale = 1.0;
        }
        let id = element.id;
        c.elements.push(Arc::new(element));
        self.touch();
        Some(id)
    }

    /// Replace the element record with a patched copy. Missing canvases or
    /// IDs are a no-op; returns whether anything changed.
    pub fn update_element(&mut self, canvas: usize, id: ElementId, patch: &ElementPatch) -> bool {
        let Some(c) = self.canvases.get_mut(canvas) else {
            return false;
        };
        let Some(slot) = c.elements.iter_mut().find(|e| e.id == id) else {
            log::trace!("update for missing element {id} ignored");
            return false;
        };
        let mut next = Element::clone(slot);
        patch.apply_to(&mut next);
        if next == **slot {
            return false;
        }
        *slot = Arc::new(next);
        self.touch();
        true
    }

    pub fn delete_element(&mut self, canvas: usize, id: ElementId) -> Option<Arc<Element>> {
        let c = self.canvases.get_mut(canvas)?;
        let pos = c.position_of(id)?;
        let removed = c.elements.remove(pos);
        self.touch();
        Some(removed)
    }

    /// Move an element in paint order. Z-indices of the canvas are
    /// renumbered densely; only records whose z-index changes are replaced.
    pub fn reorder_element(&mut self, canvas: usize, id: ElementId, op: ZOrder) -> bool {
        let Some(c) = self.canvases.get_mut(canvas) else {
            return false;
        };
        let mut order: Vec<ElementId> = c.paint_order().iter().map(|e| e.id).collect();
        let Some(from) = order.iter().position(|e| *e == id) else {
            return false;
        };
        let last = order.len() - 1;
        let to = match op {
            ZOrder::Forward if from < last => from + 1,
            ZOrder::Backward if from > 0 => from - 1,
            ZOrder::ToFront if from < last => last,
            ZOrder::ToBack if from > 0 => 0,
            _ => return false,
        };
        let moved = order.remove(from);
        order.insert(to, moved);

        for slot in c.elements.iter_mut() {
            let z = order.iter().position(|e| *e == slot.id).unwrap_or(0) as i32;
            if slot.z_index != z {
                let mut next = Element::clone(slot);
                next.z_index = z;
                *slot = Arc::new(next);
            }
        }
        self.touch();
        true
    }

    // ─── Global settings ─────────────────────────────────────────────────

    /// Merge a settings patch. A device change also re-targets mockups that
    /// were following the previous device frame.
    pub fn update_global_settings(&mut self, patch: SettingsPatch) -> bool {
        let mut changed = false;

        if let Some(bg) = patch.background
            && bg != self.settings.background
        {
            self.settings.background = bg;
            changed = true;
        }

        if let Some(view) = patch.view
            && view != self.settings.view
        {
            self.settings.view = view;
            changed = true;
        }

        if let Some(frame) = patch.device_frame
            && frame != self.settings.device_frame
        {
            let previous = std::mem::replace(&mut self.settings.device_frame, frame.clone());
            let retarget = ElementPatch {
                device_frame: Some(frame),
                ..Default::default()
            };
            for c in self.canvases.iter_mut() {
                for slot in c.elements.iter_mut() {
                    if let ElementKind::Mockup(m) = &slot.kind
                        && m.device_frame == previous
                    {
                        let mut next = Element::clone(slot);
                        retarget.apply_to(&mut next);
                        *slot = Arc::new(next);
                    }
                }
            }
            changed = true;
        }

        if changed {
            self.touch();
        }
        changed
    }

    /// Replace the content with an earlier snapshot (undo/redo). The view
    /// state is kept and the version keeps counting forward.
    pub fn restore(&mut self, snapshot: &SceneModel) {
        let view = self.settings.view;
        let version = self.version;
        *self = snapshot.clone();
        self.settings.view = view;
        self.version = version;
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scene_with_canvas() -> SceneModel {
        let mut scene = SceneModel::new(GlobalSettings::default());
        scene.add_canvas(CanvasInstance::new(CanvasId::new("c1"), None, 0));
        scene
    }

    #[test]
    fn add_assigns_increasing_z() {
        let mut scene = scene_with_canvas();
        let a = scene
            .add_element(0, create_text_element("a", Point::ZERO))
            .unwrap();
        let b = scene
            .add_element(0, create_text_element("b", Point::ZERO))
            .unwrap();
        assert_eq!(scene.element(0, a).unwrap().z_index, 0);
        assert_eq!(scene.element(0, b).unwrap().z_index, 1);
    }

    #[test]
    fn add_above_max_z_saturates() {
        let mut scene = scene_with_canvas();
        let top = scene
            .add_element(0, create_text_element("top", Point::ZERO))
            .unwrap();
        scene.update_element(
            0,
            top,
            &ElementPatch {
                z_index: Some(i32::MAX),
                ..Default::default()
            },
        );
        let next = scene
            .add_element(0, create_text_element("next", Point::ZERO))
            .unwrap();
        assert_eq!(scene.element(0, next).unwrap().z_index, i32::MAX);
        // Insertion order breaks the tie: the newer element paints last.
        let order: Vec<ElementId> = scene.canvas(0).unwrap().paint_order().iter().map(|e| e.id).collect();
        assert_eq!(order, vec![top, next]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut scene = scene_with_canvas();
        let el = create_text_element("a", Point::ZERO);
        assert!(scene.add_element(0, el.clone()).is_some());
        assert!(scene.add_element(0, el).is_none());
        assert_eq!(scene.canvas(0).unwrap().elements.len(), 1);
    }

    #[test]
    fn update_is_copy_on_write() {
        let mut scene = scene_with_canvas();
        let id = scene
            .add_element(0, create_text_element("a", Point::ZERO))
            .unwrap();
        let before = scene.clone();

        let patch = ElementPatch {
            content: Some("changed".into()),
            rotation: Some(270.0),
            ..Default::default()
        };
        assert!(scene.update_element(0, id, &patch));

        let old = before.element(0, id).unwrap();
        let new = scene.element(0, id).unwrap();
        assert_eq!(old.as_text().unwrap().content, "a");
        assert_eq!(new.as_text().unwrap().content, "changed");
        assert_eq!(new.rotation, -90.0);
        assert_eq!(new.id, id);
    }

    #[test]
    fn update_missing_element_is_noop() {
        let mut scene = scene_with_canvas();
        let version = scene.version();
        let patch = ElementPatch {
            scale: Some(2.0),
            ..Default::default()
        };
        assert!(!scene.update_element(0, ElementId::intern("ghost"), &patch));
        assert!(!scene.update_element(7, ElementId::intern("ghost"), &patch));
        assert_eq!(scene.version(), version);
    }

    #[test]
    fn non_positive_scale_is_ignored() {
        let mut scene = scene_with_canvas();
        let id = scene
            .add_element(0, create_text_element("a", Point::ZERO))
            .unwrap();
        let patch = ElementPatch {
            scale: Some(0.0),
            ..Default::default()
        };
        assert!(!scene.update_element(0, id, &patch));
        assert_eq!(scene.element(0, id).unwrap().scale, 1.0);
    }

    #[test]
    fn reorder_moves_in_paint_order() {
        let mut scene = scene_with_canvas();
        let ids: Vec<ElementId> = (0..3)
            .map(|i| {
                scene
                    .add_element(0, create_text_element(&i.to_string(), Point::ZERO))
                    .unwrap()
            })
            .collect();

        assert!(scene.reorder_element(0, ids[0], ZOrder::ToFront));
        let order: Vec<ElementId> = scene
            .canvas(0)
            .unwrap()
            .paint_order()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(order, vec![ids[1], ids[2], ids[0]]);

        assert!(!scene.reorder_element(0, ids[0], ZOrder::Forward));
        assert!(scene.reorder_element(0, ids[0], ZOrder::Backward));
        let order: Vec<ElementId> = scene
            .canvas(0)
            .unwrap()
            .paint_order()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(order, vec![ids[1], ids[0], ids[2]]);
    }

    #[test]
    fn device_change_retargets_following_mockups() {
        let mut scene = scene_with_canvas();
        let id = scene
            .add_element(0, create_mockup_element("iphone-15-pro", None, Point::ZERO))
            .unwrap();
        assert!(scene.update_global_settings(SettingsPatch {
            device_frame: Some("ipad-pro-13".into()),
            ..Default::default()
        }));
        match &scene.element(0, id).unwrap().kind {
            ElementKind::Mockup(m) => {
                assert_eq!(m.device_frame, "ipad-pro-13");
                assert_eq!(m.base_width, 1000.0);
            }
            _ => panic!("expected mockup"),
        }
        // Same value again is not a change.
        assert!(!scene.update_global_settings(SettingsPatch {
            device_frame: Some("ipad-pro-13".into()),
            ..Default::default()
        }));
    }

    #[test]
    fn source_change_is_reported_once() {
        let mut scene = scene_with_canvas();
        let v = scene.version();
        assert!(scene.set_canvas_source(0, Some("shot-1.png".into())));
        assert!(!scene.set_canvas_source(0, Some("shot-1.png".into())));
        assert!(scene.set_canvas_source(0, Some("shot-2.png".into())));
        assert_eq!(scene.version(), v + 2);
        assert_eq!(scene.canvas(0).unwrap().source.as_deref(), Some("shot-2.png"));
    }

    #[test]
    fn restore_keeps_view_and_advances_version() {
        let mut scene = scene_with_canvas();
        let before = scene.clone();
        scene.add_element(0, create_text_element("a", Point::ZERO));
        scene.update_global_settings(SettingsPatch {
            view: Some(ViewState {
                zoom: 2.0,
                ..ViewState::default()
            }),
            ..Default::default()
        });
        let version = scene.version();

        scene.restore(&before);
        assert!(scene.canvas(0).unwrap().elements.is_empty());
        assert_eq!(scene.settings().view.zoom, 2.0);
        assert!(scene.version() > version);
    }

    #[test]
    fn patch_json_distinguishes_null_from_missing() {
        let clear: ElementPatch = serde_json::from_str(r#"{"textWidth":null,"fontSize":48}"#).unwrap();
        assert_eq!(clear.text_width, Some(None));
        assert_eq!(clear.font_size, Some(48.0));
        assert_eq!(clear.screenshot, None);

        let keep: ElementPatch = serde_json::from_str(r#"{"rotation":15}"#).unwrap();
        assert_eq!(keep.text_width, None);
        assert_eq!(keep.rotation, Some(15.0));
    }
}
