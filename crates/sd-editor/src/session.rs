//! One editing session: the scene plus everything that acts on it.
//!
//! The session owns the scene model, selection, select tool, transform
//! controller, undo stack and persistence bridge. Hosts forward input
//! events, render canvases through [`EditorSession::render`], and drive
//! saves through [`EditorSession::poll_saves`] / [`EditorSession::complete_save`].

use crate::autosave::{PersistenceBridge, SaveNotice, SaveRequest};
use crate::commands::CommandStack;
use crate::config::EditorConfig;
use crate::error::SaveError;
use crate::input::{InputEvent, Modifiers};
use crate::selection::{Selection, SelectionTarget};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{Hit, SelectTool, ToolAction};
use crate::transform::{Gesture, GestureKind, TransformController};
use sd_core::geometry::{Point, Rect};
use sd_core::layout::{ApproxMeasure, LayoutContext, TextMeasure};
use sd_core::{
    CanvasId, CanvasInstance, ElementId, ElementPatch, GlobalSettings, SavedCanvasConfig,
    SceneModel, ScreenPoint, SettingsPatch, ViewState, ViewTransform, ZOrder,
    create_mockup_element, create_text_element, create_visual_element,
};
use sd_render::fonts::FallbackMeasure;
use sd_render::hit::hit_test_rect;
use sd_render::{
    AssetCache, FontBook, HandleMetrics, Overlay, RenderInput, Surface, hit_test,
    hit_test_handle, layout_context, render_canvas,
};
use std::time::Duration;

const ZOOM_STEP: f32 = 1.25;
const ZOOM_RANGE: (f32, f32) = (0.1, 8.0);

/// What the host should do after an event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub redraw: bool,
    /// CSS cursor for the pointer position, when it changed.
    pub cursor: Option<&'static str>,
    /// Text element that just entered in-place editing.
    pub editing: Option<SelectionTarget>,
}

pub struct EditorSession {
    config: EditorConfig,
    scene: SceneModel,
    selection: Selection,
    tool: SelectTool,
    controller: TransformController,
    gesture: Option<Gesture>,
    commands: CommandStack,
    bridge: PersistenceBridge,
    fonts: FontBook,
    measure: Box<dyn TextMeasure>,
    views: Vec<ViewTransform>,
    hovered: Option<SelectionTarget>,
    /// Host clock at the latest event, for debounce deadlines.
    now: Duration,
}

impl EditorSession {
    pub fn new(config: EditorConfig, scene: SceneModel) -> Self {
        let mut bridge = PersistenceBridge::new(config.autosave_debounce());
        bridge.mark_saved(&scene);
        let views = vec![ViewTransform::IDENTITY; scene.canvases().len()];
        Self {
            controller: TransformController::new(&config),
            commands: CommandStack::new(config.undo_depth),
            config,
            scene,
            selection: Selection::new(),
            tool: SelectTool::new(),
            gesture: None,
            bridge,
            fonts: FontBook::default(),
            measure: Box::new(ApproxMeasure),
            views,
            hovered: None,
            now: Duration::ZERO,
        }
    }

    /// Rebuild a project from saved configurations, in display order. The
    /// shared settings come from the first configuration.
    pub fn from_saved(
        config: EditorConfig,
        saved: impl IntoIterator<Item = (CanvasId, SavedCanvasConfig)>,
    ) -> Self {
        let mut canvases: Vec<(CanvasId, SavedCanvasConfig)> = saved.into_iter().collect();
        let settings = canvases
            .first()
            .map(|(_, c)| GlobalSettings {
                background: c.background.clone(),
                device_frame: c.device_frame.clone(),
                view: c.view,
            })
            .unwrap_or_default();
        let mut scene = SceneModel::new(settings);
        for (order, (id, saved)) in canvases.drain(..).enumerate() {
            scene.add_canvas(saved.into_canvas(id, order as u32));
        }
        Self::new(config, scene)
    }

    pub fn scene(&self) -> &SceneModel {
        &self.scene
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    /// Text measurement used for layout and hit-testing. Should match the
    /// surface the host renders with.
    pub fn set_measure(&mut self, measure: Box<dyn TextMeasure>) {
        self.measure = measure;
    }

    /// Where canvas `index` sits on screen.
    pub fn set_view(&mut self, index: usize, view: ViewTransform) {
        if index >= self.views.len() {
            self.views.resize(index + 1, ViewTransform::IDENTITY);
        }
        self.views[index] = view;
    }

    pub fn view(&self, index: usize) -> ViewTransform {
        self.views.get(index).copied().unwrap_or_default()
    }

    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }

    fn with_layout<R>(&self, f: impl FnOnce(&LayoutContext<'_>) -> R) -> R {
        let measure = FallbackMeasure {
            book: &self.fonts,
            inner: self.measure.as_ref(),
        };
        let ctx = layout_context(&measure, self.scene.settings(), self.config.text_width_fraction);
        f(&ctx)
    }

    fn handle_metrics(&self, canvas: usize) -> HandleMetrics {
        HandleMetrics::from_screen(
            self.config.handle_size_px,
            self.config.rotate_handle_offset_px,
            &self.view(canvas),
        )
    }

    // ─── Input ──────────────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: &InputEvent, now: Duration) -> Outcome {
        self.now = now;
        let mut outcome = Outcome::default();
        match event {
            InputEvent::Key { key, modifiers } => {
                self.handle_key(key, *modifiers, &mut outcome);
                return outcome;
            }
            InputEvent::PointerLeave { .. } => {
                if self.hovered.take().is_some() {
                    outcome.redraw = true;
                }
                return outcome;
            }
            _ => {}
        }
        let Some((canvas, at)) = event.position() else {
            return outcome;
        };
        if self.scene.canvas(canvas).is_none() {
            log::debug!("pointer event for unknown canvas {canvas}");
            return outcome;
        }
        let hit = self.hit_at(canvas, at);

        if matches!(event, InputEvent::PointerMove { .. }) && !self.tool.is_dragging() {
            self.update_hover(canvas, hit, &mut outcome);
        }

        let actions = self.tool.handle(event, hit, &self.selection);
        for action in actions {
            self.apply(action, &mut outcome);
        }
        outcome
    }

    /// Handle of the selected element first, then elements front to back.
    fn hit_at(&self, canvas: usize, at: ScreenPoint) -> Hit {
        let view = self.view(canvas);
        let p = view.screen_to_logical(at);
        let metrics = self.handle_metrics(canvas);
        let padding = self.config.text_hit_padding;
        self.with_layout(|ctx| {
            if let Some(t) = self.selection.single()
                && t.canvas == canvas
                && !self.selection.is_editing_text()
                && let Some(el) = self.scene.element(canvas, t.element)
                && let Some(handle) = hit_test_handle(el, ctx, p, &metrics)
            {
                return Hit::Handle(handle);
            }
            self.scene
                .canvas(canvas)
                .and_then(|c| hit_test(c, ctx, p, padding))
                .map_or(Hit::Empty, Hit::Element)
        })
    }

    fn update_hover(&mut self, canvas: usize, hit: Hit, outcome: &mut Outcome) {
        let hovered = match hit {
            Hit::Element(id) => Some(SelectionTarget::new(canvas, id)),
            _ => None,
        };
        if hovered != self.hovered {
            self.hovered = hovered;
            outcome.redraw = true;
        }
        outcome.cursor = Some(match hit {
            Hit::Handle(h) => h.cursor(),
            Hit::Element(_) => "move",
            Hit::Empty => "default",
        });
    }

    fn apply(&mut self, action: ToolAction, outcome: &mut Outcome) {
        match action {
            ToolAction::Select(target) => {
                self.selection.select(target);
                outcome.redraw = true;
            }
            ToolAction::Toggle(target) => {
                if self.selection.toggle(target) {
                    self.bridge.selection_cleared();
                }
                outcome.redraw = true;
            }
            ToolAction::Deselect => {
                outcome.redraw |= self.deselect();
            }
            ToolAction::BeginGesture { canvas, kind, at } => self.begin_gesture(canvas, kind, at),
            ToolAction::UpdateGesture { at, modifiers } => {
                outcome.redraw |= self.update_gesture(at, modifiers);
            }
            ToolAction::EndGesture => {
                if let Some(g) = self.gesture.take() {
                    let recorded = self.commands.end_batch(&self.scene);
                    log::debug!("end {:?} (recorded: {recorded})", g.kind);
                }
            }
            ToolAction::Marquee {
                canvas,
                from,
                to,
                additive,
            } => {
                self.apply_marquee(canvas, from, to, additive);
                outcome.redraw = true;
            }
            ToolAction::EditText(target) => {
                self.selection.select(target);
                if self.selection.begin_text_edit(&self.scene) {
                    outcome.editing = Some(target);
                }
                outcome.redraw = true;
            }
        }
    }

    fn begin_gesture(&mut self, canvas: usize, kind: GestureKind, at: ScreenPoint) {
        let ids = match kind {
            GestureKind::Move => self.selection.ids_on(canvas),
            _ => self
                .selection
                .primary()
                .filter(|t| t.canvas == canvas)
                .map(|t| vec![t.element])
                .unwrap_or_default(),
        };
        let view = self.view(canvas);
        let gesture = self.with_layout(|ctx| {
            self.controller
                .begin(&self.scene, ctx, canvas, &ids, kind, at, &view)
        });
        if let Some(g) = gesture {
            self.commands.begin_batch(&self.scene, gesture_label(kind));
            self.gesture = Some(g);
        }
    }

    fn update_gesture(&mut self, at: ScreenPoint, modifiers: Modifiers) -> bool {
        let Some(g) = &self.gesture else {
            return false;
        };
        let view = self.view(g.canvas);
        let mut changed = false;
        for (id, patch) in self.controller.update(g, at, &view, modifiers) {
            changed |= self
                .commands
                .execute(&mut self.scene, gesture_label(g.kind), |s| {
                    s.update_element(g.canvas, id, &patch)
                });
        }
        changed
    }

    fn apply_marquee(&mut self, canvas: usize, from: ScreenPoint, to: ScreenPoint, additive: bool) {
        let view = self.view(canvas);
        let a = view.screen_to_logical(from);
        let b = view.screen_to_logical(to);
        let rect = Rect::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (b.x - a.x).abs(),
            (b.y - a.y).abs(),
        );
        let hits = self.with_layout(|ctx| {
            self.scene
                .canvas(canvas)
                .map(|c| hit_test_rect(c, ctx, &rect))
                .unwrap_or_default()
        });
        let mut targets: Vec<SelectionTarget> = if additive {
            self.selection.targets().to_vec()
        } else {
            Vec::new()
        };
        targets.extend(hits.into_iter().map(|id| SelectionTarget::new(canvas, id)));
        if self.selection.select_all(targets) {
            self.bridge.selection_cleared();
        }
    }

    fn handle_key(&mut self, key: &str, modifiers: Modifiers, outcome: &mut Outcome) {
        let Some(action) = ShortcutMap::resolve(key, modifiers, self.selection.is_editing_text())
        else {
            return;
        };
        log::trace!("shortcut {action:?}");
        outcome.redraw = match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.delete_selected() > 0,
            ShortcutAction::SelectAll => self.select_all(),
            ShortcutAction::Deselect => self.deselect(),
            ShortcutAction::EditText => {
                if self.selection.begin_text_edit(&self.scene) {
                    outcome.editing = self.selection.primary();
                    true
                } else {
                    false
                }
            }
            ShortcutAction::Nudge { dx, dy, large } => {
                let step = if large { 10.0 } else { 1.0 };
                self.nudge(dx as f32 * step, dy as f32 * step)
            }
            ShortcutAction::ZoomIn => self.set_zoom(self.scene.settings().view.zoom * ZOOM_STEP),
            ShortcutAction::ZoomOut => self.set_zoom(self.scene.settings().view.zoom / ZOOM_STEP),
            ShortcutAction::ZoomReset => self.set_zoom(1.0),
            ShortcutAction::BringForward => self.reorder_selected(ZOrder::Forward),
            ShortcutAction::SendBackward => self.reorder_selected(ZOrder::Backward),
            ShortcutAction::BringToFront => self.reorder_selected(ZOrder::ToFront),
            ShortcutAction::SendToBack => self.reorder_selected(ZOrder::ToBack),
        };
    }

    // ─── Selection ──────────────────────────────────────────────────────

    /// Clear the selection. Reports the "selected → none" edge to autosave.
    pub fn deselect(&mut self) -> bool {
        if self.selection.clear() {
            self.bridge.selection_cleared();
            true
        } else {
            false
        }
    }

    pub fn select(&mut self, canvas: usize, id: ElementId) -> bool {
        if self.scene.element(canvas, id).is_none() {
            return false;
        }
        self.selection.select(SelectionTarget::new(canvas, id));
        true
    }

    /// Select every element on the primary canvas (the first canvas when
    /// nothing is selected).
    pub fn select_all(&mut self) -> bool {
        let canvas = self.selection.canvas_index().unwrap_or(0);
        let Some(c) = self.scene.canvas(canvas) else {
            return false;
        };
        let targets: Vec<SelectionTarget> = c
            .paint_order()
            .iter()
            .map(|e| SelectionTarget::new(canvas, e.id))
            .collect();
        if self.selection.select_all(targets) {
            self.bridge.selection_cleared();
        }
        true
    }

    // ─── Edits ──────────────────────────────────────────────────────────

    fn add(&mut self, canvas: usize, element: sd_core::Element, label: &str) -> Option<ElementId> {
        let id = self
            .commands
            .execute(&mut self.scene, label, |s| s.add_element(canvas, element))?;
        self.selection.select(SelectionTarget::new(canvas, id));
        Some(id)
    }

    /// Add a text element and select it.
    pub fn add_text(&mut self, canvas: usize, content: &str, position: Point) -> Option<ElementId> {
        self.add(canvas, create_text_element(content, position), "Add text")
    }

    /// Add a mockup of the current device and select it.
    pub fn add_mockup(
        &mut self,
        canvas: usize,
        screenshot: Option<&str>,
        position: Point,
    ) -> Option<ElementId> {
        let device = self.scene.settings().device_frame.clone();
        self.add(canvas, create_mockup_element(&device, screenshot, position), "Add mockup")
    }

    pub fn add_visual(
        &mut self,
        canvas: usize,
        asset: &str,
        size: (f32, f32),
        position: Point,
    ) -> Option<ElementId> {
        self.add(
            canvas,
            create_visual_element(asset, size.0, size.1, position),
            "Add image",
        )
    }

    /// Property-panel edit of one element.
    pub fn update_element(&mut self, canvas: usize, id: ElementId, patch: &ElementPatch) -> bool {
        self.commands
            .execute(&mut self.scene, "Edit", |s| s.update_element(canvas, id, patch))
    }

    /// Apply `patch` to every selected element, as one undo step.
    pub fn update_selected(&mut self, patch: &ElementPatch) -> bool {
        let targets = self.selection.targets().to_vec();
        self.commands.execute(&mut self.scene, "Edit", |s| {
            targets
                .iter()
                .fold(false, |changed, t| s.update_element(t.canvas, t.element, patch) | changed)
        })
    }

    /// Replace the content of the text element being edited.
    pub fn set_editing_text(&mut self, content: &str) -> bool {
        let Some(t) = self.selection.single().filter(|_| self.selection.is_editing_text()) else {
            return false;
        };
        let patch = ElementPatch {
            content: Some(content.to_string()),
            ..Default::default()
        };
        self.update_element(t.canvas, t.element, &patch)
    }

    /// Delete the selection. Returns how many elements were removed.
    pub fn delete_selected(&mut self) -> usize {
        let targets = self.selection.targets().to_vec();
        if targets.is_empty() {
            return 0;
        }
        let removed = self.commands.execute(&mut self.scene, "Delete", |s| {
            targets
                .iter()
                .filter(|t| s.delete_element(t.canvas, t.element).is_some())
                .count()
        });
        if self.selection.retain_existing(&self.scene) {
            self.bridge.selection_cleared();
        }
        removed
    }

    pub fn reorder_selected(&mut self, op: ZOrder) -> bool {
        let targets = self.selection.targets().to_vec();
        self.commands.execute(&mut self.scene, "Reorder", |s| {
            targets
                .iter()
                .fold(false, |changed, t| s.reorder_element(t.canvas, t.element, op) | changed)
        })
    }

    fn nudge(&mut self, dx: f32, dy: f32) -> bool {
        let targets = self.selection.targets().to_vec();
        self.commands.execute(&mut self.scene, "Nudge", |s| {
            targets.iter().fold(false, |changed, t| {
                let Some(p) = s.element(t.canvas, t.element).map(|e| e.position) else {
                    return changed;
                };
                let patch = ElementPatch {
                    position: Some(Point::new(p.x + dx, p.y + dy)),
                    ..Default::default()
                };
                s.update_element(t.canvas, t.element, &patch) | changed
            })
        })
    }

    /// Change the shared settings. Starts the autosave debounce.
    pub fn update_settings(&mut self, patch: SettingsPatch, now: Duration) -> bool {
        self.now = now;
        let changed = self
            .commands
            .execute(&mut self.scene, "Settings", |s| s.update_global_settings(patch));
        if changed {
            self.bridge.settings_changed(now);
        }
        changed
    }

    fn set_zoom(&mut self, zoom: f32) -> bool {
        let zoom = zoom.clamp(ZOOM_RANGE.0, ZOOM_RANGE.1);
        let view = ViewState {
            zoom,
            ..self.scene.settings().view
        };
        // View changes are not undoable.
        let changed = self.scene.update_global_settings(SettingsPatch {
            view: Some(view),
            ..Default::default()
        });
        if changed {
            for v in self.views.iter_mut() {
                v.zoom = zoom;
            }
            self.bridge.settings_changed(self.now);
        }
        changed
    }

    // ─── Canvases ───────────────────────────────────────────────────────

    pub fn add_canvas(&mut self, id: CanvasId, source: Option<String>) -> usize {
        let order = self.scene.canvases().len() as u32;
        let index = self.scene.add_canvas(CanvasInstance::new(id, source, order));
        self.set_view(index, ViewTransform::IDENTITY);
        index
    }

    pub fn remove_canvas(&mut self, index: usize) -> bool {
        let Some(removed) = self.scene.remove_canvas(index) else {
            return false;
        };
        if index < self.views.len() {
            self.views.remove(index);
        }
        self.bridge.forget(&removed.id);
        if self.hovered.is_some_and(|h| h.canvas == index) {
            self.hovered = None;
        }
        if self.selection.canvas_removed(index) {
            self.bridge.selection_cleared();
        }
        self.tool.cancel();
        self.gesture = None;
        true
    }

    pub fn set_canvas_source(&mut self, index: usize, source: Option<String>) -> bool {
        self.scene.set_canvas_source(index, source)
    }

    // ─── Undo ───────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.history(|commands, scene| commands.undo(scene))
    }

    pub fn redo(&mut self) -> bool {
        self.history(|commands, scene| commands.redo(scene))
    }

    fn history(
        &mut self,
        step: impl FnOnce(&mut CommandStack, &mut SceneModel) -> Option<String>,
    ) -> bool {
        if self.gesture.is_some() {
            return false;
        }
        let settings = self.scene.settings().clone();
        let Some(desc) = step(&mut self.commands, &mut self.scene) else {
            return false;
        };
        log::debug!("history step '{desc}'");
        if *self.scene.settings() != settings {
            self.bridge.settings_changed(self.now);
        }
        if self.selection.retain_existing(&self.scene) {
            self.bridge.selection_cleared();
        }
        true
    }

    // ─── Persistence ────────────────────────────────────────────────────

    /// Saves due at `now`.
    pub fn poll_saves(&mut self, now: Duration) -> Vec<SaveRequest> {
        self.now = now;
        self.bridge.poll(now, &self.scene)
    }

    pub fn complete_save(
        &mut self,
        canvas_id: &CanvasId,
        result: Result<(), SaveError>,
    ) -> Option<SaveNotice> {
        self.bridge.complete(canvas_id, result)
    }

    /// Save all dirty canvases at the next poll.
    pub fn flush_saves(&mut self) {
        self.bridge.flush();
    }

    pub fn next_save_wakeup(&self) -> Option<Duration> {
        self.bridge.next_wakeup()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.bridge.is_dirty(&self.scene)
    }

    // ─── Rendering ──────────────────────────────────────────────────────

    /// Editor decorations for one canvas.
    pub fn overlay(&self, canvas: usize) -> Overlay {
        let view = self.view(canvas);
        let selected = self.selection.ids_on(canvas);
        let single_here = self.selection.single().is_some_and(|t| t.canvas == canvas);
        Overlay {
            selected,
            hovered: self
                .hovered
                .filter(|h| h.canvas == canvas)
                .map(|h| h.element),
            editing: self
                .selection
                .single()
                .filter(|t| t.canvas == canvas && self.selection.is_editing_text())
                .map(|t| t.element),
            handles: (single_here && !self.selection.is_editing_text())
                .then(|| self.handle_metrics(canvas)),
            px: view.screen_len_to_logical(1.0),
        }
    }

    /// Rubber band on `canvas` in screen pixels, while one is dragged.
    pub fn marquee(&self, canvas: usize) -> Option<(ScreenPoint, ScreenPoint)> {
        self.tool.marquee_on(canvas)
    }

    /// Draw one canvas with its overlays.
    pub fn render<S: Surface>(&self, surface: &mut S, canvas: usize, assets: &AssetCache<S::Image>) {
        let overlay = self.overlay(canvas);
        render_canvas(
            surface,
            &RenderInput {
                scene: &self.scene,
                canvas_index: canvas,
                assets,
                fonts: &self.fonts,
                overlay: &overlay,
                text_width_fraction: self.config.text_width_fraction,
            },
        );
    }

    /// Draw one canvas for export: no overlays.
    pub fn render_export<S: Surface>(
        &self,
        surface: &mut S,
        canvas: usize,
        assets: &AssetCache<S::Image>,
    ) {
        let overlay = Overlay::none();
        render_canvas(
            surface,
            &RenderInput {
                scene: &self.scene,
                canvas_index: canvas,
                assets,
                fonts: &self.fonts,
                overlay: &overlay,
                text_width_fraction: self.config.text_width_fraction,
            },
        );
    }
}

fn gesture_label(kind: GestureKind) -> &'static str {
    match kind {
        GestureKind::Move => "Move",
        GestureKind::Resize(_) => "Resize",
        GestureKind::Rotate => "Rotate",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session() -> EditorSession {
        let mut s = EditorSession::new(
            EditorConfig::default(),
            SceneModel::new(GlobalSettings::default()),
        );
        s.add_canvas(CanvasId::new("a"), None);
        s.add_canvas(CanvasId::new("b"), None);
        s
    }

    #[test]
    fn handles_only_for_a_single_selection() {
        let mut s = session();
        let a = s.add_text(0, "One", Point::new(100.0, 100.0)).unwrap();
        assert!(s.overlay(0).handles.is_some());
        assert!(s.overlay(1).handles.is_none());

        let b = s.add_text(0, "Two", Point::new(300.0, 300.0)).unwrap();
        s.selection.select_all([SelectionTarget::new(0, a), SelectionTarget::new(0, b)]);
        let overlay = s.overlay(0);
        assert_eq!(overlay.selected, vec![a, b]);
        assert!(overlay.handles.is_none());
    }

    #[test]
    fn marquee_is_visible_while_dragging_and_selects_on_release() {
        let mut s = session();
        let a = s.add_visual(0, "a.png", (100.0, 100.0), Point::new(400.0, 400.0)).unwrap();
        s.deselect();

        let none = Modifiers::NONE;
        s.handle_event(&InputEvent::pointer_down(0, 200.0, 200.0, none), Duration::ZERO);
        s.handle_event(&InputEvent::pointer_move(0, 500.0, 500.0, none), Duration::ZERO);
        assert_eq!(
            s.marquee(0),
            Some((ScreenPoint::new(200.0, 200.0), ScreenPoint::new(500.0, 500.0)))
        );
        assert_eq!(s.marquee(1), None);

        s.handle_event(&InputEvent::pointer_up(0, 500.0, 500.0, none), Duration::ZERO);
        assert_eq!(s.marquee(0), None);
        assert_eq!(s.selection().ids_on(0), vec![a]);
    }

    #[test]
    fn overlay_line_width_follows_zoom() {
        let mut s = session();
        s.set_view(0, ViewTransform::new(0.5, 2.0, ScreenPoint::new(0.0, 0.0)));
        assert_eq!(s.overlay(0).px, 1.0);
        s.set_view(0, ViewTransform::new(0.25, 1.0, ScreenPoint::new(0.0, 0.0)));
        assert_eq!(s.overlay(0).px, 4.0);
    }

    #[test]
    fn zoom_shortcuts_update_every_view() {
        let mut s = session();
        let cmd = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        let out = s.handle_event(&InputEvent::key("=", cmd), Duration::ZERO);
        assert!(out.redraw);
        assert_eq!(s.scene().settings().view.zoom, 1.25);
        assert_eq!(s.view(1).zoom, 1.25);
        // Zoom is a setting: it starts the debounce but is not undoable.
        assert!(s.next_save_wakeup().is_some());
        assert!(!s.can_undo());
    }

    #[test]
    fn removing_the_selected_canvas_fires_the_deselect_edge() {
        let mut s = session();
        s.add_text(1, "Bye", Point::new(10.0, 10.0)).unwrap();
        assert!(s.remove_canvas(1));
        assert!(s.selection().is_empty());
        assert_eq!(s.next_save_wakeup(), Some(Duration::ZERO));
        assert_eq!(s.scene().canvases().len(), 1);
    }

    #[test]
    fn nudge_is_one_undo_step() {
        let mut s = session();
        let id = s.add_text(0, "Hi", Point::new(10.0, 10.0)).unwrap();
        s.handle_event(&InputEvent::key("ArrowRight", Modifiers::shift()), Duration::ZERO);
        assert_eq!(s.scene().element(0, id).unwrap().position, Point::new(20.0, 10.0));
        assert!(s.undo());
        assert_eq!(s.scene().element(0, id).unwrap().position, Point::new(10.0, 10.0));
    }
}
