//! WASM bridge for Shotdeck: exposes the editor session to the browser.
//!
//! Compiled via `wasm-pack build --target web`. The page owns one
//! `<canvas>` per screenshot canvas, forwards pointer and key events here,
//! loads the images this bridge asks for, and runs the saves it hands out.

mod loads;
mod render2d;

use loads::LoadBook;
use render2d::{BrowserImage, Canvas2d, ContextMeasure};
use sd_core::geometry::Point;
use sd_core::{CanvasId, ElementId, SavedCanvasConfig, ScreenPoint, ViewTransform, ZOrder};
use sd_editor::{EditorConfig, EditorSession, InputEvent, Modifiers, Outcome, SaveError};
use sd_render::assets::required_assets;
use sd_render::{AssetCache, AssetError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

/// One persisted canvas as the page loads it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCanvas {
    id: String,
    #[serde(default)]
    display_order: u32,
    config: SavedCanvasConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveJson<'a> {
    canvas_id: &'a str,
    display_order: u32,
    config: &'a SavedCanvasConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadJson<'a> {
    ticket: u64,
    slot: &'a str,
    source: &'a str,
    device: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeJson<'a> {
    redraw: bool,
    cursor: Option<&'a str>,
    editing: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectionJson<'a> {
    canvas: Option<usize>,
    ids: Vec<&'a str>,
    editing: bool,
}

/// The browser-facing editor controller.
///
/// Holds the editing session and the decoded image cache. All interaction
/// from the page goes through this struct.
#[wasm_bindgen]
pub struct ShotdeckEditor {
    session: EditorSession,
    config: EditorConfig,
    assets: AssetCache<BrowserImage>,
    /// Loads handed to the page and not yet finished.
    loads: LoadBook,
    measure_ctx: Option<CanvasRenderingContext2d>,
}

#[wasm_bindgen]
impl ShotdeckEditor {
    /// Create an editor. `config_json` overrides [`EditorConfig`] defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<ShotdeckEditor, JsValue> {
        console_setup();
        let config = match config_json.as_deref() {
            Some(json) => EditorConfig::from_json(json).map_err(js_error)?,
            None => EditorConfig::default(),
        };
        let session = EditorSession::from_saved(config.clone(), std::iter::empty());
        Ok(Self {
            session,
            config,
            assets: AssetCache::new(),
            loads: LoadBook::default(),
            measure_ctx: None,
        })
    }

    /// Replace the project with saved canvases:
    /// `[{"id", "displayOrder", "config"}]`.
    pub fn load_project(&mut self, json: &str) -> Result<(), JsValue> {
        let mut stored: Vec<StoredCanvas> = serde_json::from_str(json).map_err(js_error)?;
        stored.sort_by_key(|c| c.display_order);
        log::info!("loading {} canvas(es)", stored.len());
        self.session = EditorSession::from_saved(
            self.config.clone(),
            stored.into_iter().map(|c| (CanvasId::new(c.id), c.config)),
        );
        if let Some(ctx) = &self.measure_ctx {
            self.session.set_measure(Box::new(ContextMeasure(ctx.clone())));
        }
        self.loads.clear();
        Ok(())
    }

    /// Use this context to measure text for layout and hit-testing.
    pub fn attach_measure(&mut self, ctx: CanvasRenderingContext2d) {
        self.session.set_measure(Box::new(ContextMeasure(ctx.clone())));
        self.measure_ctx = Some(ctx);
    }

    /// Register a font family that finished loading.
    pub fn add_font(&mut self, family: &str) {
        self.session.fonts_mut().add_family(family);
    }

    // ─── Canvases ────────────────────────────────────────────────────────

    pub fn add_canvas(&mut self, id: &str, source: Option<String>) -> usize {
        self.session.add_canvas(CanvasId::new(id), source)
    }

    pub fn remove_canvas(&mut self, index: usize) -> bool {
        self.session.remove_canvas(index)
    }

    pub fn set_canvas_source(&mut self, index: usize, source: Option<String>) -> bool {
        self.session.set_canvas_source(index, source)
    }

    pub fn canvas_count(&self) -> usize {
        self.session.scene().canvases().len()
    }

    /// Where canvas `index` sits on screen: CSS pixels per logical unit at
    /// zoom 1, active zoom, and the screen position of its origin.
    pub fn set_view(&mut self, index: usize, display_scale: f32, zoom: f32, x: f32, y: f32) {
        self.session.set_view(
            index,
            ViewTransform::new(display_scale, zoom, ScreenPoint::new(x, y)),
        );
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Pointer pressed. Returns `{"redraw", "cursor", "editing"}`.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        canvas: usize,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        now_ms: f64,
    ) -> String {
        let mods = modifiers(shift, ctrl, alt, meta);
        self.dispatch(&InputEvent::pointer_down(canvas, x, y, mods), now_ms)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_move(
        &mut self,
        canvas: usize,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        now_ms: f64,
    ) -> String {
        let mods = modifiers(shift, ctrl, alt, meta);
        self.dispatch(&InputEvent::pointer_move(canvas, x, y, mods), now_ms)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_up(
        &mut self,
        canvas: usize,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        now_ms: f64,
    ) -> String {
        let mods = modifiers(shift, ctrl, alt, meta);
        self.dispatch(&InputEvent::pointer_up(canvas, x, y, mods), now_ms)
    }

    pub fn handle_double_click(&mut self, canvas: usize, x: f32, y: f32, now_ms: f64) -> String {
        let event = InputEvent::DoubleClick {
            canvas,
            at: ScreenPoint::new(x, y),
        };
        self.dispatch(&event, now_ms)
    }

    pub fn handle_pointer_leave(&mut self, canvas: usize, now_ms: f64) -> String {
        self.dispatch(&InputEvent::PointerLeave { canvas }, now_ms)
    }

    /// Keyboard event (`KeyboardEvent.key`).
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
        now_ms: f64,
    ) -> String {
        let mods = modifiers(shift, ctrl, alt, meta);
        self.dispatch(&InputEvent::key(key, mods), now_ms)
    }

    fn dispatch(&mut self, event: &InputEvent, now_ms: f64) -> String {
        let outcome = self.session.handle_event(event, ms(now_ms));
        outcome_json(&outcome)
    }

    // ─── Selection and edits ─────────────────────────────────────────────

    /// `{"canvas", "ids", "editing"}` for the current selection.
    pub fn get_selection(&self) -> String {
        let selection = self.session.selection();
        let json = SelectionJson {
            canvas: selection.canvas_index(),
            ids: selection.targets().iter().map(|t| t.element.as_str()).collect(),
            editing: selection.is_editing_text(),
        };
        serde_json::to_string(&json).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn select(&mut self, canvas: usize, id: &str) -> bool {
        self.session.select(canvas, ElementId::intern(id))
    }

    pub fn deselect(&mut self) -> bool {
        self.session.deselect()
    }

    /// Add a text element; returns its ID.
    pub fn add_text(&mut self, canvas: usize, content: &str, x: f32, y: f32) -> Option<String> {
        self.session
            .add_text(canvas, content, Point::new(x, y))
            .map(|id| id.to_string())
    }

    pub fn add_mockup(
        &mut self,
        canvas: usize,
        screenshot: Option<String>,
        x: f32,
        y: f32,
    ) -> Option<String> {
        self.session
            .add_mockup(canvas, screenshot.as_deref(), Point::new(x, y))
            .map(|id| id.to_string())
    }

    pub fn add_visual(
        &mut self,
        canvas: usize,
        asset: &str,
        width: f32,
        height: f32,
        x: f32,
        y: f32,
    ) -> Option<String> {
        self.session
            .add_visual(canvas, asset, (width, height), Point::new(x, y))
            .map(|id| id.to_string())
    }

    /// Element record as JSON, or `null` when it does not exist.
    pub fn get_element(&self, canvas: usize, id: &str) -> String {
        self.session
            .scene()
            .element(canvas, ElementId::intern(id))
            .and_then(|el| serde_json::to_string(el).ok())
            .unwrap_or_else(|| "null".to_string())
    }

    /// Apply a camelCase property patch to the selection.
    pub fn update_selected(&mut self, patch_json: &str) -> Result<bool, JsValue> {
        let patch = serde_json::from_str(patch_json).map_err(js_error)?;
        Ok(self.session.update_selected(&patch))
    }

    /// Apply a camelCase settings patch; autosaves after the debounce.
    pub fn update_settings(&mut self, patch_json: &str, now_ms: f64) -> Result<bool, JsValue> {
        let patch = serde_json::from_str(patch_json).map_err(js_error)?;
        Ok(self.session.update_settings(patch, ms(now_ms)))
    }

    /// Content of the text element being edited in place.
    pub fn set_editing_text(&mut self, content: &str) -> bool {
        self.session.set_editing_text(content)
    }

    pub fn delete_selected(&mut self) -> bool {
        self.session.delete_selected() > 0
    }

    /// `"forward"`, `"backward"`, `"front"` or `"back"`.
    pub fn reorder_selected(&mut self, op: &str) -> bool {
        let op = match op {
            "forward" => ZOrder::Forward,
            "backward" => ZOrder::Backward,
            "front" => ZOrder::ToFront,
            "back" => ZOrder::ToBack,
            _ => return false,
        };
        self.session.reorder_selected(op)
    }

    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.session.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Draw canvas `index` with editor overlays.
    pub fn render(&self, index: usize, ctx: &CanvasRenderingContext2d) {
        let (w, h) = backing_size(ctx);
        let view = self.session.view(index);
        let mut surface = Canvas2d::begin(ctx, &view, w, h);
        self.session.render(&mut surface, index, &self.assets);
        if let Some((from, to)) = self.session.marquee(index) {
            render2d::draw_marquee(ctx, from, to);
        }
    }

    /// Draw canvas `index` at full logical resolution with no overlays.
    pub fn render_export(&self, index: usize, ctx: &CanvasRenderingContext2d) {
        let (w, h) = backing_size(ctx);
        let view = ViewTransform::IDENTITY;
        let mut surface = Canvas2d::begin(ctx, &view, w, h);
        self.session.render_export(&mut surface, index, &self.assets);
    }

    // ─── Images ──────────────────────────────────────────────────────────

    /// Images the page must start loading:
    /// `[{"ticket", "slot", "source", "device"}]`. Pass `ticket` back to
    /// [`finish_load`](Self::finish_load) or [`fail_load`](Self::fail_load).
    /// Unused images are dropped.
    pub fn pending_loads(&mut self) -> String {
        let scene = self.session.scene();
        let mut needed: Vec<(String, sd_render::AssetKey)> = Vec::new();
        for canvas in scene.canvases() {
            for (slot, key) in required_assets(canvas, scene.settings()) {
                if !needed.iter().any(|(s, _)| *s == slot) {
                    needed.push((slot, key));
                }
            }
        }
        let started = self.loads.issue(&mut self.assets, needed);
        let json: Vec<LoadJson<'_>> = started
            .iter()
            .map(|t| LoadJson {
                ticket: t.serial(),
                slot: &t.slot,
                source: &t.key.source,
                device: &t.key.device,
            })
            .collect();
        serde_json::to_string(&json).unwrap_or_else(|_| "[]".to_string())
    }

    /// A load finished. Returns `true` when the image was accepted and the
    /// canvas should be redrawn; images of superseded loads are dropped.
    pub fn finish_load(&mut self, ticket: f64, image: HtmlImageElement) -> bool {
        let Some(ticket) = self.loads.take(ticket as u64) else {
            log::debug!("dropping image of superseded load #{ticket}");
            return false;
        };
        let result = if image.natural_width() == 0 || image.natural_height() == 0 {
            Err(AssetError::Empty)
        } else {
            Ok(BrowserImage(image))
        };
        self.assets.complete(&ticket, result)
    }

    pub fn fail_load(&mut self, ticket: f64, reason: &str) -> bool {
        let Some(ticket) = self.loads.take(ticket as u64) else {
            return false;
        };
        let err = AssetError::Fetch {
            url: ticket.key.source.clone(),
            reason: reason.to_string(),
        };
        self.assets.complete(&ticket, Err(err))
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Saves due at `now_ms`: `[{"canvasId", "displayOrder", "config"}]`.
    /// Report each one back through [`Self::complete_save`].
    pub fn poll_saves(&mut self, now_ms: f64) -> String {
        let requests = self.session.poll_saves(ms(now_ms));
        let json: Vec<SaveJson<'_>> = requests
            .iter()
            .map(|r| SaveJson {
                canvas_id: r.canvas_id.as_str(),
                display_order: r.display_order,
                config: &r.config,
            })
            .collect();
        serde_json::to_string(&json).unwrap_or_else(|e| {
            log::error!("cannot serialize save requests: {e}");
            "[]".to_string()
        })
    }

    /// Outcome of a save. Returns the message to show on failure, if any.
    pub fn complete_save(&mut self, canvas_id: &str, ok: bool, message: &str) -> Option<String> {
        let result = if ok {
            Ok(())
        } else {
            Err(SaveError::Rejected {
                canvas: CanvasId::new(canvas_id),
                reason: message.to_string(),
            })
        };
        self.session
            .complete_save(&CanvasId::new(canvas_id), result)
            .map(|notice| notice.message)
    }

    /// Save everything dirty at the next poll (e.g. on `visibilitychange`).
    pub fn flush_saves(&mut self) {
        self.session.flush_saves();
    }

    /// Milliseconds timestamp at which `poll_saves` next has work.
    pub fn next_save_wakeup(&self) -> Option<f64> {
        self.session
            .next_save_wakeup()
            .map(|d| d.as_secs_f64() * 1000.0)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.session.has_unsaved_changes()
    }
}

fn modifiers(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers {
        shift,
        alt,
        ctrl,
        meta,
    }
}

fn ms(now_ms: f64) -> Duration {
    Duration::from_secs_f64(now_ms.max(0.0) / 1000.0)
}

fn outcome_json(outcome: &Outcome) -> String {
    let json = OutcomeJson {
        redraw: outcome.redraw,
        cursor: outcome.cursor,
        editing: outcome.editing.as_ref().map(|t| t.element.as_str()),
    };
    serde_json::to_string(&json).unwrap_or_else(|_| r#"{"redraw":true}"#.to_string())
}

fn backing_size(ctx: &CanvasRenderingContext2d) -> (f64, f64) {
    ctx.canvas()
        .map(|c| (c.width() as f64, c.height() as f64))
        .unwrap_or((0.0, 0.0))
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// ─── Console logging and panic hook ──────────────────────────────────────

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg: JsValue = format!("[{}] {}", record.target(), record.args()).into();
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            log::Level::Info => web_sys::console::info_1(&msg),
            _ => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
static LOGGER: ConsoleLogger = ConsoleLogger;

fn console_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Shotdeck WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Info);
            }
        });
    }
}

/// Validate a saved canvas configuration. Returns JSON: `{"ok":true}` or
/// `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_canvas_config(json: &str) -> String {
    let result = match SavedCanvasConfig::from_json(json) {
        Ok(_) => serde_json::json!({ "ok": true }),
        Err(e) => serde_json::json!({ "ok": false, "error": e.to_string() }),
    };
    result.to_string()
}
