//! Persistence bridge: decides when and what to save.
//!
//! The bridge does no I/O and reads no clock. Hosts feed it triggers and a
//! monotonic `now`, call [`PersistenceBridge::poll`] to get the saves that
//! are due, run them however they like, and report back through
//! [`PersistenceBridge::complete`]. The browser drives it from JS timers;
//! [`crate::runtime`] drives it with tokio.
//!
//! Two triggers exist: a debounce after a global-settings change, and the
//! selection going from something to nothing. When one fires, every
//! canvas whose serialized form differs from the last saved one gets one
//! save request. A canvas never has two saves in flight; a trigger that
//! finds one running is replayed when it completes.

use crate::error::SaveError;
use sd_core::{CanvasId, CanvasSnapshot, SavedCanvasConfig, SceneModel};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// One canvas to write through the external save interface.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub canvas_id: CanvasId,
    pub config: SavedCanvasConfig,
    pub display_order: u32,
}

/// Transient message for the host UI after a failed save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveNotice {
    pub canvas_id: CanvasId,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    Debounce,
    Deselect,
    /// Replay of a trigger that hit an in-flight save.
    Deferred,
    /// Explicit request (e.g. before the page unloads).
    Flush,
}

#[derive(Debug)]
pub struct PersistenceBridge {
    debounce: Duration,
    /// When the settings debounce fires.
    deadline: Option<Duration>,
    triggered: Option<SaveTrigger>,
    /// Last successfully saved snapshot per canvas.
    saved: HashMap<CanvasId, CanvasSnapshot>,
    /// Snapshot being written per canvas.
    in_flight: HashMap<CanvasId, CanvasSnapshot>,
    /// Canvases that changed again while their save was running.
    deferred: HashSet<CanvasId>,
}

impl PersistenceBridge {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            deadline: None,
            triggered: None,
            saved: HashMap::new(),
            in_flight: HashMap::new(),
            deferred: HashSet::new(),
        }
    }

    /// Treat the current state of every canvas as saved (after loading).
    pub fn mark_saved(&mut self, scene: &SceneModel) {
        for canvas in scene.canvases() {
            match CanvasSnapshot::capture(canvas, scene.settings()) {
                Ok(snap) => {
                    self.saved.insert(canvas.id.clone(), snap);
                }
                Err(e) => log::warn!("cannot snapshot canvas {}: {e}", canvas.id),
            }
        }
    }

    /// Stop tracking a removed canvas.
    pub fn forget(&mut self, canvas_id: &CanvasId) {
        self.saved.remove(canvas_id);
        self.deferred.remove(canvas_id);
    }

    /// A global setting changed: (re)start the debounce window.
    pub fn settings_changed(&mut self, now: Duration) {
        log::debug!("settings changed, autosave in {:?}", self.debounce);
        self.deadline = Some(now + self.debounce);
    }

    /// The selection went from something to nothing.
    pub fn selection_cleared(&mut self) {
        self.fire(SaveTrigger::Deselect);
    }

    /// Save every dirty canvas at the next poll.
    pub fn flush(&mut self) {
        self.fire(SaveTrigger::Flush);
    }

    fn fire(&mut self, trigger: SaveTrigger) {
        if self.triggered.is_none() {
            self.triggered = Some(trigger);
        }
    }

    /// Earliest time `poll` has work to do, if any.
    pub fn next_wakeup(&self) -> Option<Duration> {
        if self.triggered.is_some() {
            Some(Duration::ZERO)
        } else {
            self.deadline
        }
    }

    pub fn is_saving(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Whether any canvas differs from what was last saved.
    pub fn is_dirty(&self, scene: &SceneModel) -> bool {
        scene.canvases().iter().any(|canvas| {
            CanvasSnapshot::capture(canvas, scene.settings())
                .map(|snap| self.saved.get(&canvas.id) != Some(&snap))
                .unwrap_or(true)
        })
    }

    /// Saves due at `now`. Empty unless a trigger fired.
    pub fn poll(&mut self, now: Duration, scene: &SceneModel) -> Vec<SaveRequest> {
        let trigger = match self.triggered.take() {
            Some(t) => t,
            None if self.deadline.is_some_and(|d| now >= d) => SaveTrigger::Debounce,
            None => return Vec::new(),
        };
        // Any trigger compares every canvas, which covers a pending debounce.
        self.deadline = None;
        self.evaluate(scene, trigger)
    }

    fn evaluate(&mut self, scene: &SceneModel, trigger: SaveTrigger) -> Vec<SaveRequest> {
        let mut requests = Vec::new();
        for canvas in scene.canvases() {
            let config = SavedCanvasConfig::from_canvas(canvas, scene.settings());
            let snap = match CanvasSnapshot::encode(&config) {
                Ok(snap) => snap,
                Err(e) => {
                    log::warn!("cannot snapshot canvas {}: {e}", canvas.id);
                    continue;
                }
            };
            if self.saved.get(&canvas.id) == Some(&snap) {
                continue;
            }
            if let Some(running) = self.in_flight.get(&canvas.id) {
                if *running != snap {
                    log::debug!("canvas {} busy, deferring {trigger:?}", canvas.id);
                    self.deferred.insert(canvas.id.clone());
                }
                continue;
            }
            self.in_flight.insert(canvas.id.clone(), snap);
            requests.push(SaveRequest {
                canvas_id: canvas.id.clone(),
                config,
                display_order: canvas.display_order,
            });
        }
        if !requests.is_empty() {
            log::debug!("{trigger:?}: saving {} canvas(es)", requests.len());
        }
        requests
    }

    /// Record the outcome of a save issued by `poll`. Failures keep the
    /// previous saved state, so the canvas stays dirty and is retried on
    /// the next trigger.
    pub fn complete(
        &mut self,
        canvas_id: &CanvasId,
        result: Result<(), SaveError>,
    ) -> Option<SaveNotice> {
        let Some(snap) = self.in_flight.remove(canvas_id) else {
            log::warn!("completion for canvas {canvas_id} with no save in flight");
            return None;
        };
        if self.deferred.remove(canvas_id) {
            self.fire(SaveTrigger::Deferred);
        }
        match result {
            Ok(()) => {
                log::debug!("saved canvas {canvas_id}");
                self.saved.insert(canvas_id.clone(), snap);
                None
            }
            Err(e) => {
                log::warn!("save of canvas {canvas_id} failed: {e}");
                Some(SaveNotice {
                    canvas_id: canvas_id.clone(),
                    message: e.to_string(),
                })
            }
        }
    }
}
