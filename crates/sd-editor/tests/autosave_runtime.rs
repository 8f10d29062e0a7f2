//! Integration tests: the tokio autosave driver against a fake store.

#![cfg(feature = "runtime")]

use pretty_assertions::assert_eq;
use sd_core::geometry::Point;
use sd_core::*;
use sd_editor::runtime::{Autosaver, ConfigStore};
use sd_editor::{SaveError, SaveRequest};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every save and how many ran at once per canvas.
#[derive(Default)]
struct FakeStore {
    latency: Duration,
    fail_first: AtomicUsize,
    saved: Mutex<Vec<SaveRequest>>,
    active: Mutex<HashMap<CanvasId, usize>>,
    max_overlap: AtomicUsize,
}

impl FakeStore {
    fn with_latency(ms: u64) -> Arc<Self> {
        Arc::new(Self {
            latency: Duration::from_millis(ms),
            ..Default::default()
        })
    }

    fn saved(&self) -> Vec<SaveRequest> {
        self.saved.lock().unwrap().clone()
    }
}

impl ConfigStore for FakeStore {
    async fn save(&self, request: SaveRequest) -> Result<(), SaveError> {
        {
            let mut active = self.active.lock().unwrap();
            let n = active.entry(request.canvas_id.clone()).or_default();
            *n += 1;
            self.max_overlap.fetch_max(*n, Ordering::SeqCst);
        }
        tokio::time::sleep(self.latency).await;
        *self
            .active
            .lock()
            .unwrap()
            .entry(request.canvas_id.clone())
            .or_default() -= 1;

        if self.fail_first.load(Ordering::SeqCst) > 0 {
            self.fail_first.fetch_sub(1, Ordering::SeqCst);
            return Err(SaveError::Unavailable("store offline".into()));
        }
        self.saved.lock().unwrap().push(request);
        Ok(())
    }
}

fn scene(n: u32) -> SceneModel {
    let mut scene = SceneModel::new(GlobalSettings::default());
    for i in 0..n {
        scene.add_canvas(CanvasInstance::new(CanvasId::new(format!("c{i}")), None, i));
    }
    scene
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ─── Debounce ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn settings_change_saves_after_two_seconds() {
    init_logs();
    let store = FakeStore::with_latency(0);
    let mut s = scene(2);
    let handle = Autosaver::spawn(Arc::clone(&store), s.clone(), Duration::from_secs(2));

    s.update_global_settings(SettingsPatch {
        device_frame: Some("ipad-pro-13".into()),
        ..Default::default()
    });
    handle.settings_changed(&s);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(store.saved().is_empty());

    // A second change restarts the window.
    handle.settings_changed(&s);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(store.saved().is_empty());

    tokio::time::sleep(Duration::from_millis(600)).await;
    let saved = store.saved();
    assert_eq!(saved.len(), 2);
    assert!(saved.iter().all(|r| r.config.device_frame == "ipad-pro-13"));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn deselect_saves_immediately() {
    let store = FakeStore::with_latency(0);
    let mut s = scene(3);
    let handle = Autosaver::spawn(Arc::clone(&store), s.clone(), Duration::from_secs(2));

    s.add_element(2, create_text_element("Hello", Point::new(10.0, 10.0)));
    handle.selection_cleared(&s);
    handle.flush().await;

    let saved = store.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].canvas_id, CanvasId::new("c2"));
    handle.shutdown().await;
}

// ─── Concurrency ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn saves_never_overlap_on_one_canvas() {
    init_logs();
    let store = FakeStore::with_latency(500);
    let mut s = scene(1);
    let handle = Autosaver::spawn(Arc::clone(&store), s.clone(), Duration::from_secs(2));

    let id = s
        .add_element(0, create_text_element("First", Point::ZERO))
        .unwrap();
    handle.selection_cleared(&s);
    tokio::time::sleep(Duration::from_millis(100)).await;

    s.update_element(
        0,
        id,
        &ElementPatch {
            content: Some("Second".into()),
            ..Default::default()
        },
    );
    handle.selection_cleared(&s);
    handle.flush().await;

    assert_eq!(store.max_overlap.load(Ordering::SeqCst), 1);
    let saved = store.saved();
    assert_eq!(saved.len(), 2);
    let last = saved[1].config.elements()[0].as_text().unwrap();
    assert_eq!(last.content, "Second");
    handle.shutdown().await;
}

// ─── Failures ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn failure_is_reported_and_retried_on_the_next_trigger() {
    let store = Arc::new(FakeStore {
        fail_first: AtomicUsize::new(1),
        ..Default::default()
    });
    let mut s = scene(1);
    let mut handle = Autosaver::spawn(Arc::clone(&store), s.clone(), Duration::from_secs(2));

    s.add_element(0, create_text_element("Retry", Point::ZERO));
    handle.selection_cleared(&s);
    let notice = handle.next_notice().await.unwrap();
    assert_eq!(notice.canvas_id, CanvasId::new("c0"));
    assert!(notice.message.contains("store offline"));
    assert!(store.saved().is_empty());

    handle.selection_cleared(&s);
    handle.flush().await;
    assert_eq!(store.saved().len(), 1);
    assert!(handle.try_notice().is_none());
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_writes_pending_changes() {
    let store = FakeStore::with_latency(50);
    let mut s = scene(2);
    let handle = Autosaver::spawn(Arc::clone(&store), s.clone(), Duration::from_secs(2));

    s.add_element(1, create_text_element("Unsaved", Point::ZERO));
    handle.scene_changed(&s);
    handle.shutdown().await;

    let saved = store.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].canvas_id, CanvasId::new("c1"));
}
