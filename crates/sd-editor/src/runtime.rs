//! Tokio driver for the persistence bridge.
//!
//! [`Autosaver::spawn`] starts a background task that owns a
//! [`PersistenceBridge`], the latest scene snapshot, and a [`ConfigStore`].
//! The host sends scene snapshots and triggers through the returned
//! [`AutosaveHandle`]; the task sleeps until the debounce deadline, runs
//! due saves concurrently (at most one per canvas) and forwards failure
//! notices back to the host.

use crate::autosave::{PersistenceBridge, SaveNotice, SaveRequest};
use crate::error::SaveError;
use sd_core::{CanvasId, SceneModel};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// The external save interface.
pub trait ConfigStore: Send + Sync + 'static {
    fn save(&self, request: SaveRequest) -> impl Future<Output = Result<(), SaveError>> + Send;
}

enum Message {
    SceneChanged(SceneModel),
    SettingsChanged(SceneModel),
    SelectionCleared(SceneModel),
    Flush(oneshot::Sender<()>),
}

type Completion = (CanvasId, Result<(), SaveError>);

/// Reports a save's outcome exactly once, even if the save task panics
/// or is dropped before finishing.
struct CompletionGuard {
    tx: mpsc::UnboundedSender<Completion>,
    canvas: Option<CanvasId>,
}

impl CompletionGuard {
    fn finish(mut self, result: Result<(), SaveError>) {
        if let Some(canvas) = self.canvas.take() {
            let _ = self.tx.send((canvas, result));
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(canvas) = self.canvas.take() {
            let _ = self.tx.send((canvas, Err(SaveError::Aborted)));
        }
    }
}

/// Host side of a running autosave task.
pub struct AutosaveHandle {
    tx: mpsc::UnboundedSender<Message>,
    notices: mpsc::UnboundedReceiver<SaveNotice>,
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    /// The scene changed without triggering a save (e.g. mid-gesture).
    pub fn scene_changed(&self, scene: &SceneModel) {
        self.send(Message::SceneChanged(scene.clone()));
    }

    /// A global setting changed; saves after the debounce window.
    pub fn settings_changed(&self, scene: &SceneModel) {
        self.send(Message::SettingsChanged(scene.clone()));
    }

    /// The selection went from something to nothing; saves right away.
    pub fn selection_cleared(&self, scene: &SceneModel) {
        self.send(Message::SelectionCleared(scene.clone()));
    }

    fn send(&self, msg: Message) {
        if self.tx.send(msg).is_err() {
            log::warn!("autosave task is gone; change not persisted");
        }
    }

    /// Save every dirty canvas and wait until nothing is in flight.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(Message::Flush(tx));
        let _ = rx.await;
    }

    /// Next failure notice, if one is waiting.
    pub fn try_notice(&mut self) -> Option<SaveNotice> {
        self.notices.try_recv().ok()
    }

    pub async fn next_notice(&mut self) -> Option<SaveNotice> {
        self.notices.recv().await
    }

    /// Flush, then stop the task.
    pub async fn shutdown(self) {
        self.flush().await;
        drop(self.tx);
        if let Err(e) = self.task.await {
            log::warn!("autosave task ended abnormally: {e}");
        }
    }
}

pub struct Autosaver<S> {
    store: Arc<S>,
    bridge: PersistenceBridge,
    scene: SceneModel,
    start: Instant,
    notices: mpsc::UnboundedSender<SaveNotice>,
    done_tx: mpsc::UnboundedSender<Completion>,
    waiters: Vec<oneshot::Sender<()>>,
}

impl<S: ConfigStore> Autosaver<S> {
    /// Start autosaving `scene`, whose current state counts as saved.
    pub fn spawn(store: Arc<S>, scene: SceneModel, debounce: Duration) -> AutosaveHandle {
        let mut bridge = PersistenceBridge::new(debounce);
        bridge.mark_saved(&scene);
        let (tx, rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let saver = Autosaver {
            store,
            bridge,
            scene,
            start: Instant::now(),
            notices: notice_tx,
            done_tx,
            waiters: Vec::new(),
        };
        let task = tokio::spawn(saver.run(rx, done_rx));
        AutosaveHandle {
            tx,
            notices: notice_rx,
            task,
        }
    }

    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Message>,
        mut done_rx: mpsc::UnboundedReceiver<Completion>,
    ) {
        log::debug!("autosave task started");
        let mut open = true;
        loop {
            self.dispatch();
            self.release_waiters();
            if !open && !self.bridge.is_saving() {
                break;
            }

            let wake = self.bridge.next_wakeup().map(|d| self.start + d);
            tokio::select! {
                msg = rx.recv(), if open => match msg {
                    Some(msg) => self.on_message(msg),
                    None => {
                        // Host dropped the handle: final save, then exit.
                        open = false;
                        self.bridge.flush();
                    }
                },
                Some((canvas, result)) = done_rx.recv() => {
                    if let Some(notice) = self.bridge.complete(&canvas, result) {
                        let _ = self.notices.send(notice);
                    }
                }
                _ = sleep_until(wake), if wake.is_some() => {}
            }
        }
        log::debug!("autosave task stopped");
    }

    fn on_message(&mut self, msg: Message) {
        match msg {
            Message::SceneChanged(scene) => self.scene = scene,
            Message::SettingsChanged(scene) => {
                self.scene = scene;
                let now = self.now();
                self.bridge.settings_changed(now);
            }
            Message::SelectionCleared(scene) => {
                self.scene = scene;
                self.bridge.selection_cleared();
            }
            Message::Flush(waiter) => {
                self.bridge.flush();
                self.waiters.push(waiter);
            }
        }
    }

    /// Spawn every save that is due now.
    fn dispatch(&mut self) {
        let now = self.now();
        for request in self.bridge.poll(now, &self.scene) {
            let store = Arc::clone(&self.store);
            let guard = CompletionGuard {
                tx: self.done_tx.clone(),
                canvas: Some(request.canvas_id.clone()),
            };
            tokio::spawn(async move {
                let result = store.save(request).await;
                guard.finish(result);
            });
        }
    }

    /// Wake `flush` callers once the work they asked for is done.
    fn release_waiters(&mut self) {
        let busy = self.bridge.is_saving() || self.bridge.next_wakeup() == Some(Duration::ZERO);
        if self.waiters.is_empty() || busy {
            return;
        }
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(());
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}
