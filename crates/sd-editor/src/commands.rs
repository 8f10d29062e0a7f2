//! Undo/Redo command stack.
//!
//! Scene snapshots make every edit trivially reversible: a `SceneModel`
//! clone shares its element records through `Arc`, so capturing one costs
//! a refcount per element. A command stores the scene before and after.
//!
//! Drag gestures are batched: the snapshot is taken at pointer-down and
//! compared at pointer-up, so the whole gesture is one undo step no matter
//! how many live updates it produced.

use sd_core::SceneModel;

#[derive(Debug, Clone)]
pub struct Command {
    before: SceneModel,
    after: SceneModel,
    pub description: String,
}

/// Manages undo/redo stacks with batch grouping for drag gestures.
#[derive(Debug)]
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Scene captured at the start of the outermost batch.
    batch_snapshot: Option<(SceneModel, String)>,
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            batch_depth: 0,
            batch_snapshot: None,
        }
    }

    /// Start a batch group. Edits until the matching [`end_batch`] are
    /// applied live but recorded as one step.
    ///
    /// [`end_batch`]: CommandStack::end_batch
    pub fn begin_batch(&mut self, scene: &SceneModel, description: &str) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some((scene.clone(), description.to_string()));
        }
        self.batch_depth += 1;
    }

    /// Close a batch. When the outermost batch closes and the scene
    /// changed, one command is pushed. Returns whether it was.
    pub fn end_batch(&mut self, scene: &SceneModel) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return false;
        }
        let Some((before, description)) = self.batch_snapshot.take() else {
            return false;
        };
        if before.version() == scene.version() {
            return false;
        }
        self.push(Command {
            before,
            after: scene.clone(),
            description,
        });
        true
    }

    /// Run `edit` against the scene and record it. Inside a batch the
    /// edit is only applied; the batch records the cumulative effect.
    pub fn execute<R>(
        &mut self,
        scene: &mut SceneModel,
        description: &str,
        edit: impl FnOnce(&mut SceneModel) -> R,
    ) -> R {
        if self.batch_depth > 0 {
            return edit(scene);
        }
        let before = scene.clone();
        let result = edit(scene);
        if scene.version() != before.version() {
            self.push(Command {
                before,
                after: scene.clone(),
                description: description.to_string(),
            });
        }
        result
    }

    fn push(&mut self, cmd: Command) {
        log::debug!("record '{}'", cmd.description);
        self.undo_stack.push(cmd);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // New action invalidates the redo history
        self.redo_stack.clear();
    }

    /// Undo the last command. Returns its description.
    pub fn undo(&mut self, scene: &mut SceneModel) -> Option<String> {
        if self.batch_depth > 0 {
            return None;
        }
        let cmd = self.undo_stack.pop()?;
        scene.restore(&cmd.before);
        let desc = cmd.description.clone();
        self.redo_stack.push(cmd);
        Some(desc)
    }

    /// Redo the last undone command. Returns its description.
    pub fn redo(&mut self, scene: &mut SceneModel) -> Option<String> {
        if self.batch_depth > 0 {
            return None;
        }
        let cmd = self.redo_stack.pop()?;
        scene.restore(&cmd.after);
        let desc = cmd.description.clone();
        self.undo_stack.push(cmd);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sd_core::geometry::Point;
    use sd_core::{CanvasId, CanvasInstance, ElementPatch, GlobalSettings, create_text_element};

    fn scene() -> SceneModel {
        let mut scene = SceneModel::new(GlobalSettings::default());
        scene.add_canvas(CanvasInstance::new(CanvasId::new("c"), None, 0));
        scene
    }

    #[test]
    fn undo_redo_single_edit() {
        let mut scene = scene();
        let mut stack = CommandStack::new(10);
        let id = stack
            .execute(&mut scene, "Add text", |s| {
                s.add_element(0, create_text_element("Hi", Point::ZERO))
            })
            .unwrap();
        assert!(stack.can_undo());

        assert_eq!(stack.undo(&mut scene).as_deref(), Some("Add text"));
        assert!(scene.element(0, id).is_none());
        assert_eq!(stack.redo(&mut scene).as_deref(), Some("Add text"));
        assert!(scene.element(0, id).is_some());
    }

    #[test]
    fn no_op_edits_are_not_recorded() {
        let mut scene = scene();
        let mut stack = CommandStack::new(10);
        let missing = create_text_element("x", Point::ZERO).id;
        stack.execute(&mut scene, "Delete", |s| s.delete_element(0, missing));
        assert!(!stack.can_undo());
    }

    #[test]
    fn batch_collapses_a_gesture() {
        let mut scene = scene();
        let mut stack = CommandStack::new(10);
        let id = stack
            .execute(&mut scene, "Add", |s| {
                s.add_element(0, create_text_element("Hi", Point::ZERO))
            })
            .unwrap();

        stack.begin_batch(&scene, "Move");
        for x in 1..=20 {
            let patch = ElementPatch {
                position: Some(Point::new(x as f32, 0.0)),
                ..Default::default()
            };
            stack.execute(&mut scene, "Move", |s| s.update_element(0, id, &patch));
        }
        assert!(stack.end_batch(&scene));

        assert_eq!(stack.undo(&mut scene).as_deref(), Some("Move"));
        assert_eq!(scene.element(0, id).unwrap().position, Point::ZERO);
        assert_eq!(stack.undo(&mut scene).as_deref(), Some("Add"));
        assert!(!stack.can_undo());
    }

    #[test]
    fn empty_batch_pushes_nothing() {
        let scene = scene();
        let mut stack = CommandStack::new(10);
        stack.begin_batch(&scene, "Move");
        assert!(!stack.end_batch(&scene));
        assert!(!stack.can_undo());
    }

    #[test]
    fn depth_is_bounded_and_new_edits_clear_redo() {
        let mut scene = scene();
        let mut stack = CommandStack::new(2);
        for i in 0..3 {
            stack.execute(&mut scene, &format!("Add {i}"), |s| {
                s.add_element(0, create_text_element("t", Point::ZERO))
            });
        }
        assert_eq!(stack.undo(&mut scene).as_deref(), Some("Add 2"));
        assert_eq!(stack.undo(&mut scene).as_deref(), Some("Add 1"));
        assert_eq!(stack.undo(&mut scene), None);
        assert_eq!(scene.canvas(0).unwrap().elements.len(), 1);

        stack.execute(&mut scene, "Add again", |s| {
            s.add_element(0, create_text_element("t", Point::ZERO))
        });
        assert!(!stack.can_redo());
    }
}
