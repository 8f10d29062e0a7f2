//! Which elements the user is working on.
//!
//! The primary target is the most recently selected entry; it is what
//! `canvas_index()`/`element_id()` report and what handles are drawn for.
//! Every operation that can empty the selection reports whether it did so,
//! so the session can forward the "selected → none" edge to autosave.

use sd_core::{ElementId, SceneModel};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionTarget {
    pub canvas: usize,
    pub element: ElementId,
}

impl SelectionTarget {
    pub fn new(canvas: usize, element: ElementId) -> Self {
        Self { canvas, element }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Oldest first; the last entry is the primary target.
    targets: SmallVec<[SelectionTarget; 4]>,
    editing_text: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn primary(&self) -> Option<SelectionTarget> {
        self.targets.last().copied()
    }

    pub fn canvas_index(&self) -> Option<usize> {
        self.primary().map(|t| t.canvas)
    }

    pub fn element_id(&self) -> Option<ElementId> {
        self.primary().map(|t| t.element)
    }

    /// Single selection: the primary target when nothing else is selected.
    pub fn single(&self) -> Option<SelectionTarget> {
        match self.targets.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn is_editing_text(&self) -> bool {
        self.editing_text
    }

    pub fn targets(&self) -> &[SelectionTarget] {
        &self.targets
    }

    pub fn contains(&self, target: SelectionTarget) -> bool {
        self.targets.contains(&target)
    }

    /// Selected element IDs on one canvas.
    pub fn ids_on(&self, canvas: usize) -> Vec<ElementId> {
        self.targets
            .iter()
            .filter(|t| t.canvas == canvas)
            .map(|t| t.element)
            .collect()
    }

    /// Replace the selection with one target.
    pub fn select(&mut self, target: SelectionTarget) {
        if self.single() != Some(target) {
            self.editing_text = false;
        }
        self.targets.clear();
        self.targets.push(target);
    }

    /// Replace the selection with many targets. An empty list clears;
    /// returns `true` when that cleared a non-empty selection.
    pub fn select_all(&mut self, targets: impl IntoIterator<Item = SelectionTarget>) -> bool {
        let was_selected = !self.is_empty();
        self.targets.clear();
        self.editing_text = false;
        for t in targets {
            if !self.targets.contains(&t) {
                self.targets.push(t);
            }
        }
        was_selected && self.is_empty()
    }

    /// Shift-click: add or remove one target. Returns `true` when this
    /// removed the last target.
    pub fn toggle(&mut self, target: SelectionTarget) -> bool {
        self.editing_text = false;
        if let Some(pos) = self.targets.iter().position(|t| *t == target) {
            self.targets.remove(pos);
            self.targets.is_empty()
        } else {
            self.targets.push(target);
            false
        }
    }

    /// Clear everything. Returns `true` when something was selected.
    pub fn clear(&mut self) -> bool {
        let was_selected = !self.is_empty();
        self.targets.clear();
        self.editing_text = false;
        was_selected
    }

    /// Enter text editing. Only a single selected text element can be
    /// edited in place.
    pub fn begin_text_edit(&mut self, scene: &SceneModel) -> bool {
        let Some(t) = self.single() else {
            return false;
        };
        self.editing_text = scene
            .element(t.canvas, t.element)
            .is_some_and(|el| el.is_text());
        self.editing_text
    }

    /// Drop targets whose element no longer exists (after delete or undo).
    /// Returns `true` when that emptied a non-empty selection.
    pub fn retain_existing(&mut self, scene: &SceneModel) -> bool {
        if self.is_empty() {
            return false;
        }
        self.targets
            .retain(|t| scene.element(t.canvas, t.element).is_some());
        if self.single().is_none() {
            self.editing_text = false;
        }
        self.is_empty()
    }

    /// Forget targets on a removed canvas and shift later indices down.
    pub fn canvas_removed(&mut self, index: usize) -> bool {
        if self.is_empty() {
            return false;
        }
        self.targets.retain(|t| t.canvas != index);
        for t in self.targets.iter_mut() {
            if t.canvas > index {
                t.canvas -= 1;
            }
        }
        if self.targets.is_empty() {
            self.editing_text = false;
            return true;
        }
        false
    }
}
