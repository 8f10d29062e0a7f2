//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. The map lives
//! in Rust so the browser bridge and native hosts share it.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Undo,
    Redo,
    Delete,
    SelectAll,
    /// Enter in-place editing of the selected text element.
    EditText,
    /// Move the selection by one logical unit (ten with Shift).
    Nudge { dx: i8, dy: i8, large: bool },

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomReset,

    // ── Z-order ──
    SendBackward,
    BringForward,
    SendToBack,
    BringToFront,

    // ── Selection ──
    Deselect,
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘, on other
/// platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// While a text element is being edited only Escape is bound; every
    /// other key belongs to the text field.
    pub fn resolve(key: &str, modifiers: Modifiers, editing_text: bool) -> Option<ShortcutAction> {
        if editing_text {
            return (key == "Escape").then_some(ShortcutAction::Deselect);
        }
        let cmd = modifiers.command();

        // ── Modifier combos first (most specific) ──
        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "[" | "{" => Some(ShortcutAction::SendToBack),
                "]" | "}" => Some(ShortcutAction::BringToFront),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomReset),
                "[" => Some(ShortcutAction::SendBackward),
                "]" => Some(ShortcutAction::BringForward),
                _ => None,
            };
        }

        let large = modifiers.shift;
        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            "Enter" => Some(ShortcutAction::EditText),
            "ArrowLeft" => Some(ShortcutAction::Nudge { dx: -1, dy: 0, large }),
            "ArrowRight" => Some(ShortcutAction::Nudge { dx: 1, dy: 0, large }),
            "ArrowUp" => Some(ShortcutAction::Nudge { dx: 0, dy: -1, large }),
            "ArrowDown" => Some(ShortcutAction::Nudge { dx: 0, dy: 1, large }),
            _ => None,
        }
    }
}
