//! Input abstraction layer.
//!
//! Normalizes mouse, touch and keyboard events into a unified
//! [`InputEvent`] consumed by the select tool. Pointer positions stay in
//! screen pixels here; they become logical points only through the
//! canvas' [`sd_core::ViewTransform`].

use sd_core::ScreenPoint;

/// Keyboard modifier state at the time of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }

    /// Ctrl on Windows/Linux, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A normalized input event. Pointer events name the canvas they
/// landed on.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start).
    PointerDown {
        canvas: usize,
        at: ScreenPoint,
        modifiers: Modifiers,
    },

    PointerMove {
        canvas: usize,
        at: ScreenPoint,
        modifiers: Modifiers,
    },

    PointerUp {
        canvas: usize,
        at: ScreenPoint,
        modifiers: Modifiers,
    },

    /// Double click / double tap: enters text editing.
    DoubleClick { canvas: usize, at: ScreenPoint },

    /// Pointer left the canvas.
    PointerLeave { canvas: usize },

    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn pointer_down(canvas: usize, x: f32, y: f32, modifiers: Modifiers) -> Self {
        Self::PointerDown {
            canvas,
            at: ScreenPoint::new(x, y),
            modifiers,
        }
    }

    pub fn pointer_move(canvas: usize, x: f32, y: f32, modifiers: Modifiers) -> Self {
        Self::PointerMove {
            canvas,
            at: ScreenPoint::new(x, y),
            modifiers,
        }
    }

    pub fn pointer_up(canvas: usize, x: f32, y: f32, modifiers: Modifiers) -> Self {
        Self::PointerUp {
            canvas,
            at: ScreenPoint::new(x, y),
            modifiers,
        }
    }

    pub fn key(key: &str, modifiers: Modifiers) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers,
        }
    }

    /// Canvas and position if this is a pointer event.
    pub fn position(&self) -> Option<(usize, ScreenPoint)> {
        match self {
            Self::PointerDown { canvas, at, .. }
            | Self::PointerMove { canvas, at, .. }
            | Self::PointerUp { canvas, at, .. }
            | Self::DoubleClick { canvas, at } => Some((*canvas, *at)),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            Self::PointerDown { modifiers, .. }
            | Self::PointerMove { modifiers, .. }
            | Self::PointerUp { modifiers, .. }
            | Self::Key { modifiers, .. } => *modifiers,
            _ => Modifiers::NONE,
        }
    }
}
