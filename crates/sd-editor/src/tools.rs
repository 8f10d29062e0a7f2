//! Pointer handling for the canvas.
//!
//! The select tool turns input events plus a hit-test result into
//! [`ToolAction`]s; the session applies them to the selection, the
//! transform controller and the scene.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Click | Body drag | Resize handle | Rotate handle |
//! |----------|-------|-----------|---------------|---------------|
//! | **Shift** | Toggle in/out of selection | Axis-constrain | Uniform scale | Snap to 15° |
//! | **Alt** | — | — | Anchor at center | — |

use crate::input::{InputEvent, Modifiers};
use crate::selection::{Selection, SelectionTarget};
use crate::transform::GestureKind;
use sd_core::{ElementId, ScreenPoint};
use sd_render::Handle;

/// What lies under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// A handle of the primary selected element.
    Handle(Handle),
    Element(ElementId),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    Select(SelectionTarget),
    Toggle(SelectionTarget),
    Deselect,
    BeginGesture {
        canvas: usize,
        kind: GestureKind,
        at: ScreenPoint,
    },
    UpdateGesture {
        at: ScreenPoint,
        modifiers: Modifiers,
    },
    EndGesture,
    /// Rubber-band selection between two screen points.
    Marquee {
        canvas: usize,
        from: ScreenPoint,
        to: ScreenPoint,
        additive: bool,
    },
    EditText(SelectionTarget),
}

/// Marquee drags shorter than this (screen px) count as plain clicks.
const MARQUEE_MIN_PX: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Press {
    Idle,
    Gesture,
    Marquee {
        canvas: usize,
        start: ScreenPoint,
        additive: bool,
    },
}

#[derive(Debug, Clone)]
pub struct SelectTool {
    press: Press,
    /// Current marquee corners, for drawing the rubber band.
    pub marquee: Option<(ScreenPoint, ScreenPoint)>,
}

impl Default for SelectTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectTool {
    pub fn new() -> Self {
        Self {
            press: Press::Idle,
            marquee: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.press == Press::Gesture
    }

    /// Rubber band being drawn on `canvas`, in screen pixels.
    pub fn marquee_on(&self, canvas: usize) -> Option<(ScreenPoint, ScreenPoint)> {
        match self.press {
            Press::Marquee { canvas: c, .. } if c == canvas => self.marquee,
            _ => None,
        }
    }

    /// Drop any in-progress press (e.g. after undo mid-drag).
    pub fn cancel(&mut self) {
        self.press = Press::Idle;
        self.marquee = None;
    }

    pub fn handle(&mut self, event: &InputEvent, hit: Hit, selection: &Selection) -> Vec<ToolAction> {
        match event {
            InputEvent::PointerDown {
                canvas,
                at,
                modifiers,
            } => {
                self.marquee = None;
                let canvas = *canvas;
                match hit {
                    Hit::Handle(handle) => {
                        self.press = Press::Gesture;
                        vec![ToolAction::BeginGesture {
                            canvas,
                            kind: GestureKind::from_handle(handle),
                            at: *at,
                        }]
                    }
                    Hit::Element(id) => {
                        let target = SelectionTarget::new(canvas, id);
                        let mut actions = Vec::new();
                        if modifiers.shift {
                            // Shift+click: toggle; only a newly added element starts a drag
                            let removing = selection.contains(target);
                            actions.push(ToolAction::Toggle(target));
                            if removing {
                                self.press = Press::Idle;
                                return actions;
                            }
                        } else if !selection.contains(target) {
                            actions.push(ToolAction::Select(target));
                        }
                        // Clicking an already-selected element keeps the selection for dragging
                        self.press = Press::Gesture;
                        actions.push(ToolAction::BeginGesture {
                            canvas,
                            kind: GestureKind::Move,
                            at: *at,
                        });
                        actions
                    }
                    Hit::Empty => {
                        self.press = Press::Marquee {
                            canvas,
                            start: *at,
                            additive: modifiers.shift,
                        };
                        self.marquee = Some((*at, *at));
                        if modifiers.shift {
                            vec![]
                        } else {
                            vec![ToolAction::Deselect]
                        }
                    }
                }
            }
            InputEvent::PointerMove { at, modifiers, .. } => match self.press {
                Press::Gesture => vec![ToolAction::UpdateGesture {
                    at: *at,
                    modifiers: *modifiers,
                }],
                Press::Marquee { start, .. } => {
                    self.marquee = Some((start, *at));
                    vec![]
                }
                Press::Idle => vec![],
            },
            InputEvent::PointerUp { at, modifiers, .. } => {
                let press = std::mem::replace(&mut self.press, Press::Idle);
                self.marquee = None;
                match press {
                    Press::Gesture => vec![
                        ToolAction::UpdateGesture {
                            at: *at,
                            modifiers: *modifiers,
                        },
                        ToolAction::EndGesture,
                    ],
                    Press::Marquee {
                        canvas,
                        start,
                        additive,
                    } if (at.x - start.x).abs() >= MARQUEE_MIN_PX
                        || (at.y - start.y).abs() >= MARQUEE_MIN_PX =>
                    {
                        vec![ToolAction::Marquee {
                            canvas,
                            from: start,
                            to: *at,
                            additive,
                        }]
                    }
                    _ => vec![],
                }
            }
            InputEvent::DoubleClick { canvas, .. } => match hit {
                Hit::Element(id) => vec![ToolAction::EditText(SelectionTarget::new(*canvas, id))],
                _ => vec![],
            },
            InputEvent::PointerLeave { .. } | InputEvent::Key { .. } => vec![],
        }
    }
}
