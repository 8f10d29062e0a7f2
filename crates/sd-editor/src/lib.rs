//! Editor engine for Shotdeck canvases.
//!
//! [`EditorSession`] is the entry point: it turns pointer and key events
//! into scene edits through the select tool and transform controller,
//! records them for undo, and tells the host when canvases need saving.

pub mod autosave;
pub mod commands;
pub mod config;
pub mod error;
pub mod input;
#[cfg(feature = "runtime")]
pub mod runtime;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod tools;
pub mod transform;

pub use autosave::{PersistenceBridge, SaveNotice, SaveRequest, SaveTrigger};
pub use commands::CommandStack;
pub use config::{EditorConfig, MinSize, ScaleLimits};
pub use error::{ConfigError, SaveError};
pub use input::{InputEvent, Modifiers};
pub use selection::{Selection, SelectionTarget};
pub use session::{EditorSession, Outcome};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::{Hit, SelectTool, ToolAction};
pub use transform::{Gesture, GestureKind, TransformController};
