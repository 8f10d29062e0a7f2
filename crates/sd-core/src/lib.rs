pub mod coords;
pub mod geometry;
pub mod id;
pub mod layout;
pub mod model;
pub mod scene;
pub mod snapshot;

pub use coords::{ScreenPoint, ViewTransform};
pub use geometry::{Point, Rect};
pub use id::ElementId;
pub use layout::{LayoutContext, TextLayout, element_bounds};
pub use model::*;
pub use scene::{ElementPatch, SceneModel, SettingsPatch, ZOrder};
pub use snapshot::{CanvasSnapshot, SavedCanvasConfig};
