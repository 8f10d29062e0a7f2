pub mod assets;
pub mod background;
pub mod display_list;
pub mod fonts;
pub mod hit;
pub mod renderer;
pub mod surface;
pub mod text;
#[cfg(feature = "vello")]
pub mod vello_surface;

pub use assets::{AssetCache, AssetError, AssetKey, LoadTicket};
pub use display_list::{DisplayList, DrawCmd, RecordedImage};
pub use fonts::FontBook;
pub use hit::{Handle, HandleMetrics, hit_test, hit_test_handle};
pub use renderer::{Overlay, RenderInput, layout_context, render_canvas};
pub use surface::{FillStyle, StrokeStyle, Surface, SurfaceImage};
