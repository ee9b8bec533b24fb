pub use control::{CanvasConfig, HostPresenter, RedrawState, ViewerRegistry};
pub use layout::{LayoutParams, PageExtent, PageLayout, PagePlacement, Viewport};
pub use redraw::RedrawScheduler;

mod control;
mod layout;
mod redraw;
