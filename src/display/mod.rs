pub mod display;
pub mod pixels;
pub mod surface;

pub use display::Sdl2Display;
pub use surface::{DisplayError, RenderSurface, SurfaceEvent};
