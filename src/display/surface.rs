use thiserror::Error;

use crate::capture::frame::VideoFrame;
use crate::display::pixels::ConvertError;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Failed to initialize SDL: {0}")]
    Init(String),

    #[error("Failed to create window: {0}")]
    Window(String),

    #[error("Failed to create renderer: {0}")]
    Renderer(String),

    #[error("Failed to create texture: {0}")]
    Texture(String),

    #[error("Failed to upload frame: {0}")]
    Upload(String),

    #[error("Failed to draw: {0}")]
    Render(String),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("Surface resources were already released")]
    Released,
}

/// What the window asked for during an event pump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Continue,
    CloseRequested,
}

/// Full-surface quad in logical coordinates, paired with the texture region
/// drawn into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quad {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Quad {
    pub const fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// A window with one fixed-size texture and an off-screen target.
pub trait RenderSurface {
    fn clear(&mut self);

    /// Replace the texture contents with `frame`.
    fn upload(&mut self, frame: &VideoFrame<'_>) -> Result<(), DisplayError>;

    /// Draw the texture through the off-screen target onto the quad.
    fn draw(&mut self) -> Result<(), DisplayError>;

    /// Flush and swap buffers.
    fn present(&mut self);

    fn pump_events(&mut self) -> SurfaceEvent;

    /// Free the texture and the target. Safe to call more than once.
    fn release(&mut self);
}
