//! SDL2 Window Display Module
//! Owns the window, the frame texture and the off-screen target, and draws
//! every uploaded frame as one full-surface quad.

use std::time::Instant;

use sdl2::event::{Event, WindowEvent};
use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::rect::Rect;
use sdl2::render::{BlendMode, Canvas, Texture};
use sdl2::video::Window;
use sdl2::{EventPump, Sdl};
use tracing::{debug, info, instrument};

use crate::capture::frame::VideoFrame;
use crate::display::pixels;
use crate::display::surface::{DisplayError, Quad, RenderSurface, SurfaceEvent};
use crate::DisplayConfig;

/// RGBA byte order on little-endian hosts
const TEXTURE_FORMAT: PixelFormatEnum = PixelFormatEnum::ABGR8888;

/// SDL2 Window Display
/// Fixed size, accelerated and vsync'd. Textures are created once and
/// destroyed explicitly in `release`.
pub struct Sdl2Display {
    _sdl: Sdl,
    canvas: Canvas<Window>,
    event_pump: EventPump,
    frame_texture: Option<Texture>,
    target: Option<Texture>,
    rgba: Vec<u8>,
    width: u32,
    height: u32,
}

impl Sdl2Display {
    #[instrument(skip_all, fields(width = config.width, height = config.height))]
    pub fn new(config: &DisplayConfig) -> Result<Self, DisplayError> {
        // Interrupts are handled by the shutdown flag, not turned into SDL_QUIT.
        sdl2::hint::set("SDL_NO_SIGNAL_HANDLERS", "1");

        let sdl = sdl2::init().map_err(DisplayError::Init)?;
        let video_subsystem = sdl.video().map_err(DisplayError::Init)?;

        let window = video_subsystem
            .window(&config.title, config.width, config.height)
            .position_centered()
            .build()
            .map_err(|e| DisplayError::Window(e.to_string()))?;

        let canvas_builder = window.into_canvas().accelerated().target_texture();
        let canvas_builder = if config.vsync {
            canvas_builder.present_vsync()
        } else {
            canvas_builder
        };
        let mut canvas = canvas_builder
            .build()
            .map_err(|e| DisplayError::Renderer(e.to_string()))?;

        // Fixed orthographic mapping onto the surface resolution
        canvas
            .set_logical_size(config.width, config.height)
            .map_err(|e| DisplayError::Renderer(e.to_string()))?;

        let info = canvas.info();
        info!("Renderer: {} (flags 0x{:x})", info.name, info.flags);

        let texture_creator = canvas.texture_creator();
        let mut frame_texture = texture_creator
            .create_texture_streaming(TEXTURE_FORMAT, config.width, config.height)
            .map_err(|e| DisplayError::Texture(e.to_string()))?;
        let mut target = texture_creator
            .create_texture_target(TEXTURE_FORMAT, config.width, config.height)
            .map_err(|e| DisplayError::Texture(e.to_string()))?;
        frame_texture.set_blend_mode(BlendMode::None);
        target.set_blend_mode(BlendMode::None);

        let event_pump = sdl.event_pump().map_err(DisplayError::Init)?;

        let mut display = Self {
            _sdl: sdl,
            canvas,
            event_pump,
            frame_texture: Some(frame_texture),
            target: Some(target),
            rgba: vec![0; (config.width * config.height * 4) as usize],
            width: config.width,
            height: config.height,
        };
        display.clear();

        Ok(display)
    }

    fn quad(&self) -> Rect {
        let quad = Quad::full(self.width, self.height);
        Rect::new(quad.x, quad.y, quad.width, quad.height)
    }
}

impl RenderSurface for Sdl2Display {
    fn clear(&mut self) {
        self.canvas.set_draw_color(Color::RGBA(0, 0, 0, 0));
        self.canvas.clear();
    }

    fn upload(&mut self, frame: &VideoFrame<'_>) -> Result<(), DisplayError> {
        let started = Instant::now();
        let texture = self.frame_texture.as_mut().ok_or(DisplayError::Released)?;

        pixels::convert_to_rgba(frame, &mut self.rgba, self.width, self.height)?;
        texture
            .update(None, &self.rgba, (self.width * 4) as usize)
            .map_err(|e| DisplayError::Upload(e.to_string()))?;

        metrics::histogram!("upload_time_us").record(started.elapsed().as_micros() as f64);
        Ok(())
    }

    fn draw(&mut self) -> Result<(), DisplayError> {
        let quad = self.quad();
        let frame_texture = self.frame_texture.as_ref().ok_or(DisplayError::Released)?;
        let target = self.target.as_mut().ok_or(DisplayError::Released)?;

        let mut copied = Ok(());
        self.canvas
            .with_texture_canvas(target, |offscreen| {
                copied = offscreen.copy(frame_texture, None, None);
            })
            .map_err(|e| DisplayError::Render(e.to_string()))?;
        copied.map_err(DisplayError::Render)?;

        self.canvas
            .copy(target, None, quad)
            .map_err(DisplayError::Render)
    }

    fn present(&mut self) {
        self.canvas.present();
    }

    fn pump_events(&mut self) -> SurfaceEvent {
        let mut outcome = SurfaceEvent::Continue;
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => {
                    info!("Quit event received");
                    outcome = SurfaceEvent::CloseRequested;
                }
                Event::Window {
                    win_event: WindowEvent::Close,
                    ..
                } => {
                    info!("Window close requested");
                    outcome = SurfaceEvent::CloseRequested;
                }
                _ => {}
            }
        }
        outcome
    }

    fn release(&mut self) {
        // SAFETY: the canvas that created these textures is still alive.
        if let Some(target) = self.target.take() {
            unsafe { target.destroy() };
        }
        if let Some(texture) = self.frame_texture.take() {
            unsafe { texture.destroy() };
        }
        debug!("Surface textures released");
    }
}

impl Drop for Sdl2Display {
    fn drop(&mut self) {
        self.release();
    }
}
