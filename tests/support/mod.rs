//! Recording doubles for the frame source and the render surface.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use ndiview::capture::frame::{AudioFrame, FrameKind, FrameView, MetadataFrame, PixelFormat, VideoFrame};
use ndiview::capture::source::{
    CapturedFrame, FrameReceiver, FrameSource, SourceError, SourceFinder, SourceInfo, Tally,
};
use ndiview::display::pixels::convert_to_rgba;
use ndiview::display::surface::{DisplayError, RenderSurface, SurfaceEvent};
use ndiview::pipeline::ShutdownFlag;
use ndiview::ReceiverConfig;

pub const TEXTURE_WIDTH: u32 = 4;
pub const TEXTURE_HEIGHT: u32 = 2;

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ndiview=debug")
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    FinderCreated,
    FinderDropped,
    Connected(String),
    Tally(Tally),
    Metadata(String),
    Capture(FrameKind),
    Release(FrameKind),
    Clear,
    Upload,
    Draw,
    Present,
    PumpEvents,
    SurfaceReleased,
    ReceiverDestroyed,
    SubsystemShutdown,
}

/// Shared, ordered record of every call made on the doubles
#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.0.borrow().iter().filter(|e| *e == event).count()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == event)
    }

    pub fn count_captures(&self) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Capture(_)))
            .count()
    }
}

/// What the next capture call returns
#[derive(Debug, Clone)]
pub enum Scripted {
    None,
    /// A solid RGBA frame
    Video {
        width: u32,
        height: u32,
        pixel: [u8; 4],
    },
    Audio,
    Metadata(&'static str),
    StatusChange,
    Error,
}

impl Scripted {
    pub fn video(pixel: [u8; 4]) -> Self {
        Scripted::Video {
            width: TEXTURE_WIDTH,
            height: TEXTURE_HEIGHT,
            pixel,
        }
    }

    fn kind(&self) -> FrameKind {
        match self {
            Scripted::None => FrameKind::None,
            Scripted::Video { .. } => FrameKind::Video,
            Scripted::Audio => FrameKind::Audio,
            Scripted::Metadata(_) => FrameKind::Metadata,
            Scripted::StatusChange => FrameKind::StatusChange,
            Scripted::Error => FrameKind::Error,
        }
    }
}

pub struct MockReceiver {
    script: VecDeque<Scripted>,
    log: EventLog,
    captures: usize,
    shutdown_after: Option<(usize, ShutdownFlag)>,
}

impl MockReceiver {
    pub fn new(script: Vec<Scripted>, log: &EventLog) -> Self {
        Self {
            script: script.into(),
            log: log.clone(),
            captures: 0,
            shutdown_after: None,
        }
    }

    /// Request shutdown while the `n`th capture is blocking.
    pub fn shutdown_after(mut self, n: usize, flag: &ShutdownFlag) -> Self {
        self.shutdown_after = Some((n, flag.clone()));
        self
    }
}

impl FrameReceiver for MockReceiver {
    type Frame<'a> = MockFrame<'a> where Self: 'a;

    fn set_tally(&mut self, tally: Tally) -> bool {
        self.log.push(Event::Tally(tally));
        true
    }

    fn send_metadata(&mut self, text: &str) -> bool {
        self.log.push(Event::Metadata(text.to_string()));
        true
    }

    fn capture(&mut self, _timeout: Duration) -> MockFrame<'_> {
        self.captures += 1;
        if let Some((n, flag)) = &self.shutdown_after {
            if self.captures >= *n {
                flag.request();
            }
        }

        let item = self.script.pop_front().unwrap_or(Scripted::None);
        self.log.push(Event::Capture(item.kind()));

        let data = match &item {
            Scripted::Video {
                width,
                height,
                pixel,
            } => pixel.repeat((width * height) as usize),
            Scripted::Metadata(text) => text.as_bytes().to_vec(),
            _ => Vec::new(),
        };

        MockFrame {
            item,
            data,
            log: &self.log,
        }
    }
}

impl Drop for MockReceiver {
    fn drop(&mut self) {
        self.log.push(Event::ReceiverDestroyed);
    }
}

pub struct MockFrame<'a> {
    item: Scripted,
    data: Vec<u8>,
    log: &'a EventLog,
}

impl CapturedFrame for MockFrame<'_> {
    fn view(&self) -> FrameView<'_> {
        match &self.item {
            Scripted::None => FrameView::None,
            Scripted::Video { width, height, .. } => FrameView::Video(VideoFrame {
                width: *width,
                height: *height,
                format: PixelFormat::Rgba,
                stride: (*width as usize) * 4,
                data: &self.data,
                frame_rate_n: 60,
                frame_rate_d: 1,
                timecode: 0,
            }),
            Scripted::Audio => FrameView::Audio(AudioFrame {
                sample_rate: 48_000,
                channels: 2,
                samples: 1600,
                timecode: 0,
            }),
            Scripted::Metadata(_) => FrameView::Metadata(MetadataFrame {
                data: &self.data,
                timecode: 0,
            }),
            Scripted::StatusChange => FrameView::StatusChange,
            Scripted::Error => FrameView::Error,
        }
    }
}

impl Drop for MockFrame<'_> {
    fn drop(&mut self) {
        let kind = self.item.kind();
        if kind.owns_buffer() {
            self.log.push(Event::Release(kind));
        }
    }
}

/// Surface with a CPU-side texture so its contents can be inspected
pub struct MockSurface {
    log: EventLog,
    pub texture: Vec<u8>,
    close_after_pumps: Option<usize>,
    pumps: usize,
}

impl MockSurface {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            texture: vec![0; (TEXTURE_WIDTH * TEXTURE_HEIGHT * 4) as usize],
            close_after_pumps: None,
            pumps: 0,
        }
    }

    pub fn close_after(mut self, pumps: usize) -> Self {
        self.close_after_pumps = Some(pumps);
        self
    }

    pub fn is_cleared(&self) -> bool {
        self.texture.iter().all(|byte| *byte == 0)
    }
}

impl RenderSurface for MockSurface {
    fn clear(&mut self) {
        self.log.push(Event::Clear);
    }

    fn upload(&mut self, frame: &VideoFrame<'_>) -> Result<(), DisplayError> {
        convert_to_rgba(frame, &mut self.texture, TEXTURE_WIDTH, TEXTURE_HEIGHT)?;
        self.log.push(Event::Upload);
        Ok(())
    }

    fn draw(&mut self) -> Result<(), DisplayError> {
        self.log.push(Event::Draw);
        Ok(())
    }

    fn present(&mut self) {
        self.log.push(Event::Present);
    }

    fn pump_events(&mut self) -> SurfaceEvent {
        self.log.push(Event::PumpEvents);
        self.pumps += 1;
        match self.close_after_pumps {
            Some(n) if self.pumps >= n => SurfaceEvent::CloseRequested,
            _ => SurfaceEvent::Continue,
        }
    }

    fn release(&mut self) {
        self.log.push(Event::SurfaceReleased);
    }
}

pub struct MockFinder {
    polls: VecDeque<Vec<SourceInfo>>,
    log: EventLog,
}

impl SourceFinder for MockFinder {
    fn wait_for_sources(&mut self, _timeout: Duration) -> Vec<SourceInfo> {
        self.polls.pop_front().unwrap_or_default()
    }
}

impl Drop for MockFinder {
    fn drop(&mut self) {
        self.log.push(Event::FinderDropped);
    }
}

pub struct MockSource {
    log: EventLog,
    polls: Vec<Vec<SourceInfo>>,
    receiver: Option<MockReceiver>,
}

impl MockSource {
    /// `receiver` is handed out on connect; `None` makes connect fail.
    pub fn new(log: &EventLog, polls: Vec<Vec<SourceInfo>>, receiver: Option<MockReceiver>) -> Self {
        Self {
            log: log.clone(),
            polls,
            receiver,
        }
    }
}

impl FrameSource for MockSource {
    type Finder = MockFinder;
    type Receiver = MockReceiver;

    fn create_finder(&mut self, _config: &ReceiverConfig) -> Result<MockFinder, SourceError> {
        self.log.push(Event::FinderCreated);
        Ok(MockFinder {
            polls: std::mem::take(&mut self.polls).into(),
            log: self.log.clone(),
        })
    }

    fn connect(
        &mut self,
        source: &SourceInfo,
        _config: &ReceiverConfig,
    ) -> Result<MockReceiver, SourceError> {
        self.log.push(Event::Connected(source.name.clone()));
        self.receiver
            .take()
            .ok_or_else(|| SourceError::ReceiverCreate(source.name.clone()))
    }

    fn shutdown(self) {
        self.log.push(Event::SubsystemShutdown);
    }
}

pub fn sources(names: &[&str]) -> Vec<SourceInfo> {
    names.iter().map(|name| SourceInfo::new(*name)).collect()
}
