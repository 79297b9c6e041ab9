//! The capture, upload, draw and present loop

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::capture::frame::{FrameKind, FrameView, PixelFormat, VideoFrame};
use crate::capture::source::{CapturedFrame, FrameReceiver};
use crate::display::surface::{RenderSurface, SurfaceEvent};
use crate::pipeline::shutdown::ShutdownFlag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    ShuttingDown,
}

/// Counters collected over one run of the loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub iterations: u64,
    pub none: u64,
    pub video: u64,
    pub audio: u64,
    pub metadata: u64,
    pub status_changes: u64,
    pub errors: u64,
    pub unknown: u64,
    pub uploads: u64,
    pub upload_failures: u64,
}

impl LoopStats {
    fn record(&mut self, kind: FrameKind) {
        match kind {
            FrameKind::None => self.none += 1,
            FrameKind::Video => self.video += 1,
            FrameKind::Audio => self.audio += 1,
            FrameKind::Metadata => self.metadata += 1,
            FrameKind::StatusChange => self.status_changes += 1,
            FrameKind::Error => self.errors += 1,
            FrameKind::Unknown => self.unknown += 1,
        }
        metrics::counter!("frames_received", "kind" => kind.as_str()).increment(1);
    }
}

/// Resolution, format and rate of the last video frame, to log changes only.
#[derive(Debug, Clone, Copy, PartialEq)]
struct VideoMode {
    width: u32,
    height: u32,
    format: PixelFormat,
    frame_rate_n: i32,
    frame_rate_d: i32,
}

impl VideoMode {
    fn of(frame: &VideoFrame<'_>) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            format: frame.format,
            frame_rate_n: frame.frame_rate_n,
            frame_rate_d: frame.frame_rate_d,
        }
    }
}

fn present_video<S: RenderSurface>(surface: &mut S, frame: &VideoFrame<'_>, stats: &mut LoopStats) {
    let result = surface.upload(frame).and_then(|()| surface.draw());
    match result {
        Ok(()) => stats.uploads += 1,
        Err(e) => {
            stats.upload_failures += 1;
            metrics::counter!("upload_failures").increment(1);
            warn!("Dropping video frame: {}", e);
        }
    }
}

/// Run until the window is closed or `shutdown` is set.
///
/// One frame is in flight at a time: it is released before the next capture.
/// The flag is polled once per iteration, so exit takes at most one capture
/// timeout and one present after it is set.
#[instrument(skip_all)]
pub fn run_capture_loop<R, S>(
    receiver: &mut R,
    surface: &mut S,
    shutdown: &ShutdownFlag,
    capture_timeout: Duration,
) -> LoopStats
where
    R: FrameReceiver,
    S: RenderSurface,
{
    let mut stats = LoopStats::default();
    let mut state = LoopState::Running;
    let mut mode: Option<VideoMode> = None;

    info!("Capture loop running");

    while state == LoopState::Running {
        if shutdown.is_requested() {
            state = LoopState::ShuttingDown;
            continue;
        }

        stats.iterations += 1;
        surface.clear();

        {
            let frame = receiver.capture(capture_timeout);
            let view = frame.view();
            stats.record(view.kind());

            match view {
                FrameView::None => debug!("No data received"),
                FrameView::Video(video) => {
                    let current = VideoMode::of(&video);
                    if mode != Some(current) {
                        info!(
                            "Video format: {}x{} {} @ {:.2} fps",
                            video.width,
                            video.height,
                            video.format,
                            video.frame_rate()
                        );
                        mode = Some(current);
                    }
                    present_video(surface, &video, &mut stats);
                }
                FrameView::Audio(audio) => {
                    debug!(
                        "Audio data received ({} samples, {} channels @ {} Hz)",
                        audio.samples, audio.channels, audio.sample_rate
                    );
                }
                FrameView::Metadata(metadata) => {
                    debug!("Meta data received: {}", metadata.text());
                }
                FrameView::StatusChange => info!("Receiver connection status changed"),
                FrameView::Error => warn!("Receiver reported an error frame"),
                FrameView::Unknown(tag) => warn!("Unrecognized frame type {}", tag),
            }
            // frame released here
        }

        surface.present();

        if surface.pump_events() == SurfaceEvent::CloseRequested {
            state = LoopState::ShuttingDown;
        }
    }

    info!(
        iterations = stats.iterations,
        video = stats.video,
        audio = stats.audio,
        "Capture loop stopped"
    );
    stats
}
