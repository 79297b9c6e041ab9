//! Owns everything acquired at startup and releases it in a fixed order:
//! surface first, then the receiver, then the receiver subsystem.

use tracing::{info, instrument, warn};

use crate::capture::discovery;
use crate::capture::source::{FrameReceiver, FrameSource, SourceError, HW_ACCEL_METADATA};
use crate::display::surface::RenderSurface;
use crate::pipeline::capture_loop::{run_capture_loop, LoopStats};
use crate::pipeline::shutdown::ShutdownFlag;
use crate::ReceiverConfig;

pub struct Session<F: FrameSource, S: RenderSurface> {
    surface: S,
    receiver: F::Receiver,
    source: F,
    config: ReceiverConfig,
}

/// Release what exists when no receiver was ever opened.
fn abandon<F: FrameSource, S: RenderSurface>(mut surface: S, source: F) {
    surface.release();
    source.shutdown();
}

impl<F: FrameSource, S: RenderSurface> Session<F, S> {
    /// Discover a source, connect to it and announce ourselves.
    ///
    /// Returns `Ok(None)` if shutdown was requested before any source showed
    /// up. On `None` and on error everything passed in has been released.
    #[instrument(skip_all)]
    pub fn open(
        mut source: F,
        surface: S,
        config: &ReceiverConfig,
        shutdown: &ShutdownFlag,
    ) -> Result<Option<Self>, SourceError> {
        let mut finder = match source.create_finder(config) {
            Ok(finder) => finder,
            Err(e) => {
                abandon(surface, source);
                return Err(e);
            }
        };

        let Some(chosen) = discovery::first_source(&mut finder, shutdown, config.discovery_timeout)
        else {
            drop(finder);
            abandon(surface, source);
            return Ok(None);
        };

        let mut receiver = match source.connect(&chosen, config) {
            Ok(receiver) => receiver,
            Err(e) => {
                drop(finder);
                abandon(surface, source);
                return Err(e);
            }
        };

        // The receiver keeps its own reference to the source.
        drop(finder);

        if !receiver.set_tally(config.tally) {
            warn!("Source did not accept the tally state");
        }
        if config.hardware_acceleration {
            let sent = receiver.send_metadata(HW_ACCEL_METADATA);
            info!(sent, "Requested hardware accelerated decoding");
        }

        Ok(Some(Self {
            surface,
            receiver,
            source,
            config: config.clone(),
        }))
    }

    /// Run the capture loop until the window closes or shutdown is requested.
    pub fn run(&mut self, shutdown: &ShutdownFlag) -> LoopStats {
        run_capture_loop(
            &mut self.receiver,
            &mut self.surface,
            shutdown,
            self.config.capture_timeout,
        )
    }

    /// Release surface resources, destroy the receiver, shut the subsystem down.
    #[instrument(skip_all)]
    pub fn teardown(self) {
        let Self {
            mut surface,
            receiver,
            source,
            ..
        } = self;

        surface.release();
        drop(receiver);
        source.shutdown();
        info!("Teardown complete");
    }
}
