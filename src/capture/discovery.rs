//! Waiting for a source to show up on the network

use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::capture::source::{SourceFinder, SourceInfo};
use crate::pipeline::shutdown::ShutdownFlag;

/// Pick the source to connect to. Always the first one listed.
pub fn select_source(sources: &[SourceInfo]) -> Option<&SourceInfo> {
    sources.first()
}

/// Poll until at least one source is listed or shutdown is requested.
///
/// Each poll blocks for at most `timeout`, so cancellation is noticed within
/// one timeout period.
#[instrument(skip_all)]
pub fn first_source<F: SourceFinder>(
    finder: &mut F,
    shutdown: &ShutdownFlag,
    timeout: Duration,
) -> Option<SourceInfo> {
    info!("Looking for sources...");
    let mut polls: u64 = 0;

    while !shutdown.is_requested() {
        let sources = finder.wait_for_sources(timeout);
        polls += 1;

        if let Some(chosen) = select_source(&sources) {
            info!("Network sources ({} found)", sources.len());
            for (i, source) in sources.iter().enumerate() {
                info!("{}. {}", i, source);
            }
            info!("Using source: {}", chosen);
            return Some(chosen.clone());
        }

        debug!(polls, "No sources yet");
    }

    info!("Shutdown requested during discovery");
    None
}
