//! NDI receiver: shows the first source found on the network in a window

use color_eyre::Result;
use tracing::info;

use ndiview::capture::NdiRuntime;
use ndiview::display::Sdl2Display;
use ndiview::pipeline::{Session, ShutdownFlag};
use ndiview::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter("ndiview=info")
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    info!("NDI receiver launching...");

    let config = Config::default();

    // Setup failures are fatal, nothing is retried
    let display = Sdl2Display::new(&config.display)?;
    let runtime = NdiRuntime::load()?;

    let shutdown = ShutdownFlag::new();
    let _interrupt = shutdown.listen_for_interrupt();

    let Some(mut session) = Session::open(runtime, display, &config.receiver, &shutdown)? else {
        info!("No source selected, exiting");
        return Ok(());
    };

    // The render loop stays on the main thread, SDL requires it
    let stats = session.run(&shutdown);
    info!(
        "Received {} video, {} audio, {} metadata frames",
        stats.video, stats.audio, stats.metadata
    );

    session.teardown();

    info!("NDI receiver shutting down");
    Ok(())
}
