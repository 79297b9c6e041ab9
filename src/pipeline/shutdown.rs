//! Cooperative cancellation shared between the interrupt listener and the loops

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

/// Set once, never cleared. Cloning shares the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Spawn a task that sets the flag on Ctrl-C and does nothing else.
    ///
    /// Must be called from within a tokio runtime.
    pub fn listen_for_interrupt(&self) -> tokio::task::JoinHandle<()> {
        let flag = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, shutting down");
                    flag.request();
                }
                Err(e) => warn!("Unable to listen for interrupts: {}", e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let flag = ShutdownFlag::new();
        let seen_by_loop = flag.clone();
        assert!(!seen_by_loop.is_requested());

        flag.request();
        assert!(seen_by_loop.is_requested());

        // stays set
        flag.request();
        assert!(seen_by_loop.is_requested());
    }

    #[test]
    fn can_be_set_from_another_thread() {
        let flag = ShutdownFlag::new();
        let remote = flag.clone();
        std::thread::spawn(move || remote.request()).join().unwrap();
        assert!(flag.is_requested());
    }

    #[tokio::test]
    async fn listener_leaves_flag_alone_without_interrupt() {
        let flag = ShutdownFlag::new();
        let handle = flag.listen_for_interrupt();
        tokio::task::yield_now().await;
        assert!(!flag.is_requested());
        handle.abort();
    }
}
