pub mod capture_loop;
pub mod session;
pub mod shutdown;

pub use capture_loop::{run_capture_loop, LoopState, LoopStats};
pub use session::Session;
pub use shutdown::ShutdownFlag;
