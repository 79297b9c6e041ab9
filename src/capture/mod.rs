pub mod discovery;
pub mod ffi;
pub mod frame;
pub mod ndi;
pub mod source;

pub use frame::{FrameKind, FrameView, PixelFormat, VideoFrame};
pub use ndi::NdiRuntime;
pub use source::{CapturedFrame, FrameReceiver, FrameSource, SourceError, SourceFinder, SourceInfo};
