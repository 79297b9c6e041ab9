//! Seams between the capture loop and the network video library

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::capture::frame::FrameView;
use crate::ReceiverConfig;

/// Marker asking the sender side to enable hardware accelerated decoding.
pub const HW_ACCEL_METADATA: &str = r#"<ndi_hwaccel enabled="true"/>"#;

/// A source seen on the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub name: String,
    pub url: Option<String>,
}

impl SourceInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => write!(f, "{} ({})", self.name, url),
            None => f.write_str(&self.name),
        }
    }
}

/// Tally state announced to the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub on_program: bool,
    pub on_preview: bool,
}

/// Pixel layouts the receiver asks the library to deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    BgrxBgra,
    UyvyBgra,
    RgbxRgba,
    UyvyRgba,
    Fastest,
    Best,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bandwidth {
    MetadataOnly,
    AudioOnly,
    Lowest,
    Highest,
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("NDI runtime not found (tried {tried}): {reason}")]
    RuntimeNotFound { tried: String, reason: String },

    #[error("NDI runtime is missing symbol {symbol}: {reason}")]
    MissingSymbol { symbol: &'static str, reason: String },

    #[error("NDI runtime failed to initialize (CPU supported: {cpu_supported})")]
    InitializeFailed { cpu_supported: bool },

    #[error("Failed to create source finder")]
    FinderCreate,

    #[error("Failed to create receiver for {0}")]
    ReceiverCreate(String),

    #[error("Invalid string passed to the NDI runtime: {0}")]
    InvalidString(#[from] std::ffi::NulError),
}

/// A frame handed out by a receiver.
///
/// Dropping the value releases the frame back to the library, and the
/// borrow on the receiver keeps a second capture from starting before that.
pub trait CapturedFrame {
    fn view(&self) -> FrameView<'_>;
}

/// An open connection to exactly one source
pub trait FrameReceiver {
    type Frame<'a>: CapturedFrame
    where
        Self: 'a;

    /// Returns whether the library accepted the tally.
    fn set_tally(&mut self, tally: Tally) -> bool;

    /// Best effort, nothing is acknowledged.
    fn send_metadata(&mut self, text: &str) -> bool;

    /// Blocks for at most `timeout`.
    fn capture(&mut self, timeout: Duration) -> Self::Frame<'_>;
}

/// Discovery handle, released once a receiver has been opened
pub trait SourceFinder {
    /// Blocks for at most `timeout` and returns every source currently known.
    fn wait_for_sources(&mut self, timeout: Duration) -> Vec<SourceInfo>;
}

/// The network receiver subsystem
pub trait FrameSource {
    type Finder: SourceFinder;
    type Receiver: FrameReceiver;

    fn create_finder(&mut self, config: &ReceiverConfig) -> Result<Self::Finder, SourceError>;

    fn connect(
        &mut self,
        source: &SourceInfo,
        config: &ReceiverConfig,
    ) -> Result<Self::Receiver, SourceError>;

    /// Shuts the subsystem down. Every receiver must already be gone.
    fn shutdown(self);
}
