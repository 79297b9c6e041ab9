pub mod capture;
pub mod display;
pub mod pipeline;
pub mod utils;

use std::time::Duration;

use capture::source::{Bandwidth, ColorFormat, Tally};

/// Fixed program settings. There is no file or command line to override them.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub display: DisplayConfig,
    pub receiver: ReceiverConfig,
}

#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Wait per discovery poll
    pub discovery_timeout: Duration,
    /// Wait per capture call
    pub capture_timeout: Duration,
    pub show_local_sources: bool,
    pub color_format: ColorFormat,
    pub bandwidth: Bandwidth,
    pub allow_video_fields: bool,
    pub receiver_name: Option<String>,
    pub tally: Tally,
    /// Ask the sender for hardware accelerated decoding
    pub hardware_acceleration: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "NDI Receiver".into(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            discovery_timeout: Duration::from_secs(1),
            capture_timeout: Duration::from_secs(1),
            show_local_sources: true,
            // alpha sources still arrive as BGRA
            color_format: ColorFormat::UyvyBgra,
            bandwidth: Bandwidth::Highest,
            allow_video_fields: true,
            receiver_name: None,
            tally: Tally {
                on_program: true,
                on_preview: true,
            },
            hardware_acceleration: true,
        }
    }
}
