use std::borrow::Cow;
use std::fmt;

/// Pack a four character code the way NDI does (little-endian).
const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*code)
}

/// Pixel formats a video frame can arrive in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 4:2:2 packed YCbCr, 8 bits per component
    Uyvy,
    /// UYVY followed by a full resolution alpha plane
    Uyva,
    /// 4:2:2 semi-planar YCbCr, 16 bits per component
    P216,
    /// P216 followed by a 16 bit alpha plane
    Pa16,
    Yv12,
    I420,
    Nv12,
    Bgra,
    Bgrx,
    Rgba,
    Rgbx,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 11] = [
        PixelFormat::Uyvy,
        PixelFormat::Uyva,
        PixelFormat::P216,
        PixelFormat::Pa16,
        PixelFormat::Yv12,
        PixelFormat::I420,
        PixelFormat::Nv12,
        PixelFormat::Bgra,
        PixelFormat::Bgrx,
        PixelFormat::Rgba,
        PixelFormat::Rgbx,
    ];

    pub const fn fourcc(self) -> u32 {
        match self {
            PixelFormat::Uyvy => fourcc(b"UYVY"),
            PixelFormat::Uyva => fourcc(b"UYVA"),
            PixelFormat::P216 => fourcc(b"P216"),
            PixelFormat::Pa16 => fourcc(b"PA16"),
            PixelFormat::Yv12 => fourcc(b"YV12"),
            PixelFormat::I420 => fourcc(b"I420"),
            PixelFormat::Nv12 => fourcc(b"NV12"),
            PixelFormat::Bgra => fourcc(b"BGRA"),
            PixelFormat::Bgrx => fourcc(b"BGRX"),
            PixelFormat::Rgba => fourcc(b"RGBA"),
            PixelFormat::Rgbx => fourcc(b"RGBX"),
        }
    }

    pub fn from_fourcc(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.fourcc() == code)
    }

    /// Minimum row stride in bytes of the first plane for a given width.
    ///
    /// Semi-planar chroma rows share the luma stride, so an odd width needs room for
    /// the trailing chroma pair.
    pub const fn min_stride(self, width: usize) -> usize {
        match self {
            PixelFormat::Uyvy | PixelFormat::Uyva => width.div_ceil(2) * 4,
            PixelFormat::P216 | PixelFormat::Pa16 => width.div_ceil(2) * 4,
            PixelFormat::Nv12 => width.div_ceil(2) * 2,
            PixelFormat::Yv12 | PixelFormat::I420 => width,
            PixelFormat::Bgra | PixelFormat::Bgrx | PixelFormat::Rgba | PixelFormat::Rgbx => {
                width * 4
            }
        }
    }

    /// Total size in bytes of a frame buffer, all planes included.
    pub const fn buffer_len(self, width: usize, height: usize, stride: usize) -> usize {
        let plane = stride * height;
        match self {
            PixelFormat::Uyva => plane + width * height,
            PixelFormat::P216 => plane * 2,
            PixelFormat::Pa16 => plane * 3,
            PixelFormat::Nv12 => plane + stride * height.div_ceil(2),
            PixelFormat::Yv12 | PixelFormat::I420 => {
                plane + 2 * stride.div_ceil(2) * height.div_ceil(2)
            }
            _ => plane,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.fourcc().to_le_bytes();
        f.write_str(&String::from_utf8_lossy(&code))
    }
}

/// A captured video frame, borrowed from the receiver until released
#[derive(Debug, Clone, Copy)]
pub struct VideoFrame<'a> {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Row stride of the first plane, in bytes
    pub stride: usize,
    pub data: &'a [u8],
    pub frame_rate_n: i32,
    pub frame_rate_d: i32,
    pub timecode: i64,
}

impl VideoFrame<'_> {
    pub fn frame_rate(&self) -> f64 {
        if self.frame_rate_d == 0 {
            0.0
        } else {
            f64::from(self.frame_rate_n) / f64::from(self.frame_rate_d)
        }
    }
}

/// Audio is acknowledged but never played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFrame {
    pub sample_rate: u32,
    pub channels: u32,
    pub samples: u32,
    pub timecode: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct MetadataFrame<'a> {
    pub data: &'a [u8],
    pub timecode: i64,
}

impl MetadataFrame<'_> {
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.data)
    }
}

/// Result of one capture call
#[derive(Debug, Clone, Copy)]
pub enum FrameView<'a> {
    None,
    Video(VideoFrame<'a>),
    Audio(AudioFrame),
    Metadata(MetadataFrame<'a>),
    StatusChange,
    /// The receiver reported a failure, usually a lost connection
    Error,
    /// A frame type tag this program does not know about
    Unknown(i32),
}

impl FrameView<'_> {
    pub fn kind(&self) -> FrameKind {
        match self {
            FrameView::None => FrameKind::None,
            FrameView::Video(_) => FrameKind::Video,
            FrameView::Audio(_) => FrameKind::Audio,
            FrameView::Metadata(_) => FrameKind::Metadata,
            FrameView::StatusChange => FrameKind::StatusChange,
            FrameView::Error => FrameKind::Error,
            FrameView::Unknown(_) => FrameKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    None,
    Video,
    Audio,
    Metadata,
    StatusChange,
    Error,
    Unknown,
}

impl FrameKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            FrameKind::None => "none",
            FrameKind::Video => "video",
            FrameKind::Audio => "audio",
            FrameKind::Metadata => "metadata",
            FrameKind::StatusChange => "status_change",
            FrameKind::Error => "error",
            FrameKind::Unknown => "unknown",
        }
    }

    /// Kinds that carry a library allocation which must be freed.
    pub const fn owns_buffer(self) -> bool {
        matches!(self, FrameKind::Video | FrameKind::Audio | FrameKind::Metadata)
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
