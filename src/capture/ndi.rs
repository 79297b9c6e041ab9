//! NDI implementation of the frame source traits

use std::ffi::{CStr, CString};
use std::ptr;
use std::sync::Arc;
use std::time::Duration;

use libc::c_int;
use tracing::{debug, info, instrument, warn};

use crate::capture::ffi::{self, NdiLib};
use crate::capture::frame::{AudioFrame, FrameView, MetadataFrame, PixelFormat, VideoFrame};
use crate::capture::source::{
    Bandwidth, CapturedFrame, ColorFormat, FrameReceiver, FrameSource, SourceError, SourceFinder,
    SourceInfo, Tally,
};
use crate::ReceiverConfig;

fn timeout_ms(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}

fn color_format(format: ColorFormat) -> c_int {
    match format {
        ColorFormat::BgrxBgra => ffi::RECV_COLOR_FORMAT_BGRX_BGRA,
        ColorFormat::UyvyBgra => ffi::RECV_COLOR_FORMAT_UYVY_BGRA,
        ColorFormat::RgbxRgba => ffi::RECV_COLOR_FORMAT_RGBX_RGBA,
        ColorFormat::UyvyRgba => ffi::RECV_COLOR_FORMAT_UYVY_RGBA,
        ColorFormat::Fastest => ffi::RECV_COLOR_FORMAT_FASTEST,
        ColorFormat::Best => ffi::RECV_COLOR_FORMAT_BEST,
    }
}

fn bandwidth(bandwidth: Bandwidth) -> c_int {
    match bandwidth {
        Bandwidth::MetadataOnly => ffi::RECV_BANDWIDTH_METADATA_ONLY,
        Bandwidth::AudioOnly => ffi::RECV_BANDWIDTH_AUDIO_ONLY,
        Bandwidth::Lowest => ffi::RECV_BANDWIDTH_LOWEST,
        Bandwidth::Highest => ffi::RECV_BANDWIDTH_HIGHEST,
    }
}

/// # Safety
/// `ptr` must be null or point at a NUL terminated string.
unsafe fn owned_str(ptr: *const libc::c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

/// The initialized NDI runtime
pub struct NdiRuntime {
    lib: Arc<NdiLib>,
    active: bool,
}

impl NdiRuntime {
    /// Load the runtime library and initialize it.
    #[instrument]
    pub fn load() -> Result<Self, SourceError> {
        let lib = NdiLib::open()?;

        // SAFETY: plain calls into the freshly loaded runtime.
        if !unsafe { (lib.initialize)() } {
            let cpu_supported = unsafe { (lib.is_supported_cpu)() };
            return Err(SourceError::InitializeFailed { cpu_supported });
        }

        // SAFETY: NDIlib_version returns a static string.
        let version = unsafe { owned_str((lib.version)()) };
        info!(
            "NDI runtime initialized: {}",
            version.as_deref().unwrap_or("unknown version")
        );

        Ok(Self {
            lib: Arc::new(lib),
            active: true,
        })
    }

    fn destroy(&mut self) {
        if self.active {
            self.active = false;
            // SAFETY: balanced with the successful initialize in `load`.
            unsafe { (self.lib.destroy)() };
            info!("NDI runtime shut down");
        }
    }
}

impl Drop for NdiRuntime {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl FrameSource for NdiRuntime {
    type Finder = NdiFinder;
    type Receiver = NdiReceiver;

    #[instrument(skip_all)]
    fn create_finder(&mut self, config: &ReceiverConfig) -> Result<NdiFinder, SourceError> {
        let create = ffi::FindCreate {
            show_local_sources: config.show_local_sources,
            p_groups: ptr::null(),
            p_extra_ips: ptr::null(),
        };

        // SAFETY: `create` outlives the call, the library copies what it keeps.
        let instance = unsafe { (self.lib.find_create_v2)(&create) };
        if instance.is_null() {
            return Err(SourceError::FinderCreate);
        }

        debug!("Source finder created");
        Ok(NdiFinder {
            lib: self.lib.clone(),
            instance,
        })
    }

    #[instrument(skip_all, fields(source = %source))]
    fn connect(
        &mut self,
        source: &SourceInfo,
        config: &ReceiverConfig,
    ) -> Result<NdiReceiver, SourceError> {
        let name = CString::new(source.name.as_str())?;
        let url = source.url.as_deref().map(CString::new).transpose()?;
        let recv_name = config
            .receiver_name
            .as_deref()
            .map(CString::new)
            .transpose()?;

        let create = ffi::RecvCreateV3 {
            source_to_connect_to: ffi::RawSource {
                p_ndi_name: name.as_ptr(),
                p_url_address: url.as_ref().map_or(ptr::null(), |url| url.as_ptr()),
            },
            color_format: color_format(config.color_format),
            bandwidth: bandwidth(config.bandwidth),
            allow_video_fields: config.allow_video_fields,
            p_ndi_recv_name: recv_name.as_ref().map_or(ptr::null(), |name| name.as_ptr()),
        };

        // SAFETY: every string pointer stays valid for the duration of the call.
        let instance = unsafe { (self.lib.recv_create_v3)(&create) };
        if instance.is_null() {
            return Err(SourceError::ReceiverCreate(source.name.clone()));
        }

        info!("Receiver connected");
        Ok(NdiReceiver {
            lib: self.lib.clone(),
            instance,
        })
    }

    fn shutdown(mut self) {
        self.destroy();
    }
}

/// Source discovery handle
pub struct NdiFinder {
    lib: Arc<NdiLib>,
    instance: ffi::FindInstance,
}

impl SourceFinder for NdiFinder {
    fn wait_for_sources(&mut self, timeout: Duration) -> Vec<SourceInfo> {
        let mut count: u32 = 0;

        // SAFETY: `instance` is a live finder; the returned array stays valid
        // until the next call on it, and is copied out before then.
        unsafe {
            (self.lib.find_wait_for_sources)(self.instance, timeout_ms(timeout));
            let sources = (self.lib.find_get_current_sources)(self.instance, &mut count);
            if sources.is_null() {
                return Vec::new();
            }

            std::slice::from_raw_parts(sources, count as usize)
                .iter()
                .filter_map(|raw| {
                    let name = owned_str(raw.p_ndi_name)?;
                    Some(SourceInfo {
                        name,
                        url: owned_str(raw.p_url_address),
                    })
                })
                .collect()
        }
    }
}

impl Drop for NdiFinder {
    fn drop(&mut self) {
        // SAFETY: the finder is destroyed exactly once.
        unsafe { (self.lib.find_destroy)(self.instance) };
        debug!("Source finder destroyed");
    }
}

/// Receiver bound to one source
pub struct NdiReceiver {
    lib: Arc<NdiLib>,
    instance: ffi::RecvInstance,
}

impl FrameReceiver for NdiReceiver {
    type Frame<'a> = NdiFrame<'a> where Self: 'a;

    fn set_tally(&mut self, tally: Tally) -> bool {
        let raw = ffi::RawTally {
            on_program: tally.on_program,
            on_preview: tally.on_preview,
        };
        // SAFETY: `raw` outlives the call.
        unsafe { (self.lib.recv_set_tally)(self.instance, &raw) }
    }

    fn send_metadata(&mut self, text: &str) -> bool {
        let Ok(data) = CString::new(text) else {
            warn!("Metadata contains an interior NUL, not sent");
            return false;
        };
        let frame = ffi::MetadataFrameRaw {
            length: 0,
            timecode: i64::MAX,
            p_data: data.as_ptr().cast_mut(),
        };
        // SAFETY: the library reads the NUL terminated string and does not keep it.
        unsafe { (self.lib.recv_send_metadata)(self.instance, &frame) }
    }

    fn capture(&mut self, timeout: Duration) -> NdiFrame<'_> {
        let receiver: &NdiReceiver = self;
        let mut frame = NdiFrame {
            receiver,
            kind: ffi::FRAME_TYPE_NONE,
            video: ffi::VideoFrameV2::default(),
            audio: ffi::AudioFrameV2::default(),
            metadata: ffi::MetadataFrameRaw::default(),
        };

        // SAFETY: the three out structs are owned by `frame` and released in its Drop.
        frame.kind = unsafe {
            (receiver.lib.recv_capture_v2)(
                receiver.instance,
                &mut frame.video,
                &mut frame.audio,
                &mut frame.metadata,
                timeout_ms(timeout),
            )
        };

        frame
    }
}

impl Drop for NdiReceiver {
    fn drop(&mut self) {
        // SAFETY: every frame borrows the receiver, so none can be outstanding.
        unsafe { (self.lib.recv_destroy)(self.instance) };
        info!("Receiver destroyed");
    }
}

/// One capture result; the library buffer is freed on drop
pub struct NdiFrame<'a> {
    receiver: &'a NdiReceiver,
    kind: c_int,
    video: ffi::VideoFrameV2,
    audio: ffi::AudioFrameV2,
    metadata: ffi::MetadataFrameRaw,
}

impl NdiFrame<'_> {
    fn video_view(&self) -> FrameView<'_> {
        let raw = &self.video;
        let Some(format) = PixelFormat::from_fourcc(raw.four_cc) else {
            warn!("Unrecognized pixel format 0x{:08x}", raw.four_cc);
            return FrameView::Unknown(self.kind);
        };

        let width = raw.xres.max(0) as usize;
        let height = raw.yres.max(0) as usize;
        let stride = raw.line_stride_in_bytes.max(0) as usize;
        let data = if raw.p_data.is_null() {
            &[][..]
        } else {
            // SAFETY: the library allocates the whole frame, all planes included,
            // and keeps it alive until `recv_free_video_v2`.
            unsafe {
                std::slice::from_raw_parts(raw.p_data, format.buffer_len(width, height, stride))
            }
        };

        FrameView::Video(VideoFrame {
            width: width as u32,
            height: height as u32,
            format,
            stride,
            data,
            frame_rate_n: raw.frame_rate_n,
            frame_rate_d: raw.frame_rate_d,
            timecode: raw.timecode,
        })
    }

    fn metadata_view(&self) -> FrameView<'_> {
        let data = if self.metadata.p_data.is_null() {
            &[][..]
        } else {
            // SAFETY: metadata is a NUL terminated string owned by the library.
            unsafe { CStr::from_ptr(self.metadata.p_data).to_bytes() }
        };
        FrameView::Metadata(MetadataFrame {
            data,
            timecode: self.metadata.timecode,
        })
    }
}

impl CapturedFrame for NdiFrame<'_> {
    fn view(&self) -> FrameView<'_> {
        match self.kind {
            ffi::FRAME_TYPE_NONE => FrameView::None,
            ffi::FRAME_TYPE_VIDEO => self.video_view(),
            ffi::FRAME_TYPE_AUDIO => FrameView::Audio(AudioFrame {
                sample_rate: self.audio.sample_rate.max(0) as u32,
                channels: self.audio.no_channels.max(0) as u32,
                samples: self.audio.no_samples.max(0) as u32,
                timecode: self.audio.timecode,
            }),
            ffi::FRAME_TYPE_METADATA => self.metadata_view(),
            ffi::FRAME_TYPE_ERROR => FrameView::Error,
            ffi::FRAME_TYPE_STATUS_CHANGE => FrameView::StatusChange,
            other => FrameView::Unknown(other),
        }
    }
}

impl Drop for NdiFrame<'_> {
    fn drop(&mut self) {
        let lib = &self.receiver.lib;
        let instance = self.receiver.instance;

        // SAFETY: each buffer was filled by the capture call that produced this frame.
        unsafe {
            match self.kind {
                ffi::FRAME_TYPE_VIDEO => (lib.recv_free_video_v2)(instance, &self.video),
                ffi::FRAME_TYPE_AUDIO => (lib.recv_free_audio_v2)(instance, &self.audio),
                ffi::FRAME_TYPE_METADATA => (lib.recv_free_metadata)(instance, &self.metadata),
                _ => {}
            }
        }
    }
}
