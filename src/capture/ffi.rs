//! Raw bindings to the NDI runtime, resolved at run time with `libloading`.
//!
//! Layouts follow `Processing.NDI.Lib.h` (NDI 5 and 6 share them).

use std::ptr;

use libc::{c_char, c_int, c_void};
use libloading::Library;
use tracing::{debug, info};

use crate::capture::source::SourceError;
use crate::utils;

pub type FindInstance = *mut c_void;
pub type RecvInstance = *mut c_void;

pub const FRAME_TYPE_NONE: c_int = 0;
pub const FRAME_TYPE_VIDEO: c_int = 1;
pub const FRAME_TYPE_AUDIO: c_int = 2;
pub const FRAME_TYPE_METADATA: c_int = 3;
pub const FRAME_TYPE_ERROR: c_int = 4;
pub const FRAME_TYPE_STATUS_CHANGE: c_int = 100;

pub const RECV_COLOR_FORMAT_BGRX_BGRA: c_int = 0;
pub const RECV_COLOR_FORMAT_UYVY_BGRA: c_int = 1;
pub const RECV_COLOR_FORMAT_RGBX_RGBA: c_int = 2;
pub const RECV_COLOR_FORMAT_UYVY_RGBA: c_int = 3;
pub const RECV_COLOR_FORMAT_FASTEST: c_int = 100;
pub const RECV_COLOR_FORMAT_BEST: c_int = 101;

pub const RECV_BANDWIDTH_METADATA_ONLY: c_int = -10;
pub const RECV_BANDWIDTH_AUDIO_ONLY: c_int = 10;
pub const RECV_BANDWIDTH_LOWEST: c_int = 0;
pub const RECV_BANDWIDTH_HIGHEST: c_int = 100;

/// NDIlib_source_t
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawSource {
    pub p_ndi_name: *const c_char,
    pub p_url_address: *const c_char,
}

/// NDIlib_find_create_t
#[repr(C)]
pub struct FindCreate {
    pub show_local_sources: bool,
    pub p_groups: *const c_char,
    pub p_extra_ips: *const c_char,
}

/// NDIlib_recv_create_v3_t
#[repr(C)]
pub struct RecvCreateV3 {
    pub source_to_connect_to: RawSource,
    pub color_format: c_int,
    pub bandwidth: c_int,
    pub allow_video_fields: bool,
    pub p_ndi_recv_name: *const c_char,
}

/// NDIlib_video_frame_v2_t
#[repr(C)]
pub struct VideoFrameV2 {
    pub xres: c_int,
    pub yres: c_int,
    pub four_cc: u32,
    pub frame_rate_n: c_int,
    pub frame_rate_d: c_int,
    pub picture_aspect_ratio: f32,
    pub frame_format_type: c_int,
    pub timecode: i64,
    pub p_data: *mut u8,
    pub line_stride_in_bytes: c_int,
    pub p_metadata: *const c_char,
    pub timestamp: i64,
}

impl Default for VideoFrameV2 {
    fn default() -> Self {
        Self {
            xres: 0,
            yres: 0,
            four_cc: 0,
            frame_rate_n: 0,
            frame_rate_d: 0,
            picture_aspect_ratio: 0.0,
            frame_format_type: 0,
            timecode: 0,
            p_data: ptr::null_mut(),
            line_stride_in_bytes: 0,
            p_metadata: ptr::null(),
            timestamp: 0,
        }
    }
}

/// NDIlib_audio_frame_v2_t
#[repr(C)]
pub struct AudioFrameV2 {
    pub sample_rate: c_int,
    pub no_channels: c_int,
    pub no_samples: c_int,
    pub timecode: i64,
    pub p_data: *mut f32,
    pub channel_stride_in_bytes: c_int,
    pub p_metadata: *const c_char,
    pub timestamp: i64,
}

impl Default for AudioFrameV2 {
    fn default() -> Self {
        Self {
            sample_rate: 0,
            no_channels: 0,
            no_samples: 0,
            timecode: 0,
            p_data: ptr::null_mut(),
            channel_stride_in_bytes: 0,
            p_metadata: ptr::null(),
            timestamp: 0,
        }
    }
}

/// NDIlib_metadata_frame_t
#[repr(C)]
pub struct MetadataFrameRaw {
    pub length: c_int,
    pub timecode: i64,
    pub p_data: *mut c_char,
}

impl Default for MetadataFrameRaw {
    fn default() -> Self {
        Self {
            length: 0,
            timecode: 0,
            p_data: ptr::null_mut(),
        }
    }
}

/// NDIlib_tally_t
#[repr(C)]
pub struct RawTally {
    pub on_program: bool,
    pub on_preview: bool,
}

type InitializeFn = unsafe extern "C" fn() -> bool;
type DestroyFn = unsafe extern "C" fn();
type VersionFn = unsafe extern "C" fn() -> *const c_char;
type IsSupportedCpuFn = unsafe extern "C" fn() -> bool;
type FindCreateV2Fn = unsafe extern "C" fn(*const FindCreate) -> FindInstance;
type FindDestroyFn = unsafe extern "C" fn(FindInstance);
type FindWaitForSourcesFn = unsafe extern "C" fn(FindInstance, u32) -> bool;
type FindGetCurrentSourcesFn = unsafe extern "C" fn(FindInstance, *mut u32) -> *const RawSource;
type RecvCreateV3Fn = unsafe extern "C" fn(*const RecvCreateV3) -> RecvInstance;
type RecvDestroyFn = unsafe extern "C" fn(RecvInstance);
type RecvSetTallyFn = unsafe extern "C" fn(RecvInstance, *const RawTally) -> bool;
type RecvSendMetadataFn = unsafe extern "C" fn(RecvInstance, *const MetadataFrameRaw) -> bool;
type RecvCaptureV2Fn = unsafe extern "C" fn(
    RecvInstance,
    *mut VideoFrameV2,
    *mut AudioFrameV2,
    *mut MetadataFrameRaw,
    u32,
) -> c_int;
type RecvFreeVideoV2Fn = unsafe extern "C" fn(RecvInstance, *const VideoFrameV2);
type RecvFreeAudioV2Fn = unsafe extern "C" fn(RecvInstance, *const AudioFrameV2);
type RecvFreeMetadataFn = unsafe extern "C" fn(RecvInstance, *const MetadataFrameRaw);

/// Function table of a loaded NDI runtime.
///
/// The `Library` is kept alive for as long as any function pointer can be called.
pub struct NdiLib {
    _lib: Library,
    pub initialize: InitializeFn,
    pub destroy: DestroyFn,
    pub version: VersionFn,
    pub is_supported_cpu: IsSupportedCpuFn,
    pub find_create_v2: FindCreateV2Fn,
    pub find_destroy: FindDestroyFn,
    pub find_wait_for_sources: FindWaitForSourcesFn,
    pub find_get_current_sources: FindGetCurrentSourcesFn,
    pub recv_create_v3: RecvCreateV3Fn,
    pub recv_destroy: RecvDestroyFn,
    pub recv_set_tally: RecvSetTallyFn,
    pub recv_send_metadata: RecvSendMetadataFn,
    pub recv_capture_v2: RecvCaptureV2Fn,
    pub recv_free_video_v2: RecvFreeVideoV2Fn,
    pub recv_free_audio_v2: RecvFreeAudioV2Fn,
    pub recv_free_metadata: RecvFreeMetadataFn,
}

/// # Safety
/// `T` must be the exact function pointer type of `name` in the loaded library.
unsafe fn symbol<T: Copy>(lib: &Library, name: &'static str) -> Result<T, SourceError> {
    let mut bytes = Vec::with_capacity(name.len() + 1);
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(0);

    lib.get::<T>(&bytes)
        .map(|sym| *sym)
        .map_err(|e| SourceError::MissingSymbol {
            symbol: name,
            reason: e.to_string(),
        })
}

impl NdiLib {
    /// Open the first runtime library that loads and resolve every entry point.
    pub fn open() -> Result<Self, SourceError> {
        let candidates = utils::runtime_library_candidates();
        let mut last_error = String::from("no candidates");

        for candidate in &candidates {
            // SAFETY: loading the NDI runtime only runs its static initializers.
            match unsafe { Library::new(candidate) } {
                Ok(lib) => {
                    info!("Loaded NDI runtime from {}", candidate.display());
                    // SAFETY: every signature mirrors Processing.NDI.Lib.h.
                    return unsafe { Self::resolve(lib) };
                }
                Err(e) => {
                    debug!("Skipping {}: {}", candidate.display(), e);
                    last_error = e.to_string();
                }
            }
        }

        let tried = candidates
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");

        Err(SourceError::RuntimeNotFound {
            tried,
            reason: last_error,
        })
    }

    unsafe fn resolve(lib: Library) -> Result<Self, SourceError> {
        Ok(Self {
            initialize: symbol(&lib, "NDIlib_initialize")?,
            destroy: symbol(&lib, "NDIlib_destroy")?,
            version: symbol(&lib, "NDIlib_version")?,
            is_supported_cpu: symbol(&lib, "NDIlib_is_supported_CPU")?,
            find_create_v2: symbol(&lib, "NDIlib_find_create_v2")?,
            find_destroy: symbol(&lib, "NDIlib_find_destroy")?,
            find_wait_for_sources: symbol(&lib, "NDIlib_find_wait_for_sources")?,
            find_get_current_sources: symbol(&lib, "NDIlib_find_get_current_sources")?,
            recv_create_v3: symbol(&lib, "NDIlib_recv_create_v3")?,
            recv_destroy: symbol(&lib, "NDIlib_recv_destroy")?,
            recv_set_tally: symbol(&lib, "NDIlib_recv_set_tally")?,
            recv_send_metadata: symbol(&lib, "NDIlib_recv_send_metadata")?,
            recv_capture_v2: symbol(&lib, "NDIlib_recv_capture_v2")?,
            recv_free_video_v2: symbol(&lib, "NDIlib_recv_free_video_v2")?,
            recv_free_audio_v2: symbol(&lib, "NDIlib_recv_free_audio_v2")?,
            recv_free_metadata: symbol(&lib, "NDIlib_recv_free_metadata")?,
            _lib: lib,
        })
    }
}
