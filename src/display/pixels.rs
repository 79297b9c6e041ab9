//! Conversion of captured frames into the packed RGBA layout the texture expects.
//!
//! The output always has the surface resolution. Frames of another size are
//! resampled nearest-neighbour, so the texture is never reallocated.

use thiserror::Error;

use crate::capture::frame::{PixelFormat, VideoFrame};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Unsupported pixel format {0}")]
    Unsupported(PixelFormat),

    #[error("Frame has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("Stride {stride} is too small for a {width} pixel wide {format} row")]
    Stride {
        format: PixelFormat,
        width: u32,
        stride: usize,
    },

    #[error("Frame buffer holds {actual} bytes, {expected} needed")]
    Truncated { expected: usize, actual: usize },

    #[error("Output buffer holds {actual} bytes, {expected} needed")]
    Output { expected: usize, actual: usize },

    #[error("Output has no pixels ({width}x{height})")]
    EmptyOutput { width: u32, height: u32 },
}

/// YCbCr to RGB coefficients, scaled by 256
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Matrix {
    Bt601,
    Bt709,
}

impl Matrix {
    /// SD material is BT.601, HD and up is BT.709.
    fn for_height(height: u32) -> Self {
        if height >= 720 {
            Matrix::Bt709
        } else {
            Matrix::Bt601
        }
    }

    fn rgb(self, y: u8, u: u8, v: u8) -> [u8; 3] {
        let c = (i32::from(y) - 16) * 298;
        let d = i32::from(u) - 128;
        let e = i32::from(v) - 128;

        let (r, g, b) = match self {
            Matrix::Bt601 => (c + 409 * e, c - 100 * d - 208 * e, c + 516 * d),
            Matrix::Bt709 => (c + 459 * e, c - 55 * d - 136 * e, c + 541 * d),
        };

        [clamp(r), clamp(g), clamp(b)]
    }
}

fn clamp(value: i32) -> u8 {
    ((value + 128) >> 8).clamp(0, 255) as u8
}

/// Reads single pixels out of a validated frame
struct Sampler<'a> {
    data: &'a [u8],
    format: PixelFormat,
    width: usize,
    height: usize,
    stride: usize,
    matrix: Matrix,
}

impl<'a> Sampler<'a> {
    fn new(frame: &VideoFrame<'a>) -> Result<Self, ConvertError> {
        if frame.width == 0 || frame.height == 0 {
            return Err(ConvertError::Empty {
                width: frame.width,
                height: frame.height,
            });
        }

        let width = frame.width as usize;
        let height = frame.height as usize;
        if frame.stride < frame.format.min_stride(width) {
            return Err(ConvertError::Stride {
                format: frame.format,
                width: frame.width,
                stride: frame.stride,
            });
        }

        let expected = frame.format.buffer_len(width, height, frame.stride);
        if frame.data.len() < expected {
            return Err(ConvertError::Truncated {
                expected,
                actual: frame.data.len(),
            });
        }

        Ok(Self {
            data: frame.data,
            format: frame.format,
            width,
            height,
            stride: frame.stride,
            matrix: Matrix::for_height(frame.height),
        })
    }

    fn yuv(&self, y: u8, u: u8, v: u8, a: u8) -> [u8; 4] {
        let [r, g, b] = self.matrix.rgb(y, u, v);
        [r, g, b, a]
    }

    fn rgba(&self, x: usize, y: usize) -> [u8; 4] {
        let d = self.data;
        let plane = self.stride * self.height;

        match self.format {
            PixelFormat::Bgra | PixelFormat::Bgrx => {
                let o = y * self.stride + x * 4;
                let a = if self.format == PixelFormat::Bgra { d[o + 3] } else { 255 };
                [d[o + 2], d[o + 1], d[o], a]
            }
            PixelFormat::Rgba | PixelFormat::Rgbx => {
                let o = y * self.stride + x * 4;
                let a = if self.format == PixelFormat::Rgba { d[o + 3] } else { 255 };
                [d[o], d[o + 1], d[o + 2], a]
            }
            PixelFormat::Uyvy | PixelFormat::Uyva => {
                // U Y0 V Y1 per pair of pixels
                let o = y * self.stride + (x / 2) * 4;
                let luma = if x % 2 == 0 { d[o + 1] } else { d[o + 3] };
                let a = if self.format == PixelFormat::Uyva {
                    d[plane + y * self.width + x]
                } else {
                    255
                };
                self.yuv(luma, d[o], d[o + 2], a)
            }
            PixelFormat::P216 | PixelFormat::Pa16 => {
                // 16 bit little-endian samples, keep the high byte
                let luma = d[y * self.stride + x * 2 + 1];
                let o = plane + y * self.stride + (x / 2) * 4;
                let a = if self.format == PixelFormat::Pa16 {
                    d[2 * plane + y * self.stride + x * 2 + 1]
                } else {
                    255
                };
                self.yuv(luma, d[o + 1], d[o + 3], a)
            }
            PixelFormat::Nv12 => {
                let luma = d[y * self.stride + x];
                let o = plane + (y / 2) * self.stride + (x / 2) * 2;
                self.yuv(luma, d[o], d[o + 1], 255)
            }
            PixelFormat::I420 | PixelFormat::Yv12 => {
                let luma = d[y * self.stride + x];
                let chroma_stride = self.stride.div_ceil(2);
                let first = plane;
                let second = plane + chroma_stride * self.height.div_ceil(2);
                let o = (y / 2) * chroma_stride + x / 2;
                let (u, v) = if self.format == PixelFormat::I420 {
                    (d[first + o], d[second + o])
                } else {
                    (d[second + o], d[first + o])
                };
                self.yuv(luma, u, v, 255)
            }
        }
    }
}

/// Convert `frame` into `out`, a packed RGBA buffer of `out_width` x `out_height`.
pub fn convert_to_rgba(
    frame: &VideoFrame<'_>,
    out: &mut [u8],
    out_width: u32,
    out_height: u32,
) -> Result<(), ConvertError> {
    if out_width == 0 || out_height == 0 {
        return Err(ConvertError::EmptyOutput {
            width: out_width,
            height: out_height,
        });
    }

    let out_width = out_width as usize;
    let out_height = out_height as usize;
    let expected = out_width * out_height * 4;
    if out.len() < expected {
        return Err(ConvertError::Output {
            expected,
            actual: out.len(),
        });
    }

    let sampler = Sampler::new(frame)?;

    for (dy, row) in out[..expected]
        .chunks_exact_mut(out_width * 4)
        .enumerate()
    {
        let sy = dy * sampler.height / out_height;
        for (dx, pixel) in row.chunks_exact_mut(4).enumerate() {
            let sx = dx * sampler.width / out_width;
            pixel.copy_from_slice(&sampler.rgba(sx, sy));
        }
    }

    Ok(())
}
