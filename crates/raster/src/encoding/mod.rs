//! Pixel encodings
//!
//! The storage engine itself only needs a pixel size and a default pixel byte
//! pattern. Everything that interprets pixel bytes (opacity, conversion,
//! thumbnails, selection masks) goes through [`PixelEncoding`].

mod builtin;
mod color;

pub use builtin::{Alpha8, Rgba16, Rgba8, RgbaF32};
pub use color::Color;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Rendering intent forwarded to conversions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RenderingIntent {
    #[default]
    Perceptual,
    RelativeColorimetric,
    Saturation,
    AbsoluteColorimetric,
}

/// Conversion flags forwarded to conversions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ConversionFlags {
    pub black_point_compensation: bool,
    pub no_optimization: bool,
}

/// Byte layout of one channel within a pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
    pub name: &'static str,
    /// Offset of the channel in bytes from the pixel start
    pub offset: usize,
    /// Channel size in bytes
    pub size: usize,
}

impl ChannelInfo {
    pub const fn new(name: &'static str, offset: usize, size: usize) -> Self {
        Self { name, offset, size }
    }
}

/// Description of a pixel byte layout and the operations on it
pub trait PixelEncoding: fmt::Debug + Send + Sync {
    /// Stable identifier; two encodings with the same id are interchangeable
    fn id(&self) -> &str;

    /// Bytes per pixel
    fn pixel_size(&self) -> usize;

    /// Channel layout, in storage order
    fn channels(&self) -> &[ChannelInfo];

    fn channel_count(&self) -> usize {
        self.channels().len()
    }

    /// Opacity of a pixel mapped to 0..=255
    fn opacity_u8(&self, pixel: &[u8]) -> u8;

    fn to_rgba_f32(&self, pixel: &[u8]) -> [f32; 4];

    fn from_rgba_f32(&self, rgba: [f32; 4], pixel: &mut [u8]);

    fn set_opacity_u8(&self, pixel: &mut [u8], opacity: u8) {
        let mut rgba = self.to_rgba_f32(pixel);
        rgba[3] = opacity as f32 / 255.0;
        self.from_rgba_f32(rgba, pixel);
    }

    /// Multiply the pixel opacity by `factor` (clamped to 0..=1)
    fn scale_opacity(&self, pixel: &mut [u8], factor: f32) {
        let mut rgba = self.to_rgba_f32(pixel);
        rgba[3] *= factor.clamp(0.0, 1.0);
        self.from_rgba_f32(rgba, pixel);
    }

    /// Fully transparent pixel bytes
    fn transparent_pixel(&self) -> Vec<u8> {
        let mut pixel = vec![0; self.pixel_size()];
        self.from_rgba_f32([0.0; 4], &mut pixel);
        pixel
    }

    /// Convert `count` packed pixels from this encoding into `dst_encoding`.
    ///
    /// Identical encodings copy bytes; anything else goes through RGBA f32.
    fn convert_pixels_to(
        &self,
        src: &[u8],
        dst: &mut [u8],
        dst_encoding: &dyn PixelEncoding,
        count: usize,
        _intent: RenderingIntent,
        _flags: ConversionFlags,
    ) {
        let src_size = self.pixel_size();
        let dst_size = dst_encoding.pixel_size();
        if self.id() == dst_encoding.id() {
            let len = count * src_size;
            dst[..len].copy_from_slice(&src[..len]);
            return;
        }
        for (s, d) in src
            .chunks_exact(src_size)
            .zip(dst.chunks_exact_mut(dst_size))
            .take(count)
        {
            dst_encoding.from_rgba_f32(self.to_rgba_f32(s), d);
        }
    }
}

/// Shared handle to an encoding
pub type EncodingRef = Arc<dyn PixelEncoding>;

/// Encodings are compared by id
pub fn same_encoding(a: &dyn PixelEncoding, b: &dyn PixelEncoding) -> bool {
    a.id() == b.id()
}

pub fn rgba8() -> EncodingRef {
    Arc::new(Rgba8)
}

pub fn rgba16() -> EncodingRef {
    Arc::new(Rgba16)
}

pub fn rgba_f32() -> EncodingRef {
    Arc::new(RgbaF32)
}

pub fn alpha8() -> EncodingRef {
    Arc::new(Alpha8)
}

/// Unit float to u8 with rounding
#[inline]
pub(crate) fn unit_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[inline]
pub(crate) fn unit_to_u16(value: f32) -> u16 {
    (value.clamp(0.0, 1.0) * 65535.0).round() as u16
}
