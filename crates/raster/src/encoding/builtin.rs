//! Built-in encodings: 8/16-bit and float RGBA, plus a single alpha channel

use super::{ChannelInfo, PixelEncoding, unit_to_u8, unit_to_u16};

const RGBA8_CHANNELS: [ChannelInfo; 4] = [
    ChannelInfo::new("red", 0, 1),
    ChannelInfo::new("green", 1, 1),
    ChannelInfo::new("blue", 2, 1),
    ChannelInfo::new("alpha", 3, 1),
];

const RGBA16_CHANNELS: [ChannelInfo; 4] = [
    ChannelInfo::new("red", 0, 2),
    ChannelInfo::new("green", 2, 2),
    ChannelInfo::new("blue", 4, 2),
    ChannelInfo::new("alpha", 6, 2),
];

const RGBA_F32_CHANNELS: [ChannelInfo; 4] = [
    ChannelInfo::new("red", 0, 4),
    ChannelInfo::new("green", 4, 4),
    ChannelInfo::new("blue", 8, 4),
    ChannelInfo::new("alpha", 12, 4),
];

const ALPHA8_CHANNELS: [ChannelInfo; 1] = [ChannelInfo::new("alpha", 0, 1)];

/// 8 bits per channel RGBA
#[derive(Debug, Clone, Copy, Default)]
pub struct Rgba8;

impl PixelEncoding for Rgba8 {
    fn id(&self) -> &str {
        "RGBA8"
    }

    fn pixel_size(&self) -> usize {
        4
    }

    fn channels(&self) -> &[ChannelInfo] {
        &RGBA8_CHANNELS
    }

    #[inline]
    fn opacity_u8(&self, pixel: &[u8]) -> u8 {
        pixel[3]
    }

    fn set_opacity_u8(&self, pixel: &mut [u8], opacity: u8) {
        pixel[3] = opacity;
    }

    fn scale_opacity(&self, pixel: &mut [u8], factor: f32) {
        pixel[3] = unit_to_u8(pixel[3] as f32 / 255.0 * factor.clamp(0.0, 1.0));
    }

    fn to_rgba_f32(&self, pixel: &[u8]) -> [f32; 4] {
        [
            pixel[0] as f32 / 255.0,
            pixel[1] as f32 / 255.0,
            pixel[2] as f32 / 255.0,
            pixel[3] as f32 / 255.0,
        ]
    }

    fn from_rgba_f32(&self, rgba: [f32; 4], pixel: &mut [u8]) {
        for (dst, value) in pixel[..4].iter_mut().zip(rgba) {
            *dst = unit_to_u8(value);
        }
    }
}

/// 16 bits per channel RGBA, native endian
#[derive(Debug, Clone, Copy, Default)]
pub struct Rgba16;

impl Rgba16 {
    #[inline]
    fn channels_of(pixel: &[u8]) -> [u16; 4] {
        bytemuck::pod_read_unaligned(&pixel[..8])
    }
}

impl PixelEncoding for Rgba16 {
    fn id(&self) -> &str {
        "RGBA16"
    }

    fn pixel_size(&self) -> usize {
        8
    }

    fn channels(&self) -> &[ChannelInfo] {
        &RGBA16_CHANNELS
    }

    fn opacity_u8(&self, pixel: &[u8]) -> u8 {
        let alpha = Self::channels_of(pixel)[3];
        ((alpha as u32 * 255 + 32767) / 65535) as u8
    }

    fn to_rgba_f32(&self, pixel: &[u8]) -> [f32; 4] {
        Self::channels_of(pixel).map(|c| c as f32 / 65535.0)
    }

    fn from_rgba_f32(&self, rgba: [f32; 4], pixel: &mut [u8]) {
        let channels: [u16; 4] = rgba.map(unit_to_u16);
        pixel[..8].copy_from_slice(bytemuck::bytes_of(&channels));
    }
}

/// 32-bit float RGBA, native endian
#[derive(Debug, Clone, Copy, Default)]
pub struct RgbaF32;

impl PixelEncoding for RgbaF32 {
    fn id(&self) -> &str {
        "RGBAF32"
    }

    fn pixel_size(&self) -> usize {
        16
    }

    fn channels(&self) -> &[ChannelInfo] {
        &RGBA_F32_CHANNELS
    }

    fn opacity_u8(&self, pixel: &[u8]) -> u8 {
        unit_to_u8(self.to_rgba_f32(pixel)[3])
    }

    fn to_rgba_f32(&self, pixel: &[u8]) -> [f32; 4] {
        bytemuck::pod_read_unaligned(&pixel[..16])
    }

    fn from_rgba_f32(&self, rgba: [f32; 4], pixel: &mut [u8]) {
        pixel[..16].copy_from_slice(bytemuck::bytes_of(&rgba));
    }
}

/// Single 8-bit coverage channel, used by selection masks
#[derive(Debug, Clone, Copy, Default)]
pub struct Alpha8;

impl PixelEncoding for Alpha8 {
    fn id(&self) -> &str {
        "ALPHA8"
    }

    fn pixel_size(&self) -> usize {
        1
    }

    fn channels(&self) -> &[ChannelInfo] {
        &ALPHA8_CHANNELS
    }

    #[inline]
    fn opacity_u8(&self, pixel: &[u8]) -> u8 {
        pixel[0]
    }

    fn set_opacity_u8(&self, pixel: &mut [u8], opacity: u8) {
        pixel[0] = opacity;
    }

    fn to_rgba_f32(&self, pixel: &[u8]) -> [f32; 4] {
        let value = pixel[0] as f32 / 255.0;
        [value, value, value, value]
    }

    // Coverage comes from alpha only; color is discarded.
    fn from_rgba_f32(&self, rgba: [f32; 4], pixel: &mut [u8]) {
        pixel[0] = unit_to_u8(rgba[3]);
    }
}
