//! Nearest-neighbour thumbnails

use image::RgbaImage;
use tracing::trace;

use super::PaintDevice;
use crate::cache::ThumbnailKey;
use crate::encoding::{ConversionFlags, RenderingIntent};
use crate::error::{RasterError, alloc_bytes};
use crate::types::Rect;

/// Largest size with the aspect ratio of `width` x `height` that fits in
/// `max_width` x `max_height`. Content is never scaled up.
pub fn fit_thumbnail_size(width: i32, height: i32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= 0 || height <= 0 || max_width == 0 || max_height == 0 {
        return (0, 0);
    }
    let (w, h) = (width as u32, height as u32);
    if w <= max_width && h <= max_height {
        return (w, h);
    }
    let scale = (max_width as f64 / w as f64).min(max_height as f64 / h as f64);
    let fit = |edge: u32, max: u32| ((edge as f64 * scale).round() as u32).clamp(1, max);
    (fit(w, max_width), fit(h, max_height))
}

/// Source coordinate sampled for thumbnail coordinate `t` of `size`
#[inline]
fn sample(start: i32, len: i32, t: u32, size: u32) -> i32 {
    start + ((t as f64 + 0.5) * len as f64 / size as f64) as i32
}

impl PaintDevice {
    /// Packed pixels of `src` resampled to `width` x `height`
    fn sample_pixels(&self, src: Rect, width: u32, height: u32) -> Result<Vec<u8>, RasterError> {
        let pixel_size = self.pixel_size();
        let mut data = alloc_bytes(width as usize * height as usize * pixel_size)?;
        let mut accessor = self.random_accessor_const(src.x, src.y);
        for (i, pixel) in data.chunks_exact_mut(pixel_size).enumerate() {
            let tx = (i % width as usize) as u32;
            let ty = (i / width as usize) as u32;
            accessor.move_to(
                sample(src.x, src.width, tx, width),
                sample(src.y, src.height, ty, height),
            );
            pixel.copy_from_slice(accessor.raw_data_const());
        }
        Ok(data)
    }

    /// Scaled-down copy of `rect` (exact bounds by default) in this device's
    /// encoding, with its top-left corner at the origin
    pub fn create_thumbnail_device(
        &self,
        max_width: u32,
        max_height: u32,
        rect: Option<Rect>,
    ) -> Result<PaintDevice, RasterError> {
        let src = rect.unwrap_or_else(|| self.exact_bounds());
        let mut device = self.create_composition_source_device();
        device.offset = Default::default();
        let (width, height) = fit_thumbnail_size(src.width, src.height, max_width, max_height);
        if width == 0 || height == 0 {
            return Ok(device);
        }
        let data = self.sample_pixels(src, width, height)?;
        device.write_bytes(&data, Rect::new(0, 0, width as i32, height as i32))?;
        Ok(device)
    }

    /// RGBA8 thumbnail of the exact bounds fitted into
    /// `max_width` x `max_height`. Cached per request until the next write;
    /// an empty device gives a 0x0 image.
    pub fn create_thumbnail(
        &self,
        max_width: u32,
        max_height: u32,
        intent: RenderingIntent,
        flags: ConversionFlags,
    ) -> Result<RgbaImage, RasterError> {
        let key = ThumbnailKey {
            max_width,
            max_height,
            intent,
            flags,
        };
        if let Some(image) = self.cache.thumbnail(&key) {
            trace!("create_thumbnail: cache hit {}x{}", max_width, max_height);
            return Ok(image);
        }
        let generation = self.cache.generation();
        let bounds = self.exact_bounds();
        let (width, height) = fit_thumbnail_size(bounds.width, bounds.height, max_width, max_height);
        let thumbnail = self.create_thumbnail_device(max_width, max_height, Some(bounds))?;
        let image = thumbnail.convert_to_image(
            Rect::new(0, 0, width as i32, height as i32),
            intent,
            flags,
        )?;
        self.cache.store_thumbnail(key, generation, image.clone());
        Ok(image)
    }
}
