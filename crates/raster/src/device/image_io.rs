//! Conversion to and from 8-bit RGBA images

use image::RgbaImage;
use tracing::{debug, warn};

use super::PaintDevice;
use crate::encoding::{ConversionFlags, RenderingIntent, rgba8, same_encoding};
use crate::error::{RasterError, alloc_bytes};
use crate::types::{Point, Rect};

impl PaintDevice {
    /// Write `image` with its top-left corner at `offset`, converting from
    /// RGBA8 into the device encoding
    pub fn convert_from_image(&mut self, image: &RgbaImage, offset: Point) -> Result<(), RasterError> {
        let rect = Rect::new(
            offset.x,
            offset.y,
            image.width() as i32,
            image.height() as i32,
        );
        if rect.is_empty() {
            return Ok(());
        }
        let source = rgba8();
        if same_encoding(source.as_ref(), self.encoding.as_ref()) {
            return self.write_bytes(image.as_raw(), rect);
        }
        let count = rect.area();
        let mut data = alloc_bytes(count * self.pixel_size())?;
        source.convert_pixels_to(
            image.as_raw(),
            &mut data,
            self.encoding.as_ref(),
            count,
            RenderingIntent::default(),
            ConversionFlags::default(),
        );
        debug!(
            "convert_from_image: {}x{} at ({}, {}) into {}",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            self.encoding.id()
        );
        self.write_bytes(&data, rect)
    }

    /// RGBA8 copy of `rect`; an empty rect gives a 0x0 image
    pub fn convert_to_image(
        &self,
        rect: Rect,
        intent: RenderingIntent,
        flags: ConversionFlags,
    ) -> Result<RgbaImage, RasterError> {
        if rect.is_empty() {
            return Ok(RgbaImage::new(0, 0));
        }
        let pixels = self.read_bytes(rect).inspect_err(|err| {
            warn!("convert_to_image: {}x{} {}", rect.width, rect.height, err);
        })?;
        let count = rect.area();
        let target = rgba8();
        let rgba = if same_encoding(self.encoding.as_ref(), target.as_ref()) {
            pixels
        } else {
            let mut rgba = alloc_bytes(count * target.pixel_size())?;
            self.encoding
                .convert_pixels_to(&pixels, &mut rgba, target.as_ref(), count, intent, flags);
            rgba
        };
        let actual = rgba.len();
        RgbaImage::from_raw(rect.width as u32, rect.height as u32, rgba).ok_or(
            RasterError::BufferSize {
                expected: count * target.pixel_size(),
                actual,
            },
        )
    }
}
