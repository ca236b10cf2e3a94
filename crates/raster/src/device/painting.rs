use tracing::debug;

use super::PaintDevice;
use crate::accessors::{RectConstIterator, RectIterator};
use crate::constants::OPACITY_TRANSPARENT_U8;
use crate::encoding::Color;
use crate::error::RasterError;
use crate::surface::SelectionMask;
use crate::types::Rect;

impl PaintDevice {
    fn check_pixel(&self, pixel: &[u8]) -> Result<(), RasterError> {
        if pixel.len() != self.pixel_size() {
            return Err(RasterError::PixelSize {
                expected: self.pixel_size(),
                actual: pixel.len(),
            });
        }
        Ok(())
    }

    /// Write one pixel, converting `color` into the device encoding
    pub fn set_pixel(&mut self, x: i32, y: i32, color: &Color) -> Result<(), RasterError> {
        let color = color.converted_to(&self.encoding);
        self.set_pixel_bytes(x, y, color.data())
    }

    pub fn set_pixel_bytes(&mut self, x: i32, y: i32, pixel: &[u8]) -> Result<(), RasterError> {
        self.check_pixel(pixel)?;
        let mut it = self.h_line_iterator(x, y, 1);
        it.raw_data()?.copy_from_slice(pixel);
        Ok(())
    }

    /// Pixel at `(x, y)`.
    ///
    /// Every coordinate resolves to a real or default tile; `None` only for
    /// coordinates that cannot be mapped into store space.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        x.checked_sub(self.offset.x)?;
        y.checked_sub(self.offset.y)?;
        let accessor = self.random_accessor_const(x, y);
        Color::new(self.encoding.clone(), accessor.raw_data_const().to_vec())
    }

    pub fn fill(&mut self, rect: Rect, color: &Color) -> Result<(), RasterError> {
        let color = color.converted_to(&self.encoding);
        self.fill_bytes(rect, color.data())
    }

    /// Fill `rect` with raw pixel bytes in the device encoding
    pub fn fill_bytes(&mut self, rect: Rect, pixel: &[u8]) -> Result<(), RasterError> {
        self.check_pixel(pixel)?;
        if rect.is_empty() {
            debug!("fill: empty rect {:?} ignored", rect);
            return Ok(());
        }
        self.apply_spans(rect, |store, span| store.fill_rect(span.src, pixel))?;
        self.invalidate_after_write(rect);
        Ok(())
    }

    /// Drop every tile; the device reads as default everywhere
    pub fn clear(&mut self) {
        let before = self.extent();
        self.store.clear();
        debug!("clear: dropped all tiles");
        self.invalidate_after_write(before);
    }

    /// Reset `rect` to the default pixel, visiting only tiles it overlaps
    pub fn clear_rect(&mut self, rect: Rect) -> Result<(), RasterError> {
        if rect.is_empty() {
            return Ok(());
        }
        self.apply_spans(rect, |store, span| store.clear_rect(span.src))?;
        self.invalidate_after_write(rect);
        Ok(())
    }

    pub fn default_pixel(&self) -> Color {
        Color::new(self.encoding.clone(), self.store.default_pixel().to_vec())
            .unwrap_or_else(|| Color::transparent(self.encoding.clone()))
    }

    /// Change what unwritten coordinates read as. Written tiles keep their bytes.
    pub fn set_default_pixel(&mut self, color: &Color) -> Result<(), RasterError> {
        let color = color.converted_to(&self.encoding);
        self.store.set_default_pixel(color.data())?;
        self.invalidate_after_write(self.default_bounds.bounds());
        Ok(())
    }

    /// Evict tiles overlapping `rect` that hold nothing but the default pixel
    pub fn purge(&mut self, rect: Rect) -> usize {
        let purged = self
            .store_spans(rect)
            .into_iter()
            .map(|span| self.store.purge(span.src))
            .sum();
        if purged > 0 {
            self.cache.invalidate();
        }
        purged
    }

    /// Erase selected pixels.
    ///
    /// Every covered pixel loses opacity in proportion to the selection,
    /// inside the device's default bounds. When the default pixel is
    /// transparent, pixels that end up transparent are reset to it so the
    /// tiles they leave behind can be purged.
    pub fn clear_selection(&mut self, selection: &SelectionMask) -> Result<(), RasterError> {
        let rect = selection
            .selected_exact_rect()
            .intersected(&self.default_bounds.bounds());
        if rect.is_empty() {
            return Ok(());
        }
        self.apply_spans(rect, |store, span| store.reserve_rect(span.src))?;

        let encoding = self.encoding.clone();
        let mask_encoding = selection.device().encoding().clone();
        let default_pixel = self.store.default_pixel().to_vec();
        let transparent_default = encoding.opacity_u8(&default_pixel) == OPACITY_TRANSPARENT_U8;
        {
            let mut dst = RectIterator::new(self, rect);
            let mut src = RectConstIterator::new(selection.device(), rect);
            while dst.is_valid() {
                let coverage = mask_encoding.opacity_u8(src.raw_data_const());
                if coverage != OPACITY_TRANSPARENT_U8 {
                    let pixel = dst.raw_data()?;
                    encoding.scale_opacity(pixel, 1.0 - coverage as f32 / 255.0);
                    if transparent_default
                        && encoding.opacity_u8(pixel) == OPACITY_TRANSPARENT_U8
                    {
                        pixel.copy_from_slice(&default_pixel);
                    }
                }
                dst.next_pixel();
                src.next_pixel();
            }
        }
        let purged = self.purge(rect);
        debug!(
            "clear_selection: ({}, {}) {}x{} purged {} tiles",
            rect.x, rect.y, rect.width, rect.height, purged
        );
        Ok(())
    }
}
