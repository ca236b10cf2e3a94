use tracing::debug;

use super::PaintDevice;
use crate::accessors::{Locator, RandomConstAccessor};
use crate::addressing::Addressing;
use crate::constants::OPACITY_TRANSPARENT_U8;
use crate::error::{RasterError, alloc_bytes};
use crate::tiles::TileStore;
use crate::types::{Point, Rect};

impl PaintDevice {
    #[inline]
    pub fn x(&self) -> i32 {
        self.offset.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.offset.y
    }

    #[inline]
    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn set_x(&mut self, x: i32) -> Result<(), RasterError> {
        self.move_to(x, self.offset.y)
    }

    pub fn set_y(&mut self, y: i32) -> Result<(), RasterError> {
        self.move_to(self.offset.x, y)
    }

    /// Place the device's store origin at `(x, y)`.
    ///
    /// Plain addressing only changes the offset. In wrap-around mode any
    /// content pushed outside the wrap rect is folded back into it, which
    /// may allocate.
    pub fn move_to(&mut self, x: i32, y: i32) -> Result<(), RasterError> {
        let target = Point::new(x, y);
        if target == self.offset {
            return Ok(());
        }
        let before = self.extent();
        match self.addressing() {
            Addressing::Bounded => self.offset = target,
            Addressing::WrapAround { wrap_rect } => self.rewrap(target, wrap_rect)?,
        }
        debug!("move_to: ({}, {})", x, y);
        self.invalidate_after_write(before.united(&self.extent()));
        Ok(())
    }

    fn rewrap(&mut self, target: Point, wrap_rect: Rect) -> Result<(), RasterError> {
        let plain = Locator::new(Addressing::Bounded, Point::default(), &self.store);
        let content_in_store = self.scan_exact_bounds(plain, self.store.extent());
        let content = content_in_store.translated(target.x, target.y);
        if wrap_rect.contains_rect(&content) {
            self.offset = target;
            return Ok(());
        }

        let pixel_size = self.pixel_size();
        let stride = content.width as usize * pixel_size;
        let mut pixels = alloc_bytes(stride * content.height as usize)?;
        self.store.read_rect(content_in_store, &mut pixels, stride);

        let mut rewrapped = TileStore::new(self.store.tile_config(), self.store.default_pixel());
        let wrap = Addressing::WrapAround { wrap_rect };
        for span in wrap.split_rect(content) {
            let start = (span.dst.y - content.y) as usize * stride
                + (span.dst.x - content.x) as usize * pixel_size;
            let src = span.src.translated(-target.x, -target.y);
            rewrapped.write_rect(src, &pixels[start..], stride)?;
        }
        debug!(
            "rewrap: content ({}, {}) {}x{} folded into wrap rect",
            content.x, content.y, content.width, content.height
        );
        self.store = rewrapped;
        self.offset = target;
        Ok(())
    }

    /// Tile-aligned bounds of all materialized tiles, clipped to the wrap
    /// rect in wrap-around mode
    pub fn extent(&self) -> Rect {
        let extent = self.store.extent().translated(self.offset.x, self.offset.y);
        match self.addressing() {
            Addressing::Bounded => extent,
            Addressing::WrapAround { wrap_rect } => extent.intersected(&wrap_rect),
        }
    }

    /// Smallest rect holding every pixel with non-zero opacity. Cached.
    pub fn exact_bounds(&self) -> Rect {
        self.cache.exact_bounds(|| self.calculate_exact_bounds())
    }

    /// Uncached exact bounds.
    ///
    /// An opaque default pixel makes every coordinate content, so the extent
    /// is returned without scanning.
    pub fn calculate_exact_bounds(&self) -> Rect {
        let extent = self.extent();
        if self.encoding.opacity_u8(self.store.default_pixel()) != OPACITY_TRANSPARENT_U8 {
            return extent;
        }
        self.scan_exact_bounds(self.locator(), extent)
    }

    /// Four passes over `coarse`: top, bottom, left, right. Each pass stops
    /// at the first pixel with non-zero opacity.
    fn scan_exact_bounds(&self, locator: Locator, coarse: Rect) -> Rect {
        if coarse.is_empty() {
            return Rect::default();
        }
        let encoding = self.encoding.as_ref();
        let mut accessor =
            RandomConstAccessor::from_parts(&self.store, &self.store, locator, coarse.x, coarse.y);
        let mut has_content = |x: i32, y: i32| {
            accessor.move_to(x, y);
            encoding.opacity_u8(accessor.raw_data_const()) != OPACITY_TRANSPARENT_U8
        };
        let (x0, x1) = (coarse.x, coarse.x_end());

        let Some(top) = (coarse.y..coarse.y_end()).find(|&y| (x0..x1).any(|x| has_content(x, y)))
        else {
            return Rect::default();
        };
        let bottom = (top..coarse.y_end())
            .rev()
            .find(|&y| (x0..x1).any(|x| has_content(x, y)))
            .unwrap_or(top);
        let left = (x0..x1)
            .find(|&x| (top..=bottom).any(|y| has_content(x, y)))
            .unwrap_or(x0);
        let right = (left..x1)
            .rev()
            .find(|&x| (top..=bottom).any(|y| has_content(x, y)))
            .unwrap_or(left);
        Rect::from_edges(left, top, right + 1, bottom + 1)
    }

    /// Rects of the materialized tiles in device space. Cached.
    pub fn region(&self) -> Vec<Rect> {
        self.cache.region(|| {
            let addressing = self.addressing();
            self.store
                .region()
                .into_iter()
                .map(|rect| rect.translated(self.offset.x, self.offset.y))
                .map(|rect| match addressing {
                    Addressing::Bounded => rect,
                    Addressing::WrapAround { wrap_rect } => rect.intersected(&wrap_rect),
                })
                .filter(|rect| !rect.is_empty())
                .collect()
        })
    }

    /// Keep only content inside `rect`; never grows the device
    pub fn crop(&mut self, rect: Rect) -> Result<(), RasterError> {
        let before = self.extent();
        self.store
            .crop(rect.translated(-self.offset.x, -self.offset.y))?;
        self.invalidate_after_write(before);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::addressing::FixedBounds;
    use crate::encoding::{Color, rgba8};

    #[test]
    fn test_move_translates_bounds() {
        let mut device = PaintDevice::new(rgba8());
        device
            .fill(Rect::new(3, 4, 5, 6), &Color::white(rgba8()))
            .unwrap();
        device.move_to(-7, 2).unwrap();
        assert_eq!(device.exact_bounds(), Rect::new(-4, 6, 5, 6));
        device.set_x(0).unwrap();
        device.set_y(0).unwrap();
        assert_eq!(device.exact_bounds(), Rect::new(3, 4, 5, 6));
    }

    #[test]
    fn test_opaque_default_bounds_are_extent() {
        let mut device = PaintDevice::new(rgba8());
        device.set_default_pixel(&Color::white(rgba8())).unwrap();
        assert!(device.exact_bounds().is_empty());
        device
            .fill(Rect::new(1, 1, 1, 1), &Color::from_rgba8([1, 2, 3, 255], rgba8()))
            .unwrap();
        assert_eq!(device.exact_bounds(), Rect::new(0, 0, 64, 64));
    }

    #[test]
    fn test_wrapped_extent_clipped() {
        let bounds = Arc::new(FixedBounds::wrapped(Rect::new(0, 0, 20, 20)));
        let mut device = PaintDevice::with_bounds(rgba8(), bounds);
        device
            .fill(Rect::new(2, 2, 3, 3), &Color::white(rgba8()))
            .unwrap();
        assert_eq!(device.extent(), Rect::new(0, 0, 20, 20));
        assert_eq!(device.exact_bounds(), Rect::new(2, 2, 3, 3));
        assert_eq!(device.region(), vec![Rect::new(0, 0, 20, 20)]);
    }

    #[test]
    fn test_crop_outside_content_empties() {
        let mut device = PaintDevice::new(rgba8());
        device
            .fill(Rect::new(0, 0, 10, 10), &Color::white(rgba8()))
            .unwrap();
        device.crop(Rect::new(500, 500, 10, 10)).unwrap();
        assert!(device.exact_bounds().is_empty());
        assert!(device.extent().is_empty());
    }
}
