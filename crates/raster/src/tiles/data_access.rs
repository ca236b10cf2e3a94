//! Bulk pixel access on the tile store: rect reads/writes, fills, crop and blits

use std::sync::Arc;

use tracing::debug;

use super::{Tile, TileStore};
use crate::error::RasterError;
use crate::types::{Rect, TileCoord};

impl TileStore {
    /// Parts of `rect` falling into each overlapping tile
    pub(crate) fn tile_spans(&self, rect: Rect) -> Vec<(TileCoord, Rect)> {
        self.tiles_in_rect(rect)
            .map(|coord| (coord, self.tile_rect(coord).intersected(&rect)))
            .collect()
    }

    /// Bytes of the store pixel at `(x, y)`
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> &[u8] {
        let offset = self.offset_in_tile(x, y);
        &self.tile_for_read(self.tile_coord_of(x, y)).data()[offset..offset + self.pixel_size]
    }

    /// Copy `rect` into `dst`, whose rows are `dst_stride` bytes apart and
    /// whose first byte corresponds to the rect's top-left pixel.
    pub fn read_rect(&self, rect: Rect, dst: &mut [u8], dst_stride: usize) {
        let pixel_size = self.pixel_size;
        for (coord, part) in self.tile_spans(rect) {
            let data = self.tile_for_read(coord).data();
            let row_bytes = part.width as usize * pixel_size;
            for y in part.y..part.y_end() {
                let src = self.offset_in_tile(part.x, y);
                let dst_start =
                    (y - rect.y) as usize * dst_stride + (part.x - rect.x) as usize * pixel_size;
                dst[dst_start..dst_start + row_bytes].copy_from_slice(&data[src..src + row_bytes]);
            }
        }
    }

    /// Copy `src` (laid out like [`read_rect`](Self::read_rect)) into `rect`.
    ///
    /// All affected tiles are made writable before any pixel changes.
    pub fn write_rect(&mut self, rect: Rect, src: &[u8], src_stride: usize) -> Result<(), RasterError> {
        self.reserve_rect(rect)?;
        let pixel_size = self.pixel_size;
        for (coord, part) in self.tile_spans(rect) {
            let row_bytes = part.width as usize * pixel_size;
            let offsets: Vec<(usize, usize)> = (part.y..part.y_end())
                .map(|y| {
                    (
                        self.offset_in_tile(part.x, y),
                        (y - rect.y) as usize * src_stride + (part.x - rect.x) as usize * pixel_size,
                    )
                })
                .collect();
            let data = self.tile_for_write(coord)?.data_mut();
            for (dst, src_start) in offsets {
                data[dst..dst + row_bytes].copy_from_slice(&src[src_start..src_start + row_bytes]);
            }
        }
        Ok(())
    }

    /// Fill `rect` with `pixel`.
    ///
    /// Tiles wholly covered share one solid tile, or drop back to default
    /// when `pixel` is the default pixel.
    pub fn fill_rect(&mut self, rect: Rect, pixel: &[u8]) -> Result<(), RasterError> {
        if rect.is_empty() {
            return Ok(());
        }
        if pixel.len() != self.pixel_size {
            return Err(RasterError::PixelSize {
                expected: self.pixel_size,
                actual: pixel.len(),
            });
        }
        let is_default = pixel == self.default_pixel.as_slice();
        let spans = self.tile_spans(rect);
        let (full, partial): (Vec<_>, Vec<_>) = spans
            .into_iter()
            .partition(|(coord, part)| *part == self.tile_rect(*coord));

        let solid = if is_default || full.is_empty() {
            None
        } else {
            Some(Arc::new(Tile::filled(pixel, self.tile_pixel_count())?))
        };
        self.reserve_tiles(partial.iter().map(|(coord, _)| *coord))?;

        for (coord, _) in full {
            self.set_tile(coord, solid.clone());
        }
        for (coord, part) in partial {
            let offsets: Vec<usize> = (part.y..part.y_end())
                .map(|y| self.offset_in_tile(part.x, y))
                .collect();
            let row_bytes = part.width as usize * self.pixel_size;
            let data = self.tile_for_write(coord)?.data_mut();
            for start in offsets {
                for chunk in data[start..start + row_bytes].chunks_exact_mut(pixel.len()) {
                    chunk.copy_from_slice(pixel);
                }
            }
        }
        debug!(
            "fill_rect: ({}, {}) {}x{} -> {} tiles",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            self.tile_count()
        );
        Ok(())
    }

    /// Reset `rect` to the default pixel
    pub fn clear_rect(&mut self, rect: Rect) -> Result<(), RasterError> {
        let pixel = self.default_pixel.clone();
        self.fill_rect(rect, &pixel)
    }

    /// Keep only what lies inside `rect`.
    ///
    /// Tiles wholly outside are dropped. Tiles straddling the edge stay
    /// materialized with their outside pixels reset to default.
    pub fn crop(&mut self, rect: Rect) -> Result<(), RasterError> {
        if rect.is_empty() {
            self.clear();
            return Ok(());
        }
        let mut straddling = Vec::new();
        let mut outside = Vec::new();
        for coord in self.materialized_coords() {
            let tile_rect = self.tile_rect(coord);
            if !tile_rect.intersects(&rect) {
                outside.push(coord);
            } else if !rect.contains_rect(&tile_rect) {
                straddling.push(coord);
            }
        }
        for coord in &straddling {
            self.tile_for_write(*coord)?;
        }

        for coord in &outside {
            self.tiles.remove(coord);
        }
        let default_pixel = self.default_pixel.clone();
        for coord in straddling {
            let tile_rect = self.tile_rect(coord);
            let tile_x = tile_rect.x;
            let tile_y = tile_rect.y;
            let pixel_size = self.pixel_size;
            let width = self.tile_width;
            let data = self.tile_for_write(coord)?.data_mut();
            for (index, chunk) in data.chunks_exact_mut(pixel_size).enumerate() {
                let x = tile_x + index as i32 % width;
                let y = tile_y + index as i32 / width;
                if !rect.contains_point(x, y) {
                    chunk.copy_from_slice(&default_pixel);
                }
            }
        }
        debug!(
            "crop: ({}, {}) {}x{} -> dropped {} tiles",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            outside.len()
        );
        Ok(())
    }

    /// Copy `rect` from `src`, sharing wholly covered tiles.
    ///
    /// Both stores must have the same layout and default pixel.
    pub fn bit_blt(&mut self, src: &TileStore, rect: Rect) -> Result<(), RasterError> {
        let spans = self.tile_spans(rect);
        let (full, partial): (Vec<_>, Vec<_>) = spans
            .into_iter()
            .partition(|(coord, part)| *part == self.tile_rect(*coord));
        self.reserve_tiles(partial.iter().map(|(coord, _)| *coord))?;

        for (coord, _) in &full {
            self.set_tile(*coord, src.shared_tile(*coord));
        }
        for (coord, part) in partial {
            let row_bytes = part.width as usize * self.pixel_size;
            let offsets: Vec<usize> = (part.y..part.y_end())
                .map(|y| self.offset_in_tile(part.x, y))
                .collect();
            let src_data = src.tile_for_read(coord).data();
            let data = self.tile_for_write(coord)?.data_mut();
            for start in offsets {
                data[start..start + row_bytes].copy_from_slice(&src_data[start..start + row_bytes]);
            }
        }
        debug!(
            "bit_blt: ({}, {}) {}x{} shared {} tiles",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            full.len()
        );
        Ok(())
    }

    /// Share every tile overlapping `rect` from `src`, whole.
    ///
    /// Pixels outside `rect` in edge tiles come along. Never allocates.
    pub fn bit_blt_rough(&mut self, src: &TileStore, rect: Rect) {
        let coords: Vec<TileCoord> = self.tiles_in_rect(rect).collect();
        for coord in &coords {
            self.set_tile(*coord, src.shared_tile(*coord));
        }
        debug!(
            "bit_blt_rough: ({}, {}) {}x{} -> {} tiles",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            coords.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use raster_config::TileConfig;

    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];

    fn store() -> TileStore {
        TileStore::new(TileConfig::square(4), &[0, 0, 0, 0])
    }

    #[test]
    fn test_fill_shares_solid_tile() {
        let mut store = store();
        store.fill_rect(Rect::new(0, 0, 8, 4), &RED).unwrap();
        let a = store.shared_tile(TileCoord::new(0, 0)).unwrap();
        let b = store.shared_tile(TileCoord::new(1, 0)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_fill_partial_then_write_isolated() {
        let mut store = store();
        store.fill_rect(Rect::new(0, 0, 8, 4), &RED).unwrap();
        store.fill_rect(Rect::new(1, 1, 1, 1), &[1, 2, 3, 4]).unwrap();
        assert_eq!(store.pixel(1, 1), &[1, 2, 3, 4]);
        assert_eq!(store.pixel(5, 1), &RED);
    }

    #[test]
    fn test_fill_default_drops_tiles() {
        let mut store = store();
        store.fill_rect(Rect::new(0, 0, 8, 8), &RED).unwrap();
        store.clear_rect(Rect::new(0, 0, 4, 8)).unwrap();
        assert_eq!(store.tile_count(), 2);
    }

    #[test]
    fn test_fill_rejects_wrong_pixel_size() {
        let mut store = store();
        let err = store.fill_rect(Rect::new(0, 0, 1, 1), &[1, 2]).unwrap_err();
        assert!(matches!(err, RasterError::PixelSize { expected: 4, actual: 2 }));
    }

    #[test]
    fn test_read_write_rect_across_tiles() {
        let mut store = store();
        let rect = Rect::new(-2, -2, 5, 3);
        let src: Vec<u8> = (0..rect.area() * 4).map(|i| i as u8).collect();
        store.write_rect(rect, &src, 5 * 4).unwrap();
        let mut dst = vec![0; src.len()];
        store.read_rect(rect, &mut dst, 5 * 4);
        assert_eq!(src, dst);
        assert_eq!(store.tile_count(), 4);
    }

    #[test]
    fn test_crop_resets_outside_pixels() {
        let mut store = store();
        store.fill_rect(Rect::new(0, 0, 12, 12), &RED).unwrap();
        store.crop(Rect::new(2, 2, 4, 4)).unwrap();
        assert_eq!(store.tile_count(), 4);
        assert_eq!(store.pixel(2, 2), &RED);
        assert_eq!(store.pixel(1, 1), &[0, 0, 0, 0]);
        assert_eq!(store.pixel(6, 6), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_crop_empty_clears() {
        let mut store = store();
        store.fill_rect(Rect::new(0, 0, 4, 4), &RED).unwrap();
        store.crop(Rect::default()).unwrap();
        assert_eq!(store.tile_count(), 0);
    }

    #[test]
    fn test_bit_blt_shares_full_tiles() {
        let mut src = store();
        src.fill_rect(Rect::new(0, 0, 8, 8), &RED).unwrap();
        let mut dst = store();
        dst.bit_blt(&src, Rect::new(0, 0, 6, 4)).unwrap();
        let shared = src.shared_tile(TileCoord::new(0, 0)).unwrap();
        assert!(Arc::ptr_eq(&shared, &dst.shared_tile(TileCoord::new(0, 0)).unwrap()));
        assert_eq!(dst.pixel(5, 0), &RED);
        assert_eq!(dst.pixel(6, 0), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_bit_blt_rough_takes_whole_tiles() {
        let mut src = store();
        src.fill_rect(Rect::new(0, 0, 8, 8), &RED).unwrap();
        let mut dst = store();
        dst.bit_blt_rough(&src, Rect::new(1, 1, 1, 1));
        assert_eq!(dst.pixel(3, 3), &RED);
        assert_eq!(dst.tile_count(), 1);
    }
}
