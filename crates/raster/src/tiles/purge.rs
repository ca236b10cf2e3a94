//! Default pixel management, purging and occupancy queries

use std::sync::Arc;

use tracing::debug;

use super::{Tile, TileStore};
use crate::error::RasterError;
use crate::types::{Rect, TileCoord};

impl TileStore {
    /// Replace the default pixel.
    ///
    /// Only unwritten coordinates change value; materialized tiles keep
    /// their bytes even if they equalled the previous default.
    pub fn set_default_pixel(&mut self, pixel: &[u8]) -> Result<(), RasterError> {
        if pixel.len() != self.pixel_size {
            return Err(RasterError::PixelSize {
                expected: self.pixel_size,
                actual: pixel.len(),
            });
        }
        let tile = Tile::filled(pixel, self.tile_pixel_count())?;
        self.default_tile = Arc::new(tile);
        self.default_pixel = pixel.to_vec();
        Ok(())
    }

    /// Evict tiles overlapping `rect` whose bytes equal the default tile.
    ///
    /// Returns the number of tiles evicted.
    pub fn purge(&mut self, rect: Rect) -> usize {
        let default_tile = Arc::clone(&self.default_tile);
        let (width, height) = (self.tile_width, self.tile_height);
        let before = self.tiles.len();
        self.tiles.retain(|coord, tile| {
            let tile_rect = Rect::new(
                coord.col.saturating_mul(width),
                coord.row.saturating_mul(height),
                width,
                height,
            );
            !(tile_rect.intersects(&rect) && tile.data() == default_tile.data())
        });
        let purged = before - self.tiles.len();
        debug!(
            "purge: ({}, {}) {}x{} -> evicted {} tiles",
            rect.x, rect.y, rect.width, rect.height, purged
        );
        purged
    }

    /// Store-space rectangles of every materialized tile, row-major
    pub fn region(&self) -> Vec<Rect> {
        self.materialized_coords()
            .into_iter()
            .map(|coord| self.tile_rect(coord))
            .collect()
    }

    /// Bounding rectangle of every materialized tile
    pub fn extent(&self) -> Rect {
        let mut iter = self.tiles.keys();
        let Some(first) = iter.next() else {
            return Rect::default();
        };
        let (min, max) = iter.fold((*first, *first), |(min, max), coord| {
            (
                TileCoord::new(min.col.min(coord.col), min.row.min(coord.row)),
                TileCoord::new(max.col.max(coord.col), max.row.max(coord.row)),
            )
        });
        let top_left = self.tile_rect(min);
        let bottom_right = self.tile_rect(max);
        top_left.united(&bottom_right)
    }
}

#[cfg(test)]
mod tests {
    use raster_config::TileConfig;

    use super::*;

    fn store() -> TileStore {
        TileStore::new(TileConfig::square(4), &[0, 0, 0, 0])
    }

    #[test]
    fn test_purge_evicts_default_tiles() {
        let mut store = store();
        store.reserve_rect(Rect::new(0, 0, 8, 4)).unwrap();
        store.fill_rect(Rect::new(5, 1, 1, 1), &[9, 9, 9, 9]).unwrap();
        assert_eq!(store.tile_count(), 2);
        assert_eq!(store.purge(Rect::new(0, 0, 100, 100)), 1);
        assert!(store.is_materialized(TileCoord::new(1, 0)));
    }

    #[test]
    fn test_purge_outside_rect_keeps_tiles() {
        let mut store = store();
        store.reserve_rect(Rect::new(0, 0, 4, 4)).unwrap();
        assert_eq!(store.purge(Rect::new(10, 10, 4, 4)), 0);
        assert_eq!(store.tile_count(), 1);
    }

    #[test]
    fn test_set_default_keeps_materialized() {
        let mut store = store();
        store.reserve_rect(Rect::new(0, 0, 1, 1)).unwrap();
        store.set_default_pixel(&[1, 1, 1, 1]).unwrap();
        assert_eq!(store.pixel(0, 0), &[0, 0, 0, 0]);
        assert_eq!(store.pixel(40, 40), &[1, 1, 1, 1]);
        assert_eq!(store.tile_count(), 1);
    }

    #[test]
    fn test_extent_and_region() {
        let mut store = store();
        assert!(store.extent().is_empty());
        store.fill_rect(Rect::new(-1, -1, 1, 1), &[1, 0, 0, 0]).unwrap();
        store.fill_rect(Rect::new(9, 5, 1, 1), &[1, 0, 0, 0]).unwrap();
        assert_eq!(store.extent(), Rect::new(-4, -4, 16, 12));
        assert_eq!(
            store.region(),
            vec![Rect::new(-4, -4, 4, 4), Rect::new(8, 4, 4, 4)]
        );
    }
}
