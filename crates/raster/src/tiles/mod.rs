//! Sparse copy-on-write tile storage
//!
//! Tiles live behind `Arc`. A tile referenced by more than one store (or by
//! a transaction snapshot) is never written in place: [`TileStore::tile_for_write`]
//! copies it first. Coordinates that were never written resolve to a single
//! shared default tile.

mod data_access;
mod dump;
mod purge;

pub use dump::DumpError;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use raster_config::TileConfig;
use tracing::warn;

use crate::error::{RasterError, alloc_copy, alloc_pattern};
use crate::types::{Rect, TileCoord};

/// One fixed-size block of packed pixels
#[derive(Clone, PartialEq, Eq)]
pub struct Tile {
    data: Box<[u8]>,
}

impl Tile {
    /// Tile filled with repetitions of `pixel`
    pub(crate) fn filled(pixel: &[u8], pixel_count: usize) -> Result<Self, RasterError> {
        Ok(Self {
            data: alloc_pattern(pixel, pixel_count)?.into_boxed_slice(),
        })
    }

    pub(crate) fn from_vec(data: Vec<u8>) -> Self {
        Self {
            data: data.into_boxed_slice(),
        }
    }

    /// Private copy, reporting allocation failure
    pub(crate) fn try_clone(&self) -> Result<Self, RasterError> {
        Ok(Self::from_vec(alloc_copy(&self.data)?))
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile").field("bytes", &self.data.len()).finish()
    }
}

#[inline]
fn is_exclusive(tile: &Arc<Tile>) -> bool {
    Arc::strong_count(tile) == 1 && Arc::weak_count(tile) == 0
}

/// Sparse grid of equally sized tiles
///
/// `Clone` is shallow: every tile becomes shared and either side copies a
/// tile the first time it writes to it.
#[derive(Clone)]
pub struct TileStore {
    tile_width: i32,
    tile_height: i32,
    pixel_size: usize,
    default_pixel: Vec<u8>,
    default_tile: Arc<Tile>,
    tiles: HashMap<TileCoord, Arc<Tile>>,
}

impl TileStore {
    /// Create an empty store. The pixel size is the length of `default_pixel`.
    ///
    /// Meant for configured geometry; a default tile that cannot be
    /// allocated falls back to 1x1 tiles. Use [`try_new`](Self::try_new)
    /// for geometry that comes from outside.
    pub fn new(config: TileConfig, default_pixel: &[u8]) -> Self {
        Self::try_new(config, default_pixel).unwrap_or_else(|err| {
            warn!("TileStore::new: {}, using 1x1 tiles", err);
            Self {
                tile_width: 1,
                tile_height: 1,
                pixel_size: default_pixel.len(),
                default_pixel: default_pixel.to_vec(),
                default_tile: Arc::new(Tile::from_vec(default_pixel.to_vec())),
                tiles: HashMap::new(),
            }
        })
    }

    /// Create an empty store, reporting failure to allocate the default tile
    pub fn try_new(config: TileConfig, default_pixel: &[u8]) -> Result<Self, RasterError> {
        let tile_width = config.width.clamp(1, i32::MAX as u32) as i32;
        let tile_height = config.height.clamp(1, i32::MAX as u32) as i32;
        let pixel_count = (tile_width as usize)
            .checked_mul(tile_height as usize)
            .ok_or(RasterError::OutOfMemory { bytes: usize::MAX })?;
        Ok(Self {
            tile_width,
            tile_height,
            pixel_size: default_pixel.len(),
            default_pixel: default_pixel.to_vec(),
            default_tile: Arc::new(Tile::filled(default_pixel, pixel_count)?),
            tiles: HashMap::new(),
        })
    }

    #[inline]
    pub fn tile_width(&self) -> i32 {
        self.tile_width
    }

    #[inline]
    pub fn tile_height(&self) -> i32 {
        self.tile_height
    }

    #[inline]
    pub fn pixel_size(&self) -> usize {
        self.pixel_size
    }

    #[inline]
    pub fn default_pixel(&self) -> &[u8] {
        &self.default_pixel
    }

    pub fn tile_config(&self) -> TileConfig {
        TileConfig {
            width: self.tile_width as u32,
            height: self.tile_height as u32,
        }
    }

    /// Pixels in one tile
    #[inline]
    pub fn tile_pixel_count(&self) -> usize {
        self.tile_width as usize * self.tile_height as usize
    }

    /// Bytes in one tile
    #[inline]
    pub fn tile_bytes(&self) -> usize {
        self.tile_pixel_count() * self.pixel_size
    }

    /// Bytes in one tile row
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.tile_width as usize * self.pixel_size
    }

    /// Same tile geometry and pixel size
    pub fn same_layout(&self, other: &TileStore) -> bool {
        self.tile_width == other.tile_width
            && self.tile_height == other.tile_height
            && self.pixel_size == other.pixel_size
    }

    #[inline]
    pub fn tile_coord_of(&self, x: i32, y: i32) -> TileCoord {
        TileCoord::new(x.div_euclid(self.tile_width), y.div_euclid(self.tile_height))
    }

    /// Store-space rectangle covered by a tile
    pub fn tile_rect(&self, coord: TileCoord) -> Rect {
        Rect::new(
            coord.col.saturating_mul(self.tile_width),
            coord.row.saturating_mul(self.tile_height),
            self.tile_width,
            self.tile_height,
        )
    }

    /// Byte offset of store pixel `(x, y)` inside its tile
    #[inline]
    pub fn offset_in_tile(&self, x: i32, y: i32) -> usize {
        let local_x = x.rem_euclid(self.tile_width) as usize;
        let local_y = y.rem_euclid(self.tile_height) as usize;
        (local_y * self.tile_width as usize + local_x) * self.pixel_size
    }

    /// Tile coordinates overlapping a store-space rect, row-major
    pub fn tiles_in_rect(&self, rect: Rect) -> impl Iterator<Item = TileCoord> + use<> {
        let (first, last) = if rect.is_empty() {
            (TileCoord::new(0, 0), TileCoord::new(-1, -1))
        } else {
            (
                self.tile_coord_of(rect.x, rect.y),
                self.tile_coord_of(rect.x_end() - 1, rect.y_end() - 1),
            )
        };
        (first.row..=last.row)
            .flat_map(move |row| (first.col..=last.col).map(move |col| TileCoord::new(col, row)))
    }

    /// Shared view of a tile; the default tile if never written
    #[inline]
    pub fn tile_for_read(&self, coord: TileCoord) -> &Tile {
        self.tiles.get(&coord).unwrap_or(&self.default_tile)
    }

    /// Reference-counted handle to the tile at `coord`, if materialized
    pub fn shared_tile(&self, coord: TileCoord) -> Option<Arc<Tile>> {
        self.tiles.get(&coord).cloned()
    }

    #[inline]
    pub fn is_materialized(&self, coord: TileCoord) -> bool {
        self.tiles.contains_key(&coord)
    }

    pub fn default_tile(&self) -> &Tile {
        &self.default_tile
    }

    /// Exclusively owned tile at `coord`.
    ///
    /// Shared tiles are copied and unwritten coordinates get a private copy
    /// of the default tile. On allocation failure the store is unchanged.
    pub fn tile_for_write(&mut self, coord: TileCoord) -> Result<&mut Tile, RasterError> {
        if !self.tiles.get(&coord).is_some_and(is_exclusive) {
            let source = self.tiles.get(&coord).unwrap_or(&self.default_tile);
            let copy = source.try_clone().inspect_err(|err| {
                warn!("tile_for_write: ({}, {}) {}", coord.col, coord.row, err);
            })?;
            self.tiles.insert(coord, Arc::new(copy));
        }
        let default_tile = &self.default_tile;
        let slot = self
            .tiles
            .entry(coord)
            .or_insert_with(|| Arc::clone(default_tile));
        Ok(Arc::make_mut(slot))
    }

    /// Take the tile at `coord` out of the store for exclusive writing.
    ///
    /// Until it is handed back with [`attach_tile`](Self::attach_tile) the
    /// coordinate reads as default.
    pub(crate) fn detach_tile(&mut self, coord: TileCoord) -> Result<Tile, RasterError> {
        self.tile_for_write(coord)?;
        match self.tiles.remove(&coord) {
            Some(tile) => Ok(Arc::unwrap_or_clone(tile)),
            None => Tile::filled(&self.default_pixel, self.tile_pixel_count()),
        }
    }

    pub(crate) fn attach_tile(&mut self, coord: TileCoord, tile: Tile) {
        self.tiles.insert(coord, Arc::new(tile));
    }

    /// Make every tile overlapping `rect` exclusively owned
    pub fn reserve_rect(&mut self, rect: Rect) -> Result<(), RasterError> {
        self.reserve_tiles(self.tiles_in_rect(rect))
    }

    /// Make every listed tile exclusively owned.
    ///
    /// Either all tiles become writable or, on allocation failure, coordinates
    /// materialized by this call are dropped again and the error returned.
    pub fn reserve_tiles(
        &mut self,
        coords: impl IntoIterator<Item = TileCoord>,
    ) -> Result<(), RasterError> {
        let mut created = Vec::new();
        for coord in coords {
            let existed = self.tiles.contains_key(&coord);
            if let Err(err) = self.tile_for_write(coord) {
                for coord in created {
                    self.tiles.remove(&coord);
                }
                return Err(err);
            }
            if !existed {
                created.push(coord);
            }
        }
        Ok(())
    }

    /// Put a tile at `coord`, or drop it back to default when `None`
    pub(crate) fn set_tile(&mut self, coord: TileCoord, tile: Option<Arc<Tile>>) {
        match (tile, self.tiles.entry(coord)) {
            (Some(tile), Entry::Occupied(mut slot)) => {
                slot.insert(tile);
            }
            (Some(tile), Entry::Vacant(slot)) => {
                slot.insert(tile);
            }
            (None, Entry::Occupied(slot)) => {
                slot.remove();
            }
            (None, Entry::Vacant(_)) => {}
        }
    }

    /// Copy every tile so nothing is shared with `self`
    pub fn deep_clone(&self) -> Result<TileStore, RasterError> {
        let mut tiles = HashMap::with_capacity(self.tiles.len());
        for (coord, tile) in &self.tiles {
            tiles.insert(*coord, Arc::new(tile.try_clone()?));
        }
        Ok(TileStore {
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            pixel_size: self.pixel_size,
            default_pixel: self.default_pixel.clone(),
            default_tile: Arc::clone(&self.default_tile),
            tiles,
        })
    }

    /// Drop every tile back to default
    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Bytes held by materialized tiles
    pub fn memory_bytes(&self) -> usize {
        self.tiles.len() * self.tile_bytes()
    }

    /// Materialized coordinates, sorted row-major
    pub fn materialized_coords(&self) -> Vec<TileCoord> {
        let mut coords: Vec<TileCoord> = self.tiles.keys().copied().collect();
        coords.sort_by_key(|coord| (coord.row, coord.col));
        coords
    }
}

impl fmt::Debug for TileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileStore")
            .field("tile_width", &self.tile_width)
            .field("tile_height", &self.tile_height)
            .field("pixel_size", &self.pixel_size)
            .field("tile_count", &self.tiles.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TileStore {
        TileStore::new(TileConfig::square(4), &[0, 0, 0, 0])
    }

    #[test]
    fn test_try_new_reports_huge_tiles() {
        let config = TileConfig {
            width: u32::MAX,
            height: u32::MAX,
        };
        let err = TileStore::try_new(config, &[0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, RasterError::OutOfMemory { .. }));
    }

    #[test]
    fn test_read_never_allocates() {
        let store = store();
        let tile = store.tile_for_read(TileCoord::new(-3, 7));
        assert_eq!(tile.data(), store.default_tile().data());
        assert_eq!(store.tile_count(), 0);
    }

    #[test]
    fn test_tile_coord_negative() {
        let store = store();
        assert_eq!(store.tile_coord_of(-1, -4), TileCoord::new(-1, -1));
        assert_eq!(store.tile_coord_of(-5, 3), TileCoord::new(-2, 0));
        assert_eq!(store.offset_in_tile(-1, 0), 3 * 4);
    }

    #[test]
    fn test_tile_for_write_idempotent() {
        let mut store = store();
        let coord = TileCoord::new(1, 1);
        store.tile_for_write(coord).unwrap().data_mut()[0] = 9;
        let again = store.tile_for_write(coord).unwrap();
        assert_eq!(again.data()[0], 9);
        assert_eq!(store.tile_count(), 1);
    }

    #[test]
    fn test_shallow_clone_copy_on_write() {
        let mut a = store();
        let coord = TileCoord::new(0, 0);
        a.tile_for_write(coord).unwrap().data_mut()[0] = 1;
        let mut b = a.clone();
        b.tile_for_write(coord).unwrap().data_mut()[0] = 2;
        assert_eq!(a.tile_for_read(coord).data()[0], 1);
        assert_eq!(b.tile_for_read(coord).data()[0], 2);
    }

    #[test]
    fn test_default_tile_never_written() {
        let mut store = store();
        store.tile_for_write(TileCoord::new(0, 0)).unwrap().data_mut()[0] = 5;
        assert!(store.default_tile().data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_tiles_in_rect() {
        let store = store();
        let coords: Vec<_> = store.tiles_in_rect(Rect::new(-1, 0, 6, 4)).collect();
        assert_eq!(
            coords,
            vec![TileCoord::new(-1, 0), TileCoord::new(0, 0), TileCoord::new(1, 0)]
        );
        assert_eq!(store.tiles_in_rect(Rect::default()).count(), 0);
    }

    #[test]
    fn test_deep_clone_unshared() {
        let mut store = store();
        let coord = TileCoord::new(2, 0);
        store.tile_for_write(coord).unwrap();
        let copy = store.deep_clone().unwrap();
        assert_eq!(copy.tile_count(), 1);
        let shared = store.shared_tile(coord).unwrap();
        assert_eq!(Arc::strong_count(&shared), 2);
    }
}
