use crate::device::PaintDevice;
use crate::error::RasterError;
use crate::tiles::{Tile, TileStore};
use crate::types::{Rect, TileCoord};

use super::Locator;

/// Read-only random access cursor.
///
/// Keeps the current tile cached, so moving within a tile is a pure offset
/// computation.
pub struct RandomConstAccessor<'a> {
    store: &'a TileStore,
    old: &'a TileStore,
    locator: Locator,
    x: i32,
    y: i32,
    coord: TileCoord,
    offset: usize,
    tile: &'a Tile,
}

impl<'a> RandomConstAccessor<'a> {
    pub fn new(device: &'a PaintDevice, x: i32, y: i32) -> Self {
        Self::from_parts(device.store(), device.old_store(), device.locator(), x, y)
    }

    pub(crate) fn from_parts(
        store: &'a TileStore,
        old: &'a TileStore,
        locator: Locator,
        x: i32,
        y: i32,
    ) -> Self {
        let (coord, offset) = locator.locate(x, y);
        Self {
            store,
            old,
            locator,
            x,
            y,
            coord,
            offset,
            tile: store.tile_for_read(coord),
        }
    }

    pub fn move_to(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
        let (coord, offset) = self.locator.locate(x, y);
        if coord != self.coord {
            self.coord = coord;
            self.tile = self.store.tile_for_read(coord);
        }
        self.offset = offset;
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn raw_data_const(&self) -> &'a [u8] {
        let tile: &'a Tile = self.tile;
        &tile.data()[self.offset..self.offset + self.locator.pixel_size()]
    }

    /// Pixel as it was when the current transaction began
    pub fn old_raw_data(&self) -> &'a [u8] {
        let old: &'a TileStore = self.old;
        &old.tile_for_read(self.coord).data()[self.offset..self.offset + self.locator.pixel_size()]
    }

    /// Bytes of every pixel from here to the next tile edge or wrap seam in the row
    pub fn raw_run_const(&self) -> &'a [u8] {
        let columns = self.num_contiguous_columns(self.x) as usize;
        let tile: &'a Tile = self.tile;
        &tile.data()[self.offset..self.offset + columns * self.locator.pixel_size()]
    }

    pub fn num_contiguous_columns(&self, x: i32) -> i32 {
        self.locator.contiguous_columns(x)
    }

    pub fn num_contiguous_rows(&self, y: i32) -> i32 {
        self.locator.contiguous_rows(y)
    }

    /// Bytes between vertically adjacent pixels inside one tile
    pub fn row_stride(&self) -> usize {
        self.locator.row_stride()
    }
}

/// Writable random access cursor.
///
/// The tile last written through is held by the accessor itself, so further
/// writes into it skip the store lookup and the copy-on-write check. It goes
/// back into the store when a write lands in another tile or on drop.
///
/// Dropping it after any write invalidates the device's derived values and
/// reports the touched area to the parent.
pub struct RandomAccessor<'a> {
    device: &'a mut PaintDevice,
    locator: Locator,
    x: i32,
    y: i32,
    current: Option<(TileCoord, Tile)>,
    touched: Rect,
}

impl<'a> RandomAccessor<'a> {
    pub fn new(device: &'a mut PaintDevice, x: i32, y: i32) -> Self {
        let locator = device.locator();
        Self {
            device,
            locator,
            x,
            y,
            current: None,
            touched: Rect::default(),
        }
    }

    #[inline]
    pub fn move_to(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    fn release_current(&mut self) {
        if let Some((coord, tile)) = self.current.take() {
            self.device.store_mut().attach_tile(coord, tile);
        }
    }

    fn writable(&mut self, columns: i32) -> Result<&mut [u8], RasterError> {
        let (coord, offset) = self.locator.locate(self.x, self.y);
        let len = columns as usize * self.locator.pixel_size();
        let tile = match self.current.take() {
            Some((held, tile)) if held == coord => tile,
            other => {
                if let Some((held, tile)) = other {
                    self.device.store_mut().attach_tile(held, tile);
                }
                self.device.store_mut().detach_tile(coord)?
            }
        };
        self.touched = self
            .touched
            .united(&Rect::new(self.x, self.y, columns, 1));
        let (_, tile) = self.current.insert((coord, tile));
        Ok(&mut tile.data_mut()[offset..offset + len])
    }

    /// Writable bytes of the current pixel; copy-on-write is already resolved
    pub fn raw_data(&mut self) -> Result<&mut [u8], RasterError> {
        self.writable(1)
    }

    /// Writable bytes from here to the next tile edge or wrap seam in the row
    pub fn raw_run(&mut self) -> Result<&mut [u8], RasterError> {
        let columns = self.num_contiguous_columns(self.x);
        self.writable(columns)
    }

    pub fn raw_data_const(&self) -> &[u8] {
        let (coord, offset) = self.locator.locate(self.x, self.y);
        let data = match &self.current {
            Some((held, tile)) if *held == coord => tile.data(),
            _ => self.device.store().tile_for_read(coord).data(),
        };
        &data[offset..offset + self.locator.pixel_size()]
    }

    pub fn old_raw_data(&self) -> &[u8] {
        if !self.device.has_transaction() {
            return self.raw_data_const();
        }
        let (coord, offset) = self.locator.locate(self.x, self.y);
        let data = self.device.old_store().tile_for_read(coord).data();
        &data[offset..offset + self.locator.pixel_size()]
    }

    pub fn num_contiguous_columns(&self, x: i32) -> i32 {
        self.locator.contiguous_columns(x)
    }

    pub fn num_contiguous_rows(&self, y: i32) -> i32 {
        self.locator.contiguous_rows(y)
    }

    pub fn row_stride(&self) -> usize {
        self.locator.row_stride()
    }
}

impl Drop for RandomAccessor<'_> {
    fn drop(&mut self) {
        self.release_current();
        if !self.touched.is_empty() {
            self.device.invalidate_after_write(self.touched);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{Color, rgba8};

    #[test]
    fn test_const_reads_default() {
        let device = PaintDevice::new(rgba8());
        let accessor = RandomConstAccessor::new(&device, -100, 5000);
        assert_eq!(accessor.raw_data_const(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_write_then_read() {
        let mut device = PaintDevice::new(rgba8());
        {
            let mut accessor = RandomAccessor::new(&mut device, 0, 0);
            for (x, y) in [(1, 1), (70, 3), (-5, -5)] {
                accessor.move_to(x, y);
                accessor.raw_data().unwrap().copy_from_slice(&[9, 8, 7, 6]);
            }
        }
        let mut accessor = RandomConstAccessor::new(&device, 1, 1);
        assert_eq!(accessor.raw_data_const(), &[9, 8, 7, 6]);
        accessor.move_to(70, 3);
        assert_eq!(accessor.raw_data_const(), &[9, 8, 7, 6]);
        accessor.move_to(71, 3);
        assert_eq!(accessor.raw_data_const(), &[0, 0, 0, 0]);
        assert_eq!(device.exact_bounds(), Rect::from_edges(-5, -5, 71, 4));
    }

    #[test]
    fn test_drop_invalidates_bounds() {
        let mut device = PaintDevice::new(rgba8());
        device
            .fill(Rect::new(0, 0, 2, 2), &Color::white(rgba8()))
            .unwrap();
        assert_eq!(device.exact_bounds(), Rect::new(0, 0, 2, 2));
        {
            let mut accessor = RandomAccessor::new(&mut device, 10, 10);
            accessor.raw_data().unwrap().copy_from_slice(&[1, 1, 1, 255]);
        }
        assert_eq!(device.exact_bounds(), Rect::new(0, 0, 11, 11));
    }

    #[test]
    fn test_raw_run_stops_at_tile_edge() {
        let mut device = PaintDevice::new(rgba8());
        let mut accessor = RandomAccessor::new(&mut device, 60, 0);
        assert_eq!(accessor.raw_run().unwrap().len(), 4 * 4);
    }

    #[test]
    fn test_old_raw_data_sees_transaction_start() {
        let mut device = PaintDevice::new(rgba8());
        device.set_pixel(3, 3, &Color::white(rgba8())).unwrap();
        device.begin_transaction();
        {
            let mut accessor = RandomAccessor::new(&mut device, 3, 3);
            accessor.raw_data().unwrap().copy_from_slice(&[1, 2, 3, 4]);
            assert_eq!(accessor.old_raw_data(), &[255, 255, 255, 255]);
            assert_eq!(accessor.raw_data_const(), &[1, 2, 3, 4]);
        }
        let accessor = RandomConstAccessor::new(&device, 3, 3);
        assert_eq!(accessor.old_raw_data(), &[255, 255, 255, 255]);
    }

    #[test]
    fn test_held_tile_returns_to_store() {
        let mut device = PaintDevice::new(rgba8());
        {
            let mut accessor = RandomAccessor::new(&mut device, 0, 0);
            for x in [0, 64, 1, 65, 2] {
                accessor.move_to(x, 0);
                accessor.raw_data().unwrap()[3] = 255;
                assert_eq!(accessor.raw_data_const()[3], 255);
            }
            accessor.move_to(64, 0);
            assert_eq!(accessor.raw_data_const()[3], 255);
            accessor.move_to(1, 0);
            assert_eq!(accessor.old_raw_data()[3], 255);
        }
        assert_eq!(device.store().tile_count(), 2);
        assert_eq!(device.exact_bounds(), Rect::new(0, 0, 66, 1));
    }
}
