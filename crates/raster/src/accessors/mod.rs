//! Pixel accessors: random cursors, line iterators and rect iterators, plus
//! edge-repeating line iterators and a sub-pixel sampler
//!
//! Const accessors borrow the device shared and may run on any number of
//! threads at once. Mutable accessors borrow it exclusively, resolve
//! copy-on-write before handing out bytes, and invalidate the device's
//! derived values when dropped after a write.

mod line;
mod random;
mod rect;
mod repeat;
mod sub;

pub use line::{LineConstIterator, LineIterator};
pub use random::{RandomAccessor, RandomConstAccessor};
pub use rect::{RectConstIterator, RectIterator};
pub use repeat::RepeatLineConstIterator;
pub use sub::RandomSubAccessor;

use crate::addressing::Addressing;
use crate::tiles::TileStore;
use crate::types::{Point, Rect, TileCoord};

/// Direction of a line iterator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Maps device pixels to tiles for one device state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    addressing: Addressing,
    offset: Point,
    tile_width: i32,
    tile_height: i32,
    pixel_size: usize,
}

impl Locator {
    pub fn new(addressing: Addressing, offset: Point, store: &TileStore) -> Self {
        Self {
            addressing,
            offset,
            tile_width: store.tile_width(),
            tile_height: store.tile_height(),
            pixel_size: store.pixel_size(),
        }
    }

    #[inline]
    pub fn addressing(&self) -> Addressing {
        self.addressing
    }

    #[inline]
    pub fn pixel_size(&self) -> usize {
        self.pixel_size
    }

    /// Store coordinates of a device pixel
    #[inline]
    pub fn store_point(&self, x: i32, y: i32) -> (i32, i32) {
        let (x, y) = self.addressing.map_point(x, y);
        (x.wrapping_sub(self.offset.x), y.wrapping_sub(self.offset.y))
    }

    /// Tile holding a device pixel and the pixel's byte offset in it
    #[inline]
    pub fn locate(&self, x: i32, y: i32) -> (TileCoord, usize) {
        let (sx, sy) = self.store_point(x, y);
        let coord = TileCoord::new(sx.div_euclid(self.tile_width), sy.div_euclid(self.tile_height));
        let local_x = sx.rem_euclid(self.tile_width) as usize;
        let local_y = sy.rem_euclid(self.tile_height) as usize;
        let offset = (local_y * self.tile_width as usize + local_x) * self.pixel_size;
        (coord, offset)
    }

    /// Pixels from column `x` to the next tile edge or wrap seam
    pub fn contiguous_columns(&self, x: i32) -> i32 {
        let (wx, _) = self.addressing.map_point(x, 0);
        let sx = wx.wrapping_sub(self.offset.x);
        let to_tile_edge = self.tile_width - sx.rem_euclid(self.tile_width);
        to_tile_edge.min(self.addressing.columns_to_seam(x))
    }

    /// Pixels from row `y` to the next tile edge or wrap seam
    pub fn contiguous_rows(&self, y: i32) -> i32 {
        let (_, wy) = self.addressing.map_point(0, y);
        let sy = wy.wrapping_sub(self.offset.y);
        let to_tile_edge = self.tile_height - sy.rem_euclid(self.tile_height);
        to_tile_edge.min(self.addressing.rows_to_seam(y))
    }

    /// Bytes between vertically adjacent pixels of one tile
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.tile_width as usize * self.pixel_size
    }
}

/// Position of an iterator inside its rect
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor {
    rect: Rect,
    orientation: Orientation,
    along: i32,
    across: i32,
}

impl Cursor {
    pub(crate) fn new(rect: Rect, orientation: Orientation) -> Self {
        Self {
            rect,
            orientation,
            along: 0,
            across: 0,
        }
    }

    #[inline]
    pub(crate) fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn line_len(&self) -> i32 {
        match self.orientation {
            Orientation::Horizontal => self.rect.width,
            Orientation::Vertical => self.rect.height,
        }
    }

    fn line_count(&self) -> i32 {
        match self.orientation {
            Orientation::Horizontal => self.rect.height,
            Orientation::Vertical => self.rect.width,
        }
    }

    #[inline]
    pub(crate) fn is_done(&self) -> bool {
        self.rect.is_empty() || self.across >= self.line_count()
    }

    #[inline]
    pub(crate) fn position(&self) -> (i32, i32) {
        match self.orientation {
            Orientation::Horizontal => (self.rect.x + self.along, self.rect.y + self.across),
            Orientation::Vertical => (self.rect.x + self.across, self.rect.y + self.along),
        }
    }

    #[inline]
    pub(crate) fn remaining_in_line(&self) -> i32 {
        self.line_len() - self.along
    }

    /// Move within the current line. Stops on the last pixel and returns
    /// false when the line has no pixel `n` steps ahead.
    pub(crate) fn advance_in_line(&mut self, n: i32) -> bool {
        let len = self.line_len();
        if len <= 0 {
            return false;
        }
        let target = self.along.saturating_add(n);
        if target < len {
            self.along = target;
            true
        } else {
            self.along = len - 1;
            false
        }
    }

    /// Start of the next line
    pub(crate) fn next_line(&mut self) -> bool {
        self.across += 1;
        self.along = 0;
        !self.is_done()
    }

    /// Row-major step across line ends
    pub(crate) fn step(&mut self, n: i32) -> bool {
        self.along = self.along.saturating_add(n);
        if self.along >= self.line_len() {
            self.along = 0;
            self.across += 1;
        }
        !self.is_done()
    }
}
