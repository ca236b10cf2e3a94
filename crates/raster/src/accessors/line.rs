use crate::device::PaintDevice;
use crate::error::RasterError;
use crate::types::Rect;

use super::{Cursor, Orientation, RandomAccessor, RandomConstAccessor};

/// Read-only iterator over the lines of a rect, one line at a time.
///
/// [`next_pixel`](Self::next_pixel) walks the current line and
/// [`next_line`](Self::next_line) moves to the next one. As an [`Iterator`]
/// it yields `(x, y, bytes)` for every pixel, line after line.
pub struct LineConstIterator<'a> {
    accessor: RandomConstAccessor<'a>,
    cursor: Cursor,
    finished: bool,
}

impl<'a> LineConstIterator<'a> {
    pub fn new(device: &'a PaintDevice, rect: Rect, orientation: Orientation) -> Self {
        let cursor = Cursor::new(rect, orientation);
        let (x, y) = cursor.position();
        Self {
            accessor: RandomConstAccessor::new(device, x, y),
            cursor,
            finished: cursor.is_done(),
        }
    }

    fn sync(&mut self) {
        let (x, y) = self.cursor.position();
        self.accessor.move_to(x, y);
    }

    /// Step within the line; false on its last pixel
    pub fn next_pixel(&mut self) -> bool {
        self.next_pixels(1)
    }

    pub fn next_pixels(&mut self, n: i32) -> bool {
        let moved = self.cursor.advance_in_line(n);
        self.sync();
        moved
    }

    /// Jump to the first pixel of the next line; false past the last line
    pub fn next_line(&mut self) -> bool {
        let more = self.cursor.next_line();
        self.sync();
        more
    }

    /// Pixels left in the line before a tile edge or wrap seam
    pub fn n_conseq_pixels(&self) -> i32 {
        let to_edge = match self.cursor.orientation() {
            Orientation::Horizontal => self.accessor.num_contiguous_columns(self.accessor.x()),
            Orientation::Vertical => self.accessor.num_contiguous_rows(self.accessor.y()),
        };
        to_edge.min(self.cursor.remaining_in_line())
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.accessor.x()
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.accessor.y()
    }

    #[inline]
    pub fn raw_data_const(&self) -> &'a [u8] {
        self.accessor.raw_data_const()
    }

    #[inline]
    pub fn old_raw_data(&self) -> &'a [u8] {
        self.accessor.old_raw_data()
    }
}

impl<'a> Iterator for LineConstIterator<'a> {
    type Item = (i32, i32, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = (self.x(), self.y(), self.raw_data_const());
        if self.cursor.step(1) {
            self.sync();
        } else {
            self.finished = true;
        }
        Some(item)
    }
}

/// Writable line iterator; same walk as [`LineConstIterator`]
pub struct LineIterator<'a> {
    accessor: RandomAccessor<'a>,
    cursor: Cursor,
}

impl<'a> LineIterator<'a> {
    pub fn new(device: &'a mut PaintDevice, rect: Rect, orientation: Orientation) -> Self {
        let cursor = Cursor::new(rect, orientation);
        let (x, y) = cursor.position();
        Self {
            accessor: RandomAccessor::new(device, x, y),
            cursor,
        }
    }

    fn sync(&mut self) {
        let (x, y) = self.cursor.position();
        self.accessor.move_to(x, y);
    }

    pub fn next_pixel(&mut self) -> bool {
        self.next_pixels(1)
    }

    pub fn next_pixels(&mut self, n: i32) -> bool {
        let moved = self.cursor.advance_in_line(n);
        self.sync();
        moved
    }

    pub fn next_line(&mut self) -> bool {
        let more = self.cursor.next_line();
        self.sync();
        more
    }

    pub fn n_conseq_pixels(&self) -> i32 {
        let to_edge = match self.cursor.orientation() {
            Orientation::Horizontal => self.accessor.num_contiguous_columns(self.accessor.x()),
            Orientation::Vertical => self.accessor.num_contiguous_rows(self.accessor.y()),
        };
        to_edge.min(self.cursor.remaining_in_line())
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.accessor.x()
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.accessor.y()
    }

    pub fn raw_data(&mut self) -> Result<&mut [u8], RasterError> {
        self.accessor.raw_data()
    }

    pub fn raw_data_const(&self) -> &[u8] {
        self.accessor.raw_data_const()
    }

    pub fn old_raw_data(&self) -> &[u8] {
        self.accessor.old_raw_data()
    }
}
