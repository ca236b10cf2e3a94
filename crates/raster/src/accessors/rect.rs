use crate::device::PaintDevice;
use crate::error::RasterError;
use crate::types::Rect;

use super::{Cursor, Orientation, RandomAccessor, RandomConstAccessor};

/// Read-only single pass over a rect, row-major, without exposing row ends
pub struct RectConstIterator<'a> {
    accessor: RandomConstAccessor<'a>,
    cursor: Cursor,
    finished: bool,
}

impl<'a> RectConstIterator<'a> {
    pub fn new(device: &'a PaintDevice, rect: Rect) -> Self {
        let cursor = Cursor::new(rect, Orientation::Horizontal);
        let (x, y) = cursor.position();
        Self {
            accessor: RandomConstAccessor::new(device, x, y),
            cursor,
            finished: cursor.is_done(),
        }
    }

    /// Advance one pixel; false once the rect is exhausted
    pub fn next_pixel(&mut self) -> bool {
        self.next_pixels(1)
    }

    /// Advance `n` pixels within the current run
    pub fn next_pixels(&mut self, n: i32) -> bool {
        if self.cursor.step(n) {
            let (x, y) = self.cursor.position();
            self.accessor.move_to(x, y);
            true
        } else {
            self.finished = true;
            false
        }
    }

    pub fn n_conseq_pixels(&self) -> i32 {
        self.accessor
            .num_contiguous_columns(self.accessor.x())
            .min(self.cursor.remaining_in_line())
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

impl<'a> Iterator for RectConstIterator<'a> {
    type Item = (i32, i32, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = (self.x(), self.y(), self.raw_data_const());
        self.next_pixel();
        Some(item)
    }
}

/// Writable single pass over a rect
pub struct RectIterator<'a> {
    accessor: RandomAccessor<'a>,
    cursor: Cursor,
}

impl<'a> RectIterator<'a> {
    pub fn new(device: &'a mut PaintDevice, rect: Rect) -> Self {
        let cursor = Cursor::new(rect, Orientation::Horizontal);
        let (x, y) = cursor.position();
        Self {
            accessor: RandomAccessor::new(device, x, y),
            cursor,
        }
    }

    /// True while the iterator points at a pixel of the rect
    pub fn is_valid(&self) -> bool {
        !self.cursor.is_done()
    }

    pub fn next_pixel(&mut self) -> bool {
        self.next_pixels(1)
    }

    pub fn next_pixels(&mut self, n: i32) -> bool {
        let more = self.cursor.step(n);
        if more {
            let (x, y) = self.cursor.position();
            self.accessor.move_to(x, y);
        }
        more
    }

    pub fn n_conseq_pixels(&self) -> i32 {
        self.accessor
            .num_contiguous_columns(self.accessor.x())
            .min(self.cursor.remaining_in_line())
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
