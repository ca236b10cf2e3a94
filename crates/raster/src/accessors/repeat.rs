use crate::device::PaintDevice;
use crate::types::Rect;

use super::{Cursor, Orientation, RandomConstAccessor};

/// Read-only line iterator that never leaves a data rect.
///
/// The walk covers the requested rect as usual, but every read is taken at
/// the nearest pixel of `data_rect`, so positions past its edges repeat the
/// edge pixels. Filters use it to extend an image beyond its content.
pub struct RepeatLineConstIterator<'a> {
    accessor: RandomConstAccessor<'a>,
    cursor: Cursor,
    data_rect: Rect,
}

impl<'a> RepeatLineConstIterator<'a> {
    /// An empty `data_rect` disables clamping.
    pub fn new(
        device: &'a PaintDevice,
        rect: Rect,
        orientation: Orientation,
        data_rect: Rect,
    ) -> Self {
        let cursor = Cursor::new(rect, orientation);
        let (x, y) = clamp_to(data_rect, cursor.position());
        Self {
            accessor: RandomConstAccessor::new(device, x, y),
            cursor,
            data_rect,
        }
    }

    fn sync(&mut self) {
        let (x, y) = clamp_to(self.data_rect, self.cursor.position());
        self.accessor.move_to(x, y);
    }

    pub fn next_pixel(&mut self) -> bool {
        let moved = self.cursor.advance_in_line(1);
        self.sync();
        moved
    }

    pub fn next_line(&mut self) -> bool {
        let more = self.cursor.next_line();
        self.sync();
        more
    }

    /// Position in the walked rect, before clamping
    pub fn x(&self) -> i32 {
        self.cursor.position().0
    }

    pub fn y(&self) -> i32 {
        self.cursor.position().1
    }

    pub fn raw_data_const(&self) -> &'a [u8] {
        self.accessor.raw_data_const()
    }

    pub fn old_raw_data(&self) -> &'a [u8] {
        self.accessor.old_raw_data()
    }
}

fn clamp_to(data_rect: Rect, (x, y): (i32, i32)) -> (i32, i32) {
    if data_rect.is_empty() {
        return (x, y);
    }
    (
        x.clamp(data_rect.x, data_rect.x_end() - 1),
        y.clamp(data_rect.y, data_rect.y_end() - 1),
    )
}
