//! Device coordinate mapping: plain or wrap-around
//!
//! The strategy is a plain value derived from the device's bounds provider on
//! every call. Nothing here is shared or global.

use std::fmt;

use crate::constants::DEFAULT_BOUNDS_SIZE;
use crate::types::Rect;

/// Supplies the nominal image area of a device and whether it wraps
pub trait DefaultBounds: fmt::Debug + Send + Sync {
    fn bounds(&self) -> Rect;

    fn wrap_around_mode(&self) -> bool {
        false
    }

    /// Period of the toroid in wrap-around mode
    fn wrap_rect(&self) -> Rect {
        self.bounds()
    }
}

/// Bounds provider with a fixed rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBounds {
    pub rect: Rect,
    pub wrap_around: bool,
}

impl FixedBounds {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            wrap_around: false,
        }
    }

    /// Wrap-around mode with `rect` as the period
    pub fn wrapped(rect: Rect) -> Self {
        Self {
            rect,
            wrap_around: true,
        }
    }
}

impl Default for FixedBounds {
    fn default() -> Self {
        Self::new(Rect::new(0, 0, DEFAULT_BOUNDS_SIZE, DEFAULT_BOUNDS_SIZE))
    }
}

impl DefaultBounds for FixedBounds {
    fn bounds(&self) -> Rect {
        self.rect
    }

    fn wrap_around_mode(&self) -> bool {
        self.wrap_around
    }
}

/// One piece of a span after wrap-around decomposition.
///
/// `dst` is the piece in requested device coordinates, `src` the same pixels
/// reduced into the wrap rect. Both have equal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrappedSpan {
    pub dst: Rect,
    pub src: Rect,
}

/// How device coordinates reach the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Addressing {
    /// Identity; anything outside written tiles reads as default
    #[default]
    Bounded,
    /// Coordinates are reduced modulo `wrap_rect`
    WrapAround { wrap_rect: Rect },
}

impl Addressing {
    /// An empty wrap rect degrades to plain addressing
    pub fn from_bounds(bounds: &dyn DefaultBounds) -> Self {
        if bounds.wrap_around_mode() {
            let wrap_rect = bounds.wrap_rect();
            if !wrap_rect.is_empty() {
                return Addressing::WrapAround { wrap_rect };
            }
        }
        Addressing::Bounded
    }

    #[inline]
    pub fn is_wrapped(&self) -> bool {
        matches!(self, Addressing::WrapAround { .. })
    }

    #[inline]
    pub fn map_point(&self, x: i32, y: i32) -> (i32, i32) {
        match self {
            Addressing::Bounded => (x, y),
            Addressing::WrapAround { wrap_rect } => (
                wrap_rect.x + (x - wrap_rect.x).rem_euclid(wrap_rect.width),
                wrap_rect.y + (y - wrap_rect.y).rem_euclid(wrap_rect.height),
            ),
        }
    }

    /// Columns from `x` (inclusive) to the next wrap seam
    pub fn columns_to_seam(&self, x: i32) -> i32 {
        match self {
            Addressing::Bounded => i32::MAX,
            Addressing::WrapAround { wrap_rect } => {
                wrap_rect.width - (x - wrap_rect.x).rem_euclid(wrap_rect.width)
            }
        }
    }

    /// Rows from `y` (inclusive) to the next wrap seam
    pub fn rows_to_seam(&self, y: i32) -> i32 {
        match self {
            Addressing::Bounded => i32::MAX,
            Addressing::WrapAround { wrap_rect } => {
                wrap_rect.height - (y - wrap_rect.y).rem_euclid(wrap_rect.height)
            }
        }
    }

    /// Split `rect` into pieces that each lie within one period.
    ///
    /// Up to four pieces when the rect is no larger than the period; a larger
    /// rect tiles the period as many times as needed. Plain addressing
    /// returns the rect unchanged.
    pub fn split_rect(&self, rect: Rect) -> Vec<WrappedSpan> {
        if rect.is_empty() {
            return Vec::new();
        }
        let Addressing::WrapAround { wrap_rect } = self else {
            return vec![WrappedSpan {
                dst: rect,
                src: rect,
            }];
        };
        let columns = split_axis(rect.x, rect.width, wrap_rect.x, wrap_rect.width);
        let rows = split_axis(rect.y, rect.height, wrap_rect.y, wrap_rect.height);
        let mut spans = Vec::with_capacity(columns.len() * rows.len());
        for &(dst_y, src_y, height) in &rows {
            for &(dst_x, src_x, width) in &columns {
                spans.push(WrappedSpan {
                    dst: Rect::new(dst_x, dst_y, width, height),
                    src: Rect::new(src_x, src_y, width, height),
                });
            }
        }
        spans
    }
}

/// 1-D split into `(dst_start, src_start, len)` runs that never cross a seam
fn split_axis(start: i32, len: i32, origin: i32, period: i32) -> Vec<(i32, i32, i32)> {
    let mut runs = Vec::new();
    let end = start.saturating_add(len);
    let mut pos = start;
    while pos < end {
        let src = origin + (pos - origin).rem_euclid(period);
        let run = (end - pos).min(origin + period - src);
        runs.push((pos, src, run));
        pos += run;
    }
    runs
}
