use serde::{Deserialize, Serialize};

/// Integer point in device pixel space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Integer rectangle. Non-positive width or height means empty.
///
/// `x_end()`/`y_end()` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from exclusive edges
    pub fn from_edges(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[inline]
    pub fn x_end(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    #[inline]
    pub fn y_end(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Number of pixels covered, zero when empty
    pub fn area(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.width as usize * self.height as usize
        }
    }

    pub fn intersected(&self, other: &Rect) -> Rect {
        if self.is_empty() || other.is_empty() {
            return Rect::default();
        }
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.x_end().min(other.x_end());
        let y1 = self.y_end().min(other.y_end());
        if x1 <= x0 || y1 <= y0 {
            return Rect::default();
        }
        Rect::from_edges(x0, y0, x1, y1)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.intersected(other).is_empty()
    }

    /// Smallest rect containing both; empty operands are ignored
    pub fn united(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.x_end().max(other.x_end()),
            self.y_end().max(other.y_end()),
        )
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// Grow by `margin` pixels on every side
    pub fn stretched(&self, margin: i32) -> Rect {
        Rect::new(
            self.x.saturating_sub(margin),
            self.y.saturating_sub(margin),
            self.width.saturating_add(2 * margin),
            self.height.saturating_add(2 * margin),
        )
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x_end() && y >= self.y && y < self.y_end()
    }

    /// An empty rect is contained in everything
    pub fn contains_rect(&self, other: &Rect) -> bool {
        if other.is_empty() {
            return true;
        }
        other.x >= self.x
            && other.y >= self.y
            && other.x_end() <= self.x_end()
            && other.y_end() <= self.y_end()
    }
}

/// Tile grid coordinates in store space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub col: i32,
    pub row: i32,
}

impl TileCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rect() {
        assert!(Rect::default().is_empty());
        assert!(Rect::new(0, 0, -3, 4).is_empty());
        assert!(!Rect::new(0, 0, 1, 1).is_empty());
        assert_eq!(Rect::new(0, 0, 0, 10).area(), 0);
    }

    #[test]
    fn test_intersection() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersected(&b), Rect::new(5, 5, 5, 5));
        assert!(a.intersected(&Rect::new(10, 0, 5, 5)).is_empty());
    }

    #[test]
    fn test_union_ignores_empty() {
        let a = Rect::new(2, 2, 3, 3);
        assert_eq!(a.united(&Rect::default()), a);
        assert_eq!(Rect::default().united(&a), a);
        assert_eq!(
            a.united(&Rect::new(-1, 4, 1, 10)),
            Rect::from_edges(-1, 2, 5, 14)
        );
    }

    #[test]
    fn test_contains() {
        let outer = Rect::new(0, 0, 20, 20);
        assert!(outer.contains_rect(&Rect::new(5, 5, 15, 15)));
        assert!(!outer.contains_rect(&Rect::new(5, 5, 16, 15)));
        assert!(outer.contains_rect(&Rect::default()));
        assert!(outer.contains_point(19, 0));
        assert!(!outer.contains_point(20, 0));
    }

    #[test]
    fn test_stretched() {
        assert_eq!(Rect::new(10, 10, 5, 5).stretched(2), Rect::new(8, 8, 9, 9));
    }
}
