//! Integer pixel geometry shared by every detector.
//!
//! `Bounds` uses coordinate-span semantics: `w` and `h` measure from the first
//! to the last covered coordinate, so a rectangle enclosing a single pixel has
//! zero width and height. Detected clusters, scan regions and avoidance zones
//! all share this convention.

use serde::{Deserialize, Serialize};

/// A pixel coordinate on the captured frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }
}

/// Axis-aligned rectangle, both endpoints included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Bounds {
    #[inline]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Smallest rectangle enclosing every point. `None` for an empty slice.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut max_x) = (first.x, first.x);
        let (mut min_y, mut max_y) = (first.y, first.y);

        for p in &points[1..] {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        Some(Self {
            x: min_x,
            y: min_y,
            w: max_x - min_x,
            h: max_y - min_y,
        })
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    /// The click anchor for a detected label: centered just under the text.
    pub fn bottom_center(&self) -> Point {
        Point::new(self.x + self.w / 2, self.y + self.h)
    }

    pub fn size(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    /// Open-interval overlap on both axes; rectangles that only share an edge
    /// do not overlap.
    pub fn overlaps(&self, other: Bounds) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    /// Grow symmetrically by `amount` on every side.
    pub fn grown(&self, amount: i32) -> Self {
        Self {
            x: self.x - amount,
            y: self.y - amount,
            w: self.w + amount * 2,
            h: self.h + amount * 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(b.distance(a), 5.0);
    }

    #[test]
    fn enclosing_envelope() {
        let points = [
            Point::new(10, 20),
            Point::new(4, 25),
            Point::new(12, 22),
        ];
        let b = Bounds::enclosing(&points).unwrap();
        assert_eq!(b, Bounds::new(4, 20, 8, 5));
        assert!(Bounds::enclosing(&[]).is_none());
    }

    #[test]
    fn anchors() {
        let b = Bounds::new(10, 20, 40, 10);
        assert_eq!(b.center(), Point::new(30, 25));
        assert_eq!(b.bottom_center(), Point::new(30, 30));
    }

    #[test]
    fn contains_includes_edges() {
        let b = Bounds::new(0, 0, 10, 10);
        assert!(b.contains(Point::new(0, 0)));
        assert!(b.contains(Point::new(10, 10)));
        assert!(!b.contains(Point::new(11, 10)));
        assert!(!b.contains(Point::new(-1, 5)));
    }

    #[test]
    fn overlap_is_open_interval() {
        let a = Bounds::new(0, 0, 10, 10);
        assert!(a.overlaps(Bounds::new(5, 5, 10, 10)));
        assert!(a.overlaps(a));
        // Sharing only an edge is not an overlap.
        assert!(!a.overlaps(Bounds::new(10, 0, 10, 10)));
        assert!(!a.overlaps(Bounds::new(0, 10, 10, 10)));
        assert!(!a.overlaps(Bounds::new(20, 20, 5, 5)));
    }

    #[test]
    fn grown_expands_every_side() {
        let b = Bounds::new(10, 10, 4, 4).grown(3);
        assert_eq!(b, Bounds::new(7, 7, 10, 10));
    }
}
