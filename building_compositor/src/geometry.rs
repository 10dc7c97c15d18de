// Integer grid geometry: points, half-open rectangles and rect-union regions.
//
// `Rect` spans `[x, x + width) x [y, y + height)`. Empty rects (zero or
// negative extent) contain nothing and intersect nothing. `Region` is a plain
// union of rects; overlap between its rects is allowed and harmless since
// every query is a containment test.
//
// See also: `user_tiles.rs`, whose region replace and masked clone take a
// `Region`; `object.rs` for object bounds.

use serde::{Deserialize, Serialize};

/// A cell coordinate on a floor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned, half-open rectangle of cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

    /// Exclusive right edge.
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub const fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.right() && p.y < self.bottom()
    }

    /// Overlap of two rects; an empty rect when they are disjoint.
    pub fn intersected(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            Rect::default()
        } else {
            Rect::new(x, y, right - x, bottom - y)
        }
    }

    pub const fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Cells in row-major order (y outer, x inner).
    pub fn points(self) -> impl Iterator<Item = Point> {
        let (x0, x1) = (self.x, self.right());
        (self.y..self.bottom()).flat_map(move |y| (x0..x1).map(move |x| Point::new(x, y)))
    }
}

/// A union of rectangles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rect(rect: Rect) -> Self {
        let mut region = Self::new();
        region.add_rect(rect);
        region
    }

    /// Add a rect to the union. Empty rects are ignored.
    pub fn add_rect(&mut self, rect: Rect) {
        if !rect.is_empty() {
            self.rects.push(rect);
        }
    }

    pub fn union(mut self, other: &Region) -> Self {
        self.rects.extend(other.rects.iter().copied());
        self
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn contains(&self, p: Point) -> bool {
        self.rects.iter().any(|r| r.contains(p))
    }

    /// Smallest rect containing every rect of the region.
    pub fn bounding_rect(&self) -> Rect {
        let Some(first) = self.rects.first() else {
            return Rect::default();
        };
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.right(), first.bottom());
        for r in &self.rects[1..] {
            x0 = x0.min(r.x);
            y0 = y0.min(r.y);
            x1 = x1.max(r.right());
            y1 = y1.max(r.bottom());
        }
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Region {
        Region {
            rects: self.rects.iter().map(|r| r.translated(dx, dy)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(1, 1, 2, 3);
        assert!(r.contains(Point::new(1, 1)));
        assert!(r.contains(Point::new(2, 3)));
        assert!(!r.contains(Point::new(3, 1)));
        assert!(!r.contains(Point::new(1, 4)));
    }

    #[test]
    fn disjoint_rects_intersect_empty() {
        let a = Rect::new(0, 0, 2, 2);
        let b = Rect::new(5, 5, 2, 2);
        assert!(a.intersected(&b).is_empty());
        assert_eq!(a.intersected(&Rect::new(1, 1, 5, 5)), Rect::new(1, 1, 1, 1));
    }

    #[test]
    fn rect_points_are_row_major() {
        let pts: Vec<Point> = Rect::new(0, 0, 2, 2).points().collect();
        assert_eq!(
            pts,
            vec![
                Point::new(0, 0),
                Point::new(1, 0),
                Point::new(0, 1),
                Point::new(1, 1)
            ]
        );
    }

    #[test]
    fn points_outlive_a_temporary_rect() {
        fn cells(w: i32, h: i32) -> impl Iterator<Item = Point> {
            Rect::new(0, 0, w, h).points()
        }
        assert_eq!(cells(3, 2).count(), 6);
        assert_eq!(cells(3, 2).last(), Some(Point::new(2, 1)));
    }

    #[test]
    fn region_bounding_rect_spans_all_rects() {
        let mut region = Region::from_rect(Rect::new(0, 0, 1, 1));
        region.add_rect(Rect::new(4, 2, 2, 2));
        region.add_rect(Rect::new(9, 9, 0, 3));
        assert_eq!(region.rects().len(), 2);
        assert_eq!(region.bounding_rect(), Rect::new(0, 0, 6, 4));
        assert!(region.contains(Point::new(5, 3)));
        assert!(!region.contains(Point::new(2, 2)));
    }
}
