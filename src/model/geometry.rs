use serde::{Deserialize, Serialize};

/// Coordinates this far negative or beyond are treated as garbage from the
/// window server rather than a real monitor position.
pub const COORD_FLOOR: i32 = -(1 << 15);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Point { Point { x, y } }
}

/// An axis-aligned rectangle in monitor-local (or virtual-screen)
/// coordinates. Edges are half-open in no particular sense; `contains` treats
/// all four edges as inclusive, matching how the window server reports hit
/// rectangles.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Rect {
        Rect { left, top, right, bottom }
    }

    pub fn from_size(left: i32, top: i32, width: i32, height: i32) -> Rect {
        Rect {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    pub fn width(&self) -> i32 { self.right - self.left }

    pub fn height(&self) -> i32 { self.bottom - self.top }

    pub fn area(&self) -> i64 { i64::from(self.width()) * i64::from(self.height()) }

    pub fn center(&self) -> Point {
        Point::new(
            self.left + self.width() / 2,
            self.top + self.height() / 2,
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// True iff `other` lies entirely inside `self` (edges may touch).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    /// Grows the rectangle by `amount` on every side.
    pub fn inflate(&self, amount: i32) -> Rect {
        Rect {
            left: self.left - amount,
            top: self.top - amount,
            right: self.right + amount,
            bottom: self.bottom + amount,
        }
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect {
            left: self.left + dx,
            top: self.top + dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        (r.right > r.left && r.bottom > r.top).then_some(r)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// A rectangle is usable as a zone if it has positive extent on both
    /// axes and none of its coordinates fell below the coordinate floor.
    pub fn is_valid(&self) -> bool {
        self.right > self.left
            && self.bottom > self.top
            && self.left >= COORD_FLOOR
            && self.top >= COORD_FLOOR
            && self.right >= COORD_FLOOR
            && self.bottom >= COORD_FLOOR
    }
}

/// Bounding rectangle of an iterator of rects; `None` when empty.
pub fn bounding_rect<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
    let mut iter = rects.into_iter();
    let first = *iter.next()?;
    Some(iter.fold(first, |acc, r| acc.union(r)))
}
