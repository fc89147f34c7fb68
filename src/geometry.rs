//! Axis-aligned rectangles in the combined capture coordinate space.
//!
//! Zones, captures and detected objects are all described by the same four numbers
//! (`x`, `y`, `width`, `height`). The `Bounds` trait gives them a common view so the
//! free functions below can compare any of them with any other.

use crate::error::LookupError;

/// Position and size of something rectangular. End coordinates are inclusive.
pub trait Bounds {
    fn x(&self) -> i32;
    fn y(&self) -> i32;
    fn width(&self) -> i32;
    fn height(&self) -> i32;

    fn end_x(&self) -> i32 {
        self.x() + self.width() - 1
    }

    fn end_y(&self) -> i32 {
        self.y() + self.height() - 1
    }

    fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        self.x() <= x && self.end_x() >= x && self.y() <= y && self.end_y() >= y
    }

    fn outline(&self) -> Outline {
        Outline::of(self.x(), self.y(), self.width(), self.height())
    }
}

/// Immutable rectangle value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Outline {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl Outline {
    pub fn of(x: i32, y: i32, width: i32, height: i32) -> Self {
        debug_assert!(width >= 1 && height >= 1, "outline must be at least 1x1");
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning the inclusive corners `(x, y)` and `(end_x, end_y)`.
    pub fn from_corners(x: i32, y: i32, end_x: i32, end_y: i32) -> Self {
        Self::of(x, y, end_x - x + 1, end_y - y + 1)
    }
}

impl Bounds for Outline {
    fn x(&self) -> i32 {
        self.x
    }

    fn y(&self) -> i32 {
        self.y
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }
}

/// Overlap test with no proximity allowance.
///
/// A rectangle that fully contains the other is reported as intersecting before the
/// edge comparison runs.
pub fn intersects(a: &impl Bounds, b: &impl Bounds) -> bool {
    if a.x() <= b.x() && a.end_x() >= b.end_x() && a.y() <= b.y() && a.end_y() >= b.end_y() {
        return true;
    }
    intersects_within(a, b, 0)
}

/// True when `a` and `b` overlap or lie within `threshold` pixels of each other.
pub fn intersects_within(a: &impl Bounds, b: &impl Bounds, threshold: i32) -> bool {
    a.end_y() + threshold >= b.y()
        && a.y() <= b.end_y() + threshold
        && a.x() <= b.end_x() + threshold
        && a.end_x() + threshold >= b.x()
}

/// Number of pixels shared by `a` and `b`.
///
/// Only meaningful when `intersects(a, b)` holds; callers must check first.
pub fn intersection_area(a: &impl Bounds, b: &impl Bounds) -> i64 {
    let x = a.x().max(b.x());
    let y = a.y().max(b.y());
    let end_x = a.end_x().min(b.end_x());
    let end_y = a.end_y().min(b.end_y());
    (end_x - x + 1) as i64 * (end_y - y + 1) as i64
}

/// Smallest rectangle covering both inputs.
pub fn compose(a: &impl Bounds, b: &impl Bounds) -> Outline {
    Outline::from_corners(
        a.x().min(b.x()),
        a.y().min(b.y()),
        a.end_x().max(b.end_x()),
        a.end_y().max(b.end_y()),
    )
}

/// Smallest rectangle covering every member, or `None` for an empty input.
pub fn compose_all<'a, T, I>(outlines: I) -> Option<Outline>
where
    T: Bounds + 'a,
    I: IntoIterator<Item = &'a T>,
{
    outlines
        .into_iter()
        .map(Bounds::outline)
        .reduce(|acc, next| compose(&acc, &next))
}

/// First outline containing `(x, y)`.
pub fn find_outline_for_position<T: Bounds>(
    x: i32,
    y: i32,
    outlines: &[T],
) -> Result<&T, LookupError> {
    find_index_for_position(x, y, outlines).map(|index| &outlines[index])
}

/// Index of the first outline containing `(x, y)`.
pub fn find_index_for_position<T: Bounds>(
    x: i32,
    y: i32,
    outlines: &[T],
) -> Result<usize, LookupError> {
    outlines
        .iter()
        .position(|outline| outline.contains(x, y))
        .ok_or(LookupError::NotFound { x, y })
}
