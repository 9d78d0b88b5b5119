use std::fmt;
use std::ops::{Add, Neg, Sub};

/// A discrete point on the grid lattice. Unlike an interval endpoint,
/// a root point's coordinates are always integral.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub(super) x: i32,
    pub(super) y: i32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn distance_squared_to(&self, other: Point) -> f64 {
        let x = other.x() as f64 - self.x() as f64;
        let y = other.y() as f64 - self.y() as f64;
        x * x + y * y
    }

    #[inline]
    pub fn distance_to(&self, other: Point) -> f64 {
        self.distance_squared_to(other).sqrt()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Point {
    #[inline]
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl From<Point> for (i32, i32) {
    #[inline]
    fn from(point: Point) -> Self {
        (point.x, point.y)
    }
}

impl Neg for Point {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

impl Add for Point {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn distance_to_is_euclidean() {
        let a = Point::new(1, 2);
        let b = Point::new(4, 6);
        assert!((a.distance_to(b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn display_renders_as_csv_point() {
        assert_eq!(Point::new(3, -1).to_string(), "(3,-1)");
    }
}
