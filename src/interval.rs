use crate::constants::EPSILON;
use std::fmt;

const DOUBLE_INEQUALITY_THRESHOLD: f64 = EPSILON;

/// A continuous, visible span `[left, right]` on a single discrete row of
/// the grid. `left` and `right` snap to the nearest integer, and record
/// that they did, whenever they land within [`EPSILON`] of one.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    left: f64,
    right: f64,
    row: i32,
    discrete_left: bool,
    discrete_right: bool,
}

impl Interval {
    #[must_use]
    pub fn new(left: f64, right: f64, row: i32) -> Self {
        let mut interval = Self {
            left: 0.0,
            right: 0.0,
            row,
            discrete_left: false,
            discrete_right: false,
        };
        interval.set_left(left);
        interval.set_right(right);
        interval
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.left
    }

    #[inline]
    pub fn set_left(&mut self, left: f64) {
        self.discrete_left = (left.round() - left).abs() < EPSILON;
        self.left = if self.discrete_left { left.round() } else { left };
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.right
    }

    #[inline]
    pub fn set_right(&mut self, right: f64) {
        self.discrete_right = (right.round() - right).abs() < EPSILON;
        self.right = if self.discrete_right {
            right.round()
        } else {
            right
        };
    }

    #[inline]
    pub fn row(&self) -> i32 {
        self.row
    }

    #[inline]
    pub fn discrete_left(&self) -> bool {
        self.discrete_left
    }

    #[inline]
    pub fn discrete_right(&self) -> bool {
        self.discrete_right
    }

    #[inline]
    #[must_use]
    pub fn range_size(&self) -> f64 {
        self.right - self.left
    }

    /// True if `self` is identical to, or a superset of, `other` on the same row.
    #[must_use]
    pub fn covers(&self, other: &Interval) -> bool {
        if self == other {
            return true;
        }
        self.row == other.row && self.left <= other.left && self.right >= other.right
    }

    /// True if `(x, y)` falls on this interval's row, widened by
    /// `EPSILON` on both sides to absorb floating-point drift at the
    /// endpoints.
    #[must_use]
    pub fn contains(&self, x: f64, y: i32) -> bool {
        self.row == y && self.left - EPSILON <= x && self.right + EPSILON >= x
    }
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        (self.left - other.left).abs() < DOUBLE_INEQUALITY_THRESHOLD
            && (self.right - other.right).abs() < DOUBLE_INEQUALITY_THRESHOLD
            && self.row == other.row
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Interval(left: {}, right: {}, row: {})",
            self.left, self.right, self.row
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn covers_same_row_superset() {
        let outer = Interval::new(1.0, 9.0, 3);
        let inner = Interval::new(2.0, 8.0, 3);
        assert!(outer.covers(&inner));
        assert!(!inner.covers(&outer));
    }

    #[test]
    fn covers_is_false_across_rows() {
        let a = Interval::new(1.0, 9.0, 3);
        let b = Interval::new(1.0, 9.0, 4);
        assert!(!a.covers(&b));
    }

    #[test]
    fn covers_is_reflexive_via_equality() {
        let a = Interval::new(1.0, 9.0, 3);
        assert!(a.covers(&a));
    }

    #[test]
    fn contains_widens_both_sides_within_epsilon() {
        let i = Interval::new(2.0, 7.0, 1);
        assert!(i.contains(7.0 + 1e-10, 1));
    }

    #[test]
    fn contains_rejects_beyond_widened_tolerance() {
        let i = Interval::new(2.0, 7.0, 1);
        assert!(!i.contains(7.0 + 1e-5, 1));
    }

    #[test]
    fn contains_rejects_point_on_wrong_row() {
        let i = Interval::new(2.0, 7.0, 1);
        assert!(!i.contains(5.0, 2));
    }

    #[test]
    fn set_left_snaps_near_integral_values() {
        let i = Interval::new(3.0 + 1e-9, 5.0, 2);
        assert!(i.discrete_left());
        assert_eq!(i.left(), 3.0);
    }

    #[test]
    fn set_left_leaves_non_integral_values_unsnapped() {
        let i = Interval::new(3.5, 5.0, 2);
        assert!(!i.discrete_left());
        assert_eq!(i.left(), 3.5);
    }
}
