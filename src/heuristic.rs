use crate::constants::EPSILON;
use crate::interval::Interval;
use crate::point::Point;

/// A pluggable replacement for the default Anya heuristic, keyed by map
/// name so a caller can swap in a cached or precomputed distance oracle.
pub type HeuristicFn = dyn Fn(&str, Point, Point) -> f64;

#[inline]
fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x1 - x2;
    let dy = y1 - y2;
    (dx * dx + dy * dy).sqrt()
}

/// Lower bound on the remaining cost from a `(root, interval)` state to
/// `target`, used to order the open list.
///
/// `target` must be a degenerate, single-point interval: `target.root`
/// is both the interval's row and its left and right bound. When `root`
/// and `target` fall on the same side of the interval's row, `target` is
/// mirrored across that row first, so the two legs of the path (root to
/// the interval, interval to target) straighten into candidates for a
/// single Euclidean segment.
#[must_use]
pub fn get_value(root: Point, interval: &Interval, target: Point) -> f64 {
    let i_row = interval.row() as f64;
    let i_left = interval.left();
    let i_right = interval.right();

    let root_x = root.x() as f64;
    let root_y = root.y() as f64;
    let target_x = target.x() as f64;
    let mut target_y = target.y() as f64;

    if (root_y < i_row && target_y < i_row) || (root_y > i_row && target_y > i_row) {
        target_y = 2.0 * i_row - target_y;
    }

    // A flat node's root already sits on the interval's row: there is no
    // cone to project through, so the admissible bound is the direct
    // line from root to target.
    if (root_y - i_row).abs() < f64::EPSILON {
        return distance(root_x, root_y, target_x, target.y() as f64);
    }

    let rise_root_to_i_row = (root_y - i_row).abs();
    let rise_i_row_to_target = (i_row - target_y).abs();

    let l_run = root_x - i_left;
    let r_run = i_right - root_x;

    let left_proj = i_left - rise_i_row_to_target * (l_run / rise_root_to_i_row);
    let right_proj = i_right + rise_i_row_to_target * (r_run / rise_root_to_i_row);

    if target_x + EPSILON < left_proj {
        return distance(root_x, root_y, i_left, i_row) + distance(i_left, i_row, target_x, target_y);
    }

    if target_x > right_proj + EPSILON {
        return distance(root_x, root_y, i_right, i_row) + distance(i_right, i_row, target_x, target_y);
    }

    distance(root_x, root_y, target_x, target_y)
}
