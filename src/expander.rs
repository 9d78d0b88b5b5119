use crate::constants::EPSILON;
use crate::grid::BitpackedGrid;
use crate::interval::Interval;
use crate::point::Point;
use crate::projection::IntervalProjection;

/// A candidate successor state: a new root point paired with the
/// interval it can see from there. The search layer is responsible for
/// turning this into a heap entry with a computed `g`/`f`.
#[derive(Debug, Clone, Copy)]
pub struct Successor {
    pub root: Point,
    pub interval: Interval,
}

/// Generates the successors of a search node under the Anya expansion
/// rules: observable flat and cone successors are taken directly;
/// non-observable ones are produced by bending the path around a taut
/// corner.
pub struct AnyaExpander<'g> {
    grid: &'g BitpackedGrid,
    prune: bool,
    target: Point,
    successors: Vec<Successor>,
    idx_succ: usize,
}

impl<'g> AnyaExpander<'g> {
    #[must_use]
    pub fn new(grid: &'g BitpackedGrid, target: Point) -> Self {
        Self {
            grid,
            prune: true,
            target,
            successors: Vec::new(),
            idx_succ: 0,
        }
    }

    #[must_use]
    pub fn with_prune(grid: &'g BitpackedGrid, target: Point, prune: bool) -> Self {
        Self {
            prune,
            ..Self::new(grid, target)
        }
    }

    pub fn grid(&self) -> &BitpackedGrid {
        self.grid
    }

    #[must_use]
    pub fn validate_instance(&self, start: Point, target: Point) -> bool {
        self.grid.cell_traversable(start.x(), start.y())
            && self.grid.cell_traversable(target.x(), target.y())
    }

    /// Expands `(root, interval)`, filling the internal successor list.
    /// `is_start` selects the degenerate off-grid expansion used only for
    /// the very first node of a search.
    pub fn expand(&mut self, root: Point, interval: &Interval, is_start: bool) {
        self.successors.clear();
        self.idx_succ = 0;

        if is_start {
            self.generate_start_successors(root, interval);
        } else {
            self.generate_successors(root, interval);
        }
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.idx_succ < self.successors.len()
    }

    pub fn next(&mut self) -> Option<Successor> {
        if self.idx_succ < self.successors.len() {
            let s = self.successors[self.idx_succ];
            self.idx_succ += 1;
            Some(s)
        } else {
            None
        }
    }

    #[must_use]
    pub fn step_cost(&self, from_root: Point, to_root: Point) -> f64 {
        from_root.distance_to(to_root)
    }

    /// Identifies a root point's equivalence class for redundancy
    /// pruning: two nodes with the same root are comparable regardless of
    /// which interval brought them there.
    #[must_use]
    pub fn hash(&self, root: Point) -> i64 {
        root.y() as i64 * self.grid.map_width() as i64 + root.x() as i64
    }

    fn generate_successors(&mut self, root: Point, interval: &Interval) {
        let mut projection = IntervalProjection::new();
        if root.y() == interval.row() {
            projection.project(
                interval.left(),
                interval.right(),
                interval.row(),
                root.x(),
                root.y(),
                self.grid,
            );
            self.flat_node_obs(root, interval, &projection);

            projection.project_f2c(
                interval.left(),
                interval.right(),
                interval.row(),
                root.x(),
                root.y(),
                self.grid,
            );
            self.flat_node_nobs(root, interval, &projection);
        } else {
            projection.project(
                interval.left(),
                interval.right(),
                interval.row(),
                root.x(),
                root.y(),
                self.grid,
            );
            self.cone_node_obs(root, interval, &projection);
            self.cone_node_nobs(root, interval, &projection);
        }
    }

    fn generate_start_successors(&mut self, root: Point, interval: &Interval) {
        debug_assert!(interval.left() == interval.right());
        debug_assert!(interval.left() == root.x() as f64);
        debug_assert!(interval.row() == root.y());

        let rootx = root.x();
        let rooty = root.y();
        let start_dc = self.grid.point_double_corner(rootx, rooty);

        if start_dc && !self.grid.cell_traversable(rootx, rooty) {
            return;
        }

        let mut projection = IntervalProjection::new();
        if !start_dc {
            projection.project(
                rootx as f64,
                rootx as f64,
                rooty,
                rootx + 1,
                rooty,
                self.grid,
            );
            self.generate_observable_flat(&projection, rootx, rooty);
        }

        projection.project(
            rootx as f64,
            rootx as f64,
            rooty,
            rootx - 1,
            rooty,
            self.grid,
        );
        self.generate_observable_flat(&projection, rootx, rooty);

        let max_left = self.grid.scan_cells_left(rootx, rooty) + 1;
        let max_right = self.grid.scan_cells_right(rootx, rooty);
        if max_left != rootx && !start_dc {
            self.split_interval_make_successors(
                max_left as f64,
                rootx as f64,
                rooty + 1,
                rootx,
                rooty,
                rooty + 1,
            );
        }
        if max_right != rootx {
            self.split_interval_make_successors(
                rootx as f64,
                max_right as f64,
                rooty + 1,
                rootx,
                rooty,
                rooty + 1,
            );
        }

        let max_left = self.grid.scan_cells_left(rootx - 1, rooty - 1) + 1;
        let max_right = self.grid.scan_cells_right(rootx, rooty - 1);
        if max_left != rootx && !start_dc {
            self.split_interval_make_successors(
                max_left as f64,
                rootx as f64,
                rooty - 1,
                rootx,
                rooty,
                rooty - 2,
            );
        }
        if max_right != rootx {
            self.split_interval_make_successors(
                rootx as f64,
                max_right as f64,
                rooty - 1,
                rootx,
                rooty,
                rooty - 2,
            );
        }
    }

    fn split_interval_make_successors(
        &mut self,
        max_left: f64,
        max_right: f64,
        irow: i32,
        rootx: i32,
        rooty: i32,
        sterile_check_row: i32,
    ) {
        if max_left == max_right {
            return;
        }

        let mut succ_left = max_right;
        let num_successors = self.successors.len();
        let target_node = self.contains_target(max_left, max_right, irow);
        let forced_succ = !self.prune || target_node;

        let mut last_interval: Option<Interval> = None;
        loop {
            let succ_right = succ_left;
            succ_left = self.grid.scan_left(succ_right, irow) as f64;

            if forced_succ || !self.sterile(succ_left, succ_right, sterile_check_row) {
                let clamped_left = if succ_left < max_left { max_left } else { succ_left };
                let interval = Interval::new(clamped_left, succ_right, irow);
                self.successors.push(Successor {
                    root: Point::new(rootx, rooty),
                    interval,
                });
                last_interval = Some(interval);
            }

            if !(succ_left != succ_right && succ_left > max_left) {
                break;
            }
        }

        if !forced_succ && self.successors.len() == num_successors + 1 {
            let interval = last_interval.expect("exactly one successor was pushed");
            if self.intermediate(&interval, rootx, rooty) {
                self.successors.pop();

                let mut proj = IntervalProjection::new();
                proj.project_cone(
                    interval.left(),
                    interval.right(),
                    interval.row(),
                    rootx,
                    rooty,
                    self.grid,
                );
                if proj.valid && proj.observable {
                    self.split_interval_make_successors(
                        proj.left,
                        proj.right,
                        proj.row,
                        rootx,
                        rooty,
                        proj.sterile_check_row,
                    );
                }
            }
        }
    }

    fn sterile(&self, left: f64, right: f64, row: i32) -> bool {
        let r = (right - EPSILON) as i32;
        let l = (left + EPSILON) as i32;
        !(self.grid.cell_traversable(l, row) && self.grid.cell_traversable(r, row))
    }

    fn intermediate(&self, interval: &Interval, rootx: i32, rooty: i32) -> bool {
        let left = interval.left();
        let right = interval.right();
        let row = interval.row();

        let tmp_left = left as i32;
        let tmp_right = right as i32;

        let rightroot = tmp_right < rootx;
        let leftroot = rootx < tmp_left;

        let (left_turning_point, right_turning_point) = if rooty < row {
            let lt = interval.discrete_left()
                && self.grid.point_corner(tmp_left, row)
                && (!self.grid.cell_traversable(tmp_left - 1, row - 1) || leftroot);
            let rt = interval.discrete_right()
                && self.grid.point_corner(tmp_right, row)
                && (!self.grid.cell_traversable(tmp_right, row - 1) || rightroot);
            (lt, rt)
        } else {
            let lt = interval.discrete_left()
                && self.grid.point_corner(tmp_left, row)
                && (!self.grid.cell_traversable(tmp_left - 1, row) || leftroot);
            let rt = interval.discrete_right()
                && self.grid.point_corner(tmp_right, row)
                && (!self.grid.cell_traversable(tmp_right, row) || rightroot);
            (lt, rt)
        };

        !((interval.discrete_left() && left_turning_point)
            || (interval.discrete_right() && right_turning_point))
    }

    fn contains_target(&self, left: f64, right: f64, row: i32) -> bool {
        row == self.target.y()
            && self.target.x() as f64 >= left - EPSILON
            && self.target.x() as f64 <= right + EPSILON
    }

    fn cone_node_obs(&mut self, root: Point, interval: &Interval, projection: &IntervalProjection) {
        debug_assert_ne!(root.y(), interval.row());
        self.generate_observable_cone(projection, root.x(), root.y());
    }

    fn generate_observable_cone(&mut self, projection: &IntervalProjection, rootx: i32, rooty: i32) {
        if !(projection.valid && projection.observable) {
            return;
        }
        self.split_interval_make_successors(
            projection.left,
            projection.right,
            projection.row,
            rootx,
            rooty,
            projection.sterile_check_row,
        );
    }

    fn cone_node_nobs(&mut self, root: Point, interval: &Interval, projection: &IntervalProjection) {
        if !projection.valid {
            return;
        }

        let ileft = interval.left();
        let iright = interval.right();
        let irow = interval.row();

        if !projection.observable {
            if root.x() as f64 > iright
                && interval.discrete_right()
                && self.grid.point_corner(iright as i32, irow)
            {
                self.split_interval_make_successors(
                    projection.max_left,
                    iright,
                    projection.row,
                    iright as i32,
                    irow,
                    projection.sterile_check_row,
                );
            } else if (root.x() as f64) < ileft
                && interval.discrete_left()
                && self.grid.point_corner(ileft as i32, irow)
            {
                self.split_interval_make_successors(
                    ileft,
                    projection.max_right,
                    projection.row,
                    ileft as i32,
                    irow,
                    projection.sterile_check_row,
                );
            }

            if interval.discrete_left()
                && !self
                    .grid
                    .cell_traversable(ileft as i32 - 1, projection.type_iii_check_row)
                && self
                    .grid
                    .cell_traversable(ileft as i32 - 1, projection.check_vis_row)
            {
                let mut p = IntervalProjection::new();
                p.project_flat(
                    ileft - self.grid.smallest_step_div2(),
                    ileft,
                    ileft as i32,
                    irow,
                    self.grid,
                );
                self.generate_observable_flat(&p, ileft as i32, irow);
            }

            if interval.discrete_right()
                && !self
                    .grid
                    .cell_traversable(iright as i32, projection.type_iii_check_row)
                && self
                    .grid
                    .cell_traversable(iright as i32, projection.check_vis_row)
            {
                let mut p = IntervalProjection::new();
                p.project_flat(
                    iright,
                    iright + self.grid.smallest_step_div2(),
                    iright as i32,
                    irow,
                    self.grid,
                );
                self.generate_observable_flat(&p, iright as i32, irow);
            }
            return;
        }

        let corner_row = irow - if (root.y() - irow) < 0 { 1 } else { 0 };

        if interval.discrete_left() && self.grid.point_corner(ileft as i32, irow) {
            if !self.grid.cell_traversable(ileft as i32 - 1, corner_row) {
                let mut flatprj = IntervalProjection::new();
                flatprj.project(
                    ileft - EPSILON,
                    iright,
                    irow,
                    ileft as i32,
                    irow,
                    self.grid,
                );
                self.generate_observable_flat(&flatprj, ileft as i32, irow);
            }

            self.split_interval_make_successors(
                projection.max_left,
                projection.left,
                projection.row,
                ileft as i32,
                irow,
                projection.sterile_check_row,
            );
        }

        if interval.discrete_right() && self.grid.point_corner(iright as i32, irow) {
            if !self.grid.cell_traversable(iright as i32, corner_row) {
                let mut flatprj = IntervalProjection::new();
                flatprj.project(
                    ileft,
                    iright + EPSILON,
                    irow,
                    ileft as i32,
                    irow,
                    self.grid,
                );
                self.generate_observable_flat(&flatprj, iright as i32, irow);
            }

            self.split_interval_make_successors(
                projection.right,
                projection.max_right,
                projection.row,
                iright as i32,
                irow,
                projection.sterile_check_row,
            );
        }
    }

    fn flat_node_obs(&mut self, root: Point, _interval: &Interval, projection: &IntervalProjection) {
        self.generate_observable_flat(projection, root.x(), root.y());
    }

    fn generate_observable_flat(&mut self, projection: &IntervalProjection, rootx: i32, rooty: i32) {
        debug_assert_eq!(projection.row, rooty);

        if !projection.valid {
            return;
        }

        let mut left = projection.left;
        let mut right = projection.right;
        let mut row = projection.row;
        let mut dead_end = projection.dead_end;

        let mut goal_interval = self.contains_target(left, right, row);
        if projection.intermediate && self.prune && !goal_interval {
            let mut p = IntervalProjection::new();
            p.project(left, right, row, rootx, rooty, self.grid);
            left = p.left;
            right = p.right;
            row = p.row;
            dead_end = p.dead_end;
            goal_interval = self.contains_target(left, right, row);
        }

        if !dead_end || !self.prune || goal_interval {
            self.successors.push(Successor {
                root: Point::new(rootx, rooty),
                interval: Interval::new(left, right, row),
            });
        }
    }

    fn flat_node_nobs(&mut self, root: Point, interval: &Interval, projection: &IntervalProjection) {
        if !projection.valid {
            return;
        }

        let new_rooty = interval.row();
        let new_rootx = if root.x() as f64 <= interval.left() {
            interval.right() as i32
        } else {
            interval.left() as i32
        };

        self.split_interval_make_successors(
            projection.left,
            projection.right,
            projection.row,
            new_rootx,
            new_rooty,
            projection.sterile_check_row,
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn open_grid(w: i32, h: i32) -> BitpackedGrid {
        let mut g = BitpackedGrid::new(w, h);
        for y in 0..h {
            for x in 0..w {
                g.set_cell(x, y, true);
            }
        }
        g
    }

    #[test]
    fn start_expansion_on_open_grid_yields_successors() {
        let grid = open_grid(10, 10);
        let target = Point::new(9, 9);
        let mut expander = AnyaExpander::new(&grid, target);
        let root = Point::new(5, 5);
        let interval = Interval::new(5.0, 5.0, 5);

        expander.expand(root, &interval, true);
        assert!(expander.has_next());

        let mut count = 0;
        while expander.has_next() {
            expander.next();
            count += 1;
        }
        assert!(count > 0);
    }

    #[test]
    fn expansion_near_a_wall_is_blocked_by_it() {
        let mut grid = open_grid(10, 10);
        for x in 0..10 {
            grid.set_cell(x, 6, false);
        }
        let target = Point::new(9, 9);
        let mut expander = AnyaExpander::new(&grid, target);
        let root = Point::new(5, 5);
        let interval = Interval::new(5.0, 5.0, 5);

        expander.expand(root, &interval, true);
        while expander.has_next() {
            let s = expander.next().unwrap();
            assert!(s.interval.row() <= 6);
        }
    }

    #[test]
    fn hash_is_stable_for_identical_roots() {
        let grid = open_grid(10, 10);
        let expander = AnyaExpander::new(&grid, Point::new(0, 0));
        assert_eq!(expander.hash(Point::new(3, 4)), expander.hash(Point::new(3, 4)));
    }
}
