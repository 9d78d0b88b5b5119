use crate::grid::BitpackedGrid;

/// Stateful scratch object that projects an interval from one grid row
/// onto an adjacent one (or further along the same row). Reused across
/// expansions rather than reallocated.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntervalProjection {
    pub left: f64,
    pub right: f64,
    pub max_left: f64,
    pub max_right: f64,
    pub row: i32,
    pub valid: bool,
    pub observable: bool,
    pub sterile_check_row: i32,
    pub check_vis_row: i32,
    pub type_iii_check_row: i32,
    pub dead_end: bool,
    pub intermediate: bool,
}

impl IntervalProjection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Project `(ileft, iright, irow)` from root `(rootx, rooty)`, picking
    /// flat or cone projection based on whether the root shares the
    /// interval's row.
    pub fn project(
        &mut self,
        ileft: f64,
        iright: f64,
        irow: i32,
        rootx: i32,
        rooty: i32,
        grid: &BitpackedGrid,
    ) {
        self.observable = false;
        self.valid = false;

        if rooty == irow {
            self.project_flat(ileft, iright, rootx, rooty, grid);
        } else {
            self.project_cone(ileft, iright, irow, rootx, rooty, grid);
        }
    }

    pub fn project_cone(
        &mut self,
        ileft: f64,
        iright: f64,
        irow: i32,
        rootx: i32,
        rooty: i32,
        grid: &BitpackedGrid,
    ) {
        if rooty < irow {
            self.check_vis_row = irow;
            self.row = irow + 1;
            self.sterile_check_row = self.row;
            self.type_iii_check_row = irow - 1;
        } else {
            debug_assert!(rooty > irow);
            self.sterile_check_row = irow - 2;
            self.row = irow - 1;
            self.check_vis_row = self.row;
            self.type_iii_check_row = irow;
        }

        self.valid = grid.cell_traversable(
            (ileft + grid.smallest_step_div2()) as i32,
            self.check_vis_row,
        ) && grid.cell_traversable(
            (iright - grid.smallest_step_div2()) as i32,
            self.check_vis_row,
        );
        if !self.valid {
            return;
        }

        let rise = (irow - rooty).unsigned_abs() as f64;
        let lrun = rootx as f64 - ileft;
        let rrun = iright - rootx as f64;

        self.max_left = (grid.scan_cells_left(ileft as i32, self.check_vis_row) + 1) as f64;
        self.left = (ileft - lrun / rise).max(self.max_left);

        self.max_right = grid.scan_cells_right(iright as i32, self.check_vis_row) as f64;
        self.right = (iright + rrun / rise).min(self.max_right);

        self.observable = self.left < self.right;

        if self.left >= self.max_right {
            self.left = if grid.cell_traversable(
                (ileft - grid.smallest_step_div2()) as i32,
                self.check_vis_row,
            ) {
                self.right
            } else {
                self.max_left
            };
        }

        if self.right <= self.max_left {
            self.right = if grid.cell_traversable(iright as i32, self.check_vis_row) {
                self.left
            } else {
                self.max_right
            };
        }
    }

    pub fn project_flat(&mut self, ileft: f64, iright: f64, rootx: i32, rooty: i32, grid: &BitpackedGrid) {
        if rootx as f64 <= ileft {
            self.left = iright;
            self.right = grid.scan_right(self.left, rooty) as f64;
            self.dead_end = !(grid.cell_traversable(self.right as i32, rooty)
                && grid.cell_traversable(self.right as i32, rooty - 1));
        } else {
            self.right = ileft;
            self.left = grid.scan_left(self.right, rooty) as f64;
            self.dead_end = !(grid
                .cell_traversable((self.left - grid.smallest_step_div2()) as i32, rooty)
                && grid.cell_traversable(
                    (self.left - grid.smallest_step_div2()) as i32,
                    rooty - 1,
                ));
        }

        self.intermediate = grid.cell_traversable(self.left as i32, rooty)
            && grid.cell_traversable(self.left as i32, rooty - 1);

        self.row = rooty;
        self.valid = self.left != self.right;
    }

    /// Project through a flat node and onto an adjacent row, around a
    /// corner. The direction of the bend is decided by the traversability
    /// of the cell directly below the corner on the source row.
    pub fn project_f2c(&mut self, ileft: f64, iright: f64, irow: i32, rootx: i32, _rooty: i32, grid: &BitpackedGrid) {
        if rootx as f64 <= ileft {
            let can_step = grid.cell_traversable(iright as i32, irow)
                && grid.cell_traversable(iright as i32, irow - 1);
            if !can_step {
                self.valid = false;
                self.observable = false;
                return;
            }

            if !grid.cell_traversable(iright as i32 - 1, irow) {
                self.row = irow + 1;
                self.sterile_check_row = self.row;
                self.check_vis_row = irow;
            } else {
                self.row = irow - 1;
                self.check_vis_row = self.row;
                self.sterile_check_row = irow - 2;
            }

            self.left = iright;
            self.max_left = self.left;
            self.right = grid.scan_cells_right(self.left as i32, self.check_vis_row) as f64;
            self.max_right = self.right;
        } else {
            debug_assert!(rootx as f64 >= iright);
            let can_step = grid.cell_traversable(ileft as i32 - 1, irow)
                && grid.cell_traversable(ileft as i32 - 1, irow - 1);
            if !can_step {
                self.valid = false;
                self.observable = false;
                return;
            }

            if !grid.cell_traversable(ileft as i32, irow) {
                self.check_vis_row = irow;
                self.row = irow + 1;
                self.sterile_check_row = self.row;
            } else {
                self.row = irow - 1;
                self.check_vis_row = self.row;
                self.sterile_check_row = irow - 2;
            }

            self.right = ileft;
            self.max_right = self.right;
            self.left = (grid.scan_cells_left(self.right as i32 - 1, self.check_vis_row) + 1) as f64;
            self.max_left = self.left;
        }

        self.valid = true;
        self.observable = false;
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
    fn cone_projection_onto_open_row_is_observable() {
        let g = open_grid(10, 10);
        let mut p = IntervalProjection::new();
        p.project(2.0, 5.0, 3, 3, 2, &g);
        assert!(p.valid);
        assert!(p.observable);
        assert_eq!(p.row, 4);
    }

    #[test]
    fn flat_projection_extends_to_far_wall() {
        let mut g = open_grid(10, 1);
        g.set_cell(7, 0, false);
        let mut p = IntervalProjection::new();
        p.project(2.0, 3.0, 3, 0, 0, &g);
        assert!(p.valid);
        assert_eq!(p.left, 3.0);
        assert_eq!(p.right, 7.0);
    }

    #[test]
    fn project_f2c_is_never_observable() {
        let g = open_grid(10, 10);
        let mut p = IntervalProjection::new();
        p.project_f2c(2.0, 3.0, 5, 3, 5, &g);
        assert!(p.valid);
        assert!(!p.observable);
    }
}
