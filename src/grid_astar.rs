use crate::constants::ROOT_TWO;
use crate::grid::BitpackedGrid;
use crate::point::Point;

/// A degenerate 8-connected grid expander, kept alongside the Anya
/// expander so a caller can run plain grid-A* over the same
/// [`BitpackedGrid`] and compare path cost and node counts against the
/// any-angle search.
pub struct GridAStarExpander<'g> {
    grid: &'g BitpackedGrid,
    start: Point,
    neighbors: Vec<(Point, f64)>,
    idx: usize,
}

impl<'g> GridAStarExpander<'g> {
    #[must_use]
    pub fn new(grid: &'g BitpackedGrid) -> Self {
        Self {
            grid,
            start: Point::ZERO,
            neighbors: Vec::with_capacity(8),
            idx: 0,
        }
    }

    #[must_use]
    pub fn validate_instance(&mut self, start: Point, target: Point) -> bool {
        self.start = start;
        self.grid.cell_traversable(start.x(), start.y())
            && self.grid.cell_traversable(target.x(), target.y())
    }

    pub fn expand(&mut self, v: Point) {
        self.neighbors.clear();
        self.idx = 0;

        let (x, y) = (v.x(), v.y());
        if self.grid.point_double_corner(x, y) {
            if v == self.start {
                self.expand_start_double_corner(v);
            }
            return;
        }

        let se = self.grid.cell_traversable(x, y);
        let sw = self.grid.cell_traversable(x - 1, y);
        let nw = self.grid.cell_traversable(x - 1, y - 1);
        let ne = self.grid.cell_traversable(x, y - 1);

        if ne {
            self.push(x + 1, y - 1, ROOT_TWO);
        }
        if se {
            self.push(x + 1, y + 1, ROOT_TWO);
        }
        if nw {
            self.push(x - 1, y - 1, ROOT_TWO);
        }
        if sw {
            self.push(x - 1, y + 1, ROOT_TWO);
        }
        if ne || se {
            self.push(x + 1, y, 1.0);
        }
        if nw || sw {
            self.push(x - 1, y, 1.0);
        }
        if ne || nw {
            self.push(x, y - 1, 1.0);
        }
        if se || sw {
            self.push(x, y + 1, 1.0);
        }
    }

    /// Doubly-corner-pinched cells are otherwise unreachable, but if the
    /// search starts on one, east and south cardinals plus the
    /// south-east diagonal are still meaningful moves.
    fn expand_start_double_corner(&mut self, v: Point) {
        let (x, y) = (v.x(), v.y());
        let se = self.grid.cell_traversable(x, y);
        let sw = self.grid.cell_traversable(x - 1, y);
        let ne = self.grid.cell_traversable(x, y - 1);

        if se {
            self.push(x + 1, y + 1, ROOT_TWO);
        }
        if ne || se {
            self.push(x + 1, y, 1.0);
        }
        if se || sw {
            self.push(x, y + 1, 1.0);
        }
    }

    fn push(&mut self, x: i32, y: i32, cost: f64) {
        self.neighbors.push((Point::new(x, y), cost));
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.idx < self.neighbors.len()
    }

    pub fn next(&mut self) -> Option<Point> {
        if self.idx < self.neighbors.len() {
            let (p, _) = self.neighbors[self.idx];
            self.idx += 1;
            Some(p)
        } else {
            None
        }
    }

    #[must_use]
    pub fn step_cost(&self) -> f64 {
        if self.idx == 0 {
            0.0
        } else {
            self.neighbors[self.idx - 1].1
        }
    }

    #[must_use]
    pub fn hash(&self, v: Point) -> i64 {
        v.y() as i64 * self.grid.map_width() as i64 + v.x() as i64
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
    fn interior_cell_has_all_eight_neighbors() {
        let grid = open_grid(10, 10);
        let mut expander = GridAStarExpander::new(&grid);
        expander.validate_instance(Point::new(5, 5), Point::new(5, 5));
        expander.expand(Point::new(5, 5));

        let mut count = 0;
        while expander.has_next() {
            expander.next();
            count += 1;
        }
        assert_eq!(count, 8);
    }

    #[test]
    fn wall_blocks_the_corresponding_diagonal_and_cardinals() {
        let mut grid = open_grid(10, 10);
        grid.set_cell(6, 5, false);
        let mut expander = GridAStarExpander::new(&grid);
        expander.validate_instance(Point::new(5, 5), Point::new(5, 5));
        expander.expand(Point::new(5, 5));

        let mut count = 0;
        while expander.has_next() {
            expander.next();
            count += 1;
        }
        assert!(count < 8);
    }
}
