//! End-to-end scenarios against the public API, covering the handful of
//! 3x3 grids sized to exercise routing-around-an-obstacle, an unreachable
//! blocked target, a single-corridor flat expansion, and a double-corner
//! pinch start with no successors.

use anya_search::{AnyaExpander, BitpackedGrid, Point, Search};

fn grid_from_rows(rows: &[&str]) -> BitpackedGrid {
    let height = rows.len() as i32;
    let width = rows[0].len() as i32;
    let mut grid = BitpackedGrid::new(width, height);
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            grid.set_cell(x as i32, y as i32, ch == '.');
        }
    }
    grid
}

#[test]
fn s1_all_free_diagonal_shortcut() {
    let grid = grid_from_rows(&["...", "...", "..."]);
    let start = Point::new(0, 0);
    let target = Point::new(2, 2);
    let mut expander = AnyaExpander::new(&grid, target);
    let mut search = Search::new();
    let cost = search.search_costonly(&mut expander, start, target);

    assert!(search.path_found);
    assert!((cost - 2.0 * std::f64::consts::SQRT_2).abs() < 1e-6);
}

#[test]
fn s2_row_of_obstacles_routes_around_right_column() {
    let grid = grid_from_rows(&["...", "@@.", "..."]);
    let start = Point::new(0, 0);
    let target = Point::new(0, 2);
    let mut expander = AnyaExpander::new(&grid, target);
    let mut search = Search::new();
    let cost = search.search_costonly(&mut expander, start, target);

    assert!(search.path_found);
    let expected = 2.0 * (2.0_f64.powi(2) + 1.0_f64.powi(2)).sqrt();
    assert!((cost - expected).abs() < 1e-6);
}

#[test]
fn s3_blocked_target_is_unreachable() {
    let grid = grid_from_rows(&["...", ".@.", "..."]);
    let start = Point::new(0, 0);
    let target = Point::new(1, 1);
    let mut expander = AnyaExpander::new(&grid, target);
    let mut search = Search::new();
    let cost = search.search_costonly(&mut expander, start, target);

    assert!(!search.path_found);
    assert!(cost < 0.0);
}

#[test]
fn s4_single_corridor_flat_expansion() {
    let grid = grid_from_rows(&[".....", ".....", "....."]);
    let start = Point::new(0, 1);
    let target = Point::new(4, 1);
    let mut expander = AnyaExpander::new(&grid, target);
    let mut search = Search::new();
    let cost = search.search_costonly(&mut expander, start, target);

    assert!(search.path_found);
    assert!((cost - 4.0).abs() < 1e-6);
}

#[test]
fn s5_double_corner_pinch_start_has_no_successors() {
    let grid = grid_from_rows(&[".@", "@."]);
    let start = Point::new(1, 1);
    let target = Point::new(0, 0);
    let mut expander = AnyaExpander::new(&grid, target);
    let mut search = Search::new();
    let cost = search.search_costonly(&mut expander, start, target);

    assert!(!search.path_found);
    assert!(cost < 0.0);
}
