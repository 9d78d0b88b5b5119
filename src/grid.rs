use crate::constants::{LOG2_BITS_PER_WORD, PADDING};
use std::io::BufRead;
use thiserror::Error;

/// Errors surfaced while parsing an octile map file. Confined to the
/// loading boundary; never raised mid-search.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("map I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unrecognized map header: expected 'type octile', got {0:?}")]
    UnrecognizedType(String),

    #[error("malformed map dimension line: {0:?}")]
    MalformedDimension(String),

    #[error("map declares height {declared} but only {actual} row(s) were read")]
    TruncatedRows { declared: i32, actual: i32 },

    #[error("map row {row} has width {actual}, expected {expected}")]
    RowWidthMismatch {
        row: i32,
        actual: usize,
        expected: i32,
    },
}

/// A grid of traversable/blocked cells, bitpacked one bit per cell (and
/// per discrete-point classifier) into 32-bit words, with a two-cell
/// blocked padding ring on every side so scans never need bounds checks.
#[derive(Debug)]
pub struct BitpackedGrid {
    map_width_original: i32,
    map_height_original: i32,
    map_width: i32,
    map_height: i32,
    map_width_in_words: i32,
    smallest_step: f64,
    smallest_step_div2: f64,
    cells: Vec<u32>,
    visible: Vec<u32>,
    corner: Vec<u32>,
    double_corner: Vec<u32>,
}

impl BitpackedGrid {
    /// Build an all-blocked grid of the given original dimensions.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        let map_width_in_words = (width >> LOG2_BITS_PER_WORD) + 1;
        let map_width = map_width_in_words << LOG2_BITS_PER_WORD;
        let map_height = height + 2 * PADDING;
        let map_size = ((map_height * map_width) >> LOG2_BITS_PER_WORD) as usize;

        Self {
            map_width_original: width,
            map_height_original: height,
            map_width,
            map_height,
            map_width_in_words,
            smallest_step: 1.0 / (map_width.max(map_height) as f64),
            smallest_step_div2: 0.5 / (map_width.max(map_height) as f64),
            cells: vec![0; map_size],
            visible: vec![0; map_size],
            corner: vec![0; map_size],
            double_corner: vec![0; map_size],
        }
    }

    #[inline]
    pub fn map_width(&self) -> i32 {
        self.map_width
    }

    #[inline]
    pub fn map_height(&self) -> i32 {
        self.map_height
    }

    #[inline]
    pub fn map_width_original(&self) -> i32 {
        self.map_width_original
    }

    #[inline]
    pub fn map_height_original(&self) -> i32 {
        self.map_height_original
    }

    #[inline]
    pub fn smallest_step(&self) -> f64 {
        self.smallest_step
    }

    #[inline]
    pub fn smallest_step_div2(&self) -> f64 {
        self.smallest_step_div2
    }

    /// Number of traversable cells within the original (unpadded) bounds.
    #[must_use]
    pub fn num_traversable_cells(&self) -> i32 {
        let mut count = 0;
        for y in 0..self.map_height_original {
            for x in 0..self.map_width_original {
                if self.cell_traversable(x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    #[inline]
    fn map_id(&self, x: i32, y: i32) -> i32 {
        (y + PADDING) * self.map_width + (x + PADDING)
    }

    #[inline]
    fn get_bit(words: &[u32], id: i32) -> bool {
        let word = (id >> LOG2_BITS_PER_WORD) as usize;
        let bit = (id & (crate::constants::INDEX_MASK)) as u32;
        (words[word] >> bit) & 1 != 0
    }

    #[inline]
    fn set_bit(words: &mut [u32], id: i32, value: bool) {
        let word = (id >> LOG2_BITS_PER_WORD) as usize;
        let mask = 1u32 << (id & crate::constants::INDEX_MASK) as u32;
        if value {
            words[word] |= mask;
        } else {
            words[word] &= !mask;
        }
    }

    #[inline]
    #[must_use]
    pub fn cell_traversable(&self, cx: i32, cy: i32) -> bool {
        Self::get_bit(&self.cells, self.map_id(cx, cy))
    }

    #[inline]
    #[must_use]
    pub fn point_visible(&self, x: i32, y: i32) -> bool {
        Self::get_bit(&self.visible, self.map_id(x, y))
    }

    #[inline]
    #[must_use]
    pub fn point_corner(&self, x: i32, y: i32) -> bool {
        Self::get_bit(&self.corner, self.map_id(x, y))
    }

    #[inline]
    #[must_use]
    pub fn point_double_corner(&self, x: i32, y: i32) -> bool {
        Self::get_bit(&self.double_corner, self.map_id(x, y))
    }

    /// Set the traversability of cell `(cx, cy)` and recompute the
    /// visible/corner/double-corner classifiers of its four corner points.
    pub fn set_cell(&mut self, cx: i32, cy: i32, value: bool) {
        let id = self.map_id(cx, cy);
        Self::set_bit(&mut self.cells, id, value);
        self.update_point(cx, cy);
        self.update_point(cx + 1, cy);
        self.update_point(cx, cy + 1);
        self.update_point(cx + 1, cy + 1);
    }

    fn update_point(&mut self, px: i32, py: i32) {
        let nw = self.cell_traversable(px - 1, py - 1);
        let ne = self.cell_traversable(px, py - 1);
        let sw = self.cell_traversable(px - 1, py);
        let se = self.cell_traversable(px, py);

        let corner = ((!nw || !se) && sw && ne) || ((!ne || !sw) && nw && se);
        let double_corner = ((!nw && !se) && sw && ne) != ((!sw && !ne) && nw && se);
        let visible = nw || ne || sw || se;

        let id = self.map_id(px, py);
        Self::set_bit(&mut self.corner, id, corner);
        Self::set_bit(&mut self.double_corner, id, double_corner);
        Self::set_bit(&mut self.visible, id, visible);
    }

    /// Starting at cell `(x, y)`, return the x of the first blocked cell
    /// reached moving rightward along row `y`.
    #[must_use]
    pub fn scan_cells_right(&self, x: i32, y: i32) -> i32 {
        let tile_id = self.map_id(x, y);
        let mut t_index = tile_id >> LOG2_BITS_PER_WORD;
        let start_bit_index = tile_id & crate::constants::INDEX_MASK;

        let mask = !((1u32 << start_bit_index).wrapping_sub(1));
        let mut obstacles = !self.cells[t_index as usize] & mask;

        let start_index = t_index;
        let stop_pos;
        loop {
            if obstacles != 0 {
                stop_pos = obstacles.trailing_zeros() as i32;
                break;
            }
            t_index += 1;
            obstacles = !self.cells[t_index as usize];
        }

        x + (t_index - start_index) * 32 + stop_pos - start_bit_index
    }

    /// Starting at cell `(x, y)`, return the x of the first blocked cell
    /// reached moving leftward along row `y`.
    #[must_use]
    pub fn scan_cells_left(&self, x: i32, y: i32) -> i32 {
        let tile_id = self.map_id(x, y);
        let mut t_index = tile_id >> LOG2_BITS_PER_WORD;
        let start_bit_index = tile_id & crate::constants::INDEX_MASK;
        let opposite_index = 32 - (start_bit_index + 1);

        let mut mask = 1u32 << start_bit_index;
        mask |= mask.wrapping_sub(1);
        let mut obstacles = !self.cells[t_index as usize] & mask;

        let start_index = t_index;
        let stop_pos;
        loop {
            if obstacles != 0 {
                stop_pos = obstacles.leading_zeros() as i32;
                break;
            }
            t_index -= 1;
            obstacles = !self.cells[t_index as usize];
        }

        x - ((start_index - t_index) * 32 + stop_pos - opposite_index)
    }

    /// Along the lattice between rows `row-1` and `row`, return the x of
    /// the next discrete point right of `x` that is a corner, or the last
    /// traversable point before a cell obstacle in either adjacent row.
    #[must_use]
    pub fn scan_right(&self, x: f64, row: i32) -> i32 {
        let left_of_x = (x + self.smallest_step_div2) as i32;
        let tile_id = self.map_id(left_of_x, row);
        let mut t_index = tile_id >> LOG2_BITS_PER_WORD;
        let mut ta_index = t_index - self.map_width_in_words;

        let mut obstacles = !self.cells[t_index as usize] & !self.cells[ta_index as usize];
        let mut corners = self.corner[t_index as usize];

        let start_bit_index = tile_id & crate::constants::INDEX_MASK;
        let mask = 1u32 << start_bit_index;
        corners &= !(mask | mask.wrapping_sub(1));
        obstacles &= !mask.wrapping_sub(1);

        let start_index = t_index;
        let stop_pos;
        loop {
            let value = corners | obstacles;
            if value != 0 {
                stop_pos = value.trailing_zeros() as i32;
                break;
            }
            t_index += 1;
            ta_index += 1;
            corners = self.corner[t_index as usize];
            obstacles = !self.cells[t_index as usize] & !self.cells[ta_index as usize];
        }

        left_of_x + (t_index - start_index) * 32 + stop_pos - start_bit_index
    }

    /// Symmetric to [`Self::scan_right`]; if the nearest integer at or
    /// below `x` is already a corner, returns it immediately.
    #[must_use]
    pub fn scan_left(&self, x: f64, row: i32) -> i32 {
        let left_of_x = x as i32;
        if (x - left_of_x as f64) >= self.smallest_step && self.point_corner(left_of_x, row) {
            return left_of_x;
        }

        let tile_id = self.map_id(left_of_x, row);
        let mut t_index = tile_id >> LOG2_BITS_PER_WORD;
        let mut ta_index = t_index - self.map_width_in_words;

        let mut obstacles = !self.cells[t_index as usize] & !self.cells[ta_index as usize];
        let mut corners = self.corner[t_index as usize];

        let start_bit_index = tile_id & crate::constants::INDEX_MASK;
        let mask = (1u32 << start_bit_index).wrapping_sub(1);
        corners &= mask;
        obstacles &= mask;

        let start_index = t_index;
        let stop_pos;
        loop {
            let value = corners | obstacles;
            if value != 0 {
                stop_pos = (corners.leading_zeros() as i32 + 1).min(obstacles.leading_zeros() as i32);
                break;
            }
            t_index -= 1;
            ta_index -= 1;
            corners = self.corner[t_index as usize];
            obstacles = !self.cells[t_index as usize] & !self.cells[ta_index as usize];
        }

        left_of_x - ((start_index - t_index) * 32 + stop_pos) + (32 - start_bit_index)
    }

    /// Parse an octile-format map (see the crate's external interface
    /// documentation) from `reader`.
    pub fn load_octile<R: BufRead>(mut reader: R) -> Result<Self, GridError> {
        let mut line = String::new();

        reader.read_line(&mut line)?;
        let map_type = line.trim();
        if map_type != "type octile" {
            return Err(GridError::UnrecognizedType(map_type.to_string()));
        }

        line.clear();
        reader.read_line(&mut line)?;
        let height = parse_dimension_line(&line, "height")?;

        line.clear();
        reader.read_line(&mut line)?;
        let width = parse_dimension_line(&line, "width")?;

        line.clear();
        reader.read_line(&mut line)?;
        if line.trim() != "map" {
            return Err(GridError::MalformedDimension(line.trim().to_string()));
        }

        log::debug!("loading {width}x{height} octile map");

        let mut grid = Self::new(width, height);
        for y in 0..height {
            line.clear();
            let bytes_read = reader.read_line(&mut line)?;
            if bytes_read == 0 {
                return Err(GridError::TruncatedRows {
                    declared: height,
                    actual: y,
                });
            }
            let row = line.trim_end_matches(['\n', '\r']);
            let chars: Vec<char> = row.chars().collect();
            if chars.len() < width as usize {
                return Err(GridError::RowWidthMismatch {
                    row: y,
                    actual: chars.len(),
                    expected: width,
                });
            }
            for x in 0..width {
                let traversable = matches!(chars[x as usize], '.' | 'G');
                grid.set_cell(x, y, traversable);
            }
        }

        log::debug!(
            "map loaded: {} traversable cell(s) of {}",
            grid.num_traversable_cells(),
            width * height
        );
        Ok(grid)
    }
}

fn parse_dimension_line(line: &str, key: &str) -> Result<i32, GridError> {
    let mut parts = line.trim().split_whitespace();
    let found_key = parts.next().unwrap_or_default();
    let value = parts.next().unwrap_or_default();
    if found_key != key {
        return Err(GridError::MalformedDimension(line.trim().to_string()));
    }
    value
        .parse::<i32>()
        .map_err(|_| GridError::MalformedDimension(line.trim().to_string()))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

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
    fn update_point_flags_a_single_blocked_cell_as_corner() {
        let mut g = open_grid(4, 4);
        g.set_cell(2, 2, false);
        assert!(g.point_corner(2, 2));
        assert!(g.point_corner(3, 2));
        assert!(g.point_corner(2, 3));
        assert!(g.point_corner(3, 3));
    }

    #[test]
    fn diagonal_pinch_is_a_double_corner() {
        // .@
        // @.
        let mut g = BitpackedGrid::new(2, 2);
        g.set_cell(0, 0, true);
        g.set_cell(1, 0, false);
        g.set_cell(0, 1, false);
        g.set_cell(1, 1, true);
        assert!(g.point_double_corner(1, 1));
        assert!(g.point_corner(1, 1));
    }

    #[test]
    fn scan_cells_right_stops_at_wall() {
        let mut g = open_grid(10, 1);
        g.set_cell(6, 0, false);
        assert_eq!(g.scan_cells_right(0, 0), 6);
    }

    #[test]
    fn scan_cells_left_stops_at_wall() {
        let mut g = open_grid(10, 1);
        g.set_cell(3, 0, false);
        assert_eq!(g.scan_cells_left(9, 0), 3);
    }

    #[test]
    fn scan_round_trip_inside_an_open_run() {
        let g = open_grid(20, 20);
        for y in 0..20 {
            for x in 2..18 {
                let wall = g.scan_cells_left(x, y);
                assert_eq!(g.scan_cells_right(wall, y) - 1, x);
            }
        }
    }

    #[test]
    fn load_octile_parses_header_and_rows() {
        let data = "type octile\nheight 3\nwidth 3\nmap\n...\n.@.\n...\n";
        let grid = BitpackedGrid::load_octile(Cursor::new(data)).unwrap();
        assert_eq!(grid.map_width_original(), 3);
        assert_eq!(grid.map_height_original(), 3);
        assert!(grid.cell_traversable(0, 0));
        assert!(!grid.cell_traversable(1, 1));
    }

    #[test]
    fn load_octile_rejects_unknown_type() {
        let data = "type quad\nheight 3\nwidth 3\nmap\n...\n...\n...\n";
        let err = BitpackedGrid::load_octile(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, GridError::UnrecognizedType(_)));
    }
}
