use crate::constants::EPSILON;
use crate::expander::AnyaExpander;
use crate::fib_heap::{FibonacciHeap, Handle};
use crate::heuristic;
use crate::interval::Interval;
use crate::node::SearchNode;
use crate::point::Point;
use fxhash::FxHashMap;
use log::{debug, trace};

/// A solved route: the sequence of root points the search bent through,
/// each paired with the cumulative cost to reach it.
#[derive(Debug, Clone, Default)]
pub struct Path {
    vertices: Vec<(Point, f64)>,
}

impl Path {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Point, f64)> {
        self.vertices.iter()
    }

    #[must_use]
    pub fn cost(&self) -> f64 {
        self.vertices.last().map_or(-1.0, |(_, g)| *g)
    }
}

/// Tracks the best known cost to reach a root point, and which search
/// node currently represents it, so later successors that can't improve
/// on it are pruned instead of re-expanded.
struct RootRecord {
    handle: Handle,
    best_g: f64,
}

/// Drives the Anya best-first search loop over an [`AnyaExpander`].
///
/// A fresh [`Search`] can be reused across multiple `search_costonly`
/// calls; each call clears the open list and root-redundancy table.
pub struct Search {
    open: FibonacciHeap<SearchNode>,
    roots: FxHashMap<i64, RootRecord>,
    start_handle: Option<Handle>,
    goal_handle: Option<Handle>,
    pub expanded: u64,
    pub insertions: u64,
    pub generated: u64,
    pub heap_ops: u64,
    pub path_found: bool,
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

impl Search {
    #[must_use]
    pub fn new() -> Self {
        Self {
            open: FibonacciHeap::new(),
            roots: FxHashMap::default(),
            start_handle: None,
            goal_handle: None,
            expanded: 0,
            insertions: 0,
            generated: 0,
            heap_ops: 0,
            path_found: false,
        }
    }

    fn init(&mut self) {
        self.open = FibonacciHeap::new();
        self.roots.clear();
        self.start_handle = None;
        self.goal_handle = None;
        self.expanded = 0;
        self.insertions = 0;
        self.generated = 0;
        self.heap_ops = 0;
        self.path_found = false;
    }

    /// Returns the shortest-path cost from `start` to `target`, or `-1.0`
    /// if `target` is unreachable. Populates the expansion/generation
    /// counters regardless of outcome.
    pub fn search_costonly(
        &mut self,
        expander: &mut AnyaExpander<'_>,
        start: Point,
        target: Point,
    ) -> f64 {
        self.init();

        if !expander.validate_instance(start, target) {
            return -1.0;
        }

        let start_interval = Interval::new(start.x() as f64, start.x() as f64, start.y());
        let start_h = heuristic::get_value(start, &start_interval, target);

        let start_node = SearchNode::new(start_interval, start, None, 0.0);
        self.generated += 1;
        let start_handle = self.open.insert(start_node, start_h, 0.0);
        self.start_handle = Some(start_handle);
        self.roots.insert(
            expander.hash(start),
            RootRecord {
                handle: start_handle,
                best_g: 0.0,
            },
        );

        let mut cost = -1.0;

        while let Some(current) = self.open.remove_min() {
            self.heap_ops += 1;

            let current_root = self.open.get(current).root;
            let current_interval = self.open.get(current).interval;
            let current_g = self.open.get(current).g;

            let current_hash = expander.hash(current_root);
            if let Some(rep) = self.roots.get(&current_hash) {
                if rep.handle != current {
                    trace!("skipping stale open-list entry for root {:?}", current_root);
                    continue;
                }
            }

            let is_start = Some(current) == self.start_handle;
            expander.expand(current_root, &current_interval, is_start);
            self.expanded += 1;

            if current_interval.contains(target.x() as f64, target.y()) {
                self.path_found = true;
                self.goal_handle = Some(current);
                cost = current_g;
                debug!("path found: cost={cost}, expanded={}", self.expanded);
                break;
            }

            let p_hash = current_hash;

            while expander.has_next() {
                let succ = expander.next().expect("has_next guarantees a successor");
                self.generated += 1;

                let new_g_value = current_g + expander.step_cost(current_root, succ.root);
                let root_hash = expander.hash(succ.root);

                let mut insert = true;
                if let Some(rep) = self.roots.get(&root_hash) {
                    let root_best_g = rep.best_g;
                    let improves = new_g_value - root_best_g <= EPSILON;
                    let ties = new_g_value - root_best_g >= -EPSILON;
                    insert = improves;
                    if insert && ties {
                        if let Some(rep_parent) = self.open.get(rep.handle).parent {
                            let rep_parent_root = self.open.get(rep_parent).root;
                            let p_rep_hash = expander.hash(rep_parent_root);
                            insert = root_hash == p_hash || p_rep_hash == p_hash;
                        }
                    }
                }

                if insert {
                    let f_value = new_g_value + heuristic::get_value(succ.root, &succ.interval, target);
                    let node = SearchNode::new(succ.interval, succ.root, Some(current), new_g_value);
                    let handle = self.open.insert(node, f_value, new_g_value);
                    self.roots.insert(
                        root_hash,
                        RootRecord {
                            handle,
                            best_g: new_g_value,
                        },
                    );
                    self.heap_ops += 1;
                    self.insertions += 1;
                }
            }
        }

        cost
    }

    /// Runs [`Search::search_costonly`] then reconstructs the path by
    /// walking the parent chain backward from the node that matched
    /// `target`.
    pub fn search(&mut self, expander: &mut AnyaExpander<'_>, start: Point, target: Point) -> Path {
        let cost = self.search_costonly(expander, start, target);
        let mut path = Path::default();
        if cost < 0.0 {
            return path;
        }

        let mut current = self.goal_handle;
        let mut chain = Vec::new();
        while let Some(handle) = current {
            let node = self.open.get(handle);
            chain.push((node.root, node.g));
            current = node.parent;
        }
        chain.reverse();
        path.vertices = chain;
        path
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grid::BitpackedGrid;

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
    fn straight_line_path_costs_euclidean_distance() {
        let grid = open_grid(10, 10);
        let start = Point::new(0, 0);
        let target = Point::new(5, 0);
        let mut expander = AnyaExpander::new(&grid, target);
        let mut search = Search::new();
        let cost = search.search_costonly(&mut expander, start, target);
        assert!(cost >= 0.0);
        assert!((cost - 5.0).abs() < 1e-6);
    }

    #[test]
    fn unreachable_target_behind_a_fully_enclosed_wall_returns_negative_cost() {
        let mut grid = open_grid(10, 10);
        for x in 0..10 {
            grid.set_cell(x, 5, false);
        }
        let start = Point::new(0, 0);
        let target = Point::new(0, 9);
        let mut expander = AnyaExpander::new(&grid, target);
        let mut search = Search::new();
        let cost = search.search_costonly(&mut expander, start, target);
        assert!(cost < 0.0);
    }

    #[test]
    fn diagonal_path_is_shorter_than_grid_hugging_path() {
        let grid = open_grid(10, 10);
        let start = Point::new(0, 0);
        let target = Point::new(5, 5);
        let mut expander = AnyaExpander::new(&grid, target);
        let mut search = Search::new();
        let cost = search.search_costonly(&mut expander, start, target);
        assert!(cost >= 0.0);
        assert!((cost - 5.0 * std::f64::consts::SQRT_2).abs() < 1e-6);
    }
}
