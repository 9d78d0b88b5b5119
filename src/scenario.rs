//! Batch pathfinding over `.map`/`.scenario` pairs from the moving-AI
//! benchmark suite, emitting one CSV result row per experiment.

use crate::expander::AnyaExpander;
use crate::grid::{BitpackedGrid, GridError};
use crate::grid_astar::GridAStarExpander;
use crate::point::Point;
use crate::search::Search;
use log::info;
use std::io::BufRead;
use std::time::Instant;
use thiserror::Error;

/// Times a closure, doubling the repetition count until the measured
/// window clears the timer's millisecond resolution, then reports both
/// the wall-clock cost of the whole benchmark and the average per-run
/// cost in microseconds.
struct MicroBenchmark;

impl MicroBenchmark {
    fn run<F: FnMut()>(mut f: F, reps: u32) -> (f64, f64) {
        let wall_start = Instant::now();
        let start = Instant::now();
        for _ in 0..reps {
            f();
        }
        let total = start.elapsed();

        if total.as_millis() == 0 {
            return Self::run(f, reps * 2);
        }

        let avg_time_micro = total.as_nanos() as f64 / 1000.0 / f64::from(reps);
        let wallt_micro = wall_start.elapsed().as_nanos() as f64 / 1000.0 + 0.5;
        (wallt_micro, avg_time_micro)
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to load map {0:?}: {1}")]
    Map(String, #[source] GridError),

    #[error("scenario file is empty")]
    Empty,
}

/// A single start/target query parsed from a `.scenario` line, along with
/// the bucket metadata the format carries (map name, optimal cost).
#[derive(Debug, Clone)]
pub struct Experiment {
    pub title: String,
    pub map_file: String,
    pub x_size: i32,
    pub y_size: i32,
    pub start: Point,
    pub target: Point,
    pub upper_bound: f64,
}

/// Parses `.scenario` files in the moving-AI format: a `version` line
/// followed by whitespace-separated rows of
/// `bucket map width height start_x start_y end_x end_y optimal_cost`.
pub struct ExperimentLoader;

/// Loads the octile map named by `map_file` (the field every [`Experiment`]
/// in a scenario shares), wrapping [`GridError`] with the map's name.
pub fn load_map<R: BufRead>(map_file: &str, reader: R) -> Result<BitpackedGrid, ScenarioError> {
    BitpackedGrid::load_octile(reader).map_err(|e| ScenarioError::Map(map_file.to_string(), e))
}

impl ExperimentLoader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub fn load_experiments<R: BufRead>(&self, reader: R) -> Result<Vec<Experiment>, ScenarioError> {
        let mut lines = reader.lines();
        lines.next().ok_or(ScenarioError::Empty)??;

        let mut experiments = Vec::new();
        let mut counter = 0usize;

        for (line_no, line) in lines.enumerate() {
            let line = line?;
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            let tokens: Vec<&str> = text.split_whitespace().collect();
            if tokens.len() != 9 {
                continue;
            }

            let parsed = (|| -> Option<Experiment> {
                counter += 1;
                Some(Experiment {
                    title: format!("Experiment #{counter}"),
                    map_file: tokens[1].to_string(),
                    x_size: tokens[2].parse().ok()?,
                    y_size: tokens[3].parse().ok()?,
                    start: Point::new(tokens[4].parse().ok()?, tokens[5].parse().ok()?),
                    target: Point::new(tokens[6].parse().ok()?, tokens[7].parse().ok()?),
                    upper_bound: tokens[8].parse().ok()?,
                })
            })();

            match parsed {
                Some(exp) => experiments.push(exp),
                None => {
                    log::debug!("skipping malformed scenario line {}: {:?}", line_no + 2, text);
                    continue;
                }
            }
        }

        Ok(experiments)
    }
}

impl Default for ExperimentLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Which search to run a batch of experiments through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Anya,
    AStar,
}

impl Algorithm {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Anya => "AnyaSearch",
            Algorithm::AStar => "AStar",
        }
    }
}

/// One CSV result row, mirroring the semicolon-separated experiment
/// header: `exp;path_found;alg;wallt_micro;runt_micro;expanded;generated;
/// heapops;start;target;gridcost;realcost;map`.
#[derive(Debug, Clone)]
pub struct ExperimentResult {
    pub title: String,
    pub path_found: bool,
    pub algorithm: &'static str,
    pub wallt_micro: f64,
    pub runt_micro: f64,
    pub expanded: u64,
    pub generated: u64,
    pub heap_ops: u64,
    pub start: Point,
    pub target: Point,
    pub upper_bound: f64,
    pub cost: f64,
    pub map_file: String,
}

impl ExperimentResult {
    pub const HEADER: &'static str = "exp;path_found;alg;wallt_micro;runt_micro;expanded;generated;\
heapops;start;target;gridcost;realcost;map";
}

impl std::fmt::Display for ExperimentResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{};{};{};{};{};{};{};{};({},{});({},{});{};{};{}",
            self.title,
            self.path_found,
            self.algorithm,
            self.wallt_micro,
            self.runt_micro,
            self.expanded,
            self.generated,
            self.heap_ops,
            self.start.x(),
            self.start.y(),
            self.target.x(),
            self.target.y(),
            self.upper_bound,
            self.cost,
            self.map_file,
        )
    }
}

/// Runs every [`Experiment`] in a scenario against a loaded grid with the
/// chosen algorithm, yielding one [`ExperimentResult`] per experiment.
pub struct ScenarioRunner;

impl ScenarioRunner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub fn run<'a>(
        &self,
        grid: &'a BitpackedGrid,
        experiments: &'a [Experiment],
        algorithm: Algorithm,
    ) -> impl Iterator<Item = ExperimentResult> + 'a {
        info!("running {} experiments with {:?}", experiments.len(), algorithm);
        experiments.iter().map(move |exp| match algorithm {
            Algorithm::Anya => Self::run_anya(grid, exp),
            Algorithm::AStar => Self::run_astar(grid, exp),
        })
    }

    fn run_anya(grid: &BitpackedGrid, exp: &Experiment) -> ExperimentResult {
        let mut expander = AnyaExpander::new(grid, exp.target);
        let mut search = Search::new();
        let mut cost = -1.0;
        let (wallt_micro, runt_micro) = MicroBenchmark::run(
            || cost = search.search_costonly(&mut expander, exp.start, exp.target),
            1,
        );

        ExperimentResult {
            title: exp.title.clone(),
            path_found: search.path_found,
            algorithm: Algorithm::Anya.name(),
            wallt_micro,
            runt_micro,
            expanded: search.expanded,
            generated: search.generated,
            heap_ops: search.heap_ops,
            start: exp.start,
            target: exp.target,
            upper_bound: exp.upper_bound,
            cost,
            map_file: exp.map_file.clone(),
        }
    }

    fn run_astar(grid: &BitpackedGrid, exp: &Experiment) -> ExperimentResult {
        let mut expander = GridAStarExpander::new(grid);
        let reachable = expander.validate_instance(exp.start, exp.target);

        let mut path_found = false;
        let mut cost = -1.0;
        let mut expanded = 0;
        let mut generated = 0;
        let mut heap_ops = 0;

        let (wallt_micro, runt_micro) = MicroBenchmark::run(
            || {
                if reachable {
                    (path_found, cost, expanded, generated, heap_ops) =
                        grid_astar_search(&mut expander, exp.start, exp.target);
                }
            },
            1,
        );

        ExperimentResult {
            title: exp.title.clone(),
            path_found,
            algorithm: Algorithm::AStar.name(),
            wallt_micro,
            runt_micro,
            expanded,
            generated,
            heap_ops,
            start: exp.start,
            target: exp.target,
            upper_bound: exp.upper_bound,
            cost,
            map_file: exp.map_file.clone(),
        }
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Dijkstra-style best-first search over [`GridAStarExpander`]'s 8-connected
/// successors, kept separate from [`Search`] since its payload has no
/// interval to check for goal containment, only point equality.
fn grid_astar_search(
    expander: &mut GridAStarExpander<'_>,
    start: Point,
    target: Point,
) -> (bool, f64, u64, u64, u64) {
    use crate::fib_heap::FibonacciHeap;
    use fxhash::FxHashMap;

    struct Entry {
        point: Point,
        parent: Option<usize>,
        g: f64,
    }

    let mut open: FibonacciHeap<Entry> = FibonacciHeap::new();
    let mut best_g: FxHashMap<i64, f64> = FxHashMap::default();

    let mut expanded = 0u64;
    let mut generated = 1u64;
    let mut heap_ops = 0u64;

    let start_h = start.distance_to(target);
    let start_handle = open.insert(
        Entry {
            point: start,
            parent: None,
            g: 0.0,
        },
        start_h,
        0.0,
    );
    best_g.insert(expander.hash(start), 0.0);
    let _ = start_handle;

    while let Some(current) = open.remove_min() {
        heap_ops += 1;
        let (point, g) = {
            let node = open.get(current);
            (node.point, node.g)
        };

        let current_hash = expander.hash(point);
        if let Some(&known) = best_g.get(&current_hash) {
            if known < g {
                continue;
            }
        }

        if point == target {
            return (true, g, expanded, generated, heap_ops);
        }

        expander.expand(point);
        expanded += 1;

        while expander.has_next() {
            let next = expander.next().expect("has_next guarantees a neighbor");
            generated += 1;
            let step = expander.step_cost();
            let new_g = g + step;
            let hash = expander.hash(next);

            let improves = match best_g.get(&hash) {
                Some(&known) => new_g < known - 1e-9,
                None => true,
            };
            if improves {
                best_g.insert(hash, new_g);
                open.insert(
                    Entry {
                        point: next,
                        parent: Some(current),
                        g: new_g,
                    },
                    new_g + next.distance_to(target),
                    new_g,
                );
                heap_ops += 1;
            }
        }
    }

    (false, -1.0, expanded, generated, heap_ops)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn loads_well_formed_scenario_lines() {
        let text = "version 1\n\
                     0\tmaze.map\t64\t64\t1\t1\t10\t10\t12.727922\n\
                     0\tmaze.map\t64\t64\t2\t2\t20\t20\t25.455844\n";
        let loader = ExperimentLoader::new();
        let experiments = loader.load_experiments(Cursor::new(text)).unwrap();
        assert_eq!(experiments.len(), 2);
        assert_eq!(experiments[0].map_file, "maze.map");
        assert_eq!(experiments[0].start, Point::new(1, 1));
        assert_eq!(experiments[0].target, Point::new(10, 10));
        assert!((experiments[1].upper_bound - 25.455844).abs() < 1e-6);
    }

    #[test]
    fn skips_malformed_token_counts() {
        let text = "version 1\nshort line\n0\tm.map\t4\t4\t0\t0\t1\t1\t1.0\n";
        let loader = ExperimentLoader::new();
        let experiments = loader.load_experiments(Cursor::new(text)).unwrap();
        assert_eq!(experiments.len(), 1);
    }

    #[test]
    fn skips_nine_token_lines_with_unparseable_numeric_fields() {
        let text = "version 1\n\
                     0\tm.map\tNaN\t4\t0\t0\t1\t1\t1.0\n\
                     0\tm.map\t4\t4\t0\t0\t1\t1\t1.0\n";
        let loader = ExperimentLoader::new();
        let experiments = loader.load_experiments(Cursor::new(text)).unwrap();
        assert_eq!(experiments.len(), 1);
        assert_eq!(experiments[0].target, Point::new(1, 1));
    }

    #[test]
    fn empty_scenario_file_errors() {
        let loader = ExperimentLoader::new();
        let err = loader.load_experiments(Cursor::new(""));
        assert!(err.is_err());
    }

    #[test]
    fn result_row_formats_as_semicolon_separated_fields() {
        let result = ExperimentResult {
            title: "Experiment #1".to_string(),
            path_found: true,
            algorithm: "AnyaSearch",
            wallt_micro: 12.5,
            runt_micro: 12.0,
            expanded: 3,
            generated: 7,
            heap_ops: 10,
            start: Point::new(0, 0),
            target: Point::new(5, 5),
            upper_bound: 7.07,
            cost: 7.07,
            map_file: "maze.map".to_string(),
        };
        let line = result.to_string();
        assert!(line.starts_with(
            "Experiment #1;true;AnyaSearch;12.5;12;3;7;10;(0,0);(5,5);7.07;7.07;maze.map"
        ));
    }

    #[test]
    fn load_map_wraps_grid_error_with_map_name() {
        let bad = "type octagon\n";
        let err = load_map("bad.map", Cursor::new(bad)).unwrap_err();
        match err {
            ScenarioError::Map(name, _) => assert_eq!(name, "bad.map"),
            other => panic!("expected ScenarioError::Map, got {other:?}"),
        }
    }

    #[test]
    fn runner_produces_one_result_per_experiment() {
        let mut grid = BitpackedGrid::new(10, 10);
        for y in 0..10 {
            for x in 0..10 {
                grid.set_cell(x, y, true);
            }
        }
        let experiments = vec![Experiment {
            title: "Experiment #1".to_string(),
            map_file: "open.map".to_string(),
            x_size: 10,
            y_size: 10,
            start: Point::new(0, 0),
            target: Point::new(5, 0),
            upper_bound: 5.0,
        }];

        let runner = ScenarioRunner::new();
        let results: Vec<_> = runner.run(&grid, &experiments, Algorithm::Anya).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].path_found);
        assert!((results[0].cost - 5.0).abs() < 1e-6);

        let astar_results: Vec<_> = runner.run(&grid, &experiments, Algorithm::AStar).collect();
        assert!(astar_results[0].path_found);
        assert!((astar_results[0].cost - 5.0).abs() < 1e-6);
    }
}
