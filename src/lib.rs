//! anya_search
//! ===========
//!
//! An any-angle shortest-path engine on a uniform grid, implementing the
//! interval-based Anya best-first search. States are pairs of a root
//! point and an interval on a grid row rather than individual cells, so
//! a single search node can represent an unbounded number of taut paths
//! at once.
//!
//! [`grid::BitpackedGrid`] holds the map, bitpacked one bit per cell with
//! a blocked padding ring so scans never need bounds checks.
//! [`expander::AnyaExpander`] generates successor `(root, interval)`
//! states from a grid; [`search::Search`] drives the best-first loop over
//! [`fib_heap::FibonacciHeap`] using [`heuristic::get_value`] to order the
//! open list. [`grid_astar::GridAStarExpander`] is a degenerate
//! 8-connected expander kept for cost comparisons against the any-angle
//! search, and [`scenario`] batches both over moving-AI `.map`/`.scenario`
//! file pairs.

mod constants;
mod expander;
mod fib_heap;
mod grid;
mod grid_astar;
mod heuristic;
mod interval;
mod node;
mod point;
mod projection;
mod scenario;
mod search;

pub use self::{
    constants::EPSILON,
    expander::AnyaExpander,
    fib_heap::{FibonacciHeap, Handle},
    grid::{BitpackedGrid, GridError},
    grid_astar::GridAStarExpander,
    heuristic::HeuristicFn,
    interval::Interval,
    node::SearchNode,
    point::Point,
    scenario::{
        load_map, Algorithm, Experiment, ExperimentLoader, ExperimentResult, ScenarioError,
        ScenarioRunner,
    },
    search::{Path, Search},
};
