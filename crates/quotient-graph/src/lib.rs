//! `quotient-graph` – roadmap storage shared by every level.
//!
//! # Modules
//!
//! - [`roadmap`] – [`Roadmap`][roadmap::Roadmap]: arena of
//!   [`Configuration`][roadmap::Configuration]s with weighted edges,
//!   nearest-neighbour queries and shortest paths.
//! - [`disjoint_sets`] – [`DisjointSets`][disjoint_sets::DisjointSets]:
//!   union-find tracking the roadmap's connected components.
//! - [`problem`] – [`ProblemDefinition`][problem::ProblemDefinition]: start,
//!   goal and the solution paths found for them.
//! - [`planner_data`] – [`PlannerData`][planner_data::PlannerData]: roadmaps
//!   of several levels exported in one serialisable graph.

pub mod disjoint_sets;
pub mod planner_data;
pub mod problem;
pub mod roadmap;

pub use disjoint_sets::DisjointSets;
pub use planner_data::{PlannerData, PlannerEdge, PlannerVertex};
pub use problem::{ProblemDefinition, SolutionPath};
pub use roadmap::{ConfigId, Configuration, Edge, Roadmap};
