//! `quotient-planner` – multilevel planning over a sequence of quotient
//! spaces.
//!
//! A [`LevelSequence`][sequence::LevelSequence] owns one level per space,
//! coarsest first, and decides which level grows next. Solutions of coarse
//! levels guide sampling on finer ones and, through the section search in
//! `quotient-section`, are often lifted directly into a solution of the next
//! level.
//!
//! # Modules
//!
//! - [`sequence`] – the orchestrator and its [`SequenceConfig`][sequence::SequenceConfig].
//! - [`level`] – the [`BundleLevel`][level::BundleLevel] trait.
//! - [`graph_level`] – [`GraphLevel`][graph_level::GraphLevel], the roadmap
//!   level used by the CLI.
//! - [`priority`] – level selection policies.
//! - [`termination`] – planner termination conditions.
//! - [`telemetry`] – tracing and OpenTelemetry setup.
//!
//! ```rust
//! use std::sync::Arc;
//! use quotient_bundle::ComponentFactory;
//! use quotient_planner::{IterationLimit, LevelConfig, LevelSequence, SequenceConfig};
//! use quotient_space::{SpaceInformation, StateSpace};
//! use quotient_types::{PlannerStatus, State};
//!
//! let spaces = vec![
//!     Arc::new(SpaceInformation::unconstrained(StateSpace::cube(1, 0.0, 1.0).unwrap())),
//!     Arc::new(SpaceInformation::unconstrained(StateSpace::cube(2, 0.0, 1.0).unwrap())),
//! ];
//! let level = LevelConfig { seed: Some(1), ..LevelConfig::default() };
//! let mut planner = LevelSequence::from_spaces(
//!     spaces,
//!     &ComponentFactory::new(),
//!     &level,
//!     SequenceConfig::default(),
//! )
//! .unwrap();
//! planner
//!     .set_problem(State::new(vec![0.1, 0.1]), State::new(vec![0.9, 0.9]), 1e-3)
//!     .unwrap();
//! let status = planner.solve(&IterationLimit::new(200)).unwrap();
//! assert_eq!(status, PlannerStatus::ExactSolution);
//! ```

pub mod graph_level;
pub mod level;
pub mod priority;
pub mod sequence;
pub mod telemetry;
pub mod termination;

pub use graph_level::{GraphLevel, LevelConfig};
pub use level::BundleLevel;
pub use priority::{Greedy, LevelPriority, PriorityKind, QueuedLevel, RoundRobin};
pub use sequence::{LevelSequence, SequenceConfig};
pub use termination::{AnyOf, CancellationFlag, FnCondition, IterationLimit, TerminationCondition, Timeout};
