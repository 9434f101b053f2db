//! `quotient-types` – shared vocabulary of the Quotient multilevel planner.
//!
//! Every other crate in the workspace speaks in terms of the types defined
//! here: flat coordinate [`State`]s, the [`PlannerStatus`] returned by a
//! solve, the [`SpaceShape`] descriptor used to pick a projection, and the
//! workspace-wide [`PlanError`].

use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point in some state space, stored as a flat vector of coordinates.
///
/// The owning space decides how the coordinates are laid out (e.g. an SE(2)
/// state is `[x, y, yaw]`, a compound state concatenates its slots).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(Vec<f64>);

impl State {
    /// Create a state from raw coordinates.
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// A state of `dimension` zero coordinates.
    pub fn zeros(dimension: usize) -> Self {
        Self(vec![0.0; dimension])
    }

    /// Overwrite this state with the coordinates of `other`.
    ///
    /// Both states must have the same dimension.
    pub fn copy_from(&mut self, other: &State) {
        self.0.copy_from_slice(&other.0);
    }

    /// Consume the state and return its coordinates.
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl Deref for State {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl DerefMut for State {
    fn deref_mut(&mut self) -> &mut [f64] {
        &mut self.0
    }
}

impl From<Vec<f64>> for State {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl From<&[f64]> for State {
    fn from(values: &[f64]) -> Self {
        Self(values.to_vec())
    }
}

/// Outcome of a planner `solve` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerStatus {
    /// A path connecting start and goal in the finest space was found.
    ExactSolution,
    /// A path was found that only approaches the goal.
    ApproximateSolution,
    /// The termination condition fired first, or solving stopped at a capped
    /// level below the finest one.
    Timeout,
    /// A level was proven to have no solution.
    Infeasible,
}

impl PlannerStatus {
    /// `true` for the two statuses that carry a path.
    pub fn has_solution(&self) -> bool {
        matches!(
            self,
            PlannerStatus::ExactSolution | PlannerStatus::ApproximateSolution
        )
    }
}

impl fmt::Display for PlannerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerStatus::ExactSolution => write!(f, "Exact solution"),
            PlannerStatus::ApproximateSolution => write!(f, "Approximate solution"),
            PlannerStatus::Timeout => write!(f, "Timeout"),
            PlannerStatus::Infeasible => write!(f, "Infeasible"),
        }
    }
}

/// Type tag of a state space, as seen by the projection factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceKind {
    RealVector,
    So2,
    Se2,
    Compound,
}

impl fmt::Display for SpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpaceKind::RealVector => write!(f, "R"),
            SpaceKind::So2 => write!(f, "SO2"),
            SpaceKind::Se2 => write!(f, "SE2"),
            SpaceKind::Compound => write!(f, "Compound"),
        }
    }
}

/// Structural descriptor of a state space: its type tag, its dimension, and
/// for compound spaces the descriptors of its slots.
///
/// Projections are chosen by pattern-matching on pairs of shapes, never on
/// concrete space values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceShape {
    pub kind: SpaceKind,
    pub dimension: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<SpaceShape>,
}

impl SpaceShape {
    /// Shape of a non-compound space.
    pub fn atomic(kind: SpaceKind, dimension: usize) -> Self {
        Self {
            kind,
            dimension,
            slots: Vec::new(),
        }
    }

    /// Shape of a compound space built from `slots`.
    pub fn compound(slots: Vec<SpaceShape>) -> Self {
        let dimension = slots.iter().map(|s| s.dimension).sum();
        Self {
            kind: SpaceKind::Compound,
            dimension,
            slots,
        }
    }

    pub fn is_compound(&self) -> bool {
        self.kind == SpaceKind::Compound
    }

    /// Number of slots for compound shapes, 1 otherwise.
    pub fn arity(&self) -> usize {
        if self.is_compound() {
            self.slots.len()
        } else {
            1
        }
    }

    /// `true` when this is an atomic shape of `kind`.
    pub fn is(&self, kind: SpaceKind) -> bool {
        self.kind == kind
    }

    /// `true` when this is a two-slot compound whose slots have the given kinds.
    pub fn is_pair(&self, first: SpaceKind, second: SpaceKind) -> bool {
        self.is_compound()
            && self.slots.len() == 2
            && self.slots[0].kind == first
            && self.slots[1].kind == second
    }
}

impl fmt::Display for SpaceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SpaceKind::Compound => {
                let parts: Vec<String> = self.slots.iter().map(|s| s.to_string()).collect();
                write!(f, "{}", parts.join("x"))
            }
            SpaceKind::RealVector => write!(f, "R{}", self.dimension),
            kind => write!(f, "{kind}"),
        }
    }
}

/// Workspace-wide error type.
///
/// Only programmer errors and violated preconditions are errors. A search
/// that finds nothing is reported through booleans and [`PlannerStatus`].
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanError {
    #[error("Base path is empty")]
    EmptyBasePath,

    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("No projection known from {bundle} onto {base}")]
    UnknownProjection { bundle: String, base: String },

    #[error("Base space has {base} components, but bundle space has {bundle}")]
    ComponentCountMismatch { bundle: usize, base: usize },

    #[error("Planner data already holds {0} vertices")]
    PlannerDataPopulated(usize),

    #[error("Level sequence is empty")]
    EmptySequence,

    #[error("No problem definition set on level {0}")]
    MissingProblem(usize),

    #[error("Invalid state space: {0}")]
    InvalidSpace(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
