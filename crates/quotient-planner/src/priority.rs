//! Which level grows next.
//!
//! The orchestrator keeps a max-heap of [`QueuedLevel`]s scored by a
//! [`LevelPriority`] when they are pushed. Equal scores go to the coarser
//! level.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

pub trait LevelPriority: Send + Sync {
    /// Score of a level about to be queued; larger grows sooner.
    fn score(&self, importance: f64, growth_steps: usize) -> f64;
}

/// Favour the level with the highest importance, i.e. the sparsest roadmap.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy;

impl LevelPriority for Greedy {
    fn score(&self, importance: f64, _growth_steps: usize) -> f64 {
        importance
    }
}

/// Favour the level grown least often.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobin;

impl LevelPriority for RoundRobin {
    fn score(&self, _importance: f64, growth_steps: usize) -> f64 {
        -(growth_steps as f64)
    }
}

/// Serialisable choice of the built-in priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityKind {
    #[default]
    Greedy,
    RoundRobin,
}

impl PriorityKind {
    pub fn build(self) -> Box<dyn LevelPriority> {
        match self {
            PriorityKind::Greedy => Box::new(Greedy),
            PriorityKind::RoundRobin => Box::new(RoundRobin),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QueuedLevel {
    pub score: f64,
    pub level: usize,
}

impl PartialEq for QueuedLevel {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedLevel {}

impl PartialOrd for QueuedLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.level.cmp(&self.level))
    }
}
