//! [`LevelSequence`] – orchestrates growth across a sequence of levels.
//!
//! Levels are ordered coarsest first; every level's base space is the
//! previous level's bundle space. The orchestrator always works towards the
//! lowest unsolved level (the *target*) but may grow any queued level below
//! it, chosen by a [`LevelPriority`].
//!
//! # Outcomes
//!
//! | Status | When |
//! |---|---|
//! | `ExactSolution` | every level up to the finest one is solved |
//! | `Timeout` | the termination condition fired first, or a stop level below the finest was reached |
//! | `Infeasible` | the target level reported itself infeasible |
//!
//! Solved levels leave the queue unless
//! [`SequenceConfig::refine_solved_levels`] is set.

use std::collections::BinaryHeap;
use std::sync::Arc;

use quotient_bundle::{BundleSpace, ComponentFactory};
use quotient_graph::{PlannerData, PlannerVertex, ProblemDefinition, SolutionPath};
use quotient_section::SectionStrategy;
use quotient_space::SpaceInformation;
use quotient_types::{PlanError, PlannerStatus, State};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::graph_level::{GraphLevel, LevelConfig};
use crate::level::BundleLevel;
use crate::priority::{LevelPriority, PriorityKind, QueuedLevel};
use crate::termination::TerminationCondition;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Keep growing levels after they are solved.
    pub refine_solved_levels: bool,
    pub priority: PriorityKind,
    /// Number of levels to solve; all of them when absent.
    pub stop_level: Option<usize>,
}

pub struct LevelSequence<L: BundleLevel> {
    levels: Vec<L>,
    config: SequenceConfig,
    priority: Box<dyn LevelPriority>,
    queue: BinaryHeap<QueuedLevel>,
    queued: Vec<bool>,
    growth_counts: Vec<usize>,
    solutions: Vec<Vec<State>>,
    stop_level: usize,
    problem: Option<ProblemDefinition>,
}

impl LevelSequence<GraphLevel> {
    /// Chain `spaces` (coarsest first) into bundle spaces and wrap each in a
    /// [`GraphLevel`].
    pub fn from_spaces(
        spaces: Vec<Arc<SpaceInformation>>,
        factory: &ComponentFactory,
        level_config: &LevelConfig,
        config: SequenceConfig,
    ) -> Result<Self, PlanError> {
        let mut levels = Vec::with_capacity(spaces.len());
        let mut base: Option<Arc<SpaceInformation>> = None;
        for (index, space) in spaces.into_iter().enumerate() {
            let bundle = Arc::new(BundleSpace::new(space.clone(), base.take(), factory)?);
            levels.push(GraphLevel::new(index, bundle, level_config.clone()));
            base = Some(space);
        }
        Self::new(levels, config)
    }
}

impl<L: BundleLevel> LevelSequence<L> {
    /// Each level after the first must sit on top of its predecessor.
    pub fn new(levels: Vec<L>, config: SequenceConfig) -> Result<Self, PlanError> {
        if levels.is_empty() {
            return Err(PlanError::EmptySequence);
        }
        for pair in levels.windows(2) {
            let fine = pair[1].bundle_space();
            let coarse = pair[0].bundle_space();
            let Some(base) = fine.base() else {
                return Err(PlanError::InvalidSpace(format!(
                    "level {} has no base space",
                    pair[1].index()
                )));
            };
            if base.dimension() != coarse.bundle_dimension() {
                return Err(PlanError::DimensionMismatch {
                    context: format!("base of level {}", pair[1].index()),
                    expected: coarse.bundle_dimension(),
                    actual: base.dimension(),
                });
            }
        }

        let n = levels.len();
        let stop_level = config.stop_level.map_or(n, |k| k.min(n));
        Ok(Self {
            priority: config.priority.build(),
            queue: BinaryHeap::new(),
            queued: vec![false; n],
            growth_counts: vec![0; n],
            solutions: Vec::new(),
            stop_level,
            problem: None,
            levels,
            config,
        })
    }

    pub fn with_priority(mut self, priority: Box<dyn LevelPriority>) -> Self {
        self.priority = priority;
        self
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[L] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Option<&L> {
        self.levels.get(index)
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// Solve only the first `k` levels; clamped to the sequence length.
    pub fn set_stop_level(&mut self, k: usize) {
        if k > self.levels.len() {
            warn!(requested = k, levels = self.levels.len(), "stop level clamped");
        }
        self.stop_level = k.min(self.levels.len());
    }

    pub fn stop_level(&self) -> usize {
        self.stop_level
    }

    /// Index of the level currently being solved.
    pub fn current_level(&self) -> usize {
        self.solutions.len().min(self.levels.len() - 1)
    }

    /// Growth steps spent on each level so far.
    pub fn growth_counts(&self) -> &[usize] {
        &self.growth_counts
    }

    /// Solution paths of the solved levels, coarsest first.
    pub fn solutions(&self) -> &[Vec<State>] {
        &self.solutions
    }

    /// The query on the finest space, holding the final solution once
    /// [`LevelSequence::solve`] returned `ExactSolution`.
    pub fn problem(&self) -> Option<&ProblemDefinition> {
        self.problem.as_ref()
    }

    /// Set the query on the finest space and project it onto every coarser
    /// level.
    pub fn set_problem(&mut self, start: State, goal: State, goal_threshold: f64) -> Result<(), PlanError> {
        let dimension = self.levels[self.levels.len() - 1]
            .bundle_space()
            .bundle_dimension();
        for (context, state) in [("start", &start), ("goal", &goal)] {
            if state.len() != dimension {
                return Err(PlanError::DimensionMismatch {
                    context: context.to_string(),
                    expected: dimension,
                    actual: state.len(),
                });
            }
        }

        self.problem = Some(ProblemDefinition::new(start.clone(), goal.clone(), goal_threshold));
        let (mut start, mut goal) = (start, goal);
        for level in self.levels.iter_mut().rev() {
            let space = level.bundle_space().clone();
            level.set_problem(ProblemDefinition::new(start.clone(), goal.clone(), goal_threshold));
            if space.has_base() {
                let mut s = space.alloc_base_state();
                let mut g = space.alloc_base_state();
                space.project_base(&start, &mut s);
                space.project_base(&goal, &mut g);
                start = s;
                goal = g;
            }
        }
        Ok(())
    }

    pub fn set_section_strategy(&mut self, strategy: SectionStrategy) {
        for level in &mut self.levels {
            level.set_section_strategy(strategy);
        }
    }

    /// Grow levels until the stop level is solved, a level turns out
    /// infeasible or `ptc` fires.
    #[instrument(skip_all, fields(levels = self.levels.len(), stop = self.stop_level))]
    pub fn solve(&mut self, ptc: &dyn TerminationCondition) -> Result<PlannerStatus, PlanError> {
        if let Some(missing) = (0..self.stop_level).find(|&k| self.levels[k].problem().is_none()) {
            return Err(PlanError::MissingProblem(missing));
        }

        while self.solutions.len() < self.stop_level {
            let k = self.solutions.len();
            if !self.queued[k] {
                self.push(k);
            }

            loop {
                if self.levels[k].has_solution() {
                    break;
                }
                if self.levels[k].is_infeasible() {
                    warn!(level = k, growth = self.growth_counts[k], "level infeasible");
                    return Ok(PlannerStatus::Infeasible);
                }
                if ptc.should_terminate() {
                    info!(level = k, "terminated before the level was solved");
                    return Ok(PlannerStatus::Timeout);
                }

                let Some(QueuedLevel { level: j, .. }) = self.queue.pop() else {
                    self.push(k);
                    continue;
                };
                self.queued[j] = false;
                self.grow(j);

                let retire = self.levels[j].has_solution() && !self.config.refine_solved_levels;
                if !retire {
                    self.push(j);
                }
            }

            self.record_solution(k);
        }

        if self.stop_level < self.levels.len() {
            info!(stop = self.stop_level, "stop level reached");
            return Ok(PlannerStatus::Timeout);
        }

        let finest = self.levels.len() - 1;
        let name = self.solution_name(finest);
        if let (Some(problem), Some(path)) = (&mut self.problem, self.solutions.last()) {
            if !problem.has_solution() {
                let length = path_length(self.levels[finest].bundle_space(), path);
                problem.add_solution_path(SolutionPath::new(name, path.clone(), length));
            }
        }
        Ok(PlannerStatus::ExactSolution)
    }

    fn push(&mut self, level: usize) {
        let score = self
            .priority
            .score(self.levels[level].importance(), self.growth_counts[level]);
        self.queue.push(QueuedLevel { score, level });
        self.queued[level] = true;
    }

    fn grow(&mut self, j: usize) {
        let (coarser, rest) = self.levels.split_at_mut(j);
        rest[0].grow(coarser.last());
        self.growth_counts[j] += 1;
        debug!(
            level = j,
            vertices = rest[0].roadmap().len(),
            growth = self.growth_counts[j],
            "level grown"
        );
    }

    fn solution_name(&self, level: usize) -> String {
        format!("{} LvL{}", self.levels[level].name(), level)
    }

    fn record_solution(&mut self, k: usize) {
        let name = self.solution_name(k);
        let level = &mut self.levels[k];
        let path = level.solution().unwrap_or_default();
        let length = path_length(level.bundle_space(), &path);
        if let Some(problem) = level.problem_mut() {
            problem.add_solution_path(SolutionPath::new(name, path.clone(), length));
        }
        info!(
            level = k,
            waypoints = path.len(),
            length,
            growth = self.growth_counts[k],
            "level solved"
        );
        self.solutions.push(path);
    }

    /// Lift a state of `level` to the finest space, filling every finer
    /// fiber with its identity element.
    pub fn total_state(&self, level: usize, state: &[f64]) -> Result<State, PlanError> {
        let Some(own) = self.levels.get(level) else {
            return Err(PlanError::InvalidSpace(format!(
                "level {level} out of range for {} levels",
                self.levels.len()
            )));
        };
        let dimension = own.bundle_space().bundle_dimension();
        if state.len() != dimension {
            return Err(PlanError::DimensionMismatch {
                context: format!("state of level {level}"),
                expected: dimension,
                actual: state.len(),
            });
        }

        let mut current = State::from(state);
        for finer in &self.levels[level + 1..] {
            let space = finer.bundle_space();
            let fiber = space.zero_fiber_state();
            let mut lifted = space.alloc_bundle_state();
            space.lift_state(&current, &fiber, &mut lifted);
            current = lifted;
        }
        Ok(current)
    }

    /// Export the roadmaps of every solved level and the one above it.
    ///
    /// `data` must be empty.
    pub fn planner_data(&self, data: &mut PlannerData) -> Result<(), PlanError> {
        if !data.is_empty() {
            return Err(PlanError::PlannerDataPopulated(data.vertex_count()));
        }
        let count = (self.solutions.len() + 1)
            .min(self.levels.len())
            .min(self.stop_level.max(1));
        let max_level = self.levels.len() - 1;

        for (k, level) in self.levels.iter().take(count).enumerate() {
            let offset = data.vertex_count();
            for config in level.roadmap().configurations() {
                data.add_vertex(PlannerVertex {
                    level: k,
                    max_level,
                    state: config.state.clone(),
                    total_state: self.total_state(k, &config.state)?,
                    is_start: config.is_start,
                    is_goal: config.is_goal,
                });
            }
            for (a, b, cost) in level.roadmap().edges() {
                data.add_edge(offset + a.0, offset + b.0, cost);
            }
        }
        Ok(())
    }

    /// Reset every level and the orchestrator's bookkeeping. Problems stay.
    pub fn clear(&mut self) {
        for level in &mut self.levels {
            level.clear();
        }
        self.queue.clear();
        self.queued.iter_mut().for_each(|q| *q = false);
        self.growth_counts.iter_mut().for_each(|c| *c = 0);
        self.solutions.clear();
        if let Some(problem) = &mut self.problem {
            problem.clear_solution_paths();
        }
    }
}

fn path_length(space: &BundleSpace, path: &[State]) -> f64 {
    path.windows(2)
        .map(|w| space.bundle().distance(&w[0], &w[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::termination::IterationLimit;
    use quotient_space::StateSpace;

    // ------------------------------------------------------------------ helpers
    fn spaces() -> Vec<Arc<SpaceInformation>> {
        vec![
            Arc::new(SpaceInformation::unconstrained(StateSpace::cube(1, 0.0, 1.0).unwrap())),
            Arc::new(SpaceInformation::unconstrained(
                StateSpace::real_vector(vec![0.0, -1.0], vec![1.0, 1.0]).unwrap(),
            )),
        ]
    }

    fn sequence() -> LevelSequence<GraphLevel> {
        let config = LevelConfig {
            seed: Some(9),
            ..LevelConfig::default()
        };
        LevelSequence::from_spaces(spaces(), &ComponentFactory::new(), &config, SequenceConfig::default())
            .unwrap()
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let levels: Vec<GraphLevel> = Vec::new();
        assert_eq!(
            LevelSequence::new(levels, SequenceConfig::default()).err(),
            Some(PlanError::EmptySequence)
        );
    }

    #[test]
    fn solve_without_problem_fails() {
        let mut seq = sequence();
        let err = seq.solve(&IterationLimit::new(10)).unwrap_err();
        assert_eq!(err, PlanError::MissingProblem(0));
    }

    #[test]
    fn problem_is_projected_downwards() {
        let mut seq = sequence();
        seq.set_problem(State::new(vec![0.2, 0.5]), State::new(vec![0.9, -0.5]), 1e-3)
            .unwrap();
        let coarse = seq.level(0).unwrap().problem().unwrap();
        assert_eq!(&coarse.start()[..], &[0.2]);
        assert_eq!(&coarse.goal()[..], &[0.9]);
    }

    #[test]
    fn problem_dimension_is_checked() {
        let mut seq = sequence();
        let err = seq
            .set_problem(State::new(vec![0.2]), State::new(vec![0.9, 0.0]), 1e-3)
            .unwrap_err();
        assert!(matches!(err, PlanError::DimensionMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn sequence_config_reads_partial_toml() {
        let c: SequenceConfig = toml::from_str("priority = \"round_robin\"\nstop_level = 2").unwrap();
        assert_eq!(c.priority, PriorityKind::RoundRobin);
        assert_eq!(c.stop_level, Some(2));
        assert!(!c.refine_solved_levels);
    }

    #[test]
    fn stop_level_is_clamped() {
        let mut seq = sequence();
        seq.set_stop_level(7);
        assert_eq!(seq.stop_level(), 2);
        seq.set_stop_level(1);
        assert_eq!(seq.stop_level(), 1);
    }

    #[test]
    fn free_space_solves_exactly() {
        let mut seq = sequence();
        seq.set_problem(State::new(vec![0.0, 0.0]), State::new(vec![1.0, 0.5]), 1e-3)
            .unwrap();
        let status = seq.solve(&IterationLimit::new(100)).unwrap();
        assert_eq!(status, PlannerStatus::ExactSolution);
        assert_eq!(seq.solutions().len(), 2);

        let best = seq.problem().unwrap().best_solution().unwrap();
        assert_eq!(best.planner_name, "QMP LvL1");
        let coarse = seq.level(0).unwrap().problem().unwrap();
        assert_eq!(coarse.solution_paths()[0].planner_name, "QMP LvL0");
    }

    #[test]
    fn capped_stop_level_is_partial() {
        let mut seq = sequence();
        seq.set_problem(State::new(vec![0.0, 0.0]), State::new(vec![1.0, 0.5]), 1e-3)
            .unwrap();
        seq.set_stop_level(1);
        assert_eq!(seq.solve(&IterationLimit::new(100)).unwrap(), PlannerStatus::Timeout);
        assert_eq!(seq.solutions().len(), 1);
        assert_eq!(seq.growth_counts()[1], 0);
    }

    #[test]
    fn total_state_fills_fibers() {
        let seq = sequence();
        let total = seq.total_state(0, &[0.3]).unwrap();
        assert_eq!(&total[..], &[0.3, 0.0]);
        assert!(seq.total_state(0, &[0.3, 0.1]).is_err());
        assert!(seq.total_state(5, &[0.3]).is_err());
    }

    #[test]
    fn planner_data_exports_solved_levels() {
        let mut seq = sequence();
        seq.set_problem(State::new(vec![0.0, 0.0]), State::new(vec![1.0, 0.5]), 1e-3)
            .unwrap();
        seq.solve(&IterationLimit::new(100)).unwrap();

        let mut data = PlannerData::new();
        seq.planner_data(&mut data).unwrap();
        assert!(data.level_vertices(0).count() >= 2);
        assert!(data.level_vertices(1).count() >= 2);
        assert!(data.vertices().iter().all(|v| v.total_state.len() == 2));
        assert!(data.vertices().iter().any(|v| v.is_start && v.level == 1));

        let err = seq.planner_data(&mut data).unwrap_err();
        assert!(matches!(err, PlanError::PlannerDataPopulated(_)));
    }

    #[test]
    fn clear_forgets_solutions() {
        let mut seq = sequence();
        seq.set_problem(State::new(vec![0.0, 0.0]), State::new(vec![1.0, 0.5]), 1e-3)
            .unwrap();
        seq.solve(&IterationLimit::new(100)).unwrap();
        seq.clear();
        assert!(seq.solutions().is_empty());
        assert_eq!(seq.current_level(), 0);
        assert!(!seq.problem().unwrap().has_solution());
        assert_eq!(seq.solve(&IterationLimit::new(100)).unwrap(), PlannerStatus::ExactSolution);
    }
}
