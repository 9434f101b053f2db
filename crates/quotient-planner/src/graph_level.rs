//! [`GraphLevel`] – a roadmap level grown by parent-guided sampling.
//!
//! The first growth step inserts start and goal. When the parent level is
//! already solved and the fiber is non-trivial, the same step runs the
//! section search over the parent's solution, which often solves the level
//! immediately. Later steps add one sample each:
//!
//! ```text
//!   parent solved?  ──yes──▶  base from parent's solution (path_bias)
//!        │                    or a random parent vertex, fiber uniform
//!        no
//!        ▼
//!   uniform sample in the bundle space
//! ```
//!
//! Every valid sample is linked to its `k_nearest` neighbours by valid
//! motions. Once the roadmap holds `max_vertices` configurations without a
//! solution the level gives up and reports itself infeasible.

use std::sync::Arc;

use quotient_bundle::BundleSpace;
use quotient_graph::{ConfigId, ProblemDefinition, Roadmap};
use quotient_section::{PathRestriction, SectionConfig, SectionStats, SectionStrategy};
use quotient_types::State;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::level::BundleLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Neighbours each new sample tries to connect to.
    pub k_nearest: usize,
    /// Roadmap size at which an unsolved level is declared infeasible.
    pub max_vertices: usize,
    /// Probability of drawing a child's base sample from this level's
    /// solution path instead of its whole roadmap.
    pub path_bias: f64,
    /// Seed for the level's generator, offset by the level index. Entropy
    /// when absent.
    pub seed: Option<u64>,
    pub section: SectionConfig,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            k_nearest: 10,
            max_vertices: 5_000,
            path_bias: 0.8,
            seed: None,
            section: SectionConfig::default(),
        }
    }
}

/// Roadmap level grown by sampling through its parent level's graph.
pub struct GraphLevel {
    name: String,
    index: usize,
    space: Arc<BundleSpace>,
    config: LevelConfig,
    roadmap: Roadmap,
    problem: Option<ProblemDefinition>,
    start: Option<ConfigId>,
    goal: Option<ConfigId>,
    first_run: bool,
    solved: bool,
    infeasible: bool,
    solution: Option<Vec<State>>,
    last_section: Option<SectionStats>,
    rng: StdRng,
}

impl GraphLevel {
    pub fn new(index: usize, space: Arc<BundleSpace>, config: LevelConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_entropy(),
        };
        Self {
            name: "QMP".to_string(),
            index,
            space,
            config,
            roadmap: Roadmap::new(),
            problem: None,
            start: None,
            goal: None,
            first_run: true,
            solved: false,
            infeasible: false,
            solution: None,
            last_section: None,
            rng,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn start(&self) -> Option<ConfigId> {
        self.start
    }

    pub fn goal(&self) -> Option<ConfigId> {
        self.goal
    }

    /// Counters of the section search run on the first growth step, if any.
    pub fn section_stats(&self) -> Option<&SectionStats> {
        self.last_section.as_ref()
    }

    /// Draw a state of this level's bundle space from the roadmap, biased
    /// towards the solution path once there is one.
    ///
    /// Returns `false` when the roadmap is empty.
    pub fn sample_from_graph<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut [f64]) -> bool {
        if self.roadmap.is_empty() {
            return false;
        }
        if let Some(path) = &self.solution {
            if rng.gen_bool(self.config.path_bias.clamp(0.0, 1.0)) {
                if path.len() == 1 {
                    out.copy_from_slice(&path[0]);
                } else {
                    let i = rng.gen_range(0..path.len() - 1);
                    let t = rng.gen_range(0.0..1.0);
                    self.space.bundle().interpolate(&path[i], &path[i + 1], t, out);
                }
                return true;
            }
        }
        let i = rng.gen_range(0..self.roadmap.len());
        out.copy_from_slice(self.roadmap.state(ConfigId(i)));
        true
    }

    fn init_query(&mut self) {
        let Some(problem) = &self.problem else {
            return;
        };
        let bundle = self.space.bundle();
        let (start, goal) = (problem.start().clone(), problem.goal().clone());
        if !bundle.is_valid(&start) || !bundle.is_valid(&goal) {
            warn!(
                level = self.index,
                start_valid = bundle.is_valid(&start),
                goal_valid = bundle.is_valid(&goal),
                "invalid query, level is infeasible"
            );
            self.infeasible = true;
            return;
        }

        let s = self.roadmap.add_configuration(start);
        self.roadmap.config_mut(s).is_start = true;
        let g = self.roadmap.add_configuration(goal);
        self.roadmap.config_mut(g).is_goal = true;
        self.start = Some(s);
        self.goal = Some(g);
        self.connect(g);
    }

    /// Run the section search over the parent's solution.
    fn lift_parent_solution(&mut self, parent: &GraphLevel) {
        if !parent.has_solution() || self.space.fiber_dimension() == 0 {
            return;
        }
        let (Some(start), Some(goal), Some(path)) = (self.start, self.goal, parent.solution()) else {
            return;
        };

        let mut restriction = match PathRestriction::new(self.space.clone()) {
            Ok(r) => r,
            Err(e) => {
                warn!(level = self.index, error = %e, "no path restriction");
                return;
            }
        };
        if let Err(e) = restriction.set_base_path(path) {
            warn!(level = self.index, error = %e, "parent solution rejected");
            return;
        }

        let (found, stats) = restriction.check_section(
            &mut self.roadmap,
            start,
            goal,
            &self.config.section,
            &mut self.rng,
        );
        info!(
            level = self.index,
            found,
            attempts = stats.attempts,
            repairs = stats.repair_calls(),
            "section search over parent solution"
        );
        self.last_section = Some(stats);
    }

    fn sample(&mut self, parent: Option<&GraphLevel>, out: &mut State) {
        if let Some(parent) = parent.filter(|_| self.space.has_base()) {
            let mut base = self.space.alloc_base_state();
            if !parent.sample_from_graph(&mut self.rng, &mut base) {
                if let Some(base_space) = self.space.base() {
                    base_space.sample_uniform(&mut self.rng, &mut base);
                }
            }
            let mut fiber = self.space.alloc_fiber_state();
            self.space.sample_fiber(&mut self.rng, &mut fiber);
            self.space.lift_state(&base, &fiber, out);
        } else {
            self.space.bundle().sample_uniform(&mut self.rng, out);
        }
    }

    /// Link `id` to its nearest neighbours by valid motions.
    fn connect(&mut self, id: ConfigId) {
        let bundle = self.space.bundle().clone();
        let state = self.roadmap.state(id).clone();
        let neighbours =
            self.roadmap
                .nearest_k(&state, self.config.k_nearest + 1, |a, b| bundle.distance(a, b));

        for (other, distance) in neighbours {
            if other == id {
                continue;
            }
            self.roadmap.config_mut(id).total_connection_attempts += 1;
            self.roadmap.config_mut(other).total_connection_attempts += 1;
            if bundle.check_motion(&state, self.roadmap.state(other))
                && self.roadmap.add_edge(id, other, distance)
            {
                self.roadmap.config_mut(id).successful_connection_attempts += 1;
                self.roadmap.config_mut(other).successful_connection_attempts += 1;
            }
        }
        self.connect_goal_region(id);
    }

    /// Link configurations within the goal threshold to the goal vertex.
    fn connect_goal_region(&mut self, id: ConfigId) {
        let (Some(goal), Some(problem)) = (self.goal, self.problem.as_ref()) else {
            return;
        };
        let bundle = self.space.bundle().clone();
        let goal_state = self.roadmap.state(goal).clone();
        let candidates: Vec<(ConfigId, f64)> = if id == goal {
            (0..self.roadmap.len())
                .map(ConfigId)
                .filter(|&other| other != goal)
                .map(|other| (other, bundle.distance(self.roadmap.state(other), &goal_state)))
                .filter(|&(_, d)| problem.is_goal_satisfied(d))
                .collect()
        } else {
            let d = bundle.distance(self.roadmap.state(id), &goal_state);
            if problem.is_goal_satisfied(d) { vec![(id, d)] } else { Vec::new() }
        };

        for (other, distance) in candidates {
            if self.roadmap.same_component(other, goal) {
                continue;
            }
            if bundle.check_motion(self.roadmap.state(other), &goal_state)
                && self.roadmap.add_edge(other, goal, distance)
            {
                debug!(level = self.index, vertex = other.0, distance, "reached goal region");
            }
        }
    }

    fn update_solution(&mut self) {
        let (Some(start), Some(goal)) = (self.start, self.goal) else {
            return;
        };
        if !self.roadmap.same_component(start, goal) {
            return;
        }
        if let Some(path) = self.roadmap.shortest_path(start, goal) {
            if !self.solved {
                info!(level = self.index, vertices = self.roadmap.len(), "level solved");
            }
            self.solved = true;
            self.solution = Some(self.roadmap.path_states(&path));
        }
    }
}

impl BundleLevel for GraphLevel {
    fn name(&self) -> &str {
        &self.name
    }

    fn index(&self) -> usize {
        self.index
    }

    fn bundle_space(&self) -> &Arc<BundleSpace> {
        &self.space
    }

    fn set_problem(&mut self, problem: ProblemDefinition) {
        self.problem = Some(problem);
    }

    fn problem(&self) -> Option<&ProblemDefinition> {
        self.problem.as_ref()
    }

    fn problem_mut(&mut self) -> Option<&mut ProblemDefinition> {
        self.problem.as_mut()
    }

    fn grow(&mut self, parent: Option<&Self>) {
        if self.infeasible {
            return;
        }
        if self.problem.is_none() {
            warn!(level = self.index, "grow without a problem definition");
            return;
        }

        if self.first_run {
            self.first_run = false;
            self.init_query();
            if self.infeasible {
                return;
            }
            if let Some(parent) = parent {
                self.lift_parent_solution(parent);
            }
            self.update_solution();
            return;
        }

        if self.roadmap.len() >= self.config.max_vertices {
            if !self.solved {
                warn!(
                    level = self.index,
                    vertices = self.roadmap.len(),
                    components = self.roadmap.component_count(),
                    "roadmap saturated without a solution"
                );
                self.infeasible = true;
            }
            return;
        }

        let mut state = self.space.alloc_bundle_state();
        self.sample(parent, &mut state);
        if !self.space.bundle().is_valid(&state) {
            return;
        }
        let id = self.roadmap.add_configuration(state);
        self.connect(id);
        debug!(level = self.index, vertex = %id, "sample added");
        self.update_solution();
    }

    fn has_solution(&self) -> bool {
        self.solved
    }

    fn is_infeasible(&self) -> bool {
        self.infeasible
    }

    fn solution(&self) -> Option<Vec<State>> {
        self.solution.clone()
    }

    fn roadmap(&self) -> &Roadmap {
        &self.roadmap
    }

    fn set_section_strategy(&mut self, strategy: SectionStrategy) {
        self.config.section.strategy = strategy;
    }

    fn clear(&mut self) {
        self.roadmap.clear();
        self.start = None;
        self.goal = None;
        self.first_run = true;
        self.solved = false;
        self.infeasible = false;
        self.solution = None;
        self.last_section = None;
        if let Some(problem) = &mut self.problem {
            problem.clear_solution_paths();
        }
    }
}

impl std::fmt::Debug for GraphLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphLevel")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("space", &format_args!("{}", self.space))
            .field("vertices", &self.roadmap.len())
            .field("solved", &self.solved)
            .field("infeasible", &self.infeasible)
            .finish()
    }
}
