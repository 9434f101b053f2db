//! [`FindSection`] – recursive pattern search for a feasible section.
//!
//! The search starts with a direct interpolation from the head to its
//! target. When that section is blocked, the head sits on the last valid
//! state and a fixed sequence of local repairs is tried before recursing
//! from the new head:
//!
//! | Stage | Method | Success means |
//! |---|---|---|
//! | direct | [`PathSection::check_motion`] | the whole section is valid |
//! | policy retry | recursion with [`InterpolationPolicy::other`] | the head advanced, try the other swing |
//! | wriggle | [`FindSection::wriggle_free`] | at least one step past the blockage |
//! | tunneling | [`FindSection::tunneling`] | reached the far side of an infeasible stretch |
//! | corner step | [`FindSection::corner_step`] | head → corner → target is valid |
//! | branching | [`FindSection::find_feasible_state_on_fiber`], side step or [`FindSection::triple_step`] | a valid detour further along the path |
//!
//! Depth is capped by `max_depth` and every pass by an attempt budget of
//! `max_depth × max_branching`, so the search always terminates. States
//! inserted during failed attempts stay in the roadmap.

use std::sync::Arc;

use quotient_graph::Roadmap;
use quotient_space::SpaceInformation;
use quotient_types::{PlanError, State};
use rand::RngCore;
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::config::{SectionConfig, SectionStrategy};
use crate::head::Head;
use crate::restriction::PathRestriction;
use crate::schedule::ExponentialSchedule;
use crate::section::{InterpolationPolicy, PathSection, add_step};

/// Tunnel probes drawn per base location while scanning for the tunnel end.
const TUNNEL_PROBES: usize = 5;

/// Counters of every stage the search ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionStats {
    pub passes: usize,
    pub attempts: usize,
    pub direct_checks: usize,
    pub policy_retries: usize,
    pub wriggle_calls: usize,
    pub tunneling_calls: usize,
    pub corner_step_calls: usize,
    pub branch_samples: usize,
    pub side_steps: usize,
    pub triple_step_calls: usize,
    /// Arclength where the very first direct interpolation stopped.
    pub first_failure_location: Option<f64>,
    pub success_policy: Option<InterpolationPolicy>,
    pub success_depth: Option<usize>,
}

impl SectionStats {
    /// Calls into any repair stage.
    pub fn repair_calls(&self) -> usize {
        self.policy_retries
            + self.wriggle_calls
            + self.tunneling_calls
            + self.corner_step_calls
            + self.branch_samples
            + self.triple_step_calls
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SearchContext
// ────────────────────────────────────────────────────────────────────────────

/// Scratch states allocated once per finder and reused by every stage.
#[derive(Debug)]
struct SearchContext {
    base: State,
    fiber: State,
    bundle: State,
    /// `max_branching` slots per recursion depth for the samples already
    /// explored at that depth.
    visited: Vec<State>,
    attempts: usize,
    budget: usize,
}

impl SearchContext {
    fn new(restriction: &PathRestriction, config: &SectionConfig) -> Self {
        let bundle = restriction.bundle();
        let slots = config.max_depth.max(1) * config.max_branching;
        Self {
            base: bundle.alloc_base_state(),
            fiber: bundle.alloc_fiber_state(),
            bundle: bundle.alloc_bundle_state(),
            visited: vec![bundle.alloc_bundle_state(); slots],
            attempts: 0,
            budget: config.attempt_budget(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// FindSection
// ────────────────────────────────────────────────────────────────────────────

/// Recursive search for a valid section over one path restriction.
pub struct FindSection<'a> {
    restriction: &'a PathRestriction,
    config: SectionConfig,
    bundle: Arc<SpaceInformation>,
    fiber: Arc<SpaceInformation>,
    base_segment: f64,
    fiber_segment: f64,
    schedule: ExponentialSchedule,
    ctx: SearchContext,
    stats: SectionStats,
}

impl<'a> FindSection<'a> {
    /// Fails when the restriction's level has no base or a trivial fiber,
    /// since there is nothing to search over.
    pub fn new(restriction: &'a PathRestriction, config: SectionConfig) -> Result<Self, PlanError> {
        let space = restriction.bundle();
        let fiber = space.fiber().cloned().ok_or_else(|| {
            PlanError::InvalidSpace(format!("section search needs a non-trivial fiber on {space}"))
        })?;
        let base_segment = restriction.base().longest_valid_segment_length();
        let fiber_segment = fiber.longest_valid_segment_length();
        let schedule = ExponentialSchedule::new(
            0.0,
            config.wriggle_radius_factor * base_segment,
            config.schedule_lambda,
        );
        let ctx = SearchContext::new(restriction, &config);
        Ok(Self {
            restriction,
            bundle: space.bundle().clone(),
            fiber,
            base_segment,
            fiber_segment,
            schedule,
            ctx,
            stats: SectionStats::default(),
            config,
        })
    }

    pub fn config(&self) -> &SectionConfig {
        &self.config
    }

    pub fn stats(&self) -> &SectionStats {
        &self.stats
    }

    /// Run the search from `head` to its target.
    ///
    /// The first pass starts with the configured policy. If it fails, a
    /// second pass restarts from the initial head with the other policy.
    /// On success `head` sits on the target.
    #[instrument(skip_all, fields(length = self.restriction.length()))]
    pub fn solve(&mut self, head: &mut Head, roadmap: &mut Roadmap, rng: &mut dyn RngCore) -> bool {
        let initial = head.clone();
        let first = self.config.initial_policy;

        if self.run_pass(head, roadmap, rng, first) {
            return true;
        }
        debug!(
            reached = head.location(),
            attempts = self.stats.attempts,
            "first pass failed, retrying with {:?}",
            first.other()
        );

        *head = initial;
        let found = self.run_pass(head, roadmap, rng, first.other());
        if !found {
            debug!(attempts = self.stats.attempts, "no feasible section");
        }
        found
    }

    fn run_pass(
        &mut self,
        head: &mut Head,
        roadmap: &mut Roadmap,
        rng: &mut dyn RngCore,
        policy: InterpolationPolicy,
    ) -> bool {
        self.stats.passes += 1;
        self.ctx.attempts = 0;
        self.schedule.reset();
        self.recursive_pattern_search(head, roadmap, rng, policy, 0)
    }

    fn recursive_pattern_search(
        &mut self,
        head: &mut Head,
        roadmap: &mut Roadmap,
        rng: &mut dyn RngCore,
        policy: InterpolationPolicy,
        depth: usize,
    ) -> bool {
        if self.ctx.attempts >= self.ctx.budget {
            trace!(depth, "attempt budget exhausted");
            return false;
        }
        self.ctx.attempts += 1;
        self.stats.attempts += 1;

        let start_location = head.location();

        // Direct interpolation
        self.stats.direct_checks += 1;
        let mut section = PathSection::interpolate(self.restriction, head, policy);
        if section.check_motion(self.restriction, roadmap, head) {
            self.stats.success_policy = Some(policy);
            self.stats.success_depth = Some(depth);
            trace!(depth, ?policy, "section valid");
            return true;
        }
        if self.stats.first_failure_location.is_none() {
            self.stats.first_failure_location = Some(section.last_valid_location());
        }
        if self.config.strategy == SectionStrategy::DirectOnly || depth >= self.config.max_depth {
            return false;
        }

        if head.location() > start_location {
            self.stats.policy_retries += 1;
            if self.recursive_pattern_search(head, roadmap, rng, policy.other(), depth + 1) {
                return true;
            }
        }

        if self.wriggle_free(head, roadmap, rng)
            && self.recursive_pattern_search(head, roadmap, rng, policy.other(), depth + 1)
        {
            return true;
        }

        if self.config.enable_tunneling
            && self.tunneling(head, roadmap, rng)
            && self.recursive_pattern_search(head, roadmap, rng, policy.other(), depth + 1)
        {
            return true;
        }

        if self.corner_step(head, roadmap, rng) {
            self.stats.success_policy = Some(policy);
            self.stats.success_depth = Some(depth);
            return true;
        }

        if head.location() <= start_location {
            trace!(depth, location = start_location, "stuck");
            return false;
        }

        self.branch(head, roadmap, rng, policy, depth)
    }

    /// Sample fiber values further along the path and detour to them.
    fn branch(
        &mut self,
        head: &mut Head,
        roadmap: &mut Roadmap,
        rng: &mut dyn RngCore,
        policy: InterpolationPolicy,
        depth: usize,
    ) -> bool {
        let offset = depth * self.config.max_branching;
        let mut visited = 0;
        let mut infeasible = 0;
        let mut location = head.location() + self.base_segment;

        for _ in 0..self.config.max_branching {
            if location >= head.target_location() {
                break;
            }
            self.stats.branch_samples += 1;

            let mut base = std::mem::take(&mut self.ctx.base);
            self.restriction.interpolate_base_path(location, &mut base);
            let sample = self.find_feasible_state_on_fiber(&base, rng);
            self.ctx.base = base;
            let branch_location = location;
            location = location.max(head.location() + self.base_segment) + self.base_segment;

            let Some(sample) = sample else {
                infeasible += 1;
                continue;
            };

            let slots = &mut self.ctx.visited[offset..offset + self.config.max_branching];
            if slots[..visited]
                .iter()
                .any(|seen| self.bundle.check_motion(seen, &sample))
            {
                infeasible += 1;
                continue;
            }
            slots[visited].copy_from_slice(&sample);
            visited += 1;

            let stepped = if self.bundle.check_motion(head.state(), &sample) {
                self.stats.side_steps += 1;
                let id = add_step(roadmap, &self.bundle, head.config(), &sample);
                head.set_current(self.restriction.bundle(), roadmap, id, branch_location);
                true
            } else {
                self.triple_step(head, roadmap, &sample, branch_location)
            };

            if stepped
                && self.recursive_pattern_search(head, roadmap, rng, policy.other(), depth + 1)
            {
                return true;
            }
        }

        trace!(depth, infeasible, "branching exhausted");
        false
    }

    /// Up to `max_fiber_sampling` uniform fiber samples over `base`; returns
    /// the first valid lift.
    pub fn find_feasible_state_on_fiber(&mut self, base: &[f64], rng: &mut dyn RngCore) -> Option<State> {
        let space = self.restriction.bundle();
        for _ in 0..self.config.max_fiber_sampling {
            space.sample_fiber(rng, &mut self.ctx.fiber);
            space.lift_state(base, &self.ctx.fiber, &mut self.ctx.bundle);
            if self.bundle.is_valid(&self.ctx.bundle) {
                return Some(self.ctx.bundle.clone());
            }
        }
        None
    }

    /// Step past the blockage one base segment at a time with small random
    /// perturbations of base and fiber.
    ///
    /// Returns `true` when at least one step was taken. On `false` neither
    /// the head nor the roadmap changed.
    pub fn wriggle_free(&mut self, head: &mut Head, roadmap: &mut Roadmap, rng: &mut dyn RngCore) -> bool {
        self.stats.wriggle_calls += 1;
        let space = self.restriction.bundle();
        let base_space = self.restriction.base();
        let epsilon = 2.0 * self.fiber_segment;
        let end = head.target_location().min(self.restriction.length());

        let mut location = head.location() + self.base_segment;
        let mut anchor = space.alloc_base_state();
        let mut steps = 0;

        while location < end {
            self.restriction.interpolate_base_path(location, &mut anchor);
            let mut progressed = false;
            for _ in 0..self.config.max_wriggling {
                let radius = self.schedule.next();
                base_space.sample_uniform_near(rng, &anchor, radius, &mut self.ctx.base);
                self.fiber
                    .sample_uniform_near(rng, head.fiber_state(), epsilon, &mut self.ctx.fiber);
                space.lift_state(&self.ctx.base, &self.ctx.fiber, &mut self.ctx.bundle);

                if self.bundle.is_valid(&self.ctx.bundle)
                    && self.bundle.check_motion(head.state(), &self.ctx.bundle)
                {
                    let id = add_step(roadmap, &self.bundle, head.config(), &self.ctx.bundle);
                    head.set_current(space, roadmap, id, location);
                    progressed = true;
                    steps += 1;
                    break;
                }
            }
            if !progressed {
                break;
            }
            location += self.base_segment;
        }

        trace!(steps, location = head.location(), "wriggle");
        steps > 0
    }

    /// Find the far end of an infeasible stretch ahead of the head and walk
    /// greedily towards it.
    ///
    /// Greedy steps stay in the roadmap even when the exit is not reached;
    /// the head only moves once it is.
    pub fn tunneling(&mut self, head: &mut Head, roadmap: &mut Roadmap, rng: &mut dyn RngCore) -> bool {
        self.stats.tunneling_calls += 1;
        let space = self.restriction.bundle();
        let length = self.restriction.length();

        let mut location = head.location();
        let mut tunnel_entry: Option<f64> = None;
        let mut exit = None;
        while location < length && exit.is_none() {
            location += self.base_segment;
            self.restriction.interpolate_base_path(location, &mut self.ctx.base);
            for _ in 0..TUNNEL_PROBES {
                self.fiber.sample_uniform_near(
                    rng,
                    head.fiber_state(),
                    self.fiber_segment,
                    &mut self.ctx.fiber,
                );
                space.lift_state(&self.ctx.base, &self.ctx.fiber, &mut self.ctx.bundle);
                if !self.bundle.is_valid(&self.ctx.bundle) {
                    if tunnel_entry.is_none() {
                        tunnel_entry = Some(location);
                    }
                } else if tunnel_entry.is_some_and(|entry| location > entry) {
                    exit = Some(self.ctx.bundle.clone());
                    break;
                }
            }
        }
        let Some(exit) = exit else {
            return false;
        };
        let exit_location = location;

        let base_space = self.restriction.base();
        let mut anchor = space.alloc_base_state();
        let mut last = head.config();
        let mut best = self.bundle.distance(roadmap.state(last), &exit);
        let mut location = head.location();
        let mut progressing = true;

        while location < exit_location && progressing {
            if self.bundle.check_motion(roadmap.state(last), &exit) {
                let id = add_step(roadmap, &self.bundle, last, &exit);
                head.set_current(space, roadmap, id, exit_location);
                trace!(exit = exit_location, "tunnel crossed");
                return true;
            }

            location += self.base_segment;
            self.restriction.interpolate_base_path(location, &mut anchor);
            progressing = false;
            for _ in 0..self.config.max_tunneling {
                let radius = self.schedule.next();
                base_space.sample_uniform_near(rng, &anchor, radius, &mut self.ctx.base);
                self.fiber.sample_uniform_near(
                    rng,
                    head.fiber_state(),
                    4.0 * self.fiber_segment,
                    &mut self.ctx.fiber,
                );
                space.lift_state(&self.ctx.base, &self.ctx.fiber, &mut self.ctx.bundle);
                if !self.bundle.is_valid(&self.ctx.bundle) {
                    continue;
                }
                let distance = self.bundle.distance(&self.ctx.bundle, &exit);
                if distance < best && self.bundle.check_motion(roadmap.state(last), &self.ctx.bundle) {
                    last = add_step(roadmap, &self.bundle, last, &self.ctx.bundle);
                    best = distance;
                    progressing = true;
                }
            }
        }
        false
    }

    /// L-shaped detour through one corner state near the head.
    ///
    /// Even trials lift the corner with the target's fiber, odd trials with
    /// the head's fiber.
    pub fn corner_step(&mut self, head: &mut Head, roadmap: &mut Roadmap, rng: &mut dyn RngCore) -> bool {
        self.stats.corner_step_calls += 1;
        let space = self.restriction.bundle();
        let base_space = self.restriction.base();

        let mut target_base = space.alloc_base_state();
        space.project_base(head.target_state(), &mut target_base);
        let radius = base_space.distance(head.base_state(), &target_base);

        for trial in 0..self.config.max_corner_steps {
            base_space.sample_uniform_near(rng, head.base_state(), radius, &mut self.ctx.base);
            let fiber = if trial % 2 == 0 {
                head.target_fiber()
            } else {
                head.fiber_state()
            };
            space.lift_state(&self.ctx.base, fiber, &mut self.ctx.bundle);

            if self.bundle.is_valid(&self.ctx.bundle)
                && self.bundle.check_motion(head.state(), &self.ctx.bundle)
                && self.bundle.check_motion(&self.ctx.bundle, head.target_state())
            {
                let corner = add_step(roadmap, &self.bundle, head.config(), &self.ctx.bundle);
                let cost = self.bundle.distance(&self.ctx.bundle, head.target_state());
                roadmap.add_edge(corner, head.target(), cost);
                head.set_current(space, roadmap, head.target(), head.target_location());
                trace!(trial, "corner step");
                return true;
            }
        }
        false
    }

    /// Three-edge detour from the head to `goal` at arclength `goal_location`
    /// via a back step and a side step along the fiber.
    pub fn triple_step(
        &mut self,
        head: &mut Head,
        roadmap: &mut Roadmap,
        goal: &[f64],
        goal_location: f64,
    ) -> bool {
        self.stats.triple_step_calls += 1;
        let space = self.restriction.bundle();
        let bounds = self.config.triple_step;

        let mut fiber_start = space.alloc_fiber_state();
        let mut fiber_goal = space.alloc_fiber_state();
        let mut fiber_mid = space.alloc_fiber_state();
        space.project_fiber(head.state(), &mut fiber_start);
        space.project_fiber(goal, &mut fiber_goal);
        self.fiber.interpolate(&fiber_start, &fiber_goal, 0.5, &mut fiber_mid);

        let fiber_distance = self.fiber.distance(&fiber_start, &fiber_goal);
        let mut base = space.alloc_base_state();
        let mut start_lift = space.alloc_bundle_state();
        let mut goal_lift = space.alloc_bundle_state();
        let mut found = false;

        let mut location = head.location() - self.base_segment;
        while location >= 0.0 {
            self.restriction.interpolate_base_path(location, &mut base);
            space.lift_state(&base, &fiber_mid, &mut start_lift);
            if self.bundle.is_valid(&start_lift) {
                space.lift_state(&base, &fiber_start, &mut start_lift);
                space.lift_state(&base, &fiber_goal, &mut goal_lift);
                if self.bundle.is_valid(&start_lift)
                    && self.bundle.is_valid(&goal_lift)
                    && self.bundle.check_motion(&start_lift, &goal_lift)
                {
                    let fibers = FiberSpan {
                        start: &fiber_start,
                        goal: &fiber_goal,
                        distance: fiber_distance,
                    };
                    found = self.settle_start_lift(head.state(), &base, &fibers, bounds.lower, &mut start_lift, &goal_lift)
                        && self.settle_goal_lift(goal, &base, &fibers, bounds.upper, &start_lift, &mut goal_lift);
                    break;
                }
            }
            location -= self.base_segment;
        }

        if found {
            let back = add_step(roadmap, &self.bundle, head.config(), &start_lift);
            let side = add_step(roadmap, &self.bundle, back, &goal_lift);
            let end = add_step(roadmap, &self.bundle, side, goal);
            head.set_current(space, roadmap, end, goal_location);
            trace!(location, goal_location, "triple step");
        }
        found
    }

    /// Make the head → start-lift edge valid, scanning fiber values below
    /// the midpoint down to `-lower × d` if needed.
    fn settle_start_lift(
        &self,
        from: &[f64],
        base: &[f64],
        fibers: &FiberSpan<'_>,
        lower: f64,
        start_lift: &mut State,
        goal_lift: &[f64],
    ) -> bool {
        if self.bundle.check_motion(from, start_lift) {
            return true;
        }
        if fibers.distance <= 0.0 || self.fiber_segment <= 0.0 {
            return false;
        }
        let space = self.restriction.bundle();
        let mut fiber = space.alloc_fiber_state();
        let mut offset = 0.5 * fibers.distance;
        loop {
            offset -= self.fiber_segment;
            fibers.at(&self.fiber, offset, &mut fiber);
            space.lift_state(base, &fiber, start_lift);
            if self.bundle.check_motion(from, start_lift) && self.bundle.check_motion(start_lift, goal_lift) {
                return true;
            }
            if offset <= -lower * fibers.distance {
                return false;
            }
        }
    }

    /// Make the goal-lift → goal edge valid, scanning fiber values above the
    /// midpoint up to `upper × d` if needed.
    fn settle_goal_lift(
        &self,
        goal: &[f64],
        base: &[f64],
        fibers: &FiberSpan<'_>,
        upper: f64,
        start_lift: &[f64],
        goal_lift: &mut State,
    ) -> bool {
        if self.bundle.check_motion(goal_lift, goal) {
            return true;
        }
        if fibers.distance <= 0.0 || self.fiber_segment <= 0.0 {
            return false;
        }
        let space = self.restriction.bundle();
        let mut fiber = space.alloc_fiber_state();
        let mut offset = 0.5 * fibers.distance;
        loop {
            offset += self.fiber_segment;
            fibers.at(&self.fiber, offset, &mut fiber);
            space.lift_state(base, &fiber, goal_lift);
            if self.bundle.check_motion(goal_lift, goal) && self.bundle.check_motion(start_lift, goal_lift) {
                return true;
            }
            if offset >= upper * fibers.distance {
                return false;
            }
        }
    }
}

/// Fiber segment between the head's and the goal's fiber values.
struct FiberSpan<'f> {
    start: &'f [f64],
    goal: &'f [f64],
    distance: f64,
}

impl FiberSpan<'_> {
    /// Fiber value `offset` along the span, measured from `start`.
    fn at(&self, fiber: &SpaceInformation, offset: f64, out: &mut [f64]) {
        fiber.interpolate(self.start, self.goal, offset / self.distance, out);
    }
}

impl std::fmt::Debug for FindSection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FindSection")
            .field("config", &self.config)
            .field("base_segment", &self.base_segment)
            .field("fiber_segment", &self.fiber_segment)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotient_bundle::{BundleSpace, ComponentFactory};
    use quotient_graph::ConfigId;
    use quotient_space::{BoxObstacleRule, BoxRegion, PredicateRule, StateSpace, ValidityChecker};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    // ------------------------------------------------------------------ helpers
    fn restriction(checker: ValidityChecker) -> PathRestriction {
        let base = Arc::new(SpaceInformation::unconstrained(StateSpace::cube(1, 0.0, 1.0).unwrap()));
        let bundle = Arc::new(SpaceInformation::new(
            StateSpace::real_vector(vec![0.0, -1.0], vec![1.0, 1.0]).unwrap(),
            Arc::new(checker),
        ));
        let space = Arc::new(BundleSpace::new(bundle, Some(base), &ComponentFactory::new()).unwrap());
        let mut r = PathRestriction::new(space).unwrap();
        r.set_base_path(vec![State::new(vec![0.0]), State::new(vec![1.0])])
            .unwrap();
        r
    }

    /// Wall over `x ∈ [0.5, 0.6]`, open above `y = 0.4`.
    fn low_wall() -> ValidityChecker {
        let region = BoxRegion::new(vec![0.5, -1.0], vec![0.6, 0.4]).unwrap();
        ValidityChecker::new().with_rule(BoxObstacleRule::new(vec![0, 1], vec![region]).unwrap())
    }

    fn query(map: &mut Roadmap, start: [f64; 2], goal: [f64; 2]) -> (ConfigId, ConfigId) {
        let s = map.add_configuration(State::new(start.to_vec()));
        let g = map.add_configuration(State::new(goal.to_vec()));
        (s, g)
    }

    #[test]
    fn trivial_fiber_is_rejected() {
        let base = Arc::new(SpaceInformation::unconstrained(StateSpace::cube(2, 0.0, 1.0).unwrap()));
        let bundle = Arc::new(SpaceInformation::unconstrained(StateSpace::cube(2, 0.0, 1.0).unwrap()));
        let space = Arc::new(BundleSpace::new(bundle, Some(base), &ComponentFactory::new()).unwrap());
        let r = PathRestriction::new(space).unwrap();
        assert!(FindSection::new(&r, SectionConfig::default()).is_err());
    }

    #[test]
    fn free_section_needs_no_repairs() {
        let r = restriction(ValidityChecker::new());
        let mut map = Roadmap::new();
        let (start, goal) = query(&mut map, [0.0, 0.0], [1.0, 0.8]);
        let mut rng = StdRng::seed_from_u64(7);

        let (found, stats) = r.check_section(&mut map, start, goal, &SectionConfig::default(), &mut rng);
        assert!(found);
        assert_eq!(stats.repair_calls(), 0);
        assert_eq!(stats.passes, 1);
        assert_eq!(stats.success_depth, Some(0));
        assert!(map.same_component(start, goal));
    }

    #[test]
    fn blocked_fiber_last_is_repaired_by_fiber_first() {
        let r = restriction(low_wall());
        let mut map = Roadmap::new();
        let (start, goal) = query(&mut map, [0.0, 0.0], [1.0, 0.8]);
        let mut rng = StdRng::seed_from_u64(7);

        let (found, stats) = r.check_section(&mut map, start, goal, &SectionConfig::default(), &mut rng);
        assert!(found);
        let stopped = stats.first_failure_location.unwrap();
        assert!((stopped - 0.5).abs() < 0.025, "stopped at {stopped}");
        assert_eq!(stats.success_policy, Some(InterpolationPolicy::FiberFirst));
        assert_eq!(stats.success_depth, Some(1));

        let path = map.shortest_path(start, goal).unwrap();
        let last = map.state(*path.last().unwrap());
        assert!((last[0] - 1.0).abs() < 1e-9);
        for pair in path.windows(2) {
            assert!(r.bundle().bundle().check_motion(map.state(pair[0]), map.state(pair[1])));
        }
    }

    #[test]
    fn direct_only_stops_after_interpolation() {
        let r = restriction(low_wall());
        let mut map = Roadmap::new();
        let (start, goal) = query(&mut map, [0.0, 0.0], [1.0, 0.8]);
        let config = SectionConfig {
            strategy: SectionStrategy::DirectOnly,
            ..SectionConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(7);

        let (found, stats) = r.check_section(&mut map, start, goal, &config, &mut rng);
        // The second pass starts fiber-first and goes straight over the wall.
        assert!(found);
        assert_eq!(stats.passes, 2);
        assert_eq!(stats.repair_calls(), 0);
    }

    #[test]
    fn always_invalid_middle_terminates() {
        let middle = PredicateRule::new("middle", |s: &[f64]| s[0] <= 0.0 || s[0] >= 1.0);
        let r = restriction(ValidityChecker::new().with_rule(middle));
        let mut map = Roadmap::new();
        let (start, goal) = query(&mut map, [0.0, 0.0], [1.0, 0.5]);
        let config = SectionConfig::default();
        let mut rng = StdRng::seed_from_u64(3);

        let (found, stats) = r.check_section(&mut map, start, goal, &config, &mut rng);
        assert!(!found);
        assert_eq!(stats.passes, 2);
        assert!(stats.attempts <= 2 * config.attempt_budget());
        assert!(!map.same_component(start, goal));
    }

    #[test]
    fn zero_progress_wriggle_leaves_head_alone() {
        let ledge = PredicateRule::new("ledge", |s: &[f64]| s[0] <= 0.305);
        let r = restriction(ValidityChecker::new().with_rule(ledge));
        let mut map = Roadmap::new();
        let (start, goal) = query(&mut map, [0.3, 0.0], [1.0, 0.0]);
        let mut head = Head::new(r.bundle(), &map, start, 0.3, goal, r.length());
        let before = head.clone();
        let mut rng = StdRng::seed_from_u64(11);

        let mut finder = FindSection::new(&r, SectionConfig::default()).unwrap();
        assert!(!finder.wriggle_free(&mut head, &mut map, &mut rng));
        assert_eq!(head, before);
        assert_eq!(map.len(), 2);
        assert_eq!(finder.stats().wriggle_calls, 1);
    }

    #[test]
    fn wriggle_steps_through_open_space() {
        let r = restriction(ValidityChecker::new());
        let mut map = Roadmap::new();
        let (start, goal) = query(&mut map, [0.0, 0.0], [1.0, 0.0]);
        let mut head = Head::new(r.bundle(), &map, start, 0.0, goal, 0.05);
        let mut rng = StdRng::seed_from_u64(5);

        let mut finder = FindSection::new(&r, SectionConfig::default()).unwrap();
        assert!(finder.wriggle_free(&mut head, &mut map, &mut rng));
        assert!(head.location() > 0.0);
        assert!(map.same_component(start, head.config()));
    }

    #[test]
    fn corner_step_links_head_to_target() {
        for seed in 0..5 {
            let r = restriction(low_wall());
            let mut map = Roadmap::new();
            let (start, goal) = query(&mut map, [0.0, 0.0], [1.0, 0.8]);
            let mut head = Head::new(r.bundle(), &map, start, 0.0, goal, r.length());
            let mut rng = StdRng::seed_from_u64(seed);

            let mut finder = FindSection::new(&r, SectionConfig::default()).unwrap();
            assert!(finder.corner_step(&mut head, &mut map, &mut rng), "seed {seed}");
            assert!(head.reached_target());
            assert_eq!(head.location(), r.length());
            assert!(map.same_component(start, goal));
            assert_eq!(map.len(), 3);
            assert_eq!(finder.stats().corner_step_calls, 1);
        }
    }

    /// A flat post across the head's fiber value over `x ∈ [0.495, 0.531]`.
    fn flat_post() -> ValidityChecker {
        let region = BoxRegion::new(vec![0.495, -0.025], vec![0.531, 0.025]).unwrap();
        ValidityChecker::new().with_rule(BoxObstacleRule::new(vec![0, 1], vec![region]).unwrap())
    }

    #[test]
    fn tunneling_crosses_a_blocked_stretch() {
        let r = restriction(flat_post());
        let mut crossed = 0;
        for seed in 0..10 {
            let mut map = Roadmap::new();
            let (start, goal) = query(&mut map, [0.45, 0.0], [1.0, 0.0]);
            let mut head = Head::new(r.bundle(), &map, start, 0.45, goal, r.length());
            let mut rng = StdRng::seed_from_u64(seed);

            let mut finder = FindSection::new(&r, SectionConfig::default()).unwrap();
            let found = finder.tunneling(&mut head, &mut map, &mut rng);
            assert_eq!(finder.stats().tunneling_calls, 1);
            if !found {
                assert_eq!(head.config(), start);
                continue;
            }
            crossed += 1;
            assert!(head.location() > 0.531);
            assert!(head.state()[0] > 0.531);
            assert!(r.bundle().bundle().is_valid(head.state()));
            assert!(map.same_component(start, head.config()));
        }
        assert!(crossed > 0);
    }

    #[test]
    fn tunnel_exit_lies_past_the_first_blocked_location() {
        // Blocks only the upper half of the fiber in one thin column.
        let column = BoxRegion::new(vec![0.495, 0.0], vec![0.505, 1.0]).unwrap();
        let checker = ValidityChecker::new().with_rule(BoxObstacleRule::new(vec![0, 1], vec![column]).unwrap());
        let r = restriction(checker);

        let mut crossed = 0;
        for seed in 0..10 {
            let mut map = Roadmap::new();
            let (start, goal) = query(&mut map, [0.45, 0.0], [1.0, 0.0]);
            let mut head = Head::new(r.bundle(), &map, start, 0.45, goal, r.length());
            let mut rng = StdRng::seed_from_u64(seed);

            let mut finder = FindSection::new(&r, SectionConfig::default()).unwrap();
            if finder.tunneling(&mut head, &mut map, &mut rng) {
                crossed += 1;
                assert!(head.location() > 0.505, "seed {seed} stopped at {}", head.location());
            }
        }
        assert!(crossed > 0);
    }

    #[test]
    fn search_with_tunneling_gets_past_a_post() {
        let r = restriction(flat_post());
        // Without wriggling the blocked head falls through to tunneling.
        let config = SectionConfig {
            enable_tunneling: true,
            max_wriggling: 0,
            ..SectionConfig::default()
        };

        let mut solved = 0;
        for seed in 0..5 {
            let mut map = Roadmap::new();
            let (start, goal) = query(&mut map, [0.0, 0.0], [1.0, 0.0]);
            let mut rng = StdRng::seed_from_u64(seed);

            let (found, stats) = r.check_section(&mut map, start, goal, &config, &mut rng);
            assert!(stats.tunneling_calls > 0);
            assert!(stats.first_failure_location.unwrap() < 0.495);
            if found {
                solved += 1;
                assert!(map.same_component(start, goal));
            }
        }
        assert!(solved > 0);
    }

    #[test]
    fn triple_step_detours_around_a_post() {
        // A post right in front of the head at the head's fiber value.
        let post = BoxRegion::new(vec![0.45, -0.2], vec![0.55, 0.2]).unwrap();
        let checker = ValidityChecker::new().with_rule(BoxObstacleRule::new(vec![0, 1], vec![post]).unwrap());
        let r = restriction(checker);
        let mut map = Roadmap::new();
        let (start, goal) = query(&mut map, [0.4, 0.0], [1.0, 0.0]);
        let mut head = Head::new(r.bundle(), &map, start, 0.4, goal, r.length());

        let mut finder = FindSection::new(&r, SectionConfig::default()).unwrap();
        let side = [0.6, 0.6];
        assert!(finder.triple_step(&mut head, &mut map, &side, 0.6));
        assert_eq!(head.location(), 0.6);
        assert_eq!(&head.state()[..], &side);
        assert!(map.same_component(start, head.config()));
        assert_eq!(map.len(), 5);
    }
}
