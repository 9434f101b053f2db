//! [`SpaceInformation`] – a space together with its validity checker.
//!
//! Motions are validated by discretisation: the straight (metric) segment
//! between two states is cut into `ceil(d / longest_valid_segment_length)`
//! pieces and every intermediate state is checked.

use std::sync::Arc;

use quotient_types::State;
use rand::Rng;

use crate::space::StateSpace;
use crate::validity::ValidityChecker;

/// Default motion-check resolution, as a fraction of the maximum extent.
pub const DEFAULT_RESOLUTION: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct SpaceInformation {
    space: StateSpace,
    checker: Arc<ValidityChecker>,
    resolution: f64,
}

impl SpaceInformation {
    pub fn new(space: StateSpace, checker: Arc<ValidityChecker>) -> Self {
        Self {
            space,
            checker,
            resolution: DEFAULT_RESOLUTION,
        }
    }

    /// A space without constraints.
    pub fn unconstrained(space: StateSpace) -> Self {
        Self::new(space, Arc::new(ValidityChecker::new()))
    }

    /// Override the motion-check resolution. Non-positive values are ignored.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        if resolution > 0.0 {
            self.resolution = resolution;
        }
        self
    }

    pub fn space(&self) -> &StateSpace {
        &self.space
    }

    pub fn checker(&self) -> &Arc<ValidityChecker> {
        &self.checker
    }

    /// `true` when both spaces validate states with the very same checker.
    pub fn shares_checker(&self, other: &SpaceInformation) -> bool {
        Arc::ptr_eq(&self.checker, &other.checker)
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn dimension(&self) -> usize {
        self.space.dimension()
    }

    pub fn alloc_state(&self) -> State {
        State::zeros(self.dimension())
    }

    pub fn longest_valid_segment_length(&self) -> f64 {
        self.resolution * self.space.maximum_extent()
    }

    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        self.space.distance(a, b)
    }

    pub fn interpolate(&self, from: &[f64], to: &[f64], t: f64, out: &mut [f64]) {
        self.space.interpolate(from, to, t, out);
    }

    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut [f64]) {
        self.space.sample_uniform(rng, out);
    }

    pub fn sample_uniform_near<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        near: &[f64],
        radius: f64,
        out: &mut [f64],
    ) {
        self.space.sample_uniform_near(rng, near, radius, out);
    }

    /// Inside the bounds and accepted by every validity rule.
    pub fn is_valid(&self, state: &[f64]) -> bool {
        self.space.satisfies_bounds(state) && self.checker.is_valid(state)
    }

    fn segment_count(&self, a: &[f64], b: &[f64]) -> usize {
        let segment = self.longest_valid_segment_length();
        if segment <= 0.0 {
            return 1;
        }
        ((self.distance(a, b) / segment).ceil() as usize).max(1)
    }

    /// `true` when every state on the segment `a → b` is valid. `a` itself is
    /// assumed valid.
    pub fn check_motion(&self, a: &[f64], b: &[f64]) -> bool {
        if !self.is_valid(b) {
            return false;
        }
        let n = self.segment_count(a, b);
        let mut probe = vec![0.0; a.len()];
        (1..n).all(|j| {
            self.interpolate(a, b, j as f64 / n as f64, &mut probe);
            self.is_valid(&probe)
        })
    }

    /// Like [`SpaceInformation::check_motion`], walking from `a` towards `b`.
    ///
    /// On failure returns the last valid state on the segment together with
    /// its fraction of the way from `a` to `b`.
    pub fn check_motion_last_valid(&self, a: &[f64], b: &[f64]) -> (bool, Option<(State, f64)>) {
        let n = self.segment_count(a, b);
        let mut probe = vec![0.0; a.len()];
        for j in 1..n {
            self.interpolate(a, b, j as f64 / n as f64, &mut probe);
            if !self.is_valid(&probe) {
                return (false, Some(self.last_valid(a, b, (j - 1) as f64 / n as f64)));
            }
        }
        if !self.is_valid(b) {
            return (false, Some(self.last_valid(a, b, (n - 1) as f64 / n as f64)));
        }
        (true, None)
    }

    fn last_valid(&self, a: &[f64], b: &[f64], fraction: f64) -> (State, f64) {
        let mut state = self.alloc_state();
        self.interpolate(a, b, fraction, &mut state);
        (state, fraction)
    }
}
