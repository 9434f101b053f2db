//! [`PathRestriction`] – the tube of bundle states over one base path.
//!
//! The restriction owns a copy of the base path and its arclength table.
//! Arclengths are measured with the base space's own metric, and any
//! arclength maps to a base state by interpolating inside the bracketing
//! segment.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use quotient_bundle::{BundleSpace, ComponentFactory};
//! use quotient_section::PathRestriction;
//! use quotient_space::{SpaceInformation, StateSpace};
//! use quotient_types::State;
//!
//! let base = Arc::new(SpaceInformation::unconstrained(StateSpace::cube(1, 0.0, 2.0).unwrap()));
//! let bundle = Arc::new(SpaceInformation::unconstrained(StateSpace::cube(2, 0.0, 2.0).unwrap()));
//! let space = Arc::new(BundleSpace::new(bundle, Some(base), &ComponentFactory::new()).unwrap());
//!
//! let mut restriction = PathRestriction::new(space).unwrap();
//! restriction
//!     .set_base_path(vec![State::new(vec![0.0]), State::new(vec![2.0])])
//!     .unwrap();
//!
//! let mut out = [0.0];
//! restriction.interpolate_base_path(0.5, &mut out);
//! assert_eq!(out, [0.5]);
//! restriction.interpolate_base_path(7.0, &mut out);
//! assert_eq!(out, [2.0]);
//! ```

use std::sync::Arc;

use quotient_bundle::BundleSpace;
use quotient_graph::{ConfigId, Roadmap};
use quotient_space::SpaceInformation;
use quotient_types::{PlanError, State};
use rand::RngCore;
use tracing::warn;

use crate::config::SectionConfig;
use crate::find_section::{FindSection, SectionStats};
use crate::head::Head;

#[derive(Debug)]
pub struct PathRestriction {
    bundle: Arc<BundleSpace>,
    base: Arc<SpaceInformation>,
    base_path: Vec<State>,
    /// `cumulative[i]` is the arclength of waypoint `i`.
    cumulative: Vec<f64>,
}

impl PathRestriction {
    /// The bundle space must have a base space.
    pub fn new(bundle: Arc<BundleSpace>) -> Result<Self, PlanError> {
        let base = bundle.base().cloned().ok_or_else(|| {
            PlanError::InvalidSpace("path restriction needs a bundle space with a base".to_string())
        })?;
        Ok(Self {
            bundle,
            base,
            base_path: Vec::new(),
            cumulative: Vec::new(),
        })
    }

    pub fn bundle(&self) -> &BundleSpace {
        &self.bundle
    }

    pub fn base(&self) -> &SpaceInformation {
        &self.base
    }

    /// Replace the base path and recompute every cached length.
    pub fn set_base_path(&mut self, path: Vec<State>) -> Result<(), PlanError> {
        if path.is_empty() {
            return Err(PlanError::EmptyBasePath);
        }
        let dimension = self.base.dimension();
        if let Some(bad) = path.iter().find(|s| s.len() != dimension) {
            return Err(PlanError::DimensionMismatch {
                context: "base path state".to_string(),
                expected: dimension,
                actual: bad.len(),
            });
        }

        self.cumulative.clear();
        self.cumulative.push(0.0);
        let mut total = 0.0;
        for pair in path.windows(2) {
            total += self.base.distance(&pair[0], &pair[1]);
            self.cumulative.push(total);
        }
        self.base_path = path;
        Ok(())
    }

    pub fn base_path(&self) -> &[State] {
        &self.base_path
    }

    /// Total arclength of the base path.
    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Number of waypoints.
    pub fn len(&self) -> usize {
        self.base_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base_path.is_empty()
    }

    /// Arclength of waypoint `index`, clamped to the last waypoint.
    pub fn location_at_index(&self, index: usize) -> f64 {
        match self.cumulative.get(index) {
            Some(location) => *location,
            None => self.length(),
        }
    }

    /// Index of the first waypoint lying strictly beyond `location`, or
    /// `len()` when there is none.
    pub fn next_index_after(&self, location: f64) -> usize {
        self.cumulative.partition_point(|l| *l <= location)
    }

    /// Write the base state at `location` into `out`.
    ///
    /// Locations below zero clamp to the first waypoint, locations beyond
    /// the total length to the last one.
    pub fn interpolate_base_path(&self, location: f64, out: &mut [f64]) {
        let Some(first) = self.base_path.first() else {
            return;
        };
        if location <= 0.0 || self.base_path.len() == 1 {
            out.copy_from_slice(first);
            return;
        }
        if location >= self.length() {
            out.copy_from_slice(&self.base_path[self.base_path.len() - 1]);
            return;
        }

        // cumulative[i] <= location < cumulative[i + 1]
        let i = self.next_index_after(location) - 1;
        let segment = self.cumulative[i + 1] - self.cumulative[i];
        if segment <= 0.0 {
            out.copy_from_slice(&self.base_path[i + 1]);
            return;
        }
        let t = (location - self.cumulative[i]) / segment;
        self.base
            .interpolate(&self.base_path[i], &self.base_path[i + 1], t, out);
    }

    /// Search for a section from `start` to `goal`, returning the outcome
    /// together with the finder's counters.
    pub fn check_section(
        &self,
        roadmap: &mut Roadmap,
        start: ConfigId,
        goal: ConfigId,
        config: &SectionConfig,
        rng: &mut dyn RngCore,
    ) -> (bool, SectionStats) {
        let mut finder = match FindSection::new(self, config.clone()) {
            Ok(finder) => finder,
            Err(error) => {
                warn!(%error, "section search unavailable");
                return (false, SectionStats::default());
            }
        };
        let mut head = Head::new(&self.bundle, roadmap, start, 0.0, goal, self.length());
        let found = finder.solve(&mut head, roadmap, rng);
        (found, finder.stats().clone())
    }

    /// `true` when a feasible section connects `start` to `goal`. Failure to
    /// find one is never an error.
    pub fn has_feasible_section(
        &self,
        roadmap: &mut Roadmap,
        start: ConfigId,
        goal: ConfigId,
        config: &SectionConfig,
        rng: &mut dyn RngCore,
    ) -> bool {
        self.check_section(roadmap, start, goal, config, rng).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotient_bundle::ComponentFactory;
    use quotient_space::StateSpace;

    fn restriction(path: &[f64]) -> PathRestriction {
        let base = Arc::new(SpaceInformation::unconstrained(StateSpace::cube(1, -5.0, 5.0).unwrap()));
        let bundle = Arc::new(SpaceInformation::unconstrained(StateSpace::cube(2, -5.0, 5.0).unwrap()));
        let space = Arc::new(BundleSpace::new(bundle, Some(base), &ComponentFactory::new()).unwrap());
        let mut r = PathRestriction::new(space).unwrap();
        r.set_base_path(path.iter().map(|x| State::new(vec![*x])).collect())
            .unwrap();
        r
    }

    fn at(r: &PathRestriction, location: f64) -> f64 {
        let mut out = [0.0];
        r.interpolate_base_path(location, &mut out);
        out[0]
    }

    #[test]
    fn empty_path_is_rejected() {
        let mut r = restriction(&[0.0]);
        assert_eq!(r.set_base_path(Vec::new()), Err(PlanError::EmptyBasePath));
    }

    #[test]
    fn wrong_dimension_is_rejected() {
        let mut r = restriction(&[0.0]);
        let err = r.set_base_path(vec![State::new(vec![0.0, 1.0])]).unwrap_err();
        assert!(matches!(err, PlanError::DimensionMismatch { expected: 1, actual: 2, .. }));
    }

    #[test]
    fn root_level_has_no_restriction() {
        let bundle = Arc::new(SpaceInformation::unconstrained(StateSpace::cube(1, 0.0, 1.0).unwrap()));
        let space = Arc::new(BundleSpace::new(bundle, None, &ComponentFactory::new()).unwrap());
        assert!(PathRestriction::new(space).is_err());
    }

    #[test]
    fn single_state_path_returns_that_state_everywhere() {
        let r = restriction(&[0.7]);
        assert_eq!(r.length(), 0.0);
        for location in [0.0, 0.3, 1.0, 100.0] {
            assert_eq!(at(&r, location), 0.7);
        }
    }

    #[test]
    fn repeated_waypoints_have_zero_length() {
        let r = restriction(&[0.7, 0.7, 0.7]);
        assert_eq!(r.length(), 0.0);
        assert_eq!(at(&r, 0.5), 0.7);
    }

    #[test]
    fn interpolation_clamps_both_ends() {
        let r = restriction(&[0.0, 1.0, 3.0]);
        assert_eq!(at(&r, -1.0), 0.0);
        assert_eq!(at(&r, 10.0), 3.0);
        assert_eq!(at(&r, r.length()), 3.0);
    }

    #[test]
    fn interpolation_is_monotone_along_the_path() {
        let r = restriction(&[0.0, 1.0, 3.0, 3.5]);
        assert_eq!(r.length(), 3.5);
        let mut previous = at(&r, 0.0);
        for k in 1..=70 {
            let x = at(&r, k as f64 * 0.05);
            assert!(x >= previous - 1e-12);
            previous = x;
        }
        assert!((at(&r, 2.0) - 2.0).abs() < 1e-12);
        assert_eq!(at(&r, 1.0), at(&r, 1.0));
    }

    #[test]
    fn interpolation_follows_backtracking_paths() {
        let r = restriction(&[0.0, 2.0, 1.0]);
        assert_eq!(r.length(), 3.0);
        assert!((at(&r, 2.5) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn set_base_path_resets_lengths() {
        let mut r = restriction(&[0.0, 4.0]);
        r.set_base_path(vec![State::new(vec![0.0]), State::new(vec![1.0])])
            .unwrap();
        assert_eq!(r.length(), 1.0);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn waypoint_lookup() {
        let r = restriction(&[0.0, 1.0, 3.0]);
        assert_eq!(r.location_at_index(1), 1.0);
        assert_eq!(r.location_at_index(9), 3.0);
        assert_eq!(r.next_index_after(0.0), 1);
        assert_eq!(r.next_index_after(1.0), 2);
        assert_eq!(r.next_index_after(2.9), 2);
        assert_eq!(r.next_index_after(3.0), 3);
    }
}
