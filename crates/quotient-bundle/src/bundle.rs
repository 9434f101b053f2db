//! [`BundleSpace`] – the (bundle, base, fiber) triple of one level.
//!
//! The bundle is the level's own space; the base is the previous level's
//! space, absent for the coarsest level. The fiber space is derived from the
//! projection the first time it is needed and is never constrained.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use quotient_bundle::{BundleSpace, ComponentFactory};
//! use quotient_space::{SpaceInformation, StateSpace};
//!
//! let plane = Arc::new(SpaceInformation::unconstrained(
//!     StateSpace::cube(2, 0.0, 1.0).unwrap(),
//! ));
//! let line = Arc::new(SpaceInformation::unconstrained(
//!     StateSpace::cube(1, 0.0, 1.0).unwrap(),
//! ));
//! let bundle = BundleSpace::new(plane, Some(line), &ComponentFactory::new()).unwrap();
//!
//! let mut lifted = [0.0; 2];
//! bundle.lift_state(&[0.25], &[0.75], &mut lifted);
//! assert_eq!(lifted, [0.25, 0.75]);
//! assert_eq!(bundle.fiber_dimension(), 1);
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};

use quotient_space::SpaceInformation;
use quotient_types::{PlanError, State};
use rand::Rng;
use tracing::info;

use crate::component::ComponentKind;
use crate::factory::ComponentFactory;
use crate::projection::Projection;

pub struct BundleSpace {
    bundle: Arc<SpaceInformation>,
    base: Option<Arc<SpaceInformation>>,
    projection: Projection,
    fiber: OnceLock<Option<Arc<SpaceInformation>>>,
}

impl BundleSpace {
    pub fn new(
        bundle: Arc<SpaceInformation>,
        base: Option<Arc<SpaceInformation>>,
        factory: &ComponentFactory,
    ) -> Result<Self, PlanError> {
        let same_validity = base.as_ref().is_some_and(|b| b.shares_checker(&bundle));
        let projection = Projection::new(
            factory,
            bundle.space(),
            base.as_ref().map(|b| b.space()),
            same_validity,
        )?;
        let space = Self {
            bundle,
            base,
            projection,
            fiber: OnceLock::new(),
        };
        info!(projection = %space, "bundle space ready");
        Ok(space)
    }

    pub fn bundle(&self) -> &Arc<SpaceInformation> {
        &self.bundle
    }

    pub fn base(&self) -> Option<&Arc<SpaceInformation>> {
        self.base.as_ref()
    }

    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn kinds(&self) -> Vec<ComponentKind> {
        self.projection.kinds()
    }

    /// The fiber space, built on first use. `None` when the fiber is trivial.
    pub fn fiber(&self) -> Option<&Arc<SpaceInformation>> {
        self.fiber
            .get_or_init(|| {
                self.projection
                    .fiber_space()
                    .map(|space| Arc::new(SpaceInformation::unconstrained(space.clone())))
            })
            .as_ref()
    }

    pub fn bundle_dimension(&self) -> usize {
        self.bundle.dimension()
    }

    pub fn base_dimension(&self) -> usize {
        self.projection.base_dimension()
    }

    pub fn fiber_dimension(&self) -> usize {
        self.projection.fiber_dimension()
    }

    pub fn alloc_bundle_state(&self) -> State {
        State::zeros(self.bundle_dimension())
    }

    pub fn alloc_base_state(&self) -> State {
        State::zeros(self.base_dimension())
    }

    pub fn alloc_fiber_state(&self) -> State {
        State::zeros(self.fiber_dimension())
    }

    pub fn project_base(&self, bundle: &[f64], base: &mut [f64]) {
        self.projection.project_base(bundle, base);
    }

    pub fn project_fiber(&self, bundle: &[f64], fiber: &mut [f64]) {
        self.projection.project_fiber(bundle, fiber);
    }

    pub fn lift_state(&self, base: &[f64], fiber: &[f64], bundle: &mut [f64]) {
        self.projection.lift_state(base, fiber, bundle);
    }

    /// Uniform fiber sample. Leaves `out` untouched for a trivial fiber.
    pub fn sample_fiber<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut [f64]) {
        if let Some(fiber) = self.fiber() {
            fiber.sample_uniform(rng, out);
        }
    }

    /// The identity element of the fiber.
    pub fn zero_fiber_state(&self) -> State {
        self.fiber()
            .map(|fiber| fiber.space().zero_state())
            .unwrap_or_default()
    }
}

impl fmt::Display for BundleSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<String> = self.kinds().iter().map(|k| k.to_string()).collect();
        let base = self
            .base
            .as_ref()
            .map_or_else(|| "-".to_string(), |b| b.space().shape().to_string());
        write!(
            f,
            "{} -> {} [{}]",
            self.bundle.space().shape(),
            base,
            kinds.join(", ")
        )
    }
}

impl fmt::Debug for BundleSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleSpace")
            .field("projection", &self.to_string())
            .field("fiber_dimension", &self.fiber_dimension())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotient_space::{PredicateRule, StateSpace, ValidityChecker};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn info(space: StateSpace) -> Arc<SpaceInformation> {
        Arc::new(SpaceInformation::unconstrained(space))
    }

    #[test]
    fn root_level_has_no_fiber() {
        let space = BundleSpace::new(info(StateSpace::cube(2, 0.0, 1.0).unwrap()), None, &ComponentFactory::new())
            .unwrap();
        assert!(!space.has_base());
        assert!(space.fiber().is_none());
        assert_eq!(space.kinds(), vec![ComponentKind::None]);
        assert!(space.zero_fiber_state().is_empty());
    }

    #[test]
    fn shared_checker_gives_identity() {
        let bundle = info(StateSpace::cube(2, 0.0, 1.0).unwrap());
        let base = Arc::new(SpaceInformation::new(
            StateSpace::cube(2, 0.0, 1.0).unwrap(),
            bundle.checker().clone(),
        ));
        let space = BundleSpace::new(bundle, Some(base), &ComponentFactory::new()).unwrap();
        assert_eq!(space.kinds(), vec![ComponentKind::Identity]);
    }

    #[test]
    fn different_checker_gives_relaxation() {
        let bundle = Arc::new(SpaceInformation::new(
            StateSpace::cube(2, 0.0, 1.0).unwrap(),
            Arc::new(ValidityChecker::new().with_rule(PredicateRule::new("x", |s: &[f64]| s[0] < 0.9))),
        ));
        let base = info(StateSpace::cube(2, 0.0, 1.0).unwrap());
        let space = BundleSpace::new(bundle, Some(base), &ComponentFactory::new()).unwrap();
        assert_eq!(space.kinds(), vec![ComponentKind::Relaxation]);
        assert_eq!(space.fiber_dimension(), 0);
    }

    #[test]
    fn fiber_samples_stay_in_bounds() {
        let bundle = info(StateSpace::real_vector(vec![0.0, -1.0], vec![1.0, 1.0]).unwrap());
        let base = info(StateSpace::cube(1, 0.0, 1.0).unwrap());
        let space = BundleSpace::new(bundle, Some(base), &ComponentFactory::new()).unwrap();
        let fiber = space.fiber().unwrap().clone();
        let mut rng = StdRng::seed_from_u64(11);
        let mut f = space.alloc_fiber_state();
        for _ in 0..50 {
            space.sample_fiber(&mut rng, &mut f);
            assert!(fiber.space().satisfies_bounds(&f));
        }
        assert!(Arc::ptr_eq(space.fiber().unwrap(), &fiber));
    }

    #[test]
    fn display_names_the_projection() {
        let space = BundleSpace::new(
            info(StateSpace::se2([0.0, 0.0], [1.0, 1.0]).unwrap()),
            Some(info(StateSpace::cube(2, 0.0, 1.0).unwrap())),
            &ComponentFactory::new(),
        )
        .unwrap();
        assert_eq!(space.to_string(), "SE2 -> R2 [SE2_R2]");
    }
}
