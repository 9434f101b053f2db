//! [`Projection`] – the full bundle → base map, assembled from components.
//!
//! Component `m` reads the bundle coordinates of slot `m`, writes the base
//! coordinates of slot `m` and owns a contiguous run of fiber coordinates.
//! The fiber space is the product of the non-empty component fibers.

use std::ops::Range;

use quotient_space::StateSpace;
use quotient_types::PlanError;

use crate::component::{ComponentKind, ProjectionComponent};
use crate::factory::ComponentFactory;

#[derive(Debug, Clone)]
struct Placed {
    component: ProjectionComponent,
    bundle: Range<usize>,
    base: Range<usize>,
    fiber: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct Projection {
    placed: Vec<Placed>,
    bundle_dimension: usize,
    base_dimension: usize,
    fiber_dimension: usize,
    fiber_space: Option<StateSpace>,
}

impl Projection {
    /// Build the projection of `bundle` onto `base` with `factory`.
    pub fn new(
        factory: &ComponentFactory,
        bundle: &StateSpace,
        base: Option<&StateSpace>,
        same_validity: bool,
    ) -> Result<Self, PlanError> {
        let components = factory.make_components(bundle, base, same_validity)?;
        Ok(Self::from_components(components))
    }

    pub fn from_components(components: Vec<ProjectionComponent>) -> Self {
        let mut placed = Vec::with_capacity(components.len());
        let (mut bundle_at, mut base_at, mut fiber_at) = (0, 0, 0);
        let mut fibers = Vec::new();

        for component in components {
            let bundle = bundle_at..bundle_at + component.bundle_dimension();
            let base = base_at..base_at + component.base_dimension();
            let fiber = fiber_at..fiber_at + component.fiber_dimension();
            (bundle_at, base_at, fiber_at) = (bundle.end, base.end, fiber.end);
            if let Some(space) = component.fiber_space() {
                fibers.push(space.clone());
            }
            placed.push(Placed {
                component,
                bundle,
                base,
                fiber,
            });
        }

        let fiber_space = match fibers.len() {
            0 => None,
            1 => fibers.pop(),
            _ => Some(StateSpace::Compound(fibers)),
        };

        Self {
            placed,
            bundle_dimension: bundle_at,
            base_dimension: base_at,
            fiber_dimension: fiber_at,
            fiber_space,
        }
    }

    pub fn kinds(&self) -> Vec<ComponentKind> {
        self.placed.iter().map(|p| p.component.kind()).collect()
    }

    pub fn components(&self) -> impl Iterator<Item = &ProjectionComponent> {
        self.placed.iter().map(|p| &p.component)
    }

    pub fn bundle_dimension(&self) -> usize {
        self.bundle_dimension
    }

    pub fn base_dimension(&self) -> usize {
        self.base_dimension
    }

    pub fn fiber_dimension(&self) -> usize {
        self.fiber_dimension
    }

    pub fn fiber_space(&self) -> Option<&StateSpace> {
        self.fiber_space.as_ref()
    }

    pub fn project_base(&self, bundle: &[f64], base: &mut [f64]) {
        for p in &self.placed {
            p.component
                .project_base(&bundle[p.bundle.clone()], &mut base[p.base.clone()]);
        }
    }

    pub fn project_fiber(&self, bundle: &[f64], fiber: &mut [f64]) {
        for p in &self.placed {
            p.component
                .project_fiber(&bundle[p.bundle.clone()], &mut fiber[p.fiber.clone()]);
        }
    }

    pub fn lift_state(&self, base: &[f64], fiber: &[f64], bundle: &mut [f64]) {
        for p in &self.placed {
            p.component.lift_state(
                &base[p.base.clone()],
                &fiber[p.fiber.clone()],
                &mut bundle[p.bundle.clone()],
            );
        }
    }
}
