//! [`ComponentFactory`] – projection registry and dispatcher.
//!
//! The factory stores the catalog of [`ComponentPattern`]s in priority order.
//! Given a bundle slot and an optional base slot it picks the first pattern
//! whose predicate accepts the pair of shapes and calls its constructor.
//!
//! # Dispatch order
//!
//! 1. no base space → `NONE`
//! 2. identical shapes → `IDENTITY`, or `RELAXATION` when the two spaces are
//!    validated by different checkers
//! 3. zero-dimensional base → `EMPTY_SET`
//! 4. the named patterns of [`crate::components`]
//!
//! A pair no pattern accepts fails with [`PlanError::UnknownProjection`].

use quotient_space::StateSpace;
use quotient_types::{PlanError, SpaceKind, SpaceShape};
use tracing::debug;

use crate::component::{ComponentKind, ProjectionComponent};
use crate::components::{self, ComponentPattern};

/// Number of independently projected components of a space.
///
/// Compound spaces count one component per slot, except the two-slot
/// patterns `SO2×Rⁿ`, `SE2×Rⁿ`, `Rⁿ×SO2` and `SO2×SO2`, which count as one
/// when their second slot is non-empty.
pub fn component_count(shape: &SpaceShape) -> usize {
    if !shape.is_compound() {
        return 1;
    }
    if shape.slots.len() == 2 {
        let coupled = shape.is_pair(SpaceKind::So2, SpaceKind::RealVector)
            || shape.is_pair(SpaceKind::Se2, SpaceKind::RealVector)
            || shape.is_pair(SpaceKind::RealVector, SpaceKind::So2)
            || shape.is_pair(SpaceKind::So2, SpaceKind::So2);
        if coupled && shape.slots[1].dimension > 0 {
            return 1;
        }
    }
    shape.slots.len()
}

/// Registry of projection patterns.
///
/// Construct with [`ComponentFactory::new`] for the built-in catalog, or
/// [`ComponentFactory::empty`] plus [`ComponentFactory::register`] for a
/// custom one.
pub struct ComponentFactory {
    patterns: Vec<ComponentPattern>,
}

impl Default for ComponentFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentFactory {
    /// The built-in catalog.
    pub fn new() -> Self {
        Self {
            patterns: components::catalog(),
        }
    }

    /// A factory without any pattern; only `NONE` projections succeed.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Append a pattern. It is tried after every pattern registered before.
    pub fn register(&mut self, pattern: ComponentPattern) {
        self.patterns.push(pattern);
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Kind of the first pattern accepting `(bundle, base)`.
    pub fn identify(&self, bundle: &SpaceShape, base: Option<&SpaceShape>) -> Option<ComponentKind> {
        match base {
            None => Some(ComponentKind::None),
            Some(base) => self
                .patterns
                .iter()
                .find(|p| (p.matches)(bundle, base))
                .map(|p| p.kind),
        }
    }

    /// Build the component projecting `bundle` onto `base`.
    ///
    /// `same_validity` tells whether bundle and base are validated by the
    /// same checker; an identity projection between differently constrained
    /// spaces becomes a relaxation.
    pub fn make_component(
        &self,
        bundle: &StateSpace,
        base: Option<&StateSpace>,
        same_validity: bool,
    ) -> Result<ProjectionComponent, PlanError> {
        let Some(base) = base else {
            let n = bundle.dimension();
            return Ok(ProjectionComponent::new(
                ComponentKind::None,
                n,
                Vec::new(),
                Vec::new(),
                None,
            ));
        };

        let bundle_shape = bundle.shape();
        let base_shape = base.shape();
        let pattern = self
            .patterns
            .iter()
            .find(|p| (p.matches)(&bundle_shape, &base_shape))
            .ok_or_else(|| PlanError::UnknownProjection {
                bundle: bundle_shape.to_string(),
                base: base_shape.to_string(),
            })?;

        let component = if pattern.kind == ComponentKind::Identity && !same_validity {
            components::identity_split(ComponentKind::Relaxation, bundle)
        } else {
            (pattern.build)(bundle, base)?
        };
        debug!(
            bundle = %bundle_shape,
            base = %base_shape,
            kind = %component.kind(),
            fiber_dimension = component.fiber_dimension(),
            "projection component selected"
        );
        Ok(component)
    }

    /// Decompose `bundle` (and `base`) into components and build each one.
    ///
    /// # Errors
    ///
    /// [`PlanError::ComponentCountMismatch`] when the two spaces decompose
    /// into a different number of components, [`PlanError::UnknownProjection`]
    /// when a component pair matches no pattern.
    pub fn make_components(
        &self,
        bundle: &StateSpace,
        base: Option<&StateSpace>,
        same_validity: bool,
    ) -> Result<Vec<ProjectionComponent>, PlanError> {
        let bundle_count = component_count(&bundle.shape());
        if let Some(base) = base {
            let base_count = component_count(&base.shape());
            if base_count != bundle_count {
                return Err(PlanError::ComponentCountMismatch {
                    bundle: bundle_count,
                    base: base_count,
                });
            }
        }

        if bundle_count == 1 {
            return Ok(vec![self.make_component(bundle, base, same_validity)?]);
        }

        let bundle_slots = bundle.slots();
        (0..bundle_count)
            .map(|m| {
                let base_slot = base.map(|b| &b.slots()[m]);
                self.make_component(&bundle_slots[m], base_slot, same_validity)
            })
            .collect()
    }
}
