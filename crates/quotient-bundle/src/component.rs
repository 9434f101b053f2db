//! [`ProjectionComponent`] – one bundle → base projection over a single
//! (possibly compound) slot.
//!
//! Every projection in the catalog is a coordinate split: the base state is a
//! selection of the bundle coordinates, the fiber state is the complementary
//! selection, and lifting writes both selections back. A component therefore
//! only records which bundle coordinates go where, plus the fiber space built
//! from the bounds of the fiber coordinates.

use std::fmt;

use quotient_space::StateSpace;
use serde::{Deserialize, Serialize};

/// Name of a projection pattern, in factory priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// No base space: the coarsest level.
    None,
    /// The base space is zero-dimensional; the fiber is the whole bundle.
    EmptySet,
    /// Bundle and base are the same space with the same constraints.
    Identity,
    /// Bundle and base are the same space under different constraints.
    Relaxation,
    RnRm,
    RnSo2Rn,
    Se2R2,
    Se2RnSe2,
    Se2RnR2,
    Se2RnSe2Rm,
    So2RnSo2,
    So2RnSo2Rm,
    So2nSo2m,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentKind::None => "NONE",
            ComponentKind::EmptySet => "EMPTY_SET",
            ComponentKind::Identity => "IDENTITY",
            ComponentKind::Relaxation => "RELAXATION",
            ComponentKind::RnRm => "RN_RM",
            ComponentKind::RnSo2Rn => "RNSO2_RN",
            ComponentKind::Se2R2 => "SE2_R2",
            ComponentKind::Se2RnSe2 => "SE2RN_SE2",
            ComponentKind::Se2RnR2 => "SE2RN_R2",
            ComponentKind::Se2RnSe2Rm => "SE2RN_SE2RM",
            ComponentKind::So2RnSo2 => "SO2RN_SO2",
            ComponentKind::So2RnSo2Rm => "SO2RN_SO2RM",
            ComponentKind::So2nSo2m => "SO2N_SO2M",
        };
        write!(f, "{name}")
    }
}

/// A coordinate-split projection of one bundle slot onto one base slot.
#[derive(Debug, Clone)]
pub struct ProjectionComponent {
    kind: ComponentKind,
    bundle_dimension: usize,
    base_coords: Vec<usize>,
    fiber_coords: Vec<usize>,
    fiber: Option<StateSpace>,
}

impl ProjectionComponent {
    /// `base_coords[i]` is the bundle coordinate holding base coordinate `i`;
    /// likewise for `fiber_coords`. A fiber space is only kept when it has at
    /// least one coordinate.
    pub fn new(
        kind: ComponentKind,
        bundle_dimension: usize,
        base_coords: Vec<usize>,
        fiber_coords: Vec<usize>,
        fiber: Option<StateSpace>,
    ) -> Self {
        let fiber = fiber.filter(|space| space.dimension() > 0);
        Self {
            kind,
            bundle_dimension,
            base_coords,
            fiber_coords,
            fiber,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn bundle_dimension(&self) -> usize {
        self.bundle_dimension
    }

    pub fn base_dimension(&self) -> usize {
        self.base_coords.len()
    }

    pub fn fiber_dimension(&self) -> usize {
        self.fiber_coords.len()
    }

    pub fn fiber_space(&self) -> Option<&StateSpace> {
        self.fiber.as_ref()
    }

    pub fn project_base(&self, bundle: &[f64], base: &mut [f64]) {
        for (out, &c) in base.iter_mut().zip(&self.base_coords) {
            *out = bundle[c];
        }
    }

    pub fn project_fiber(&self, bundle: &[f64], fiber: &mut [f64]) {
        for (out, &c) in fiber.iter_mut().zip(&self.fiber_coords) {
            *out = bundle[c];
        }
    }

    pub fn lift_state(&self, base: &[f64], fiber: &[f64], bundle: &mut [f64]) {
        for (value, &c) in base.iter().zip(&self.base_coords) {
            bundle[c] = *value;
        }
        for (value, &c) in fiber.iter().zip(&self.fiber_coords) {
            bundle[c] = *value;
        }
    }
}
