//! The projection catalog: one predicate and one constructor per pattern.
//!
//! Predicates look only at [`SpaceShape`] descriptors. Constructors receive
//! the concrete spaces so the fiber inherits the bundle's bounds.
//!
//! | Pattern | Bundle | Base | Fiber |
//! |---------|--------|------|-------|
//! | `EMPTY_SET`   | X          | (dim 0)    | X        |
//! | `IDENTITY`    | X          | X          | –        |
//! | `RN_RM`       | Rⁿ         | Rᵐ, m < n  | Rⁿ⁻ᵐ     |
//! | `RNSO2_RN`    | Rⁿ × SO2   | Rⁿ         | SO2      |
//! | `SE2_R2`      | SE2        | R²         | SO2      |
//! | `SE2RN_SE2`   | SE2 × Rⁿ   | SE2        | Rⁿ       |
//! | `SE2RN_R2`    | SE2 × Rⁿ   | R²         | SO2 × Rⁿ |
//! | `SE2RN_SE2RM` | SE2 × Rⁿ   | SE2 × Rᵐ   | Rⁿ⁻ᵐ     |
//! | `SO2RN_SO2`   | SO2 × Rⁿ   | SO2        | Rⁿ       |
//! | `SO2RN_SO2RM` | SO2 × Rⁿ   | SO2 × Rᵐ   | Rⁿ⁻ᵐ     |
//! | `SO2N_SO2M`   | SO2ⁿ       | SO2ᵐ       | SO2ⁿ⁻ᵐ   |

use quotient_space::StateSpace;
use quotient_types::{PlanError, SpaceKind, SpaceShape};

use crate::component::{ComponentKind, ProjectionComponent};

pub type MatchFn = fn(&SpaceShape, &SpaceShape) -> bool;
pub type BuildFn = fn(&StateSpace, &StateSpace) -> Result<ProjectionComponent, PlanError>;

/// One catalog entry.
#[derive(Clone, Copy)]
pub struct ComponentPattern {
    pub kind: ComponentKind,
    pub matches: MatchFn,
    pub build: BuildFn,
}

/// All patterns that need a base space, in priority order.
pub fn catalog() -> Vec<ComponentPattern> {
    vec![
        pattern(ComponentKind::Identity, is_identity, build_identity),
        pattern(ComponentKind::EmptySet, is_empty_set, build_empty_set),
        pattern(ComponentKind::RnRm, is_rn_rm, build_rn_rm),
        pattern(ComponentKind::RnSo2Rn, is_rnso2_rn, build_rnso2_rn),
        pattern(ComponentKind::Se2R2, is_se2_r2, build_se2_r2),
        pattern(ComponentKind::Se2RnSe2, is_se2rn_se2, build_se2rn_se2),
        pattern(ComponentKind::Se2RnR2, is_se2rn_r2, build_se2rn_r2),
        pattern(ComponentKind::Se2RnSe2Rm, is_se2rn_se2rm, build_se2rn_se2rm),
        pattern(ComponentKind::So2RnSo2, is_so2rn_so2, build_so2rn_so2),
        pattern(ComponentKind::So2RnSo2Rm, is_so2rn_so2rm, build_so2rn_so2rm),
        pattern(ComponentKind::So2nSo2m, is_so2n_so2m, build_so2n_so2m),
    ]
}

fn pattern(kind: ComponentKind, matches: MatchFn, build: BuildFn) -> ComponentPattern {
    ComponentPattern {
        kind,
        matches,
        build,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn coords(range: std::ops::Range<usize>) -> Vec<usize> {
    range.collect()
}

fn second_slot_dimension(shape: &SpaceShape) -> usize {
    shape.slots.get(1).map_or(0, |s| s.dimension)
}

/// The real-vector coordinates of `space` from index `skip` onwards.
fn real_vector_tail(space: &StateSpace, skip: usize) -> Result<StateSpace, PlanError> {
    match space {
        StateSpace::RealVector { low, high } if skip <= low.len() => {
            StateSpace::real_vector(low[skip..].to_vec(), high[skip..].to_vec())
        }
        other => Err(PlanError::InvalidSpace(format!(
            "expected a real vector slot of at least {skip} dimensions, got {}",
            other.shape()
        ))),
    }
}

fn slot(space: &StateSpace, index: usize) -> Result<&StateSpace, PlanError> {
    space.slots().get(index).ok_or_else(|| {
        PlanError::InvalidSpace(format!("{} has no slot {index}", space.shape()))
    })
}

/// Identity-style split used by both `IDENTITY` and `RELAXATION`.
pub fn identity_split(kind: ComponentKind, bundle: &StateSpace) -> ProjectionComponent {
    let n = bundle.dimension();
    ProjectionComponent::new(kind, n, coords(0..n), Vec::new(), None)
}

// ────────────────────────────────────────────────────────────────────────────
// Predicates
// ────────────────────────────────────────────────────────────────────────────

pub fn is_identity(bundle: &SpaceShape, base: &SpaceShape) -> bool {
    if bundle.is_compound() || base.is_compound() {
        bundle.is_compound()
            && base.is_compound()
            && bundle.slots.len() == base.slots.len()
            && bundle
                .slots
                .iter()
                .zip(&base.slots)
                .all(|(a, b)| is_identity(a, b))
    } else {
        bundle.kind == base.kind && bundle.dimension == base.dimension
    }
}

pub fn is_empty_set(_bundle: &SpaceShape, base: &SpaceShape) -> bool {
    base.dimension == 0
}

pub fn is_rn_rm(bundle: &SpaceShape, base: &SpaceShape) -> bool {
    bundle.is(SpaceKind::RealVector)
        && base.is(SpaceKind::RealVector)
        && bundle.dimension > base.dimension
        && base.dimension > 0
}

pub fn is_rnso2_rn(bundle: &SpaceShape, base: &SpaceShape) -> bool {
    bundle.is_pair(SpaceKind::RealVector, SpaceKind::So2)
        && base.is(SpaceKind::RealVector)
        && bundle.slots[0].dimension == base.dimension
}

pub fn is_se2_r2(bundle: &SpaceShape, base: &SpaceShape) -> bool {
    bundle.is(SpaceKind::Se2) && base.is(SpaceKind::RealVector) && base.dimension == 2
}

pub fn is_se2rn_se2(bundle: &SpaceShape, base: &SpaceShape) -> bool {
    bundle.is_pair(SpaceKind::Se2, SpaceKind::RealVector) && base.is(SpaceKind::Se2)
}

pub fn is_se2rn_r2(bundle: &SpaceShape, base: &SpaceShape) -> bool {
    bundle.is_pair(SpaceKind::Se2, SpaceKind::RealVector)
        && base.is(SpaceKind::RealVector)
        && base.dimension == 2
}

fn is_xrn_xrm(bundle: &SpaceShape, base: &SpaceShape, head: SpaceKind) -> bool {
    if !bundle.is_pair(head, SpaceKind::RealVector) || !base.is_pair(head, SpaceKind::RealVector) {
        return false;
    }
    let n = second_slot_dimension(bundle);
    let m = second_slot_dimension(base);
    n > m && m > 0
}

pub fn is_se2rn_se2rm(bundle: &SpaceShape, base: &SpaceShape) -> bool {
    is_xrn_xrm(bundle, base, SpaceKind::Se2)
}

pub fn is_so2rn_so2(bundle: &SpaceShape, base: &SpaceShape) -> bool {
    bundle.is_pair(SpaceKind::So2, SpaceKind::RealVector) && base.is(SpaceKind::So2)
}

pub fn is_so2rn_so2rm(bundle: &SpaceShape, base: &SpaceShape) -> bool {
    is_xrn_xrm(bundle, base, SpaceKind::So2)
}

pub fn is_so2n_so2m(bundle: &SpaceShape, base: &SpaceShape) -> bool {
    let all_so2 = |shape: &SpaceShape| shape.slots.iter().all(|s| s.is(SpaceKind::So2));
    let base_ok = if base.is_compound() {
        all_so2(base)
    } else {
        base.is(SpaceKind::So2)
    };
    bundle.is_compound() && all_so2(bundle) && base_ok && base.dimension < bundle.dimension
}

// ────────────────────────────────────────────────────────────────────────────
// Constructors
// ────────────────────────────────────────────────────────────────────────────

fn build_identity(bundle: &StateSpace, _base: &StateSpace) -> Result<ProjectionComponent, PlanError> {
    Ok(identity_split(ComponentKind::Identity, bundle))
}

fn build_empty_set(bundle: &StateSpace, _base: &StateSpace) -> Result<ProjectionComponent, PlanError> {
    let n = bundle.dimension();
    Ok(ProjectionComponent::new(
        ComponentKind::EmptySet,
        n,
        Vec::new(),
        coords(0..n),
        Some(bundle.clone()),
    ))
}

fn build_rn_rm(bundle: &StateSpace, base: &StateSpace) -> Result<ProjectionComponent, PlanError> {
    let (n, m) = (bundle.dimension(), base.dimension());
    Ok(ProjectionComponent::new(
        ComponentKind::RnRm,
        n,
        coords(0..m),
        coords(m..n),
        Some(real_vector_tail(bundle, m)?),
    ))
}

fn build_rnso2_rn(bundle: &StateSpace, base: &StateSpace) -> Result<ProjectionComponent, PlanError> {
    let m = base.dimension();
    Ok(ProjectionComponent::new(
        ComponentKind::RnSo2Rn,
        m + 1,
        coords(0..m),
        vec![m],
        Some(StateSpace::So2),
    ))
}

fn build_se2_r2(_bundle: &StateSpace, _base: &StateSpace) -> Result<ProjectionComponent, PlanError> {
    Ok(ProjectionComponent::new(
        ComponentKind::Se2R2,
        3,
        vec![0, 1],
        vec![2],
        Some(StateSpace::So2),
    ))
}

fn build_se2rn_se2(bundle: &StateSpace, _base: &StateSpace) -> Result<ProjectionComponent, PlanError> {
    let n = bundle.dimension();
    Ok(ProjectionComponent::new(
        ComponentKind::Se2RnSe2,
        n,
        coords(0..3),
        coords(3..n),
        Some(real_vector_tail(slot(bundle, 1)?, 0)?),
    ))
}

fn build_se2rn_r2(bundle: &StateSpace, _base: &StateSpace) -> Result<ProjectionComponent, PlanError> {
    let n = bundle.dimension();
    let fiber = StateSpace::compound(vec![StateSpace::So2, real_vector_tail(slot(bundle, 1)?, 0)?])?;
    Ok(ProjectionComponent::new(
        ComponentKind::Se2RnR2,
        n,
        vec![0, 1],
        coords(2..n),
        Some(fiber),
    ))
}

fn build_se2rn_se2rm(bundle: &StateSpace, base: &StateSpace) -> Result<ProjectionComponent, PlanError> {
    let (n, m) = (bundle.dimension(), base.dimension());
    Ok(ProjectionComponent::new(
        ComponentKind::Se2RnSe2Rm,
        n,
        coords(0..m),
        coords(m..n),
        Some(real_vector_tail(slot(bundle, 1)?, m - 3)?),
    ))
}

fn build_so2rn_so2(bundle: &StateSpace, _base: &StateSpace) -> Result<ProjectionComponent, PlanError> {
    let n = bundle.dimension();
    Ok(ProjectionComponent::new(
        ComponentKind::So2RnSo2,
        n,
        vec![0],
        coords(1..n),
        Some(real_vector_tail(slot(bundle, 1)?, 0)?),
    ))
}

fn build_so2rn_so2rm(bundle: &StateSpace, base: &StateSpace) -> Result<ProjectionComponent, PlanError> {
    let (n, m) = (bundle.dimension(), base.dimension());
    Ok(ProjectionComponent::new(
        ComponentKind::So2RnSo2Rm,
        n,
        coords(0..m),
        coords(m..n),
        Some(real_vector_tail(slot(bundle, 1)?, m - 1)?),
    ))
}

fn build_so2n_so2m(bundle: &StateSpace, base: &StateSpace) -> Result<ProjectionComponent, PlanError> {
    let (n, m) = (bundle.dimension(), base.dimension());
    let fiber = match n - m {
        1 => StateSpace::So2,
        k => StateSpace::compound(vec![StateSpace::So2; k])?,
    };
    Ok(ProjectionComponent::new(
        ComponentKind::So2nSo2m,
        n,
        coords(0..m),
        coords(m..n),
        Some(fiber),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rn(n: usize) -> StateSpace {
        StateSpace::cube(n, -1.0, 1.0).unwrap()
    }

    fn pair(a: StateSpace, b: StateSpace) -> StateSpace {
        StateSpace::compound(vec![a, b]).unwrap()
    }

    fn se2() -> StateSpace {
        StateSpace::se2([0.0, 0.0], [1.0, 1.0]).unwrap()
    }

    fn matching(bundle: &StateSpace, base: &StateSpace) -> Vec<ComponentKind> {
        catalog()
            .into_iter()
            .filter(|p| (p.matches)(&bundle.shape(), &base.shape()))
            .map(|p| p.kind)
            .collect()
    }

    #[test]
    fn identity_matches_same_shape_only() {
        assert!(is_identity(&rn(3).shape(), &rn(3).shape()));
        assert!(!is_identity(&rn(3).shape(), &rn(2).shape()));
        assert!(is_identity(&pair(se2(), rn(2)).shape(), &pair(se2(), rn(2)).shape()));
        assert!(!is_identity(&pair(se2(), rn(2)).shape(), &se2().shape()));
    }

    #[test]
    fn rn_rm_keeps_trailing_bounds() {
        let bundle = StateSpace::real_vector(vec![0.0, -1.0, -2.0], vec![1.0, 1.0, 2.0]).unwrap();
        let c = build_rn_rm(&bundle, &rn(1)).unwrap();
        assert_eq!(c.base_dimension(), 1);
        assert_eq!(
            c.fiber_space(),
            Some(&StateSpace::real_vector(vec![-1.0, -2.0], vec![1.0, 2.0]).unwrap())
        );
    }

    #[test]
    fn se2_r2_is_unique_match() {
        assert_eq!(matching(&se2(), &rn(2)), vec![ComponentKind::Se2R2]);
    }

    #[test]
    fn se2rn_r2_fiber_is_so2_times_rn() {
        let bundle = pair(se2(), rn(2));
        let c = build_se2rn_r2(&bundle, &rn(2)).unwrap();
        assert_eq!(c.fiber_dimension(), 3);
        assert_eq!(c.fiber_space().unwrap().shape().to_string(), "SO2xR2");

        let state = [0.1, 0.2, 0.3, 0.4, 0.5];
        let mut fiber = [0.0; 3];
        c.project_fiber(&state, &mut fiber);
        assert_eq!(fiber, [0.3, 0.4, 0.5]);
    }

    #[test]
    fn se2rn_se2rm_splits_real_part() {
        let bundle = pair(se2(), rn(3));
        let base = pair(se2(), rn(1));
        assert_eq!(matching(&bundle, &base), vec![ComponentKind::Se2RnSe2Rm]);
        let c = build_se2rn_se2rm(&bundle, &base).unwrap();
        assert_eq!(c.base_dimension(), 4);
        assert_eq!(c.fiber_dimension(), 2);
    }

    #[test]
    fn so2rn_patterns() {
        let bundle = pair(StateSpace::So2, rn(2));
        assert_eq!(matching(&bundle, &StateSpace::So2), vec![ComponentKind::So2RnSo2]);
        let base = pair(StateSpace::So2, rn(1));
        let c = build_so2rn_so2rm(&bundle, &base).unwrap();
        assert_eq!(c.fiber_dimension(), 1);
    }

    #[test]
    fn so2n_so2m_fiber_has_remaining_angles() {
        let bundle = StateSpace::compound(vec![StateSpace::So2; 3]).unwrap();
        let base = pair(StateSpace::So2, StateSpace::So2);
        assert!(is_so2n_so2m(&bundle.shape(), &base.shape()));
        let c = build_so2n_so2m(&bundle, &base).unwrap();
        assert_eq!(c.fiber_space(), Some(&StateSpace::So2));
    }

    #[test]
    fn empty_base_gives_whole_bundle_as_fiber() {
        let empty = StateSpace::real_vector(vec![], vec![]).unwrap();
        assert_eq!(matching(&rn(2), &empty), vec![ComponentKind::EmptySet]);
        let c = build_empty_set(&rn(2), &empty).unwrap();
        assert_eq!(c.fiber_dimension(), 2);
        assert_eq!(c.base_dimension(), 0);
    }
}
