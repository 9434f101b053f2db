//! Concrete state spaces and their metric.
//!
//! A [`StateSpace`] never owns states; it interprets flat coordinate slices.
//! The layout of each variant is:
//!
//! | Variant | Coordinates | Metric |
//! |---------|-------------|--------|
//! | [`StateSpace::RealVector`] | `n` reals inside `[low, high]` | Euclidean |
//! | [`StateSpace::So2`]        | one angle in `[-π, π)`          | shorter arc |
//! | [`StateSpace::Se2`]        | `[x, y, yaw]`                   | `‖xy‖ + 0.5·arc(yaw)` |
//! | [`StateSpace::Compound`]   | slots concatenated in order     | sum of slot metrics |
//!
//! # Example
//!
//! ```rust
//! use quotient_space::space::StateSpace;
//!
//! let plane = StateSpace::real_vector(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
//! let mut mid = [0.0; 2];
//! plane.interpolate(&[0.0, 0.0], &[1.0, 1.0], 0.5, &mut mid);
//! assert_eq!(mid, [0.5, 0.5]);
//! assert!((plane.distance(&[0.0, 0.0], &[1.0, 1.0]) - 2f64.sqrt()).abs() < 1e-12);
//! ```

use std::f64::consts::{PI, TAU};
use std::ops::Range;

use quotient_types::{PlanError, SpaceKind, SpaceShape, State};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Weight of the rotational part in the SE(2) metric.
pub const SE2_ROTATION_WEIGHT: f64 = 0.5;

/// Map an angle into `[-π, π)`.
pub fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

fn angle_distance(a: f64, b: f64) -> f64 {
    wrap_angle(b - a).abs()
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn sample_interval<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    if high > low {
        rng.gen_range(low..=high)
    } else {
        low
    }
}

/// Sample inside `[near - radius, near + radius] ∩ [low, high]`.
fn sample_interval_near<R: Rng + ?Sized>(
    rng: &mut R,
    near: f64,
    radius: f64,
    low: f64,
    high: f64,
) -> f64 {
    let lo = (near - radius).max(low);
    let hi = (near + radius).min(high);
    if lo > hi {
        near.clamp(low, high)
    } else {
        sample_interval(rng, lo, hi)
    }
}

fn sample_angle_near<R: Rng + ?Sized>(rng: &mut R, near: f64, radius: f64) -> f64 {
    if radius >= PI {
        rng.gen_range(-PI..PI)
    } else {
        wrap_angle(near + sample_interval(rng, -radius, radius))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// StateSpace
// ────────────────────────────────────────────────────────────────────────────

/// A bounded configuration space.
#[derive(Debug, Clone, PartialEq)]
pub enum StateSpace {
    RealVector { low: Vec<f64>, high: Vec<f64> },
    So2,
    Se2 { low: [f64; 2], high: [f64; 2] },
    Compound(Vec<StateSpace>),
}

impl StateSpace {
    /// A box `[low, high]` in `R^n`. A zero-dimensional box is allowed and
    /// stands for the empty fiber.
    pub fn real_vector(low: Vec<f64>, high: Vec<f64>) -> Result<Self, PlanError> {
        if low.len() != high.len() {
            return Err(PlanError::InvalidSpace(format!(
                "real vector bounds have {} lower and {} upper values",
                low.len(),
                high.len()
            )));
        }
        if let Some(i) = (0..low.len()).find(|&i| !(low[i] <= high[i])) {
            return Err(PlanError::InvalidSpace(format!(
                "bound {i} has low {} above high {}",
                low[i], high[i]
            )));
        }
        Ok(StateSpace::RealVector { low, high })
    }

    /// An `n`-dimensional box with the same bounds on every axis.
    pub fn cube(dimension: usize, low: f64, high: f64) -> Result<Self, PlanError> {
        Self::real_vector(vec![low; dimension], vec![high; dimension])
    }

    /// The planar rigid-body space with translational bounds `[low, high]`.
    pub fn se2(low: [f64; 2], high: [f64; 2]) -> Result<Self, PlanError> {
        if !(low[0] <= high[0] && low[1] <= high[1]) {
            return Err(PlanError::InvalidSpace(format!(
                "SE2 bounds {low:?} are not below {high:?}"
            )));
        }
        Ok(StateSpace::Se2 { low, high })
    }

    /// Concatenation of `parts`, which must not be empty.
    pub fn compound(parts: Vec<StateSpace>) -> Result<Self, PlanError> {
        if parts.is_empty() {
            return Err(PlanError::InvalidSpace(
                "compound space needs at least one slot".to_string(),
            ));
        }
        Ok(StateSpace::Compound(parts))
    }

    pub fn dimension(&self) -> usize {
        match self {
            StateSpace::RealVector { low, .. } => low.len(),
            StateSpace::So2 => 1,
            StateSpace::Se2 { .. } => 3,
            StateSpace::Compound(parts) => parts.iter().map(StateSpace::dimension).sum(),
        }
    }

    /// Structural descriptor used for projection dispatch.
    pub fn shape(&self) -> SpaceShape {
        match self {
            StateSpace::RealVector { low, .. } => {
                SpaceShape::atomic(SpaceKind::RealVector, low.len())
            }
            StateSpace::So2 => SpaceShape::atomic(SpaceKind::So2, 1),
            StateSpace::Se2 { .. } => SpaceShape::atomic(SpaceKind::Se2, 3),
            StateSpace::Compound(parts) => {
                SpaceShape::compound(parts.iter().map(StateSpace::shape).collect())
            }
        }
    }

    /// Slots of a compound space, or the space itself for atomic spaces.
    pub fn slots(&self) -> &[StateSpace] {
        match self {
            StateSpace::Compound(parts) => parts,
            other => std::slice::from_ref(other),
        }
    }

    /// Coordinate ranges of every slot (see [`StateSpace::slots`]).
    pub fn slot_ranges(&self) -> Vec<Range<usize>> {
        let mut offset = 0;
        self.slots()
            .iter()
            .map(|slot| {
                let range = offset..offset + slot.dimension();
                offset = range.end;
                range
            })
            .collect()
    }

    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            StateSpace::RealVector { .. } => euclidean(a, b),
            StateSpace::So2 => angle_distance(a[0], b[0]),
            StateSpace::Se2 { .. } => {
                euclidean(&a[..2], &b[..2]) + SE2_ROTATION_WEIGHT * angle_distance(a[2], b[2])
            }
            StateSpace::Compound(parts) => parts
                .iter()
                .zip(self.slot_ranges())
                .map(|(part, r)| part.distance(&a[r.clone()], &b[r]))
                .sum(),
        }
    }

    /// Write the state at fraction `t` of the way from `from` to `to` into
    /// `out`. Angles travel along the shorter arc.
    pub fn interpolate(&self, from: &[f64], to: &[f64], t: f64, out: &mut [f64]) {
        match self {
            StateSpace::RealVector { .. } => {
                for ((o, a), b) in out.iter_mut().zip(from).zip(to) {
                    *o = a + (b - a) * t;
                }
            }
            StateSpace::So2 => {
                out[0] = wrap_angle(from[0] + wrap_angle(to[0] - from[0]) * t);
            }
            StateSpace::Se2 { .. } => {
                out[0] = from[0] + (to[0] - from[0]) * t;
                out[1] = from[1] + (to[1] - from[1]) * t;
                out[2] = wrap_angle(from[2] + wrap_angle(to[2] - from[2]) * t);
            }
            StateSpace::Compound(parts) => {
                for (part, r) in parts.iter().zip(self.slot_ranges()) {
                    part.interpolate(&from[r.clone()], &to[r.clone()], t, &mut out[r]);
                }
            }
        }
    }

    /// Clamp translational coordinates into bounds and wrap angles.
    pub fn enforce_bounds(&self, state: &mut [f64]) {
        match self {
            StateSpace::RealVector { low, high } => {
                for (i, v) in state.iter_mut().enumerate() {
                    *v = v.clamp(low[i], high[i]);
                }
            }
            StateSpace::So2 => state[0] = wrap_angle(state[0]),
            StateSpace::Se2 { low, high } => {
                state[0] = state[0].clamp(low[0], high[0]);
                state[1] = state[1].clamp(low[1], high[1]);
                state[2] = wrap_angle(state[2]);
            }
            StateSpace::Compound(parts) => {
                for (part, r) in parts.iter().zip(self.slot_ranges()) {
                    part.enforce_bounds(&mut state[r]);
                }
            }
        }
    }

    pub fn satisfies_bounds(&self, state: &[f64]) -> bool {
        if state.len() != self.dimension() {
            return false;
        }
        match self {
            StateSpace::RealVector { low, high } => state
                .iter()
                .enumerate()
                .all(|(i, v)| *v >= low[i] && *v <= high[i]),
            StateSpace::So2 => state[0] >= -PI && state[0] <= PI,
            StateSpace::Se2 { low, high } => {
                state[0] >= low[0]
                    && state[0] <= high[0]
                    && state[1] >= low[1]
                    && state[1] <= high[1]
                    && state[2] >= -PI
                    && state[2] <= PI
            }
            StateSpace::Compound(parts) => parts
                .iter()
                .zip(self.slot_ranges())
                .all(|(part, r)| part.satisfies_bounds(&state[r])),
        }
    }

    /// Draw a state uniformly inside the bounds.
    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut [f64]) {
        match self {
            StateSpace::RealVector { low, high } => {
                for (i, v) in out.iter_mut().enumerate() {
                    *v = sample_interval(rng, low[i], high[i]);
                }
            }
            StateSpace::So2 => out[0] = rng.gen_range(-PI..PI),
            StateSpace::Se2 { low, high } => {
                out[0] = sample_interval(rng, low[0], high[0]);
                out[1] = sample_interval(rng, low[1], high[1]);
                out[2] = rng.gen_range(-PI..PI);
            }
            StateSpace::Compound(parts) => {
                for (part, r) in parts.iter().zip(self.slot_ranges()) {
                    part.sample_uniform(rng, &mut out[r]);
                }
            }
        }
    }

    /// Draw a state within `radius` of `near` per coordinate, kept inside
    /// the bounds.
    pub fn sample_uniform_near<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        near: &[f64],
        radius: f64,
        out: &mut [f64],
    ) {
        match self {
            StateSpace::RealVector { low, high } => {
                for (i, v) in out.iter_mut().enumerate() {
                    *v = sample_interval_near(rng, near[i], radius, low[i], high[i]);
                }
            }
            StateSpace::So2 => out[0] = sample_angle_near(rng, near[0], radius),
            StateSpace::Se2 { low, high } => {
                out[0] = sample_interval_near(rng, near[0], radius, low[0], high[0]);
                out[1] = sample_interval_near(rng, near[1], radius, low[1], high[1]);
                out[2] = sample_angle_near(rng, near[2], radius);
            }
            StateSpace::Compound(parts) => {
                for (part, r) in parts.iter().zip(self.slot_ranges()) {
                    part.sample_uniform_near(rng, &near[r.clone()], radius, &mut out[r]);
                }
            }
        }
    }

    /// Upper bound on the distance between any two states.
    pub fn maximum_extent(&self) -> f64 {
        match self {
            StateSpace::RealVector { low, high } => euclidean(low, high),
            StateSpace::So2 => PI,
            StateSpace::Se2 { low, high } => euclidean(low, high) + SE2_ROTATION_WEIGHT * PI,
            StateSpace::Compound(parts) => parts.iter().map(StateSpace::maximum_extent).sum(),
        }
    }

    /// The identity element: all coordinates zero, pulled into bounds.
    pub fn zero_state(&self) -> State {
        let mut state = State::zeros(self.dimension());
        self.enforce_bounds(&mut state);
        state
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SpaceSpec
// ────────────────────────────────────────────────────────────────────────────

/// Serialisable description of a [`StateSpace`], as written in scenario files.
///
/// ```toml
/// kind = "compound"
/// parts = [
///     { kind = "se2", low = [0.0, 0.0], high = [1.0, 1.0] },
///     { kind = "real_vector", low = [-1.0], high = [1.0] },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpaceSpec {
    RealVector { low: Vec<f64>, high: Vec<f64> },
    So2,
    Se2 { low: [f64; 2], high: [f64; 2] },
    Compound { parts: Vec<SpaceSpec> },
}

impl SpaceSpec {
    /// Validate the description and build the space.
    pub fn build(&self) -> Result<StateSpace, PlanError> {
        match self {
            SpaceSpec::RealVector { low, high } => {
                StateSpace::real_vector(low.clone(), high.clone())
            }
            SpaceSpec::So2 => Ok(StateSpace::So2),
            SpaceSpec::Se2 { low, high } => StateSpace::se2(*low, *high),
            SpaceSpec::Compound { parts } => {
                let built = parts
                    .iter()
                    .map(SpaceSpec::build)
                    .collect::<Result<Vec<_>, _>>()?;
                StateSpace::compound(built)
            }
        }
    }
}
