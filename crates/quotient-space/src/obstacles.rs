//! Axis-aligned box obstacles over chosen coordinates.
//!
//! # Key types
//!
//! | Type | Role |
//! |------|------|
//! | [`BoxRegion`]       | An axis-aligned box in `n` dimensions.                   |
//! | [`BoxObstacleRule`] | Rejects states whose selected coordinates hit any box.  |
//!
//! # Example
//!
//! ```rust
//! use quotient_space::obstacles::{BoxObstacleRule, BoxRegion};
//! use quotient_space::validity::ValidityRule;
//!
//! // A wall at x ∈ [0.5, 0.6], y ∈ [-1, 0.4] on the first two coordinates.
//! let wall = BoxRegion::new(vec![0.5, -1.0], vec![0.6, 0.4]).unwrap();
//! let rule = BoxObstacleRule::new(vec![0, 1], vec![wall]).unwrap();
//!
//! assert!(!rule.is_valid(&[0.55, 0.0]));
//! assert!(rule.is_valid(&[0.55, 0.8]));
//! ```

use quotient_types::PlanError;
use serde::{Deserialize, Serialize};

use crate::validity::ValidityRule;

// ────────────────────────────────────────────────────────────────────────────
// BoxRegion
// ────────────────────────────────────────────────────────────────────────────

/// An axis-aligned box, defined by its minimum and maximum corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxRegion {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl BoxRegion {
    /// Create a box from two opposite corners.
    ///
    /// The corners are normalised so that `min ≤ max` per axis.
    pub fn new(a: Vec<f64>, b: Vec<f64>) -> Result<Self, PlanError> {
        if a.len() != b.len() {
            return Err(PlanError::DimensionMismatch {
                context: "box corners".to_string(),
                expected: a.len(),
                actual: b.len(),
            });
        }
        let min = a.iter().zip(&b).map(|(x, y)| x.min(*y)).collect();
        let max = a.iter().zip(&b).map(|(x, y)| x.max(*y)).collect();
        Ok(Self { min, max })
    }

    pub fn dimension(&self) -> usize {
        self.min.len()
    }

    /// Return the centre point of the box.
    pub fn centre(&self) -> Vec<f64> {
        self.min
            .iter()
            .zip(&self.max)
            .map(|(lo, hi)| (lo + hi) * 0.5)
            .collect()
    }

    /// True when the point lies inside or on the boundary of the box.
    pub fn contains_point(&self, p: &[f64]) -> bool {
        p.len() == self.dimension()
            && p
                .iter()
                .zip(self.min.iter().zip(&self.max))
                .all(|(v, (lo, hi))| v >= lo && v <= hi)
    }

    /// True when `other` overlaps (intersects or touches) this box.
    pub fn overlaps(&self, other: &BoxRegion) -> bool {
        self.dimension() == other.dimension()
            && (0..self.dimension())
                .all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }
}

// ────────────────────────────────────────────────────────────────────────────
// BoxObstacleRule
// ────────────────────────────────────────────────────────────────────────────

/// Rejects a state when its coordinates at `axes` fall inside any box.
#[derive(Debug, Clone)]
pub struct BoxObstacleRule {
    axes: Vec<usize>,
    boxes: Vec<BoxRegion>,
}

impl BoxObstacleRule {
    /// Every box must have one bound per entry of `axes`.
    pub fn new(axes: Vec<usize>, boxes: Vec<BoxRegion>) -> Result<Self, PlanError> {
        if let Some(bad) = boxes.iter().find(|b| b.dimension() != axes.len()) {
            return Err(PlanError::DimensionMismatch {
                context: "box obstacle".to_string(),
                expected: axes.len(),
                actual: bad.dimension(),
            });
        }
        Ok(Self { axes, boxes })
    }

    pub fn axes(&self) -> &[usize] {
        &self.axes
    }

    pub fn boxes(&self) -> &[BoxRegion] {
        &self.boxes
    }

    fn hits(&self, state: &[f64], region: &BoxRegion) -> bool {
        self.axes.iter().enumerate().all(|(i, &axis)| {
            state
                .get(axis)
                .is_some_and(|v| *v >= region.min[i] && *v <= region.max[i])
        })
    }
}

impl ValidityRule for BoxObstacleRule {
    fn name(&self) -> &str {
        "box_obstacles"
    }

    fn is_valid(&self, state: &[f64]) -> bool {
        !self.boxes.iter().any(|region| self.hits(state, region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BoxRegion {
        BoxRegion::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap()
    }

    #[test]
    fn new_normalises_corners() {
        let b = BoxRegion::new(vec![1.0, -1.0], vec![0.0, 2.0]).unwrap();
        assert_eq!(b.min, vec![0.0, -1.0]);
        assert_eq!(b.max, vec![1.0, 2.0]);
    }

    #[test]
    fn new_rejects_mismatched_corners() {
        assert!(BoxRegion::new(vec![0.0], vec![1.0, 1.0]).is_err());
    }

    #[test]
    fn centre_is_midpoint() {
        assert_eq!(unit_box().centre(), vec![0.5, 0.5]);
    }

    #[test]
    fn contains_boundary_points() {
        let b = unit_box();
        assert!(b.contains_point(&[1.0, 0.0]));
        assert!(!b.contains_point(&[1.01, 0.0]));
        assert!(!b.contains_point(&[0.5]));
    }

    #[test]
    fn overlapping_boxes() {
        let a = unit_box();
        let b = BoxRegion::new(vec![1.0, 1.0], vec![2.0, 2.0]).unwrap();
        let c = BoxRegion::new(vec![1.5, 1.5], vec![2.0, 2.0]).unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn rule_only_looks_at_selected_axes() {
        let region = BoxRegion::new(vec![0.4], vec![0.6]).unwrap();
        let rule = BoxObstacleRule::new(vec![2], vec![region]).unwrap();
        assert!(!rule.is_valid(&[0.0, 0.0, 0.5]));
        assert!(rule.is_valid(&[0.5, 0.5, 0.0]));
    }

    #[test]
    fn rule_rejects_box_of_wrong_dimension() {
        assert!(BoxObstacleRule::new(vec![0], vec![unit_box()]).is_err());
    }
}
