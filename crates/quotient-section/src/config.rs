//! Tuning knobs of the section search.
//!
//! Every field has a default, so a partial TOML table is enough:
//!
//! ```rust
//! use quotient_section::{InterpolationPolicy, SectionConfig};
//!
//! let config: SectionConfig = toml::from_str("max_depth = 5").unwrap();
//! assert_eq!(config.max_depth, 5);
//! assert_eq!(config.max_branching, 20);
//! assert_eq!(config.initial_policy, InterpolationPolicy::FiberLast);
//! ```

use serde::{Deserialize, Serialize};

use crate::section::InterpolationPolicy;

/// Which stages of the search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStrategy {
    /// Direct interpolation followed by the repair patterns.
    #[default]
    PatternSearch,
    /// Direct interpolation only.
    DirectOnly,
}

/// Fiber scan range of the triple step, as multiples of the fiber distance
/// between head and goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripleStepBounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for TripleStepBounds {
    fn default() -> Self {
        Self {
            lower: 0.5,
            upper: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionConfig {
    /// Failed samples tolerated at one base location while wriggling.
    pub max_wriggling: usize,
    /// Recursion depth of the pattern search.
    pub max_depth: usize,
    /// Branches explored per recursion level.
    pub max_branching: usize,
    /// Near-samples spent stepping through a tunnel.
    pub max_tunneling: usize,
    /// Uniform fiber samples drawn per base location.
    pub max_fiber_sampling: usize,
    pub max_corner_steps: usize,
    pub enable_tunneling: bool,
    pub initial_policy: InterpolationPolicy,
    pub triple_step: TripleStepBounds,
    pub strategy: SectionStrategy,
    /// Decay rate of the wriggle neighbourhood schedule.
    pub schedule_lambda: f64,
    /// Wriggle neighbourhood limit in base segment lengths.
    pub wriggle_radius_factor: f64,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            max_wriggling: 10,
            max_depth: 3,
            max_branching: 20,
            max_tunneling: 100,
            max_fiber_sampling: 10,
            max_corner_steps: 10,
            enable_tunneling: false,
            initial_policy: InterpolationPolicy::FiberLast,
            triple_step: TripleStepBounds::default(),
            strategy: SectionStrategy::PatternSearch,
            schedule_lambda: 1e-4,
            wriggle_radius_factor: 10.0,
        }
    }
}

impl SectionConfig {
    /// Total recursion attempts allowed in one pass.
    pub fn attempt_budget(&self) -> usize {
        self.max_depth.max(1) * self.max_branching.max(1)
    }
}
