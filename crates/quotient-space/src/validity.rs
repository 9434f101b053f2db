//! [`ValidityChecker`] – state validity rule engine.
//!
//! A state is valid when every registered [`ValidityRule`] accepts it. Rules
//! are evaluated in insertion order and evaluation stops at the first
//! rejection, so cheap rules should be added first.
//!
//! Two built-in rules are provided:
//! - [`AlwaysValid`] – accepts every state; used for fibers and relaxed
//!   spaces that carry no constraints of their own.
//! - [`PredicateRule`] – wraps a closure, handy for analytic obstacles.
//!
//! Box obstacles live in [`crate::obstacles::BoxObstacleRule`].

use std::fmt;

use tracing::debug;

// ────────────────────────────────────────────────────────────────────────────
// Rule trait
// ────────────────────────────────────────────────────────────────────────────

/// A single constraint a state must satisfy.
///
/// Implement this trait to create custom constraints and add them to a
/// [`ValidityChecker`] via [`ValidityChecker::add_rule`].
pub trait ValidityRule: Send + Sync {
    /// Human-readable name used in log output.
    fn name(&self) -> &str;

    /// `true` when `state` satisfies the constraint.
    fn is_valid(&self, state: &[f64]) -> bool;
}

// ────────────────────────────────────────────────────────────────────────────
// ValidityChecker
// ────────────────────────────────────────────────────────────────────────────

/// Rule engine deciding whether a state is collision-free.
///
/// # Example
///
/// ```
/// use quotient_space::validity::{PredicateRule, ValidityChecker};
///
/// let mut checker = ValidityChecker::new();
/// checker.add_rule(Box::new(PredicateRule::new("left_half", |s: &[f64]| s[0] <= 0.5)));
///
/// assert!(checker.is_valid(&[0.2]));
/// assert!(!checker.is_valid(&[0.9]));
/// ```
#[derive(Default)]
pub struct ValidityChecker {
    rules: Vec<Box<dyn ValidityRule>>,
}

impl ValidityChecker {
    /// Create an empty checker; it accepts every state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new [`ValidityRule`]. Rules are evaluated in insertion order.
    pub fn add_rule(&mut self, rule: Box<dyn ValidityRule>) {
        self.rules.push(rule);
    }

    /// Builder form of [`ValidityChecker::add_rule`].
    pub fn with_rule(mut self, rule: impl ValidityRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn is_valid(&self, state: &[f64]) -> bool {
        match self.rules.iter().find(|rule| !rule.is_valid(state)) {
            Some(rule) => {
                debug!(rule = rule.name(), ?state, "state rejected");
                false
            }
            None => true,
        }
    }

    /// Name of the first rule rejecting `state`, if any.
    pub fn first_violation(&self, state: &[f64]) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| !rule.is_valid(state))
            .map(|rule| rule.name())
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for ValidityChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidityChecker")
            .field("rules", &self.rule_names())
            .finish()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in rules
// ────────────────────────────────────────────────────────────────────────────

/// Accepts every state.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysValid;

impl ValidityRule for AlwaysValid {
    fn name(&self) -> &str {
        "always_valid"
    }

    fn is_valid(&self, _state: &[f64]) -> bool {
        true
    }
}

/// A rule backed by a closure.
pub struct PredicateRule<F> {
    name: String,
    predicate: F,
}

impl<F> PredicateRule<F>
where
    F: Fn(&[f64]) -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

impl<F> ValidityRule for PredicateRule<F>
where
    F: Fn(&[f64]) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self, state: &[f64]) -> bool {
        (self.predicate)(state)
    }
}
