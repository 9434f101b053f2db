//! [`TerminationCondition`] – when the orchestrator stops growing levels.
//!
//! Conditions are polled between growth steps, never during one. All of
//! them are `Send + Sync` so a signal handler on another thread can flip a
//! [`CancellationFlag`] while the planner runs.
//!
//! | Condition | Fires when |
//! |---|---|
//! | [`Timeout`] | the deadline measured from construction has passed |
//! | [`IterationLimit`] | it has been polled `limit` times |
//! | [`CancellationFlag`] | the shared flag was set |
//! | [`FnCondition`] | the closure returns `true` |
//! | [`AnyOf`] | any inner condition fires |
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use quotient_planner::termination::{AnyOf, CancellationFlag, TerminationCondition, Timeout};
//!
//! let flag = CancellationFlag::new();
//! let ptc = AnyOf::new()
//!     .with(Timeout::new(Duration::from_secs(60)))
//!     .with(flag.clone());
//! assert!(!ptc.should_terminate());
//! flag.cancel();
//! assert!(ptc.should_terminate());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub trait TerminationCondition: Send + Sync {
    fn should_terminate(&self) -> bool;
}

// ────────────────────────────────────────────────────────────────────────────
// Timeout
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Timeout {
    started: Instant,
    limit: Duration,
}

impl Timeout {
    /// The clock starts now.
    pub fn new(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    /// Negative and NaN budgets fire at once; budgets too large for a
    /// [`Duration`] never fire.
    pub fn from_secs_f64(seconds: f64) -> Self {
        let limit = if seconds.is_nan() || seconds <= 0.0 {
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
        };
        Self::new(limit)
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl TerminationCondition for Timeout {
    fn should_terminate(&self) -> bool {
        self.started.elapsed() > self.limit
    }
}

// ────────────────────────────────────────────────────────────────────────────
// IterationLimit
// ────────────────────────────────────────────────────────────────────────────

/// Fires on the poll after the `limit`-th one.
#[derive(Debug)]
pub struct IterationLimit {
    limit: usize,
    polls: AtomicUsize,
}

impl IterationLimit {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            polls: AtomicUsize::new(0),
        }
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::Relaxed)
    }
}

impl TerminationCondition for IterationLimit {
    fn should_terminate(&self) -> bool {
        self.polls.fetch_add(1, Ordering::Relaxed) >= self.limit
    }
}

// ────────────────────────────────────────────────────────────────────────────
// CancellationFlag
// ────────────────────────────────────────────────────────────────────────────

/// Shared flag; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl TerminationCondition for CancellationFlag {
    fn should_terminate(&self) -> bool {
        self.is_cancelled()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Combinators
// ────────────────────────────────────────────────────────────────────────────

pub struct FnCondition<F>(pub F);

impl<F> TerminationCondition for FnCondition<F>
where
    F: Fn() -> bool + Send + Sync,
{
    fn should_terminate(&self) -> bool {
        (self.0)()
    }
}

#[derive(Default)]
pub struct AnyOf {
    conditions: Vec<Box<dyn TerminationCondition>>,
}

impl AnyOf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, condition: impl TerminationCondition + 'static) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }

    pub fn push(&mut self, condition: Box<dyn TerminationCondition>) {
        self.conditions.push(condition);
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl TerminationCondition for AnyOf {
    /// Polls every inner condition so iteration counters stay in step.
    fn should_terminate(&self) -> bool {
        self.conditions
            .iter()
            .fold(false, |fired, c| c.should_terminate() || fired)
    }
}

impl<T: TerminationCondition + ?Sized> TerminationCondition for &T {
    fn should_terminate(&self) -> bool {
        (**self).should_terminate()
    }
}
