//! [`BundleLevel`] – what the orchestrator needs from one level.
//!
//! A level grows a roadmap on its own bundle space, optionally guided by the
//! next coarser level (its *parent*). The orchestrator only ever calls
//! [`BundleLevel::grow`] and reads the predicates below; everything else is
//! up to the implementation.

use std::sync::Arc;

use quotient_bundle::BundleSpace;
use quotient_graph::{ProblemDefinition, Roadmap};
use quotient_section::SectionStrategy;
use quotient_types::State;

pub trait BundleLevel {
    /// Planner name used when recording solutions.
    fn name(&self) -> &str;

    /// Position in the sequence, coarsest first.
    fn index(&self) -> usize;

    fn bundle_space(&self) -> &Arc<BundleSpace>;

    fn set_problem(&mut self, problem: ProblemDefinition);

    fn problem(&self) -> Option<&ProblemDefinition>;

    fn problem_mut(&mut self) -> Option<&mut ProblemDefinition>;

    /// One bounded unit of roadmap construction.
    fn grow(&mut self, parent: Option<&Self>);

    /// Start and goal share a roadmap component.
    fn has_solution(&self) -> bool;

    /// The level can no longer produce a solution.
    fn is_infeasible(&self) -> bool;

    /// Start-to-goal path through the roadmap, once solved.
    fn solution(&self) -> Option<Vec<State>>;

    /// Growth priority; larger grows sooner.
    fn importance(&self) -> f64 {
        1.0 / (self.roadmap().len() as f64 + 1.0)
    }

    fn roadmap(&self) -> &Roadmap;

    fn set_section_strategy(&mut self, _strategy: SectionStrategy) {}

    fn clear(&mut self);
}
