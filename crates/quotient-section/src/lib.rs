//! `quotient-section` – lifting a base path into the next finer level.
//!
//! Given a feasible path on a level's base space, the search looks for a
//! curve in the level's own space that projects onto that path: a *section*
//! of the path restriction.
//!
//! # Modules
//!
//! - [`restriction`] – [`PathRestriction`][restriction::PathRestriction]:
//!   the base path with its arclength table.
//! - [`head`] – [`Head`][head::Head]: the search frontier.
//! - [`section`] – [`PathSection`][section::PathSection]: one interpolated
//!   candidate and its motion check.
//! - [`find_section`] – [`FindSection`][find_section::FindSection]: the
//!   recursive pattern search and its repair stages.
//! - [`schedule`] – exponential neighbourhood radius used while wriggling.
//! - [`config`] – [`SectionConfig`][config::SectionConfig].

pub mod config;
pub mod find_section;
pub mod head;
pub mod restriction;
pub mod schedule;
pub mod section;

pub use config::{SectionConfig, SectionStrategy, TripleStepBounds};
pub use find_section::{FindSection, SectionStats};
pub use head::Head;
pub use restriction::PathRestriction;
pub use schedule::ExponentialSchedule;
pub use section::{InterpolationPolicy, PathSection};
