//! `quotient-space` – configuration spaces and validity checking.
//!
//! # Modules
//!
//! - [`space`] – [`StateSpace`][space::StateSpace]: bounded real-vector,
//!   SO(2), SE(2) and compound spaces with their metric, interpolation and
//!   sampling; [`SpaceSpec`][space::SpaceSpec] describes them in scenario
//!   files.
//! - [`validity`] – [`ValidityChecker`][validity::ValidityChecker]: a rule
//!   engine accepting a state only if every registered
//!   [`ValidityRule`][validity::ValidityRule] does.
//! - [`obstacles`] – [`BoxObstacleRule`][obstacles::BoxObstacleRule]:
//!   axis-aligned box obstacles over chosen coordinates.
//! - [`information`] – [`SpaceInformation`][information::SpaceInformation]:
//!   a space bound to a shared checker, with discretised motion validation.

pub mod information;
pub mod obstacles;
pub mod space;
pub mod validity;

pub use information::SpaceInformation;
pub use obstacles::{BoxObstacleRule, BoxRegion};
pub use space::{SpaceSpec, StateSpace};
pub use validity::{AlwaysValid, PredicateRule, ValidityChecker, ValidityRule};
