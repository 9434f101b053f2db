//! `quotient-bundle` – projections between consecutive levels.
//!
//! A level's space (the *bundle*) is related to the previous level's space
//! (the *base*) by a projection whose complement is the *fiber*. Projections
//! are coordinate splits chosen from a fixed catalog by matching the shapes
//! of the two spaces.
//!
//! # Modules
//!
//! - [`component`] – [`ProjectionComponent`][component::ProjectionComponent]:
//!   one coordinate split and its [`ComponentKind`][component::ComponentKind].
//! - [`components`] – the catalog of predicate / constructor pairs.
//! - [`factory`] – [`ComponentFactory`][factory::ComponentFactory]: picks
//!   the first matching pattern per component, failing loudly otherwise.
//! - [`projection`] – [`Projection`][projection::Projection]: several
//!   components placed side by side.
//! - [`bundle`] – [`BundleSpace`][bundle::BundleSpace]: bundle, base and
//!   lazily built fiber of one level.

pub mod bundle;
pub mod component;
pub mod components;
pub mod factory;
pub mod projection;

pub use bundle::BundleSpace;
pub use component::{ComponentKind, ProjectionComponent};
pub use factory::{ComponentFactory, component_count};
pub use projection::Projection;
