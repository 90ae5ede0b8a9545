//! Core resolution logic for the enrol form.
//!
//! The form walks a dependent hierarchy, state -> city -> institution, where
//! every level's options come from a chain of fail-soft sources and any level
//! may be overridden with free text. This crate holds the pieces that make
//! that walk coherent:
//!
//! - [`LevelState`]: per-level state machine with generation tokens, so a
//!   late answer for an abandoned request never reaches the screen.
//! - [`ResolutionState`]: the form's selections, passed explicitly to every
//!   operation.
//! - [`Resolver`]: the async operations over configured [`Sources`].
//! - [`reconcile_override`] and [`reconcile_city_state`]: turn override
//!   markers into the concrete strings of a [`Submission`].

pub mod catalog;
mod level;
mod reconcile;
mod resolver;
pub mod sources;
mod state;
mod submission;

pub use catalog::{CatalogError, CatalogRow, LocalCatalog};
pub use level::{Applied, LevelState, LevelUpdate, LoadRequest, Target};
pub use reconcile::{Reconciliation, reconcile_city_state, reconcile_override};
pub use resolver::{Resolver, ResolverSettings};
pub use sources::{SetupError, Sources};
pub use state::{AcademicRow, ResolutionState};
pub use submission::{AcademicRecord, Submission};
