//! C# data-access generation for SQL Server stored procedures.
//!
//! [`GenerationEngine`] turns [`GenerationSettings`] and a
//! [`dagen_catalog::SchemaIntrospector`] into [`OutputArtifact`]s plus the
//! [`Diagnostic`]s recorded along the way. An [`OutputReconciler`] then
//! writes the artifacts and removes generated files that are no longer
//! produced.
//!
//! # Module Organization
//!
//! - [`builder`] - Indentation-aware text building
//! - [`emit`] - C# text for every artifact kind
//! - [`model`] - Routines and parameters resolved to C# types
//! - [`shape`] - Return contracts and their preconditions
//! - [`engine`] - The generation run
//! - [`reconcile`] - Writing and stale cleanup
//! - [`testing`] - Test utilities (feature-gated)

pub mod artifact;
pub mod builder;
mod diagnostic;
pub mod emit;
pub mod engine;
mod error;
pub mod model;
pub mod reconcile;
mod settings;
pub mod shape;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use artifact::OutputArtifact;
pub use diagnostic::{Diagnostic, Phase, Severity};
pub use engine::{GenerationEngine, GenerationOutput};
pub use error::GenerationError;
pub use reconcile::{DiskReconciler, OutputReconciler, WrittenFile};
pub use settings::{GenerationSettings, RoutineDescriptor};
pub use shape::{ReturnContract, ShapeError};
