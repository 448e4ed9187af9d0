//! dagen.toml parsing and validation.
//!
//! A manifest lists the repositories to generate. Parsing and validation
//! errors are `miette` diagnostics that point into the TOML source, and they
//! are always fatal: generation never starts from an invalid manifest.

// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

mod error;
mod file;
mod manifest;

pub use error::{Error, Result, SourceContext};
pub use file::DagenToml;
pub use manifest::*;
