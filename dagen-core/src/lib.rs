//! Core utilities and types for the dagen data-access generator.
//!
//! This crate holds the pure building blocks shared by the other crates:
//! SQL-to-C# type mapping, identifier casing, the text formatter applied to
//! every generated file, and write-if-changed file output.

mod file;
pub mod format;
mod naming;
mod policy;
mod type_mapper;

// File operations
pub use file::{WriteResult, needs_write, write_if_changed};
// Shape policies
pub use policy::ShapePolicy;
// Naming
pub use naming::{is_csharp_keyword, to_camel_case, to_identifier, to_parameter_case};
// Type mapping
pub use type_mapper::{
    TypeMappingError, default_initializer, is_known_type, is_reference_type, to_binding_tag,
    to_default_literal, to_target_type,
};
