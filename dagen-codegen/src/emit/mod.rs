//! C# text for every artifact kind.
//!
//! Emitters are pure functions from resolved models to unformatted text.
//! Indentation is cosmetic at this stage: the formatter re-indents every file
//! before it is written.

pub mod base;
pub mod contract;
pub mod fake;
pub mod holders;
pub mod namespace;
pub mod repository;

pub use namespace::wrap_in_namespace;
pub use repository::CallScope;
