//! Validation context and utilities for manifest parsing.

use std::sync::Arc;

use dagen_core::is_csharp_keyword;
use miette::SourceSpan;

use crate::{Result, error::SourceContext};

/// Parsing and validation context that carries source information.
///
/// Wraps the source so nested validation (a repository, then one of its
/// routines) can report errors that point back into the TOML text.
#[derive(Debug, Clone)]
pub struct ParseContext {
    source: Arc<SourceContext>,
    /// Human-readable location, e.g. "repository #2 (dbo)"
    location: String,
}

impl ParseContext {
    /// Create a new parse context with the given source and filename.
    pub fn new(src: &str, filename: &str) -> Self {
        Self {
            source: Arc::new(SourceContext::new(src, filename)),
            location: String::from("dagen.toml"),
        }
    }

    /// Get the source context for error creation.
    pub fn source_context(&self) -> &SourceContext {
        &self.source
    }

    /// Return a context describing a nested location.
    pub fn at(&self, location: impl Into<String>) -> Self {
        Self {
            source: Arc::clone(&self.source),
            location: location.into(),
        }
    }

    /// The location this context describes.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Require a non-blank value for `field`.
    pub fn require(&self, value: &str, field: &str, span: Option<SourceSpan>) -> Result<()> {
        if value.trim().is_empty() {
            return Err(self
                .source
                .missing_field_error(field, self.location.clone(), span));
        }
        Ok(())
    }

    /// Validate that a name is a usable C# identifier.
    pub fn validate_identifier(&self, name: &str, kind: &str) -> Result<()> {
        if let Some(reason) = validate_identifier(name) {
            return Err(self.source.invalid_identifier_error(
                name,
                kind,
                reason,
                find_value_span(self.source.src(), name),
            ));
        }
        Ok(())
    }

    /// Validate a dotted C# namespace such as `Shop.Data`.
    pub fn validate_namespace(&self, namespace: &str) -> Result<()> {
        for segment in namespace.split('.') {
            if let Some(reason) = validate_identifier(segment) {
                return Err(self.source.invalid_namespace_error(
                    namespace,
                    format!("segment '{}': {}", segment, reason),
                    find_value_span(self.source.src(), namespace),
                ));
            }
        }
        Ok(())
    }
}

/// Find the span of a quoted string value in the TOML source.
pub(crate) fn find_value_span(src: &str, value: &str) -> Option<SourceSpan> {
    if value.is_empty() {
        return None;
    }
    for quote in ['"', '\''] {
        let pattern = format!("{quote}{value}{quote}");
        if let Some(pos) = src.find(&pattern) {
            return Some(SourceSpan::from((pos + 1, value.len())));
        }
    }
    None
}

/// Find the span of the `n`th occurrence (zero-based) of a table header.
pub(crate) fn find_table_span(src: &str, header: &str, n: usize) -> Option<SourceSpan> {
    src.match_indices(header)
        .nth(n)
        .map(|(pos, _)| SourceSpan::from((pos, header.len())))
}

/// Validate that a name is a valid C# identifier
/// Returns None if valid, Some(reason) if invalid
pub(crate) fn validate_identifier(name: &str) -> Option<&'static str> {
    let mut chars = name.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        Some(_) => return Some("name must start with a letter or underscore"),
        None => return Some("name cannot be empty"),
    }

    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Some("name must contain only letters, numbers, and underscores");
    }

    if is_csharp_keyword(name) {
        return Some("name is a C# reserved keyword");
    }

    None
}
