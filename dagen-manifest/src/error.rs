use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result type for dagen-manifest operations (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// Source context for error reporting.
///
/// Encapsulates the source content and filename, reducing parameter passing
/// in error factory functions.
#[derive(Debug, Clone)]
pub struct SourceContext {
    src: String,
    filename: String,
}

impl SourceContext {
    /// Create a new source context.
    pub fn new(src: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            filename: filename.into(),
        }
    }

    /// Get the source content.
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Create a NamedSource for miette error reporting.
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.filename, self.src.clone())
    }

    /// Create a parse error from a toml error.
    pub fn parse_error(&self, source: toml::de::Error) -> Box<Error> {
        let span = source.span().map(SourceSpan::from);
        Box::new(Error::Parse {
            src: self.named_source(),
            span,
            source,
        })
    }

    /// Create a validation error with an optional span.
    pub fn validation_error(
        &self,
        message: impl Into<String>,
        span: Option<SourceSpan>,
    ) -> Box<Error> {
        Box::new(Error::Validation {
            src: self.named_source(),
            span,
            message: message.into(),
        })
    }

    /// Create a missing field error.
    pub fn missing_field_error(
        &self,
        field: impl Into<String>,
        context: impl Into<String>,
        span: Option<SourceSpan>,
    ) -> Box<Error> {
        Box::new(Error::MissingField {
            src: self.named_source(),
            span,
            field: field.into(),
            context: context.into(),
        })
    }

    /// Create an invalid namespace error.
    pub fn invalid_namespace_error(
        &self,
        namespace: impl Into<String>,
        reason: impl Into<String>,
        span: Option<SourceSpan>,
    ) -> Box<Error> {
        Box::new(Error::InvalidNamespace {
            src: self.named_source(),
            span,
            namespace: namespace.into(),
            reason: reason.into(),
        })
    }

    /// Create an invalid identifier error.
    pub fn invalid_identifier_error(
        &self,
        name: impl Into<String>,
        context: impl Into<String>,
        reason: impl Into<String>,
        span: Option<SourceSpan>,
    ) -> Box<Error> {
        Box::new(Error::InvalidIdentifier {
            src: self.named_source(),
            span,
            name: name.into(),
            context: context.into(),
            reason: reason.into(),
        })
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to read '{path}'")]
    #[diagnostic(help("create a dagen.toml with at least one [[repository]] table"))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dagen.toml")]
    #[diagnostic(code(dagen::parse_error))]
    Parse {
        #[source_code]
        src: NamedSource<String>,
        #[label("parse error here")]
        span: Option<SourceSpan>,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required field '{field}' in {context}")]
    #[diagnostic(code(dagen::missing_field), help("set a non-empty '{field}'"))]
    MissingField {
        #[source_code]
        src: NamedSource<String>,
        #[label("in this table")]
        span: Option<SourceSpan>,
        field: String,
        context: String,
    },

    #[error("invalid namespace '{namespace}'")]
    #[diagnostic(
        code(dagen::invalid_namespace),
        help("{reason}. Use dot-separated C# identifiers, e.g. 'Shop.Data'.")
    )]
    InvalidNamespace {
        #[source_code]
        src: NamedSource<String>,
        #[label("invalid namespace")]
        span: Option<SourceSpan>,
        namespace: String,
        reason: String,
    },

    #[error("invalid {context} '{name}'")]
    #[diagnostic(
        code(dagen::invalid_identifier),
        help(
            "{reason}. Use only letters, numbers, and underscores, starting with a letter or underscore."
        )
    )]
    InvalidIdentifier {
        #[source_code]
        src: NamedSource<String>,
        #[label("invalid identifier")]
        span: Option<SourceSpan>,
        name: String,
        context: String,
        reason: String,
    },

    #[error("{message}")]
    #[diagnostic(code(dagen::validation_error))]
    Validation {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: Option<SourceSpan>,
        message: String,
    },

    #[error("environment variable '{name}' is not set")]
    #[diagnostic(
        code(dagen::missing_env),
        help("export {name} or put the connection string in dagen.toml")
    )]
    MissingEnvVar { name: String, repository: String },
}
