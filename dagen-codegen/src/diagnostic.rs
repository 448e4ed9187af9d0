//! Problems recorded during a generation run.
//!
//! Select and shape diagnostics never stop generation. They are collected for
//! the whole run and handed back to the caller, who decides how to present
//! them.

use serde::Serialize;

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The run completed but something the user asked for is wrong.
    Error,
    /// Worth a look, does not indicate broken output.
    Warning,
}

impl Severity {
    /// Returns true if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Generation phase that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Matching the allow-list against the catalog
    Select,
    /// Deciding the return contract of a routine
    Shape,
    /// A failure that stopped the repository's run
    Generate,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Select => write!(f, "select"),
            Phase::Shape => write!(f, "shape"),
            Phase::Generate => write!(f, "generate"),
        }
    }
}

/// A diagnostic message from a generation phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub phase: Phase,
    pub message: String,
    /// Routine the message is about, if any
    pub location: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            phase,
            message: message.into(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            phase,
            message: message.into(),
            location: None,
        }
    }

    /// Add a location to this diagnostic.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}
