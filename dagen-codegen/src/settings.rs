//! Inputs of one generation run.

use std::path::PathBuf;

use dagen_core::{ShapePolicy, to_identifier};

/// A routine selected for generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineDescriptor {
    /// Routine name as the catalog knows it
    pub proc: String,
    /// Overrides the generated class and method name
    pub display_name: Option<String>,
    /// `None` until an allow-list entry or discovery decides it
    pub policy: Option<ShapePolicy>,
    /// When false the result shape is never queried
    pub lookup_output_types: bool,
}

impl RoutineDescriptor {
    pub fn new(proc: impl Into<String>) -> Self {
        Self {
            proc: proc.into(),
            display_name: None,
            policy: None,
            lookup_output_types: true,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn policy(mut self, policy: ShapePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn skip_output_types(mut self) -> Self {
        self.lookup_output_types = false;
        self
    }

    /// Name of the generated method and of the `{name}_Parameters`/`{name}_ResultSet` classes.
    pub fn class_name(&self) -> String {
        match &self.display_name {
            Some(name) => name.clone(),
            None => to_identifier(&self.proc),
        }
    }
}

/// Everything the engine needs to know about one repository.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub namespace: String,
    pub schema: String,
    pub repository_name: Option<String>,
    /// Directory every artifact path is relative to
    pub output: PathBuf,
    /// Explicit allow-list; empty means every routine in the schema
    pub routines: Vec<RoutineDescriptor>,
    pub include_fakes: bool,
    pub allow_speculative: bool,
    /// Version written into the base file header
    pub version: Option<String>,
}

impl GenerationSettings {
    pub fn new(
        namespace: impl Into<String>,
        schema: impl Into<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            schema: schema.into(),
            repository_name: None,
            output: output.into(),
            routines: Vec::new(),
            include_fakes: true,
            allow_speculative: false,
            version: None,
        }
    }

    /// The configured repository name, or `{schema}Repository`.
    pub fn repository_name(&self) -> String {
        match &self.repository_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("{}Repository", self.schema),
        }
    }

    /// Namespace of the fake repository files.
    pub fn fake_namespace(&self) -> String {
        format!("{}.Fake", self.namespace)
    }
}
