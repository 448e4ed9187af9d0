//! dagen.toml manifest types.

mod parse;
mod validate;

use std::path::{Path, PathBuf};

use dagen_core::ShapePolicy;
use serde::Deserialize;

pub use parse::parse_manifest;
pub use validate::ParseContext;

use crate::{Error, Result};

/// Prefix marking a connection string that lives in an environment variable.
pub const ENV_PREFIX: &str = "env:";

/// Root of a dagen.toml file: the repositories to generate.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(rename = "repository", default)]
    pub repositories: Vec<RepositorySettings>,
}

impl Manifest {
    /// Find a repository by its resolved repository name (case-insensitive).
    pub fn repository(&self, name: &str) -> Option<&RepositorySettings> {
        self.repositories
            .iter()
            .find(|r| r.repository_name().eq_ignore_ascii_case(name))
    }
}

/// One `[[repository]]` table: a schema generated into one C# namespace.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositorySettings {
    /// ADO.NET connection string, or `env:NAME`
    #[serde(default)]
    pub connection: String,
    /// Database schema whose routines are generated
    #[serde(default)]
    pub schema: String,
    /// C# namespace for generated code
    #[serde(default)]
    pub namespace: String,
    /// Output directory, relative to the manifest
    #[serde(default)]
    pub output: PathBuf,
    /// Repository class name
    pub name: Option<String>,
    /// Emit in-memory fakes under Fake/
    #[serde(default = "default_true")]
    pub include_fakes: bool,
    /// Allow rolled-back speculative execution to discover result shapes
    #[serde(default)]
    pub allow_execution: bool,
    /// Explicit routine allow-list; empty means every routine in the schema
    #[serde(default)]
    pub routines: Vec<RoutineSetting>,
}

impl RepositorySettings {
    /// The repository class name, defaulting to `<schema>Repository`.
    pub fn repository_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}Repository", self.schema),
        }
    }

    /// Output directory resolved against the manifest's directory.
    pub fn output_dir(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.output)
    }

    /// The connection string, reading `env:NAME` references from the environment.
    pub fn resolve_connection(&self) -> Result<String> {
        match self.connection.strip_prefix(ENV_PREFIX) {
            Some(var) => std::env::var(var.trim()).map_err(|_| {
                Box::new(Error::MissingEnvVar {
                    name: var.trim().to_string(),
                    repository: self.repository_name(),
                })
            }),
            None => Ok(self.connection.clone()),
        }
    }
}

/// One `[[repository.routines]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutineSetting {
    /// Routine name as stored in the catalog
    #[serde(default)]
    pub proc: String,
    /// Display-name override for generated members
    pub name: Option<String>,
    /// Shape policy; unset means the default list behavior
    #[serde(rename = "return")]
    pub shape: Option<ShapePolicy>,
    /// Whether to query the result shape at all
    #[serde(default = "default_true")]
    pub lookup_output_types: bool,
}

fn default_true() -> bool {
    true
}
