//! Check operation - manifest validation.

use std::path::Path;

use dagen_manifest::{DagenToml, RepositorySettings};

use crate::reports::{CheckReport, RepositorySummary};

fn summarize(repository: &RepositorySettings, base_dir: &Path) -> RepositorySummary {
    RepositorySummary {
        name: repository.repository_name(),
        schema: repository.schema.clone(),
        namespace: repository.namespace.clone(),
        output: repository.output_dir(base_dir),
        include_fakes: repository.include_fakes,
        routines: repository
            .routines
            .iter()
            .map(|r| match (&r.name, r.shape) {
                (Some(name), Some(shape)) => format!("{} as {name} ({shape})", r.proc),
                (Some(name), None) => format!("{} as {name}", r.proc),
                (None, Some(shape)) => format!("{} ({shape})", r.proc),
                (None, None) => r.proc.clone(),
            })
            .collect(),
    }
}

/// Execute the check operation.
///
/// The manifest is already validated when it is parsed; this collects what
/// is worth a second look before connecting.
pub fn check(dagen_toml: &DagenToml) -> CheckReport {
    let manifest = dagen_toml.manifest();
    let mut warnings = Vec::new();

    for repository in &manifest.repositories {
        let name = repository.repository_name();
        if let Err(e) = repository.resolve_connection() {
            warnings.push(e.to_string());
        }
        if repository.allow_execution {
            warnings.push(format!(
                "{name}: result shapes may be discovered by executing routines inside a rolled-back transaction"
            ));
        }
        if repository.routines.is_empty() {
            warnings.push(format!(
                "{name}: no routines listed, every routine in schema {} will be generated",
                repository.schema
            ));
        }
    }

    CheckReport {
        config_path: dagen_toml.path().to_path_buf(),
        warnings,
        repositories: manifest
            .repositories
            .iter()
            .map(|r| summarize(r, dagen_toml.base_dir()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn open(content: &str) -> (TempDir, DagenToml) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dagen.toml");
        std::fs::write(&path, content).unwrap();
        let dagen_toml = DagenToml::open(&path).unwrap();
        (temp, dagen_toml)
    }

    #[test]
    fn test_check_summarizes_repositories() {
        let (temp, dagen_toml) = open(
            r#"
[[repository]]
connection = "Server=localhost;Database=Shop"
schema = "dbo"
namespace = "Shop.Data"
output = "Generated"
name = "ShopRepository"

[[repository.routines]]
proc = "GetOrders"

[[repository.routines]]
proc = "CountOrders"
name = "OrderCount"
return = "Scalar"
"#,
        );

        let report = check(&dagen_toml);

        assert!(report.warnings.is_empty());
        let repository = &report.repositories[0];
        assert_eq!(repository.name, "ShopRepository");
        assert_eq!(repository.output, temp.path().join("Generated"));
        assert_eq!(
            repository.routines,
            vec!["GetOrders", "CountOrders as OrderCount (Scalar)"]
        );
    }

    #[test]
    fn test_check_warns_about_execution_and_discovery() {
        let (_temp, dagen_toml) = open(
            r#"
[[repository]]
connection = "Server=localhost;Database=Shop"
schema = "dbo"
namespace = "Shop.Data"
output = "Generated"
allow_execution = true
"#,
        );

        let report = check(&dagen_toml);

        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].starts_with("dboRepository: result shapes"));
        assert!(report.warnings[1].contains("every routine in schema dbo"));
    }
}
