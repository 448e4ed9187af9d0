//! Check command report data structures.

use std::path::PathBuf;

use serde::Serialize;

use super::output::{Output, Report};

/// Report data from manifest validation.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    /// Path to the config file.
    pub config_path: PathBuf,
    /// Warning messages.
    pub warnings: Vec<String>,
    pub repositories: Vec<RepositorySummary>,
}

/// One repository as the manifest describes it.
#[derive(Debug, Serialize)]
pub struct RepositorySummary {
    pub name: String,
    pub schema: String,
    pub namespace: String,
    /// Resolved against the manifest's directory.
    pub output: PathBuf,
    pub include_fakes: bool,
    /// Allow-listed routines, empty for schema discovery.
    pub routines: Vec<String>,
}

impl Report for CheckReport {
    fn render(&self, out: &mut dyn Output) {
        for warning in &self.warnings {
            out.warning(warning);
        }
        if !self.warnings.is_empty() {
            out.newline();
        }

        out.preformatted(&format!("✓ {} is valid", self.config_path.display()));

        for repository in &self.repositories {
            out.newline();
            out.section(&repository.name);
            out.key_value_indented("schema", &repository.schema);
            out.key_value_indented("namespace", &repository.namespace);
            out.key_value_indented("output", &repository.output.display().to_string());
            if !repository.include_fakes {
                out.key_value_indented("fakes", "disabled");
            }
            if repository.routines.is_empty() {
                out.key_value_indented("routines", "all in schema");
            } else {
                out.key_value_indented("routines", &repository.routines.len().to_string());
                for routine in &repository.routines {
                    out.list_item(routine);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::output::RecordingOutput;

    #[test]
    fn test_render() {
        let report = CheckReport {
            config_path: PathBuf::from("dagen.toml"),
            warnings: vec![],
            repositories: vec![RepositorySummary {
                name: "ShopRepository".into(),
                schema: "dbo".into(),
                namespace: "Shop.Data".into(),
                output: PathBuf::from("Generated"),
                include_fakes: true,
                routines: vec!["GetOrders".into()],
            }],
        };
        let mut out = RecordingOutput::default();
        report.render(&mut out);

        assert_eq!(
            out.lines,
            vec![
                "✓ dagen.toml is valid",
                "",
                "ShopRepository:",
                "  schema: dbo",
                "  namespace: Shop.Data",
                "  output: Generated",
                "  routines: 1",
                "  - GetOrders",
            ]
        );
    }
}
