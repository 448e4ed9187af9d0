//! Generate command report data structures.

use std::path::PathBuf;

use dagen_codegen::Diagnostic;
use serde::Serialize;

use super::output::{Output, Report};

/// Report data from generating every selected repository.
#[derive(Debug, Default, Serialize)]
pub struct GenerateReport {
    /// Whether the disk was left untouched.
    pub dry_run: bool,
    pub repositories: Vec<RepositoryReport>,
}

impl GenerateReport {
    /// Total errors recorded across repositories.
    pub fn error_count(&self) -> usize {
        self.repositories.iter().map(|r| r.errors.len()).sum()
    }
}

/// What happened to one repository's output directory.
#[derive(Debug, Serialize)]
pub struct RepositoryReport {
    pub repository: String,
    pub output_dir: PathBuf,
    /// Files created or replaced, relative to the output directory.
    pub written: Vec<PathBuf>,
    /// Number of files whose content was already current.
    pub unchanged: usize,
    /// Stale generated files removed, relative to the output directory.
    pub deleted: Vec<PathBuf>,
    pub errors: Vec<Diagnostic>,
}

impl Report for GenerateReport {
    fn render(&self, out: &mut dyn Output) {
        for (i, repository) in self.repositories.iter().enumerate() {
            if i > 0 {
                out.newline();
            }
            repository.render(out, self.dry_run);
        }

        let errors = self.error_count();
        if errors > 0 {
            out.newline();
            out.error(&format!(
                "{} error{} recorded during generation",
                errors,
                if errors == 1 { "" } else { "s" }
            ));
        }
    }
}

impl RepositoryReport {
    fn render(&self, out: &mut dyn Output, dry_run: bool) {
        let (written, deleted) = if dry_run {
            ("Would write", "Would delete")
        } else {
            ("Written", "Deleted")
        };

        out.section(&self.repository);
        out.key_value_indented("output", &self.output_dir.display().to_string());
        out.key_value_indented(written, &self.written.len().to_string());
        out.key_value_indented("Unchanged", &self.unchanged.to_string());
        for path in &self.written {
            out.added_item(&path.display().to_string());
        }
        if !self.deleted.is_empty() {
            out.key_value_indented(deleted, &self.deleted.len().to_string());
            for path in &self.deleted {
                out.removed_item(&path.display().to_string());
            }
        }
        for error in &self.errors {
            out.error(&error.message);
        }
    }
}
