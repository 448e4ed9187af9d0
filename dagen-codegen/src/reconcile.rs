//! Bringing an output directory in line with a generation run.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use dagen_core::{WriteResult, format::format, needs_write, write_if_changed};
use eyre::{Result, WrapErr};
use serde::Serialize;

use crate::artifact::{OutputArtifact, is_generated};

/// Outcome of writing one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    /// Relative to the output root
    pub path: PathBuf,
    pub result: WriteResult,
}

/// Persistence and cleanup of generated artifacts.
pub trait OutputReconciler {
    /// Format every artifact and write the ones whose content changed.
    fn write(&self, root: &Path, artifacts: &[OutputArtifact]) -> Result<Vec<WrittenFile>>;

    /// Delete generated files under `root` that are not in `keep`.
    ///
    /// `keep` holds paths relative to `root`. Returns the deleted paths,
    /// relative to `root` as well.
    fn delete_stale(&self, root: &Path, keep: &BTreeSet<PathBuf>) -> Result<Vec<PathBuf>>;
}

/// Reconciles against the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskReconciler {
    /// Report what would change without touching the disk
    pub dry_run: bool,
}

impl DiskReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

impl OutputReconciler for DiskReconciler {
    fn write(&self, root: &Path, artifacts: &[OutputArtifact]) -> Result<Vec<WrittenFile>> {
        artifacts
            .iter()
            .map(|artifact| {
                let path = root.join(&artifact.path);
                let content = format(&artifact.content);
                let result = if self.dry_run {
                    if needs_write(&path, &content) {
                        WriteResult::Written
                    } else {
                        WriteResult::Unchanged
                    }
                } else {
                    write_if_changed(&path, &content)?
                };
                if result == WriteResult::Written {
                    tracing::info!(path = %path.display(), dry_run = self.dry_run, "wrote artifact");
                }
                Ok(WrittenFile {
                    path: artifact.path.clone(),
                    result,
                })
            })
            .collect()
    }

    fn delete_stale(&self, root: &Path, keep: &BTreeSet<PathBuf>) -> Result<Vec<PathBuf>> {
        let keep: BTreeSet<PathBuf> = keep.iter().map(|p| root.join(p)).collect();
        let mut generated = Vec::new();
        collect_generated(root, &mut generated)?;

        let mut deleted = Vec::new();
        for path in generated {
            if keep.contains(&path) {
                continue;
            }
            if !self.dry_run {
                std::fs::remove_file(&path)
                    .wrap_err_with(|| format!("failed to delete {}", path.display()))?;
            }
            tracing::info!(path = %path.display(), dry_run = self.dry_run, "deleted stale artifact");
            deleted.push(path.strip_prefix(root).unwrap_or(&path).to_path_buf());
        }
        Ok(deleted)
    }
}

fn collect_generated(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    let mut entries = std::fs::read_dir(dir)
        .wrap_err_with(|| format!("failed to read directory {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            collect_generated(&path, found)?;
        } else if is_generated(&path) {
            found.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "// old").unwrap();
    }

    #[test]
    fn test_write_formats_content() {
        let temp = TempDir::new().unwrap();
        let written = DiskReconciler::new()
            .write(
                temp.path(),
                &[OutputArtifact::entity("A", "class A\n{\nint x;\n\n\n}\n")],
            )
            .unwrap();

        assert_eq!(written[0].result, WriteResult::Written);
        assert_eq!(
            std::fs::read_to_string(temp.path().join("A.generated.cs")).unwrap(),
            "class A\n{\n    int x;\n}\n"
        );
    }

    #[test]
    fn test_second_write_is_unchanged() {
        let temp = TempDir::new().unwrap();
        let artifacts = [OutputArtifact::fake("A", "class A\n{\n}\n")];
        let reconciler = DiskReconciler::new();

        reconciler.write(temp.path(), &artifacts).unwrap();
        let second = reconciler.write(temp.path(), &artifacts).unwrap();

        assert_eq!(second[0].result, WriteResult::Unchanged);
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "Old.generated.cs");
        let reconciler = DiskReconciler::dry_run();

        let written = reconciler
            .write(temp.path(), &[OutputArtifact::entity("A", "class A\n{\n}\n")])
            .unwrap();
        let deleted = reconciler
            .delete_stale(temp.path(), &BTreeSet::new())
            .unwrap();

        assert_eq!(written[0].result, WriteResult::Written);
        assert_eq!(deleted, vec![PathBuf::from("Old.generated.cs")]);
        assert!(!temp.path().join("A.generated.cs").exists());
        assert!(temp.path().join("Old.generated.cs").exists());
    }

    #[test]
    fn test_delete_stale_respects_keep_and_suffix() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "Keep.generated.cs");
        touch(temp.path(), "Gone.generated.cs");
        touch(temp.path(), "Fake/Gone.generated.cs");
        touch(temp.path(), "Fake/Keep.generated.cs");
        touch(temp.path(), "Handwritten.cs");

        let keep = BTreeSet::from([
            PathBuf::from("Keep.generated.cs"),
            Path::new("Fake").join("Keep.generated.cs"),
        ]);
        let deleted = DiskReconciler::new()
            .delete_stale(temp.path(), &keep)
            .unwrap();

        assert_eq!(
            deleted,
            vec![
                Path::new("Fake").join("Gone.generated.cs"),
                PathBuf::from("Gone.generated.cs"),
            ]
        );
        assert!(temp.path().join("Keep.generated.cs").exists());
        assert!(temp.path().join("Fake/Keep.generated.cs").exists());
        assert!(temp.path().join("Handwritten.cs").exists());
        assert!(!temp.path().join("Gone.generated.cs").exists());
    }

    #[test]
    fn test_delete_stale_on_missing_root() {
        let temp = TempDir::new().unwrap();
        let deleted = DiskReconciler::new()
            .delete_stale(&temp.path().join("missing"), &BTreeSet::new())
            .unwrap();
        assert!(deleted.is_empty());
    }
}
