//! Test utilities for generation runs.
//!
//! This module is only available when the `testing` feature is enabled
//! or during tests.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use dagen_core::{WriteResult, format::format};
use eyre::Result;
use parking_lot::Mutex;

use crate::{
    artifact::{OutputArtifact, is_generated},
    reconcile::{OutputReconciler, WrittenFile},
};

/// Reconciler that keeps files in memory, keyed by their full path.
#[derive(Debug, Default)]
pub struct InMemoryReconciler {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl InMemoryReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, as if an earlier run or a user had written it.
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.lock().insert(path.into(), content.into());
        self
    }

    pub fn read(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().get(path.as_ref()).cloned()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }
}

impl OutputReconciler for InMemoryReconciler {
    fn write(&self, root: &Path, artifacts: &[OutputArtifact]) -> Result<Vec<WrittenFile>> {
        let mut files = self.files.lock();
        Ok(artifacts
            .iter()
            .map(|artifact| {
                let content = format(&artifact.content);
                let path = root.join(&artifact.path);
                let result = if files.get(&path) == Some(&content) {
                    WriteResult::Unchanged
                } else {
                    files.insert(path, content);
                    WriteResult::Written
                };
                WrittenFile {
                    path: artifact.path.clone(),
                    result,
                }
            })
            .collect())
    }

    fn delete_stale(&self, root: &Path, keep: &BTreeSet<PathBuf>) -> Result<Vec<PathBuf>> {
        let keep: BTreeSet<PathBuf> = keep.iter().map(|p| root.join(p)).collect();
        let mut files = self.files.lock();
        let stale: Vec<PathBuf> = files
            .keys()
            .filter(|p| p.starts_with(root) && is_generated(p) && !keep.contains(*p))
            .cloned()
            .collect();
        for path in &stale {
            files.remove(path);
        }
        Ok(stale
            .into_iter()
            .map(|p| p.strip_prefix(root).map(Path::to_path_buf).unwrap_or(p))
            .collect())
    }
}
