use std::path::Path;

use eyre::{Result, WrapErr};

/// Result of a write operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteResult {
    /// File was created or its content replaced
    Written,
    /// File already held exactly this content
    Unchanged,
}

/// Check whether writing `content` to `path` would change anything.
pub fn needs_write(path: &Path, content: &str) -> bool {
    match std::fs::read_to_string(path) {
        Ok(existing) => existing != content,
        Err(_) => true,
    }
}

/// Write `content` to `path` unless the file already holds it.
///
/// Parent directories are created as needed. An unchanged file is not touched,
/// so its modification time survives repeated runs.
pub fn write_if_changed(path: &Path, content: &str) -> Result<WriteResult> {
    if !needs_write(path, content) {
        return Ok(WriteResult::Unchanged);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .wrap_err_with(|| format!("failed to write {}", path.display()))?;
    Ok(WriteResult::Written)
}
