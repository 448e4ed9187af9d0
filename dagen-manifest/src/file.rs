use std::path::{Path, PathBuf};

use crate::{Manifest, Result};

/// Represents a dagen.toml file with both raw content and parsed manifest.
pub struct DagenToml {
    path: PathBuf,
    content: String,
    manifest: Manifest,
}

impl DagenToml {
    /// Open and parse a dagen.toml file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Box::new(crate::Error::Io {
                path: path.clone(),
                source: e,
            })
        })?;
        let filename = path.display().to_string();
        let manifest = Manifest::from_str_with_filename(&content, &filename)?;

        Ok(Self {
            path,
            content,
            manifest,
        })
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory that relative output paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Get the raw content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the parsed manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_open_and_base_dir() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dagen.toml");
        std::fs::write(
            &path,
            "[[repository]]\nconnection = \"x\"\nschema = \"dbo\"\nnamespace = \"A.B\"\noutput = \"out\"\n",
        )
        .unwrap();

        let file = DagenToml::open(&path).unwrap();
        assert_eq!(file.base_dir(), temp.path());
        assert_eq!(file.manifest().repositories.len(), 1);
        assert!(file.content().contains("[[repository]]"));
    }

    #[test]
    fn test_open_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = DagenToml::open(temp.path().join("nope.toml")).err().unwrap();
        assert!(matches!(*err, crate::Error::Io { .. }));
    }

    #[test]
    fn test_bare_filename_base_dir() {
        let file = DagenToml {
            path: PathBuf::from("dagen.toml"),
            content: String::new(),
            manifest: Manifest {
                repositories: Vec::new(),
            },
        };
        assert_eq!(file.base_dir(), Path::new("."));
    }
}
