use std::path::{Path, PathBuf};

/// Suffix shared by every file the generator owns.
pub const GENERATED_SUFFIX: &str = ".generated.cs";

/// Directory of the fake repository, relative to the output root.
pub const FAKE_DIR: &str = "Fake";

/// A generated file, not yet formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    /// Relative to the output root
    pub path: PathBuf,
    pub content: String,
}

impl OutputArtifact {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// `{entity}.generated.cs`
    pub fn entity(entity: &str, content: impl Into<String>) -> Self {
        Self::new(format!("{entity}{GENERATED_SUFFIX}"), content)
    }

    /// `Fake/{entity}.generated.cs`
    pub fn fake(entity: &str, content: impl Into<String>) -> Self {
        Self::new(
            Path::new(FAKE_DIR).join(format!("{entity}{GENERATED_SUFFIX}")),
            content,
        )
    }

    /// `{entity}.TransactionManaged.generated.cs`
    pub fn transaction_managed(entity: &str, content: impl Into<String>) -> Self {
        Self::new(
            format!("{entity}.TransactionManaged{GENERATED_SUFFIX}"),
            content,
        )
    }
}

/// Whether a file name follows the generated naming convention.
pub fn is_generated(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(GENERATED_SUFFIX))
}
