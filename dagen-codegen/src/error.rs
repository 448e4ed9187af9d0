use dagen_catalog::CatalogError;
use dagen_core::TypeMappingError;
use thiserror::Error;

/// Failures that stop generation of a repository.
///
/// Problems a user can fix in the settings are [`crate::Diagnostic`]s instead.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("cannot generate {routine}: {source}")]
    TypeMapping {
        routine: String,
        #[source]
        source: TypeMappingError,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("failed to start generation workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl GenerationError {
    pub(crate) fn type_mapping(routine: &str, source: TypeMappingError) -> Self {
        Self::TypeMapping {
            routine: routine.to_string(),
            source,
        }
    }
}
