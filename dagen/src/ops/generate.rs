//! Generate operation - one repository from catalog to disk.

use std::path::Path;

use dagen_catalog::SchemaIntrospector;
use dagen_codegen::{
    Diagnostic, GenerationEngine, GenerationSettings, OutputReconciler, Phase, RoutineDescriptor,
};
use dagen_core::WriteResult;
use dagen_manifest::RepositorySettings;
use eyre::{Context, Result};

use crate::reports::RepositoryReport;

/// Options for the generate operation.
pub struct GenerateOptions<'a> {
    /// Directory the manifest lives in.
    pub base_dir: &'a Path,
    /// Stamped into the header of per-repository files.
    pub version: Option<&'a str>,
}

/// Translate a manifest repository into engine settings.
pub fn settings_for(repository: &RepositorySettings, opts: &GenerateOptions) -> GenerationSettings {
    let mut settings = GenerationSettings::new(
        repository.namespace.clone(),
        repository.schema.clone(),
        repository.output_dir(opts.base_dir),
    );
    settings.repository_name = repository.name.clone();
    settings.include_fakes = repository.include_fakes;
    settings.allow_speculative = repository.allow_execution;
    settings.version = opts.version.map(str::to_string);
    settings.routines = repository
        .routines
        .iter()
        .map(|r| {
            let mut descriptor = RoutineDescriptor::new(r.proc.clone());
            descriptor.display_name = r.name.clone();
            descriptor.policy = r.shape;
            descriptor.lookup_output_types = r.lookup_output_types;
            descriptor
        })
        .collect();
    settings
}

/// Execute the generate operation for one repository.
///
/// Fatal failures are returned as errors. Recorded problems end up in the
/// report and do not prevent the output from being reconciled.
pub fn generate(
    repository: &RepositorySettings,
    introspector: &dyn SchemaIntrospector,
    reconciler: &dyn OutputReconciler,
    opts: &GenerateOptions,
) -> Result<RepositoryReport> {
    let settings = settings_for(repository, opts);
    let name = settings.repository_name();

    let output = GenerationEngine::new(introspector)?
        .generate(&settings)
        .wrap_err_with(|| format!("Failed to generate {name}"))?;

    let written = reconciler
        .write(&settings.output, &output.artifacts)
        .wrap_err_with(|| format!("Failed to write {name}"))?;
    let deleted = reconciler
        .delete_stale(&settings.output, &output.keep)
        .wrap_err_with(|| format!("Failed to clean {name}"))?;

    let unchanged = written
        .iter()
        .filter(|w| w.result == WriteResult::Unchanged)
        .count();

    Ok(RepositoryReport {
        repository: name,
        output_dir: settings.output,
        written: written
            .into_iter()
            .filter(|w| w.result == WriteResult::Written)
            .map(|w| w.path)
            .collect(),
        unchanged,
        deleted,
        errors: output.diagnostics,
    })
}

/// Execute the generate operation for each repository in turn.
///
/// `open` yields the catalog of a repository. When opening or generating one
/// repository fails, the failure becomes that repository's only error and the
/// remaining repositories still run.
pub fn generate_all<'r, F>(
    repositories: impl IntoIterator<Item = &'r RepositorySettings>,
    mut open: F,
    reconciler: &dyn OutputReconciler,
    opts: &GenerateOptions,
) -> Vec<RepositoryReport>
where
    F: FnMut(&RepositorySettings) -> Result<Box<dyn SchemaIntrospector>>,
{
    repositories
        .into_iter()
        .map(|repository| {
            open(repository)
                .and_then(|introspector| {
                    generate(repository, introspector.as_ref(), reconciler, opts)
                })
                .unwrap_or_else(|error| failed(repository, opts, &error))
        })
        .collect()
}

fn failed(
    repository: &RepositorySettings,
    opts: &GenerateOptions,
    error: &eyre::Report,
) -> RepositoryReport {
    let settings = settings_for(repository, opts);
    let name = settings.repository_name();
    tracing::warn!(repository = %name, "{error:#}");

    RepositoryReport {
        repository: name,
        output_dir: settings.output,
        written: Vec::new(),
        unchanged: 0,
        deleted: Vec::new(),
        errors: vec![Diagnostic::error(Phase::Generate, format!("{error:#}"))],
    }
}
