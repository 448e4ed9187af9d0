//! The generation run for one repository.
//!
//! A run has four steps:
//!
//! 1. select the routines, from the allow-list or by discovering the schema;
//! 2. load the row-set types once;
//! 3. resolve and emit every routine on a small worker pool;
//! 4. emit the row-set classes some routine used, plus the base files.
//!
//! Step 4 reads the "used" marks set during step 3, so it only starts once
//! every routine is done.

use std::{
    collections::{BTreeSet, HashSet},
    path::PathBuf,
};

use dagen_catalog::{ParameterDescriptor, ResultColumnDescriptor, SchemaIntrospector};
use dagen_core::ShapePolicy;
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::{
    GenerationError,
    artifact::OutputArtifact,
    diagnostic::{Diagnostic, Phase, Severity},
    emit::{base, fake, holders, repository, wrap_in_namespace},
    model::{ParameterModel, ResultProperty, RoutineModel},
    settings::{GenerationSettings, RoutineDescriptor},
    shape::resolve_contract,
};

/// Upper bound on routines processed at once, and so on open connections.
pub const MAX_PARALLELISM: usize = 2;

/// Catalog data fetched during discovery, reused when emitting.
#[derive(Debug, Clone)]
struct Prefetched {
    parameters: Vec<ParameterDescriptor>,
    columns: Vec<ResultColumnDescriptor>,
}

#[derive(Debug, Clone)]
struct SelectedRoutine {
    descriptor: RoutineDescriptor,
    prefetched: Option<Prefetched>,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub repository: String,
    /// Unformatted, in a stable order
    pub artifacts: Vec<OutputArtifact>,
    /// Recorded problems, in routine order
    pub diagnostics: Vec<Diagnostic>,
    /// Paths relative to the output root that must survive stale cleanup
    pub keep: BTreeSet<PathBuf>,
}

impl GenerationOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }
}

/// Drives a generation run against one [`SchemaIntrospector`].
pub struct GenerationEngine<'a> {
    introspector: &'a dyn SchemaIntrospector,
    pool: rayon::ThreadPool,
}

impl<'a> GenerationEngine<'a> {
    pub fn new(introspector: &'a dyn SchemaIntrospector) -> Result<Self, GenerationError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(MAX_PARALLELISM)
            .thread_name(|i| format!("dagen-worker-{i}"))
            .build()?;
        Ok(Self { introspector, pool })
    }

    /// Generate every artifact of the repository described by `settings`.
    ///
    /// Selection and shape problems are recorded in the output. Catalog
    /// failures and unmapped types abort the run.
    pub fn generate(&self, settings: &GenerationSettings) -> Result<GenerationOutput, GenerationError> {
        let repository = settings.repository_name();
        let diagnostics: Mutex<Vec<(usize, Diagnostic)>> = Mutex::new(Vec::new());

        let selected = self.select(settings, &diagnostics)?;
        tracing::debug!(repository = %repository, routines = selected.len(), "selected routines");

        self.introspector.user_defined_types()?;

        let routines: Vec<Vec<OutputArtifact>> = self.pool.install(|| {
            selected
                .par_iter()
                .enumerate()
                .map(|(index, routine)| {
                    self.generate_routine(index + 1, routine, settings, &repository, &diagnostics)
                })
                .collect::<Result<_, GenerationError>>()
        })?;

        let mut artifacts = self.base_artifacts(settings, &repository);
        artifacts.extend(routines.into_iter().flatten());
        for row_set in self.introspector.used_user_defined_types()? {
            let content = holders::row_set_class(&row_set)
                .map_err(|e| GenerationError::type_mapping(&row_set.name, e))?;
            artifacts.push(OutputArtifact::entity(
                &row_set.class_name(),
                wrap_in_namespace(&content, &settings.namespace, None, &[]),
            ));
        }

        let mut diagnostics = diagnostics.into_inner();
        diagnostics.sort_by_key(|(index, _)| *index);
        let diagnostics: Vec<Diagnostic> = diagnostics.into_iter().map(|(_, d)| d).collect();
        for diagnostic in &diagnostics {
            tracing::warn!(repository = %repository, phase = %diagnostic.phase, "{}", diagnostic.message);
        }

        let keep = artifacts.iter().map(|a| a.path.clone()).collect();
        tracing::info!(
            repository = %repository,
            artifacts = artifacts.len(),
            errors = diagnostics.len(),
            "generation finished"
        );

        Ok(GenerationOutput {
            repository,
            artifacts,
            diagnostics,
            keep,
        })
    }

    fn select(
        &self,
        settings: &GenerationSettings,
        diagnostics: &Mutex<Vec<(usize, Diagnostic)>>,
    ) -> Result<Vec<SelectedRoutine>, GenerationError> {
        let catalog = self.introspector.list_routines(&settings.schema)?;

        if settings.routines.is_empty() {
            return self.discover(settings, catalog);
        }

        let (selected, errors) = filter_allow_list(&settings.routines, &catalog);
        diagnostics
            .lock()
            .extend(errors.into_iter().map(|d| (0, d)));
        Ok(selected
            .into_iter()
            .map(|descriptor| SelectedRoutine {
                descriptor,
                prefetched: None,
            })
            .collect())
    }

    /// Every routine of the schema, with a policy inferred from its shape.
    fn discover(
        &self,
        settings: &GenerationSettings,
        catalog: Vec<String>,
    ) -> Result<Vec<SelectedRoutine>, GenerationError> {
        self.pool.install(|| {
            catalog
                .into_par_iter()
                .map(|proc| -> Result<SelectedRoutine, GenerationError> {
                    let parameters = self.introspector.parameters(&settings.schema, &proc)?;
                    let columns = self.introspector.result_shape(
                        &settings.schema,
                        &proc,
                        &parameters,
                        settings.allow_speculative,
                    )?;
                    let policy = if columns.is_empty() {
                        ShapePolicy::None
                    } else {
                        ShapePolicy::List
                    };
                    tracing::debug!(routine = %proc, %policy, columns = columns.len(), "discovered routine");
                    Ok(SelectedRoutine {
                        descriptor: RoutineDescriptor::new(proc).policy(policy),
                        prefetched: Some(Prefetched {
                            parameters,
                            columns,
                        }),
                    })
                })
                .collect()
        })
    }

    fn generate_routine(
        &self,
        index: usize,
        routine: &SelectedRoutine,
        settings: &GenerationSettings,
        repository: &str,
        diagnostics: &Mutex<Vec<(usize, Diagnostic)>>,
    ) -> Result<Vec<OutputArtifact>, GenerationError> {
        let descriptor = &routine.descriptor;
        let schema = settings.schema.as_str();
        let proc = descriptor.proc.as_str();
        let class = descriptor.class_name();
        let policy = descriptor.policy.unwrap_or(ShapePolicy::List);

        let parameters = match &routine.prefetched {
            Some(prefetched) => prefetched.parameters.clone(),
            None => self.introspector.parameters(schema, proc)?,
        };
        let columns = match (&routine.prefetched, descriptor.lookup_output_types) {
            (_, false) => Vec::new(),
            (Some(prefetched), true) => prefetched.columns.clone(),
            (None, true) => {
                self.introspector
                    .result_shape(schema, proc, &parameters, settings.allow_speculative)?
            }
        };

        let parameters = parameters
            .into_iter()
            .map(|p| ParameterModel::resolve(proc, p, self.introspector))
            .collect::<Result<Vec<_>, _>>()?;

        let column_properties = match policy {
            ShapePolicy::None | ShapePolicy::Output => Vec::new(),
            _ => columns
                .iter()
                .map(ResultProperty::from_column)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| GenerationError::type_mapping(proc, e))?,
        };
        let output_properties = parameters
            .iter()
            .filter(|p| p.is_output())
            .map(ResultProperty::from_output)
            .collect();

        let resolution = resolve_contract(
            descriptor.policy,
            proc,
            &class,
            column_properties,
            output_properties,
        );

        let mut recorded = Vec::new();
        if let Some(error) = &resolution.error {
            recorded.push(Diagnostic::error(Phase::Shape, error.to_string()).at(proc));
        }
        if descriptor.lookup_output_types
            && columns.is_empty()
            && !matches!(policy, ShapePolicy::None | ShapePolicy::Output)
        {
            if let Some(message) = self.introspector.shape_diagnostic(schema, proc)? {
                recorded.push(Diagnostic::error(Phase::Shape, format!("{proc}: {message}")).at(proc));
            }
        }
        if !recorded.is_empty() {
            diagnostics
                .lock()
                .extend(recorded.into_iter().map(|d| (index, d)));
        }

        let model = RoutineModel {
            schema: schema.to_string(),
            proc: proc.to_string(),
            class,
            repository: repository.to_string(),
            parameters,
            contract: resolution.contract,
            properties: resolution.properties,
        };
        tracing::debug!(routine = %proc, policy = %model.contract.policy(), "emitting routine");

        let namespace = settings.namespace.as_str();
        let mut artifacts = vec![
            OutputArtifact::entity(
                &model.class,
                wrap_in_namespace(&repository::routine_file(&model), namespace, None, &[]),
            ),
            OutputArtifact::transaction_managed(
                &model.class,
                wrap_in_namespace(&repository::transaction_file(&model), namespace, None, &[]),
            ),
        ];
        if settings.include_fakes {
            artifacts.push(OutputArtifact::fake(
                &model.class,
                wrap_in_namespace(
                    &fake::fake_file(&model),
                    &settings.fake_namespace(),
                    None,
                    &[namespace],
                ),
            ));
        }
        Ok(artifacts)
    }

    fn base_artifacts(&self, settings: &GenerationSettings, repository: &str) -> Vec<OutputArtifact> {
        let version = settings.version.as_deref();
        let mut artifacts = vec![OutputArtifact::entity(
            repository,
            wrap_in_namespace(&base::repository_base(repository), &settings.namespace, version, &[]),
        )];
        if settings.include_fakes {
            artifacts.push(OutputArtifact::fake(
                &format!("Fake{repository}"),
                wrap_in_namespace(
                    &base::fake_base(repository),
                    &settings.fake_namespace(),
                    version,
                    &[settings.namespace.as_str()],
                ),
            ));
        }
        artifacts
    }
}

/// Match allow-list entries against catalog names, ignoring case.
///
/// Matched entries take the catalog's spelling of the name. Only the first of
/// several entries for the same routine is kept.
fn filter_allow_list(
    allow_list: &[RoutineDescriptor],
    catalog: &[String],
) -> (Vec<RoutineDescriptor>, Vec<Diagnostic>) {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    let mut unmatched = Vec::new();
    let mut selected = Vec::new();

    for entry in allow_list {
        let key = entry.proc.to_lowercase();
        if !seen.insert(key.clone()) {
            if !duplicates.contains(&entry.proc) {
                duplicates.push(entry.proc.clone());
            }
            continue;
        }
        match catalog.iter().find(|name| name.to_lowercase() == key) {
            Some(name) => {
                let mut descriptor = entry.clone();
                descriptor.proc = name.clone();
                selected.push(descriptor);
            }
            None => unmatched.push(entry.class_name()),
        }
    }

    if !duplicates.is_empty() {
        errors.push(Diagnostic::error(
            Phase::Select,
            format!("Duplicate procedures found: {}", duplicates.join(", ")),
        ));
    }
    if !unmatched.is_empty() {
        errors.push(Diagnostic::error(
            Phase::Select,
            format!(
                "Some specified procedures don't exist in the schema: {}",
                unmatched.join(", ")
            ),
        ));
    }
    (selected, errors)
}
