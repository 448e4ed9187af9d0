use std::path::PathBuf;

use clap::Args;
use dagen_codegen::DiskReconciler;
use dagen_manifest::DagenToml;
use eyre::{Context, Result};

use super::UnwrapOrExit;
use crate::{
    connect,
    ops::{self, generate::GenerateOptions},
    reports::{GenerateReport, Report, TerminalOutput},
};

#[derive(Args)]
pub struct GenerateCommand {
    /// Path to dagen.toml (defaults to ./dagen.toml)
    #[arg(short, long, default_value = "dagen.toml")]
    pub config: PathBuf,

    /// Report what would change without touching disk
    #[arg(long)]
    pub dry_run: bool,

    /// Only generate the repository with this name
    #[arg(short, long)]
    pub repository: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl GenerateCommand {
    /// Run the generate command
    pub fn run(&self) -> Result<()> {
        let dagen_toml = DagenToml::open(&self.config).unwrap_or_exit();
        let manifest = dagen_toml.manifest();

        let repositories = match &self.repository {
            Some(name) => match manifest.repository(name) {
                Some(repository) => vec![repository],
                None => eyre::bail!(
                    "no repository named '{}' in {}",
                    name,
                    self.config.display()
                ),
            },
            None => manifest.repositories.iter().collect(),
        };

        let reconciler = DiskReconciler {
            dry_run: self.dry_run,
        };
        let opts = GenerateOptions {
            base_dir: dagen_toml.base_dir(),
            version: Some(env!("CARGO_PKG_VERSION")),
        };

        let repositories = ops::generate_all(
            repositories,
            |repository| {
                let name = repository.repository_name();
                tracing::info!(repository = %name, schema = %repository.schema, "generating");

                let connection = repository.resolve_connection().unwrap_or_exit();
                connect::introspector(&connection)
                    .wrap_err_with(|| format!("Failed to open the catalog for {name}"))
            },
            &reconciler,
            &opts,
        );
        let report = GenerateReport {
            dry_run: self.dry_run,
            repositories,
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            report.render(&mut TerminalOutput::new());
        }

        if report.error_count() > 0 {
            std::process::exit(1);
        }
        Ok(())
    }
}
