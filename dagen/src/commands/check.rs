use std::path::PathBuf;

use clap::Args;
use dagen_manifest::DagenToml;
use eyre::Result;

use super::UnwrapOrExit;
use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub struct CheckCommand {
    /// Path to dagen.toml (defaults to ./dagen.toml)
    #[arg(short, long, default_value = "dagen.toml")]
    pub config: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckCommand {
    /// Run the check command
    pub fn run(&self) -> Result<()> {
        let dagen_toml = DagenToml::open(&self.config).unwrap_or_exit();
        let report = ops::check(&dagen_toml);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            report.render(&mut TerminalOutput::new());
        }
        Ok(())
    }
}
