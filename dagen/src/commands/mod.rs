mod check;
mod completions;
mod generate;

use check::CheckCommand;
use clap::{Parser, Subcommand};
use completions::CompletionsCommand;
use eyre::Result;
use generate::GenerateCommand;

/// Extension trait for exiting on manifest errors with pretty formatting
pub(crate) trait UnwrapOrExit<T> {
    fn unwrap_or_exit(self) -> T;
}

impl<T> UnwrapOrExit<T> for dagen_manifest::Result<T> {
    fn unwrap_or_exit(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                eprintln!("{:?}", miette::Report::new(*e));
                std::process::exit(1);
            }
        }
    }
}

#[derive(Parser)]
#[command(name = "dagen")]
#[command(version)]
#[command(about = "Generate C# data-access repositories from SQL Server stored procedures")]
pub(crate) struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Generate(cmd) => cmd.run(),
            Commands::Check(cmd) => cmd.run(),
            Commands::Completions(cmd) => cmd.run(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate repositories described in dagen.toml
    Generate(GenerateCommand),

    /// Validate dagen.toml without connecting to a database
    Check(CheckCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}
