mod commands;
mod connect;
mod ops;
mod reports;

use clap::Parser;
use eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::commands::Cli;

/// Environment variable holding a log filter, overriding `-v`.
const LOG_ENV: &str = "DAGEN_LOG";

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);
    cli.run()
}
