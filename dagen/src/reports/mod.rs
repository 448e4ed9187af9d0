//! Report data structures for commands.
//!
//! This module provides data structures that separate data collection from rendering.
//! Commands build reports, then render them to an Output target or print them as JSON.

mod check;
mod generate;
mod output;

pub use check::{CheckReport, RepositorySummary};
pub use generate::{GenerateReport, RepositoryReport};
pub use output::{Report, TerminalOutput};
