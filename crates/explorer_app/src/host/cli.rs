use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use super::logging::LogDestination;

/// Run a federated search across the knowledge-graph data sources and show
/// each source's progress.
#[derive(Debug, Parser)]
#[command(name = "explorer", version)]
pub struct Cli {
    /// RON file with the source catalog and timing settings.
    #[arg(long, env = "EXPLORER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Search text shown in the panel header.
    #[arg(long, default_value = "")]
    pub query: String,

    /// Seed for reproducible progress and outcomes.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Probability that a source ends in error.
    #[arg(long)]
    pub failure_probability: Option<f64>,

    /// Cancel the search after this many milliseconds.
    #[arg(long)]
    pub cancel_after_ms: Option<u64>,

    /// Give up waiting for the sources after this many milliseconds.
    #[arg(long, default_value_t = 120_000)]
    pub timeout_ms: u64,

    /// Source id to activate once the search starts.
    #[arg(long)]
    pub select: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    /// Log trigger and tick traffic too.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Trace
        } else {
            LevelFilter::Info
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}
