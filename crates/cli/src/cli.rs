use std::path::PathBuf;

use clap::{Parser, Subcommand};

use scatter_core::config::Contamination;

/// Point-cloud distribution anomaly scoring.
///
/// Reads distributions as JSON (`{"pid": ..., "points": [[x, y], ...]}`,
/// either one array or one object per line), extracts their features and
/// scores them against a population.
#[derive(Parser, Debug)]
#[command(name = "scatter", version, about)]
pub struct CliArgs {
    /// TOML config file (falls back to environment variables)
    #[arg(long, env = "SCATTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Worker threads, 0 = all cores (overrides config)
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Camera aspect ratio applied to x coordinates (overrides config)
    #[arg(long)]
    pub aspect_ratio: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract feature records and write them as JSON lines
    Extract {
        /// Distributions to extract
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Train on one population and score distributions against it
    Score {
        /// Training population
        #[arg(long)]
        train: PathBuf,

        /// Distributions to score (default: the training population)
        #[arg(long)]
        score: Option<PathBuf>,

        /// Expected anomalous fraction, or "auto" (overrides config)
        #[arg(long)]
        contamination: Option<Contamination>,

        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Print a histogram of the scores to stderr
        #[arg(long)]
        histogram: bool,

        /// Histogram bin count
        #[arg(long, default_value = "20")]
        bins: usize,
    },
}
