mod cli;
mod histogram;
mod loader;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use scatter_compute::{extract_features_parallel, score_distributions, train_classifier};
use scatter_core::config::load_dotenv;
use scatter_core::Config;

use crate::cli::{CliArgs, Command};
use crate::histogram::Histogram;
use crate::loader::read_load_results;

const HISTOGRAM_BAR_WIDTH: usize = 50;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let config = resolve_config(&args)?;
    config.log_summary();

    match args.command {
        Command::Extract { input, output } => {
            let load_results = read_load_results(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let records = extract_features_parallel(
                &load_results,
                &config.extraction,
                config.runtime.n_jobs,
            );
            write_json_lines(&records, output.as_deref())?;
        }
        Command::Score {
            train,
            score,
            contamination,
            output,
            histogram,
            bins,
        } => {
            let mut training = config.training.clone();
            if let Some(c) = contamination {
                training.contamination = c;
            }

            let population = read_load_results(&train)
                .with_context(|| format!("failed to read {}", train.display()))?;
            let population_features =
                extract_features_parallel(&population, &config.extraction, config.runtime.n_jobs);
            let model = train_classifier(&population_features, &training, config.runtime.n_jobs)
                .context("training failed")?;

            let features = match &score {
                Some(path) => {
                    let targets = read_load_results(path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    extract_features_parallel(&targets, &config.extraction, config.runtime.n_jobs)
                }
                None => population_features,
            };

            let scores = score_distributions(&model, &features).context("scoring failed")?;
            info!(
                "{} distributions scored against threshold {:.4}",
                scores.len(),
                model.threshold()
            );
            write_json_lines(&scores, output.as_deref())?;

            if histogram {
                let values: Vec<f64> = scores.iter().map(|s| s.anomaly_score).collect();
                match Histogram::from_values(&values, bins) {
                    Some(h) => eprint!("{}", h.render(HISTOGRAM_BAR_WIDTH)),
                    None => eprintln!("no finite scores to plot"),
                }
            }
        }
    }

    Ok(())
}

/// File config if given, else environment; command-line flags win.
fn resolve_config(args: &CliArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::from_env(),
    };

    if let Some(jobs) = args.jobs {
        config.runtime.n_jobs = jobs;
    }
    if let Some(ratio) = args.aspect_ratio {
        config.extraction.aspect_ratio = ratio;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn write_json_lines<T: Serialize>(records: &[T], output: Option<&Path>) -> Result<()> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
