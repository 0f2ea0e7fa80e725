// CLI Command Implementations
// summarize and validate, with colored output

use anyhow::Result;
use colored::*;

use super::{info, success};
use crate::config::SamplerConfig;
use crate::sampler::stats::RunSummary;
use crate::sink;

/// Recompute summary statistics from a previously written log.
pub fn summarize(file: &str) -> Result<()> {
    info(&format!("Reading samples from {}", file.bright_white()));

    let samples = sink::read_samples(file)?;
    let summary = RunSummary::from_samples(&samples);
    summary.print();

    success(&format!("{} rows summarized", samples.len()));
    Ok(())
}

/// Load and validate a configuration file, reporting the effective run shape.
pub fn validate(file: &str) -> Result<()> {
    info(&format!("Validating {}", file.bright_white()));

    let config = SamplerConfig::load(file)?;
    config.validate()?;

    success("Configuration file is valid");
    println!();
    println!(
        "  {} {}s total, {}s interval ({} ticks)",
        "Run:".bright_white(),
        config.run.duration_secs.to_string().cyan(),
        config.run.interval_secs.to_string().cyan(),
        config.ticks().to_string().yellow()
    );
    println!(
        "  {} {}/{}*.csv, flush every {} samples",
        "Output:".bright_white(),
        config.output.directory.cyan(),
        config.output.prefix.cyan(),
        config.output.flush_batch_size.to_string().yellow()
    );
    println!();

    Ok(())
}
