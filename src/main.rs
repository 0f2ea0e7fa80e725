// sysperf - fixed-cadence system performance sampler
// Main entry point: CLI dispatch and the run wiring

use anyhow::Result;
use clap::Parser;
use tracing::info;

use sysperf::metrics::system::SystemMetricsSource;
use sysperf::sampler::Sampler;
use sysperf::signals::ShutdownCoordinator;
use sysperf::sink::CsvSink;
use sysperf::{cli, config, observability};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    match args.command {
        cli::Commands::Run {
            config,
            duration,
            interval,
            output_dir,
            prefix,
            verbose,
        } => {
            observability::init(verbose)?;
            cli::print_banner();
            run_sampler(config, duration, interval, output_dir, prefix).await
        }
        cli::Commands::Summarize { file } => cli::commands::summarize(&file),
        cli::Commands::Validate { file } => cli::commands::validate(&file),
    }
}

/// Wire up one sampling run: config + overrides, sink, signal handling,
/// the loop itself, and the final summary.
async fn run_sampler(
    config_path: String,
    duration: Option<u64>,
    interval: Option<u64>,
    output_dir: Option<String>,
    prefix: Option<String>,
) -> Result<()> {
    let mut config = config::SamplerConfig::load(&config_path)?;

    // CLI overrides take precedence over the file
    if let Some(secs) = duration {
        config.run.duration_secs = secs;
    }
    if let Some(secs) = interval {
        config.run.interval_secs = secs;
    }
    if let Some(dir) = output_dir {
        config.output.directory = dir;
    }
    if let Some(prefix) = prefix {
        config.output.prefix = prefix;
    }
    config.validate()?;

    let mut sink = CsvSink::create(&config.output.directory, &config.output.prefix)?;
    cli::info(&format!("Logging to {}", sink.path().display()));
    cli::info(&format!(
        "{} ticks, one every {}s - press Ctrl+C to stop early",
        config.ticks(),
        config.run.interval_secs
    ));

    let coordinator = ShutdownCoordinator::new();
    coordinator.listen_for_signals()?;

    let source = SystemMetricsSource::new();
    let mut sampler = Sampler::new(config.sampler_settings(), source);
    let summary = sampler.run(&mut sink, coordinator.subscribe()).await?;

    summary.print();
    info!(
        rows = sink.rows_written(),
        path = %sink.path().display(),
        "Run finished"
    );
    cli::success(&format!(
        "{} samples written to {}",
        sink.rows_written(),
        sink.path().display()
    ));

    Ok(())
}
