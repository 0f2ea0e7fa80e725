// Command Line Interface Module
// clap-powered entry points for the sampler

pub mod commands;

use clap::{Parser, Subcommand};
use colored::*;

/// sysperf - fixed-cadence system performance sampler
#[derive(Parser)]
#[command(name = "sysperf")]
#[command(version = "0.1.0")]
#[command(about = "Samples CPU frequency, CPU usage and memory usage to a CSV log", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a sampling session
    Run {
        /// Configuration file path
        #[arg(short, long, default_value = "sysperf.toml")]
        config: String,

        /// Total run duration in seconds (overrides the config file)
        #[arg(short, long)]
        duration: Option<u64>,

        /// Seconds between samples (overrides the config file)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Output directory for the CSV log (overrides the config file)
        #[arg(short, long)]
        output_dir: Option<String>,

        /// Output filename prefix (overrides the config file)
        #[arg(short, long)]
        prefix: Option<String>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Recompute summary statistics from an existing CSV log
    Summarize {
        /// Path to a previously written log file
        file: String,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file to validate
        #[arg(short, long, default_value = "sysperf.toml")]
        file: String,
    },
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}

/// Print the sysperf banner
pub fn print_banner() {
    println!("{}", r#"
╔══════════════════════════════════════════════╗
║   sysperf  v0.1.0                            ║
║   Fixed-cadence system performance sampler   ║
╚══════════════════════════════════════════════╝
    "#.bright_cyan().bold());
}
