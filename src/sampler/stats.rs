// Summary statistics over a run's valid samples
// Each field is aggregated independently; missing ticks are excluded

use colored::*;

use crate::metrics::Sample;

/// Aggregates for one metric, computed only over ticks where it was present.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStats {
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub valid_count: usize,
}

impl FieldStats {
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let sum: f64 = values.iter().sum();
        let minimum = values.iter().copied().fold(f64::INFINITY, f64::min);
        let maximum = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            average: sum / values.len() as f64,
            minimum,
            maximum,
            valid_count: values.len(),
        })
    }
}

/// End-of-run summary. A field with zero valid samples carries `None`
/// instead of a computed statistic, so there is no divide-by-zero path.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total_ticks: usize,
    pub cpu_frequency: Option<FieldStats>,
    pub cpu_usage: Option<FieldStats>,
    pub memory_usage: Option<FieldStats>,
}

impl RunSummary {
    pub fn from_samples(samples: &[Sample]) -> Self {
        Self {
            total_ticks: samples.len(),
            cpu_frequency: Self::field_stats(samples, |s| s.cpu_frequency_mhz),
            cpu_usage: Self::field_stats(samples, |s| s.cpu_usage_pct),
            memory_usage: Self::field_stats(samples, |s| s.memory_usage_pct),
        }
    }

    fn field_stats(samples: &[Sample], field: impl Fn(&Sample) -> Option<f64>) -> Option<FieldStats> {
        let values: Vec<f64> = samples.iter().filter_map(&field).collect();
        FieldStats::from_values(&values)
    }

    /// Print the per-field summary block.
    pub fn print(&self) {
        println!();
        println!("{}", "─── Run Summary ───────────────────────────────".bright_white());
        self.print_field("CPU Speed (MHz)", &self.cpu_frequency);
        self.print_field("CPU Usage (%)", &self.cpu_usage);
        self.print_field("Memory Usage (%)", &self.memory_usage);
        println!("{}", "───────────────────────────────────────────────".bright_white());
        println!();
    }

    fn print_field(&self, label: &str, stats: &Option<FieldStats>) {
        match stats {
            Some(s) => println!(
                "  {} avg {}  min {}  max {}  ({}/{} valid samples)",
                format!("{label:<18}").bright_white(),
                format!("{:.2}", s.average).cyan(),
                format!("{:.2}", s.minimum).green(),
                format!("{:.2}", s.maximum).yellow(),
                s.valid_count,
                self.total_ticks
            ),
            None => println!(
                "  {} {}",
                format!("{label:<18}").bright_white(),
                "no valid data".red()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn sample(freq: Option<f64>, cpu: Option<f64>, mem: Option<f64>) -> Sample {
        Sample {
            timestamp: Local::now(),
            cpu_frequency_mhz: freq,
            cpu_usage_pct: cpu,
            memory_usage_pct: mem,
        }
    }

    #[test]
    fn test_stats_skip_missing_ticks() {
        let samples = vec![
            sample(Some(2400.0), Some(10.0), Some(40.0)),
            sample(Some(2400.0), Some(20.0), Some(40.0)),
            sample(Some(2400.0), None, Some(40.0)),
            sample(Some(2400.0), Some(30.0), Some(40.0)),
        ];

        let summary = RunSummary::from_samples(&samples);
        assert_eq!(summary.total_ticks, 4);

        let cpu = summary.cpu_usage.expect("three valid readings");
        assert_eq!(cpu.valid_count, 3);
        assert_eq!(cpu.average, 20.0);
        assert_eq!(cpu.minimum, 10.0);
        assert_eq!(cpu.maximum, 30.0);
    }

    #[test]
    fn test_fully_missing_field_has_no_stats() {
        let samples = vec![
            sample(None, Some(10.0), Some(40.0)),
            sample(None, Some(20.0), Some(40.0)),
        ];

        let summary = RunSummary::from_samples(&samples);
        assert!(summary.cpu_frequency.is_none());
        assert!(summary.cpu_usage.is_some());
    }

    #[test]
    fn test_empty_run() {
        let summary = RunSummary::from_samples(&[]);
        assert_eq!(summary.total_ticks, 0);
        assert!(summary.cpu_frequency.is_none());
        assert!(summary.cpu_usage.is_none());
        assert!(summary.memory_usage.is_none());
    }

    #[test]
    fn test_single_sample_stats() {
        let samples = vec![sample(Some(2000.0), Some(15.5), Some(60.0))];
        let summary = RunSummary::from_samples(&samples);

        let freq = summary.cpu_frequency.unwrap();
        assert_eq!(freq.average, 2000.0);
        assert_eq!(freq.minimum, 2000.0);
        assert_eq!(freq.maximum, 2000.0);
        assert_eq!(freq.valid_count, 1);
    }
}
