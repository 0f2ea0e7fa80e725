// Metrics Source capability surface
// Three independently-fallible readings per tick; a failed field never aborts a tick

pub mod system;

use chrono::{DateTime, Local};
use thiserror::Error;

/// Literal token written to the CSV (and console) for a missing field.
pub const MISSING_TOKEN: &str = "N/A";

/// Wall-clock timestamp format used in the CSV and progress lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Why a metric could not be obtained this tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    /// The platform does not report this counter, or reported nothing usable.
    #[error("not reported by the platform")]
    Unsupported,

    /// The counter returned a value outside its plausible range.
    #[error("reading out of range: {0}")]
    OutOfRange(f64),
}

/// Outcome of a single metric query: a value, or the reason it is missing.
pub type Reading = Result<f64, MetricError>;

/// Capability surface the sampler loop depends on.
///
/// Each method is independently callable and independently fallible.
/// Production reads host counters via sysinfo; tests substitute scripted values.
pub trait MetricsSource {
    /// Rated/base clock speed in MHz. Queried once at startup and used as
    /// the scaling base for dynamic readings.
    fn nominal_frequency_mhz(&mut self) -> Reading;

    /// Current clock speed in MHz, rounded to the nearest whole unit.
    /// Only called when a nominal reading was obtained at startup.
    fn dynamic_frequency_mhz(&mut self, nominal_mhz: f64) -> Reading;

    /// Host-wide CPU utilization in [0, 100], rounded to 2 decimal places.
    fn cpu_usage_pct(&mut self) -> Reading;

    /// Memory utilization in [0, 100], computed as `100 * (1 - free/total)`
    /// and rounded to 2 decimal places.
    fn memory_usage_pct(&mut self) -> Reading;
}

/// One row of a run: a timestamp plus three best-effort readings.
/// A missing field is `None`, never silently coerced to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Local>,
    pub cpu_frequency_mhz: Option<f64>,
    pub cpu_usage_pct: Option<f64>,
    pub memory_usage_pct: Option<f64>,
}

impl Sample {
    /// CSV rendering: exactly four fields, missing values as the literal `N/A`.
    /// Frequency carries no decimals; the percentages carry two.
    pub fn csv_fields(&self) -> [String; 4] {
        [
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            render_field(self.cpu_frequency_mhz, 0),
            render_field(self.cpu_usage_pct, 2),
            render_field(self.memory_usage_pct, 2),
        ]
    }

    /// Console rendering used by the per-tick progress line.
    pub fn progress_line(&self, tick: u64) -> String {
        let [time, freq, cpu, mem] = self.csv_fields();
        format!("[{tick:>4}] {time}  freq: {freq} MHz  cpu: {cpu} %  mem: {mem} %")
    }
}

fn render_field(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => MISSING_TOKEN.to_string(),
    }
}

/// Round to a fixed number of decimal places. Readings are stored already
/// rounded so the persisted and displayed values always agree.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(freq: Option<f64>, cpu: Option<f64>, mem: Option<f64>) -> Sample {
        Sample {
            timestamp: Local::now(),
            cpu_frequency_mhz: freq,
            cpu_usage_pct: cpu,
            memory_usage_pct: mem,
        }
    }

    #[test]
    fn test_csv_fields_render_values_and_decimals() {
        let s = sample(Some(2400.0), Some(12.35), Some(67.5));
        let fields = s.csv_fields();
        assert_eq!(fields[1], "2400");
        assert_eq!(fields[2], "12.35");
        assert_eq!(fields[3], "67.50");
    }

    #[test]
    fn test_csv_fields_render_missing_as_na() {
        let s = sample(None, None, None);
        let fields = s.csv_fields();
        assert_eq!(&fields[1..], ["N/A", "N/A", "N/A"]);
    }

    #[test]
    fn test_round_to_two_decimals() {
        assert_eq!(round_to(12.3456, 2), 12.35);
        assert_eq!(round_to(99.999, 2), 100.0);
    }

    #[test]
    fn test_round_to_whole_units() {
        assert_eq!(round_to(2400.4, 0), 2400.0);
        assert_eq!(round_to(2400.5, 0), 2401.0);
    }

    #[test]
    fn test_progress_line_contains_all_fields() {
        let s = sample(Some(2400.0), None, Some(50.0));
        let line = s.progress_line(3);
        assert!(line.contains("[   3]"));
        assert!(line.contains("2400 MHz"));
        assert!(line.contains("N/A %"));
        assert!(line.contains("50.00 %"));
    }
}
