// sysinfo-backed Metrics Source
// CPU usage is windowed: each reading covers the interval since the previous refresh

use sysinfo::System;
use tracing::debug;

use super::{round_to, MetricError, MetricsSource, Reading};

/// Production metrics source reading host counters via sysinfo.
///
/// The `System` handle is refreshed per query so every tick observes fresh
/// counters; usage percentages are derived by sysinfo from the delta between
/// two refreshes, which makes each reading a mean over the preceding interval.
pub struct SystemMetricsSource {
    sys: System,
}

impl SystemMetricsSource {
    pub fn new() -> Self {
        let mut sys = System::new();
        // Prime the CPU counters so the first tick has a baseline window
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        debug!(cpus = sys.cpus().len(), "System metrics source initialized");
        Self { sys }
    }

    /// Mean frequency across the cores that report one. Platforms that do not
    /// expose frequency report 0 per core, which we treat as unavailable.
    fn mean_core_frequency_mhz(&self) -> Option<f64> {
        let reported: Vec<u64> = self
            .sys
            .cpus()
            .iter()
            .map(|cpu| cpu.frequency())
            .filter(|mhz| *mhz > 0)
            .collect();

        if reported.is_empty() {
            return None;
        }
        Some(reported.iter().sum::<u64>() as f64 / reported.len() as f64)
    }
}

impl MetricsSource for SystemMetricsSource {
    fn nominal_frequency_mhz(&mut self) -> Reading {
        self.sys.refresh_cpu_frequency();
        self.mean_core_frequency_mhz()
            .map(f64::round)
            .ok_or(MetricError::Unsupported)
    }

    fn dynamic_frequency_mhz(&mut self, _nominal_mhz: f64) -> Reading {
        // sysinfo reports the scaled per-core frequency directly, so the
        // nominal base needs no ratio math here
        self.sys.refresh_cpu_frequency();
        self.mean_core_frequency_mhz()
            .map(f64::round)
            .ok_or(MetricError::Unsupported)
    }

    fn cpu_usage_pct(&mut self) -> Reading {
        self.sys.refresh_cpu_usage();
        let usage = f64::from(self.sys.global_cpu_usage());
        if !(0.0..=100.0).contains(&usage) {
            return Err(MetricError::OutOfRange(usage));
        }
        Ok(round_to(usage, 2))
    }

    fn memory_usage_pct(&mut self) -> Reading {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(MetricError::Unsupported);
        }
        let available = self.sys.available_memory().min(total);
        let pct = 100.0 * (1.0 - available as f64 / total as f64);
        Ok(round_to(pct, 2))
    }
}

impl Default for SystemMetricsSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_usage_in_range() {
        let mut source = SystemMetricsSource::new();
        let pct = source.memory_usage_pct().expect("host reports memory");
        assert!((0.0..=100.0).contains(&pct));
    }

    #[test]
    fn test_cpu_usage_in_range_when_available() {
        let mut source = SystemMetricsSource::new();
        if let Ok(pct) = source.cpu_usage_pct() {
            assert!((0.0..=100.0).contains(&pct));
        }
    }

    #[test]
    fn test_nominal_frequency_positive_when_available() {
        let mut source = SystemMetricsSource::new();
        if let Ok(mhz) = source.nominal_frequency_mhz() {
            assert!(mhz > 0.0);
            assert_eq!(mhz, mhz.round());
        }
    }
}
