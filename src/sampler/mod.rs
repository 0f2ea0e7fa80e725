// Sampler Loop
// Fixed-cadence collection with per-field isolation and batched CSV flushes

pub mod stats;

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::metrics::{MetricsSource, Sample};
use crate::sink::CsvSink;
use stats::RunSummary;

/// Run parameters for one sampling session.
#[derive(Debug, Clone)]
pub struct SamplerSettings {
    /// Total wall-clock time to run.
    pub duration: Duration,

    /// Time between ticks.
    pub interval: Duration,

    /// Buffered samples per flush. Bounds data loss on abrupt termination
    /// to one batch while avoiding a disk write per tick.
    pub flush_batch_size: usize,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(600),
            interval: Duration::from_secs(5),
            flush_batch_size: 10,
        }
    }
}

impl SamplerSettings {
    /// Tick count: truncating division of duration by interval.
    pub fn ticks(&self) -> u64 {
        (self.duration.as_millis() / self.interval.as_millis().max(1)) as u64
    }
}

/// Owns the sampling cadence, per-field error isolation, the row buffer,
/// and end-of-run aggregation. One instance drives one run.
pub struct Sampler<S: MetricsSource> {
    settings: SamplerSettings,
    source: S,
    nominal_mhz: Option<f64>,
}

impl<S: MetricsSource> Sampler<S> {
    pub fn new(settings: SamplerSettings, source: S) -> Self {
        Self {
            settings,
            source,
            nominal_mhz: None,
        }
    }

    /// Access the underlying source, e.g. for post-run inspection in tests.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Drive the full run: one sample per tick, batched flushes, and a
    /// summary over everything collected.
    ///
    /// A shutdown message ends the loop after the in-flight tick; the
    /// finalization path flushes the remaining buffer either way, so an
    /// interrupted run keeps every collected sample.
    pub async fn run(
        &mut self,
        sink: &mut CsvSink,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<RunSummary> {
        let ticks = self.settings.ticks();
        if ticks == 0 {
            anyhow::bail!(
                "duration {:?} is shorter than one interval ({:?})",
                self.settings.duration,
                self.settings.interval
            );
        }
        if self.settings.interval.as_millis() * u128::from(ticks) != self.settings.duration.as_millis()
        {
            warn!(
                ticks,
                "Duration is not an exact multiple of the interval; truncating"
            );
        }

        // The nominal reading gates every dynamic frequency query: without it
        // the frequency column stays N/A for the whole run.
        self.nominal_mhz = match self.source.nominal_frequency_mhz() {
            Ok(mhz) => {
                info!(nominal_mhz = mhz, "Nominal CPU frequency");
                Some(mhz)
            }
            Err(e) => {
                warn!(error = %e, "Could not determine nominal CPU frequency");
                None
            }
        };

        info!(
            ticks,
            interval_secs = self.settings.interval.as_secs_f64(),
            path = %sink.path().display(),
            "Starting sampling run"
        );

        let start = Instant::now();
        let mut history: Vec<Sample> = Vec::with_capacity(ticks as usize);
        let mut buffer: Vec<Sample> = Vec::with_capacity(self.settings.flush_batch_size);
        let mut interrupted = false;

        for tick in 1..=ticks {
            let sample = self.collect_sample();
            println!("{}", sample.progress_line(tick));
            buffer.push(sample.clone());
            history.push(sample);

            let final_tick = tick == ticks;
            if final_tick || buffer.len() >= self.settings.flush_batch_size {
                sink.write_batch(&buffer).context("CSV sink failed mid-run")?;
                debug!(
                    rows = buffer.len(),
                    total = sink.rows_written(),
                    "Flushed sample batch"
                );
                buffer.clear();
            }

            if final_tick {
                break;
            }

            // Wake at start + tick*interval rather than interval from now,
            // so collection latency never accumulates across the run
            let target = start + mul_duration(self.settings.interval, tick);
            tokio::select! {
                _ = tokio::time::sleep_until(target) => {}
                result = shutdown.recv() => {
                    match result {
                        // A lagged receiver still means a stop was requested
                        Ok(()) | Err(RecvError::Lagged(_)) => {
                            info!(completed = tick, "Stop requested; ending run early");
                            interrupted = true;
                            break;
                        }
                        // Every coordinator is gone; nothing can stop the run,
                        // so just finish the scheduled sleep
                        Err(RecvError::Closed) => tokio::time::sleep_until(target).await,
                    }
                }
            }
        }

        if !buffer.is_empty() {
            sink.write_batch(&buffer)
                .context("final flush of buffered samples failed")?;
        }
        sink.flush().context("closing flush failed")?;

        if interrupted {
            warn!(
                collected = history.len(),
                expected = ticks,
                "Run interrupted before completion"
            );
        }

        Ok(RunSummary::from_samples(&history))
    }

    /// One tick's collection: three independent queries, each isolated so a
    /// failure yields a missing field and a warning, never an aborted tick.
    fn collect_sample(&mut self) -> Sample {
        let timestamp = Local::now();

        let cpu_frequency_mhz = match self.nominal_mhz {
            // Without a nominal base the dynamic query is meaningless; skip it
            None => None,
            Some(nominal) => match self.source.dynamic_frequency_mhz(nominal) {
                Ok(mhz) => Some(mhz),
                Err(e) => {
                    warn!(error = %e, "CPU frequency reading failed");
                    None
                }
            },
        };

        let cpu_usage_pct = match self.source.cpu_usage_pct() {
            Ok(pct) => Some(pct),
            Err(e) => {
                warn!(error = %e, "CPU usage reading failed");
                None
            }
        };

        let memory_usage_pct = match self.source.memory_usage_pct() {
            Ok(pct) => Some(pct),
            Err(e) => {
                warn!(error = %e, "Memory usage reading failed");
                None
            }
        };

        Sample {
            timestamp,
            cpu_frequency_mhz,
            cpu_usage_pct,
            memory_usage_pct,
        }
    }
}

fn mul_duration(interval: Duration, ticks: u64) -> Duration {
    Duration::from_secs_f64(interval.as_secs_f64() * ticks as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = SamplerSettings::default();
        assert_eq!(settings.ticks(), 120);
        assert_eq!(settings.flush_batch_size, 10);
    }

    #[test]
    fn test_tick_count_exact_division() {
        let settings = SamplerSettings {
            duration: Duration::from_secs(20),
            interval: Duration::from_secs(5),
            ..Default::default()
        };
        assert_eq!(settings.ticks(), 4);
    }

    #[test]
    fn test_tick_count_truncates() {
        let settings = SamplerSettings {
            duration: Duration::from_secs(19),
            interval: Duration::from_secs(5),
            ..Default::default()
        };
        assert_eq!(settings.ticks(), 3);
    }

    #[test]
    fn test_mul_duration() {
        assert_eq!(mul_duration(Duration::from_secs(5), 3), Duration::from_secs(15));
    }
}
