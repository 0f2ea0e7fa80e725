// Append-only CSV sink
// Rows are written whole or not at all; existing logs are never overwritten

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, TimeZone};
use csv::{ReaderBuilder, Writer};
use thiserror::Error;
use tracing::info;

use crate::metrics::{Sample, MISSING_TOKEN, TIMESTAMP_FORMAT};

/// Fixed column header of the log format.
pub const CSV_HEADER: [&str; 4] = ["Time", "CPUSpeed(MHz)", "CPUUsage(%)", "MemoryUsage(%)"];

/// Sink failures. These are fatal to persistence and surfaced distinctly
/// from per-field collection warnings.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to create output file under {dir}: {source}")]
    Create {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write row to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to flush {path}: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read log {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed row {row} in {path}: {reason}")]
    Malformed {
        path: PathBuf,
        row: usize,
        reason: String,
    },
}

/// Append-only CSV destination for one run.
///
/// Created once at startup with a collision-avoiding name, written under the
/// batch-flush policy, and flushed on every exit path. `csv::Writer` performs
/// one last best-effort flush on drop.
pub struct CsvSink {
    writer: Writer<File>,
    path: PathBuf,
    rows_written: usize,
}

impl CsvSink {
    /// Open `<prefix>.csv` under `dir`, falling back to `<prefix>_1.csv`,
    /// `<prefix>_2.csv`, ... until an unused name is found. The file is
    /// created with `create_new`, so a concurrent run can never truncate an
    /// existing log. The header row is written and flushed immediately.
    pub fn create(dir: impl AsRef<Path>, prefix: &str) -> Result<Self, SinkError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| SinkError::Create {
            dir: dir.to_path_buf(),
            source,
        })?;

        let (file, path) = Self::open_unused(dir, prefix).map_err(|source| SinkError::Create {
            dir: dir.to_path_buf(),
            source,
        })?;

        let mut sink = Self {
            writer: Writer::from_writer(file),
            path,
            rows_written: 0,
        };
        sink.writer
            .write_record(CSV_HEADER)
            .map_err(|source| SinkError::Write {
                path: sink.path.clone(),
                source,
            })?;
        sink.flush()?;

        info!(path = %sink.path.display(), "Opened CSV sink");
        Ok(sink)
    }

    fn open_unused(dir: &Path, prefix: &str) -> io::Result<(File, PathBuf)> {
        let mut suffix = 0usize;
        loop {
            let name = if suffix == 0 {
                format!("{prefix}.csv")
            } else {
                format!("{prefix}_{suffix}.csv")
            };
            let candidate = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(file) => return Ok((file, candidate)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(e),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows written so far (header excluded).
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Append a batch of samples in order and flush them to disk.
    pub fn write_batch(&mut self, samples: &[Sample]) -> Result<(), SinkError> {
        for sample in samples {
            self.writer
                .write_record(sample.csv_fields())
                .map_err(|source| SinkError::Write {
                    path: self.path.clone(),
                    source,
                })?;
            self.rows_written += 1;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush().map_err(|source| SinkError::Flush {
            path: self.path.clone(),
            source,
        })
    }
}

/// Read a previously written log back into samples; the `N/A` token parses
/// to a missing field. Used by the `summarize` command.
pub fn read_samples(path: impl AsRef<Path>) -> Result<Vec<Sample>, SinkError> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|source| SinkError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let mut samples = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // 1-based file row, counting the header
        let row = idx + 2;
        let record = record.map_err(|source| SinkError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if record.len() != CSV_HEADER.len() {
            return Err(SinkError::Malformed {
                path: path.to_path_buf(),
                row,
                reason: format!("expected {} fields, got {}", CSV_HEADER.len(), record.len()),
            });
        }

        let naive = NaiveDateTime::parse_from_str(&record[0], TIMESTAMP_FORMAT).map_err(|e| {
            SinkError::Malformed {
                path: path.to_path_buf(),
                row,
                reason: format!("bad timestamp {:?}: {e}", &record[0]),
            }
        })?;
        let timestamp = Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| SinkError::Malformed {
                path: path.to_path_buf(),
                row,
                reason: format!("timestamp {:?} not representable in the local timezone", &record[0]),
            })?;

        samples.push(Sample {
            timestamp,
            cpu_frequency_mhz: parse_field(&record[1], path, row)?,
            cpu_usage_pct: parse_field(&record[2], path, row)?,
            memory_usage_pct: parse_field(&record[3], path, row)?,
        });
    }

    Ok(samples)
}

fn parse_field(raw: &str, path: &Path, row: usize) -> Result<Option<f64>, SinkError> {
    if raw == MISSING_TOKEN {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some).map_err(|e| SinkError::Malformed {
        path: path.to_path_buf(),
        row,
        reason: format!("bad numeric field {raw:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use tempfile::TempDir;

    fn sample(freq: Option<f64>, cpu: Option<f64>, mem: Option<f64>) -> Sample {
        Sample {
            timestamp: Local::now(),
            cpu_frequency_mhz: freq,
            cpu_usage_pct: cpu,
            memory_usage_pct: mem,
        }
    }

    #[test]
    fn test_create_writes_header() {
        let temp = TempDir::new().unwrap();
        let sink = CsvSink::create(temp.path(), "log").unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(contents.trim_end(), "Time,CPUSpeed(MHz),CPUUsage(%),MemoryUsage(%)");
    }

    #[test]
    fn test_collision_avoiding_names() {
        let temp = TempDir::new().unwrap();
        let first = CsvSink::create(temp.path(), "log").unwrap();
        let second = CsvSink::create(temp.path(), "log").unwrap();
        let third = CsvSink::create(temp.path(), "log").unwrap();

        assert_eq!(first.path(), temp.path().join("log.csv"));
        assert_eq!(second.path(), temp.path().join("log_1.csv"));
        assert_eq!(third.path(), temp.path().join("log_2.csv"));
    }

    #[test]
    fn test_existing_file_is_never_truncated() {
        let temp = TempDir::new().unwrap();
        let existing = temp.path().join("log.csv");
        std::fs::write(&existing, "keep me\n").unwrap();

        let sink = CsvSink::create(temp.path(), "log").unwrap();

        assert_eq!(sink.path(), temp.path().join("log_1.csv"));
        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "keep me\n");
    }

    #[test]
    fn test_write_batch_and_read_back() {
        let temp = TempDir::new().unwrap();
        let mut sink = CsvSink::create(temp.path(), "log").unwrap();

        let rows = vec![
            sample(Some(2400.0), Some(12.35), Some(50.0)),
            sample(None, None, Some(51.25)),
        ];
        sink.write_batch(&rows).unwrap();
        assert_eq!(sink.rows_written(), 2);

        let read = read_samples(sink.path()).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].cpu_frequency_mhz, Some(2400.0));
        assert_eq!(read[0].cpu_usage_pct, Some(12.35));
        assert_eq!(read[1].cpu_frequency_mhz, None);
        assert_eq!(read[1].cpu_usage_pct, None);
        assert_eq!(read[1].memory_usage_pct, Some(51.25));
    }

    #[test]
    fn test_read_back_rejects_malformed_rows() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.csv");
        std::fs::write(
            &path,
            "Time,CPUSpeed(MHz),CPUUsage(%),MemoryUsage(%)\n2024-01-01 00:00:00,oops,1.0,2.0\n",
        )
        .unwrap();

        let err = read_samples(&path).unwrap_err();
        assert!(matches!(err, SinkError::Malformed { row: 2, .. }));
    }
}
