//! Harvesting the rms/cost metric through the companion dump utility.
//!
//! After every run the dump utility reads the target's shared-memory
//! channel and prints `rms,cost` rows on stdout. Each snapshot is
//! captured into its own numbered log file so no two writers ever touch
//! the same file; a final merge pass produces the metric result table.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::error::HarnessError;
use crate::results::table::{METRIC_HEADER, ResultTable};

/// Shared-memory channel name written by instrumented targets.
pub const DEFAULT_SHMEM_NAME: &str = "newcomair_123456789";

/// File-name prefix of per-run metric logs.
const LOG_PREFIX: &str = "metric_log";

/// Collects one metric snapshot per run into numbered log files and
/// merges them into the final metric table.
///
/// The counter is owned here, not global; it is the merge order.
#[derive(Debug)]
pub struct MetricCollector {
    dumpmem: PathBuf,
    shmem_name: String,
    info_path: PathBuf,
    log_dir: PathBuf,
    counter: u64,
}

impl MetricCollector {
    /// Collector invoking `dumpmem` against `shmem_name`, writing
    /// numbered logs into `log_dir`.
    pub fn new(
        dumpmem: impl Into<PathBuf>,
        shmem_name: impl Into<String>,
        info_path: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            dumpmem: dumpmem.into(),
            shmem_name: shmem_name.into(),
            info_path: info_path.into(),
            log_dir: log_dir.into(),
            counter: 0,
        }
    }

    fn log_path(&self, index: u64) -> PathBuf {
        self.log_dir.join(format!("{LOG_PREFIX}_{index}"))
    }

    /// Snapshots collected so far.
    pub fn collected(&self) -> u64 {
        self.counter
    }

    /// Invoke the dump utility once, capturing its stdout into the next
    /// numbered log file. Call after every run of the target.
    pub fn collect_after_run(&mut self) -> Result<PathBuf, HarnessError> {
        let path = self.log_path(self.counter);
        let log = File::create(&path).map_err(|e| HarnessError::io(&path, e))?;

        debug!(
            "dumping metric snapshot {} -> {}",
            self.counter,
            path.display()
        );
        let status = Command::new(&self.dumpmem)
            .arg(&self.shmem_name)
            .arg(&self.info_path)
            .stdout(Stdio::from(log))
            .status()
            .map_err(|e| HarnessError::io(&self.dumpmem, e))?;
        if !status.success() {
            // A missed snapshot silently invalidates the metric table,
            // so a failing dump is fatal even in tolerant batches.
            return Err(HarnessError::Run {
                program: self.dumpmem.clone(),
                status: status.code().unwrap_or(-1),
                input: self.info_path.clone(),
            });
        }

        self.counter += 1;
        Ok(path)
    }

    /// Merge all numbered logs into `result_path`: exactly one
    /// synthetic `rms,cost` header followed by every parseable data row
    /// in increasing counter order. Header lines and garbage inside the
    /// logs are filtered out. Returns the number of merged rows.
    ///
    /// The logs are deleted afterwards; cleanup is best-effort and a
    /// failed delete is logged, not fatal.
    pub fn merge_all(&self, result_path: &Path) -> Result<usize, HarnessError> {
        let mut table = ResultTable::create(result_path, METRIC_HEADER)?;

        for index in 0..self.counter {
            let path = self.log_path(index);
            let text = fs::read_to_string(&path).map_err(|e| HarnessError::io(&path, e))?;
            for line in text.lines() {
                if parse_metric_line(line).is_some() {
                    table.push_metric_line(line)?;
                } else if !is_header_line(line) && !line.trim().is_empty() {
                    warn!("skipping malformed metric row {line:?} in {}", path.display());
                }
            }
        }

        for index in 0..self.counter {
            let path = self.log_path(index);
            if let Err(err) = fs::remove_file(&path) {
                warn!("failed to remove {}: {err}", path.display());
            }
        }

        Ok(table.len())
    }
}

/// Parse one `rms,cost` data row: exactly two comma-separated numbers.
fn parse_metric_line(line: &str) -> Option<(f64, f64)> {
    let mut fields = line.trim().split(',');
    let rms: f64 = fields.next()?.trim().parse().ok()?;
    let cost: f64 = fields.next()?.trim().parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((rms, cost))
}

/// Header lines the dump utility emits ahead of its data rows.
fn is_header_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("rms") || lower.contains("func_id")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_line_parsing() {
        assert_eq!(parse_metric_line("12,34"), Some((12.0, 34.0)));
        assert_eq!(parse_metric_line(" 1.5 , 2.25 "), Some((1.5, 2.25)));
        assert_eq!(parse_metric_line("rms,cost"), None);
        assert_eq!(parse_metric_line("func_id,rms,cost"), None);
        assert_eq!(parse_metric_line("1,2,3"), None);
        assert_eq!(parse_metric_line(""), None);
    }

    #[test]
    fn merge_keeps_one_header_and_log_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut collector = MetricCollector::new(
            "dumpmem",
            DEFAULT_SHMEM_NAME,
            dir.path().join("indvar.info"),
            dir.path(),
        );

        // Pretend three runs were dumped without spawning anything.
        for (index, body) in ["rms,cost\n10,1\n20,2\n", "rms,cost\n30,3\n", "40,4\n"]
            .iter()
            .enumerate()
        {
            fs::write(collector.log_path(index as u64), body).unwrap();
            collector.counter += 1;
        }

        let result = dir.path().join("mem.csv");
        let merged = collector.merge_all(&result).unwrap();
        assert_eq!(merged, 4);

        let text = fs::read_to_string(&result).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["rms,cost", "10,1", "20,2", "30,3", "40,4"]);

        // Logs are cleaned up after a successful merge.
        for index in 0..3 {
            assert!(!collector.log_path(index).exists());
        }
    }

    #[test]
    fn merge_skips_garbage_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut collector = MetricCollector::new(
            "dumpmem",
            DEFAULT_SHMEM_NAME,
            dir.path().join("indvar.info"),
            dir.path(),
        );
        fs::write(collector.log_path(0), "rms,cost\nnot,a,row\n5,6\n").unwrap();
        collector.counter = 1;

        let result = dir.path().join("mem.csv");
        let merged = collector.merge_all(&result).unwrap();
        assert_eq!(merged, 1);
        let text = fs::read_to_string(&result).unwrap();
        assert_eq!(text, "rms,cost\n5,6\n");
    }
}
