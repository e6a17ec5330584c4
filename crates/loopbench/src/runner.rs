//! Sequential target execution and wall-clock measurement.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{MARKER_TOKEN, ResolvedExperiment};
use crate::error::HarnessError;

/// Where the target's standard output goes during a run.
///
/// The metric channel is the dump utility, never the target's stdout,
/// so discarding is the default; inheriting is a debugging aid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdoutMode {
    /// Redirect to a discard sink.
    #[default]
    Discard,
    /// Inherit the harness's stdout.
    Inherit,
}

/// How a batch reacts to a target exiting non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Abort the batch (default).
    #[default]
    Strict,
    /// Record the observation with its failing status and continue.
    Tolerant,
}

/// One completed target invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunObservation {
    /// Size of the input the target was given.
    pub input_size: u64,
    /// Wall-clock duration of the invocation, in seconds.
    pub wall_seconds: f64,
    /// Captured exit status (-1 when terminated by a signal).
    pub exit_status: i32,
}

/// Batch context for sequential target invocations.
///
/// Owns everything a batch mutates; nothing is process-global. Runs are
/// strictly sequential: the target's metric channel is a single shared
/// external resource that cannot tolerate overlapping writers. There is
/// no timeout; a hung target hangs the harness.
#[derive(Debug)]
pub struct ExperimentRunner {
    target: PathBuf,
    env: Vec<(String, String)>,
    stdout_mode: StdoutMode,
    failure_mode: FailureMode,
}

impl ExperimentRunner {
    /// Runner for the resolved experiment's target and environment.
    pub fn new(resolved: &ResolvedExperiment) -> Self {
        Self {
            target: resolved.target_path.clone(),
            env: resolved.env.clone(),
            stdout_mode: StdoutMode::default(),
            failure_mode: FailureMode::default(),
        }
    }

    /// Set where the target's stdout goes.
    pub fn stdout_mode(mut self, mode: StdoutMode) -> Self {
        self.stdout_mode = mode;
        self
    }

    /// Set how failing runs are handled.
    pub fn failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Execute the target once against `input`.
    ///
    /// The child argv is `[target, input, marker]`: discrete tokens,
    /// never a shell string. Timestamps bracket the child as tightly as
    /// possible; the difference is reported as seconds with well beyond
    /// millisecond precision.
    pub fn run_once(
        &self,
        input: &Path,
        input_size: u64,
    ) -> Result<RunObservation, HarnessError> {
        let mut cmd = Command::new(&self.target);
        cmd.arg(input).arg(MARKER_TOKEN);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        match self.stdout_mode {
            StdoutMode::Discard => cmd.stdout(Stdio::null()),
            StdoutMode::Inherit => cmd.stdout(Stdio::inherit()),
        };

        let started = Instant::now();
        let status = cmd
            .status()
            .map_err(|e| HarnessError::io(&self.target, e))?;
        let wall_seconds = started.elapsed().as_secs_f64();

        let exit_status = status.code().unwrap_or(-1);
        let observation = RunObservation {
            input_size,
            wall_seconds,
            exit_status,
        };

        if exit_status != 0 {
            match self.failure_mode {
                FailureMode::Strict => {
                    return Err(HarnessError::Run {
                        program: self.target.clone(),
                        status: exit_status,
                        input: input.to_path_buf(),
                    });
                }
                FailureMode::Tolerant => {
                    warn!(
                        "{} exited with status {exit_status} on {} (recorded, continuing)",
                        self.target.display(),
                        input.display()
                    );
                }
            }
        }

        Ok(observation)
    }

    /// Execute `count` sequential runs against the same input,
    /// preserving execution order in the returned sequence.
    ///
    /// Failed runs are never re-attempted: re-running a possibly
    /// corrupting target could compound state in the shared metric
    /// channel.
    pub fn run_batch(
        &self,
        input: &Path,
        input_size: u64,
        count: usize,
    ) -> Result<Vec<RunObservation>, HarnessError> {
        let mut observations = Vec::with_capacity(count);
        for run in 1..=count {
            debug!(
                "run {run}/{count}: {} {}",
                self.target.display(),
                input.display()
            );
            observations.push(self.run_once(input, input_size)?);
        }
        Ok(observations)
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn stub_target(dir: &Path, script: &str) -> ResolvedExperiment {
        let target = dir.join("target.stub");
        fs::write(&target, script).unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o755)).unwrap();
        ResolvedExperiment {
            target_path: target,
            runtime_result_path: dir.join("runtime.csv"),
            metric_result_path: dir.join("mem.csv"),
            env: vec![("SAMPLE_RATE".into(), "100".into())],
        }
    }

    #[test]
    fn run_once_reports_duration_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = stub_target(dir.path(), "#!/bin/sh\nexit 0\n");
        let input = dir.path().join("input_case_10.txt");
        fs::write(&input, "aaaaaaaaaasong").unwrap();

        let runner = ExperimentRunner::new(&resolved);
        let obs = runner.run_once(&input, 10).unwrap();
        assert_eq!(obs.input_size, 10);
        assert_eq!(obs.exit_status, 0);
        assert!(obs.wall_seconds >= 0.0);
    }

    #[test]
    fn environment_override_reaches_the_child() {
        let dir = tempfile::tempdir().unwrap();
        // Exits 0 only when SAMPLE_RATE is the configured override.
        let resolved = stub_target(
            dir.path(),
            "#!/bin/sh\n[ \"$SAMPLE_RATE\" = \"100\" ] || exit 9\nexit 0\n",
        );
        let input = dir.path().join("input_case_1.txt");
        fs::write(&input, "asong").unwrap();

        let runner = ExperimentRunner::new(&resolved);
        assert_eq!(runner.run_once(&input, 1).unwrap().exit_status, 0);
    }

    #[test]
    fn strict_mode_aborts_on_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = stub_target(dir.path(), "#!/bin/sh\nexit 3\n");
        let input = dir.path().join("input_case_1.txt");
        fs::write(&input, "asong").unwrap();

        let runner = ExperimentRunner::new(&resolved);
        let err = runner.run_once(&input, 1).unwrap_err();
        assert!(matches!(err, HarnessError::Run { status: 3, .. }));
    }

    #[test]
    fn tolerant_mode_records_the_failing_status() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = stub_target(dir.path(), "#!/bin/sh\nexit 3\n");
        let input = dir.path().join("input_case_1.txt");
        fs::write(&input, "asong").unwrap();

        let runner = ExperimentRunner::new(&resolved).failure_mode(FailureMode::Tolerant);
        let obs = runner.run_once(&input, 1).unwrap();
        assert_eq!(obs.exit_status, 3);
    }

    #[test]
    fn run_batch_returns_count_observations_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = stub_target(dir.path(), "#!/bin/sh\nexit 0\n");
        let input = dir.path().join("input_case_5.txt");
        fs::write(&input, "aaaaasong").unwrap();

        let runner = ExperimentRunner::new(&resolved);
        let observations = runner.run_batch(&input, 5, 4).unwrap();
        assert_eq!(observations.len(), 4);
        assert!(observations.iter().all(|o| o.input_size == 5));
    }
}
