//! End-to-end experiment orchestration.
//!
//! The control-flow spine: resolve, build (optional), prepare the
//! corpus, run the sequential batches, merge the metric logs, persist
//! the tables. Everything here is glue around the components; the
//! interesting contracts live in the modules this one calls.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::builder::BuildInvoker;
use crate::config::{self, ExperimentConfig, Mode, ResolvedExperiment};
use crate::corpus;
use crate::error::HarnessError;
use crate::metrics::MetricCollector;
use crate::results::table::{RUNTIME_HEADER, ResultTable};
use crate::runner::{ExperimentRunner, FailureMode, RunObservation, StdoutMode};

/// One experiment, from configuration to persisted tables.
pub struct Experiment {
    config: ExperimentConfig,
    resolved: ResolvedExperiment,
}

/// What an experiment leaves behind, handed to the caller for summary
/// printing and report export.
#[derive(Debug)]
pub struct ExperimentOutcome {
    /// Per-input batches in execution order: `(input_size, runs)`.
    pub batches: Vec<(u64, Vec<RunObservation>)>,
    /// Persisted `inputs,time` table.
    pub runtime_table: PathBuf,
    /// Persisted `rms,cost` table (metric mode only).
    pub metric_table: Option<PathBuf>,
    /// Rows merged into the metric table.
    pub metric_rows: usize,
}

impl Experiment {
    /// Resolve `config` into a runnable experiment. Contradictory
    /// configurations fail here, before anything touches the disk.
    pub fn new(config: ExperimentConfig) -> Result<Self, HarnessError> {
        let resolved = config.resolve()?;
        Ok(Self { config, resolved })
    }

    /// The resolved paths and child environment.
    pub fn resolved(&self) -> &ResolvedExperiment {
        &self.resolved
    }

    /// Run the whole pipeline.
    pub fn run(&self) -> Result<ExperimentOutcome, HarnessError> {
        let cfg = &self.config;

        if cfg.skip_build {
            info!("skipping build step (--only-run)");
        } else {
            BuildInvoker::new(&cfg.project_root)
                .with_program(&cfg.build_program)
                .build(cfg)?;
        }

        if !self.resolved.target_path.is_file() {
            return Err(HarnessError::Config(format!(
                "target binary not found: {}",
                self.resolved.target_path.display()
            )));
        }

        let inputs_dir = cfg.inputs_dir();
        let results_dir = cfg.results_dir();
        fs::create_dir_all(&inputs_dir).map_err(|e| HarnessError::io(&inputs_dir, e))?;
        fs::create_dir_all(&results_dir).map_err(|e| HarnessError::io(&results_dir, e))?;

        let inputs: Vec<(u64, PathBuf)> = if cfg.from_inputs {
            corpus::discover(&inputs_dir)?
        } else if let Some(size) = cfg.fixed_size {
            vec![(size, corpus::generate(&inputs_dir, size)?)]
        } else {
            corpus::generate_range(&inputs_dir, cfg.sizes)?
        };
        if inputs.is_empty() {
            return Err(HarnessError::Config(format!(
                "no inputs to run (directory: {})",
                inputs_dir.display()
            )));
        }
        info!("corpus ready: {} input(s)", inputs.len());

        let runner = ExperimentRunner::new(&self.resolved)
            .stdout_mode(if cfg.show_target_output {
                StdoutMode::Inherit
            } else {
                StdoutMode::Discard
            })
            .failure_mode(if cfg.tolerant {
                FailureMode::Tolerant
            } else {
                FailureMode::Strict
            });

        let mut collector = match cfg.mode {
            Mode::Metric => Some(MetricCollector::new(
                &cfg.dumpmem,
                cfg.shmem_name.clone(),
                config::indvar_info_path(cfg),
                &results_dir,
            )),
            Mode::Runtime => None,
        };

        let mut runtime_table =
            ResultTable::create(&self.resolved.runtime_result_path, RUNTIME_HEADER)?;
        let mut batches = Vec::with_capacity(inputs.len());

        for (size, input) in &inputs {
            let observations = match collector.as_mut() {
                // Runtime mode: one batch of `iterations` runs per input.
                None => {
                    info!("batch: input size {size}, {} run(s)", cfg.iterations);
                    let observations = runner.run_batch(input, *size, cfg.iterations)?;
                    for obs in &observations {
                        runtime_table.push_run(obs.input_size, obs.wall_seconds)?;
                    }
                    observations
                }
                // Metric mode: one run per input, each followed by its
                // dump; the snapshot belongs to exactly that run.
                Some(collector) => {
                    info!("batch: input size {size}, 1 run + metric dump");
                    let obs = runner.run_once(input, *size)?;
                    runtime_table.push_run(obs.input_size, obs.wall_seconds)?;
                    collector.collect_after_run()?;
                    vec![obs]
                }
            };
            batches.push((*size, observations));
        }

        let (metric_table, metric_rows) = match collector {
            Some(collector) => {
                let rows = collector.merge_all(&self.resolved.metric_result_path)?;
                info!(
                    "merged {rows} metric row(s) from {} snapshot(s)",
                    collector.collected()
                );
                (Some(self.resolved.metric_result_path.clone()), rows)
            }
            None => (None, 0),
        };

        Ok(ExperimentOutcome {
            batches,
            runtime_table: self.resolved.runtime_result_path.clone(),
            metric_table,
            metric_rows,
        })
    }
}
