//! Experiment configuration and path/environment resolution.

use std::path::PathBuf;

use crate::corpus::SizeRange;
use crate::error::HarnessError;

/// Environment variable read by instrumented targets to pick their
/// sampling rate.
pub const SAMPLE_RATE_VAR: &str = "SAMPLE_RATE";

/// Fixed trailing token: appended to every generated input file and
/// passed as the last argument of every target invocation.
pub const MARKER_TOKEN: &str = "song";

/// Which build of the target is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    /// Uninstrumented build; the sampling pass is not applied.
    Baseline,
    /// Build instrumented by the loop-sampling pass.
    #[default]
    Instrumented,
}

impl Variant {
    /// File-name stem used for target binaries and result files.
    pub fn stem(&self) -> &'static str {
        match self {
            Self::Baseline => "nopass",
            Self::Instrumented => "clonesample",
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Instrumented => "instrumented",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" | "nopass" => Ok(Self::Baseline),
            "instrumented" | "clonesample" => Ok(Self::Instrumented),
            _ => Err(format!(
                "Unknown variant: {s}. Valid options: baseline, instrumented"
            )),
        }
    }
}

/// What a batch collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Wall-clock timing only; the dump/merge pipeline is skipped.
    Runtime,
    /// Wall-clock timing plus the rms/cost metric (one dump per run).
    #[default]
    Metric,
}

impl Mode {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::Metric => "metric",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Immutable description of one experiment, built once from the CLI.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    /// Target build under measurement.
    pub variant: Variant,
    /// Optimization level the target was built at (`.O<N>` partitions).
    pub opt_level: u8,
    /// Else-if code-shape variant: alternate instrumentation pattern
    /// and doubled sampling rate.
    pub else_if: bool,
    /// What the batch collects.
    pub mode: Mode,
    /// Directory containing `inputs/`, `targets.O<N>/`, `results.O<N>/`
    /// and the build tree.
    pub project_root: PathBuf,
    /// Input size progression.
    pub sizes: SizeRange,
    /// When set, replaces the progression with one fixed input size.
    pub fixed_size: Option<u64>,
    /// Runs per input in runtime mode. Metric mode always performs one
    /// run per input: each run's shared-memory snapshot is dumped and
    /// consumed individually.
    pub iterations: usize,
    /// Discover sizes from the existing inputs directory instead of
    /// generating the progression.
    pub from_inputs: bool,
    /// Skip the external build step.
    pub skip_build: bool,
    /// Program invoked as the external build command.
    pub build_program: PathBuf,
    /// Record failing runs instead of aborting the batch.
    pub tolerant: bool,
    /// Inherit the target's stdout instead of discarding it.
    pub show_target_output: bool,
    /// Companion dump utility executable.
    pub dumpmem: PathBuf,
    /// Shared-memory channel name passed to the dump utility.
    pub shmem_name: String,
    /// Colored terminal summary.
    pub color: bool,
    /// Verbose harness output.
    pub verbose: bool,
}

impl ExperimentConfig {
    /// File name of the target binary for this configuration:
    /// `target.<stem>` plus `-bElseIf` when the shape flag is set.
    pub fn target_file_name(&self) -> String {
        let shape = if self.else_if { "-bElseIf" } else { "" };
        format!("target.{}{}", self.variant.stem(), shape)
    }

    /// Directory holding target binaries for this optimization level.
    pub fn targets_dir(&self) -> PathBuf {
        self.project_root.join(format!("targets.O{}", self.opt_level))
    }

    /// Directory holding result tables for this optimization level.
    pub fn results_dir(&self) -> PathBuf {
        self.project_root.join(format!("results.O{}", self.opt_level))
    }

    /// Directory holding the generated input corpus.
    pub fn inputs_dir(&self) -> PathBuf {
        self.project_root.join("inputs")
    }

    /// Derive the concrete paths and child environment for this
    /// configuration.
    ///
    /// Pure: equal configurations resolve to equal results. The only
    /// failure is a contradictory configuration, reported before any
    /// run starts.
    pub fn resolve(&self) -> Result<ResolvedExperiment, HarnessError> {
        if self.variant == Variant::Baseline && self.mode == Mode::Metric {
            return Err(HarnessError::Config(
                "metric collection requires the instrumented variant; \
                 the baseline target has no shared-memory channel to dump"
                    .into(),
            ));
        }
        if self.variant == Variant::Baseline && self.else_if {
            return Err(HarnessError::Config(
                "the else-if shape flag only applies to instrumented builds".into(),
            ));
        }

        let file = self.target_file_name();
        let results = self.results_dir();

        // SAMPLE_RATE is set only for instrumented targets; the else-if
        // shape doubles the rate.
        let env = match self.variant {
            Variant::Baseline => Vec::new(),
            Variant::Instrumented => {
                let rate = if self.else_if { "200" } else { "100" };
                vec![(SAMPLE_RATE_VAR.to_string(), rate.to_string())]
            }
        };

        Ok(ResolvedExperiment {
            target_path: self.targets_dir().join(&file),
            runtime_result_path: results.join(format!("{file}.runtime.csv")),
            metric_result_path: results.join(format!("{file}.mem.csv")),
            env,
        })
    }
}

/// Everything derived from an [`ExperimentConfig`]: concrete paths and
/// the child-process environment overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExperiment {
    /// Target binary to invoke.
    pub target_path: PathBuf,
    /// Destination of the `inputs,time` table.
    pub runtime_result_path: PathBuf,
    /// Destination of the `rms,cost` table.
    pub metric_result_path: PathBuf,
    /// Variables overridden in the child environment; everything else
    /// is inherited from the harness process unchanged.
    pub env: Vec<(String, String)>,
}

impl ResolvedExperiment {
    /// Look up an override by name (test/debug helper).
    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Default configuration used as the base the CLI fills in.
impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Instrumented,
            opt_level: 0,
            else_if: false,
            mode: Mode::Metric,
            project_root: PathBuf::from("."),
            sizes: SizeRange::default(),
            fixed_size: None,
            iterations: 10,
            from_inputs: false,
            skip_build: false,
            build_program: PathBuf::from("make"),
            tolerant: false,
            show_target_output: false,
            dumpmem: PathBuf::from("dumpmem"),
            shmem_name: crate::metrics::DEFAULT_SHMEM_NAME.to_string(),
            color: true,
            verbose: false,
        }
    }
}

/// Path the dump utility's info argument points at, by convention next
/// to the result tables.
pub fn indvar_info_path(config: &ExperimentConfig) -> PathBuf {
    config.results_dir().join("indvar.info")
}
