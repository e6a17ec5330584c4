//! Command-line interface for the benchmark harness.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;

use crate::config::{ExperimentConfig, Mode, Variant};
use crate::corpus::SizeRange;
use crate::metrics::DEFAULT_SHMEM_NAME;

/// Benchmark-driving harness for loop-sampling instrumentation targets.
///
/// Generates a synthetic input corpus, invokes the selected target
/// build under a controlled environment, measures wall-clock time,
/// harvests the rms/cost metric through the companion dump utility, and
/// persists CSV result tables for downstream curve fitting and
/// plotting.
#[derive(Parser, Debug)]
#[command(name = "loopbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Runtime-only mode: skip rms/cost collection.
    ///
    /// Wall-clock observations are recorded in every mode; this flag
    /// only skips the per-run dump and the merge pass.
    #[arg(long)]
    pub runtime: bool,

    /// Measure the uninstrumented baseline build (implies --runtime:
    /// a baseline target has no metric channel to dump).
    #[arg(long)]
    pub baseline: bool,

    /// Optimization level the target was built at (targets.O<N>).
    #[arg(short = 'O', long, default_value = "0", value_name = "N")]
    pub opt_level: u8,

    /// Skip the build step and run the existing target binary.
    #[arg(long)]
    pub only_run: bool,

    /// Else-if code-shape variant: alternate instrumentation pattern,
    /// doubled sampling rate, `-bElseIf` target suffix.
    #[arg(long)]
    pub else_if: bool,

    /// Input size progression, half-open.
    #[arg(long, default_value = "500:5500:500", value_name = "START:STOP:STEP")]
    pub sizes: String,

    /// Replace the progression with one fixed input size.
    #[arg(long, value_name = "BYTES")]
    pub fixed_size: Option<u64>,

    /// Runs per input in runtime mode. Metric mode always runs each
    /// input once, since every run's snapshot is dumped individually.
    #[arg(long, default_value = "10", value_name = "N")]
    pub iterations: usize,

    /// Discover input sizes from the existing inputs directory instead
    /// of generating the progression.
    #[arg(long)]
    pub from_inputs: bool,

    /// Directory containing inputs/, targets.O<N>/, results.O<N>/ and
    /// the build tree.
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub project_root: PathBuf,

    /// Record failing runs instead of aborting the batch.
    #[arg(long)]
    pub tolerant: bool,

    /// Inherit the target's stdout instead of discarding it.
    #[arg(long)]
    pub show_target_output: bool,

    /// Program invoked as the external build command.
    #[arg(long, default_value = "make", value_name = "PATH")]
    pub build_program: PathBuf,

    /// Companion dump utility executable.
    #[arg(long, default_value = "dumpmem", value_name = "PATH")]
    pub dumpmem: PathBuf,

    /// Shared-memory channel name passed to the dump utility.
    #[arg(long, default_value = DEFAULT_SHMEM_NAME, value_name = "NAME")]
    pub shmem_name: String,

    /// Export a JSON report in addition to the CSV tables.
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, conflicts_with = "color")]
    pub no_color: bool,

    /// Force colored output (even when not a TTY).
    #[arg(long, conflicts_with = "no_color")]
    pub color: bool,

    /// Verbose output.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// Validate the arguments and build the immutable experiment
    /// configuration.
    pub fn into_config(self) -> Result<ExperimentConfig> {
        if self.iterations == 0 {
            bail!("--iterations must be at least 1");
        }
        if !self.project_root.exists() {
            bail!(
                "project root does not exist: {}",
                self.project_root.display()
            );
        }

        let sizes: SizeRange = self.sizes.parse()?;

        let variant = if self.baseline {
            Variant::Baseline
        } else {
            Variant::Instrumented
        };
        let mode = if self.runtime || self.baseline {
            Mode::Runtime
        } else {
            Mode::Metric
        };

        // --color forces it on, --no-color forces it off.
        let color = self.color || (!self.no_color && supports_color());

        Ok(ExperimentConfig {
            variant,
            opt_level: self.opt_level,
            else_if: self.else_if,
            mode,
            project_root: self.project_root,
            sizes,
            fixed_size: self.fixed_size,
            iterations: self.iterations,
            from_inputs: self.from_inputs,
            skip_build: self.only_run,
            build_program: self.build_program,
            tolerant: self.tolerant,
            show_target_output: self.show_target_output,
            dumpmem: self.dumpmem,
            shmem_name: self.shmem_name,
            color,
            verbose: self.verbose,
        })
    }
}

/// Check if the terminal supports colors.
fn supports_color() -> bool {
    use std::io::IsTerminal;

    // https://no-color.org/
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    std::io::stdout().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("loopbench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_select_instrumented_metric_mode() {
        let config = parse(&[]).into_config().unwrap();
        assert_eq!(config.variant, Variant::Instrumented);
        assert_eq!(config.mode, Mode::Metric);
        assert_eq!(config.opt_level, 0);
        assert_eq!(config.iterations, 10);
        assert_eq!(config.sizes, SizeRange::new(500, 5500, 500).unwrap());
    }

    #[test]
    fn baseline_implies_runtime_mode() {
        let config = parse(&["--baseline"]).into_config().unwrap();
        assert_eq!(config.variant, Variant::Baseline);
        assert_eq!(config.mode, Mode::Runtime);
    }

    #[test]
    fn only_run_skips_the_build() {
        let config = parse(&["--only-run", "--runtime"]).into_config().unwrap();
        assert!(config.skip_build);
        assert_eq!(config.mode, Mode::Runtime);
    }

    #[test]
    fn malformed_size_spec_is_rejected() {
        let cli = parse(&["--sizes", "500-5500-500"]);
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn zero_iterations_are_rejected() {
        let cli = parse(&["--iterations", "0"]);
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn color_flags_conflict() {
        let result =
            Cli::try_parse_from(["loopbench", "--color", "--no-color"]);
        assert!(result.is_err());
    }
}
