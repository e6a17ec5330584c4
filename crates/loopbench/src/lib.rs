//! Benchmark-driving harness for loop-sampling instrumentation targets.
//!
//! The harness measures compiled targets as opaque black boxes: it
//! synthesizes input files of controlled size, invokes the target build
//! selected by the experiment configuration (variant, optimization
//! level, sampling rate), records wall-clock time per run, harvests the
//! rms/cost metric through the companion dump utility, and aggregates
//! everything into CSV result tables. Curve fitting and plotting are
//! downstream consumers of those tables, not part of this crate.
//!
//! Execution is strictly sequential: the instrumented target's metric
//! channel is a single shared-memory segment that cannot tolerate
//! overlapping writers.
//!
//! Pipeline: [`config`] resolves the experiment, [`builder`] triggers
//! the external build, [`corpus`] prepares inputs, [`runner`] executes
//! and times the target, [`metrics`] dumps and merges the rms/cost
//! snapshots, and [`results`] persists the tables. [`experiment`] wires
//! the stages together.

pub mod builder;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod experiment;
pub mod metrics;
pub mod results;
pub mod runner;

pub use config::{ExperimentConfig, Mode, ResolvedExperiment, Variant};
pub use error::HarnessError;
pub use experiment::{Experiment, ExperimentOutcome};
pub use runner::{ExperimentRunner, FailureMode, RunObservation, StdoutMode};
