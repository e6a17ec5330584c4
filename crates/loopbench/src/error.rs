//! Error taxonomy for the harness pipeline.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by the harness.
///
/// Every variant aborts the batch except [`HarnessError::Parse`], which
/// callers handle per item (skip with a warning). The variant names the
/// pipeline stage that failed, so the top-level diagnostic identifies
/// build vs. run vs. persistence without extra bookkeeping.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Malformed or contradictory experiment configuration. The batch
    /// never starts.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The external build command exited non-zero. Fatal before any
    /// run executes; no partial build is attempted.
    #[error("build command {command:?} failed with exit code {code}")]
    Build {
        /// Program that was invoked.
        command: String,
        /// Exit code (-1 when terminated by a signal).
        code: i32,
    },

    /// An invoked process exited non-zero in strict mode.
    #[error("{program} exited with status {status} (input: {input})")]
    Run {
        /// Path of the failing binary.
        program: PathBuf,
        /// Captured exit status (-1 when terminated by a signal).
        status: i32,
        /// Input file the run was given.
        input: PathBuf,
    },

    /// A file name or metric log line does not match the expected
    /// shape. Skipped per item, never fatal to the batch.
    #[error("cannot parse {what}: {value:?}")]
    Parse {
        /// What was being parsed (file name, size spec, metric row).
        what: &'static str,
        /// The offending text.
        value: String,
    },

    /// Filesystem read/write failure. Fatal: a missing result file
    /// silently invalidates the whole experiment.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path the operation touched.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Shorthand for a parse failure on `value`.
    pub fn parse(what: &'static str, value: impl Into<String>) -> Self {
        Self::Parse {
            what,
            value: value.into(),
        }
    }
}
