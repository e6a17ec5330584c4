//! External build invocation for target binaries.
//!
//! The build system itself is opaque: the harness only triggers it and
//! checks the exit code. The command runs with an explicit working
//! directory, so the harness process never changes its own.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::config::ExperimentConfig;
use crate::error::HarnessError;

/// Subdirectory of the project root the build command runs in.
const BUILD_DIR: &str = "build";

/// Invoker for the external build of target binaries.
#[derive(Debug, Clone)]
pub struct BuildInvoker {
    program: PathBuf,
    build_dir: PathBuf,
}

impl BuildInvoker {
    /// Invoker using `make` inside `<project_root>/build`.
    pub fn new(project_root: &Path) -> Self {
        Self {
            program: PathBuf::from("make"),
            build_dir: project_root.join(BUILD_DIR),
        }
    }

    /// Override the build program (tests substitute a stub).
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Build and install the target binary for `config`.
    ///
    /// The build directory is created if absent (idempotent). The
    /// command is parameterized by the variant's makefile, the
    /// optimization level, and the shape flag, always as a structured
    /// argument list. Any non-zero exit aborts the experiment.
    pub fn build(&self, config: &ExperimentConfig) -> Result<(), HarnessError> {
        fs::create_dir_all(&self.build_dir).map_err(|e| HarnessError::io(&self.build_dir, e))?;

        let mut cmd = Command::new(&self.program);
        cmd.current_dir(&self.build_dir)
            .arg("-f")
            .arg(format!("Makefile.{}", config.variant.stem()))
            .arg(format!("OPT_LEVEL={}", config.opt_level));
        if config.else_if {
            cmd.arg("SHAPE=-bElseIf");
        }
        cmd.arg("install");

        debug!(
            "building {} in {}",
            config.target_file_name(),
            self.build_dir.display()
        );

        let status = cmd
            .status()
            .map_err(|e| HarnessError::io(&self.program, e))?;
        if !status.success() {
            return Err(HarnessError::Build {
                command: self.program.display().to_string(),
                code: status.code().unwrap_or(-1),
            });
        }

        info!("build finished: {}", config.target_file_name());
        Ok(())
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn write_stub(dir: &Path, name: &str, script: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn build_creates_directory_and_succeeds() {
        let root = tempfile::tempdir().unwrap();
        let stub = write_stub(root.path(), "fake-make", "#!/bin/sh\nexit 0\n");

        let config = ExperimentConfig {
            project_root: root.path().to_path_buf(),
            ..ExperimentConfig::default()
        };
        let invoker = BuildInvoker::new(root.path()).with_program(&stub);
        invoker.build(&config).unwrap();
        assert!(root.path().join(BUILD_DIR).is_dir());
    }

    #[test]
    fn nonzero_exit_is_a_build_failure() {
        let root = tempfile::tempdir().unwrap();
        let stub = write_stub(root.path(), "fake-make", "#!/bin/sh\nexit 2\n");

        let config = ExperimentConfig {
            project_root: root.path().to_path_buf(),
            ..ExperimentConfig::default()
        };
        let invoker = BuildInvoker::new(root.path()).with_program(&stub);
        let err = invoker.build(&config).unwrap_err();
        assert!(matches!(err, HarnessError::Build { code: 2, .. }));
    }
}
