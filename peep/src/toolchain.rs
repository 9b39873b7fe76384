//! The Go toolchain as an external collaborator
//!
//! Every subprocess peep starts goes through [`Toolchain`]: `go version`
//! for preflight, `go list` for package discovery, `go mod tidy` for
//! overlays and `go run` for the instrumented program itself.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use log::debug;

use crate::domain::{PeepError, Result};

pub const DEFAULT_GO: &str = "go";

#[derive(Debug, Clone)]
pub struct Toolchain {
    program: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new(DEFAULT_GO)
    }
}

impl Toolchain {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command<I, S>(&self, args: I, dir: Option<&Path>) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.program.display(), args.join(" "))
    }

    /// Capture the output of a short-lived command, failing only on spawn.
    fn capture(&self, args: &[&str], dir: Option<&Path>) -> Result<Output> {
        debug!("Running {}", self.describe(args));
        self.command(args, dir).stdin(Stdio::null()).output().map_err(|e| PeepError::Execution {
            command: self.describe(args),
            reason: e.to_string(),
        })
    }

    /// `go version`, trimmed.
    ///
    /// # Errors
    /// `Execution` if the binary is missing or exits non-zero.
    pub fn version(&self) -> Result<String> {
        let args = ["version"];
        let output = self.capture(&args, None)?;
        if !output.status.success() {
            return Err(PeepError::Execution {
                command: self.describe(&args),
                reason: stderr_or_status(&output),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Raw `go list -json .` output for the package in `dir`.
    ///
    /// # Errors
    /// `PackageDiscovery` carrying the tool's stderr on a failed listing.
    pub fn list_package(&self, dir: &Path) -> Result<Vec<u8>> {
        let output = self.capture(&["list", "-json", "."], Some(dir))?;
        if !output.status.success() {
            return Err(PeepError::PackageDiscovery(stderr_or_status(&output)));
        }
        Ok(output.stdout)
    }

    /// `go mod tidy` inside `dir`.
    ///
    /// # Errors
    /// `DependencyReconciliation` if it cannot run or fails.
    pub fn tidy(&self, dir: &Path) -> Result<()> {
        let output = self.capture(&["mod", "tidy"], Some(dir)).map_err(|e| {
            PeepError::DependencyReconciliation { dir: dir.to_path_buf(), reason: e.to_string() }
        })?;
        if !output.status.success() {
            return Err(PeepError::DependencyReconciliation {
                dir: dir.to_path_buf(),
                reason: stderr_or_status(&output),
            });
        }
        Ok(())
    }

    /// `go run <files>` with the caller's stdin, stdout, stderr and
    /// environment; blocks until the program exits.
    ///
    /// # Errors
    /// `Execution` if the process cannot start or exits non-zero.
    pub fn run(&self, files: &[PathBuf], dir: Option<&Path>) -> Result<()> {
        let mut args: Vec<&OsStr> = vec![OsStr::new("run")];
        args.extend(files.iter().map(|f| f.as_os_str()));
        let command = format!(
            "{} run {}",
            self.program.display(),
            files.iter().map(|f| f.display().to_string()).collect::<Vec<_>>().join(" ")
        );
        debug!("Running {command}");

        let status = self
            .command(args, dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| PeepError::Execution { command: command.clone(), reason: e.to_string() })?;

        if status.success() {
            Ok(())
        } else {
            Err(PeepError::Execution { command, reason: status.to_string() })
        }
    }
}

fn stderr_or_status(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        output.status.to_string()
    } else {
        stderr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_execution_error() {
        let go = Toolchain::new("/nonexistent/bin/go");
        match go.version() {
            Err(PeepError::Execution { command, .. }) => {
                assert_eq!(command, "/nonexistent/bin/go version");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_tidy_failure_is_reconciliation_error() {
        let dir = tempfile::tempdir().unwrap();
        let go = Toolchain::new("/nonexistent/bin/go");
        assert!(matches!(go.tidy(dir.path()), Err(PeepError::DependencyReconciliation { .. })));
    }

    #[test]
    fn test_run_reports_command_line() {
        let go = Toolchain::new("/nonexistent/bin/go");
        let err = go.run(&[PathBuf::from("/tmp/main_prof.go")], None).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/bin/go run /tmp/main_prof.go"));
    }
}
