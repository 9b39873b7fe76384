//! Running the instrumented program
//!
//! A [`PreparedRun`] owns the scratch space the program runs from: a
//! temporary directory holding `main_prof.go` for a single file, or the
//! package overlay. The space is removed when the run is dropped.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use tempfile::TempDir;

use crate::domain::{Artifact, InstrumentationPlan, PeepError, Result};
use crate::overlay::PackageOverlay;
use crate::syntax::{print, SourceFile};
use crate::toolchain::Toolchain;

/// Name of the serialized single-file program inside its scratch directory.
pub const SCRATCH_FILE_NAME: &str = "main_prof.go";

#[derive(Debug)]
enum Scratch {
    File(TempDir),
    Overlay(PackageOverlay),
}

/// Instrumented sources on disk, ready for `go run`.
#[derive(Debug)]
pub struct PreparedRun {
    files: Vec<PathBuf>,
    scratch: Scratch,
}

impl PreparedRun {
    /// Serialize a single instrumented file into a private scratch directory.
    ///
    /// # Errors
    /// `Io` if the directory or file cannot be created.
    pub fn single(tree: &SourceFile) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("peep-")
            .tempdir()
            .map_err(|e| PeepError::io("create temp directory", std::env::temp_dir(), e))?;
        let file = dir.path().join(SCRATCH_FILE_NAME);
        fs::write(&file, print(tree)).map_err(|e| PeepError::io("write", &file, e))?;
        Ok(Self { files: vec![file], scratch: Scratch::File(dir) })
    }

    pub fn package(overlay: PackageOverlay) -> Self {
        Self { files: overlay.source_files().to_vec(), scratch: Scratch::Overlay(overlay) }
    }

    /// "program" for a single file, "package" for an overlay
    pub fn kind(&self) -> &'static str {
        match self.scratch {
            Scratch::File(_) => "program",
            Scratch::Overlay(_) => "package",
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Directory the program is run from, if not the caller's.
    fn working_dir(&self) -> Option<&Path> {
        match &self.scratch {
            Scratch::File(_) => None,
            Scratch::Overlay(overlay) => Some(overlay.path()),
        }
    }

    /// Run the program to completion with inherited standard streams.
    ///
    /// # Errors
    /// `Execution` if it cannot start or exits non-zero. There is no retry.
    pub fn run(&self, toolchain: &Toolchain, plan: &InstrumentationPlan) -> Result<ExecutionReport> {
        info!("Running instrumented {} ({} files)", self.kind(), self.files.len());
        toolchain.run(&self.files, self.working_dir())?;
        Ok(ExecutionReport::collect(plan))
    }
}

/// Which of the planned artifacts a finished run left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub produced: Vec<Artifact>,
    pub missing: Vec<Artifact>,
}

impl ExecutionReport {
    pub fn collect(plan: &InstrumentationPlan) -> Self {
        let (produced, missing) = plan.artifacts().into_iter().partition(Artifact::exists);
        Self { produced, missing }
    }

    /// One `saved:` line per produced artifact.
    pub fn summary(&self) -> Vec<String> {
        for artifact in &self.missing {
            warn!("{} was not written to {}", artifact.kind, artifact.path.display());
        }
        self.produced
            .iter()
            .map(|a| format!("saved: {} ({})", a.path.display(), a.kind))
            .collect()
    }
}
