//! Package overlays for multi-file programs
//!
//! A package directory is never modified. Instead its files are copied into
//! a fresh temporary directory with the entry file replaced by the
//! instrumented version, and the program is run from there. The directory
//! is removed when the [`PackageOverlay`] is dropped, on every exit path.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Deserialize;
use tempfile::TempDir;

use crate::domain::{PeepError, Result};
use crate::syntax::{print, SourceFile};
use crate::toolchain::Toolchain;

/// Module descriptor and its checksum lock file, copied when present.
pub const MANIFESTS: [&str; 2] = ["go.mod", "go.sum"];

/// The subset of `go list -json` output peep needs
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PackageInfo {
    pub name: String,
    pub dir: PathBuf,
    #[serde(default)]
    pub go_files: Vec<String>,
    #[serde(default)]
    pub cgo_files: Vec<String>,
}

impl PackageInfo {
    /// Absolute paths of every Go and cgo file in the package.
    pub fn source_files(&self) -> Vec<PathBuf> {
        self.go_files.iter().chain(&self.cgo_files).map(|name| self.dir.join(name)).collect()
    }
}

/// Describe the package in `dir` using `go list`.
///
/// # Errors
/// - `PackageDiscovery` if listing fails or its output cannot be decoded
/// - `NotMainPackage` if the package is a library
pub fn discover_package(toolchain: &Toolchain, dir: &Path) -> Result<PackageInfo> {
    let dir = fs::canonicalize(dir).map_err(|e| PeepError::io("resolve", dir, e))?;
    let output = toolchain.list_package(&dir)?;
    let info: PackageInfo = serde_json::from_slice(&output).map_err(|e| {
        PeepError::PackageDiscovery(format!("failed to parse go list output: {e}"))
    })?;
    if info.name != "main" {
        return Err(PeepError::NotMainPackage(info.name));
    }
    debug!(
        "Package {} in {}: {} files",
        info.name,
        info.dir.display(),
        info.go_files.len() + info.cgo_files.len()
    );
    Ok(info)
}

/// An isolated, disposable copy of a package
#[derive(Debug)]
pub struct PackageOverlay {
    dir: TempDir,
    files: Vec<PathBuf>,
    manifests: Vec<PathBuf>,
}

impl PackageOverlay {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Every `.go` file in the overlay, sorted by name.
    pub fn source_files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Manifests copied from the original package
    pub fn manifests(&self) -> &[PathBuf] {
        &self.manifests
    }
}

/// Build an overlay from the instrumented `tree` of `entry_path` and the
/// rest of the package's files.
///
/// Siblings are copied byte for byte; `entry_path` itself is skipped. When a
/// `go.mod` was copied, `go mod tidy` runs inside the overlay so the
/// dependencies of the injected code resolve.
///
/// # Errors
/// `Io` on any filesystem failure, `DependencyReconciliation` if tidying
/// fails. The partially built directory is removed in both cases.
pub fn build_overlay(
    tree: &SourceFile,
    entry_path: &Path,
    siblings: &[PathBuf],
    toolchain: &Toolchain,
) -> Result<PackageOverlay> {
    let dir = tempfile::Builder::new()
        .prefix("peep-pkg-")
        .tempdir()
        .map_err(|e| PeepError::io("create temp directory", std::env::temp_dir(), e))?;

    let entry_name = file_name(entry_path)?;
    let entry_dest = dir.path().join(entry_name);
    fs::write(&entry_dest, print(tree)).map_err(|e| PeepError::io("write", &entry_dest, e))?;

    for sibling in siblings.iter().filter(|s| s.as_path() != entry_path) {
        let dest = dir.path().join(file_name(sibling)?);
        fs::copy(sibling, &dest).map_err(|e| PeepError::io("copy", sibling, e))?;
    }

    let mut manifests = Vec::new();
    let root = entry_path.parent().unwrap_or_else(|| Path::new("."));
    for manifest in MANIFESTS {
        let src = root.join(manifest);
        if !src.is_file() {
            continue;
        }
        let dest = dir.path().join(manifest);
        fs::copy(&src, &dest).map_err(|e| PeepError::io("copy", &src, e))?;
        manifests.push(dest);
    }

    if manifests.iter().any(|m| m.ends_with(MANIFESTS[0])) {
        info!("Reconciling dependencies in {}", dir.path().display());
        toolchain.tidy(dir.path())?;
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir.path())
        .map_err(|e| PeepError::io("read", dir.path(), e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "go"))
        .collect();
    files.sort();

    debug!("Overlay {} holds {} Go files", dir.path().display(), files.len());
    Ok(PackageOverlay { dir, files, manifests })
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name().ok_or_else(|| {
        PeepError::io(
            "name",
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })
}
