//! Pre-flight checks for peep
//!
//! Validates the target and the Go toolchain before any file is written or
//! any subprocess is started. Provides clear, actionable error messages when
//! requirements aren't met.

use anyhow::{bail, Context, Result};
use log::info;
use std::path::Path;

use crate::toolchain::Toolchain;

/// Check that the target is an existing Go file or package directory
pub fn check_target_exists(target: &Path) -> Result<()> {
    if !target.exists() {
        bail!(
            "Target not found: {}\n\n\
             Pass a Go source file (main.go) or a package directory.",
            target.display()
        );
    }
    if !target.is_file() && !target.is_dir() {
        bail!(
            "Not a file or directory: {}\n\n\
             The target must be a Go source file or a package directory.",
            target.display()
        );
    }
    Ok(())
}

/// Check that the Go toolchain can be executed
pub fn check_toolchain(toolchain: &Toolchain) -> Result<()> {
    let version = toolchain.version().with_context(|| {
        format!(
            "Go toolchain not usable: {}\n\n\
             Install Go from https://go.dev/dl/ or point --go at the binary.",
            toolchain.program().display()
        )
    })?;
    info!("Using {version}");
    Ok(())
}

/// Warn when a single-file target does not look like Go source
pub fn check_go_extension(target: &Path, quiet: bool) {
    if quiet || !target.is_file() {
        return;
    }
    if target.extension().and_then(|e| e.to_str()) != Some("go") {
        eprintln!("warning: {} does not have a .go extension", target.display());
    }
}
