//! Run orchestration
//!
//! Single file: instrument → check toolchain → dashboard → run.
//! Package directory: check toolchain → discover → find entry file →
//! instrument → overlay → dashboard → run.
//!
//! Scratch space lives in a [`PreparedRun`] and is removed when it drops,
//! including on error paths and after an interrupt.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::analysis::find_entry_file;
use crate::cli::Args;
use crate::dashboard::{DashboardServer, SHUTDOWN_TIMEOUT, STARTUP_GRACE};
use crate::domain::InstrumentationPlan;
use crate::executor::{ExecutionReport, PreparedRun};
use crate::instrument::{process_file, NameGenerator};
use crate::overlay::{build_overlay, discover_package};
use crate::preflight::{check_go_extension, check_target_exists, check_toolchain};
use crate::toolchain::Toolchain;

/// Everything one invocation needs, fixed before any work starts
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target: PathBuf,
    pub plan: InstrumentationPlan,
    pub toolchain: Toolchain,
    pub quiet: bool,
}

impl RunConfig {
    pub fn from_args(args: &Args, cwd: &Path) -> Self {
        Self {
            target: args.target.clone(),
            plan: args.plan(cwd),
            toolchain: Toolchain::new(&args.go),
            quiet: args.quiet,
        }
    }
}

/// Instrument the target, run it and report the artifacts.
pub async fn run(config: RunConfig) -> Result<()> {
    let RunConfig { target, plan, toolchain, quiet } = config;

    // Listen for Ctrl+C from the start so an interrupt during the run
    // unwinds through the scratch cleanup instead of killing the process.
    let interrupt = tokio::spawn(tokio::signal::ctrl_c());

    check_target_exists(&target)?;
    check_go_extension(&target, quiet);
    if !quiet {
        println!("peep v{}", env!("CARGO_PKG_VERSION"));
        println!("target: {}", target.display());
    }

    let prepared = prepare(&target, &plan, &toolchain)?;
    if !quiet {
        println!("mode: instrumented {} with {}", prepared.kind(), plan.describe());
    }

    let dashboard = match &plan.dashboard {
        Some(settings) => {
            let server = DashboardServer::start(settings).await?;
            tokio::time::sleep(STARTUP_GRACE).await;
            if !quiet {
                println!("dashboard: http://localhost:{}", server.local_addr().port());
            }
            Some(server)
        }
        None => None,
    };

    let outcome = tokio::task::spawn_blocking(move || {
        let report = prepared.run(&toolchain, &plan);
        drop(prepared);
        report
    })
    .await
    .context("Execution task panicked")?;

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            if let Some(server) = dashboard {
                server.shutdown(SHUTDOWN_TIMEOUT).await;
            }
            return Err(e.into());
        }
    };
    print_summary(&report, quiet);

    if let Some(server) = dashboard {
        if !quiet {
            println!("dashboard: program finished, still serving (Ctrl+C to stop)");
        }
        match interrupt.await {
            Ok(Ok(())) => info!("Interrupted, stopping dashboard"),
            Ok(Err(e)) => warn!("Failed to listen for Ctrl+C: {e}"),
            Err(e) => warn!("Signal task failed: {e}"),
        }
        server.shutdown(SHUTDOWN_TIMEOUT).await;
    } else {
        interrupt.abort();
    }

    Ok(())
}

/// Produce the instrumented sources on disk for either kind of target.
fn prepare(target: &Path, plan: &InstrumentationPlan, toolchain: &Toolchain) -> Result<PreparedRun> {
    let mut names = NameGenerator::new();

    if target.is_dir() {
        check_toolchain(toolchain)?;
        let package = discover_package(toolchain, target)?;
        let files = package.source_files();
        let entry = find_entry_file(&files)?;
        info!("Entry file: {}", entry.display());
        let tree = process_file(&entry, plan, &mut names)?;
        let overlay = build_overlay(&tree, &entry, &files, toolchain)?;
        return Ok(PreparedRun::package(overlay));
    }

    let tree = process_file(target, plan, &mut names)?;
    check_toolchain(toolchain)?;
    Ok(PreparedRun::single(&tree)?)
}

fn print_summary(report: &ExecutionReport, quiet: bool) {
    let lines = report.summary();
    if quiet {
        return;
    }
    for line in lines {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PeepError;
    use clap::Parser;

    #[test]
    fn test_config_from_args() {
        let args = Args::parse_from(["peep", "--go", "/opt/go/bin/go", "-q", "main.go"]);
        let config = RunConfig::from_args(&args, Path::new("/work"));
        assert_eq!(config.toolchain.program(), Path::new("/opt/go/bin/go"));
        assert!(config.quiet);
        assert_eq!(config.plan.cpu_profile, Some(PathBuf::from("/work/cpu.prof")));
    }

    #[test]
    fn test_prepare_without_main_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.go");
        std::fs::write(&path, "package main\n\nfunc helper() {}\n").unwrap();

        let err = prepare(&path, &InstrumentationPlan::default(), &Toolchain::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<PeepError>(), Some(PeepError::NoEntryPoint(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
