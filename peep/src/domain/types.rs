//! Core domain types
//!
//! The plan is built once from CLI arguments and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File the instrumented program overwrites with its latest [`MetricsSnapshot`].
pub const METRICS_FILE_NAME: &str = "peep_metrics.json";

/// Interval between samples taken by the injected metrics loop.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Snapshots older than this are treated as absent by the dashboard.
pub const STALE_AFTER: Duration = Duration::from_millis(2000);

pub const DEFAULT_DASHBOARD_PORT: u16 = 6060;

/// Live dashboard configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSettings {
    pub port: u16,
    /// Absolute path shared by the injected writer and the server's reader
    pub metrics_path: PathBuf,
    pub static_dir: PathBuf,
}

/// Which profiling facilities to enable and where their artifacts go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentationPlan {
    pub cpu_profile: Option<PathBuf>,
    pub mem_profile: Option<PathBuf>,
    pub dashboard: Option<DashboardSettings>,
}

impl InstrumentationPlan {
    pub fn cpu_enabled(&self) -> bool {
        self.cpu_profile.is_some()
    }

    pub fn mem_enabled(&self) -> bool {
        self.mem_profile.is_some()
    }

    pub fn dashboard_enabled(&self) -> bool {
        self.dashboard.is_some()
    }

    /// True when nothing would be injected.
    pub fn is_noop(&self) -> bool {
        !self.cpu_enabled() && !self.mem_enabled() && !self.dashboard_enabled()
    }

    /// Go import paths the injected statements reference, in insertion order.
    pub fn required_imports(&self) -> Vec<&'static str> {
        let mut imports = Vec::new();
        if self.cpu_enabled() || self.mem_enabled() {
            imports.extend(["os", "log", "runtime/pprof"]);
        }
        if self.dashboard_enabled() {
            for path in ["os", "runtime", "time", "encoding/json", GOPSUTIL_CPU] {
                if !imports.contains(&path) {
                    imports.push(path);
                }
            }
        }
        imports
    }

    /// Artifacts a successful run leaves behind.
    pub fn artifacts(&self) -> Vec<Artifact> {
        let mut artifacts = Vec::new();
        if let Some(path) = &self.cpu_profile {
            artifacts.push(Artifact { kind: ArtifactKind::CpuProfile, path: path.clone() });
        }
        if let Some(path) = &self.mem_profile {
            artifacts.push(Artifact { kind: ArtifactKind::MemProfile, path: path.clone() });
        }
        artifacts
    }

    /// Human-readable description of the enabled profilers.
    pub fn describe(&self) -> &'static str {
        match (self.cpu_enabled(), self.mem_enabled()) {
            (true, true) => "CPU and memory profiling",
            (false, true) => "memory profiling",
            (true, false) => "CPU profiling",
            (false, false) => "no profiling",
        }
    }
}

/// CPU sampling package used by the injected metrics loop.
pub const GOPSUTIL_CPU: &str = "github.com/shirou/gopsutil/v3/cpu";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    CpuProfile,
    MemProfile,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::CpuProfile => write!(f, "CPU profile"),
            ArtifactKind::MemProfile => write!(f, "memory profile"),
        }
    }
}

/// A profiling output file named by the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

impl Artifact {
    pub fn exists(&self) -> bool {
        Path::new(&self.path).is_file()
    }
}

/// Two generated identifiers sharing one random suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HygienicNamePair {
    /// Holds the opened resource (`f_<hex>`)
    pub handle: String,
    /// Holds the failure value of opening it (`err_<hex>`)
    pub error: String,
}

/// Point-in-time runtime statistics written by the instrumented program.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub alloc: u64,
    pub total_alloc: u64,
    pub sys: u64,
    #[serde(rename = "numGC")]
    pub num_gc: u32,
    pub pause_total: u64,
    pub cpu_percent: f64,
    pub timestamp_ms: i64,
}
