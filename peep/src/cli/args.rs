//! CLI argument definitions

use clap::Parser;
use std::path::{Path, PathBuf};

use crate::domain::{DashboardSettings, InstrumentationPlan, DEFAULT_DASHBOARD_PORT, METRICS_FILE_NAME};
use crate::toolchain::DEFAULT_GO;

pub const DEFAULT_CPU_OUT: &str = "cpu.prof";
pub const DEFAULT_MEM_OUT: &str = "mem.prof";

#[derive(Parser, Debug)]
#[command(
    name = "peep",
    version,
    about = "Profile a Go program without editing it",
    after_help = "\
EXAMPLES:
    peep main.go                             CPU and memory profiles
    peep --cpu --cpu-out run.prof main.go    CPU profile only
    peep --dash ./cmd/server                 Package with live dashboard on :6060"
)]
pub struct Args {
    /// Go source file with func main(), or a main package directory
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Enable CPU profiling (alone: CPU only)
    #[arg(long)]
    pub cpu: bool,

    /// Enable memory profiling (alone: memory only)
    #[arg(long)]
    pub mem: bool,

    /// Output file for the CPU profile
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CPU_OUT)]
    pub cpu_out: PathBuf,

    /// Output file for the memory profile
    #[arg(long, value_name = "FILE", default_value = DEFAULT_MEM_OUT)]
    pub mem_out: PathBuf,

    /// Serve a live metrics dashboard while the program runs
    #[arg(long)]
    pub dash: bool,

    /// Port for the dashboard
    #[arg(long, default_value_t = DEFAULT_DASHBOARD_PORT, requires = "dash")]
    pub port: u16,

    /// Directory with the dashboard's static assets
    #[arg(long, value_name = "DIR", default_value = "static", requires = "dash")]
    pub static_dir: PathBuf,

    /// Go toolchain binary
    #[arg(long, value_name = "BIN", default_value = DEFAULT_GO)]
    pub go: PathBuf,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Build the plan, resolving every path against `cwd`.
    ///
    /// Neither `--cpu` nor `--mem` means both.
    pub fn plan(&self, cwd: &Path) -> InstrumentationPlan {
        let both = !self.cpu && !self.mem;
        InstrumentationPlan {
            cpu_profile: (self.cpu || both).then(|| absolute(cwd, &self.cpu_out)),
            mem_profile: (self.mem || both).then(|| absolute(cwd, &self.mem_out)),
            dashboard: self.dash.then(|| DashboardSettings {
                port: self.port,
                metrics_path: cwd.join(METRICS_FILE_NAME),
                static_dir: absolute(cwd, &self.static_dir),
            }),
        }
    }
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
