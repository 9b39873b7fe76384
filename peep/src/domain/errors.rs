//! Structured error types for peep
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Every variant is fatal to the run; the dashboard's metrics handler is the
//! only place that degrades instead of erroring.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PeepError {
    #[error("failed to parse {}:{line}:{column}: {message}", path.display())]
    Parse { path: PathBuf, line: usize, column: usize, message: String },

    #[error("no main function found in {}", .0.display())]
    NoEntryPoint(PathBuf),

    #[error("no func main() found in any of the package files")]
    NoEntryFile,

    #[error("multiple files define func main(): {}", display_paths(.0))]
    AmbiguousEntry(Vec<PathBuf>),

    #[error("directory is not a main package (found package {0})")]
    NotMainPackage(String),

    #[error("go list failed: {0}\nHint: run from module root or specify a correct path")]
    PackageDiscovery(String),

    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to tidy dependencies in {}: {reason}", dir.display())]
    DependencyReconciliation { dir: PathBuf, reason: String },

    #[error("execution of `{command}` failed: {reason}")]
    Execution { command: String, reason: String },

    #[error("failed to draw entropy for generated identifiers: {0}")]
    Entropy(#[from] getrandom::Error),

    #[error("failed to bind dashboard on {addr}: {source}")]
    DashboardBind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

impl PeepError {
    /// Wrap an I/O failure with the action and path it concerned.
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PeepError::Io { action, path: path.into(), source }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    format!("[{}]", names.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = PeepError::Parse {
            path: PathBuf::from("main.go"),
            line: 4,
            column: 10,
            message: "expected ';', found syntax".to_string(),
        };
        assert_eq!(err.to_string(), "failed to parse main.go:4:10: expected ';', found syntax");
    }

    #[test]
    fn test_ambiguous_entry_names_every_file() {
        let err = PeepError::AmbiguousEntry(vec![
            PathBuf::from("/pkg/a.go"),
            PathBuf::from("/pkg/b.go"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("/pkg/a.go"));
        assert!(msg.contains("/pkg/b.go"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = PeepError::io(
            "read",
            "/missing.go",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().starts_with("failed to read /missing.go"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
