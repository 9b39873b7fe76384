//! Domain model for peep
//!
//! This module contains core domain types and errors that provide:
//! - An immutable instrumentation plan built once per invocation
//! - The metrics snapshot format shared with the instrumented program
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{
    Artifact, ArtifactKind, DashboardSettings, HygienicNamePair, InstrumentationPlan,
    MetricsSnapshot, DEFAULT_DASHBOARD_PORT, GOPSUTIL_CPU, METRICS_FILE_NAME, SAMPLE_INTERVAL,
    STALE_AFTER,
};

pub use errors::PeepError;

pub type Result<T, E = PeepError> = std::result::Result<T, E>;
