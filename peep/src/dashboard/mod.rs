//! Live metrics dashboard
//!
//! - `metrics`: the staleness policy applied to each snapshot read
//! - `server`: the axum server exposing `/metrics` and the static assets

pub mod metrics;
pub mod server;

pub use metrics::{evaluate_snapshot, now_ms, SnapshotStatus, EMPTY_METRICS};
pub use server::{build_router, DashboardServer, DashboardState};

use std::time::Duration;

/// Pause between starting the server and launching the program.
pub const STARTUP_GRACE: Duration = Duration::from_secs(1);

/// Upper bound on a graceful shutdown.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
