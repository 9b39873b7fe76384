//! # peep - Profile Go programs without editing them
//!
//! peep parses a Go program, injects `runtime/pprof` scaffolding into
//! `func main()`, runs the instrumented copy with `go run` and reports the
//! profiles it wrote. With `--dash` the injected code also streams runtime
//! metrics to a file that a local web dashboard polls.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Syntax     │──▶│  Analysis    │──▶│  Instrument  │──▶│   Overlay    │
//! │ (lex/parse)  │   │ (find main)  │   │ (imports +   │   │ (packages    │
//! └──────────────┘   └──────────────┘   │  prologue)   │   │  only)       │
//!                                       └──────────────┘   └──────┬───────┘
//!                                                                 ▼
//! ┌──────────────┐  peep_metrics.json  ┌────────────────────────────────────┐
//! │  Dashboard   │◀────────────────────│ Executor: go run (inherited stdio) │
//! │  (axum)      │                     └────────────────────────────────────┘
//! └──────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`syntax`]: Go lexer, declaration-level parser, syntax tree, visitor
//!   and a printer that reproduces untouched code byte for byte
//! - [`analysis`]: entry point detection across one file or a package
//! - [`instrument`]: hygienic names, import resolution, prologue injection
//! - [`overlay`]: `go list` discovery and the temporary package copy
//! - [`executor`]: scratch files and the `go run` subprocess
//! - [`dashboard`]: `/metrics` endpoint with a staleness policy, static assets
//! - [`toolchain`]: every invocation of the Go binary
//! - [`preflight`]: target and toolchain checks with actionable messages
//! - [`driver`]: sequencing of one run
//! - [`cli`]: command-line arguments
//! - [`domain`]: the instrumentation plan, snapshot format and errors
//!
//! ## Typical Usage
//!
//! ```bash
//! # CPU and memory profiles for a single file
//! peep main.go
//!
//! # CPU profile of a multi-file package, with the live dashboard
//! peep --cpu --dash ./cmd/server
//! ```

pub mod analysis;
pub mod cli;
pub mod dashboard;
pub mod domain;
pub mod driver;
pub mod executor;
pub mod instrument;
pub mod overlay;
pub mod preflight;
pub mod syntax;
pub mod toolchain;
