//! Statement synthesis and injection
//!
//! Builds the profiling prologue for `main` and prepends it to the existing
//! body. The prologue, per enabled facility:
//!
//! ```go
//! f_1a2b, err_1a2b := os.Create("/abs/cpu.prof")
//! if err_1a2b != nil {
//!     log.Fatal(err_1a2b)
//! }
//! pprof.StartCPUProfile(f_1a2b)
//! defer pprof.StopCPUProfile()
//! ```
//!
//! the heap profile is written by a deferred closure, and the dashboard
//! feed is a detached goroutine that overwrites the metrics file every
//! [`SAMPLE_INTERVAL`].

use std::path::Path;

use log::{debug, warn};

use crate::analysis::find_entry_point;
use crate::domain::{HygienicNamePair, InstrumentationPlan, Result, SAMPLE_INTERVAL};
use crate::syntax::{AssignOp, BinOp, Expr, SourceFile, Stmt};

use super::hygiene::NameGenerator;

/// `handle, error := os.Create(path)` followed by the fatal check.
fn create_or_fatal(path: &Path, names: &HygienicNamePair) -> [Stmt; 2] {
    [
        Stmt::Assign {
            lhs: vec![Expr::ident(&names.handle), Expr::ident(&names.error)],
            op: AssignOp::Define,
            rhs: vec![Expr::path("os", "Create").call(vec![Expr::str(path.to_string_lossy())])],
        },
        Stmt::If {
            cond: Expr::ident(&names.error).binary(BinOp::Neq, Expr::ident("nil")),
            then: vec![Stmt::Expr(
                Expr::path("log", "Fatal").call(vec![Expr::ident(&names.error)]),
            )],
        },
    ]
}

pub fn cpu_profiling_stmts(path: &Path, names: &HygienicNamePair) -> Vec<Stmt> {
    let mut stmts = Vec::from(create_or_fatal(path, names));
    stmts.push(Stmt::Expr(
        Expr::path("pprof", "StartCPUProfile").call(vec![Expr::ident(&names.handle)]),
    ));
    stmts.push(Stmt::Defer(Expr::path("pprof", "StopCPUProfile").call(vec![])));
    stmts
}

pub fn mem_profiling_stmts(path: &Path, names: &HygienicNamePair) -> Vec<Stmt> {
    let mut stmts = Vec::from(create_or_fatal(path, names));
    let handle = Expr::ident(&names.handle);
    stmts.push(Stmt::Defer(
        Expr::FuncLit(vec![
            Stmt::Expr(Expr::path("pprof", "WriteHeapProfile").call(vec![handle.clone()])),
            Stmt::Expr(handle.dot("Close").call(vec![])),
        ])
        .call(vec![]),
    ));
    stmts
}

/// Declare the metrics path in `path_var`, remove the file when `main`
/// returns, and start the sampling goroutine.
pub fn metrics_stmts(metrics_path: &Path, path_var: &str) -> Vec<Stmt> {
    let interval_ms = i64::try_from(SAMPLE_INTERVAL.as_millis()).unwrap_or(500);
    let m = || Expr::ident("m");
    let snapshot = Expr::MapLit {
        key: Box::new(Expr::ident("string")),
        value: Box::new(Expr::EmptyInterface),
        entries: vec![
            (Expr::str("alloc"), m().dot("Alloc")),
            (Expr::str("totalAlloc"), m().dot("TotalAlloc")),
            (Expr::str("sys"), m().dot("Sys")),
            (Expr::str("numGC"), m().dot("NumGC")),
            (Expr::str("pauseTotal"), m().dot("PauseTotalNs")),
            (Expr::str("cpuPercent"), Expr::ident("cpuVal")),
            (
                Expr::str("timestampMs"),
                Expr::path("time", "Now").call(vec![]).dot("UnixMilli").call(vec![]),
            ),
        ],
    };

    let sample = vec![
        Stmt::Var { name: "m".to_string(), ty: Expr::path("runtime", "MemStats") },
        Stmt::Expr(Expr::path("runtime", "ReadMemStats").call(vec![Expr::AddrOf(Box::new(m()))])),
        Stmt::Assign {
            lhs: vec![Expr::ident("cpuPct"), Expr::ident("_")],
            op: AssignOp::Define,
            rhs: vec![Expr::path("cpu", "Percent").call(vec![Expr::int(0), Expr::ident("false")])],
        },
        Stmt::Var { name: "cpuVal".to_string(), ty: Expr::ident("float64") },
        Stmt::If {
            cond: Expr::ident("len")
                .call(vec![Expr::ident("cpuPct")])
                .binary(BinOp::Gt, Expr::int(0)),
            then: vec![Stmt::Assign {
                lhs: vec![Expr::ident("cpuVal")],
                op: AssignOp::Assign,
                rhs: vec![Expr::ident("cpuPct").index(Expr::int(0))],
            }],
        },
        Stmt::Assign {
            lhs: vec![Expr::ident("metrics")],
            op: AssignOp::Define,
            rhs: vec![snapshot],
        },
        Stmt::Assign {
            lhs: vec![Expr::ident("data"), Expr::ident("_")],
            op: AssignOp::Define,
            rhs: vec![Expr::path("json", "Marshal").call(vec![Expr::ident("metrics")])],
        },
        Stmt::Expr(Expr::path("os", "WriteFile").call(vec![
            Expr::ident(path_var),
            Expr::ident("data"),
            Expr::int("0644"),
        ])),
    ];

    let sampler = vec![
        Stmt::Assign {
            lhs: vec![Expr::ident("ticker")],
            op: AssignOp::Define,
            rhs: vec![Expr::path("time", "NewTicker")
                .call(vec![Expr::int(interval_ms).binary(BinOp::Mul, Expr::path("time", "Millisecond"))])],
        },
        Stmt::Defer(Expr::ident("ticker").dot("Stop").call(vec![])),
        Stmt::Range {
            key: Some(Expr::ident("_")),
            iter: Expr::ident("ticker").dot("C"),
            body: sample,
        },
    ];

    vec![
        Stmt::Assign {
            lhs: vec![Expr::ident(path_var)],
            op: AssignOp::Define,
            rhs: vec![Expr::str(metrics_path.to_string_lossy())],
        },
        Stmt::Defer(Expr::path("os", "Remove").call(vec![Expr::ident(path_var)])),
        Stmt::Go(Expr::FuncLit(sampler).call(vec![])),
    ]
}

/// Assemble the prologue for every facility `plan` enables.
///
/// # Errors
/// `Entropy` if identifiers cannot be generated.
pub fn plan_stmts(plan: &InstrumentationPlan, names: &mut NameGenerator) -> Result<Vec<Stmt>> {
    let mut stmts = Vec::new();
    if let Some(path) = &plan.cpu_profile {
        stmts.extend(cpu_profiling_stmts(path, &names.generate_pair()?));
    }
    if let Some(path) = &plan.mem_profile {
        stmts.extend(mem_profiling_stmts(path, &names.generate_pair()?));
    }
    if let Some(dashboard) = &plan.dashboard {
        let pair = names.generate_pair()?;
        stmts.extend(metrics_stmts(&dashboard.metrics_path, &pair.handle));
    }
    Ok(stmts)
}

/// Prepend the prologue for `plan` to the body of `main`.
///
/// Returns `false` without touching the tree when there is no entry point,
/// when the plan enables nothing, or when `main` was already instrumented.
///
/// # Errors
/// `Entropy` if identifiers cannot be generated.
pub fn inject(file: &mut SourceFile, plan: &InstrumentationPlan, names: &mut NameGenerator) -> Result<bool> {
    let Some(entry) = find_entry_point(file) else {
        warn!("No entry point in {}, nothing injected", file.path.display());
        return Ok(false);
    };
    if plan.is_noop() {
        return Ok(false);
    }
    let path = file.path.clone();
    let Some(body) = entry.get_mut(file).and_then(|func| func.body.as_mut()) else {
        warn!("main in {} has no body, nothing injected", path.display());
        return Ok(false);
    };
    if body.is_rewritten() {
        warn!("main in {} is already instrumented", path.display());
        return Ok(false);
    }

    let prologue = plan_stmts(plan, names)?;
    debug!("Injecting {} statements into main of {}", prologue.len(), path.display());
    body.stmts.splice(0..0, prologue);
    Ok(true)
}
