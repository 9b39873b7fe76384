//! Instrumentation of the program's entry file
//!
//! - `hygiene`: collision-free names for injected variables
//! - `imports`: adds the packages the injected code refers to
//! - `inject`: builds the profiling prologue and prepends it to `main`

pub mod hygiene;
pub mod imports;
pub mod inject;

use std::path::Path;

use log::info;

use crate::analysis::has_entry_point;
use crate::domain::{InstrumentationPlan, PeepError, Result};
use crate::syntax::{parse_file, SourceFile};

pub use hygiene::NameGenerator;
pub use imports::ensure_import;
pub use inject::{cpu_profiling_stmts, inject, mem_profiling_stmts, metrics_stmts};

/// Parse `path`, add the imports `plan` needs and inject the prologue.
///
/// # Errors
/// - `Io` / `Parse` if the file cannot be read or is not valid Go
/// - `NoEntryPoint` if it has no `func main()`
pub fn process_file(
    path: &Path,
    plan: &InstrumentationPlan,
    names: &mut NameGenerator,
) -> Result<SourceFile> {
    let mut file = parse_file(path)?;
    if !has_entry_point(&file) {
        return Err(PeepError::NoEntryPoint(path.to_path_buf()));
    }

    for import in plan.required_imports() {
        ensure_import(&mut file, import);
    }
    inject(&mut file, plan, names)?;

    info!("Instrumented {} ({})", path.display(), plan.describe());
    Ok(file)
}
