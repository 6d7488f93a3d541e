//! CLI command implementations
//!
//! Each action is implemented in its own submodule.

pub mod analyze;
pub mod finish;
pub mod migrate;
pub mod rollback;

use crate::core::cleanup::CleanupReport;
use crate::error::UnsymlinkError;

use super::output::print_failures;

/// Turn a report with failures into an error advising how to continue
fn ensure_complete(
    report: &CleanupReport,
    phase: &'static str,
    hint: &'static str,
) -> Result<(), UnsymlinkError> {
    if report.is_complete() {
        return Ok(());
    }
    print_failures(report);
    Err(UnsymlinkError::Incomplete {
        phase,
        failures: report.failures.len(),
        hint,
    })
}
