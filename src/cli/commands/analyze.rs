//! CLI implementation for `--analyze`

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{print_analysis, print_conflicts, status};
use crate::core::analyze::analyze;
use crate::error::UnsymlinkError;
use crate::infra::ownership::VdbOwnership;
use crate::infra::state_store::StateStore;

/// Execute the analysis
///
/// The state is saved only when `persist` is set.
pub fn execute(
    root: &Path,
    prefix: Option<&str>,
    package_db: &Path,
    store: &StateStore,
    persist: bool,
) -> Result<()> {
    let ownership = VdbOwnership::new(package_db);

    let analysis = match analyze(root, prefix, &ownership) {
        Ok(analysis) => analysis,
        Err(UnsymlinkError::Conflict(conflict)) => {
            print_conflicts(&conflict);
            return Err(UnsymlinkError::Conflict(conflict).into());
        }
        Err(e) => return Err(e).context("Analysis failed"),
    };

    print_analysis(&analysis);

    if persist {
        store.save(&analysis.state)?;
        println!(
            "{} Migration plan saved to {}; continue with --migrate",
            status::SUCCESS,
            store.path().display()
        );
    } else {
        println!(
            "{} Migration plan not saved; run as root (or with --unprivileged) \
             without --pretend to save it",
            status::WARNING
        );
    }
    Ok(())
}
