//! Rollback phase
//!
//! Points `lib` back at `lib64` and removes `lib.new`. Available until the
//! migration is finished.

use std::path::Path;

use crate::config::defaults::LIB64_DIR;
use crate::core::cleanup::CleanupReport;
use crate::core::layout::PrefixLayout;
use crate::error::{LayoutError, UnsymlinkError};
use crate::infra::executor::Executor;
use crate::infra::filesystem::exists_no_follow;
use crate::infra::state_store::StateStore;

/// Roll back every prefix recorded for `root`
///
/// Without `force`, every prefix must be cut over to `lib.new`. With it, any
/// partial state left by a failed `migrate` is accepted, and prefixes that
/// were already rolled back are left alone. Failures are collected per
/// prefix. The state is cleared only after a complete, non-forced rollback.
pub fn rollback(
    store: &StateStore,
    root: &Path,
    executor: &Executor,
    force: bool,
) -> Result<CleanupReport, UnsymlinkError> {
    let state = store.load_for(root)?;
    let layouts: Vec<PrefixLayout> = state
        .prefixes
        .iter()
        .map(|p| PrefixLayout::new(&state.root, p))
        .collect();

    for layout in &layouts {
        if force {
            if layout.is_finished() {
                return Err(LayoutError::AlreadyFinished {
                    path: layout.lib.clone(),
                }
                .into());
            }
        } else {
            layout.check_cut_over()?;
        }
    }

    let mut report = CleanupReport::default();
    for layout in &layouts {
        tracing::info!("Rolling back prefix {}", layout.prefix);

        if layout.lib_points_to_lib64() {
            tracing::info!("{} already points to {LIB64_DIR}", layout.lib.display());
        } else if let Err(e) =
            executor.replace_symlink(&layout.lib, Path::new(LIB64_DIR), &layout.lib_tmp)
        {
            // lib.new stays while lib may still point at it
            report.record(&layout.lib, e);
            continue;
        }

        if exists_no_follow(&layout.lib_new) {
            if let Err(e) = executor.remove_tree(&layout.lib_new) {
                report.record(&layout.lib_new, e);
            }
        }
    }

    if report.is_complete() && !force && !executor.is_pretend() {
        store.clear()?;
    }
    Ok(report)
}
