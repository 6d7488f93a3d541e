//! Finishing phase
//!
//! Turns `lib.new` into the real `lib`, replaces `lib32` with a symlink to it
//! and removes the migrated content from `lib64`. Each step recognizes when a
//! previous interrupted run already did it, so the phase can be resumed.

use std::path::Path;

use crate::config::defaults::LIB_DIR;
use crate::core::cleanup::{remove_except, CleanupReport};
use crate::core::layout::PrefixLayout;
use crate::core::state::MigrationState;
use crate::error::{LayoutError, UnsymlinkError};
use crate::infra::executor::Executor;
use crate::infra::filesystem::{exists_no_follow, is_mount_point, is_real_dir, is_symlink};
use crate::infra::state_store::StateStore;

/// Replace the `lib` symlink with `lib.new`
fn promote_lib_new(layout: &PrefixLayout, executor: &Executor) -> Result<(), UnsymlinkError> {
    let lib_new_present = is_real_dir(&layout.lib_new);

    if is_symlink(&layout.lib) && lib_new_present {
        executor.unlink(&layout.lib)?;
        executor.rename(&layout.lib_new, &layout.lib)?;
    } else if !exists_no_follow(&layout.lib) && lib_new_present {
        tracing::info!(
            "{} was already unlinked; renaming {}",
            layout.lib.display(),
            layout.lib_new.display()
        );
        executor.rename(&layout.lib_new, &layout.lib)?;
    } else if is_real_dir(&layout.lib) && !exists_no_follow(&layout.lib_new) {
        tracing::info!("{} is already a directory; skipping", layout.lib.display());
    } else {
        return Err(LayoutError::Inconsistent {
            path: layout.lib.clone(),
            detail: "expected lib to be a symlink to lib.new or the finished directory".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Replace `lib32` with a symlink to `lib`
fn link_lib32(
    layout: &PrefixLayout,
    state: &MigrationState,
    executor: &Executor,
) -> Result<(), UnsymlinkError> {
    if is_symlink(&layout.lib32) {
        tracing::info!("{} is already a symlink; skipping", layout.lib32.display());
        return Ok(());
    }

    if is_real_dir(&layout.lib32) {
        if let Err(e) = executor.remove_tree(&layout.lib32) {
            if is_mount_point(&layout.lib32) {
                return Err(UnsymlinkError::MountPoint {
                    path: layout.lib32.clone(),
                });
            }
            return Err(e.into());
        }
    } else if exists_no_follow(&layout.lib32) || !state.has_secondary_arch {
        return Ok(());
    }

    executor.symlink(Path::new(LIB_DIR), &layout.lib32)?;
    Ok(())
}

/// Finish the migration of every prefix recorded for `root`
///
/// Without `resume`, every prefix must be cut over to `lib.new`. The
/// returned report lists `lib64` entries that could not be removed; the
/// state is cleared only when it is empty.
pub fn finish(
    store: &StateStore,
    root: &Path,
    executor: &Executor,
    resume: bool,
) -> Result<CleanupReport, UnsymlinkError> {
    let state = store.load_for(root)?;
    let layouts: Vec<PrefixLayout> = state
        .prefixes
        .iter()
        .map(|p| PrefixLayout::new(&state.root, p))
        .collect();

    if !resume {
        for layout in &layouts {
            layout.check_cut_over()?;
        }
    }

    let mut report = CleanupReport::default();
    for layout in &layouts {
        tracing::info!("Finishing prefix {}", layout.prefix);
        promote_lib_new(layout, executor)?;
        link_lib32(layout, &state, executor)?;

        let excludes = state.excludes_for(&layout.prefix);
        for entry in state.includes_for(&layout.prefix) {
            remove_except(executor, &layout.lib64, entry, excludes, &mut report);
        }
    }

    if report.is_complete() && !executor.is_pretend() {
        store.clear()?;
    }
    Ok(report)
}
