//! Migration phase
//!
//! Stages `lib.new` for every prefix from `lib32` and the migrated part of
//! `lib64`, then redirects every `lib` symlink to it. No `lib` is redirected
//! until every prefix has been staged.

use std::path::{Path, PathBuf};

use crate::config::defaults::LIB_NEW_DIR;
use crate::core::layout::PrefixLayout;
use crate::core::state::MigrationState;
use crate::error::{FilesystemError, UnsymlinkError};
use crate::infra::executor::Executor;
use crate::infra::filesystem::{exists_no_follow, list_entries};
use crate::infra::state_store::StateStore;

/// Top-level entries of `lib32`
fn lib32_sources(layout: &PrefixLayout) -> Result<Vec<PathBuf>, UnsymlinkError> {
    if !layout.has_lib32() {
        return Ok(Vec::new());
    }
    Ok(list_entries(&layout.lib32)?
        .iter()
        .map(|name| layout.lib32.join(name))
        .collect())
}

/// The `lib64` includes still present on disk
fn lib64_sources(layout: &PrefixLayout, state: &MigrationState) -> Vec<PathBuf> {
    state
        .includes_for(&layout.prefix)
        .iter()
        .map(|name| layout.lib64.join(name))
        .filter(|source| {
            let present = exists_no_follow(source);
            if !present {
                tracing::warn!("{} disappeared since analysis; skipping", source.display());
            }
            present
        })
        .collect()
}

fn stage(
    layout: &PrefixLayout,
    state: &MigrationState,
    executor: &Executor,
) -> Result<(), UnsymlinkError> {
    executor.create_dir_like(&layout.lib_new, &layout.lib64)?;

    // Mixed directories exist on both sides and cp refuses two same-named
    // sources in one invocation. lib64 goes first and loses its excluded
    // paths before lib32 is merged in, so lib32 wins every shared path.
    let lib64 = lib64_sources(layout, state);
    let lib32 = lib32_sources(layout)?;
    tracing::info!(
        "Copying {} lib64 and {} lib32 entries into {}",
        lib64.len(),
        lib32.len(),
        layout.lib_new.display()
    );
    executor.copy_into(&lib64, &layout.lib_new)?;

    for excluded in state.excludes_for(&layout.prefix) {
        executor
            .remove_pruning_parents(&layout.lib_new, Path::new(excluded))
            .map_err(|e| FilesystemError::Remove {
                path: layout.lib_new.join(excluded),
                error: e.to_string(),
            })?;
    }

    executor.copy_into(&lib32, &layout.lib_new)?;
    Ok(())
}

/// Stage `lib.new` and cut over every prefix recorded for `root`
///
/// The state is kept: `finish` and `rollback` need it.
pub fn migrate(
    store: &StateStore,
    root: &Path,
    executor: &Executor,
) -> Result<(), UnsymlinkError> {
    let state = store.load_for(root)?;
    let layouts: Vec<PrefixLayout> = state
        .prefixes
        .iter()
        .map(|p| PrefixLayout::new(&state.root, p))
        .collect();

    for layout in &layouts {
        layout.check_initial()?;
    }

    for layout in &layouts {
        tracing::info!("Staging prefix {}", layout.prefix);
        stage(layout, &state, executor).map_err(|e| UnsymlinkError::CopyFailed {
            prefix: layout.prefix.to_string(),
            error: e.to_string(),
        })?;
    }

    for layout in &layouts {
        tracing::info!("Redirecting {} to {LIB_NEW_DIR}", layout.lib.display());
        executor
            .replace_symlink(&layout.lib, Path::new(LIB_NEW_DIR), &layout.lib_tmp)
            .map_err(|e| UnsymlinkError::CutOverFailed {
                prefix: layout.prefix.to_string(),
                error: e.to_string(),
            })?;
    }

    Ok(())
}
