//! CLI implementation for `--rollback` and `--force-rollback`

use std::path::Path;

use anyhow::Result;

use super::ensure_complete;
use crate::cli::output::status;
use crate::core::rollback::rollback;
use crate::infra::executor::Executor;
use crate::infra::state_store::StateStore;

/// Execute the rollback
pub fn execute(store: &StateStore, root: &Path, executor: &Executor, force: bool) -> Result<()> {
    let report = rollback(store, root, executor, force)?;
    ensure_complete(&report, "Rollback", "--force-rollback")?;

    if executor.is_pretend() {
        return Ok(());
    }
    if force {
        println!(
            "{} Rolled back; the migration plan was kept so --migrate can be retried",
            status::SUCCESS
        );
    } else {
        println!("{} Rolled back; lib points to lib64 again", status::SUCCESS);
    }
    Ok(())
}
