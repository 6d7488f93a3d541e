//! CLI implementation for `--finish` and `--resume-finish`

use std::path::Path;

use anyhow::Result;

use super::ensure_complete;
use crate::cli::output::status;
use crate::core::finish::finish;
use crate::infra::executor::Executor;
use crate::infra::state_store::StateStore;

/// Execute the finishing phase
pub fn execute(store: &StateStore, root: &Path, executor: &Executor, resume: bool) -> Result<()> {
    let report = finish(store, root, executor, resume)?;
    ensure_complete(&report, "Finishing", "--resume-finish")?;

    if !executor.is_pretend() {
        println!("{} Migration finished; lib is now a real directory", status::SUCCESS);
    }
    Ok(())
}
