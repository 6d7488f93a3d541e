//! CLI implementation for `--migrate`

use std::path::Path;

use anyhow::Result;

use crate::cli::output::{create_spinner, status};
use crate::core::migrate::migrate;
use crate::infra::executor::Executor;
use crate::infra::state_store::StateStore;

/// Execute the migration
pub fn execute(store: &StateStore, root: &Path, executor: &Executor) -> Result<()> {
    if executor.is_pretend() {
        migrate(store, root, executor)?;
        return Ok(());
    }

    let spinner = create_spinner("Copying files into lib.new...");
    let result = migrate(store, root, executor);
    spinner.finish_and_clear();
    result?;

    println!(
        "{} lib now points to lib.new; verify the system and run --finish, or --rollback to revert",
        status::SUCCESS
    );
    Ok(())
}
