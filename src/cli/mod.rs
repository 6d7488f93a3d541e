//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};

use crate::core::settings::Settings;
use crate::error::UnsymlinkError;
use crate::infra::dirs::AppDirs;
use crate::infra::executor::{Executor, LinkMode};
use crate::infra::state_store::StateStore;

/// unsymlink-lib - turn the lib -> lib64 symlink into a real directory
///
/// Moves multilib content out of lib64 and lib32 into a real lib directory.
/// Run --analyze, then --migrate, then --finish; --rollback is available
/// until the migration is finished.
#[derive(Parser, Debug)]
#[command(name = "unsymlink-lib")]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("action")
        .args(["analyze", "migrate", "rollback", "force_rollback", "finish", "resume_finish"])
))]
pub struct Cli {
    /// Analyze the system and save the migration plan (default)
    #[arg(long)]
    pub analyze: bool,

    /// Copy files into lib.new and point lib at it
    #[arg(long)]
    pub migrate: bool,

    /// Point lib back at lib64 and remove lib.new
    #[arg(long)]
    pub rollback: bool,

    /// Roll back from any state left by a failed --migrate
    #[arg(long)]
    pub force_rollback: bool,

    /// Replace lib with lib.new and clean up lib64 and lib32
    #[arg(long)]
    pub finish: bool,

    /// Resume an interrupted --finish
    #[arg(long)]
    pub resume_finish: bool,

    /// Print the operations instead of performing them
    #[arg(short, long)]
    pub pretend: bool,

    /// Root of the filesystem to migrate
    #[arg(long, default_value = "/")]
    pub root: PathBuf,

    /// Only process this prefix (e.g. /usr)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Allow running without root privileges
    #[arg(long)]
    pub unprivileged: bool,

    /// Copy using hard links instead of reflinks
    #[arg(long)]
    pub hardlink: bool,

    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// The action selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Analyze and save the plan
    Analyze,
    /// Stage and cut over
    Migrate,
    /// Roll back, optionally without precondition checks
    Rollback { force: bool },
    /// Finish, optionally resuming
    Finish { resume: bool },
}

impl Cli {
    /// Selected action
    pub fn action(&self) -> Action {
        if self.migrate {
            Action::Migrate
        } else if self.rollback || self.force_rollback {
            Action::Rollback {
                force: self.force_rollback,
            }
        } else if self.finish || self.resume_finish {
            Action::Finish {
                resume: self.resume_finish,
            }
        } else {
            Action::Analyze
        }
    }

    /// Execute the selected action
    pub fn run(self) -> Result<()> {
        let root = self
            .root
            .canonicalize()
            .with_context(|| format!("Invalid root '{}'", self.root.display()))?;

        let dirs = AppDirs::new();
        let settings = Settings::load(&dirs)?;
        let store = StateStore::in_dir(&settings.state_dir(&dirs));
        tracing::debug!("Using state file {}", store.path().display());

        let link_mode = if self.hardlink || settings.hardlink() {
            LinkMode::Hardlink
        } else {
            LinkMode::Reflink
        };
        let executor = if self.pretend {
            Executor::pretend(link_mode)
        } else {
            Executor::new(link_mode)
        };
        let privileged = self.unprivileged || nix::unistd::geteuid().is_root();

        let action = self.action();
        if action != Action::Analyze && !privileged && !self.pretend {
            return Err(UnsymlinkError::NotPrivileged.into());
        }

        match action {
            Action::Analyze => commands::analyze::execute(
                &root,
                self.prefix.as_deref(),
                &settings.package_db(),
                &store,
                privileged && !self.pretend,
            ),
            Action::Migrate => commands::migrate::execute(&store, &root, &executor),
            Action::Rollback { force } => {
                commands::rollback::execute(&store, &root, &executor, force)
            }
            Action::Finish { resume } => {
                commands::finish::execute(&store, &root, &executor, resume)
            }
        }
    }
}
