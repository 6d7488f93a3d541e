//! Core business logic module
//!
//! The classifier and the migration phases. Filesystem access goes through
//! [`crate::infra`].
//!
//! # Submodules
//!
//! - [`policy`] - Which unowned names stay in lib64
//! - [`classify`] - Ownership classification and conflict detection
//! - [`state`] - Migration state carried between phases
//! - [`layout`] - Per-prefix paths, precondition checks and prefix discovery
//! - [`analyze`] - Analysis phase
//! - [`migrate`] - Staging and cut-over phase
//! - [`finish`] - Finishing phase
//! - [`rollback`] - Rollback phase
//! - [`cleanup`] - Best-effort removal shared by the phases
//! - [`settings`] - Settings file

pub mod analyze;
pub mod classify;
pub mod cleanup;
pub mod finish;
pub mod layout;
pub mod migrate;
pub mod policy;
pub mod rollback;
pub mod settings;
pub mod state;
