//! unsymlink-lib - convert a `lib -> lib64` symlink into a real directory
//!
//! Migrates a filesystem whose `lib` is a symlink to `lib64` into a layout
//! where `lib` is a real directory holding the multi-architecture content and
//! the former `lib32` content, and `lib32` is a symlink to `lib`. The
//! migration runs in resumable phases with a rollback path until it is
//! finished.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Classification and the migration phases
//! - [`infra`] - Infrastructure layer (filesystem, processes, package database, state file)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
