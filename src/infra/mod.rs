//! Infrastructure layer
//!
//! Handles all I/O: filesystem inspection and mutation, external processes,
//! the package database and the persisted state.

pub mod dirs;
pub mod executor;
pub mod filesystem;
pub mod ownership;
pub mod state_store;
