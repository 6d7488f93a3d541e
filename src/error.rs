//! Error types for unsymlink-lib
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// On-disk layout does not match what a phase expects
///
/// These are always reported before any mutation and are never corrected
/// automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// No managed prefix was found under the root
    #[error("No real lib64 directory found under '{root}'; nothing to migrate")]
    NoPrefixes { root: PathBuf },

    /// The requested prefix has no lib64 directory
    #[error("Prefix '{prefix}' has no real lib64 directory under '{root}'")]
    UnknownPrefix { prefix: String, root: PathBuf },

    /// lib64 is missing or not a real directory
    #[error("'{path}' is not a real directory")]
    Lib64NotDirectory { path: PathBuf },

    /// lib32 is already a symlink
    #[error("'{path}' is already a symlink; was the migration finished already?")]
    Lib32IsSymlink { path: PathBuf },

    /// lib is not a symlink
    #[error("'{path}' is not a symlink; was the migration finished already?")]
    LibNotSymlink { path: PathBuf },

    /// lib points somewhere other than expected
    #[error("'{path}' points to '{target}' instead of '{expected}'")]
    LibWrongTarget {
        path: PathBuf,
        target: PathBuf,
        expected: String,
    },

    /// lib.new exists before migration
    #[error("'{path}' already exists; finish or roll back the previous migration first")]
    LibNewExists { path: PathBuf },

    /// lib.new is missing after migration
    #[error("'{path}' does not exist; run --migrate first")]
    LibNewMissing { path: PathBuf },

    /// lib is already the real directory
    #[error(
        "'{path}' is already a real directory; \
         the migration was finished and cannot be rolled back"
    )]
    AlreadyFinished { path: PathBuf },

    /// A resumed phase found a combination it cannot interpret
    #[error("Unexpected layout at '{path}': {detail}")]
    Inconsistent { path: PathBuf, detail: String },
}

/// Two roles claim the same path; there is no safe way to merge them
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Irreconcilable ownership conflicts in prefix '{prefix}' ({} lib/lib32, {} lib/lib64). \
     Do not proceed with the migration; please seek help",
    .lib32_conflicts.len(),
    .lib64_conflicts.len()
)]
pub struct ConflictError {
    /// Prefix the conflicts were found in
    pub prefix: String,
    /// Paths owned both in lib and in lib32
    pub lib32_conflicts: Vec<String>,
    /// Paths owned both in lib and in lib64
    pub lib64_conflicts: Vec<String>,
}

/// Persisted state errors
#[derive(Error, Debug)]
pub enum StateError {
    /// No state file exists
    #[error("Migration state not found at '{path}'; run --analyze first")]
    NotFound { path: PathBuf },

    /// State belongs to another root
    #[error("State file was created for root '{found}', but the current root is '{expected}'")]
    RootMismatch { expected: PathBuf, found: PathBuf },

    /// State format version is not understood
    #[error("Unsupported state format version {version} (expected {expected})")]
    UnsupportedVersion { version: u32, expected: u32 },

    /// Failed to read the state file
    #[error("Failed to read state file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Failed to parse the state file
    #[error("Failed to parse state file '{path}': {error}")]
    Parse { path: PathBuf, error: String },

    /// Failed to write the state file
    #[error("Failed to write state file '{path}': {error}")]
    Write { path: PathBuf, error: String },

    /// Failed to remove the state file
    #[error("Failed to remove state file '{path}': {error}")]
    Remove { path: PathBuf, error: String },
}

/// External utility errors
#[derive(Error, Debug)]
pub enum ToolError {
    /// Utility not found in PATH
    #[error("Required utility '{tool}' not found in PATH")]
    NotFound { tool: String },

    /// Utility could not be started
    #[error("Failed to run '{tool}': {error}")]
    Spawn { tool: String, error: String },

    /// Utility exited unsuccessfully
    #[error("Command `{command}` failed with {status}")]
    Failed { command: String, status: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove a file or directory
    #[error("Failed to remove '{path}': {error}")]
    Remove { path: PathBuf, error: String },

    /// Failed to read a directory or metadata
    #[error("Failed to read '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Failed to create a symlink
    #[error("Failed to create symlink '{path}' -> '{target}': {error}")]
    Symlink {
        path: PathBuf,
        target: PathBuf,
        error: String,
    },

    /// Failed to rename
    #[error("Failed to rename '{from}' to '{to}': {error}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
}

/// Installed package database errors
#[derive(Error, Debug)]
pub enum OwnershipError {
    /// Package database directory unreadable
    #[error("Failed to read package database '{path}': {error}")]
    Database { path: PathBuf, error: String },

    /// Package contents file unreadable
    #[error("Failed to read package contents '{path}': {error}")]
    Contents { path: PathBuf, error: String },
}

/// Top-level unsymlink-lib error type
#[derive(Error, Debug)]
pub enum UnsymlinkError {
    /// Layout precondition violated
    #[error("Precondition failed: {0}")]
    Layout(#[from] LayoutError),

    /// Ownership conflict
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// State error
    #[error(transparent)]
    State(#[from] StateError),

    /// External utility error
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// Package database error
    #[error(transparent)]
    Ownership(#[from] OwnershipError),

    /// Staging lib.new failed
    #[error(
        "Copying files for prefix '{prefix}' failed: {error}. \
         The partial lib.new was left for inspection; use --force-rollback to revert"
    )]
    CopyFailed { prefix: String, error: String },

    /// Redirecting lib to lib.new failed
    #[error(
        "Redirecting lib for prefix '{prefix}' failed: {error}. \
         Some prefixes may already use lib.new; use --force-rollback to revert"
    )]
    CutOverFailed { prefix: String, error: String },

    /// A directory that must be replaced is a mount point
    #[error("'{path}' is a mount point; unmount it and run --resume-finish")]
    MountPoint { path: PathBuf },

    /// Best-effort phase left work behind
    #[error(
        "{phase} did not complete: {failures} entries could not be removed; \
         fix the reported problems and run {hint}"
    )]
    Incomplete {
        phase: &'static str,
        failures: usize,
        hint: &'static str,
    },

    /// Mutating action without root privileges
    #[error("This action requires root privileges; pass --unprivileged to run it anyway")]
    NotPrivileged,
}
