//! Migration state
//!
//! The state is the only thing carried from one invocation to the next:
//! `analyze` creates it, `migrate`, `finish` and `rollback` reload it.
//! See [`crate::infra::state_store`] for persistence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::defaults::STATE_VERSION;
use crate::core::classify::{Classification, PathSet};
use crate::error::StateError;

static EMPTY: PathSet = PathSet::new();

/// Absolute path inside the target root holding a `lib`/`lib32`/`lib64` triad
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prefix(String);

impl Prefix {
    /// Create a prefix, normalizing to a leading `/` and no trailing `/`
    pub fn new(path: &str) -> Self {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            Self("/".to_string())
        } else {
            Self(format!("/{trimmed}"))
        }
    }

    /// Prefix as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Location of the prefix on the host for the given root
    pub fn host_path(&self, root: &Path) -> PathBuf {
        let relative = self.0.trim_start_matches('/');
        if relative.is_empty() {
            root.to_path_buf()
        } else {
            root.join(relative)
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted migration state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationState {
    /// State format version
    pub version: u32,

    /// Root the state was created for
    pub root: PathBuf,

    /// Prefixes operated on, in processing order
    pub prefixes: Vec<Prefix>,

    /// Top-level names copied into `lib.new`, per prefix
    #[serde(default)]
    pub includes: BTreeMap<Prefix, PathSet>,

    /// Paths removed from mixed directories in `lib.new`, per prefix
    #[serde(default)]
    pub excludes: BTreeMap<Prefix, PathSet>,

    /// Whether any prefix had a `lib32` directory
    #[serde(default)]
    pub has_secondary_arch: bool,
}

impl MigrationState {
    /// Create an empty state for a root
    pub fn new(root: PathBuf) -> Self {
        Self {
            version: STATE_VERSION,
            root,
            prefixes: Vec::new(),
            includes: BTreeMap::new(),
            excludes: BTreeMap::new(),
            has_secondary_arch: false,
        }
    }

    /// Record the classification of a prefix
    pub fn add_prefix(&mut self, prefix: Prefix, classification: &Classification) {
        self.includes
            .insert(prefix.clone(), classification.includes.clone());
        self.excludes
            .insert(prefix.clone(), classification.excludes.clone());
        if !self.prefixes.contains(&prefix) {
            self.prefixes.push(prefix);
        }
    }

    /// Top-level names to migrate for a prefix
    pub fn includes_for(&self, prefix: &Prefix) -> &PathSet {
        self.includes.get(prefix).unwrap_or(&EMPTY)
    }

    /// Excluded paths for a prefix
    pub fn excludes_for(&self, prefix: &Prefix) -> &PathSet {
        self.excludes.get(prefix).unwrap_or(&EMPTY)
    }

    /// Verify the state was created for `root`
    pub fn ensure_root(&self, root: &Path) -> Result<(), StateError> {
        if self.root != root {
            return Err(StateError::RootMismatch {
                expected: root.to_path_buf(),
                found: self.root.clone(),
            });
        }
        Ok(())
    }

    /// Parse from a JSON string
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
