//! Persisted migration state
//!
//! Stores [`MigrationState`] as JSON in a single file. Writes go through a
//! temporary file and a rename so a crash never leaves a truncated state.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::defaults::STATE_VERSION;
use crate::core::state::MigrationState;
use crate::error::StateError;

/// State file handle
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store backed by an explicit file path
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store inside a state directory
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(crate::config::defaults::STATE_FILE_NAME))
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a state file exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the state and check that it belongs to `root`
    pub fn load_for(&self, root: &Path) -> Result<MigrationState, StateError> {
        let state = self.load()?;
        state.ensure_root(root)?;
        Ok(state)
    }

    /// Load the state
    pub fn load(&self) -> Result<MigrationState, StateError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StateError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                StateError::Read {
                    path: self.path.clone(),
                    error: e.to_string(),
                }
            }
        })?;

        let state = MigrationState::from_json(&content).map_err(|e| StateError::Parse {
            path: self.path.clone(),
            error: e.to_string(),
        })?;

        if state.version != STATE_VERSION {
            return Err(StateError::UnsupportedVersion {
                version: state.version,
                expected: STATE_VERSION,
            });
        }

        tracing::debug!("Loaded migration state from {}", self.path.display());
        Ok(state)
    }

    /// Persist the state
    pub fn save(&self, state: &MigrationState) -> Result<(), StateError> {
        let write_err = |e: String| StateError::Write {
            path: self.path.clone(),
            error: e,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }

        let content = state.to_json().map_err(|e| write_err(e.to_string()))?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(|e| write_err(e.to_string()))?;
        fs::rename(&temp_path, &self.path).map_err(|e| write_err(e.to_string()))?;

        tracing::info!("Saved migration state to {}", self.path.display());
        Ok(())
    }

    /// Remove the state file; a missing file is not an error
    pub fn clear(&self) -> Result<(), StateError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Removed migration state {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StateError::Remove {
                path: self.path.clone(),
                error: e.to_string(),
            }),
        }
    }
}
