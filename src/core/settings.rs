//! Settings file management
//!
//! Reads optional defaults from `config.toml` in the config directory.
//! Every key can be overridden on the command line.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::defaults::DEFAULT_PACKAGE_DB;
use crate::infra::dirs::{AppDirs, ENV_STATE_DIR};

/// Settings file error types
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to read settings file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse settings file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Defaults read from `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Directory holding the migration state
    pub state_dir: Option<PathBuf>,

    /// Copy with hard links instead of reflinks
    pub hardlink: Option<bool>,

    /// Installed package database, relative to the root
    pub package_db: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the config directory
    ///
    /// A missing file yields the defaults.
    pub fn load(dirs: &AppDirs) -> Result<Self, SettingsError> {
        Self::load_from_path(&dirs.config_path())
    }

    /// Load settings from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| SettingsError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| SettingsError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Effective state directory
    ///
    /// The environment override wins over the settings file.
    #[must_use]
    pub fn state_dir(&self, dirs: &AppDirs) -> PathBuf {
        if env::var_os(ENV_STATE_DIR).is_some() {
            return dirs.state_dir();
        }
        self.state_dir.clone().unwrap_or_else(|| dirs.state_dir())
    }

    /// Whether hard links are used by default
    #[must_use]
    pub fn hardlink(&self) -> bool {
        self.hardlink.unwrap_or(false)
    }

    /// Package database location, relative to the root
    #[must_use]
    pub fn package_db(&self) -> PathBuf {
        match &self.package_db {
            Some(path) => path.strip_prefix("/").unwrap_or(path).to_path_buf(),
            None => PathBuf::from(DEFAULT_PACKAGE_DB),
        }
    }
}
