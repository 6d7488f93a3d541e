//! Per-user directory management
//!
//! Provides the locations of the persisted migration state and of the
//! optional configuration file. Follows the XDG Base Directory Specification.
//!
//! Environment variables can override default directories:
//! - `UNSYMLINK_LIB_STATE_DIR` - Override state directory
//! - `UNSYMLINK_LIB_CONFIG_DIR` - Override config directory

use std::env;
use std::path::PathBuf;

/// Environment variable names for directory overrides
pub const ENV_STATE_DIR: &str = "UNSYMLINK_LIB_STATE_DIR";
pub const ENV_CONFIG_DIR: &str = "UNSYMLINK_LIB_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "unsymlink-lib";

/// Directory provider for unsymlink-lib
#[derive(Debug, Clone)]
pub struct AppDirs {
    state_dir: PathBuf,
    config_dir: PathBuf,
}

impl AppDirs {
    /// Create a new `AppDirs` instance
    ///
    /// Checks environment variables first, then falls back to platform defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state_dir: Self::resolve_state_dir(),
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Get the state directory path
    ///
    /// - `$XDG_CACHE_HOME/unsymlink-lib` or `~/.cache/unsymlink-lib`
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone()
    }

    /// Get the config directory path
    ///
    /// - `$XDG_CONFIG_HOME/unsymlink-lib` or `~/.config/unsymlink-lib`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Path of the configuration file
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    fn resolve_state_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_STATE_DIR) {
            return PathBuf::from(path);
        }

        dirs::cache_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".cache").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".cache").join(APP_NAME))
            })
    }

    fn resolve_config_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CONFIG_DIR) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}

impl Default for AppDirs {
    fn default() -> Self {
        Self::new()
    }
}
