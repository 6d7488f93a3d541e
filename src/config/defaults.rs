//! Default configuration values and fixed layout names

/// Multi-architecture library directory (initially a symlink to `lib64`)
pub const LIB_DIR: &str = "lib";

/// Secondary architecture library directory
pub const LIB32_DIR: &str = "lib32";

/// Primary architecture library directory
pub const LIB64_DIR: &str = "lib64";

/// Staging directory that becomes the new `lib`
pub const LIB_NEW_DIR: &str = "lib.new";

/// Temporary symlink name used for atomic `lib` redirection
pub const LIB_TMP_LINK: &str = "lib.tmp";

/// Prefixes probed for a `lib`/`lib32`/`lib64` triad, relative to the root
pub const PREFIX_CANDIDATES: &[&str] = &["/", "/usr", "/usr/local"];

/// Installed package database location, relative to the root
pub const DEFAULT_PACKAGE_DB: &str = "var/db/pkg";

/// File name of the persisted migration state inside the state directory
pub const STATE_FILE_NAME: &str = "state.json";

/// Current persisted state format version
pub const STATE_VERSION: u32 = 1;

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
