//! Ownership classification
//!
//! Partitions the top-level entries of one prefix into the parts that move
//! into the new `lib` directory and the parts that stay in `lib64`, and
//! detects ownership overlaps that make the migration impossible.
//!
//! All paths are `/`-separated and relative to their role directory.

use std::collections::BTreeSet;
use std::fmt;

use crate::core::policy::is_archlib_name;
use crate::error::ConflictError;

/// Set of relative paths
pub type PathSet = BTreeSet<String>;

/// Role of one of the three library directories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Multi-architecture `lib`
    Lib,
    /// Secondary architecture `lib32`
    Lib32,
    /// Primary architecture `lib64`
    Lib64,
}

impl Role {
    /// Directory name of the role
    pub fn dir_name(self) -> &'static str {
        match self {
            Role::Lib => crate::config::defaults::LIB_DIR,
            Role::Lib32 => crate::config::defaults::LIB32_DIR,
            Role::Lib64 => crate::config::defaults::LIB64_DIR,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Everything the classifier needs to know about one prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixInventory {
    /// Non-directory paths owned through `lib`
    pub lib: PathSet,
    /// Non-directory paths owned through `lib32`
    pub lib32: PathSet,
    /// Non-directory paths owned through `lib64`
    pub lib64: PathSet,
    /// Actual top-level entries of the real `lib64` directory
    pub lib64_entries: PathSet,
    /// Actual top-level entries of `lib32` (empty when absent)
    pub lib32_entries: PathSet,
}

/// Result of classifying one prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Top-level names copied from `lib64` into `lib.new`
    pub includes: PathSet,
    /// `lib64`-owned paths inside mixed directories, removed from the copy
    pub excludes: PathSet,
    /// Top-level names owned only through `lib`
    pub pure_lib: PathSet,
    /// Top-level names owned through both `lib` and `lib64`
    pub mixed: PathSet,
    /// Unowned entries that move to `lib`
    pub lib_orphans: PathSet,
    /// Unowned entries that stay in `lib64`
    pub lib64_orphans: PathSet,
}

/// Leading component of a relative path
pub fn top_level(path: &str) -> &str {
    path.split('/').next().unwrap_or(path)
}

fn top_levels(paths: &PathSet) -> PathSet {
    paths.iter().map(|p| top_level(p).to_string()).collect()
}

/// Classify one prefix using the default orphan policy
pub fn classify(
    prefix: &str,
    inventory: &PrefixInventory,
) -> Result<Classification, ConflictError> {
    classify_with(prefix, inventory, is_archlib_name)
}

/// Classify one prefix with a custom orphan predicate
///
/// Returns a [`ConflictError`] when the `lib` role shares a path with the
/// `lib32` role (including `lib` orphans and the on-disk `lib32` entries) or
/// shares an exact owned path with the `lib64` role.
pub fn classify_with(
    prefix: &str,
    inventory: &PrefixInventory,
    is_archlib: impl Fn(&str) -> bool,
) -> Result<Classification, ConflictError> {
    let lib_tops = top_levels(&inventory.lib);
    let lib64_tops = top_levels(&inventory.lib64);

    let pure_lib: PathSet = lib_tops.difference(&lib64_tops).cloned().collect();
    let mixed: PathSet = lib_tops.intersection(&lib64_tops).cloned().collect();

    let (lib64_orphans, lib_orphans): (PathSet, PathSet) = inventory
        .lib64_entries
        .iter()
        .filter(|name| !lib_tops.contains(*name) && !lib64_tops.contains(*name))
        .cloned()
        .partition(|name| is_archlib(name.as_str()));

    let lib_role: PathSet = inventory.lib.union(&lib_orphans).cloned().collect();
    let lib32_role: PathSet = inventory
        .lib32
        .union(&inventory.lib32_entries)
        .cloned()
        .collect();

    let lib32_conflicts: Vec<String> = lib_role.intersection(&lib32_role).cloned().collect();
    let lib64_conflicts: Vec<String> = inventory
        .lib
        .intersection(&inventory.lib64)
        .cloned()
        .collect();

    if !lib32_conflicts.is_empty() || !lib64_conflicts.is_empty() {
        return Err(ConflictError {
            prefix: prefix.to_string(),
            lib32_conflicts,
            lib64_conflicts,
        });
    }

    let includes: PathSet = lib_tops.union(&lib_orphans).cloned().collect();
    let excludes: PathSet = inventory
        .lib64
        .iter()
        .filter(|path| mixed.contains(top_level(path)))
        .cloned()
        .collect();

    Ok(Classification {
        includes,
        excludes,
        pure_lib,
        mixed,
        lib_orphans,
        lib64_orphans,
    })
}

/// A filesystem mount nested under one of the source directories
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NestedMount {
    /// Directory the mount was found under
    pub role: Role,
    /// Path relative to that directory (empty for the directory itself)
    pub path: String,
}

impl NestedMount {
    /// Whether the mount lies inside content that will be migrated
    ///
    /// All of `lib32` is migrated; in `lib64` only the `includes` entries are.
    pub fn is_migrated(&self, includes: &PathSet) -> bool {
        match self.role {
            Role::Lib64 => includes.contains(top_level(&self.path)),
            _ => true,
        }
    }
}
