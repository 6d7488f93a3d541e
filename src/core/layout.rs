//! Per-prefix directory layout
//!
//! Knows where `lib`, `lib32`, `lib64` and `lib.new` live for a prefix and
//! verifies that a prefix is in the state a phase expects. Also discovers
//! which prefixes of a root are managed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::defaults::{
    LIB32_DIR, LIB64_DIR, LIB_DIR, LIB_NEW_DIR, LIB_TMP_LINK, PREFIX_CANDIDATES,
};
use crate::core::state::Prefix;
use crate::error::LayoutError;
use crate::infra::filesystem::{
    exists_no_follow, is_real_dir, is_symlink, link_points_to, link_target,
};

/// Paths of one prefix's library directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixLayout {
    /// Prefix inside the root
    pub prefix: Prefix,
    /// Host path of the prefix
    pub base: PathBuf,
    /// `lib`
    pub lib: PathBuf,
    /// `lib32`
    pub lib32: PathBuf,
    /// `lib64`
    pub lib64: PathBuf,
    /// `lib.new`
    pub lib_new: PathBuf,
    /// Temporary symlink used while redirecting `lib`
    pub lib_tmp: PathBuf,
}

impl PrefixLayout {
    /// Layout of `prefix` under `root`
    pub fn new(root: &Path, prefix: &Prefix) -> Self {
        let base = prefix.host_path(root);
        Self {
            prefix: prefix.clone(),
            lib: base.join(LIB_DIR),
            lib32: base.join(LIB32_DIR),
            lib64: base.join(LIB64_DIR),
            lib_new: base.join(LIB_NEW_DIR),
            lib_tmp: base.join(LIB_TMP_LINK),
            base,
        }
    }

    /// Whether `lib32` exists as a real directory
    pub fn has_lib32(&self) -> bool {
        is_real_dir(&self.lib32)
    }

    /// Whether `lib` currently resolves to `lib64`
    pub fn lib_points_to_lib64(&self) -> bool {
        is_symlink(&self.lib) && link_points_to(&self.lib, &self.lib64)
    }

    /// Whether `lib` currently resolves to `lib.new`
    pub fn lib_points_to_lib_new(&self) -> bool {
        is_symlink(&self.lib) && link_points_to(&self.lib, &self.lib_new)
    }

    /// Whether `lib` is already the real directory
    pub fn is_finished(&self) -> bool {
        is_real_dir(&self.lib)
    }

    fn wrong_target(&self, expected: &str) -> LayoutError {
        LayoutError::LibWrongTarget {
            path: self.lib.clone(),
            target: link_target(&self.lib).unwrap_or_default(),
            expected: expected.to_string(),
        }
    }

    /// Verify the initial layout: `lib -> lib64`, real `lib64`, no `lib.new`
    pub fn check_initial(&self) -> Result<(), LayoutError> {
        if !is_real_dir(&self.lib64) {
            return Err(LayoutError::Lib64NotDirectory {
                path: self.lib64.clone(),
            });
        }
        if is_symlink(&self.lib32) {
            return Err(LayoutError::Lib32IsSymlink {
                path: self.lib32.clone(),
            });
        }
        if !is_symlink(&self.lib) {
            return Err(LayoutError::LibNotSymlink {
                path: self.lib.clone(),
            });
        }
        if !link_points_to(&self.lib, &self.lib64) {
            return Err(self.wrong_target(LIB64_DIR));
        }
        if exists_no_follow(&self.lib_new) {
            return Err(LayoutError::LibNewExists {
                path: self.lib_new.clone(),
            });
        }
        Ok(())
    }

    /// Verify the cut-over layout: `lib -> lib.new` and `lib.new` present
    pub fn check_cut_over(&self) -> Result<(), LayoutError> {
        if !is_real_dir(&self.lib_new) {
            return Err(LayoutError::LibNewMissing {
                path: self.lib_new.clone(),
            });
        }
        if !is_symlink(&self.lib) {
            return Err(LayoutError::LibNotSymlink {
                path: self.lib.clone(),
            });
        }
        if !link_points_to(&self.lib, &self.lib_new) {
            return Err(self.wrong_target(LIB_NEW_DIR));
        }
        Ok(())
    }
}

/// Managed prefixes of a root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefixes {
    /// Prefixes with a real `lib64`, in processing order
    pub managed: Vec<Prefix>,
    /// Prefixes whose `lib64` is a symlink into a managed prefix
    pub aliases: BTreeMap<Prefix, Prefix>,
}

/// Find the prefixes to operate on
///
/// With `only` set, just that prefix is managed; aliases of it are still
/// reported so their owned files can be folded in.
pub fn discover_prefixes(root: &Path, only: Option<&str>) -> Result<Prefixes, LayoutError> {
    let candidates: Vec<Prefix> = PREFIX_CANDIDATES.iter().map(|p| Prefix::new(p)).collect();

    let managed: Vec<Prefix> = match only {
        Some(requested) => {
            let prefix = Prefix::new(requested);
            if !is_real_dir(&PrefixLayout::new(root, &prefix).lib64) {
                return Err(LayoutError::UnknownPrefix {
                    prefix: prefix.to_string(),
                    root: root.to_path_buf(),
                });
            }
            vec![prefix]
        }
        None => candidates
            .iter()
            .filter(|p| is_real_dir(&PrefixLayout::new(root, p).lib64))
            .cloned()
            .collect(),
    };

    if managed.is_empty() {
        return Err(LayoutError::NoPrefixes {
            root: root.to_path_buf(),
        });
    }

    let canonical_lib64: Vec<(Prefix, PathBuf)> = managed
        .iter()
        .filter_map(|p| {
            fs::canonicalize(PrefixLayout::new(root, p).lib64)
                .ok()
                .map(|c| (p.clone(), c))
        })
        .collect();

    let mut aliases = BTreeMap::new();
    for candidate in candidates.iter().filter(|c| !managed.contains(c)) {
        let lib64 = PrefixLayout::new(root, candidate).lib64;
        if !is_symlink(&lib64) {
            continue;
        }
        let Ok(resolved) = fs::canonicalize(&lib64) else {
            continue;
        };
        if let Some((target, _)) = canonical_lib64.iter().find(|(_, c)| *c == resolved) {
            tracing::debug!("Prefix {candidate} is an alias of {target}");
            aliases.insert(candidate.clone(), target.clone());
        }
    }

    Ok(Prefixes { managed, aliases })
}
