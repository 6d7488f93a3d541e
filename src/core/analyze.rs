//! Analysis phase
//!
//! Verifies that every prefix is in its initial layout, gathers package
//! ownership and the on-disk listings, classifies each prefix and builds the
//! [`MigrationState`] the later phases run from. Nothing on disk is modified.

use std::collections::BTreeMap;
use std::path::{Component, Path};

use crate::core::classify::{classify, Classification, NestedMount, PrefixInventory, Role};
use crate::core::layout::{discover_prefixes, PrefixLayout};
use crate::core::state::{MigrationState, Prefix};
use crate::error::UnsymlinkError;
use crate::infra::filesystem::{is_mount_point, list_entries, nested_mounts};
use crate::infra::ownership::{FileKind, OwnershipSource};

/// Analysis result for one prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixReport {
    /// Prefix analyzed
    pub prefix: Prefix,
    /// Classification of its entries
    pub classification: Classification,
    /// Mount points found under `lib32`/`lib64`
    pub mounts: Vec<NestedMount>,
}

impl PrefixReport {
    /// Mounts inside content that will be migrated
    pub fn migrated_mounts(&self) -> impl Iterator<Item = &NestedMount> {
        self.mounts
            .iter()
            .filter(|m| m.is_migrated(&self.classification.includes))
    }

    /// Mounts that stay where they are
    pub fn staying_mounts(&self) -> impl Iterator<Item = &NestedMount> {
        self.mounts
            .iter()
            .filter(|m| !m.is_migrated(&self.classification.includes))
    }
}

/// Complete analysis of a root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// State to persist
    pub state: MigrationState,
    /// Per-prefix results, in processing order
    pub reports: Vec<PrefixReport>,
    /// Recorded files missing on disk, by package
    pub missing_files: BTreeMap<String, Vec<String>>,
    /// Whether no prefix has any `lib32` content
    pub no_lib32_content: bool,
}

/// Split an owned absolute path into the role directory and the path inside it
///
/// Returns `None` when the path is not below `prefix/{lib,lib32,lib64}/`.
pub fn split_owned_path(path: &str, prefix: &Prefix) -> Option<(Role, String)> {
    let relative = Path::new(path).strip_prefix(prefix.as_str()).ok()?;
    let mut components = relative.components();

    let role = match components.next()? {
        Component::Normal(name) if name == Role::Lib.dir_name() => Role::Lib,
        Component::Normal(name) if name == Role::Lib32.dir_name() => Role::Lib32,
        Component::Normal(name) if name == Role::Lib64.dir_name() => Role::Lib64,
        _ => return None,
    };

    let rest = components.as_path().to_str()?;
    if rest.is_empty() {
        return None;
    }
    Some((role, rest.to_string()))
}

/// Analyze `root` and compute the migration plan
///
/// With `only_prefix` set, just that prefix is analyzed.
pub fn analyze(
    root: &Path,
    only_prefix: Option<&str>,
    ownership: &dyn OwnershipSource,
) -> Result<Analysis, UnsymlinkError> {
    let prefixes = discover_prefixes(root, only_prefix)?;
    let layouts: Vec<PrefixLayout> = prefixes
        .managed
        .iter()
        .map(|p| PrefixLayout::new(root, p))
        .collect();

    for layout in &layouts {
        layout.check_initial()?;
        tracing::debug!("Prefix {} is in its initial layout", layout.prefix);
    }

    // Owned paths are attributed to the prefix they physically live in.
    let mut owners: Vec<(Prefix, Prefix)> = prefixes
        .managed
        .iter()
        .map(|p| (p.clone(), p.clone()))
        .collect();
    owners.extend(prefixes.aliases.iter().map(|(a, t)| (a.clone(), t.clone())));

    let mut inventories: BTreeMap<Prefix, PrefixInventory> = BTreeMap::new();
    let mut missing_files: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for package in ownership.installed_files(root)? {
        for file in &package.files {
            if file.kind == FileKind::Directory {
                continue;
            }
            let Some((target, role, relative)) = owners.iter().find_map(|(prefix, target)| {
                split_owned_path(&file.path, prefix).map(|(role, rel)| (target, role, rel))
            }) else {
                continue;
            };

            if file.kind == FileKind::Missing {
                missing_files
                    .entry(package.package.clone())
                    .or_default()
                    .push(file.path.clone());
                continue;
            }

            let inventory = inventories.entry(target.clone()).or_default();
            match role {
                Role::Lib => inventory.lib.insert(relative),
                Role::Lib32 => inventory.lib32.insert(relative),
                Role::Lib64 => inventory.lib64.insert(relative),
            };
        }
    }

    let mut state = MigrationState::new(root.to_path_buf());
    let mut reports = Vec::new();
    let mut no_lib32_content = true;

    for layout in &layouts {
        let mut inventory = inventories.remove(&layout.prefix).unwrap_or_default();
        inventory.lib64_entries = list_entries(&layout.lib64)?;
        inventory.lib32_entries = list_entries(&layout.lib32)?;

        if !inventory.lib32.is_empty() || !inventory.lib32_entries.is_empty() {
            no_lib32_content = false;
        }

        let classification = classify(layout.prefix.as_str(), &inventory)?;
        tracing::info!(
            "Prefix {}: {} entries to migrate, {} excluded paths",
            layout.prefix,
            classification.includes.len(),
            classification.excludes.len()
        );

        let mut mounts: Vec<NestedMount> = nested_mounts(&layout.lib64)
            .into_iter()
            .map(|path| NestedMount {
                role: Role::Lib64,
                path,
            })
            .collect();
        if layout.has_lib32() {
            if is_mount_point(&layout.lib32) {
                mounts.push(NestedMount {
                    role: Role::Lib32,
                    path: String::new(),
                });
            }
            mounts.extend(nested_mounts(&layout.lib32).into_iter().map(|path| NestedMount {
                role: Role::Lib32,
                path,
            }));
            state.has_secondary_arch = true;
        }

        state.add_prefix(layout.prefix.clone(), &classification);
        reports.push(PrefixReport {
            prefix: layout.prefix.clone(),
            classification,
            mounts,
        });
    }

    Ok(Analysis {
        state,
        reports,
        missing_files,
        no_lib32_content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_owned_path_roles() {
        let usr = Prefix::new("/usr");

        assert_eq!(
            split_owned_path("/usr/lib64/libz.so.1", &usr),
            Some((Role::Lib64, "libz.so.1".to_string()))
        );
        assert_eq!(
            split_owned_path("/usr/lib/gcc/x86_64/crt1.o", &usr),
            Some((Role::Lib, "gcc/x86_64/crt1.o".to_string()))
        );
        assert_eq!(
            split_owned_path("/usr/lib32/libz.so.1", &usr),
            Some((Role::Lib32, "libz.so.1".to_string()))
        );
    }

    #[test]
    fn test_split_owned_path_ignores_other_paths() {
        let root = Prefix::new("/");
        let usr = Prefix::new("/usr");

        assert_eq!(split_owned_path("/usr/lib64/libz.so", &root), None);
        assert_eq!(split_owned_path("/usr/bin/ls", &usr), None);
        assert_eq!(split_owned_path("/usr/lib64", &usr), None);
        assert_eq!(split_owned_path("/usr/libexec/foo", &usr), None);
        assert_eq!(split_owned_path("/usr/local/lib/foo", &usr), None);
        assert_eq!(
            split_owned_path("/lib64/libc.so.6", &root),
            Some((Role::Lib64, "libc.so.6".to_string()))
        );
    }
}
