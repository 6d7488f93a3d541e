//! Filesystem inspection
//!
//! Read-only helpers used to verify layouts and to gather the on-disk half
//! of the classifier input. Mutations live in [`crate::infra::executor`].

use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use walkdir::WalkDir;

use crate::core::classify::PathSet;
use crate::error::FilesystemError;

/// Whether `path` itself is a symlink
pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

/// Whether `path` is a directory and not a symlink to one
pub fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
}

/// Whether anything (including a dangling symlink) exists at `path`
pub fn exists_no_follow(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Raw target of a symlink
pub fn link_target(path: &Path) -> Option<PathBuf> {
    fs::read_link(path).ok()
}

/// Whether the symlink at `link` resolves to the directory `expected`
///
/// Relative targets are resolved against the link's parent. When both sides
/// exist they are compared canonically, otherwise lexically.
pub fn link_points_to(link: &Path, expected: &Path) -> bool {
    let Some(target) = link_target(link) else {
        return false;
    };
    let resolved = match link.parent() {
        Some(parent) if target.is_relative() => parent.join(&target),
        _ => target,
    };

    match (fs::canonicalize(&resolved), fs::canonicalize(expected)) {
        (Ok(a), Ok(b)) => a == b,
        _ => resolved == expected,
    }
}

/// Whether `path` is the root of a mounted filesystem
pub fn is_mount_point(path: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return true;
    };
    match (fs::symlink_metadata(path), fs::metadata(parent)) {
        (Ok(meta), Ok(parent_meta)) => meta.is_dir() && meta.dev() != parent_meta.dev(),
        _ => false,
    }
}

/// Top-level entry names of a directory; empty when it does not exist
pub fn list_entries(dir: &Path) -> Result<PathSet, FilesystemError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PathSet::new()),
        Err(e) => {
            return Err(FilesystemError::Read {
                path: dir.to_path_buf(),
                error: e.to_string(),
            })
        }
    };

    let mut names = PathSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| FilesystemError::Read {
            path: dir.to_path_buf(),
            error: e.to_string(),
        })?;
        match entry.file_name().into_string() {
            Ok(name) => {
                names.insert(name);
            }
            Err(name) => {
                tracing::warn!(
                    "Ignoring non-UTF-8 entry {:?} in {}; it will stay in place",
                    name,
                    dir.display()
                );
            }
        }
    }
    Ok(names)
}

/// Mount points nested below `dir`, as paths relative to it
///
/// Does not descend into the mounted filesystems themselves.
pub fn nested_mounts(dir: &Path) -> Vec<String> {
    let Ok(root_meta) = fs::metadata(dir) else {
        return Vec::new();
    };
    let root_dev = root_meta.dev();

    let mut mounts = Vec::new();
    let mut walker = WalkDir::new(dir).follow_links(false).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let Ok(entry) = entry else {
            continue;
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if meta.dev() != root_dev {
            if let Ok(relative) = entry.path().strip_prefix(dir) {
                mounts.push(relative.to_string_lossy().into_owned());
            }
            walker.skip_current_dir();
        }
    }
    mounts.sort();
    mounts
}

/// Removal errors that mean "nothing to do yet" rather than a failure
///
/// A missing entry was already removed; a non-empty directory still holds
/// content that is deliberately kept.
pub fn is_benign_removal_error(error: &io::Error) -> bool {
    if error.kind() == io::ErrorKind::NotFound {
        return true;
    }
    matches!(
        error.raw_os_error().map(Errno::from_raw),
        Some(Errno::ENOTEMPTY) | Some(Errno::EEXIST)
    )
}
