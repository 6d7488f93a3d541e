//! Package ownership queries
//!
//! The classifier only needs to know which files each installed package
//! owns and what kind of filesystem object each of them is on disk.
//! [`OwnershipSource`] is that capability; [`VdbOwnership`] reads the Portage
//! installed-package database and [`MemoryOwnership`] serves a fixed list.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::OwnershipError;

/// Kind of filesystem object a recorded path refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Regular file
    Regular,
    /// Directory
    Directory,
    /// Symbolic link
    Symlink,
    /// Device, fifo or socket
    Other,
    /// Recorded but absent on disk
    Missing,
}

impl FileKind {
    /// Determine the kind of `path` without following symlinks
    pub fn of(path: &Path) -> Self {
        match fs::symlink_metadata(path) {
            Ok(meta) => {
                let file_type = meta.file_type();
                if file_type.is_symlink() {
                    FileKind::Symlink
                } else if file_type.is_dir() {
                    FileKind::Directory
                } else if file_type.is_file() {
                    FileKind::Regular
                } else {
                    FileKind::Other
                }
            }
            Err(_) => FileKind::Missing,
        }
    }
}

/// A path recorded as owned by a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedFile {
    /// Absolute path inside the root, e.g. `/usr/lib64/libz.so.1`
    pub path: String,
    /// Kind on disk
    pub kind: FileKind,
}

/// Files owned by one installed package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFiles {
    /// Package identifier, e.g. `sys-libs/zlib-1.3`
    pub package: String,
    /// Owned files
    pub files: Vec<OwnedFile>,
}

/// Source of package ownership information
pub trait OwnershipSource {
    /// List every installed package with the files it owns under `root`
    ///
    /// Files recorded but missing on disk are reported as
    /// [`FileKind::Missing`] rather than as an error.
    fn installed_files(&self, root: &Path) -> Result<Vec<PackageFiles>, OwnershipError>;
}

fn contents_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"^(?:dir|fif|dev) (.+)$").expect("valid regex"),
            Regex::new(r"^obj (.+) [0-9a-fA-F]+ [0-9]+$").expect("valid regex"),
            Regex::new(r"^sym (.+?) -> .* [0-9]+$").expect("valid regex"),
        ]
    })
}

/// Extract the recorded path from one line of a `CONTENTS` file
pub fn parse_contents_line(line: &str) -> Option<&str> {
    contents_patterns()
        .iter()
        .find_map(|re| re.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Portage installed-package database (`/var/db/pkg`)
#[derive(Debug, Clone)]
pub struct VdbOwnership {
    db_path: PathBuf,
}

impl VdbOwnership {
    /// Database located at `db_path`, relative to the queried root
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn sorted_dirs(path: &Path) -> Result<Vec<PathBuf>, OwnershipError> {
        let entries = fs::read_dir(path).map_err(|e| OwnershipError::Database {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter(|entry| !entry.file_name().to_string_lossy().starts_with('-'))
            .map(|entry| entry.path())
            .collect();
        dirs.sort();
        Ok(dirs)
    }

    fn read_package(
        root: &Path,
        package_dir: &Path,
        name: String,
    ) -> Result<PackageFiles, OwnershipError> {
        let contents_path = package_dir.join("CONTENTS");
        let content = match fs::read_to_string(&contents_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(OwnershipError::Contents {
                    path: contents_path,
                    error: e.to_string(),
                })
            }
        };

        let files = content
            .lines()
            .filter_map(|line| {
                let parsed = parse_contents_line(line);
                if parsed.is_none() && !line.trim().is_empty() {
                    tracing::debug!("Skipping unrecognized CONTENTS line in {name}: {line}");
                }
                parsed
            })
            .map(|path| OwnedFile {
                path: path.to_string(),
                kind: FileKind::of(&root.join(path.trim_start_matches('/'))),
            })
            .collect();

        Ok(PackageFiles {
            package: name,
            files,
        })
    }
}

impl Default for VdbOwnership {
    fn default() -> Self {
        Self::new(crate::config::defaults::DEFAULT_PACKAGE_DB)
    }
}

impl OwnershipSource for VdbOwnership {
    fn installed_files(&self, root: &Path) -> Result<Vec<PackageFiles>, OwnershipError> {
        let db = root.join(&self.db_path);
        tracing::info!("Reading installed package database {}", db.display());

        let mut packages = Vec::new();
        for category in Self::sorted_dirs(&db)? {
            for package_dir in Self::sorted_dirs(&category)? {
                let name = format!(
                    "{}/{}",
                    category.file_name().unwrap_or_default().to_string_lossy(),
                    package_dir.file_name().unwrap_or_default().to_string_lossy()
                );
                packages.push(Self::read_package(root, &package_dir, name)?);
            }
        }

        tracing::debug!("Found {} installed packages", packages.len());
        Ok(packages)
    }
}

/// Fixed in-memory ownership list
///
/// File kinds are still looked up on disk at query time.
#[derive(Debug, Clone, Default)]
pub struct MemoryOwnership {
    packages: Vec<(String, Vec<String>)>,
}

impl MemoryOwnership {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package owning the given absolute in-root paths
    pub fn package<I, S>(mut self, name: &str, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages
            .push((name.to_string(), paths.into_iter().map(Into::into).collect()));
        self
    }
}

impl OwnershipSource for MemoryOwnership {
    fn installed_files(&self, root: &Path) -> Result<Vec<PackageFiles>, OwnershipError> {
        Ok(self
            .packages
            .iter()
            .map(|(name, paths)| PackageFiles {
                package: name.clone(),
                files: paths
                    .iter()
                    .map(|path| OwnedFile {
                        path: path.clone(),
                        kind: FileKind::of(&root.join(path.trim_start_matches('/'))),
                    })
                    .collect(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_contents_lines() {
        assert_eq!(parse_contents_line("dir /usr/lib64"), Some("/usr/lib64"));
        assert_eq!(
            parse_contents_line(
                "obj /usr/lib64/libz.so.1.3 0123456789abcdef0123456789abcdef 1700000000"
            ),
            Some("/usr/lib64/libz.so.1.3")
        );
        assert_eq!(
            parse_contents_line("sym /usr/lib64/libz.so.1 -> libz.so.1.3 1700000000"),
            Some("/usr/lib64/libz.so.1")
        );
        assert_eq!(
            parse_contents_line("obj /usr/lib/with space/file d41d8cd98f00b204e9800998ecf8427e 1"),
            Some("/usr/lib/with space/file")
        );
        assert_eq!(parse_contents_line("garbage"), None);
        assert_eq!(parse_contents_line(""), None);
    }

    #[test]
    fn test_file_kind_of() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "x").unwrap();
        std::os::unix::fs::symlink("file", dir.path().join("link")).unwrap();

        assert_eq!(FileKind::of(&file), FileKind::Regular);
        assert_eq!(FileKind::of(dir.path()), FileKind::Directory);
        assert_eq!(FileKind::of(&dir.path().join("link")), FileKind::Symlink);
        assert_eq!(FileKind::of(&dir.path().join("absent")), FileKind::Missing);
    }

    #[test]
    fn test_vdb_reads_contents_and_reports_missing() {
        let root = TempDir::new().unwrap();
        let pkg = root.path().join("var/db/pkg/sys-libs/zlib-1.3");
        fs::create_dir_all(&pkg).unwrap();
        fs::create_dir_all(root.path().join("var/db/pkg/-MERGING-foo")).unwrap();
        fs::write(
            pkg.join("CONTENTS"),
            "dir /usr/lib64\n\
             obj /usr/lib64/libz.so.1.3 0123456789abcdef0123456789abcdef 1700000000\n\
             obj /usr/lib64/libgone.so 0123456789abcdef0123456789abcdef 1700000000\n",
        )
        .unwrap();
        fs::create_dir_all(root.path().join("usr/lib64")).unwrap();
        fs::write(root.path().join("usr/lib64/libz.so.1.3"), "elf").unwrap();

        let packages = VdbOwnership::default().installed_files(root.path()).unwrap();

        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].package, "sys-libs/zlib-1.3");
        let kinds: Vec<FileKind> = packages[0].files.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![FileKind::Directory, FileKind::Regular, FileKind::Missing]
        );
    }

    #[test]
    fn test_vdb_missing_database_is_an_error() {
        let root = TempDir::new().unwrap();

        let err = VdbOwnership::default().installed_files(root.path()).unwrap_err();

        assert!(matches!(err, OwnershipError::Database { .. }));
    }

    #[test]
    fn test_memory_ownership_looks_up_kinds() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("usr/lib64")).unwrap();
        fs::write(root.path().join("usr/lib64/libfoo.so"), "elf").unwrap();

        let source = MemoryOwnership::new().package(
            "dev-libs/foo",
            ["/usr/lib64/libfoo.so", "/usr/lib64/libbar.so"],
        );
        let packages = source.installed_files(root.path()).unwrap();

        assert_eq!(packages[0].files[0].kind, FileKind::Regular);
        assert_eq!(packages[0].files[1].kind, FileKind::Missing);
    }
}
