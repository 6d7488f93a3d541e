//! Filesystem mutations
//!
//! Every change the migration makes goes through [`Executor`]. In pretend
//! mode each operation is printed as an equivalent shell command instead of
//! being performed. Bulk copies and recursive removals run the external `cp`
//! and `rm` utilities as synchronous child processes.

use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{FilesystemError, ToolError};

/// How `cp` avoids duplicating storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkMode {
    /// Copy-on-write clones where the filesystem supports them
    #[default]
    Reflink,
    /// Hard links to the original files
    Hardlink,
}

impl LinkMode {
    fn cp_flag(self) -> &'static str {
        match self {
            LinkMode::Reflink => "--reflink=auto",
            LinkMode::Hardlink => "-l",
        }
    }
}

/// Quote a path for display in a shell-like command line
fn quote(path: &Path) -> String {
    let text = path.to_string_lossy();
    let safe = text
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "/._-+=:@%,".contains(c));
    if safe && !text.is_empty() {
        text.into_owned()
    } else {
        format!("'{}'", text.replace('\'', r"'\''"))
    }
}

/// Performs or prints filesystem operations
#[derive(Debug, Clone, Default)]
pub struct Executor {
    pretend: bool,
    link_mode: LinkMode,
}

impl Executor {
    /// Executor that mutates the filesystem
    pub fn new(link_mode: LinkMode) -> Self {
        Self {
            pretend: false,
            link_mode,
        }
    }

    /// Executor that only prints what it would do
    pub fn pretend(link_mode: LinkMode) -> Self {
        Self {
            pretend: true,
            link_mode,
        }
    }

    /// Whether operations are only printed
    pub fn is_pretend(&self) -> bool {
        self.pretend
    }

    fn announce(&self, command: &str) -> bool {
        if self.pretend {
            println!("{command}");
        } else {
            tracing::info!("{command}");
        }
        self.pretend
    }

    fn run_tool(&self, tool: &str, args: &[String]) -> Result<(), ToolError> {
        let program = which::which(tool).map_err(|_| ToolError::NotFound {
            tool: tool.to_string(),
        })?;

        let status = Command::new(&program)
            .args(args)
            .status()
            .map_err(|e| ToolError::Spawn {
                tool: tool.to_string(),
                error: e.to_string(),
            })?;

        if !status.success() {
            return Err(ToolError::Failed {
                command: format!("{tool} {}", args.join(" ")),
                status: status.to_string(),
            });
        }
        Ok(())
    }

    /// Create `path` with the permissions of `template`
    pub fn create_dir_like(&self, path: &Path, template: &Path) -> Result<(), FilesystemError> {
        if self.announce(&format!("mkdir {}", quote(path))) {
            return Ok(());
        }

        fs::create_dir(path).map_err(|e| FilesystemError::CreateDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        if let Ok(meta) = fs::metadata(template) {
            if let Err(e) = fs::set_permissions(path, meta.permissions()) {
                tracing::warn!("Failed to copy permissions to {}: {e}", path.display());
            }
        }
        Ok(())
    }

    /// Copy `sources` into the directory `dest`, preserving attributes
    pub fn copy_into(&self, sources: &[PathBuf], dest: &Path) -> Result<(), ToolError> {
        if sources.is_empty() {
            return Ok(());
        }

        let mut args = vec!["-a".to_string(), self.link_mode.cp_flag().to_string()];
        args.extend(sources.iter().map(|s| s.to_string_lossy().into_owned()));
        args.push(format!("{}/", dest.to_string_lossy()));

        let display: Vec<String> = sources.iter().map(|s| quote(s)).collect();
        let command = format!(
            "cp -a {} {} {}/",
            self.link_mode.cp_flag(),
            display.join(" "),
            quote(dest)
        );
        if self.announce(&command) {
            return Ok(());
        }

        self.run_tool("cp", &args)
    }

    /// Recursively and forcibly remove `path`
    pub fn remove_tree(&self, path: &Path) -> Result<(), ToolError> {
        if self.announce(&format!("rm -rf {}", quote(path))) {
            return Ok(());
        }

        self.run_tool("rm", &["-rf".to_string(), path.to_string_lossy().into_owned()])
    }

    /// Remove a single file, symlink or empty directory
    pub fn remove_entry(&self, path: &Path) -> io::Result<()> {
        let meta = fs::symlink_metadata(path)?;
        if meta.is_dir() {
            if self.announce(&format!("rmdir {}", quote(path))) {
                return Ok(());
            }
            fs::remove_dir(path)
        } else {
            if self.announce(&format!("rm -f {}", quote(path))) {
                return Ok(());
            }
            fs::remove_file(path)
        }
    }

    /// Remove `base/relative` and then every ancestor below `base` left empty
    ///
    /// A path that is already gone is not an error. Pruning stops at the
    /// first ancestor that still has content.
    pub fn remove_pruning_parents(&self, base: &Path, relative: &Path) -> io::Result<()> {
        let path = base.join(relative);
        let parents: Vec<PathBuf> = relative
            .ancestors()
            .skip(1)
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| base.join(p))
            .collect();

        if self.announce(&format!("rm -rf {}", quote(&path))) {
            for parent in &parents {
                self.announce(&format!("rmdir --ignore-fail-on-non-empty {}", quote(parent)));
            }
            return Ok(());
        }

        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&path)?,
            Ok(_) => fs::remove_file(&path)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        for parent in &parents {
            match fs::remove_dir(parent) {
                Ok(()) => tracing::debug!("Pruned empty directory {}", parent.display()),
                Err(e) if crate::infra::filesystem::is_benign_removal_error(&e) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Create a symlink at `link` pointing to `target`
    pub fn symlink(&self, target: &Path, link: &Path) -> Result<(), FilesystemError> {
        if self.announce(&format!("ln -s {} {}", quote(target), quote(link))) {
            return Ok(());
        }

        symlink(target, link).map_err(|e| FilesystemError::Symlink {
            path: link.to_path_buf(),
            target: target.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Remove a symlink
    pub fn unlink(&self, link: &Path) -> Result<(), FilesystemError> {
        if self.announce(&format!("rm {}", quote(link))) {
            return Ok(());
        }

        fs::remove_file(link).map_err(|e| FilesystemError::Remove {
            path: link.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Rename `from` to `to`
    pub fn rename(&self, from: &Path, to: &Path) -> Result<(), FilesystemError> {
        if self.announce(&format!("mv -T {} {}", quote(from), quote(to))) {
            return Ok(());
        }

        fs::rename(from, to).map_err(|e| FilesystemError::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Atomically point `link` at `target`
    ///
    /// A symlink is created at `temp` first and then renamed over `link`, so
    /// readers only ever see the old or the new target. A stale `temp` left
    /// by an interrupted run is removed first.
    pub fn replace_symlink(
        &self,
        link: &Path,
        target: &Path,
        temp: &Path,
    ) -> Result<(), FilesystemError> {
        if !self.pretend && fs::symlink_metadata(temp).is_ok() {
            fs::remove_file(temp).map_err(|e| FilesystemError::Remove {
                path: temp.to_path_buf(),
                error: e.to_string(),
            })?;
        }

        self.symlink(target, temp)?;
        self.rename(temp, link)
    }
}
