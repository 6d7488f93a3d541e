//! Common test utilities and helpers
//!
//! Builds synthetic roots with a `lib -> lib64` layout and a Portage-style
//! package database for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary root filesystem
pub struct TestRoot {
    /// Directory holding the root
    pub dir: TempDir,
    /// Directory holding the state file, kept apart from the root
    pub state: TempDir,
}

impl TestRoot {
    /// Create an empty root
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
            state: TempDir::new().expect("Failed to create state directory"),
        }
    }

    /// Canonical path of the root
    pub fn path(&self) -> PathBuf {
        self.dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize root")
    }

    /// Path of the state directory
    pub fn state_dir(&self) -> PathBuf {
        self.state.path().to_path_buf()
    }

    /// Host path of `rel` inside the root
    pub fn join(&self, rel: &str) -> PathBuf {
        self.path().join(rel.trim_start_matches('/'))
    }

    /// Create `prefix/lib64` and the `prefix/lib -> lib64` symlink
    pub fn init_prefix(&self, prefix: &str) {
        let base = self.join(prefix);
        fs::create_dir_all(base.join("lib64")).expect("Failed to create lib64");
        symlink("lib64", base.join("lib")).expect("Failed to create lib symlink");
    }

    /// Create a file with content, creating parent directories
    pub fn create_file(&self, rel: &str, content: &str) {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory
    pub fn create_dir(&self, rel: &str) {
        fs::create_dir_all(self.join(rel)).expect("Failed to create directory");
    }

    /// Record an installed package owning `paths` (absolute in-root paths)
    pub fn add_package(&self, name: &str, paths: &[&str]) {
        let dir = self.join("var/db/pkg").join(name);
        fs::create_dir_all(&dir).expect("Failed to create package directory");
        let contents: String = paths
            .iter()
            .map(|p| format!("obj {p} d41d8cd98f00b204e9800998ecf8427e 1700000000\n"))
            .collect();
        fs::write(dir.join("CONTENTS"), contents).expect("Failed to write CONTENTS");
    }

    /// Whether `rel` exists without following a final symlink
    pub fn exists(&self, rel: &str) -> bool {
        fs::symlink_metadata(self.join(rel)).is_ok()
    }

    /// Whether `rel` is a symlink
    pub fn is_symlink(&self, rel: &str) -> bool {
        fs::symlink_metadata(self.join(rel)).is_ok_and(|m| m.file_type().is_symlink())
    }

    /// Whether `rel` is a real directory
    pub fn is_real_dir(&self, rel: &str) -> bool {
        fs::symlink_metadata(self.join(rel)).is_ok_and(|m| m.is_dir())
    }

    /// Target of the symlink `rel`
    pub fn link_target(&self, rel: &str) -> PathBuf {
        fs::read_link(self.join(rel)).expect("Failed to read symlink")
    }

    /// Read a file
    pub fn read_file(&self, rel: &str) -> String {
        fs::read_to_string(self.join(rel)).expect("Failed to read file")
    }
}

impl Default for TestRoot {
    fn default() -> Self {
        Self::new()
    }
}

/// Root for scenario A: `libfoo.so` and `gcc/` in lib64, no lib32
pub fn single_arch_root() -> TestRoot {
    let root = TestRoot::new();
    root.init_prefix("/usr");
    root.create_file("usr/lib64/libfoo.so", "foo");
    root.create_file("usr/lib64/gcc/x86_64/13/crtbegin.o", "crt");
    root.add_package(
        "sys-libs/foo-1.0",
        &["/usr/lib/libfoo.so", "/usr/lib/gcc/x86_64/13/crtbegin.o"],
    );
    root
}

/// Root for scenario B: `gcc` is mixed and lib32 has its own `gcc/i686`
pub fn multilib_root() -> TestRoot {
    let root = TestRoot::new();
    root.init_prefix("/usr");
    root.create_dir("usr/lib32");

    root.create_file("usr/lib64/libc.so.6", "libc64");
    root.create_file("usr/lib64/gcc/x86_64/13/include/stddef.h", "header");
    root.create_file("usr/lib64/gcc/x86_64/13/libgcc.a", "gcc64");
    root.create_file("usr/lib32/libc.so.6", "libc32");
    root.create_file("usr/lib32/gcc/i686/13/libgcc.a", "gcc32");

    root.add_package(
        "sys-devel/gcc-13",
        &[
            "/usr/lib/gcc/x86_64/13/include/stddef.h",
            "/usr/lib64/gcc/x86_64/13/libgcc.a",
            "/usr/lib32/gcc/i686/13/libgcc.a",
        ],
    );
    root.add_package(
        "sys-libs/glibc-2.39",
        &["/usr/lib64/libc.so.6", "/usr/lib32/libc.so.6"],
    );
    root
}

/// Root where `pkgconfig` is mixed and `zlib.pc` exists in lib64 and lib32
pub fn shared_path_root() -> TestRoot {
    let root = TestRoot::new();
    root.init_prefix("/usr");
    root.create_dir("usr/lib32");

    root.create_file("usr/lib64/pkgconfig/foo.pc", "foo");
    root.create_file("usr/lib64/pkgconfig/zlib.pc", "zlib64");
    root.create_file("usr/lib32/pkgconfig/zlib.pc", "zlib32");

    root.add_package("dev-libs/foo-1.0", &["/usr/lib/pkgconfig/foo.pc"]);
    root.add_package(
        "sys-libs/zlib-1.3",
        &["/usr/lib64/pkgconfig/zlib.pc", "/usr/lib32/pkgconfig/zlib.pc"],
    );
    root
}
