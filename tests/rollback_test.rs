//! Integration tests for the rollback phase
//!
//! Normal rollback after a migration, forced rollback after a failed one and
//! the refusal to roll back a finished migration.

mod common;

use std::fs;
use std::os::unix::fs::symlink;
use std::path::PathBuf;

use common::{multilib_root, single_arch_root, TestRoot};
use unsymlink_lib::core::analyze::analyze;
use unsymlink_lib::core::finish::finish;
use unsymlink_lib::core::migrate::migrate;
use unsymlink_lib::core::rollback::rollback;
use unsymlink_lib::error::{LayoutError, UnsymlinkError};
use unsymlink_lib::infra::executor::{Executor, LinkMode};
use unsymlink_lib::infra::ownership::VdbOwnership;
use unsymlink_lib::infra::state_store::StateStore;

fn store(root: &TestRoot) -> StateStore {
    StateStore::in_dir(&root.state_dir())
}

fn executor() -> Executor {
    Executor::new(LinkMode::Reflink)
}

fn analyzed(root: &TestRoot) {
    let analysis = analyze(&root.path(), None, &VdbOwnership::default()).unwrap();
    store(root).save(&analysis.state).unwrap();
}

#[test]
fn test_rollback_after_migrate_restores_initial_layout() {
    let root = multilib_root();
    analyzed(&root);
    migrate(&store(&root), &root.path(), &executor()).unwrap();

    let report = rollback(&store(&root), &root.path(), &executor(), false).unwrap();

    assert!(report.is_complete());
    assert_eq!(root.link_target("usr/lib"), PathBuf::from("lib64"));
    assert!(!root.exists("usr/lib.new"));
    assert!(!root.exists("usr/lib.tmp"));
    assert!(root.is_real_dir("usr/lib32"));
    assert_eq!(root.read_file("usr/lib64/gcc/x86_64/13/libgcc.a"), "gcc64");
    assert!(!store(&root).exists());
}

#[test]
fn test_rollback_requires_cut_over() {
    let root = single_arch_root();
    analyzed(&root);

    let err = rollback(&store(&root), &root.path(), &executor(), false).unwrap_err();

    assert!(matches!(
        err,
        UnsymlinkError::Layout(LayoutError::LibNewMissing { .. })
    ));
    assert!(store(&root).exists());
}

#[test]
fn test_forced_rollback_after_failed_copy() {
    let root = single_arch_root();
    analyzed(&root);
    // A copy that stopped halfway
    root.create_file("usr/lib.new/libfoo.so", "fo");

    let report = rollback(&store(&root), &root.path(), &executor(), true).unwrap();

    assert!(report.is_complete());
    assert_eq!(root.link_target("usr/lib"), PathBuf::from("lib64"));
    assert!(!root.exists("usr/lib.new"));
    // kept so migrate can be retried
    assert!(store(&root).exists());

    let again = rollback(&store(&root), &root.path(), &executor(), true).unwrap();
    assert!(again.is_complete());
    assert_eq!(root.link_target("usr/lib"), PathBuf::from("lib64"));

    migrate(&store(&root), &root.path(), &executor()).unwrap();
    assert_eq!(root.read_file("usr/lib.new/libfoo.so"), "foo");
}

#[test]
fn test_forced_rollback_after_partial_cut_over() {
    let root = single_arch_root();
    root.init_prefix("/");
    analyzed(&root);
    migrate(&store(&root), &root.path(), &executor()).unwrap();

    // Only / was redirected before the failure
    fs::remove_file(root.join("usr/lib")).unwrap();
    symlink("lib64", root.join("usr/lib")).unwrap();

    let err = rollback(&store(&root), &root.path(), &executor(), false).unwrap_err();
    assert!(matches!(
        err,
        UnsymlinkError::Layout(LayoutError::LibWrongTarget { .. })
    ));

    let report = rollback(&store(&root), &root.path(), &executor(), true).unwrap();

    assert!(report.is_complete());
    assert_eq!(root.link_target("lib"), PathBuf::from("lib64"));
    assert_eq!(root.link_target("usr/lib"), PathBuf::from("lib64"));
    assert!(!root.exists("lib.new"));
    assert!(!root.exists("usr/lib.new"));
}

#[test]
fn test_forced_rollback_refuses_finished_migration() {
    let root = multilib_root();
    analyzed(&root);
    migrate(&store(&root), &root.path(), &executor()).unwrap();
    let state = store(&root).load().unwrap();
    finish(&store(&root), &root.path(), &executor(), false).unwrap();
    store(&root).save(&state).unwrap();

    let err = rollback(&store(&root), &root.path(), &executor(), true).unwrap_err();

    assert!(matches!(
        err,
        UnsymlinkError::Layout(LayoutError::AlreadyFinished { .. })
    ));
    assert!(root.is_real_dir("usr/lib"));
}

#[test]
fn test_pretend_rollback_changes_nothing() {
    let root = single_arch_root();
    analyzed(&root);
    migrate(&store(&root), &root.path(), &executor()).unwrap();

    let report = rollback(
        &store(&root),
        &root.path(),
        &Executor::pretend(LinkMode::Reflink),
        false,
    )
    .unwrap();

    assert!(report.is_complete());
    assert_eq!(root.link_target("usr/lib"), PathBuf::from("lib.new"));
    assert!(root.is_real_dir("usr/lib.new"));
    assert!(store(&root).exists());
}
