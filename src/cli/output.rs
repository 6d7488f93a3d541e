//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress spinners,
//! analysis reports and error messages to the user.

use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressStyle};

use crate::core::analyze::{Analysis, PrefixReport};
use crate::core::classify::{NestedMount, PathSet};
use crate::core::cleanup::CleanupReport;
use crate::error::ConflictError;

/// Create a spinner for operations with unknown duration
///
/// The spinner is hidden when stderr is not a terminal.
pub fn create_spinner(message: &str) -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

/// Print an error and its causes to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} Error: {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

fn print_set(title: &str, items: &PathSet) {
    if items.is_empty() {
        return;
    }
    println!("  {title}:");
    for item in items {
        println!("    {item}");
    }
}

fn mount_label(mount: &NestedMount, report: &PrefixReport) -> String {
    let base = format!("{}/{}", report.prefix.as_str().trim_end_matches('/'), mount.role);
    if mount.path.is_empty() {
        base
    } else {
        format!("{base}/{}", mount.path)
    }
}

fn print_prefix(report: &PrefixReport) {
    let c = &report.classification;
    println!("{} Prefix {}", status::INFO, report.prefix);
    print_set("Pure lib directories", &c.pure_lib);
    print_set("Mixed directories", &c.mixed);
    print_set("Unowned files moved to lib", &c.lib_orphans);
    print_set("Unowned files kept in lib64", &c.lib64_orphans);
    println!(
        "  {} entries will be copied into lib, {} paths stay in lib64",
        c.includes.len(),
        c.excludes.len()
    );

    let migrated: Vec<String> = report
        .migrated_mounts()
        .map(|m| mount_label(m, report))
        .collect();
    if !migrated.is_empty() {
        println!(
            "{} Mount points inside migrated directories; they will need to be moved manually:",
            status::WARNING
        );
        for mount in &migrated {
            println!("    {mount}");
        }
    }

    let staying: Vec<String> = report
        .staying_mounts()
        .map(|m| mount_label(m, report))
        .collect();
    if !staying.is_empty() {
        println!("  Mount points staying in place:");
        for mount in &staying {
            println!("    {mount}");
        }
    }
}

/// Print the result of the analysis phase
pub fn print_analysis(analysis: &Analysis) {
    for report in &analysis.reports {
        print_prefix(report);
    }

    if !analysis.missing_files.is_empty() {
        println!("{} Files recorded by packages but missing on disk:", status::WARNING);
        for (package, files) in &analysis.missing_files {
            println!("  {package}:");
            for file in files {
                println!("    {file}");
            }
        }
    }

    if analysis.no_lib32_content {
        println!(
            "{} No lib32 content found; lib32 will not be created unless it already exists",
            status::WARNING
        );
    }
}

/// Print every path of an ownership conflict
pub fn print_conflicts(conflict: &ConflictError) {
    if !conflict.lib32_conflicts.is_empty() {
        eprintln!(
            "{} Paths both in lib and lib32 of prefix {}:",
            status::ERROR,
            conflict.prefix
        );
        for path in &conflict.lib32_conflicts {
            eprintln!("    {path}");
        }
    }
    if !conflict.lib64_conflicts.is_empty() {
        eprintln!(
            "{} Paths owned both through lib and lib64 of prefix {}:",
            status::ERROR,
            conflict.prefix
        );
        for path in &conflict.lib64_conflicts {
            eprintln!("    {path}");
        }
    }
}

/// Print the entries a best-effort phase could not handle
pub fn print_failures(report: &CleanupReport) {
    for failure in &report.failures {
        eprintln!("{} {}: {}", status::ERROR, failure.path.display(), failure.error);
    }
}
