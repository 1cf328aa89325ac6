//! CLI output formatting.
//!
//! Each command has a `format_*` function returning lines (pure, testable)
//! and a `print_*` wrapper that writes them to stdout. The text is for
//! people; nothing parses it.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! ==> Building gallery
//! Found 2 images
//! ✓ Copied 2 images to dist/images
//! ✓ Generated dist/index.html
//!     Images included: a.jpg, b.png
//! ```
//!
//! ## Serve
//!
//! ```text
//! Development server running at:
//!     http://127.0.0.1:3000
//! Serving files from: /home/me/site/dist
//! Watching for changes... Press Ctrl+C to stop
//! ```
//!
//! Warnings and errors (unreadable directories, failed copies, failed
//! rebuilds) go through `tracing`, not through this module.

use crate::build::BuildReport;
use crate::clean::CleanReport;
use crate::watch::WatchTargets;
use std::net::SocketAddr;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 image` / `3 images`.
fn image_count(n: usize) -> String {
    if n == 1 {
        "1 image".to_string()
    } else {
        format!("{n} images")
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_report(report: &BuildReport, images_dir: &Path) -> Vec<String> {
    let mut lines = vec![format!("Found {}", image_count(report.image_count()))];

    let copied = format!(
        "Copied {} to {}",
        image_count(report.copied_count()),
        images_dir.display()
    );
    if report.copy.is_complete() {
        lines.push(format!("✓ {copied}"));
    } else {
        lines.push(format!("✗ {copied} ({} failed)", report.copy.failures.len()));
        for (name, err) in &report.copy.failures {
            lines.push(format!("{}{name}: {err}", indent(1)));
        }
    }

    if report.used_builtin_template {
        lines.push(format!("{}(template not found, used the built-in one)", indent(1)));
    }
    lines.push(format!("✓ Generated {}", report.output_file.display()));

    if report.manifest.is_empty() {
        lines.push(format!("{}Images included: (none)", indent(1)));
    } else {
        lines.push(format!(
            "{}Images included: {}",
            indent(1),
            report.manifest.filenames.join(", ")
        ));
    }
    lines
}

pub fn print_build_report(report: &BuildReport, images_dir: &Path) {
    for line in format_build_report(report, images_dir) {
        println!("{line}");
    }
}

// ============================================================================
// Clean
// ============================================================================

pub fn format_clean_report(dir: &Path, report: &CleanReport) -> Vec<String> {
    if !report.existed {
        return vec![format!("✓ Nothing to clean, {} does not exist", dir.display())];
    }
    vec![format!(
        "✓ Cleaned {} ({} files, {} directories)",
        dir.display(),
        report.files_removed,
        report.dirs_removed
    )]
}

pub fn print_clean_report(dir: &Path, report: &CleanReport) {
    for line in format_clean_report(dir, report) {
        println!("{line}");
    }
}

// ============================================================================
// Serve / watch
// ============================================================================

pub fn format_serve_banner(addr: Option<SocketAddr>, root: &Path) -> Vec<String> {
    let url = match addr {
        Some(addr) => format!("http://{addr}"),
        None => "(unknown address)".to_string(),
    };
    vec![
        String::new(),
        "Development server running at:".to_string(),
        format!("{}{url}", indent(1)),
        format!("Serving files from: {}", root.display()),
        "Watching for changes... Press Ctrl+C to stop".to_string(),
        String::new(),
    ]
}

pub fn print_serve_banner(addr: Option<SocketAddr>, root: &Path) {
    for line in format_serve_banner(addr, root) {
        println!("{line}");
    }
}

pub fn format_watch_targets(targets: &WatchTargets) -> Vec<String> {
    let mut lines = vec!["Watching for changes:".to_string()];
    for path in targets.watched_files() {
        lines.push(format!("{}{}", indent(1), path.display()));
    }
    lines
}

pub fn print_watch_targets(targets: &WatchTargets) {
    for line in format_watch_targets(targets) {
        println!("{line}");
    }
}
