/*!
 * Utility functions for dumpmd
 */

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use walkdir::WalkDir;

use crate::config::Config;
use crate::filter::PathFilter;
use crate::languages::extension_of;

/// Count included files for progress tracking
pub fn count_files(dir: &Path, config: &Config) -> u64 {
    let filter = PathFilter::new(config);

    WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !filter.should_skip_directory(&e.file_name().to_string_lossy())
        })
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            extension_of(e.path()).is_some_and(|ext| filter.should_include_file(&ext))
        })
        .count() as u64
}

/// Canonical form of a base directory, or the path itself if it cannot be resolved
pub fn resolve_base(base: &Path) -> PathBuf {
    fs::canonicalize(base).unwrap_or_else(|_| base.to_path_buf())
}

/// Display a path relative to a base directory
pub fn relative_display(path: &Path, base: &Path) -> String {
    pathdiff::diff_paths(path, base)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

/// ASCII punctuation and symbols in collation order, ahead of digits and letters
const PUNCTUATION_ORDER: &str = " _-,;:!?.'\"()[]{}@*/\\&#%`^+<=>|~$";

/// Collation weights of one base character and the marks attached to it
struct CollationElement {
    primary: (u8, u32),
    marks: Vec<char>,
    upper: bool,
}

fn primary_weight(c: char) -> (u8, u32) {
    if let Some(rank) = PUNCTUATION_ORDER.find(c) {
        return (0, rank as u32);
    }
    if c.is_whitespace() {
        return (0, 0);
    }
    if c.is_numeric() {
        return (2, c as u32);
    }
    if c.is_alphabetic() {
        let lower = c.to_lowercase().next().unwrap_or(c);
        return (3, lower as u32);
    }
    (1, c as u32)
}

fn collation_elements(s: &str) -> Vec<CollationElement> {
    let mut elements: Vec<CollationElement> = Vec::new();
    for c in s.nfd() {
        match elements.last_mut() {
            Some(last) if is_combining_mark(c) => last.marks.push(c),
            _ => elements.push(CollationElement {
                primary: primary_weight(c),
                marks: Vec::new(),
                upper: c.is_uppercase(),
            }),
        }
    }
    elements
}

/// Locale-style name ordering.
///
/// Compared level by level: base characters first (punctuation, then digits,
/// then letters, with case and accents folded away), then accents, then case
/// with lowercase first, and finally raw byte order.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let left = collation_elements(a);
    let right = collation_elements(b);

    left.iter()
        .map(|e| e.primary)
        .cmp(right.iter().map(|e| e.primary))
        .then_with(|| left.iter().map(|e| &e.marks).cmp(right.iter().map(|e| &e.marks)))
        .then_with(|| left.iter().map(|e| e.upper).cmp(right.iter().map(|e| e.upper)))
        .then_with(|| a.cmp(b))
}

/// Directory names skipped by default
pub static DEFAULT_IGNORED_DIRS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // Version Control
        ".git",
        ".svn",
        ".hg",
        // Dependencies
        "node_modules",
        "bower_components",
        ".npm",
        ".yarn",
        ".pnpm-store",
        "vendor",
        // Build & Dist
        "dist",
        "build",
        "out",
        // Python
        "__pycache__",
        ".pytest_cache",
        "venv",
        ".venv",
        // Rust
        "target",
        // IDEs & Editors
        ".idea",
        ".vscode",
        ".vs",
        // Caches
        ".cache",
        ".sass-cache",
        // JavaScript/TypeScript
        "coverage",
        ".next",
        ".nuxt",
        // .NET
        "bin",
        "obj",
        "packages",
        "TestResults",
    ]
});
