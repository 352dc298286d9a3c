//! Path utilities.
//!
//! - Cross-platform path normalization for display
//! - Source file discovery with gitignore support

use crate::lang::Language;
use std::path::{Path, PathBuf};

/// Normalizes a path for CLI display.
///
/// - Converts backslashes to forward slashes (for cross-platform consistency)
/// - Strips leading "./" or ".\" prefix (for cleaner output)
///
/// # Examples
/// ```
/// use std::path::Path;
/// use astdiff::utils::normalize_display_path;
///
/// assert_eq!(normalize_display_path(Path::new(".\\src\\Main.java")), "src/Main.java");
/// assert_eq!(normalize_display_path(Path::new("./src/lib.rs")), "src/lib.rs");
/// ```
#[must_use]
pub fn normalize_display_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    let clean = s.trim_start_matches(r"\\?\");
    let normalized = clean.replace('\\', "/");
    normalized
        .strip_prefix("./")
        .unwrap_or(&normalized)
        .to_owned()
}

/// Checks if a name matches any exclusion pattern.
/// Supports exact matching and wildcard patterns starting with `*.`.
#[must_use]
pub fn is_excluded(name: &str, excludes: &[String]) -> bool {
    excludes.iter().any(|exclude| match exclude.strip_prefix('*') {
        Some(suffix) if suffix.starts_with('.') => name.ends_with(suffix),
        _ => name == exclude,
    })
}

/// Whether a file has an extension one of the language adapters handles.
#[must_use]
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| Language::from_extension(ext) != Language::Unknown)
}

/// Collect the files to compare from `paths`.
///
/// Files named directly are always kept, whatever their extension.
/// Directories are walked gitignore-aware, skipping folders matched by
/// `exclude`, and only files of supported languages are kept.
/// The result is sorted and free of duplicates.
#[must_use]
pub fn collect_source_files(paths: &[PathBuf], exclude: &[String], verbose: bool) -> Vec<PathBuf> {
    use ignore::WalkBuilder;

    let mut files = Vec::new();
    for root in paths {
        if !root.is_dir() {
            files.push(root.clone());
            continue;
        }

        let excludes_for_filter = exclude.to_vec();
        let root_for_filter = root.clone();

        // Excluded directories are pruned at traversal time.
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .filter_entry(move |entry| {
                if entry.path() == root_for_filter {
                    return true;
                }
                if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                    return true;
                }
                entry
                    .file_name()
                    .to_str()
                    .is_none_or(|name| !is_excluded(name, &excludes_for_filter))
            })
            .build();

        for result in walker {
            match result {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_some_and(|ft| ft.is_file())
                        && has_supported_extension(path)
                    {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    if verbose {
                        eprintln!("Walk error: {e}");
                    }
                }
            }
        }
    }

    files.sort();
    files.dedup();
    files
}
