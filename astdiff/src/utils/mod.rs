//! Utilities used by the command-line front end.

mod paths;

pub use paths::{collect_source_files, has_supported_extension, is_excluded, normalize_display_path};

use crate::constants::DEFAULT_EXCLUDE_FOLDERS;
use rustc_hash::FxHashSet;

/// Combine the default exclusions with user-supplied folder names.
///
/// The result is sorted so walks and verbose output are stable.
#[must_use]
pub fn merge_exclude_folders<I, S>(user: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut folders: FxHashSet<String> = DEFAULT_EXCLUDE_FOLDERS()
        .iter()
        .map(|&s| s.to_owned())
        .collect();
    folders.extend(user.into_iter().map(Into::into));

    let mut sorted: Vec<String> = folders.into_iter().collect();
    sorted.sort_unstable();
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_exclude_folders() {
        let merged = merge_exclude_folders(["generated", "target"]);
        assert!(merged.contains(&"generated".to_owned()));
        assert!(merged.contains(&".git".to_owned()));
        assert_eq!(merged.iter().filter(|f| *f == "target").count(), 1);
        assert!(merged.windows(2).all(|w| w[0] < w[1]));
    }
}
