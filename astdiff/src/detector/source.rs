//! Input files handed to the detector.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Stable identifier of a submitted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Byte-level access to one submitted file.
///
/// The display name carries the extension used to pick a language adapter.
pub trait SourceFile: Send + Sync {
    /// Unique, persistent identifier.
    fn id(&self) -> FileId;

    /// Name shown in reports, including the extension.
    fn display_name(&self) -> &str;

    /// Raw file contents.
    fn contents(&self) -> Cow<'_, [u8]>;

    /// Number of lines in the file.
    fn total_line_count(&self) -> usize {
        count_lines(&self.contents())
    }
}

/// Lines in `bytes`; a trailing newline does not start a new line.
#[must_use]
pub fn count_lines(bytes: &[u8]) -> usize {
    if bytes.is_empty() {
        return 0;
    }
    let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
    if bytes.ends_with(b"\n") {
        newlines
    } else {
        newlines + 1
    }
}

/// A file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFile {
    id: FileId,
    display_name: String,
    bytes: Vec<u8>,
}

impl MemoryFile {
    /// Create a file from its id, display name and contents.
    pub fn new(id: u64, display_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            id: FileId(id),
            display_name: display_name.into(),
            bytes: bytes.into(),
        }
    }
}

impl SourceFile for MemoryFile {
    fn id(&self) -> FileId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn contents(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(b""), 0);
        assert_eq!(count_lines(b"one"), 1);
        assert_eq!(count_lines(b"one\n"), 1);
        assert_eq!(count_lines(b"one\ntwo"), 2);
        assert_eq!(count_lines(b"\n\n"), 2);
    }

    #[test]
    fn test_memory_file_accessors() {
        let file = MemoryFile::new(7, "Main.java", "class Main {}\n");
        assert_eq!(file.id(), FileId(7));
        assert_eq!(file.display_name(), "Main.java");
        assert_eq!(&*file.contents(), b"class Main {}\n");
        assert_eq!(file.total_line_count(), 1);
    }
}
