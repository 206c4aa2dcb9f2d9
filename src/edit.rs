use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The fundamental edit primitive: byte-span replacement with verification.
///
/// Every rule handler output compiles down to this. Offsets always refer to
/// the original text of the file as it was scanned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edit {
    /// Path to the file to edit
    pub file: PathBuf,
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text for [byte_start, byte_end)
    pub new_text: String,
    /// What we expect to find at the span before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (for large spans)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Before-text verification failed at {file}:{byte_start}")]
    BeforeTextMismatch {
        file: PathBuf,
        byte_start: usize,
        byte_end: usize,
        expected: String,
        found: String,
    },

    #[error("Invalid byte range: [{byte_start}, {byte_end}) in file of length {file_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        file_len: usize,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 validation error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Invalid edit would create malformed UTF-8")]
    InvalidUtf8Edit,
}

impl Edit {
    /// Create a new edit with automatic verification generation.
    pub fn new(
        file: impl Into<PathBuf>,
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: impl Into<String>,
    ) -> Self {
        let expected = expected_before.into();
        Self {
            file: file.into(),
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(&expected),
        }
    }

    /// Pure insertion of `text` at `at`.
    pub fn insertion(file: impl Into<PathBuf>, at: usize, text: impl Into<String>) -> Self {
        Self::new(file, at, at, text, "")
    }

    pub fn is_insertion(&self) -> bool {
        self.byte_start == self.byte_end
    }

    /// Whether two edits of the same file cannot both be applied.
    ///
    /// Replacements conflict when their ranges share at least one byte. An
    /// insertion conflicts with a replacement only when it lies strictly
    /// inside it, and with another insertion when both target the same
    /// offset. Insertions on a replacement's boundary are ordered around it.
    pub fn conflicts_with(&self, other: &Edit) -> bool {
        if self.file != other.file {
            return false;
        }
        match (self.is_insertion(), other.is_insertion()) {
            (true, true) => self.byte_start == other.byte_start,
            (true, false) => {
                other.byte_start < self.byte_start && self.byte_start < other.byte_end
            }
            (false, true) => {
                self.byte_start < other.byte_start && other.byte_start < self.byte_end
            }
            (false, false) => {
                self.byte_start < other.byte_end && other.byte_start < self.byte_end
            }
        }
    }

    /// Validate the edit against the current file contents.
    ///
    /// Returns the current text at [byte_start, byte_end) if validation succeeds.
    pub(crate) fn validate<'a>(&self, content: &'a [u8]) -> Result<&'a str, EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                file_len: content.len(),
            });
        }

        let current_text = std::str::from_utf8(&content[self.byte_start..self.byte_end])?;

        if !self.expected_before.matches(current_text) {
            return Err(EditError::BeforeTextMismatch {
                file: self.file.clone(),
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                expected: format!("{:?}", self.expected_before),
                found: current_text.to_string(),
            });
        }

        Ok(current_text)
    }
}

/// Splice edits into `content`.
///
/// Edits must be sorted by `(byte_start, byte_end)` ascending and pairwise
/// conflict-free; they are applied bottom-to-top so earlier offsets stay
/// valid.
pub(crate) fn splice(content: &[u8], sorted: &[Edit]) -> Result<String, EditError> {
    let mut new_content = content.to_vec();
    for edit in sorted.iter().rev() {
        new_content.splice(
            edit.byte_start..edit.byte_end,
            edit.new_text.as_bytes().iter().copied(),
        );
    }
    String::from_utf8(new_content).map_err(|_| EditError::InvalidUtf8Edit)
}

/// Atomic file write: tempfile + fsync + rename, then bump mtime so build
/// systems notice the change.
///
/// Either the full write succeeds or the original file is left untouched.
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    // Create tempfile in same directory to ensure same filesystem
    let parent = path.parent().ok_or_else(|| {
        EditError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Path has no parent directory",
        ))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    // Keep the original permissions on the rewritten file
    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;

    let now = filetime::FileTime::now();
    filetime::set_file_mtime(path, now)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_verification_exact_match() {
        let text = "hello world";
        let verify = EditVerification::ExactMatch(text.to_string());
        assert!(verify.matches(text));
        assert!(!verify.matches("hello"));
    }

    #[test]
    fn test_edit_verification_hash() {
        let text = "x".repeat(2000);
        let verify = EditVerification::from_text(&text);
        assert!(matches!(verify, EditVerification::Hash(_)));
        assert!(verify.matches(&text));
        assert!(!verify.matches("goodbye world"));
    }

    #[test]
    fn test_edit_validation_invalid_range() {
        let content = b"hello world";
        let edit = Edit::new("test.cpp", 5, 20, "replacement", "");
        assert!(matches!(
            edit.validate(content),
            Err(EditError::InvalidByteRange { .. })
        ));
    }

    #[test]
    fn test_edit_validation_inverted_range() {
        let content = b"hello world";
        let edit = Edit::new("test.cpp", 10, 5, "replacement", "");
        assert!(matches!(
            edit.validate(content),
            Err(EditError::InvalidByteRange { .. })
        ));
    }

    #[test]
    fn test_edit_validation_before_text_mismatch() {
        let content = b"hello world";
        let edit = Edit::new("test.cpp", 0, 5, "HELLO", "howdy");
        assert!(matches!(
            edit.validate(content),
            Err(EditError::BeforeTextMismatch { .. })
        ));
    }

    #[test]
    fn overlapping_replacements_conflict() {
        let a = Edit::new("f.cpp", 0, 5, "x", "hello");
        let b = Edit::new("f.cpp", 4, 8, "y", "o wo");
        let c = Edit::new("f.cpp", 5, 8, "z", " wo");
        assert!(a.conflicts_with(&b));
        assert!(!a.conflicts_with(&c));
    }

    #[test]
    fn insertions_on_boundaries_do_not_conflict() {
        let replace = Edit::new("f.cpp", 4, 10, "x", "");
        assert!(!Edit::insertion("f.cpp", 4, "#if").conflicts_with(&replace));
        assert!(!Edit::insertion("f.cpp", 10, "#endif").conflicts_with(&replace));
        assert!(Edit::insertion("f.cpp", 6, "oops").conflicts_with(&replace));
        assert!(replace.conflicts_with(&Edit::insertion("f.cpp", 6, "oops")));
    }

    #[test]
    fn insertions_at_same_offset_conflict() {
        let a = Edit::insertion("f.cpp", 3, "a");
        let b = Edit::insertion("f.cpp", 3, "b");
        assert!(a.conflicts_with(&b));
        assert!(!a.conflicts_with(&Edit::insertion("g.cpp", 3, "b")));
    }

    #[test]
    fn splice_applies_bottom_to_top() {
        let edits = vec![
            Edit::insertion("f.cpp", 0, "<"),
            Edit::new("f.cpp", 0, 5, "HELLO", "hello"),
            Edit::new("f.cpp", 6, 11, "there", "world"),
            Edit::insertion("f.cpp", 11, ">"),
        ];
        let out = splice(b"hello world", &edits).unwrap();
        assert_eq!(out, "<HELLO there>");
    }

    #[test]
    fn test_atomic_write_integration() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("test.cpp");
        fs::write(&file_path, b"original content").unwrap();

        atomic_write(&file_path, b"modified content").unwrap();

        let new_content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(new_content, "modified content");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }
}
