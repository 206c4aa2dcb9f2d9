//! Materialize aggregated edits: one synchronous pass per file.
//!
//! For each [`FileEditSet`] the applier drops exact duplicates, orders the
//! edits, refuses conflicting sets outright, verifies every edit against the
//! text on disk, splices bottom-to-top and (optionally) re-parses the result
//! before writing it atomically.

use crate::aggregate::FileEditSet;
use crate::edit::{atomic_write, splice, Edit, EditError};
use crate::safety::{SafetyError, SourceRootGuard};
use crate::syntax::{check_rewrite, SyntaxError};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyMode {
    /// Rewrite files in place
    #[default]
    Write,
    /// Compute the result without writing
    DryRun,
    /// Compute the result and hand out the edit list instead of writing
    Export,
}

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("conflicting edits in {file}: {first:?} and {second:?}")]
    Conflict {
        file: PathBuf,
        first: Range<usize>,
        second: Range<usize>,
    },

    #[error("edit rejected in {file}: {source}")]
    Edit {
        file: PathBuf,
        #[source]
        source: EditError,
    },

    #[error("syntax check failed for {file}: {source}")]
    Syntax {
        file: PathBuf,
        #[source]
        source: SyntaxError,
    },

    #[error("refusing to write {file}: {source}")]
    Safety {
        file: PathBuf,
        #[source]
        source: SafetyError,
    },

    #[error("failed to read {file}: {source}")]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApplyError {
    pub fn file(&self) -> &Path {
        match self {
            ApplyError::Conflict { file, .. }
            | ApplyError::Edit { file, .. }
            | ApplyError::Syntax { file, .. }
            | ApplyError::Safety { file, .. }
            | ApplyError::Io { file, .. } => file,
        }
    }
}

/// Outcome of applying one file's edits.
#[derive(Debug, Clone)]
pub struct FileRewrite {
    pub file: PathBuf,
    pub original: String,
    pub rewritten: String,
    /// Deduplicated edits in ascending offset order
    pub edits: Vec<Edit>,
    pub written: bool,
}

impl FileRewrite {
    pub fn changed(&self) -> bool {
        self.original != self.rewritten
    }

    pub fn exported(&self) -> Vec<ExportedEdit> {
        self.edits.iter().map(ExportedEdit::from).collect()
    }
}

/// One edit in the shape an external apply step consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedEdit {
    pub file: PathBuf,
    pub offset: usize,
    pub length: usize,
    pub replacement: String,
}

impl From<&Edit> for ExportedEdit {
    fn from(edit: &Edit) -> Self {
        Self {
            file: edit.file.clone(),
            offset: edit.byte_start,
            length: edit.byte_end - edit.byte_start,
            replacement: edit.new_text.clone(),
        }
    }
}

/// Deduplicate, sort and conflict-check the edits of one file.
///
/// The result is ordered by `(start, end)`, so insertions at an offset come
/// before a replacement starting there and after one ending there.
pub fn normalize(file: &Path, mut edits: Vec<Edit>) -> Result<Vec<Edit>, ApplyError> {
    edits.sort_by(|a, b| {
        (a.byte_start, a.byte_end, &a.new_text).cmp(&(b.byte_start, b.byte_end, &b.new_text))
    });
    edits.dedup_by(|a, b| {
        a.byte_start == b.byte_start && a.byte_end == b.byte_end && a.new_text == b.new_text
    });

    for (i, first) in edits.iter().enumerate() {
        for second in &edits[i + 1..] {
            let past = if first.is_insertion() {
                second.byte_start > first.byte_start
            } else {
                second.byte_start >= first.byte_end
            };
            if past {
                break;
            }
            if first.conflicts_with(second) {
                return Err(ApplyError::Conflict {
                    file: file.to_path_buf(),
                    first: first.byte_start..first.byte_end,
                    second: second.byte_start..second.byte_end,
                });
            }
        }
    }

    Ok(edits)
}

/// Verify normalized edits against `content` and splice them in.
pub fn rewrite_text(content: &str, edits: &[Edit]) -> Result<String, EditError> {
    for edit in edits {
        edit.validate(content.as_bytes())?;
    }
    splice(content.as_bytes(), edits)
}

#[derive(Debug, Clone, Default)]
pub struct EditApplier {
    mode: ApplyMode,
    check_syntax: bool,
    guard: Option<SourceRootGuard>,
}

impl EditApplier {
    pub fn new(mode: ApplyMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_syntax_check(mut self, enabled: bool) -> Self {
        self.check_syntax = enabled;
        self
    }

    pub fn with_guard(mut self, guard: SourceRootGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn mode(&self) -> ApplyMode {
        self.mode
    }

    /// Apply one file's edits. Any failure leaves the file untouched.
    pub fn apply(&self, set: FileEditSet) -> Result<FileRewrite, ApplyError> {
        let FileEditSet { file, edits } = set;

        let target = match &self.guard {
            Some(guard) => guard
                .validate_path(&file)
                .map_err(|source| ApplyError::Safety {
                    file: file.clone(),
                    source,
                })?,
            None => file.clone(),
        };

        let edits = normalize(&file, edits)?;
        let original = fs::read_to_string(&target).map_err(|source| ApplyError::Io {
            file: file.clone(),
            source,
        })?;
        let rewritten = rewrite_text(&original, &edits).map_err(|source| ApplyError::Edit {
            file: file.clone(),
            source,
        })?;

        if self.check_syntax {
            check_rewrite(&original, &rewritten).map_err(|source| ApplyError::Syntax {
                file: file.clone(),
                source,
            })?;
        }

        let mut written = false;
        if self.mode == ApplyMode::Write && rewritten != original {
            if let Some(guard) = &self.guard {
                guard
                    .revalidate(&target)
                    .map_err(|source| ApplyError::Safety {
                        file: file.clone(),
                        source,
                    })?;
            }
            atomic_write(&target, rewritten.as_bytes()).map_err(|source| ApplyError::Edit {
                file: file.clone(),
                source,
            })?;
            written = true;
            tracing::info!(file = %file.display(), edits = edits.len(), "rewrote file");
        }

        Ok(FileRewrite {
            file,
            original,
            rewritten,
            edits,
            written,
        })
    }

    /// Apply every file in parallel. Results come back in input order.
    pub fn apply_all(&self, sets: Vec<FileEditSet>) -> Vec<Result<FileRewrite, ApplyError>> {
        sets.into_par_iter()
            .map(|set| {
                self.apply(set).inspect_err(|err| {
                    tracing::warn!(file = %err.file().display(), "file not rewritten: {err}");
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(file: &Path, edits: Vec<Edit>) -> FileEditSet {
        FileEditSet {
            file: file.to_path_buf(),
            edits,
        }
    }

    #[test]
    fn duplicates_are_dropped() {
        let edits = vec![
            Edit::new("a.cpp", 0, 3, "xyz", "abc"),
            Edit::new("a.cpp", 0, 3, "xyz", "abc"),
        ];
        assert_eq!(normalize(Path::new("a.cpp"), edits).unwrap().len(), 1);
    }

    #[test]
    fn different_replacements_of_same_range_conflict() {
        let edits = vec![
            Edit::new("a.cpp", 0, 3, "xyz", "abc"),
            Edit::new("a.cpp", 0, 3, "uvw", "abc"),
        ];
        assert!(matches!(
            normalize(Path::new("a.cpp"), edits),
            Err(ApplyError::Conflict { .. })
        ));
    }

    #[test]
    fn insertion_inside_a_later_replacement_is_found() {
        let edits = vec![
            Edit::new("a.cpp", 0, 20, "long", ""),
            Edit::new("a.cpp", 2, 4, "x", ""),
            Edit::insertion("a.cpp", 15, "y"),
        ];
        let err = normalize(Path::new("a.cpp"), edits).unwrap_err();
        assert!(matches!(err, ApplyError::Conflict { first, .. } if first == (0..20)));
    }

    #[test]
    fn boundary_insertions_wrap_replacement() {
        let edits = vec![
            Edit::insertion("a.cpp", 11, "]"),
            Edit::new("a.cpp", 6, 11, "there", "world"),
            Edit::insertion("a.cpp", 6, "["),
        ];
        let edits = normalize(Path::new("a.cpp"), edits).unwrap();
        assert_eq!(rewrite_text("hello world", &edits).unwrap(), "hello [there]");
    }

    #[test]
    fn stale_edit_is_rejected() {
        let edits = vec![Edit::new("a.cpp", 0, 5, "HELLO", "howdy")];
        assert!(matches!(
            rewrite_text("hello world", &edits),
            Err(EditError::BeforeTextMismatch { .. })
        ));
    }

    #[test]
    fn write_mode_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.cpp");
        fs::write(&file, "int v = counter;\n").unwrap();

        let applier = EditApplier::new(ApplyMode::Write)
            .with_guard(SourceRootGuard::new(dir.path()).unwrap());
        let result = applier
            .apply(set(
                &file,
                vec![Edit::new(&file, 8, 15, "counter.load()", "counter")],
            ))
            .unwrap();
        assert!(result.written);
        assert_eq!(fs::read_to_string(&file).unwrap(), "int v = counter.load();\n");
    }

    #[test]
    fn dry_run_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.cpp");
        fs::write(&file, "int v = counter;\n").unwrap();

        let result = EditApplier::new(ApplyMode::DryRun)
            .apply(set(
                &file,
                vec![Edit::new(&file, 8, 15, "counter.load()", "counter")],
            ))
            .unwrap();
        assert!(!result.written);
        assert!(result.changed());
        assert_eq!(fs::read_to_string(&file).unwrap(), "int v = counter;\n");
        assert_eq!(
            result.exported(),
            vec![ExportedEdit {
                file: file.clone(),
                offset: 8,
                length: 7,
                replacement: "counter.load()".into(),
            }]
        );
    }

    #[test]
    fn conflicting_file_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.cpp");
        fs::write(&file, "f(a, b);\n").unwrap();

        let result = EditApplier::new(ApplyMode::Write).apply(set(
            &file,
            vec![
                Edit::new(&file, 0, 4, "g(a", "f(a,"),
                Edit::new(&file, 2, 6, "x", "a, b"),
            ],
        ));
        assert!(matches!(result, Err(ApplyError::Conflict { .. })));
        assert_eq!(fs::read_to_string(&file).unwrap(), "f(a, b);\n");
    }

    #[test]
    fn syntax_check_refuses_broken_output() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.cpp");
        fs::write(&file, "void f() { g(a, b); }\n").unwrap();

        let result = EditApplier::new(ApplyMode::Write)
            .with_syntax_check(true)
            .apply(set(&file, vec![Edit::new(&file, 13, 14, "(", "a")]));
        assert!(matches!(result, Err(ApplyError::Syntax { .. })));
        assert_eq!(fs::read_to_string(&file).unwrap(), "void f() { g(a, b); }\n");
    }
}
