//! Structured reports of everything a run skipped or refused.
//!
//! The library never prints. Workers push into a shared [`Diagnostics`]
//! collector and the CLI renders the sorted result once the run is over.

use crate::apply::ApplyError;
use crate::rules::RuleError;
use crate::source::SpanError;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    UnresolvableSpan,
    CrossFileSpan,
    InvertedSpan,
    MissingSubstring,
    MissingRole,
    EmptyText,
    RuleMismatch,
    MalformedRecord,
    NotInCompileDatabase,
    NotRequested,
    OutsideSourceRoot,
    EditConflict,
    VerificationFailed,
    SyntaxCheckFailed,
    Io,
}

impl DiagnosticKind {
    /// Per-match problems are warnings; anything that stops a file from
    /// being written is an error.
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::NotRequested => Severity::Note,
            DiagnosticKind::EditConflict
            | DiagnosticKind::VerificationFailed
            | DiagnosticKind::SyntaxCheckFailed
            | DiagnosticKind::Io => Severity::Error,
            _ => Severity::Warning,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::UnresolvableSpan => "unresolvable-span",
            DiagnosticKind::CrossFileSpan => "cross-file-span",
            DiagnosticKind::InvertedSpan => "inverted-span",
            DiagnosticKind::MissingSubstring => "missing-substring",
            DiagnosticKind::MissingRole => "missing-role",
            DiagnosticKind::EmptyText => "empty-text",
            DiagnosticKind::RuleMismatch => "rule-mismatch",
            DiagnosticKind::MalformedRecord => "malformed-record",
            DiagnosticKind::NotInCompileDatabase => "not-in-compile-database",
            DiagnosticKind::NotRequested => "not-requested",
            DiagnosticKind::OutsideSourceRoot => "outside-source-root",
            DiagnosticKind::EditConflict => "edit-conflict",
            DiagnosticKind::VerificationFailed => "verification-failed",
            DiagnosticKind::SyntaxCheckFailed => "syntax-check-failed",
            DiagnosticKind::Io => "io",
        }
    }
}

impl From<&SpanError> for DiagnosticKind {
    fn from(err: &SpanError) -> Self {
        match err {
            SpanError::Unresolvable { .. } => DiagnosticKind::UnresolvableSpan,
            SpanError::CrossFile { .. } => DiagnosticKind::CrossFileSpan,
            SpanError::Inverted { .. } => DiagnosticKind::InvertedSpan,
        }
    }
}

impl From<&RuleError> for DiagnosticKind {
    fn from(err: &RuleError) -> Self {
        match err {
            RuleError::MissingRole { .. } => DiagnosticKind::MissingRole,
            RuleError::Span(span) => span.into(),
            RuleError::EmptyText { .. } => DiagnosticKind::EmptyText,
            RuleError::MissingSubstring { .. } => DiagnosticKind::MissingSubstring,
            RuleError::RuleMismatch { .. } => DiagnosticKind::RuleMismatch,
        }
    }
}

impl From<&ApplyError> for DiagnosticKind {
    fn from(err: &ApplyError) -> Self {
        match err {
            ApplyError::Conflict { .. } => DiagnosticKind::EditConflict,
            ApplyError::Edit { .. } => DiagnosticKind::VerificationFailed,
            ApplyError::Syntax { .. } => DiagnosticKind::SyntaxCheckFailed,
            ApplyError::Safety { .. } => DiagnosticKind::OutsideSourceRoot,
            ApplyError::Io { .. } => DiagnosticKind::Io,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range<usize>>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            file: None,
            range: None,
            message: message.into(),
        }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_range(mut self, range: Range<usize>) -> Self {
        self.range = Some(range);
        self
    }

    /// A skipped match at `range` of `file`, when the record could be
    /// located at all.
    pub fn skipped_match(err: &RuleError, file: &Path, range: Option<Range<usize>>) -> Self {
        let diagnostic = Self::new(err.into(), err.to_string()).with_file(file);
        match range {
            Some(range) => diagnostic.with_range(range),
            None => diagnostic,
        }
    }

    /// A file that was not written.
    pub fn failed_file(err: &ApplyError) -> Self {
        let diagnostic = Self::new(err.into(), err.to_string()).with_file(err.file());
        match err {
            ApplyError::Conflict { first, .. } => diagnostic.with_range(first.clone()),
            _ => diagnostic,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.severity, self.kind.name())?;
        if let Some(file) = &self.file {
            write!(f, " {}", file.display())?;
            if let Some(range) = &self.range {
                write!(f, ":{}..{}", range.start, range.end)?;
            }
        }
        write!(f, ": {}", self.message)
    }
}

/// Thread-safe collector.
#[derive(Debug, Default)]
pub struct Diagnostics {
    inner: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::warn!(kind = diagnostic.kind.name(), "{}", diagnostic.message),
            _ => tracing::debug!(kind = diagnostic.kind.name(), "{}", diagnostic.message),
        }
        self.inner.lock().push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.inner.lock().iter().filter(|d| d.kind == kind).count()
    }

    pub fn has_errors(&self) -> bool {
        self.inner
            .lock()
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// All diagnostics ordered by file, then position, then kind.
    pub fn into_sorted(self) -> Vec<Diagnostic> {
        let mut all = self.inner.into_inner();
        all.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then_with(|| {
                    let start = |d: &Diagnostic| d.range.as_ref().map(|r| r.start);
                    start(a).cmp(&start(b))
                })
                .then_with(|| a.kind.name().cmp(b.kind.name()))
                .then_with(|| a.message.cmp(&b.message))
        });
        all
    }
}
