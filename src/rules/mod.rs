//! Rule handlers: turn one match record into proposed edits.
//!
//! Exactly one handler is active per run. Handlers never touch the
//! filesystem; they read original text through a [`SpanResolver`] and emit
//! [`Rewrite`]s that are converted to verified [`Edit`]s here.

pub mod accessor;
pub mod escape;
pub mod guard;
pub mod remove_args;
pub mod rename_enum;
pub mod rename_method;
pub mod text;
pub mod trailing_arg;

pub use accessor::Accessor;
pub use escape::Escape;
pub use guard::DualVersionGuard;
pub use remove_args::RemoveArguments;
pub use rename_enum::RenameEnum;
pub use rename_method::RenameMethod;
pub use trailing_arg::TrailingArgument;

use crate::config::RuleConfig;
use crate::edit::Edit;
use crate::matches::{roles, MatchRecord, NodeRef, RuleFamily};
use crate::source::{SourceSpan, SpanError, SpanResolver};
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("match has no '{role}' node")]
    MissingRole { role: String },

    #[error(transparent)]
    Span(#[from] SpanError),

    #[error("'{role}' node has no source text")]
    EmptyText { role: String },

    #[error("'{needle}' does not occur in '{haystack}'")]
    MissingSubstring { needle: String, haystack: String },

    #[error("record is for rule '{found}' but the active rule is '{expected}'")]
    RuleMismatch {
        expected: RuleFamily,
        found: RuleFamily,
    },
}

/// A replacement of a resolved span. Empty spans are insertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub span: SourceSpan,
    pub replacement: String,
}

impl Rewrite {
    pub fn new(span: SourceSpan, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }

    pub fn insertion(span: SourceSpan, at: usize, text: impl Into<String>) -> Self {
        Self::new(SourceSpan::point(span.file, at), text)
    }
}

/// What a handler may look at while processing one record.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub resolver: SpanResolver<'a>,
    pub source_root: Option<&'a Path>,
}

impl<'a> RuleContext<'a> {
    pub fn new(resolver: SpanResolver<'a>) -> Self {
        Self {
            resolver,
            source_root: None,
        }
    }

    pub fn with_source_root(mut self, root: &'a Path) -> Self {
        self.source_root = Some(root);
        self
    }

    pub fn node<'r>(&self, record: &'r MatchRecord, role: &str) -> Result<&'r NodeRef, RuleError> {
        record.node(role).ok_or_else(|| RuleError::MissingRole {
            role: role.to_string(),
        })
    }

    pub fn span(&self, record: &MatchRecord, role: &str) -> Result<SourceSpan, RuleError> {
        Ok(self.resolver.resolve(self.node(record, role)?)?)
    }

    /// Span and literal text of a role; empty text is an error.
    pub fn text(&self, record: &MatchRecord, role: &str) -> Result<(SourceSpan, &'a str), RuleError> {
        let span = self.span(record, role)?;
        let text = self.resolver.text(&span);
        if text.trim().is_empty() {
            return Err(RuleError::EmptyText {
                role: role.to_string(),
            });
        }
        Ok((span, text))
    }

    /// Whether `path` lies under the source root. Without a root every path
    /// qualifies.
    pub fn is_under_source_root(&self, path: &Path) -> bool {
        let Some(root) = self.source_root else {
            return true;
        };
        if path.starts_with(root) {
            return true;
        }
        match path.canonicalize() {
            Ok(canonical) => canonical.starts_with(root),
            Err(_) => false,
        }
    }

    /// Where to report a record that could not be rewritten: its resolved
    /// call node, or else the first endpoint of that node that resolves.
    pub fn locate(&self, record: &MatchRecord) -> Option<(&'a Path, Range<usize>)> {
        let node = record
            .node(roles::CALL)
            .or_else(|| record.node(record.rule.guard_role()))?;
        let (file, range) = match self.resolver.resolve(node) {
            Ok(span) => (span.file, span.start..span.end),
            Err(_) => {
                let (file, at) = self
                    .resolver
                    .spelling(&node.begin)
                    .or_else(|_| self.resolver.spelling(&node.end))
                    .ok()?;
                (file, at..at)
            }
        };
        Some((self.resolver.file(file).path(), range))
    }

    /// Convert a rewrite to an edit that verifies the original text.
    pub fn to_edit(&self, rewrite: &Rewrite) -> Edit {
        let file = self.resolver.file(rewrite.span.file);
        Edit::new(
            file.path(),
            rewrite.span.start,
            rewrite.span.end,
            rewrite.replacement.clone(),
            self.resolver.text(&rewrite.span),
        )
    }
}

/// The active rule family with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleHandler {
    RenameMethod(RenameMethod),
    RenameEnum(RenameEnum),
    Accessor(Accessor),
    Escape(Escape),
    TrailingArgument(TrailingArgument),
    RemoveArguments(RemoveArguments),
}

impl RuleHandler {
    pub fn from_config(config: &RuleConfig) -> Self {
        match config {
            RuleConfig::RenameMethod {
                class,
                old_name,
                new_name,
            } => RuleHandler::RenameMethod(RenameMethod {
                class: class.clone(),
                old_name: old_name.clone(),
                new_name: new_name.clone(),
            }),
            RuleConfig::RenameEnum {
                scope,
                old_name,
                new_name,
            } => RuleHandler::RenameEnum(RenameEnum {
                scope: scope.clone(),
                old_name: old_name.clone(),
                new_name: new_name.clone(),
            }),
            RuleConfig::Accessor {
                accessor,
                wrap_type,
            } => RuleHandler::Accessor(Accessor {
                accessor: accessor.clone(),
                wrap_type: wrap_type.clone(),
            }),
            RuleConfig::Escape { type_name, method } => RuleHandler::Escape(Escape {
                type_name: type_name.clone(),
                method: method.clone(),
            }),
            RuleConfig::TrailingArgument {
                container,
                parameter_name,
            } => RuleHandler::TrailingArgument(TrailingArgument {
                container: container.clone(),
                parameter_name: parameter_name.clone(),
            }),
            RuleConfig::RemoveArguments => RuleHandler::RemoveArguments(RemoveArguments),
        }
    }

    pub fn family(&self) -> RuleFamily {
        match self {
            RuleHandler::RenameMethod(_) => RuleFamily::RenameMethod,
            RuleHandler::RenameEnum(_) => RuleFamily::RenameEnum,
            RuleHandler::Accessor(_) => RuleFamily::Accessor,
            RuleHandler::Escape(_) => RuleFamily::Escape,
            RuleHandler::TrailingArgument(_) => RuleFamily::TrailingArgument,
            RuleHandler::RemoveArguments(_) => RuleFamily::RemoveArguments,
        }
    }

    /// Rewrites for one record, before any guard is added.
    pub fn rewrites(
        &self,
        record: &MatchRecord,
        cx: &RuleContext<'_>,
    ) -> Result<Vec<Rewrite>, RuleError> {
        if record.rule != self.family() {
            return Err(RuleError::RuleMismatch {
                expected: self.family(),
                found: record.rule,
            });
        }
        let rewrites = match self {
            RuleHandler::RenameMethod(rule) => rule.handle(record, cx)?,
            RuleHandler::RenameEnum(rule) => rule.handle(record, cx)?,
            RuleHandler::Accessor(rule) => rule.handle(record, cx)?,
            RuleHandler::Escape(rule) => rule.handle(record, cx)?,
            RuleHandler::TrailingArgument(rule) => rule.handle(record, cx)?,
            RuleHandler::RemoveArguments(rule) => rule.handle(record, cx)?,
        };
        // A rewrite that reproduces the original text is not an edit
        Ok(rewrites
            .into_iter()
            .filter(|rw| cx.resolver.text(&rw.span) != rw.replacement)
            .collect())
    }
}

/// The active handler plus the optional dual-version guard.
#[derive(Debug, Clone)]
pub struct Rewriter {
    handler: RuleHandler,
    guard: Option<DualVersionGuard>,
}

impl Rewriter {
    pub fn new(handler: RuleHandler, guard: Option<DualVersionGuard>) -> Self {
        Self { handler, guard }
    }

    pub fn handler(&self) -> &RuleHandler {
        &self.handler
    }

    pub fn guard(&self) -> Option<&DualVersionGuard> {
        self.guard.as_ref()
    }

    /// Edits for one record plus, in guard mode, the span its guard must
    /// cover: the guard-role node together with every rewrite.
    pub fn rewrite(&self, record: &MatchRecord, cx: &RuleContext<'_>) -> Result<RecordEdits, RuleError> {
        let rewrites = self.handler.rewrites(record, cx)?;
        if rewrites.is_empty() {
            return Ok(RecordEdits::default());
        }

        let guard_region = match &self.guard {
            Some(_) => {
                let target = cx.span(record, self.handler.family().guard_role())?;
                Some(rewrites.iter().try_fold(target, |acc, rw| {
                    cx.resolver.checked_span(
                        acc.file,
                        acc.start.min(rw.span.start),
                        rw.span.file,
                        acc.end.max(rw.span.end),
                    )
                })?)
            }
            None => None,
        };

        Ok(RecordEdits {
            edits: rewrites.iter().map(|rw| cx.to_edit(rw)).collect(),
            guard_region,
        })
    }

    /// Guard directives for the regions collected over a whole scan.
    ///
    /// Regions sharing a line are merged first, so every `#if` is closed by
    /// exactly one `#endif`.
    pub fn guard_edits(&self, regions: &[SourceSpan], cx: &RuleContext<'_>) -> Vec<Edit> {
        let Some(guard) = &self.guard else {
            return Vec::new();
        };
        guard::merge_regions(regions, &cx.resolver)
            .iter()
            .flat_map(|region| guard.wrap(region, &cx.resolver))
            .map(|rw| cx.to_edit(&rw))
            .collect()
    }
}

/// What one record contributes to a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordEdits {
    pub edits: Vec<Edit>,
    /// Span the dual-version guard has to cover, in guard mode
    pub guard_region: Option<SourceSpan>,
}
