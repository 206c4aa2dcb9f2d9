//! One porting run: load the sources records point into, run the active
//! rule over every record and collect the resulting edits.

use crate::aggregate::EditAggregator;
use crate::config::RunConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::matches::MatchRecord;
use crate::rules::{RecordEdits, RuleContext, RuleHandler, Rewriter};
use crate::source::map::normalize_path;
use crate::source::{Location, SourceMap, SourceSpan, SpanResolver};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Which usage files a run is allowed to touch.
///
/// Translation units from the compile database are in scope only when they
/// were requested; files the database does not list (headers) are always in
/// scope.
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    requested: HashSet<PathBuf>,
    database: HashSet<PathBuf>,
}

impl RequestScope {
    pub fn new(
        requested: impl IntoIterator<Item = PathBuf>,
        database: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        Self {
            requested: requested.into_iter().collect(),
            database: database.into_iter().collect(),
        }
    }

    pub fn includes(&self, file: &Path) -> bool {
        self.requested.contains(file) || !self.database.contains(file)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    rewriter: Rewriter,
    base: PathBuf,
    source_root: Option<PathBuf>,
    scope: Option<RequestScope>,
}

impl Session {
    /// `base` resolves relative paths in match records.
    pub fn new(config: &RunConfig, base: impl Into<PathBuf>) -> Self {
        Self {
            rewriter: Rewriter::new(RuleHandler::from_config(&config.rule), config.guard.clone()),
            base: normalize_path(&base.into()),
            source_root: None,
            scope: None,
        }
    }

    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    pub fn with_scope(mut self, scope: RequestScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn rewriter(&self) -> &Rewriter {
        &self.rewriter
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            normalize_path(&self.base.join(path))
        } else {
            normalize_path(path)
        }
    }

    /// Read every file any record location is spelled in.
    ///
    /// Unreadable files are reported once; records pointing into them fail
    /// span resolution later.
    pub fn load_sources(&self, records: &[MatchRecord], diagnostics: &Diagnostics) -> SourceMap {
        let mut paths = BTreeSet::new();
        for record in records {
            for node in record.nodes.values() {
                collect_spelling_files(&node.begin, &mut paths);
                collect_spelling_files(&node.end, &mut paths);
            }
        }

        let loaded: Vec<(PathBuf, std::io::Result<String>)> = paths
            .into_par_iter()
            .map(|path| {
                let absolute = self.absolute(&path);
                let text = fs::read_to_string(&absolute);
                (absolute, text)
            })
            .collect();

        let mut map = SourceMap::with_base(&self.base);
        for (path, text) in loaded {
            match text {
                Ok(text) => {
                    map.add_file(&path, text);
                }
                Err(err) => diagnostics.push(
                    Diagnostic::new(DiagnosticKind::Io, format!("cannot read source: {err}"))
                        .with_file(path),
                ),
            }
        }
        tracing::debug!(files = map.len(), "loaded sources");
        map
    }

    /// Run the active rule over all records, one unit of work per file.
    pub fn scan(
        &self,
        records: &[MatchRecord],
        sources: &SourceMap,
        diagnostics: &Diagnostics,
    ) -> EditAggregator {
        let mut groups: BTreeMap<PathBuf, Vec<&MatchRecord>> = BTreeMap::new();
        for record in records {
            match record.usage_file() {
                Some(file) => groups.entry(self.absolute(file)).or_default().push(record),
                None => diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnresolvableSpan,
                    format!("'{}' record has no file location", record.rule),
                )),
            }
        }

        if let Some(scope) = &self.scope {
            groups.retain(|file, records| {
                let keep = scope.includes(file);
                if !keep {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::NotRequested,
                            format!("{} matches skipped, file was not requested", records.len()),
                        )
                        .with_file(file.clone()),
                    );
                }
                keep
            });
        }

        let mut cx = RuleContext::new(SpanResolver::new(sources));
        if let Some(root) = &self.source_root {
            cx = cx.with_source_root(root);
        }

        let aggregator = EditAggregator::new();
        let guard_regions = Mutex::new(Vec::new());
        groups.par_iter().for_each(|(file, records)| {
            for record in records {
                if let Some(region) = self.scan_record(record, file, &cx, &aggregator, diagnostics) {
                    guard_regions.lock().push(region);
                }
            }
        });
        aggregator.extend(self.rewriter.guard_edits(&guard_regions.into_inner(), &cx));

        tracing::info!(
            files = aggregator.file_count(),
            edits = aggregator.edit_count(),
            "scan finished"
        );
        aggregator
    }

    fn scan_record(
        &self,
        record: &MatchRecord,
        file: &Path,
        cx: &RuleContext<'_>,
        aggregator: &EditAggregator,
        diagnostics: &Diagnostics,
    ) -> Option<SourceSpan> {
        let RecordEdits {
            edits,
            guard_region,
        } = match self.rewriter.rewrite(record, cx) {
            Ok(record_edits) => record_edits,
            Err(err) => {
                tracing::warn!(file = %file.display(), "skipping match: {err}");
                let diagnostic = match cx.locate(record) {
                    Some((at, range)) => Diagnostic::skipped_match(&err, at, Some(range)),
                    None => Diagnostic::skipped_match(&err, file, None),
                };
                diagnostics.push(diagnostic);
                return None;
            }
        };

        if let Some(outside) = edits.iter().find(|e| !cx.is_under_source_root(&e.file)) {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::OutsideSourceRoot,
                    "match would edit a file outside the source root",
                )
                .with_file(outside.file.clone())
                .with_range(outside.byte_start..outside.byte_end),
            );
            return None;
        }

        for edit in &edits {
            tracing::debug!(
                file = %edit.file.display(),
                start = edit.byte_start,
                end = edit.byte_end,
                "edit: {:?}",
                edit.new_text
            );
        }
        aggregator.extend(edits);
        guard_region
    }
}

fn collect_spelling_files(location: &Location, out: &mut BTreeSet<PathBuf>) {
    match location {
        Location::File(loc) => {
            out.insert(loc.file.clone());
        }
        Location::Macro {
            spelling: Some(spelling),
            ..
        } => collect_spelling_files(spelling, out),
        Location::Macro { spelling: None, .. } | Location::Invalid => {}
    }
}
