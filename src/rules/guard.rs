use crate::config::version::{guard_condition, GuardMacros};
use crate::rules::Rewrite;
use crate::source::{SourceSpan, SpanResolver};
use semver::Version;

/// Builds the `#if <old> ... #else ... #endif` region around rewritten lines.
///
/// The opening insertion carries a verbatim copy of the original lines as the
/// old-version branch; the rewritten lines that follow it in the file become
/// the new-version branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualVersionGuard {
    condition: String,
}

impl DualVersionGuard {
    pub fn new(condition: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
        }
    }

    /// Guard selecting the old branch below `version`.
    pub fn for_version(version: &Version, macros: &GuardMacros) -> Self {
        Self::new(guard_condition(version, macros))
    }

    pub fn condition(&self) -> &str {
        &self.condition
    }

    /// Opening and closing insertions for the lines covering `target`.
    pub fn wrap(&self, target: &SourceSpan, resolver: &SpanResolver<'_>) -> [Rewrite; 2] {
        let lines = resolver.line_bounds(target);
        let original = resolver.text(&lines);
        [
            Rewrite::insertion(
                lines,
                lines.start,
                format!("#if {}\n{}\n#else\n", self.condition, original),
            ),
            Rewrite::insertion(lines, lines.end, "\n#endif"),
        ]
    }
}

/// Widen every region to whole lines and merge the ones that share a line.
///
/// Each merged region gets one `#if`/`#else`/`#endif`; guards of separate
/// matches on a common line would otherwise nest inside each other's
/// new-version branch.
pub fn merge_regions(regions: &[SourceSpan], resolver: &SpanResolver<'_>) -> Vec<SourceSpan> {
    let mut lines: Vec<SourceSpan> = regions.iter().map(|r| resolver.line_bounds(r)).collect();
    lines.sort();

    let mut merged: Vec<SourceSpan> = Vec::with_capacity(lines.len());
    for region in lines {
        match merged.last_mut() {
            Some(last) if last.file == region.file && region.start <= last.end => {
                last.end = last.end.max(region.end);
            }
            _ => merged.push(region),
        }
    }
    merged
}

impl Default for DualVersionGuard {
    fn default() -> Self {
        Self::for_version(&Version::new(5, 0, 0), &GuardMacros::default())
    }
}
