use crate::matches::NodeRef;
use crate::source::errors::SpanError;
use crate::source::lexer::token_end;
use crate::source::location::{FileLocation, Location};
use crate::source::map::{FileId, SourceFile, SourceMap};

/// A resolved, file-scoped half-open byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceSpan {
    pub file: FileId,
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    /// Returns `None` when `end` precedes `start`.
    pub fn new(file: FileId, start: usize, end: usize) -> Option<Self> {
        (start <= end).then_some(Self { file, start, end })
    }

    /// Zero-length span used for insertions.
    pub fn point(file: FileId, at: usize) -> Self {
        Self {
            file,
            start: at,
            end: at,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Resolves matcher locations against the original text in a [`SourceMap`].
#[derive(Debug, Clone, Copy)]
pub struct SpanResolver<'a> {
    map: &'a SourceMap,
}

impl<'a> SpanResolver<'a> {
    pub fn new(map: &'a SourceMap) -> Self {
        Self { map }
    }

    pub fn source_map(&self) -> &'a SourceMap {
        self.map
    }

    pub fn file(&self, id: FileId) -> &'a SourceFile {
        self.map.file(id)
    }

    /// Resolve a location to the file and offset where its token is spelled.
    pub fn spelling(&self, location: &Location) -> Result<(FileId, usize), SpanError> {
        match location {
            Location::File(file_loc) => self.resolve_file_location(file_loc),
            Location::Macro {
                spelling: Some(spelling),
                ..
            } => self.spelling(spelling),
            Location::Macro { spelling: None, .. } => Err(SpanError::unresolvable(
                "macro location without a spelling location",
            )),
            Location::Invalid => Err(SpanError::unresolvable("invalid location")),
        }
    }

    fn resolve_file_location(&self, loc: &FileLocation) -> Result<(FileId, usize), SpanError> {
        let id = self.map.lookup(&loc.file).ok_or_else(|| {
            SpanError::unresolvable(format!("{} is not a scanned file", loc.file.display()))
        })?;
        let file = self.map.file(id);
        let offset = match (loc.offset, loc.line, loc.column) {
            (Some(offset), _, _) => offset,
            (None, Some(line), Some(column)) => file.offset_of(line, column).ok_or_else(|| {
                SpanError::unresolvable(format!(
                    "{}:{line}:{column} is outside the file",
                    loc.file.display()
                ))
            })?,
            _ => {
                return Err(SpanError::unresolvable(format!(
                    "location in {} has neither an offset nor a line and column",
                    loc.file.display()
                )))
            }
        };
        if offset > file.len() || !file.text().is_char_boundary(offset) {
            return Err(SpanError::unresolvable(format!(
                "offset {offset} is not a character position in {}",
                loc.file.display()
            )));
        }
        Ok((id, offset))
    }

    /// Resolve a location and move it past the token that starts there.
    pub fn end_of_token(&self, location: &Location) -> Result<(FileId, usize), SpanError> {
        let (file, offset) = self.spelling(location)?;
        Ok((file, token_end(self.map.file(file).text(), offset)))
    }

    /// Resolve a matched node to the exact byte range of its spelling,
    /// including the whole of its last token.
    pub fn resolve(&self, node: &NodeRef) -> Result<SourceSpan, SpanError> {
        let (start_file, start) = self.spelling(&node.begin)?;
        let (end_file, end) = self.end_of_token(&node.end)?;
        self.checked_span(start_file, start, end_file, end)
    }

    /// Build a span from two resolved endpoints, rejecting spans that cross
    /// files or run backwards.
    pub fn checked_span(
        &self,
        start_file: FileId,
        start: usize,
        end_file: FileId,
        end: usize,
    ) -> Result<SourceSpan, SpanError> {
        if start_file != end_file {
            return Err(SpanError::CrossFile {
                start_file: self.map.file(start_file).path().to_path_buf(),
                end_file: self.map.file(end_file).path().to_path_buf(),
            });
        }
        SourceSpan::new(start_file, start, end).ok_or_else(|| SpanError::Inverted {
            file: self.map.file(start_file).path().to_path_buf(),
            start,
            end,
        })
    }

    pub fn text(&self, span: &SourceSpan) -> &'a str {
        &self.map.file(span.file).text()[span.start..span.end]
    }

    /// Literal text of a matched node.
    pub fn text_of(&self, node: &NodeRef) -> Result<&'a str, SpanError> {
        let span = self.resolve(node)?;
        Ok(self.text(&span))
    }

    /// Widen a span to whole lines: from the start of its first line to the
    /// newline ending its last line (exclusive), or the end of file.
    pub fn line_bounds(&self, span: &SourceSpan) -> SourceSpan {
        let file = self.map.file(span.file);
        SourceSpan {
            file: span.file,
            start: file.line_start(span.start),
            end: file.line_end(span.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(begin: Location, end: Location) -> NodeRef {
        NodeRef { begin, end }
    }

    fn map_with(text: &str) -> SourceMap {
        let mut map = SourceMap::new();
        map.add_file("a.cpp", text);
        map
    }

    #[test]
    fn resolve_extends_to_end_of_last_token() {
        let map = map_with("x = isNull(s.toString());\n");
        let resolver = SpanResolver::new(&map);
        // end location points at the start of the final ')'
        let call = node(Location::file("a.cpp", 4), Location::file("a.cpp", 23));
        assert_eq!(resolver.text_of(&call).unwrap(), "isNull(s.toString())");
    }

    #[test]
    fn resolve_follows_macro_spelling() {
        let mut map = map_with("#define CALL f(x)\nint y = CALL;\n");
        map.add_file("b.cpp", "unused");
        let resolver = SpanResolver::new(&map);
        let begin = Location::spelled_at(
            Location::file("a.cpp", 13),
            Some(Location::file("a.cpp", 26)),
        );
        let end = Location::spelled_at(Location::file("a.cpp", 16), None);
        assert_eq!(resolver.text_of(&node(begin, end)).unwrap(), "f(x)");
    }

    #[test]
    fn line_column_locations_resolve() {
        let map = map_with("int a;\nfoo(bar);\n");
        let resolver = SpanResolver::new(&map);
        let call = node(
            Location::line_column("a.cpp", 2, 1),
            Location::line_column("a.cpp", 2, 8),
        );
        assert_eq!(resolver.text_of(&call).unwrap(), "foo(bar)");
    }

    #[test]
    fn macro_without_spelling_is_unresolvable() {
        let map = map_with("f();");
        let resolver = SpanResolver::new(&map);
        let call = node(
            Location::Macro {
                spelling: None,
                expansion: Some(Box::new(Location::file("a.cpp", 0))),
            },
            Location::file("a.cpp", 2),
        );
        assert!(matches!(
            resolver.resolve(&call),
            Err(SpanError::Unresolvable { .. })
        ));
    }

    #[test]
    fn unknown_file_is_unresolvable() {
        let map = map_with("f();");
        let resolver = SpanResolver::new(&map);
        let call = node(Location::file("other.cpp", 0), Location::file("a.cpp", 2));
        assert!(matches!(
            resolver.resolve(&call),
            Err(SpanError::Unresolvable { .. })
        ));
    }

    #[test]
    fn offset_past_end_is_unresolvable() {
        let map = map_with("f();");
        let resolver = SpanResolver::new(&map);
        let call = node(Location::file("a.cpp", 0), Location::file("a.cpp", 99));
        assert!(matches!(
            resolver.resolve(&call),
            Err(SpanError::Unresolvable { .. })
        ));
    }

    #[test]
    fn cross_file_span_is_rejected() {
        let mut map = map_with("f(x);");
        map.add_file("m.h", "#define X x\n");
        let resolver = SpanResolver::new(&map);
        let call = node(Location::file("a.cpp", 0), Location::file("m.h", 10));
        assert!(matches!(
            resolver.resolve(&call),
            Err(SpanError::CrossFile { .. })
        ));
    }

    #[test]
    fn inverted_span_is_rejected() {
        let map = map_with("first(); second();");
        let resolver = SpanResolver::new(&map);
        let call = node(Location::file("a.cpp", 9), Location::file("a.cpp", 0));
        assert!(matches!(
            resolver.resolve(&call),
            Err(SpanError::Inverted {
                start: 9,
                end: 5,
                ..
            })
        ));
    }

    #[test]
    fn line_bounds_cover_whole_lines() {
        let map = map_with("int a;\n  if (s.isNull()) {\nreturn;\n");
        let resolver = SpanResolver::new(&map);
        let span = SourceSpan::new(map.lookup("a.cpp".as_ref()).unwrap(), 13, 23).unwrap();
        let lines = resolver.line_bounds(&span);
        assert_eq!(resolver.text(&lines), "  if (s.isNull()) {");
    }

    #[test]
    fn line_bounds_at_end_of_file_without_newline() {
        let map = map_with("a();\nb()");
        let resolver = SpanResolver::new(&map);
        let span = SourceSpan::new(map.lookup("a.cpp".as_ref()).unwrap(), 5, 8).unwrap();
        assert_eq!(resolver.text(&resolver.line_bounds(&span)), "b()");
    }
}
