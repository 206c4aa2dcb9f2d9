use crate::syntax::errors::SyntaxError;
use ast_grep_language::{LanguageExt, SupportLang};
use tree_sitter::{Parser, Tree};

/// Tree-sitter parser wrapper for C++ source code.
pub struct CppParser {
    parser: Parser,
}

impl CppParser {
    pub fn new() -> Result<Self, SyntaxError> {
        let mut parser = Parser::new();
        let ts_lang = SupportLang::Cpp.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| SyntaxError::LanguageSet)?;
        Ok(Self { parser })
    }

    /// Parse source code into a tree-sitter Tree.
    pub fn parse(&mut self, source: &str) -> Result<Tree, SyntaxError> {
        self.parser
            .parse(source, None)
            .ok_or(SyntaxError::ParseFailed)
    }

    /// Parse source code and return the tree along with the source.
    pub fn parse_with_source<'a>(
        &mut self,
        source: &'a str,
    ) -> Result<ParsedSource<'a>, SyntaxError> {
        let tree = self.parse(source)?;
        Ok(ParsedSource { source, tree })
    }
}

/// A parsed source file with its tree-sitter tree.
pub struct ParsedSource<'a> {
    pub source: &'a str,
    pub tree: Tree,
}

impl<'a> ParsedSource<'a> {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// All ERROR and MISSING nodes, in document order.
    pub fn error_nodes(&self) -> Vec<ErrorNode> {
        let mut errors = Vec::new();
        collect_error_nodes(self.tree.root_node(), &mut errors);
        errors
    }
}

/// Information about an ERROR or MISSING node in the parse tree.
#[derive(Debug, Clone)]
pub struct ErrorNode {
    pub byte_start: usize,
    pub byte_end: usize,
    pub start_point: tree_sitter::Point,
}

impl ErrorNode {
    /// 1-based line of the node start.
    pub fn line(&self) -> usize {
        self.start_point.row + 1
    }
}

fn collect_error_nodes(node: tree_sitter::Node<'_>, errors: &mut Vec<ErrorNode>) {
    if node.is_error() || node.is_missing() {
        errors.push(ErrorNode {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            start_point: node.start_position(),
        });
    }

    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_cpp() {
        let mut parser = CppParser::new().unwrap();
        let parsed = parser
            .parse_with_source("int main() { return isNull(s.toString()); }")
            .unwrap();
        assert!(!parsed.has_errors());
        assert_eq!(parsed.root_node().kind(), "translation_unit");
    }

    #[test]
    fn parse_invalid_cpp() {
        let mut parser = CppParser::new().unwrap();
        let parsed = parser.parse_with_source("int main( { return; }").unwrap();
        assert!(parsed.has_errors());
        assert!(!parsed.error_nodes().is_empty());
    }
}
