use crate::pool::with_parser;
use crate::syntax::errors::SyntaxError;
use crate::syntax::parser::ErrorNode;

/// Check that `rewritten` does not have more syntax errors than `original`.
///
/// Error nodes shift around when text is inserted, so the comparison is by
/// count rather than by position.
pub fn check_rewrite(original: &str, rewritten: &str) -> Result<(), SyntaxError> {
    let (before, after) = with_parser(|parser| -> Result<_, SyntaxError> {
        let before = parser.parse_with_source(original)?.error_nodes();
        let after = parser.parse_with_source(rewritten)?.error_nodes();
        Ok((before, after))
    })??;

    if after.len() <= before.len() {
        return Ok(());
    }

    // Report the first error that has no counterpart at the same position
    let introduced: Vec<&ErrorNode> = after
        .iter()
        .filter(|e| {
            !before
                .iter()
                .any(|o| o.byte_start == e.byte_start && o.byte_end == e.byte_end)
        })
        .collect();
    let first = introduced.first().copied().unwrap_or(&after[0]);
    let count = after.len() - before.len();
    if count == 1 {
        Err(SyntaxError::Introduced {
            byte_start: first.byte_start,
            byte_end: first.byte_end,
            line: first.line(),
        })
    } else {
        Err(SyntaxError::IntroducedMany {
            count,
            first_line: first.line(),
        })
    }
}
