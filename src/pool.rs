//! Thread-local parser pooling.
//!
//! Files are checked on rayon worker threads; each thread builds one C++
//! parser on first use and reuses it for every later file.

use crate::syntax::{CppParser, SyntaxError};
use std::cell::RefCell;

thread_local! {
    static CPP_PARSER: RefCell<Option<CppParser>> = const { RefCell::new(None) };
}

/// Execute function with pooled parser instance.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use qt_porter::pool::with_parser;
///
/// let clean = with_parser(|parser| {
///     parser.parse_with_source("int main() {}").map(|p| !p.has_errors())
/// })??;
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, SyntaxError>
where
    F: FnOnce(&mut CppParser) -> R,
{
    CPP_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        let parser = match slot.take() {
            Some(parser) => parser,
            None => CppParser::new()?,
        };
        Ok(f(slot.insert(parser)))
    })
}
