//! Post-rewrite C++ syntax checking on top of tree-sitter.
//!
//! The check is comparative: a rewrite is refused only when the parse of the
//! rewritten text has error nodes the original did not have. Preprocessor
//! heavy code rarely parses cleanly, so absolute validation is not useful.

pub mod errors;
pub mod parser;
pub mod validator;

pub use errors::SyntaxError;
pub use parser::{CppParser, ErrorNode, ParsedSource};
pub use validator::check_rewrite;
