//! Source text, locations and span resolution.
//!
//! Match records refer to code through [`Location`]s the front end reported,
//! which may point into macro expansions. This module owns the original text
//! of every scanned file and turns those locations into exact, file-scoped
//! byte ranges ([`SourceSpan`]) that edits can be built from.

pub mod errors;
pub mod lexer;
pub mod location;
pub mod map;
pub mod span;

pub use errors::SpanError;
pub use lexer::token_end;
pub use location::{FileLocation, Location};
pub use map::{FileId, SourceFile, SourceMap};
pub use span::{SourceSpan, SpanResolver};
