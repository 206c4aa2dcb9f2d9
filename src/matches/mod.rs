//! Match records reported by the semantic matcher.
//!
//! The matcher runs outside this crate and streams one JSON object per line.
//! Each record names the rule family it was generated for and binds role
//! names to located nodes.

pub mod record;
pub mod stream;

pub use record::{roles, MatchFacts, MatchRecord, NodeRef, RuleFamily};
pub use stream::{load_records, read_records, MatchStream, MatchStreamError, RejectedLine};
