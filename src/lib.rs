//! qt-porter: Qt4 to Qt5 source rewriting for C++ projects
//!
//! A semantic matcher reports every occurrence of a Qt4 idiom as a match
//! record. This crate turns those records into verified byte-span edits and
//! applies them to the project's sources.
//!
//! # Architecture
//!
//! All rewrites compile down to a single primitive: [`Edit`], a verified
//! byte-span replacement. The intelligence lives in span acquisition
//! ([`source::SpanResolver`] follows macro spellings to exact byte ranges)
//! and in the six rule families of [`rules`], not in the application logic.
//! Edits from all workers meet in an [`EditAggregator`] and are materialized
//! by an [`EditApplier`] in one synchronous pass per file.
//!
//! # Safety
//!
//! - Every edit verifies its expected before-text before applying
//! - Conflicting edits reject the whole file
//! - Atomic file writes (tempfile + fsync + rename)
//! - Writes are confined to the source root, never the build directory
//! - Optional re-parse of the result with tree-sitter
//!
//! # Example
//!
//! ```no_run
//! use qt_porter::config::Preset;
//! use qt_porter::{ApplyMode, Diagnostics, EditApplier, RunConfig, Session};
//!
//! let config = RunConfig { rule: Preset::Atomics.rule(), guard: None };
//! let stream = qt_porter::matches::load_records("matches.jsonl").unwrap();
//!
//! let diagnostics = Diagnostics::new();
//! let session = Session::new(&config, std::env::current_dir().unwrap());
//! let sources = session.load_sources(&stream.records, &diagnostics);
//! let edits = session.scan(&stream.records, &sources, &diagnostics);
//!
//! let applier = EditApplier::new(ApplyMode::DryRun);
//! for result in applier.apply_all(edits.into_file_sets()) {
//!     match result {
//!         Ok(rewrite) => println!("{}: {} edits", rewrite.file.display(), rewrite.edits.len()),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! ```

pub mod aggregate;
pub mod apply;
pub mod compile_db;
pub mod config;
pub mod diagnostics;
pub mod edit;
pub mod matches;
pub mod pool;
pub mod rules;
pub mod safety;
pub mod session;
pub mod source;
pub mod syntax;

// Re-exports
pub use aggregate::{EditAggregator, FileEditSet};
pub use apply::{ApplyError, ApplyMode, EditApplier, ExportedEdit, FileRewrite};
pub use compile_db::{CompilationDatabase, CompileDbError, FileLookup};
pub use config::{
    load_from_path, load_from_str, ConfigError, Preset, RuleConfig, RuleFile, RunConfig,
    ValidationError,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use edit::{Edit, EditError, EditVerification};
pub use matches::{MatchRecord, MatchStream, MatchStreamError, RuleFamily};
pub use rules::{DualVersionGuard, RecordEdits, RuleError, RuleHandler, Rewriter};
pub use safety::{SafetyError, SourceRootGuard};
pub use session::{RequestScope, Session};
pub use source::{SourceMap, SpanError, SpanResolver};
pub use syntax::SyntaxError;
