use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpanError {
    #[error("unresolvable location: {reason}")]
    Unresolvable { reason: String },

    #[error("span starts in {start_file} but ends in {end_file}")]
    CrossFile {
        start_file: PathBuf,
        end_file: PathBuf,
    },

    #[error("span end {end} precedes start {start} in {file}")]
    Inverted {
        file: PathBuf,
        start: usize,
        end: usize,
    },
}

impl SpanError {
    pub(crate) fn unresolvable(reason: impl Into<String>) -> Self {
        SpanError::Unresolvable {
            reason: reason.into(),
        }
    }
}
