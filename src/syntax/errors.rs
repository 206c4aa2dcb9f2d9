use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("failed to set language for parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("rewrite introduces a syntax error at byte {byte_start}..{byte_end} (line {line})")]
    Introduced {
        byte_start: usize,
        byte_end: usize,
        line: usize,
    },

    #[error("rewrite introduces {count} syntax errors, first at line {first_line}")]
    IntroducedMany { count: usize, first_line: usize },
}
