use crate::matches::record::MatchRecord;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchStreamError {
    #[error("failed to read match stream {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A line of the stream that could not be parsed as a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    /// 1-based line number
    pub line: usize,
    pub message: String,
}

/// Records in stream order plus the lines that were rejected.
#[derive(Debug, Default)]
pub struct MatchStream {
    pub records: Vec<MatchRecord>,
    pub rejected: Vec<RejectedLine>,
}

/// Parse a JSON-lines match stream. Blank lines are ignored; malformed lines
/// are collected, not fatal.
pub fn read_records<R: BufRead>(reader: R) -> io::Result<MatchStream> {
    let mut stream = MatchStream::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<MatchRecord>(trimmed) {
            Ok(record) => stream.records.push(record),
            Err(err) => stream.rejected.push(RejectedLine {
                line: idx + 1,
                message: err.to_string(),
            }),
        }
    }

    Ok(stream)
}

/// Load a match stream from a file, or from standard input for `-`.
pub fn load_records(path: impl AsRef<Path>) -> Result<MatchStream, MatchStreamError> {
    let path = path.as_ref();
    let wrap = |source| MatchStreamError::Io {
        path: path.to_path_buf(),
        source,
    };

    if path == Path::new("-") {
        let stdin = io::stdin();
        return read_records(stdin.lock()).map_err(wrap);
    }

    let file = File::open(path).map_err(wrap)?;
    read_records(BufReader::new(file)).map_err(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::record::RuleFamily;

    #[test]
    fn parse_empty_stream() {
        let stream = read_records("".as_bytes()).unwrap();
        assert!(stream.records.is_empty());
        assert!(stream.rejected.is_empty());
    }

    #[test]
    fn malformed_lines_are_collected() {
        let input = "\n{\"rule\":\"accessor\"}\nnot json\n{\"rule\":\"unknown-rule\"}\n";
        let stream = read_records(input.as_bytes()).unwrap();
        assert_eq!(stream.records.len(), 1);
        assert_eq!(stream.records[0].rule, RuleFamily::Accessor);
        let lines: Vec<usize> = stream.rejected.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![3, 4]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_records(dir.path().join("missing.jsonl"));
        assert!(matches!(result, Err(MatchStreamError::Io { .. })));
    }
}
