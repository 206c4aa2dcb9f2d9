use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A source location as reported by the semantic matcher.
///
/// File locations point directly into a file's text. Macro locations carry
/// the place the token was spelled (`spelling`) and the place the macro was
/// used (`expansion`); only the spelling is ever edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Location {
    File(FileLocation),
    Macro {
        #[serde(default)]
        spelling: Option<Box<Location>>,
        #[serde(default)]
        expansion: Option<Box<Location>>,
    },
    Invalid,
}

/// A position inside one file, either as a byte offset or as a 1-based
/// line/column pair (column counted in bytes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLocation {
    pub file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Location {
    /// Location at a byte offset of a file.
    pub fn file(path: impl Into<PathBuf>, offset: usize) -> Self {
        Location::File(FileLocation {
            file: path.into(),
            offset: Some(offset),
            line: None,
            column: None,
        })
    }

    /// Location at a 1-based line and column of a file.
    pub fn line_column(path: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Location::File(FileLocation {
            file: path.into(),
            offset: None,
            line: Some(line),
            column: Some(column),
        })
    }

    /// Location inside a macro expansion whose token is spelled at `spelling`.
    pub fn spelled_at(spelling: Location, expansion: Option<Location>) -> Self {
        Location::Macro {
            spelling: Some(Box::new(spelling)),
            expansion: expansion.map(Box::new),
        }
    }

    /// The file this location was *used* in, following expansion locations.
    ///
    /// Used for grouping work per file; never for computing edit offsets.
    pub fn usage_file(&self) -> Option<&Path> {
        match self {
            Location::File(loc) => Some(&loc.file),
            Location::Macro {
                expansion: Some(expansion),
                ..
            } => expansion.usage_file(),
            Location::Macro {
                spelling: Some(spelling),
                ..
            } => spelling.usage_file(),
            _ => None,
        }
    }
}
