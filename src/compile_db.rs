//! `compile_commands.json` loading and requested-file resolution.

use crate::source::map::normalize_path;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub const DATABASE_FILE: &str = "compile_commands.json";

#[derive(Error, Debug)]
pub enum CompileDbError {
    #[error("no compile_commands.json in {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} contains no compile commands")]
    Empty(PathBuf),
}

/// One entry of the database.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CompileCommand {
    pub directory: PathBuf,
    pub file: PathBuf,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl CompileCommand {
    /// Absolute, normalized path of the translation unit.
    pub fn source_path(&self) -> PathBuf {
        normalize_path(&self.directory.join(&self.file))
    }
}

/// Result of resolving a requested file against the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLookup {
    Found(PathBuf),
    Missing { suggestion: Option<PathBuf> },
    Ambiguous(Vec<PathBuf>),
}

#[derive(Debug, Clone)]
pub struct CompilationDatabase {
    files: BTreeSet<PathBuf>,
}

impl CompilationDatabase {
    /// Load `<build_dir>/compile_commands.json`.
    pub fn load_from_directory(build_dir: impl AsRef<Path>) -> Result<Self, CompileDbError> {
        let build_dir = build_dir.as_ref();
        let path = build_dir.join(DATABASE_FILE);
        if !path.is_file() {
            return Err(CompileDbError::NotFound(build_dir.to_path_buf()));
        }
        let contents = fs::read_to_string(&path).map_err(|source| CompileDbError::Io {
            path: path.clone(),
            source,
        })?;
        let commands: Vec<CompileCommand> =
            serde_json::from_str(&contents).map_err(|source| CompileDbError::Json {
                path: path.clone(),
                source,
            })?;
        if commands.is_empty() {
            return Err(CompileDbError::Empty(path));
        }
        tracing::debug!(entries = commands.len(), path = %path.display(), "loaded compile database");
        Ok(Self::from_commands(commands))
    }

    pub fn from_commands(commands: Vec<CompileCommand>) -> Self {
        let files = commands.iter().map(CompileCommand::source_path).collect();
        Self { files }
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    /// Resolve a requested source file.
    ///
    /// Absolute paths (and paths relative to `cwd`) must name an entry
    /// exactly. Failing that, the request is treated as a path suffix, with
    /// any leading `./` ignored.
    pub fn lookup(&self, requested: &Path, cwd: &Path) -> FileLookup {
        let absolute = if requested.is_absolute() {
            normalize_path(requested)
        } else {
            normalize_path(&cwd.join(requested))
        };
        if self.files.contains(&absolute) {
            return FileLookup::Found(absolute);
        }
        if let Ok(canonical) = absolute.canonicalize() {
            if self.files.contains(&canonical) {
                return FileLookup::Found(canonical);
            }
        }

        if !requested.is_absolute() {
            let suffix = normalize_path(requested);
            let candidates: Vec<PathBuf> = self
                .files
                .iter()
                .filter(|file| !suffix.as_os_str().is_empty() && file.ends_with(&suffix))
                .cloned()
                .collect();
            match candidates.len() {
                0 => {}
                1 => return FileLookup::Found(candidates[0].clone()),
                _ => return FileLookup::Ambiguous(candidates),
            }
        }

        FileLookup::Missing {
            suggestion: self.suggest(requested),
        }
    }

    /// Database entries found by walking a requested directory.
    pub fn expand_directory(&self, dir: &Path) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let path = normalize_path(entry.path());
                if self.files.contains(&path) {
                    return Some(path);
                }
                let canonical = entry.path().canonicalize().ok()?;
                self.files.contains(&canonical).then_some(canonical)
            })
            .collect();
        found.sort();
        found.dedup();
        found
    }

    /// Closest entry by file name, for "did you mean" hints.
    fn suggest(&self, requested: &Path) -> Option<PathBuf> {
        let name = requested.file_name()?.to_string_lossy();
        self.files
            .iter()
            .filter_map(|file| {
                let candidate = file.file_name()?.to_string_lossy();
                let score = strsim::jaro_winkler(&name, &candidate);
                (score > 0.85).then(|| (score, file))
            })
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, file)| file.clone())
    }
}
