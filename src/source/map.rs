use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Identity of a file registered in a [`SourceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The original, unedited text of one file with its line table.
#[derive(Debug, Clone)]
pub struct SourceFile {
    id: FileId,
    path: PathBuf,
    text: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    fn new(id: FileId, path: PathBuf, text: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Self {
            id,
            path,
            text,
            line_starts,
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte offset of a 1-based line and byte column.
    ///
    /// The column may point one past the last character of the line (the
    /// newline itself) but not beyond it.
    pub fn offset_of(&self, line: usize, column: usize) -> Option<usize> {
        if line == 0 || column == 0 {
            return None;
        }
        let start = *self.line_starts.get(line - 1)?;
        let end = self.line_end(start);
        let offset = start + column - 1;
        (offset <= end).then_some(offset)
    }

    /// Offset of the first byte of the line containing `offset`.
    pub fn line_start(&self, offset: usize) -> usize {
        let idx = self.line_starts.partition_point(|&start| start <= offset);
        self.line_starts[idx.saturating_sub(1)]
    }

    /// Offset of the first newline at or after `offset`, or the end of file.
    pub fn line_end(&self, offset: usize) -> usize {
        let offset = offset.min(self.text.len());
        self.text.as_bytes()[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.text.len(), |pos| offset + pos)
    }

    /// 1-based line and column of an offset, for diagnostics.
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        let idx = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .max(1);
        (idx, offset - self.line_starts[idx - 1] + 1)
    }
}

/// Registry of every file scanned during a run.
///
/// Files are keyed by their lexically normalized path. Relative lookups are
/// resolved against the map's base directory.
#[derive(Debug, Default)]
pub struct SourceMap {
    base: Option<PathBuf>,
    files: Vec<SourceFile>,
    by_path: HashMap<PathBuf, FileId>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map that resolves relative paths against `base`.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(normalize_path(&base.into())),
            ..Self::default()
        }
    }

    /// Register a file with its text. Registering the same path twice keeps
    /// the first text and returns the existing id.
    pub fn add_file(&mut self, path: impl AsRef<Path>, text: impl Into<String>) -> FileId {
        let key = self.key_for(path.as_ref());
        if let Some(id) = self.by_path.get(&key) {
            return *id;
        }
        let id = FileId(self.files.len() as u32);
        self.files.push(SourceFile::new(id, key.clone(), text.into()));
        self.by_path.insert(key, id);
        id
    }

    /// Read a file from disk and register it.
    pub fn load(&mut self, path: impl AsRef<Path>) -> std::io::Result<FileId> {
        let path = path.as_ref();
        if let Some(id) = self.lookup(path) {
            return Ok(id);
        }
        let text = fs::read_to_string(path)?;
        Ok(self.add_file(path, text))
    }

    pub fn lookup(&self, path: &Path) -> Option<FileId> {
        self.by_path.get(&self.key_for(path)).copied()
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn key_for(&self, path: &Path) -> PathBuf {
        match &self.base {
            Some(base) if path.is_relative() => normalize_path(&base.join(path)),
            _ => normalize_path(path),
        }
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` where
/// possible. Does not touch the filesystem.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
