use crate::edit::Edit;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Every edit proposed for one file, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEditSet {
    pub file: PathBuf,
    pub edits: Vec<Edit>,
}

impl FileEditSet {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            edits: Vec::new(),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

#[derive(Debug, Default)]
struct Arena {
    index: HashMap<PathBuf, usize>,
    sets: Vec<FileEditSet>,
}

impl Arena {
    fn push(&mut self, edit: Edit) {
        let idx = match self.index.get(&edit.file) {
            Some(idx) => *idx,
            None => {
                let idx = self.sets.len();
                self.index.insert(edit.file.clone(), idx);
                self.sets.push(FileEditSet::new(edit.file.clone()));
                idx
            }
        };
        self.sets[idx].edits.push(edit);
    }
}

/// Collects edits from all scan workers, keyed by file.
///
/// The arena is the only shared state of a scan; appends are serialized by
/// one lock and never fail.
#[derive(Debug, Default)]
pub struct EditAggregator {
    inner: Mutex<Arena>,
}

impl EditAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, edit: Edit) {
        self.inner.lock().push(edit);
    }

    /// Add all edits of one match under a single lock, so they stay adjacent.
    pub fn extend(&self, edits: impl IntoIterator<Item = Edit>) {
        let mut arena = self.inner.lock();
        for edit in edits {
            arena.push(edit);
        }
    }

    pub fn edit_count(&self) -> usize {
        self.inner.lock().sets.iter().map(FileEditSet::len).sum()
    }

    pub fn file_count(&self) -> usize {
        self.inner.lock().sets.len()
    }

    /// Hand the per-file sets to the applier, ordered by path.
    pub fn into_file_sets(self) -> Vec<FileEditSet> {
        let mut sets = self.inner.into_inner().sets;
        sets.sort_by(|a, b| a.file.cmp(&b.file));
        sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn edits_are_grouped_by_file() {
        let aggregator = EditAggregator::new();
        aggregator.add(Edit::new("b.cpp", 0, 1, "x", "a"));
        aggregator.add(Edit::new("a.cpp", 0, 1, "y", "a"));
        aggregator.add(Edit::new("b.cpp", 4, 5, "z", "b"));
        assert_eq!(aggregator.file_count(), 2);
        assert_eq!(aggregator.edit_count(), 3);

        let sets = aggregator.into_file_sets();
        assert_eq!(sets[0].file, PathBuf::from("a.cpp"));
        assert_eq!(sets[1].edits.len(), 2);
        assert_eq!(sets[1].edits[1].new_text, "z");
    }

    #[test]
    fn parallel_adds_are_all_kept() {
        let aggregator = EditAggregator::new();
        (0..200usize).into_par_iter().for_each(|i| {
            let file = format!("f{}.cpp", i % 7);
            aggregator.add(Edit::insertion(file, i, "x"));
        });
        assert_eq!(aggregator.edit_count(), 200);
        assert_eq!(aggregator.file_count(), 7);
    }
}
