use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keeps writes inside the project's source tree.
///
/// Edits may only target files under the canonical source root, and never
/// files inside the build directory even when it lives under the root.
#[derive(Debug, Clone)]
pub struct SourceRootGuard {
    /// Canonical source root
    source_root: PathBuf,
    /// Canonical paths to forbidden directories
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside source root: {path} (source root: {root})")]
    OutsideSourceRoot { path: PathBuf, root: PathBuf },

    #[error("Path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("Failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl SourceRootGuard {
    /// Create a guard for `source_root`, canonicalized to handle symlinks.
    pub fn new(source_root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let source_root = source_root.as_ref().canonicalize()?;
        Ok(Self {
            source_root,
            forbidden_paths: Vec::new(),
        })
    }

    /// Forbid writes below the build directory. Missing directories are
    /// ignored since nothing can be written there anyway.
    pub fn forbid(mut self, dir: impl AsRef<Path>) -> Self {
        if let Ok(canonical) = dir.as_ref().canonicalize() {
            // A build directory that contains the whole source tree would
            // forbid everything; only nested build directories are excluded
            if !self.source_root.starts_with(&canonical) {
                self.forbidden_paths.push(canonical);
            }
        }
        self
    }

    /// Check if a path is safe to edit.
    ///
    /// Returns the canonicalized absolute path if safe. Relative paths are
    /// resolved against the source root.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.source_root.join(path)
        };

        // Canonicalize to resolve symlinks and .. components
        let canonical = absolute.canonicalize()?;

        self.check_canonical(&canonical)?;

        Ok(canonical)
    }

    /// Re-validate a previously-validated canonical path.
    ///
    /// Call this immediately before write to close the TOCTOU window.
    pub fn revalidate(&self, path: &Path) -> Result<PathBuf, SafetyError> {
        let canonical = path.canonicalize()?;
        self.check_canonical(&canonical)?;
        Ok(canonical)
    }

    fn check_canonical(&self, canonical: &Path) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.source_root) {
            return Err(SafetyError::OutsideSourceRoot {
                path: canonical.to_path_buf(),
                root: self.source_root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if canonical.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: canonical.to_path_buf(),
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }
}
