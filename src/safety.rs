use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Guards forced deletions so they stay inside zdev's worktrees directory.
#[derive(Debug, Clone)]
pub struct WorktreeGuard {
    /// Canonical path to the worktrees directory
    worktrees_root: PathBuf,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside the worktrees directory: {path} (worktrees: {root})")]
    OutsideWorktrees { path: PathBuf, root: PathBuf },

    #[error("Refusing to remove the worktrees directory itself: {0}")]
    IsRoot(PathBuf),

    #[error("Failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl WorktreeGuard {
    /// The root is canonicalized so symlinks cannot smuggle paths out.
    pub fn new(worktrees_root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let worktrees_root = worktrees_root.as_ref().canonicalize()?;
        Ok(Self { worktrees_root })
    }

    /// Returns the canonical path if it lies strictly inside the root.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let canonical = path.as_ref().canonicalize()?;

        if canonical == self.worktrees_root {
            return Err(SafetyError::IsRoot(canonical));
        }
        if !canonical.starts_with(&self.worktrees_root) {
            return Err(SafetyError::OutsideWorktrees {
                path: canonical,
                root: self.worktrees_root.clone(),
            });
        }

        Ok(canonical)
    }

    /// Recursively delete a validated worktree directory.
    pub fn remove_dir(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let canonical = self.validate_path(path)?;
        fs::remove_dir_all(&canonical)?;
        Ok(canonical)
    }
}
