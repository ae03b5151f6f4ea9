//! Checkpoint data model.

use crate::{Result, SnapshotError};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Content hash of the full tracked state of a worktree.
///
/// Two captures of byte-identical content produce the same checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Checkpoint(String);

impl Checkpoint {
    /// Parse a hash as printed by the object store.
    ///
    /// Surrounding whitespace is trimmed; anything that is not a hex object id
    /// is rejected.
    pub fn parse(hash: &str) -> Result<Self> {
        let hash = hash.trim();
        let valid = matches!(hash.len(), 40 | 64) && hash.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(SnapshotError::InvalidCheckpoint(hash.to_string()));
        }
        Ok(Self(hash.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Checkpoint {
    type Error = SnapshotError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Checkpoint> for String {
    fn from(value: Checkpoint) -> Self {
        value.0
    }
}

/// Files that differ between a checkpoint and the worktree at patch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub hash: Checkpoint,
    /// Absolute paths, in the order the object store listed them.
    pub files: IndexSet<PathBuf>,
}

impl Patch {
    pub fn new(hash: Checkpoint) -> Self {
        Self {
            hash,
            files: IndexSet::new(),
        }
    }

    pub fn with_files(mut self, files: impl IntoIterator<Item = PathBuf>) -> Self {
        self.files.extend(files);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A single file's change between two checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Worktree-relative path as reported by the object store.
    pub file: PathBuf,
    /// Content at the `from` checkpoint. Empty for binary or absent files.
    pub before: String,
    /// Content at the `to` checkpoint. Empty for binary or absent files.
    pub after: String,
    pub additions: usize,
    pub deletions: usize,
}

impl FileDiff {
    /// Entry with no content and zero counts.
    pub fn empty(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            before: String::new(),
            after: String::new(),
            additions: 0,
            deletions: 0,
        }
    }

    /// Get a summary of changes.
    pub fn summary(&self) -> String {
        format!(
            "{}: +{} -{} lines",
            self.file.display(),
            self.additions,
            self.deletions
        )
    }
}
