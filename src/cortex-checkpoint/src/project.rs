//! Project identity and worktree.

use crate::{Result, SnapshotError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

/// Stable identifier of a project, used as the store directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Validate a caller-supplied id.
    ///
    /// The id becomes a single path component, so separators and `..` are
    /// rejected.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\', '\0']) {
            return Err(SnapshotError::InvalidProject(format!(
                "project id {id:?} is not a valid directory name"
            )));
        }
        Ok(Self(id))
    }

    /// Derive an id from the worktree path for callers without one.
    pub fn from_worktree(worktree: &Path) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(worktree.to_string_lossy().as_bytes());
        Self(hex::encode(hasher.finalize())[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Version control kinds a project can be checkpointed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    Git,
}

/// The project context every engine operation runs against.
#[derive(Debug, Clone)]
pub struct Project {
    id: ProjectId,
    worktree: PathBuf,
    vcs: Option<VcsKind>,
}

impl Project {
    pub fn new(id: ProjectId, worktree: impl Into<PathBuf>, vcs: Option<VcsKind>) -> Result<Self> {
        let worktree = worktree.into();
        if !worktree.is_absolute() {
            return Err(SnapshotError::InvalidProject(format!(
                "worktree must be an absolute path: {}",
                worktree.display()
            )));
        }
        Ok(Self { id, worktree, vcs })
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    pub fn vcs(&self) -> Option<VcsKind> {
        self.vcs
    }

    /// Whether the project can be checkpointed at all.
    pub fn is_eligible(&self) -> bool {
        self.vcs == Some(VcsKind::Git)
    }

    /// Worktree-relative form of an absolute path inside the worktree.
    pub fn relative_path<'a>(&self, path: &'a Path) -> Result<&'a Path> {
        match path.strip_prefix(&self.worktree) {
            Ok(relative) if !relative.as_os_str().is_empty() => Ok(relative),
            _ => Err(SnapshotError::PathOutsideWorktree(path.to_path_buf())),
        }
    }
}
