//! Per-project checkpoint stores.

use crate::config::SNAPSHOT_DIR;
use crate::{ObjectStoreBackend, Project, Result, SnapshotError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Location of one project's object store and the worktree it is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreHandle {
    git_dir: PathBuf,
    worktree: PathBuf,
}

impl StoreHandle {
    pub fn new(git_dir: impl Into<PathBuf>, worktree: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
            worktree: worktree.into(),
        }
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn worktree(&self) -> &Path {
        &self.worktree
    }
}

/// Owns the `<data_dir>/snapshot/` tree of per-project stores.
pub struct CheckpointStore {
    root: PathBuf,
    backend: Arc<dyn ObjectStoreBackend>,
}

impl CheckpointStore {
    pub fn new(data_dir: impl AsRef<Path>, backend: Arc<dyn ObjectStoreBackend>) -> Self {
        Self {
            root: data_dir.as_ref().join(SNAPSHOT_DIR),
            backend,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store directory for a project, whether or not it exists yet.
    pub fn location(&self, project: &Project) -> PathBuf {
        self.root.join(project.id().as_str())
    }

    /// Return the project's store, initializing it on first use.
    ///
    /// Every failure, including an ineligible project, is reported as
    /// [`SnapshotError::StoreUnavailable`].
    pub async fn ensure(&self, project: &Project) -> Result<StoreHandle> {
        self.open(project).await.map(|(handle, _)| handle)
    }

    /// Like [`ensure`](Self::ensure), also reporting whether the store was
    /// created by this call.
    pub(crate) async fn open(&self, project: &Project) -> Result<(StoreHandle, bool)> {
        if !project.is_eligible() {
            return Err(SnapshotError::StoreUnavailable(format!(
                "{} is not a git worktree",
                project.worktree().display()
            )));
        }

        let handle = StoreHandle::new(self.location(project), project.worktree());
        if self.backend.is_initialized(&handle).await {
            return Ok((handle, false));
        }

        self.backend.probe().await.map_err(unavailable)?;
        tokio::fs::create_dir_all(handle.git_dir())
            .await
            .map_err(|e| unavailable(e.into()))?;
        self.backend
            .init(&handle)
            .await
            .and_then(|output| output.check())
            .map_err(unavailable)?;

        info!(
            project = %project.id(),
            backend = self.backend.name(),
            git_dir = %handle.git_dir().display(),
            "Initialized snapshot repository"
        );
        Ok((handle, true))
    }
}

fn unavailable(error: SnapshotError) -> SnapshotError {
    debug!("snapshot store unavailable: {}", error);
    match error {
        SnapshotError::StoreUnavailable(_) => error,
        other => SnapshotError::StoreUnavailable(other.to_string()),
    }
}
