//! Engine wiring.

use crate::{
    CheckpointStore, EventSink, GitBackend, ObjectStoreBackend, Outcome, Project, ProjectId,
    Result, SnapshotConfig, SnapshotError, SnapshotEvent, StoreHandle, VcsKind,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Checkpoint engine shared by every project of a process.
///
/// Holds no per-project state: each operation takes the [`Project`] it runs
/// against. Calls for different projects may run concurrently; calls for the
/// same project must be serialized by the caller.
pub struct SnapshotEngine {
    config: SnapshotConfig,
    backend: Arc<dyn ObjectStoreBackend>,
    store: CheckpointStore,
    events: Option<Arc<dyn EventSink>>,
}

impl SnapshotEngine {
    /// Create an engine backed by the configured git executable.
    pub fn new(config: SnapshotConfig) -> Result<Self> {
        let backend = GitBackend::new(config.git_program.clone(), config.timeout());
        Self::with_backend(config, Arc::new(backend))
    }

    /// Create an engine over a custom object store backend.
    pub fn with_backend(
        config: SnapshotConfig,
        backend: Arc<dyn ObjectStoreBackend>,
    ) -> Result<Self> {
        let data_dir = config.resolve_data_dir().ok_or_else(|| {
            SnapshotError::Config("could not determine the project data directory".to_string())
        })?;
        let store = CheckpointStore::new(data_dir, backend.clone());
        Ok(Self {
            config,
            backend,
            store,
            events: None,
        })
    }

    /// Attach a notification sink.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    pub fn backend(&self) -> &Arc<dyn ObjectStoreBackend> {
        &self.backend
    }

    /// Build a [`Project`], asking the backend whether the worktree is under
    /// a supported VCS.
    pub async fn detect_project(
        &self,
        id: ProjectId,
        worktree: impl Into<PathBuf>,
    ) -> Result<Project> {
        let worktree = worktree.into();
        let vcs = self
            .backend
            .is_repository(&worktree)
            .await
            .then_some(VcsKind::Git);
        Project::new(id, worktree, vcs)
    }

    /// Return the project's store handle, creating the store on first use.
    pub async fn ensure(&self, project: &Project) -> Result<StoreHandle> {
        let (handle, created) = self.store.open(project).await?;
        if created {
            self.emit(SnapshotEvent::Initialized {
                project: project.id().clone(),
                git_dir: handle.git_dir().to_path_buf(),
            });
        }
        Ok(handle)
    }

    pub(crate) fn emit(&self, event: SnapshotEvent) {
        if let Some(sink) = &self.events {
            sink.emit(event);
        }
    }

    /// Report a swallowed error and hand back the neutral value.
    pub(crate) fn degrade<T>(
        &self,
        project: &Project,
        operation: &'static str,
        value: T,
        error: SnapshotError,
    ) -> Outcome<T> {
        self.emit(SnapshotEvent::Degraded {
            project: project.id().clone(),
            operation,
            message: error.to_string(),
        });
        Outcome::degraded(value, error)
    }
}
