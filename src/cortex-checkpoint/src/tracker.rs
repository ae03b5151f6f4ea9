//! Checkpoint capture.

use crate::{Checkpoint, Outcome, Project, Result, SnapshotEngine, SnapshotEvent, StoreHandle};
use tracing::{debug, info, warn};

impl SnapshotEngine {
    /// Capture the tracked state of the worktree.
    ///
    /// Yields `None` when checkpointing is disabled (`Done`) or when the store
    /// or the delegate fails (`Degraded`). Never raises.
    pub async fn track(&self, project: &Project) -> Outcome<Option<Checkpoint>> {
        if !self.config().enabled {
            debug!(project = %project.id(), "snapshots disabled, not tracking");
            return Outcome::Done(None);
        }

        let store = match self.ensure(project).await {
            Ok(store) => store,
            Err(e) => {
                debug!(project = %project.id(), "not tracking: {}", e);
                return self.degrade(project, "track", None, e);
            }
        };

        // write-tree after a failed add would capture the previous index.
        if let Err(e) = self.stage(&store).await {
            warn!(project = %project.id(), "failed to stage worktree: {}", e);
            return self.degrade(project, "track", None, e);
        }

        let hash = self
            .backend()
            .write_tree(&store)
            .await
            .and_then(|output| output.check())
            .and_then(|output| Checkpoint::parse(&output.stdout_lossy()));

        match hash {
            Ok(hash) => {
                info!(project = %project.id(), hash = %hash, "tracking");
                self.emit(SnapshotEvent::Tracked {
                    project: project.id().clone(),
                    checkpoint: hash.clone(),
                });
                Outcome::Done(Some(hash))
            }
            Err(e) => {
                warn!(project = %project.id(), "failed to write snapshot tree: {}", e);
                self.degrade(project, "track", None, e)
            }
        }
    }

    /// Stage the tracked-file set. A non-zero exit is
    /// [`ToolInvocationFailed`](crate::SnapshotError::ToolInvocationFailed).
    pub(crate) async fn stage(&self, store: &StoreHandle) -> Result<()> {
        self.backend()
            .stage_all(store)
            .await
            .and_then(|output| output.check())
            .map(|_| ())
    }
}
