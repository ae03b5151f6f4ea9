//! Whole-worktree restore.

use crate::{Checkpoint, Outcome, Project, SnapshotEngine, SnapshotEvent};
use tracing::{error, info};

impl SnapshotEngine {
    /// Force the worktree to match `hash`, overwriting local changes.
    ///
    /// Files that are not part of the checkpoint are left alone. On failure
    /// the worktree may be partially checked out; callers must not assume
    /// any particular state after a `Degraded` result.
    pub async fn restore(&self, hash: &Checkpoint, project: &Project) -> Outcome<()> {
        info!(project = %project.id(), commit = %hash, "restore");

        let store = match self.ensure(project).await {
            Ok(store) => store,
            Err(e) => {
                error!(project = %project.id(), hash = %hash, "failed to restore snapshot: {}", e);
                return self.degrade(project, "restore", (), e);
            }
        };

        let output = match self.backend().read_tree_checkout(&store, hash).await {
            Ok(output) => output,
            Err(e) => {
                error!(project = %project.id(), hash = %hash, "failed to restore snapshot: {}", e);
                return self.degrade(project, "restore", (), e);
            }
        };

        let status = output.status;
        let stdout = output.stdout_lossy();
        if let Err(e) = output.check() {
            error!(
                project = %project.id(),
                hash = %hash,
                status = ?status,
                stdout = %stdout.trim(),
                "failed to restore snapshot: {}",
                e
            );
            return self.degrade(project, "restore", (), e);
        }

        self.emit(SnapshotEvent::Restored {
            project: project.id().clone(),
            checkpoint: hash.clone(),
        });
        Outcome::Done(())
    }
}
