//! Notifications emitted by the engine.

use crate::{Checkpoint, ProjectId, RevertAction};
use std::path::PathBuf;

/// Something the engine did, or failed to do and downgraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotEvent {
    /// A project's store was created.
    Initialized { project: ProjectId, git_dir: PathBuf },
    /// A checkpoint was captured.
    Tracked {
        project: ProjectId,
        checkpoint: Checkpoint,
    },
    /// The worktree was forced to a checkpoint.
    Restored {
        project: ProjectId,
        checkpoint: Checkpoint,
    },
    /// One file was handled by a revert.
    FileReverted {
        project: ProjectId,
        file: PathBuf,
        checkpoint: Checkpoint,
        action: RevertAction,
    },
    /// An operation failed and returned its neutral result instead.
    Degraded {
        project: ProjectId,
        operation: &'static str,
        message: String,
    },
}

/// Receiver for [`SnapshotEvent`]s, typically an adapter onto the event bus.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SnapshotEvent);
}

impl<F> EventSink for F
where
    F: Fn(SnapshotEvent) + Send + Sync,
{
    fn emit(&self, event: SnapshotEvent) {
        self(event)
    }
}
