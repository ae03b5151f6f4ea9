//! File-by-file rollback of patches.

use crate::{
    Checkpoint, Outcome, Patch, Project, Result, SnapshotEngine, SnapshotEvent, StoreHandle,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What a revert did with one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevertAction {
    /// Checked out from the patch's checkpoint.
    Restored,
    /// Checkout failed but the file exists in the checkpoint; left as is.
    Kept,
    /// The file is absent from the checkpoint and was removed.
    Deleted,
    /// The file is absent from the checkpoint but could not be removed.
    DeleteFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertedFile {
    pub file: PathBuf,
    pub checkpoint: Checkpoint,
    pub action: RevertAction,
}

/// Files handled by one revert, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertReport {
    pub files: Vec<RevertedFile>,
}

impl RevertReport {
    pub fn action_for(&self, file: &Path) -> Option<RevertAction> {
        self.files
            .iter()
            .find(|entry| entry.file == file)
            .map(|entry| entry.action)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Whether a path is present in a checkpoint's tree.
enum TreeEntry {
    Present,
    Absent,
    Unknown,
}

impl SnapshotEngine {
    /// Roll back every file named by `patches`, oldest relevant state first.
    ///
    /// Patches are processed in order and each file only once, using the first
    /// patch that names it. Per file:
    ///
    /// | checkout from the patch's hash | file in that tree | action |
    /// |---|---|---|
    /// | succeeds | - | restored |
    /// | fails | yes | kept unchanged |
    /// | fails | no | deleted |
    ///
    /// Returns `Err` only when a patch names a file outside the worktree, in
    /// which case nothing is touched.
    pub async fn revert(
        &self,
        patches: &[Patch],
        project: &Project,
    ) -> Result<Outcome<RevertReport>> {
        for patch in patches {
            for file in &patch.files {
                project.relative_path(file)?;
            }
        }

        let store = match self.ensure(project).await {
            Ok(store) => store,
            Err(e) => {
                warn!(project = %project.id(), "cannot revert: {}", e);
                return Ok(self.degrade(project, "revert", RevertReport::default(), e));
            }
        };

        let mut processed: HashSet<&Path> = HashSet::new();
        let mut report = RevertReport::default();

        for patch in patches {
            for file in &patch.files {
                if !processed.insert(file.as_path()) {
                    continue;
                }
                info!(project = %project.id(), file = %file.display(), hash = %patch.hash, "reverting");

                let relative = project.relative_path(file)?;
                let action = self.revert_file(&store, &patch.hash, file, relative).await;

                self.emit(SnapshotEvent::FileReverted {
                    project: project.id().clone(),
                    file: file.clone(),
                    checkpoint: patch.hash.clone(),
                    action,
                });
                report.files.push(RevertedFile {
                    file: file.clone(),
                    checkpoint: patch.hash.clone(),
                    action,
                });
            }
        }

        Ok(Outcome::Done(report))
    }

    async fn revert_file(
        &self,
        store: &StoreHandle,
        hash: &Checkpoint,
        file: &Path,
        relative: &Path,
    ) -> RevertAction {
        match self.backend().checkout_path(store, hash, relative).await {
            Ok(output) if output.success() => return RevertAction::Restored,
            Ok(output) => debug!(
                "checkout of {} from {} failed: {}",
                relative.display(),
                hash,
                output.stderr_lossy().trim()
            ),
            Err(e) => debug!("checkout of {} from {} failed: {}", relative.display(), hash, e),
        }

        match self.tree_entry(store, hash, relative).await {
            TreeEntry::Present => {
                info!(file = %file.display(), "file existed in snapshot but checkout failed, keeping");
                RevertAction::Kept
            }
            TreeEntry::Unknown => {
                warn!(file = %file.display(), hash = %hash, "could not inspect snapshot tree, keeping");
                RevertAction::Kept
            }
            TreeEntry::Absent => {
                info!(file = %file.display(), "file did not exist in snapshot, deleting");
                match tokio::fs::remove_file(file).await {
                    Ok(()) => RevertAction::Deleted,
                    Err(e) if e.kind() == ErrorKind::NotFound => RevertAction::Deleted,
                    Err(e) => {
                        warn!(file = %file.display(), "failed to delete: {}", e);
                        RevertAction::DeleteFailed
                    }
                }
            }
        }
    }

    /// Absence is only reported when the listing itself succeeded.
    async fn tree_entry(&self, store: &StoreHandle, hash: &Checkpoint, relative: &Path) -> TreeEntry {
        match self.backend().ls_tree_path(store, hash, relative).await {
            Ok(output) if output.success() => {
                if output.stdout_lossy().trim().is_empty() {
                    TreeEntry::Absent
                } else {
                    TreeEntry::Present
                }
            }
            Ok(output) => {
                debug!("ls-tree {} failed: {}", hash, output.stderr_lossy().trim());
                TreeEntry::Unknown
            }
            Err(e) => {
                debug!("ls-tree {} failed: {}", hash, e);
                TreeEntry::Unknown
            }
        }
    }
}
