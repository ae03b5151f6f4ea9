//! Object store delegate.
//!
//! The engine never touches objects directly. Every primitive it needs goes
//! through [`ObjectStoreBackend`], implemented for real by [`GitBackend`].

mod git;

pub use git::GitBackend;

use crate::{Checkpoint, Result, SnapshotError, StoreHandle};
use std::path::Path;

/// Captured result of one delegate invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Human readable command line, for logs.
    pub command: String,
    /// Exit code, `None` if the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Turn a non-zero exit into [`SnapshotError::ToolInvocationFailed`].
    pub fn check(self) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(SnapshotError::ToolInvocationFailed {
                stderr: self.stderr_lossy().trim().to_string(),
                command: self.command,
                status: self.status,
            })
        }
    }
}

/// Primitives of a content-addressed, tree-structured object store.
///
/// `Err` means the delegate could not be run at all (missing binary, timeout,
/// IO). A delegate that ran and exited non-zero returns `Ok` with the failing
/// status so callers can apply their own degrade policy.
#[async_trait::async_trait]
pub trait ObjectStoreBackend: Send + Sync {
    /// Get the backend name.
    fn name(&self) -> &str;

    /// Check that the delegate tool can be invoked.
    async fn probe(&self) -> Result<()>;

    /// Whether `worktree` is under a version control kind the store supports.
    async fn is_repository(&self, worktree: &Path) -> bool;

    /// Whether a store already exists at the handle's location.
    async fn is_initialized(&self, store: &StoreHandle) -> bool;

    /// Create the store bound to the handle's worktree, with byte-exact
    /// line endings.
    async fn init(&self, store: &StoreHandle) -> Result<ToolOutput>;

    /// Stage every tracked file of the worktree into the store index.
    async fn stage_all(&self, store: &StoreHandle) -> Result<ToolOutput>;

    /// Write the index as a tree; stdout carries the tree hash.
    async fn write_tree(&self, store: &StoreHandle) -> Result<ToolOutput>;

    /// Names of files differing between `hash` and the worktree, each
    /// terminated by NUL and never quoted.
    async fn diff_names(&self, store: &StoreHandle, hash: &Checkpoint) -> Result<ToolOutput>;

    /// Unified diff between `hash` and the worktree.
    async fn diff_text(&self, store: &StoreHandle, hash: &Checkpoint) -> Result<ToolOutput>;

    /// Numeric-stat listing between two checkpoints, one NUL-terminated
    /// `<additions>\t<deletions>\t<path>` record per file.
    async fn diff_numstat(
        &self,
        store: &StoreHandle,
        from: &Checkpoint,
        to: &Checkpoint,
    ) -> Result<ToolOutput>;

    /// Raw content of `path` inside `hash`.
    async fn show_blob(
        &self,
        store: &StoreHandle,
        hash: &Checkpoint,
        path: &Path,
    ) -> Result<ToolOutput>;

    /// Load `hash` into the index and force every entry into the worktree.
    async fn read_tree_checkout(&self, store: &StoreHandle, hash: &Checkpoint)
    -> Result<ToolOutput>;

    /// Check out a single worktree-relative path from `hash`.
    async fn checkout_path(
        &self,
        store: &StoreHandle,
        hash: &Checkpoint,
        path: &Path,
    ) -> Result<ToolOutput>;

    /// List a single worktree-relative path in the tree at `hash`.
    /// Empty stdout means the path does not exist there.
    async fn ls_tree_path(
        &self,
        store: &StoreHandle,
        hash: &Checkpoint,
        path: &Path,
    ) -> Result<ToolOutput>;
}
