//! Git plumbing implementation of the object store.

use super::{ObjectStoreBackend, ToolOutput};
use crate::{Checkpoint, Result, SnapshotError, StoreHandle};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Shells out to `git`, pointing `GIT_DIR` at the checkpoint store and
/// `GIT_WORK_TREE` at the project worktree.
#[derive(Debug, Clone)]
pub struct GitBackend {
    program: String,
    timeout: Option<Duration>,
}

impl GitBackend {
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Execute a git command with timeout, bound to `store` when given.
    async fn git(&self, store: Option<&StoreHandle>, cwd: &Path, args: &[&str]) -> Result<ToolOutput> {
        let command_line = format!("git {}", args.join(" "));

        let mut command = Command::new(&self.program);
        command
            .args(args)
            .current_dir(cwd)
            .env_remove("GIT_INDEX_FILE")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        match store {
            Some(store) => {
                command
                    .env("GIT_DIR", store.git_dir())
                    .env("GIT_WORK_TREE", store.worktree());
            }
            None => {
                command.env_remove("GIT_DIR").env_remove("GIT_WORK_TREE");
            }
        }

        let future = command.output();
        let output = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, future).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(SnapshotError::GitTimeout {
                        command: command_line,
                        timeout_secs: timeout.as_secs(),
                    });
                }
            },
            None => future.await?,
        };

        debug!(command = %command_line, status = ?output.status.code(), "git finished");
        Ok(ToolOutput {
            command: command_line,
            status: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    async fn git_in_store(&self, store: &StoreHandle, args: &[&str]) -> Result<ToolOutput> {
        self.git(Some(store), store.worktree(), args).await
    }
}

impl Default for GitBackend {
    fn default() -> Self {
        Self::new("git", None)
    }
}

/// Pathspec form of a worktree-relative path.
fn pathspec(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[async_trait::async_trait]
impl ObjectStoreBackend for GitBackend {
    fn name(&self) -> &str {
        "git"
    }

    async fn probe(&self) -> Result<()> {
        let cwd = std::env::temp_dir();
        self.git(None, &cwd, &["--version"]).await?.check()?;
        Ok(())
    }

    async fn is_repository(&self, worktree: &Path) -> bool {
        self.git(None, worktree, &["rev-parse", "--git-dir"])
            .await
            .map(|o| o.success())
            .unwrap_or(false)
    }

    async fn is_initialized(&self, store: &StoreHandle) -> bool {
        tokio::fs::try_exists(store.git_dir().join("HEAD"))
            .await
            .unwrap_or(false)
    }

    async fn init(&self, store: &StoreHandle) -> Result<ToolOutput> {
        let init = self.git_in_store(store, &["init", "--quiet"]).await?;
        if !init.success() {
            return Ok(init);
        }
        self.git_in_store(store, &["config", "core.autocrlf", "false"])
            .await
    }

    async fn stage_all(&self, store: &StoreHandle) -> Result<ToolOutput> {
        self.git_in_store(store, &["add", "."]).await
    }

    async fn write_tree(&self, store: &StoreHandle) -> Result<ToolOutput> {
        self.git_in_store(store, &["write-tree"]).await
    }

    async fn diff_names(&self, store: &StoreHandle, hash: &Checkpoint) -> Result<ToolOutput> {
        self.git_in_store(
            store,
            &[
                "-c",
                "core.autocrlf=false",
                "-c",
                "core.quotepath=false",
                "diff",
                "--no-ext-diff",
                "--name-only",
                "-z",
                hash.as_str(),
                "--",
                ".",
            ],
        )
        .await
    }

    async fn diff_text(&self, store: &StoreHandle, hash: &Checkpoint) -> Result<ToolOutput> {
        self.git_in_store(
            store,
            &[
                "-c",
                "core.autocrlf=false",
                "-c",
                "core.quotepath=false",
                "diff",
                "--no-ext-diff",
                hash.as_str(),
                "--",
                ".",
            ],
        )
        .await
    }

    async fn diff_numstat(
        &self,
        store: &StoreHandle,
        from: &Checkpoint,
        to: &Checkpoint,
    ) -> Result<ToolOutput> {
        self.git_in_store(
            store,
            &[
                "-c",
                "core.autocrlf=false",
                "-c",
                "core.quotepath=false",
                "diff",
                "--no-ext-diff",
                "--no-renames",
                "--numstat",
                "-z",
                from.as_str(),
                to.as_str(),
                "--",
                ".",
            ],
        )
        .await
    }

    async fn show_blob(
        &self,
        store: &StoreHandle,
        hash: &Checkpoint,
        path: &Path,
    ) -> Result<ToolOutput> {
        let object = format!("{}:{}", hash, pathspec(path));
        self.git_in_store(store, &["-c", "core.autocrlf=false", "show", &object])
            .await
    }

    async fn read_tree_checkout(
        &self,
        store: &StoreHandle,
        hash: &Checkpoint,
    ) -> Result<ToolOutput> {
        let read = self.git_in_store(store, &["read-tree", hash.as_str()]).await?;
        if !read.success() {
            return Ok(read);
        }
        self.git_in_store(store, &["checkout-index", "-a", "-f"])
            .await
    }

    async fn checkout_path(
        &self,
        store: &StoreHandle,
        hash: &Checkpoint,
        path: &Path,
    ) -> Result<ToolOutput> {
        let spec = pathspec(path);
        self.git_in_store(
            store,
            &["--literal-pathspecs", "checkout", hash.as_str(), "--", &spec],
        )
            .await
    }

    async fn ls_tree_path(
        &self,
        store: &StoreHandle,
        hash: &Checkpoint,
        path: &Path,
    ) -> Result<ToolOutput> {
        let spec = pathspec(path);
        self.git_in_store(
            store,
            &["--literal-pathspecs", "ls-tree", hash.as_str(), "--", &spec],
        )
            .await
    }
}
