//! Shared helpers for the cortex-checkpoint integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use cortex_checkpoint::{
    Checkpoint, GitBackend, ObjectStoreBackend, Project, ProjectId, Result, SnapshotConfig,
    SnapshotEngine, SnapshotError, SnapshotEvent, StoreHandle, ToolOutput, VcsKind,
};
use tempfile::TempDir;

/// Whether a real `git` is on PATH. Tests needing one return early otherwise.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// A git worktree plus a separate data dir and an engine over them.
pub struct Fixture {
    pub worktree: TempDir,
    pub data_dir: TempDir,
    pub engine: SnapshotEngine,
    pub project: Project,
    pub events: Arc<Mutex<Vec<SnapshotEvent>>>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_backend(Arc::new(GitBackend::default()))
    }

    pub fn with_backend(backend: Arc<dyn ObjectStoreBackend>) -> Self {
        let worktree = TempDir::new().unwrap();
        let data_dir = TempDir::new().unwrap();

        let status = Command::new("git")
            .args(["init", "--quiet"])
            .current_dir(worktree.path())
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE")
            .status()
            .unwrap();
        assert!(status.success());

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let config = SnapshotConfig::new().data_dir_path(data_dir.path());
        let engine = SnapshotEngine::with_backend(config, backend)
            .unwrap()
            .with_event_sink(Arc::new(move |event: SnapshotEvent| sink.lock().unwrap().push(event)));

        let project = Project::new(
            ProjectId::new("test-project").unwrap(),
            worktree.path(),
            Some(VcsKind::Git),
        )
        .unwrap();

        Self {
            worktree,
            data_dir,
            engine,
            project,
            events,
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.worktree.path().join(relative)
    }

    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    pub fn read(&self, relative: &str) -> Vec<u8> {
        std::fs::read(self.path(relative)).unwrap()
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    pub fn remove(&self, relative: &str) {
        std::fs::remove_file(self.path(relative)).unwrap();
    }

    pub async fn track(&self) -> Checkpoint {
        let outcome = self.engine.track(&self.project).await;
        assert!(!outcome.is_degraded(), "track degraded: {:?}", outcome.error());
        outcome.into_value().expect("snapshots are enabled")
    }
}

pub fn hash(fill: char) -> Checkpoint {
    Checkpoint::parse(&fill.to_string().repeat(40)).unwrap()
}

fn ok(stdout: impl Into<Vec<u8>>) -> ToolOutput {
    ToolOutput {
        command: "scripted".to_string(),
        status: Some(0),
        stdout: stdout.into(),
        stderr: Vec::new(),
    }
}

fn failed(stderr: &str) -> ToolOutput {
    ToolOutput {
        command: "scripted".to_string(),
        status: Some(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Object store double with canned answers and a call log.
#[derive(Default)]
pub struct ScriptedBackend {
    /// Report the delegate as missing.
    pub unavailable: bool,
    /// Make `add .` exit non-zero.
    pub failing_stage: bool,
    /// Every staging, tree and path-level call, e.g. `checkout <hash> a.txt`.
    pub calls: Mutex<Vec<String>>,
    /// Relative paths whose single-path checkout fails.
    pub failing_checkouts: HashSet<PathBuf>,
    /// Relative paths present in each tree, keyed by hash.
    pub trees: HashMap<String, HashSet<PathBuf>>,
    pub numstat: String,
    pub names: String,
    pub blobs: HashMap<(String, PathBuf), String>,
}

impl ScriptedBackend {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl ObjectStoreBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn probe(&self) -> Result<()> {
        if self.unavailable {
            return Err(SnapshotError::StoreUnavailable("scripted outage".into()));
        }
        Ok(())
    }

    async fn is_repository(&self, _worktree: &Path) -> bool {
        true
    }

    async fn is_initialized(&self, _store: &StoreHandle) -> bool {
        !self.unavailable
    }

    async fn init(&self, _store: &StoreHandle) -> Result<ToolOutput> {
        Ok(ok(""))
    }

    async fn stage_all(&self, _store: &StoreHandle) -> Result<ToolOutput> {
        self.record("add .".to_string());
        if self.failing_stage {
            Ok(failed("fatal: adding files failed"))
        } else {
            Ok(ok(""))
        }
    }

    async fn write_tree(&self, _store: &StoreHandle) -> Result<ToolOutput> {
        self.record("write-tree".to_string());
        Ok(ok(format!("{}\n", hash('a'))))
    }

    async fn diff_names(&self, _store: &StoreHandle, _hash: &Checkpoint) -> Result<ToolOutput> {
        Ok(ok(self.names.clone()))
    }

    async fn diff_text(&self, _store: &StoreHandle, _hash: &Checkpoint) -> Result<ToolOutput> {
        Ok(failed("fatal: scripted diff failure"))
    }

    async fn diff_numstat(
        &self,
        _store: &StoreHandle,
        _from: &Checkpoint,
        _to: &Checkpoint,
    ) -> Result<ToolOutput> {
        Ok(ok(self.numstat.clone()))
    }

    async fn show_blob(
        &self,
        _store: &StoreHandle,
        hash: &Checkpoint,
        path: &Path,
    ) -> Result<ToolOutput> {
        self.record(format!("show {}:{}", hash, path.display()));
        match self.blobs.get(&(hash.to_string(), path.to_path_buf())) {
            Some(content) => Ok(ok(content.clone())),
            None => Ok(failed("fatal: path does not exist")),
        }
    }

    async fn read_tree_checkout(
        &self,
        _store: &StoreHandle,
        _hash: &Checkpoint,
    ) -> Result<ToolOutput> {
        Ok(failed("error: unable to unlink old file"))
    }

    async fn checkout_path(
        &self,
        _store: &StoreHandle,
        hash: &Checkpoint,
        path: &Path,
    ) -> Result<ToolOutput> {
        self.record(format!("checkout {} {}", hash, path.display()));
        if self.failing_checkouts.contains(path) {
            Ok(failed("error: unable to write file"))
        } else {
            Ok(ok(""))
        }
    }

    async fn ls_tree_path(
        &self,
        _store: &StoreHandle,
        hash: &Checkpoint,
        path: &Path,
    ) -> Result<ToolOutput> {
        self.record(format!("ls-tree {} {}", hash, path.display()));
        let present = self
            .trees
            .get(hash.as_str())
            .is_some_and(|files| files.contains(path));
        if present {
            Ok(ok(format!("100644 blob {}\t{}\n", hash, path.display())))
        } else {
            Ok(ok(""))
        }
    }
}

/// Engine over a scripted backend, with a worktree for on-disk effects.
pub fn scripted_engine(backend: Arc<ScriptedBackend>) -> (SnapshotEngine, Project, TempDir, TempDir) {
    let worktree = TempDir::new().unwrap();
    let data_dir = TempDir::new().unwrap();
    let engine = SnapshotEngine::with_backend(
        SnapshotConfig::new().data_dir_path(data_dir.path()),
        backend,
    )
    .unwrap();
    let project = Project::new(
        ProjectId::new("scripted").unwrap(),
        worktree.path(),
        Some(VcsKind::Git),
    )
    .unwrap();
    (engine, project, worktree, data_dir)
}

/// Real git, except that single-path checkouts always fail.
pub struct CheckoutFailing(pub GitBackend);

#[async_trait::async_trait]
impl ObjectStoreBackend for CheckoutFailing {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn probe(&self) -> Result<()> {
        self.0.probe().await
    }

    async fn is_repository(&self, worktree: &Path) -> bool {
        self.0.is_repository(worktree).await
    }

    async fn is_initialized(&self, store: &StoreHandle) -> bool {
        self.0.is_initialized(store).await
    }

    async fn init(&self, store: &StoreHandle) -> Result<ToolOutput> {
        self.0.init(store).await
    }

    async fn stage_all(&self, store: &StoreHandle) -> Result<ToolOutput> {
        self.0.stage_all(store).await
    }

    async fn write_tree(&self, store: &StoreHandle) -> Result<ToolOutput> {
        self.0.write_tree(store).await
    }

    async fn diff_names(&self, store: &StoreHandle, hash: &Checkpoint) -> Result<ToolOutput> {
        self.0.diff_names(store, hash).await
    }

    async fn diff_text(&self, store: &StoreHandle, hash: &Checkpoint) -> Result<ToolOutput> {
        self.0.diff_text(store, hash).await
    }

    async fn diff_numstat(
        &self,
        store: &StoreHandle,
        from: &Checkpoint,
        to: &Checkpoint,
    ) -> Result<ToolOutput> {
        self.0.diff_numstat(store, from, to).await
    }

    async fn show_blob(
        &self,
        store: &StoreHandle,
        hash: &Checkpoint,
        path: &Path,
    ) -> Result<ToolOutput> {
        self.0.show_blob(store, hash, path).await
    }

    async fn read_tree_checkout(
        &self,
        store: &StoreHandle,
        hash: &Checkpoint,
    ) -> Result<ToolOutput> {
        self.0.read_tree_checkout(store, hash).await
    }

    async fn checkout_path(
        &self,
        _store: &StoreHandle,
        _hash: &Checkpoint,
        _path: &Path,
    ) -> Result<ToolOutput> {
        Ok(failed("error: unable to create file: Permission denied"))
    }

    async fn ls_tree_path(
        &self,
        store: &StoreHandle,
        hash: &Checkpoint,
        path: &Path,
    ) -> Result<ToolOutput> {
        self.0.ls_tree_path(store, hash, path).await
    }
}
