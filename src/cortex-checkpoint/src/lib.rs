//! Workspace checkpoints for Cortex CLI.
//!
//! Captures the full tracked state of a project's working directory as a
//! content-addressed checkpoint, diffs checkpoints against each other or
//! against the live tree, restores the tree to a checkpoint, and rolls back
//! individual files from a sequence of patches.
//!
//! Checkpoints live in a private git object store per project
//! (`<data_dir>/snapshot/<project-id>/`), bound to the project's worktree but
//! separate from the project's own `.git` directory.
//!
//! # Example
//!
//! ```rust,ignore
//! use cortex_checkpoint::{ProjectId, SnapshotConfig, SnapshotEngine};
//!
//! let engine = SnapshotEngine::new(SnapshotConfig::default())?;
//! let project = engine
//!     .detect_project(ProjectId::new("my-project")?, "/path/to/worktree")
//!     .await?;
//!
//! let before = engine.track(&project).await.into_value();
//! // ... agent edits files ...
//! if let Some(hash) = before {
//!     let patch = engine.patch(&hash, &project).await.into_value();
//!     engine.revert(&[patch], &project).await?;
//! }
//! ```
//!
//! Operations against one project must be serialized by the caller.

pub mod backend;
pub mod config;
pub mod diff;
pub mod engine;
pub mod events;
pub mod outcome;
pub mod project;
pub mod restore;
pub mod revert;
pub mod store;
pub mod tracker;
pub mod types;

pub use backend::{GitBackend, ObjectStoreBackend, ToolOutput};
pub use config::SnapshotConfig;
pub use engine::SnapshotEngine;
pub use events::{EventSink, SnapshotEvent};
pub use outcome::Outcome;
pub use project::{Project, ProjectId, VcsKind};
pub use revert::{RevertAction, RevertReport, RevertedFile};
pub use store::{CheckpointStore, StoreHandle};
pub use types::{Checkpoint, FileDiff, Patch};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Git command '{command}' failed (status {status:?}): {stderr}")]
    ToolInvocationFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
    #[error("Failed to parse git output: {0}")]
    ParseFailure(String),
    #[error("Invalid checkpoint hash: {0:?}")]
    InvalidCheckpoint(String),
    #[error("Invalid project: {0}")]
    InvalidProject(String),
    #[error("Path is outside the project worktree: {0}")]
    PathOutsideWorktree(PathBuf),
    #[error("Git command '{command}' timed out after {timeout_secs}s")]
    GitTimeout { command: String, timeout_secs: u64 },
    #[error("Invalid snapshot config: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SnapshotError>;
