//! Snapshot configuration.

use crate::{Result, SnapshotError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for git operations in seconds
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 30;

/// Directory under the data root that holds one object store per project.
pub const SNAPSHOT_DIR: &str = "snapshot";

/// Home directory name used when no data dir override is set.
const HOME_DIR_NAME: &str = ".cortex";

/// Configuration for workspace checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Whether checkpointing is enabled for the project.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Project data root. Stores live in `<data_dir>/snapshot/<project-id>`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Git executable used as the object store delegate.
    #[serde(default = "default_git_program")]
    pub git_program: String,

    /// Timeout for each git invocation. `None` waits indefinitely.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

fn default_git_program() -> String {
    "git".to_string()
}

fn default_timeout_secs() -> Option<u64> {
    Some(
        std::env::var("CORTEX_GIT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_GIT_TIMEOUT_SECS),
    )
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            data_dir: None,
            git_program: default_git_program(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SnapshotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the snapshot settings out of a project config document.
    ///
    /// Accepts either a bare `snapshot = false` flag or a `[snapshot]` table.
    /// A document without a `snapshot` key yields the defaults.
    pub fn from_toml_str(document: &str) -> Result<Self> {
        let table = document
            .parse::<toml::Table>()
            .map_err(|e| SnapshotError::Config(e.to_string()))?;

        match table.get("snapshot") {
            None => Ok(Self::default()),
            Some(toml::Value::Boolean(enabled)) => Ok(Self::default().enabled(*enabled)),
            Some(value @ toml::Value::Table(_)) => value
                .clone()
                .try_into()
                .map_err(|e: toml::de::Error| SnapshotError::Config(e.to_string())),
            Some(other) => Err(SnapshotError::Config(format!(
                "`snapshot` must be a boolean or a table, found {}",
                other.type_str()
            ))),
        }
    }

    /// Get the timeout duration.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Resolve the project data root.
    ///
    /// Falls back to `CORTEX_DATA_DIR`, then `CORTEX_HOME`, then `~/.cortex`.
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Some(dir.clone());
        }
        if let Ok(dir) = std::env::var("CORTEX_DATA_DIR") {
            return Some(PathBuf::from(dir));
        }
        if let Ok(home) = std::env::var("CORTEX_HOME") {
            return Some(PathBuf::from(home));
        }
        dirs::home_dir().map(|home| home.join(HOME_DIR_NAME))
    }

    /// Builder: set enabled.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder: set the data root.
    pub fn data_dir_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Builder: set the git executable.
    pub fn git_program(mut self, program: impl Into<String>) -> Self {
        self.git_program = program.into();
        self
    }

    /// Builder: set or clear the per-invocation timeout.
    pub fn timeout_duration(mut self, timeout: Option<Duration>) -> Self {
        self.timeout_secs = timeout.map(|t| t.as_secs());
        self
    }
}
