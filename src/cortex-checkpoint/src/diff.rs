//! Differences between checkpoints and the worktree.

use crate::{
    Checkpoint, FileDiff, Outcome, Patch, Project, Result, SnapshotEngine, SnapshotError,
    StoreHandle,
};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Line counts of one numstat record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineCounts {
    Text { additions: usize, deletions: usize },
    /// Both counts reported as `-`.
    Binary,
    /// Counts present but not numbers.
    Unparsed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NumstatEntry {
    pub path: PathBuf,
    pub counts: LineCounts,
}

/// Parse one NUL-terminated `<additions>\t<deletions>\t<path>` record.
///
/// Paths are verbatim, so they may themselves contain tabs or newlines.
///
/// Only a missing path is an error; bad counts still yield an entry.
pub(crate) fn parse_numstat_line(line: &str) -> Result<NumstatEntry> {
    let mut parts = line.splitn(3, '\t');
    let (Some(additions), Some(deletions), Some(path)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(SnapshotError::ParseFailure(format!("numstat line {line:?}")));
    };
    if path.is_empty() {
        return Err(SnapshotError::ParseFailure(format!("numstat line {line:?}")));
    }

    let counts = match (additions.trim(), deletions.trim()) {
        ("-", "-") => LineCounts::Binary,
        (a, d) => match (a.parse::<usize>(), d.parse::<usize>()) {
            (Ok(additions), Ok(deletions)) => LineCounts::Text {
                additions,
                deletions,
            },
            _ => LineCounts::Unparsed,
        },
    };

    Ok(NumstatEntry {
        path: PathBuf::from(path),
        counts,
    })
}

impl SnapshotEngine {
    /// Files that differ between `hash` and the current worktree.
    ///
    /// Degrades to an empty patch on any failure.
    pub async fn patch(&self, hash: &Checkpoint, project: &Project) -> Outcome<Patch> {
        let empty = Patch::new(hash.clone());
        let store = match self.ensure(project).await {
            Ok(store) => store,
            Err(e) => return self.degrade(project, "patch", empty, e),
        };

        if let Err(e) = self.stage(&store).await {
            debug!(project = %project.id(), "git add warning: {}", e);
        }

        match self
            .backend()
            .diff_names(&store, hash)
            .await
            .and_then(|output| output.check())
        {
            Ok(output) => {
                let files = output
                    .stdout_lossy()
                    .split('\0')
                    .filter(|name| !name.is_empty())
                    .map(|name| project.worktree().join(name))
                    .collect::<Vec<_>>();
                Outcome::Done(empty.with_files(files))
            }
            Err(e) => {
                warn!(project = %project.id(), hash = %hash, "failed to get diff: {}", e);
                self.degrade(project, "patch", empty, e)
            }
        }
    }

    /// Unified diff between `hash` and the current worktree.
    ///
    /// Degrades to an empty string on any failure.
    pub async fn diff(&self, hash: &Checkpoint, project: &Project) -> Outcome<String> {
        let store = match self.ensure(project).await {
            Ok(store) => store,
            Err(e) => return self.degrade(project, "diff", String::new(), e),
        };

        if let Err(e) = self.stage(&store).await {
            debug!(project = %project.id(), "git add warning: {}", e);
        }

        match self
            .backend()
            .diff_text(&store, hash)
            .await
            .and_then(|output| output.check())
        {
            Ok(output) => Outcome::Done(output.stdout_lossy()),
            Err(e) => {
                warn!(project = %project.id(), hash = %hash, "failed to get diff: {}", e);
                self.degrade(project, "diff", String::new(), e)
            }
        }
    }

    /// Per-file diff between two checkpoints, with content on both sides.
    ///
    /// Binary files and records whose counts cannot be parsed are emitted with
    /// empty content and zero counts, without reading their blobs.
    pub async fn diff_full(
        &self,
        from: &Checkpoint,
        to: &Checkpoint,
        project: &Project,
    ) -> Outcome<Vec<FileDiff>> {
        let store = match self.ensure(project).await {
            Ok(store) => store,
            Err(e) => return self.degrade(project, "diff_full", Vec::new(), e),
        };

        let listing = match self
            .backend()
            .diff_numstat(&store, from, to)
            .await
            .and_then(|output| output.check())
        {
            Ok(output) => output.stdout_lossy(),
            Err(e) => {
                warn!(project = %project.id(), %from, %to, "failed to get numstat: {}", e);
                return self.degrade(project, "diff_full", Vec::new(), e);
            }
        };

        let mut diffs = Vec::new();
        for line in listing.split('\0').filter(|line| !line.trim().is_empty()) {
            let entry = match parse_numstat_line(line) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(project = %project.id(), "skipping numstat record: {}", e);
                    continue;
                }
            };

            let diff = match entry.counts {
                LineCounts::Text {
                    additions,
                    deletions,
                } => FileDiff {
                    before: self.blob_text(&store, from, &entry.path).await,
                    after: self.blob_text(&store, to, &entry.path).await,
                    additions,
                    deletions,
                    file: entry.path,
                },
                LineCounts::Binary => FileDiff::empty(entry.path),
                LineCounts::Unparsed => {
                    warn!(project = %project.id(), "unparseable numstat counts: {:?}", line);
                    FileDiff::empty(entry.path)
                }
            };
            diffs.push(diff);
        }

        Outcome::Done(diffs)
    }

    /// Content of `path` at `hash`, empty when it does not exist there.
    async fn blob_text(&self, store: &StoreHandle, hash: &Checkpoint, path: &Path) -> String {
        match self.backend().show_blob(store, hash, path).await {
            Ok(output) if output.success() => output.stdout_lossy(),
            Ok(output) => {
                debug!(
                    "no blob for {}:{}: {}",
                    hash,
                    path.display(),
                    output.stderr_lossy().trim()
                );
                String::new()
            }
            Err(e) => {
                debug!("failed to read blob {}:{}: {}", hash, path.display(), e);
                String::new()
            }
        }
    }
}
