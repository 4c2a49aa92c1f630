//! Artifact output
//!
//! Writing is all-or-nothing per artifact set: every file is first written
//! into a staging directory beside the output root, and only moved into
//! place once all writes succeeded. A failed move undoes the moves before
//! it. Drift detection compares a fresh set with what is on disk.

use similar::TextDiff;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use super::ArtifactSet;
use crate::error::{ModelError, Result};

/// Write every artifact of `set` under `root`, or none of them
pub fn write_atomic(set: &ArtifactSet, root: &Path) -> Result<Vec<PathBuf>> {
    for artifact in &set.artifacts {
        check_relative(set, &artifact.path)?;
    }
    check_conflicts(set)?;

    fs::create_dir_all(root)?;
    let staging = tempfile::Builder::new()
        .prefix(".modelgen-staging-")
        .tempdir_in(root)?;

    for artifact in &set.artifacts {
        let staged = staging.path().join("new").join(&artifact.path);
        if let Some(parent) = staged.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&staged, artifact.content.as_bytes())?;
    }
    debug!(backend = %set.backend, staged = set.len(), "staged artifacts");

    let mut commit = Commit::new(root, staging.path());
    for artifact in &set.artifacts {
        if let Err(e) = commit.place(&artifact.path) {
            warn!(backend = %set.backend, path = %artifact.path.display(), error = %e, "rolling back artifact set");
            commit.rollback();
            return Err(e.into());
        }
    }

    info!(
        backend = %set.backend,
        version = %set.version,
        files = commit.placed.len(),
        root = %root.display(),
        "wrote artifacts"
    );
    Ok(commit.placed)
}

/// Moves staged files into place, remembering enough to undo every step
struct Commit<'a> {
    root: &'a Path,
    staging: &'a Path,
    placed: Vec<PathBuf>,
    /// Files that existed before, parked under the staging directory
    replaced: Vec<(PathBuf, PathBuf)>,
    created_dirs: Vec<PathBuf>,
}

impl<'a> Commit<'a> {
    fn new(root: &'a Path, staging: &'a Path) -> Self {
        Self {
            root,
            staging,
            placed: Vec::new(),
            replaced: Vec::new(),
            created_dirs: Vec::new(),
        }
    }

    fn place(&mut self, relative: &Path) -> std::io::Result<()> {
        let target = self.root.join(relative);
        if let Some(parent) = target.parent() {
            if !parent.exists() {
                let mut first_missing = parent;
                while let Some(up) = first_missing.parent() {
                    if up.exists() {
                        break;
                    }
                    first_missing = up;
                }
                fs::create_dir_all(parent)?;
                self.created_dirs.push(first_missing.to_path_buf());
            }
        }

        if target.exists() {
            let parked = self.staging.join("old").join(relative);
            if let Some(parent) = parked.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::rename(&target, &parked)?;
            self.replaced.push((target.clone(), parked));
        }

        fs::rename(self.staging.join("new").join(relative), &target)?;
        self.placed.push(target);
        Ok(())
    }

    /// Best effort: remove what was placed, then put replaced files back
    fn rollback(self) {
        for target in self.placed.iter().rev() {
            let _ = fs::remove_file(target);
        }
        for (target, parked) in self.replaced.iter().rev() {
            let _ = fs::rename(parked, target);
        }
        for dir in self.created_dirs.iter().rev() {
            let _ = fs::remove_dir_all(dir);
        }
    }
}

/// Two artifacts may not share a path, and no artifact may sit where
/// another one needs a directory
fn check_conflicts(set: &ArtifactSet) -> Result<()> {
    let mut seen: BTreeSet<Vec<Component<'_>>> = BTreeSet::new();
    for artifact in &set.artifacts {
        let components: Vec<Component<'_>> = artifact
            .path
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        let clash = seen.contains(&components)
            || seen.iter().any(|other| {
                other.len() != components.len()
                    && (other.starts_with(&components) || components.starts_with(other))
            });
        if clash {
            return Err(ModelError::Generation {
                backend: set.backend.clone(),
                location: artifact.path.display().to_string(),
                source: "artifact path conflicts with another artifact in the same set".into(),
            });
        }
        seen.insert(components);
    }
    Ok(())
}

fn check_relative(set: &ArtifactSet, path: &Path) -> Result<()> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes || path.as_os_str().is_empty() {
        return Err(ModelError::Generation {
            backend: set.backend.clone(),
            location: path.display().to_string(),
            source: "artifact path must stay inside the output directory".into(),
        });
    }
    Ok(())
}

/// How a generated artifact compares with the file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftStatus {
    Unchanged,
    Missing,
    /// Unified diff from the file on disk to the generated content
    Modified { diff: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftEntry {
    pub path: PathBuf,
    pub status: DriftStatus,
}

impl DriftEntry {
    pub fn is_drifted(&self) -> bool {
        self.status != DriftStatus::Unchanged
    }
}

/// Compare every artifact with its counterpart under `root`
pub fn drift(set: &ArtifactSet, root: &Path) -> Result<Vec<DriftEntry>> {
    let mut entries = Vec::with_capacity(set.len());

    for artifact in &set.artifacts {
        let target = root.join(&artifact.path);
        let status = if !target.exists() {
            DriftStatus::Missing
        } else {
            let on_disk = fs::read_to_string(&target)?;
            if on_disk == artifact.content {
                DriftStatus::Unchanged
            } else {
                let label = artifact.path.display().to_string();
                let diff = TextDiff::from_lines(&on_disk, &artifact.content)
                    .unified_diff()
                    .context_radius(3)
                    .header(&format!("a/{}", label), &format!("b/{}", label))
                    .to_string();
                DriftStatus::Modified { diff }
            }
        };
        entries.push(DriftEntry {
            path: artifact.path.clone(),
            status,
        });
    }

    let drifted = entries.iter().filter(|e| e.is_drifted()).count();
    debug!(backend = %set.backend, checked = entries.len(), drifted, "drift check");
    Ok(entries)
}
