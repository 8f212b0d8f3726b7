//! Working-tree status classification.
//!
//! Compares the stage, HEAD's tree, and the files on disk to sort every
//! known file name into the five status sections. Presentation is left
//! to the caller; all vectors come back lexicographically sorted.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::blob::blob_id;
use crate::branches::Branches;
use crate::commit::Commit;
use crate::error::GitletResult;
use crate::fsutil::working_file_names;
use crate::stage::Stage;

/// Why a tracked file shows under "Modifications Not Staged".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnstagedKind {
    /// On disk with different content than the staged/committed version.
    Modified,
    /// Tracked but missing from disk.
    Deleted,
}

/// One entry in the "Modifications Not Staged" section.
#[derive(Debug, Clone, Serialize)]
pub struct UnstagedEntry {
    pub name: String,
    pub kind: UnstagedKind,
}

/// Full repository status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Name of the active branch.
    pub current_branch: String,
    /// Every other branch name, sorted.
    pub other_branches: Vec<String>,
    /// Staged for the next commit: staged blob differs from HEAD's and
    /// matches the working copy.
    pub staged: Vec<String>,
    /// Tracked by HEAD but absent from the stage.
    pub removed: Vec<String>,
    /// Stage agrees with HEAD yet the disk differs.
    pub unstaged: Vec<UnstagedEntry>,
    /// On disk, in neither stage nor HEAD.
    pub untracked: Vec<String>,
}

/// Classify every file name known to the stage, HEAD, or the working
/// directory.
pub fn compute_status(
    root: &Path,
    branches: &Branches,
    stage: &Stage,
    head: &Commit,
) -> GitletResult<StatusReport> {
    let mut names: BTreeSet<String> = BTreeSet::new();
    names.extend(stage.tree.keys().cloned());
    names.extend(head.tree.keys().cloned());
    names.extend(working_file_names(root)?);

    let mut staged = Vec::new();
    let mut removed = Vec::new();
    let mut unstaged = Vec::new();
    let mut untracked = Vec::new();

    for name in &names {
        let staged_id = stage.blob_id(name);
        let head_id = head.blob_id(name);
        let disk_id = disk_blob_id(root, name)?;
        let disk_id = disk_id.as_ref();

        if staged_id != head_id && staged_id == disk_id && disk_id.is_some() {
            staged.push(name.clone());
        }
        if head_id.is_some() && staged_id.is_none() {
            removed.push(name.clone());
        }
        if staged_id == head_id && staged_id != disk_id {
            if head_id.is_some() && disk_id.is_none() {
                unstaged.push(UnstagedEntry {
                    name: name.clone(),
                    kind: UnstagedKind::Deleted,
                });
            } else if staged_id.is_some() {
                unstaged.push(UnstagedEntry {
                    name: name.clone(),
                    kind: UnstagedKind::Modified,
                });
            }
        }
        if head_id.is_none() && staged_id.is_none() {
            untracked.push(name.clone());
        }
    }

    let other_branches = branches
        .tips
        .keys()
        .filter(|name| **name != branches.current)
        .cloned()
        .collect();

    Ok(StatusReport {
        current_branch: branches.current.clone(),
        other_branches,
        staged,
        removed,
        unstaged,
        untracked,
    })
}

/// Blob id the file on disk would snapshot to, or None if absent.
fn disk_blob_id(root: &Path, name: &str) -> GitletResult<Option<String>> {
    let path = root.join(name);
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(&path)?;
    Ok(Some(blob_id(name, &bytes)))
}
