//! The staging area — the write buffer between working tree and commits.
//!
//! Stored as `.gitlet/stage`. After `commit` and after a full checkout,
//! reset, or merge, the staged tree equals the new HEAD's tree.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::blob::blob_id;
use crate::commit::Commit;
use crate::error::GitletResult;
use crate::fsutil::{atomic_write, working_file_names};

/// The staged name→blob-id tree.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stage {
    /// Map of file name -> blob id. Iteration is lexicographic by name.
    pub tree: BTreeMap<String, String>,
}

impl Stage {
    /// Load the stage from disk, or return an empty stage.
    pub fn load(path: &Path) -> GitletResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Save the stage to disk (atomic: temp + fsync + rename).
    pub fn save(&self, path: &Path) -> GitletResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path, json.as_bytes())
    }

    /// Insert or replace a staged entry.
    pub fn put(&mut self, name: &str, blob_id: String) {
        self.tree.insert(name.to_string(), blob_id);
    }

    /// Delete a staged entry if present.
    pub fn remove(&mut self, name: &str) {
        self.tree.remove(name);
    }

    /// Check if a file name is staged.
    pub fn contains(&self, name: &str) -> bool {
        self.tree.contains_key(name)
    }

    /// Staged blob id for a file name, if any.
    pub fn blob_id(&self, name: &str) -> Option<&String> {
        self.tree.get(name)
    }

    /// Replace the whole staged tree with a commit's tree.
    pub fn update(&mut self, commit: &Commit) {
        self.tree = commit.tree.clone();
    }

    /// True if committing now would not reproduce `head`: the staged tree
    /// differs from the head tree, a staged file has different content on
    /// disk, or a tracked file is missing from disk.
    pub fn diverges_from(&self, head: &Commit, root: &Path) -> GitletResult<bool> {
        if self.tree != head.tree {
            return Ok(true);
        }

        for name in working_file_names(root)? {
            if let Some(staged) = self.tree.get(&name) {
                let bytes = fs::read(root.join(&name))?;
                if blob_id(&name, &bytes) != *staged {
                    return Ok(true);
                }
            }
        }

        for name in self.tree.keys() {
            if !root.join(name).exists() && head.tracks(name) {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
