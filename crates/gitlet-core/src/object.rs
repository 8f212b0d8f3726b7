//! Content-addressable object store.
//!
//! Blobs and commits share one flat directory under `.gitlet/objects/`,
//! one file per object, filename = 40-hex id. Each record is a tagged
//! envelope `{kind, payload}` so kind discrimination never relies on
//! structural decoding.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::blob::Blob;
use crate::commit::Commit;
use crate::error::{GitletError, GitletResult};
use crate::hash::ID_LEN;

/// Length of an abbreviated object id in hex characters.
pub const SHORT_ID_LEN: usize = 8;

/// The persisted envelope around a blob or commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum Object {
    Blob(Blob),
    Commit(Commit),
}

/// The object store manages content-addressable storage on disk.
pub struct ObjectStore {
    /// Root path: `.gitlet/objects/`
    root: PathBuf,
}

impl ObjectStore {
    /// Create a new ObjectStore rooted at the given path.
    pub fn new(objects_dir: &Path) -> Self {
        Self {
            root: objects_dir.to_path_buf(),
        }
    }

    /// Store an object under its id.
    ///
    /// Writing an id that already exists is a no-op: objects are
    /// immutable and the first write wins.
    pub fn put(&self, id: &str, object: &Object) -> GitletResult<()> {
        let path = self.root.join(id);
        if path.exists() {
            return Ok(());
        }
        fs::write(&path, serde_json::to_vec(object)?)?;
        Ok(())
    }

    /// Retrieve an object by its full id.
    pub fn get(&self, id: &str) -> GitletResult<Object> {
        let path = self.root.join(id);
        if !path.exists() {
            return Err(GitletError::ObjectMissing(id.to_string()));
        }
        let bytes = fs::read(&path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Retrieve a commit by its full id, rejecting blobs.
    pub fn get_commit(&self, id: &str) -> GitletResult<Commit> {
        match self.get(id)? {
            Object::Commit(c) => Ok(c),
            Object::Blob(_) => Err(GitletError::KindMismatch {
                id: id.to_string(),
                expected: "commit",
            }),
        }
    }

    /// Retrieve a blob by its full id, rejecting commits.
    pub fn get_blob(&self, id: &str) -> GitletResult<Blob> {
        match self.get(id)? {
            Object::Blob(b) => Ok(b),
            Object::Commit(_) => Err(GitletError::KindMismatch {
                id: id.to_string(),
                expected: "blob",
            }),
        }
    }

    /// Check if an object with this full id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.root.join(id).exists()
    }

    /// Resolve a full or abbreviated id to a full id.
    ///
    /// A 40-hex id resolves by direct lookup. An 8-hex prefix is scanned
    /// against every stored id: exactly one match resolves, zero is
    /// not-found, two or more is ambiguous. Any other length is an
    /// invalid-id error.
    pub fn resolve(&self, id: &str) -> GitletResult<String> {
        if id.len() == ID_LEN {
            if self.contains(id) {
                return Ok(id.to_string());
            }
            return Err(GitletError::ObjectMissing(id.to_string()));
        }
        if id.len() != SHORT_ID_LEN {
            return Err(GitletError::InvalidId(id.to_string()));
        }

        let mut matched = None;
        for candidate in self.ids()? {
            if candidate.starts_with(id) {
                if matched.is_some() {
                    return Err(GitletError::AmbiguousId(id.to_string()));
                }
                matched = Some(candidate);
            }
        }
        matched.ok_or_else(|| GitletError::ObjectMissing(id.to_string()))
    }

    /// All object ids in the store, sorted.
    pub fn ids(&self) -> GitletResult<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            ids.push(entry.file_name().to_string_lossy().to_string());
        }
        ids.sort();
        Ok(ids)
    }

    /// Decode every stored object and return the commits.
    pub fn commits(&self) -> GitletResult<Vec<Commit>> {
        let mut commits = Vec::new();
        for id in self.ids()? {
            if let Object::Commit(c) = self.get(&id)? {
                commits.push(c);
            }
        }
        Ok(commits)
    }
}
