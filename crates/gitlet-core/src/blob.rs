//! Blobs — immutable snapshots of one file's bytes under a given name.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GitletResult;
use crate::hash::hash_parts;

/// Compute the id a blob with this name and content would have.
///
/// Identity covers BOTH the file name and the bytes: the same content
/// under two different names yields two distinct blobs.
pub fn blob_id(name: &str, bytes: &[u8]) -> String {
    hash_parts(&[name.as_bytes(), bytes, b"Blob"])
}

/// A content-addressed snapshot of one working-tree file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Blob {
    /// Content hash over (name, bytes).
    pub id: String,
    /// File name this snapshot was taken under.
    pub name: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl Blob {
    /// Create a blob from a name and its content, computing the id.
    pub fn new(name: &str, bytes: Vec<u8>) -> Self {
        let id = blob_id(name, &bytes);
        Self {
            id,
            name: name.to_string(),
            bytes,
        }
    }

    /// Snapshot a file currently in the working directory.
    pub fn from_working_file(root: &Path, name: &str) -> GitletResult<Self> {
        let bytes = fs::read(root.join(name))?;
        Ok(Self::new(name, bytes))
    }

    /// Write this blob's bytes back into the working directory,
    /// overwriting unconditionally.
    pub fn recover(&self, root: &Path) -> GitletResult<()> {
        fs::write(root.join(&self.name), &self.bytes)?;
        Ok(())
    }
}

impl PartialEq for Blob {
    /// Two blobs compare equal iff their ids are equal.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Blob {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_id_covers_name_and_bytes() {
        let a = Blob::new("a.txt", b"same".to_vec());
        let b = Blob::new("b.txt", b"same".to_vec());
        let a2 = Blob::new("a.txt", b"other".to_vec());

        assert_ne!(a.id, b.id);
        assert_ne!(a.id, a2.id);
        assert_eq!(a, Blob::new("a.txt", b"same".to_vec()));
    }

    #[test]
    fn test_from_working_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("f.txt"), b"hello").unwrap();

        let blob = Blob::from_working_file(dir.path(), "f.txt").unwrap();
        assert_eq!(blob.bytes, b"hello");
        assert_eq!(blob.id, blob_id("f.txt", b"hello"));
    }

    #[test]
    fn test_recover_overwrites() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("f.txt"), b"stale").unwrap();

        let blob = Blob::new("f.txt", b"fresh".to_vec());
        blob.recover(dir.path()).unwrap();
        assert_eq!(fs::read(dir.path().join("f.txt")).unwrap(), b"fresh");
    }
}
