//! Commits — immutable snapshot nodes in the repository DAG.
//!
//! A commit records a name→blob-id tree, a message, parent links, and a
//! timestamp. Identity is a hash of (parents, message) only; timestamp
//! and tree stay outside the identity, so commits that repeat the same
//! message on the same parent deduplicate in the object store.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::hash_parts;

/// Message carried by the root commit of every repository.
pub const INITIAL_MESSAGE: &str = "initial commit";

/// Log timestamp format: `EEE MMM d HH:mm:ss yyyy Z` in the US locale.
const DATE_FORMAT: &str = "%a %b %-d %H:%M:%S %Y %z";

/// A snapshot node in the commit DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Commit {
    /// Content hash over (parents, message).
    pub id: String,
    /// Non-empty description of the change.
    pub message: String,
    /// When this commit was created (epoch for the initial commit).
    pub timestamp: DateTime<Utc>,
    /// Parent commit ids: empty for the initial commit, one for a normal
    /// commit, two for a merge (current-branch parent first).
    pub parents: Vec<String>,
    /// Mapping of file name to blob id.
    pub tree: BTreeMap<String, String>,
}

impl Commit {
    /// The root commit: empty tree, no parents, epoch timestamp.
    pub fn initial() -> Self {
        let parents = Vec::new();
        let id = compute_id(&parents, INITIAL_MESSAGE);
        Self {
            id,
            message: INITIAL_MESSAGE.to_string(),
            timestamp: DateTime::UNIX_EPOCH,
            parents,
            tree: BTreeMap::new(),
        }
    }

    /// A child commit snapshotting the given tree.
    pub fn child(message: &str, parents: Vec<String>, tree: BTreeMap<String, String>) -> Self {
        let id = compute_id(&parents, message);
        Self {
            id,
            message: message.to_string(),
            timestamp: Utc::now(),
            parents,
            tree,
        }
    }

    /// True if this commit's tree tracks the given file name.
    pub fn tracks(&self, name: &str) -> bool {
        self.tree.contains_key(name)
    }

    /// Blob id the tree maps this file name to, if tracked.
    pub fn blob_id(&self, name: &str) -> Option<&String> {
        self.tree.get(name)
    }

    /// First parent, the one on the current-branch chain.
    pub fn first_parent(&self) -> Option<&String> {
        self.parents.first()
    }
}

fn compute_id(parents: &[String], message: &str) -> String {
    let mut parts: Vec<&[u8]> = parents.iter().map(|p| p.as_bytes()).collect();
    parts.push(message.as_bytes());
    parts.push(b"Commit");
    hash_parts(&parts)
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "===\ncommit {}\nDate: {}\n{}",
            self.id,
            self.timestamp.format(DATE_FORMAT),
            self.message
        )
    }
}
