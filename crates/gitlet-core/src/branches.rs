//! The branch registry: named tips, the current branch, and HEAD.
//!
//! Stored as `.gitlet/branches`. After every successful operation
//! `tips[current] == head` holds.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commit::Commit;
use crate::error::{GitletError, GitletResult};
use crate::fsutil::atomic_write;
use crate::object::{Object, ObjectStore};
use crate::stage::Stage;

/// Branch tips plus HEAD state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Branches {
    /// Map of branch name -> tip commit id.
    pub tips: BTreeMap<String, String>,
    /// Name of the active branch; always a key of `tips`.
    pub current: String,
    /// Commit id currently checked out; equals `tips[current]`.
    pub head: String,
}

impl Branches {
    /// A fresh registry with a single branch pointing at `head_id`.
    pub fn new(current: &str, head_id: &str) -> Self {
        let mut tips = BTreeMap::new();
        tips.insert(current.to_string(), head_id.to_string());
        Self {
            tips,
            current: current.to_string(),
            head: head_id.to_string(),
        }
    }

    /// Load the registry from disk.
    pub fn load(path: &Path) -> GitletResult<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Save the registry to disk (atomic: temp + fsync + rename).
    pub fn save(&self, path: &Path) -> GitletResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path, json.as_bytes())
    }

    /// Add or move a branch tip.
    pub fn put(&mut self, name: &str, commit_id: String) {
        self.tips.insert(name.to_string(), commit_id);
    }

    /// Remove a branch entry.
    pub fn remove(&mut self, name: &str) {
        self.tips.remove(name);
    }

    /// Check if a branch with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tips.contains_key(name)
    }

    /// Tip commit id of a branch.
    pub fn tip(&self, name: &str) -> Option<&String> {
        self.tips.get(name)
    }

    /// Make `name` the active branch and point HEAD at its tip.
    pub fn switch(&mut self, name: &str) -> GitletResult<()> {
        let tip = self
            .tips
            .get(name)
            .ok_or(GitletError::BranchMissing)?
            .clone();
        self.current = name.to_string();
        self.head = tip;
        Ok(())
    }

    /// Move the current branch's tip (and HEAD) to a commit.
    pub fn advance(&mut self, commit_id: &str) {
        self.tips
            .insert(self.current.clone(), commit_id.to_string());
        self.head = commit_id.to_string();
    }

    /// Create a child commit of HEAD from the staged tree and advance the
    /// current branch to it.
    ///
    /// Refuses an empty message, and refuses a staged tree identical to
    /// the parent's.
    pub fn commit(
        &mut self,
        message: &str,
        stage: &Stage,
        objects: &ObjectStore,
    ) -> GitletResult<Commit> {
        if message.is_empty() {
            return Err(GitletError::EmptyCommitMessage);
        }
        let parent = objects.get_commit(&self.head)?;
        if stage.tree == parent.tree {
            return Err(GitletError::NoChangesAdded);
        }

        let child = Commit::child(message, vec![self.head.clone()], stage.tree.clone());
        objects.put(&child.id, &Object::Commit(child.clone()))?;
        self.advance(&child.id);
        debug!(commit = %child.id, branch = %self.current, "created commit");
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_with_initial(dir: &Path) -> (ObjectStore, Commit) {
        let store = ObjectStore::new(dir);
        let initial = Commit::initial();
        store
            .put(&initial.id, &Object::Commit(initial.clone()))
            .unwrap();
        (store, initial)
    }

    #[test]
    fn test_new_registry_invariant() {
        let branches = Branches::new("master", "abc");
        assert_eq!(branches.tip("master"), Some(&"abc".to_string()));
        assert_eq!(branches.head, "abc");
        assert_eq!(branches.tips[&branches.current], branches.head);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("branches");

        let mut branches = Branches::new("master", "abc");
        branches.put("dev", "def".to_string());
        branches.save(&path).unwrap();

        let loaded = Branches::load(&path).unwrap();
        assert_eq!(loaded.tip("dev"), Some(&"def".to_string()));
        assert_eq!(loaded.current, "master");
    }

    #[test]
    fn test_switch_moves_head() {
        let mut branches = Branches::new("master", "abc");
        branches.put("dev", "def".to_string());

        branches.switch("dev").unwrap();
        assert_eq!(branches.current, "dev");
        assert_eq!(branches.head, "def");
    }

    #[test]
    fn test_switch_unknown_branch() {
        let mut branches = Branches::new("master", "abc");
        assert!(matches!(
            branches.switch("nope"),
            Err(GitletError::BranchMissing)
        ));
    }

    #[test]
    fn test_commit_advances_tip_and_head() {
        let dir = tempdir().unwrap();
        let (store, initial) = store_with_initial(dir.path());
        let mut branches = Branches::new("master", &initial.id);

        let mut stage = Stage::default();
        stage.put("a.txt", "0".repeat(40));

        let child = branches.commit("one", &stage, &store).unwrap();
        assert_eq!(branches.head, child.id);
        assert_eq!(branches.tip("master"), Some(&child.id));
        assert_eq!(child.parents, vec![initial.id]);
        assert!(store.contains(&child.id));
    }

    #[test]
    fn test_commit_empty_message() {
        let dir = tempdir().unwrap();
        let (store, initial) = store_with_initial(dir.path());
        let mut branches = Branches::new("master", &initial.id);

        let result = branches.commit("", &Stage::default(), &store);
        assert!(matches!(result, Err(GitletError::EmptyCommitMessage)));
    }

    #[test]
    fn test_commit_without_changes() {
        let dir = tempdir().unwrap();
        let (store, initial) = store_with_initial(dir.path());
        let mut branches = Branches::new("master", &initial.id);

        // Stage matches the (empty) initial tree.
        let result = branches.commit("nothing", &Stage::default(), &store);
        assert!(matches!(result, Err(GitletError::NoChangesAdded)));
    }
}
