//! Repository — the main entry point for gitlet operations.
//!
//! A Repository value is constructed per command and owns the object
//! store, the branch registry, and the staging area. Every command is a
//! transaction: it either mutates repository state and returns Ok, or it
//! returns an error and leaves the on-disk state unchanged.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::ancestry::split_point;
use crate::blob::Blob;
use crate::branches::Branches;
use crate::commit::Commit;
use crate::error::{GitletError, GitletResult};
use crate::fsutil::{clear_working_files, working_file_names};
use crate::lock::RepoLock;
use crate::merge::{classify, conflict_bytes, MergeAction, MergeOutcome};
use crate::object::{Object, ObjectStore};
use crate::stage::Stage;
use crate::status::{compute_status, StatusReport};

/// The `.gitlet` directory name.
const GITLET_DIR: &str = ".gitlet";
/// Objects directory under `.gitlet/`.
const OBJECTS_DIR: &str = "objects";
/// Serialized branch registry under `.gitlet/`.
const BRANCHES_FILE: &str = "branches";
/// Serialized staging area under `.gitlet/`.
const STAGE_FILE: &str = "stage";
/// Branch created by `init`.
const DEFAULT_BRANCH: &str = "master";

/// A gitlet repository.
pub struct Repository {
    /// Root of the working directory (where `.gitlet/` lives).
    root: PathBuf,
    /// Path to the `.gitlet/` directory.
    gitlet_dir: PathBuf,
    /// Content-addressable object store.
    objects: ObjectStore,
    /// Branch tips and HEAD.
    branches: Branches,
    /// The staging area.
    stage: Stage,
}

impl Repository {
    /// Default lock timeout for mutating operations.
    const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

    /// Initialize a new gitlet repository in the given directory.
    ///
    /// Creates `.gitlet/`, the initial commit, and the master branch
    /// pointing at it. The stage starts equal to the (empty) initial
    /// tree.
    pub fn init(root: &Path) -> GitletResult<Self> {
        let gitlet_dir = root.join(GITLET_DIR);
        if gitlet_dir.exists() {
            return Err(GitletError::AlreadyInitialized);
        }

        fs::create_dir_all(gitlet_dir.join(OBJECTS_DIR))?;
        let objects = ObjectStore::new(&gitlet_dir.join(OBJECTS_DIR));

        let initial = Commit::initial();
        objects.put(&initial.id, &Object::Commit(initial.clone()))?;

        let branches = Branches::new(DEFAULT_BRANCH, &initial.id);
        branches.save(&gitlet_dir.join(BRANCHES_FILE))?;

        let stage = Stage::default();
        stage.save(&gitlet_dir.join(STAGE_FILE))?;

        debug!(root = %root.display(), "initialized repository");
        Ok(Self {
            root: root.to_path_buf(),
            gitlet_dir,
            objects,
            branches,
            stage,
        })
    }

    /// Open an existing gitlet repository.
    pub fn open(root: &Path) -> GitletResult<Self> {
        let gitlet_dir = root.join(GITLET_DIR);
        if !gitlet_dir.exists() {
            return Err(GitletError::NotInitialized);
        }

        let objects = ObjectStore::new(&gitlet_dir.join(OBJECTS_DIR));
        let branches = Branches::load(&gitlet_dir.join(BRANCHES_FILE))?;
        let stage = Stage::load(&gitlet_dir.join(STAGE_FILE))?;

        Ok(Self {
            root: root.to_path_buf(),
            gitlet_dir,
            objects,
            branches,
            stage,
        })
    }

    /// The commit HEAD points at.
    pub fn head_commit(&self) -> GitletResult<Commit> {
        self.objects.get_commit(&self.branches.head)
    }

    /// Stage the current contents of a working-tree file.
    ///
    /// Staging a file whose contents match HEAD is allowed; the status
    /// classifier later treats it as a no-op.
    pub fn add(&mut self, name: &str) -> GitletResult<()> {
        let _lock = self.lock()?;
        if !self.root.join(name).is_file() {
            return Err(GitletError::FileDoesNotExist);
        }

        let blob = Blob::from_working_file(&self.root, name)?;
        let id = blob.id.clone();
        self.objects.put(&id, &Object::Blob(blob))?;
        self.stage.put(name, id);
        self.save_stage()
    }

    /// Unstage a file; if HEAD tracks it, also delete the working copy.
    pub fn rm(&mut self, name: &str) -> GitletResult<()> {
        let _lock = self.lock()?;
        let head = self.head_commit()?;
        if !self.stage.contains(name) && !head.tracks(name) {
            return Err(GitletError::NoReasonToRemove);
        }

        self.stage.remove(name);
        if head.tracks(name) {
            let path = self.root.join(name);
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        self.save_stage()
    }

    /// Commit the staged tree onto the current branch.
    pub fn commit(&mut self, message: &str) -> GitletResult<Commit> {
        let _lock = self.lock()?;
        let commit = self
            .branches
            .commit(message, &self.stage, &self.objects)?;
        self.save_branches()?;
        Ok(commit)
    }

    /// History from HEAD along first parents only, newest first.
    pub fn log(&self) -> GitletResult<Vec<Commit>> {
        let mut commits = Vec::new();
        let mut current = self.head_commit()?;
        loop {
            let next = current.first_parent().cloned();
            commits.push(current);
            match next {
                Some(id) => current = self.objects.get_commit(&id)?,
                None => break,
            }
        }
        Ok(commits)
    }

    /// Every commit in the object store, unordered beyond id sorting.
    pub fn global_log(&self) -> GitletResult<Vec<Commit>> {
        self.objects.commits()
    }

    /// Ids of all commits whose message equals `message` exactly.
    pub fn find(&self, message: &str) -> GitletResult<Vec<String>> {
        Ok(self
            .objects
            .commits()?
            .into_iter()
            .filter(|c| c.message == message)
            .map(|c| c.id)
            .collect())
    }

    /// Classify the working tree against the stage and HEAD.
    pub fn status(&self) -> GitletResult<StatusReport> {
        let head = self.head_commit()?;
        compute_status(&self.root, &self.branches, &self.stage, &head)
    }

    /// Create a branch pointing at HEAD.
    pub fn branch(&mut self, name: &str) -> GitletResult<()> {
        let _lock = self.lock()?;
        if self.branches.contains(name) {
            return Err(GitletError::BranchExists);
        }
        let head = self.branches.head.clone();
        self.branches.put(name, head);
        self.save_branches()
    }

    /// Delete a branch reference. The current branch cannot be deleted.
    pub fn rm_branch(&mut self, name: &str) -> GitletResult<()> {
        let _lock = self.lock()?;
        if name == self.branches.current {
            return Err(GitletError::CannotRemoveCurrentBranch);
        }
        if !self.branches.contains(name) {
            return Err(GitletError::BranchMissing);
        }
        self.branches.remove(name);
        self.save_branches()
    }

    /// `checkout -- <file>`: restore a file from HEAD's snapshot.
    pub fn checkout_file(&mut self, name: &str) -> GitletResult<()> {
        let _lock = self.lock()?;
        let head = self.head_commit()?;
        self.restore_file(&head, name)
    }

    /// `checkout <commit-id> -- <file>`: restore a file from a commit.
    pub fn checkout_file_at(&mut self, commit_id: &str, name: &str) -> GitletResult<()> {
        let _lock = self.lock()?;
        let commit = self.read_commit_at(commit_id)?;
        self.restore_file(&commit, name)
    }

    /// `checkout <branch>`: switch branches, rewriting the working tree.
    pub fn checkout_branch(&mut self, name: &str) -> GitletResult<()> {
        let _lock = self.lock()?;
        self.switch_to_branch(name)
    }

    /// Move the current branch's tip (and HEAD) to an arbitrary commit,
    /// rewriting the working tree to its snapshot.
    pub fn reset(&mut self, commit_id: &str) -> GitletResult<()> {
        let _lock = self.lock()?;
        let target = self.read_commit_at(commit_id)?;
        let head = self.head_commit()?;
        self.check_untracked(&head, &target)?;

        clear_working_files(&self.root)?;
        self.materialize(&target)?;
        self.stage.update(&target);
        self.branches.advance(&target.id);
        self.save_branches()?;
        self.save_stage()?;
        debug!(commit = %target.id, "reset current branch");
        Ok(())
    }

    /// Merge the named branch into the current branch.
    pub fn merge(&mut self, branch_name: &str) -> GitletResult<MergeOutcome> {
        let _lock = self.lock()?;
        if branch_name == self.branches.current {
            return Err(GitletError::MergeWithSelf);
        }
        if !self.branches.contains(branch_name) {
            return Err(GitletError::BranchMissing);
        }
        let head = self.head_commit()?;
        if self.stage.diverges_from(&head, &self.root)? {
            return Err(GitletError::UncommittedChanges);
        }

        let target_tip = self
            .branches
            .tip(branch_name)
            .cloned()
            .ok_or(GitletError::BranchMissing)?;
        let target = self.objects.get_commit(&target_tip)?;
        let split_id = split_point(&self.objects, &head.id, &target.id)?;

        if split_id == target.id {
            return Ok(MergeOutcome::AlreadyAncestor);
        }
        if split_id == head.id {
            self.switch_to_branch(branch_name)?;
            return Ok(MergeOutcome::FastForwarded);
        }

        self.check_untracked(&head, &target)?;
        let split = self.objects.get_commit(&split_id)?;

        let mut names: BTreeSet<&String> = BTreeSet::new();
        names.extend(split.tree.keys());
        names.extend(head.tree.keys());
        names.extend(target.tree.keys());

        let mut changed = false;
        let mut conflict = false;

        for name in names {
            let s = split.blob_id(name).map(String::as_str);
            let c = head.blob_id(name).map(String::as_str);
            let t = target.blob_id(name).map(String::as_str);

            match classify(s, c, t) {
                MergeAction::TakeTarget => {
                    if let Some(tid) = t {
                        self.objects.get_blob(tid)?.recover(&self.root)?;
                        self.stage.put(name, tid.to_string());
                        changed = true;
                    }
                }
                MergeAction::KeepCurrent => {
                    if let Some(cid) = c {
                        self.stage.put(name, cid.to_string());
                    }
                }
                MergeAction::DeleteFile => {
                    let path = self.root.join(name);
                    if path.exists() {
                        fs::remove_file(path)?;
                    }
                    self.stage.remove(name);
                    changed = true;
                }
                MergeAction::Unstage => {
                    self.stage.remove(name);
                }
                MergeAction::Conflict => {
                    let current_bytes = match c {
                        Some(id) => Some(self.objects.get_blob(id)?.bytes),
                        None => None,
                    };
                    let target_bytes = match t {
                        Some(id) => Some(self.objects.get_blob(id)?.bytes),
                        None => None,
                    };
                    let artifact = conflict_bytes(
                        current_bytes.as_deref(),
                        target_bytes.as_deref(),
                    );

                    let blob = Blob::new(name, artifact);
                    blob.recover(&self.root)?;
                    self.objects.put(&blob.id, &Object::Blob(blob.clone()))?;
                    self.stage.put(name, blob.id);
                    changed = true;
                    conflict = true;
                }
                MergeAction::Untouched => {}
            }
        }

        if !changed {
            return Err(GitletError::NothingToMerge);
        }

        let message = format!("Merged {} into {}.", branch_name, self.branches.current);
        let merge_commit = Commit::child(
            &message,
            vec![head.id.clone(), target.id.clone()],
            self.stage.tree.clone(),
        );
        self.objects
            .put(&merge_commit.id, &Object::Commit(merge_commit.clone()))?;
        self.branches.advance(&merge_commit.id);
        self.save_branches()?;
        self.save_stage()?;
        debug!(commit = %merge_commit.id, conflict, "merged branch");
        Ok(MergeOutcome::Merged { conflict })
    }

    /// The split point of two commits, by full or abbreviated id.
    pub fn split(&self, id1: &str, id2: &str) -> GitletResult<Commit> {
        let a = self.read_commit_at(id1)?;
        let b = self.read_commit_at(id2)?;
        let split_id = split_point(&self.objects, &a.id, &b.id)?;
        self.objects.get_commit(&split_id)
    }

    // --- Internal helpers ---

    fn lock(&self) -> GitletResult<RepoLock> {
        RepoLock::acquire(&self.gitlet_dir.join(OBJECTS_DIR), Self::LOCK_TIMEOUT)
    }

    fn save_branches(&self) -> GitletResult<()> {
        self.branches.save(&self.gitlet_dir.join(BRANCHES_FILE))
    }

    fn save_stage(&self) -> GitletResult<()> {
        self.stage.save(&self.gitlet_dir.join(STAGE_FILE))
    }

    /// Resolve a user-supplied commit id. Ids that resolve to nothing, or
    /// to a blob, report "no commit with that id"; malformed and
    /// ambiguous ids keep their own diagnostics.
    fn read_commit_at(&self, id: &str) -> GitletResult<Commit> {
        let full = match self.objects.resolve(id) {
            Ok(full) => full,
            Err(GitletError::ObjectMissing(_)) => return Err(GitletError::NoSuchCommit),
            Err(e) => return Err(e),
        };
        match self.objects.get_commit(&full) {
            Ok(commit) => Ok(commit),
            Err(GitletError::KindMismatch { .. }) => Err(GitletError::NoSuchCommit),
            Err(e) => Err(e),
        }
    }

    fn restore_file(&self, commit: &Commit, name: &str) -> GitletResult<()> {
        match commit.blob_id(name) {
            Some(blob_id) => self.objects.get_blob(blob_id)?.recover(&self.root),
            None => Err(GitletError::FileNotInCommit),
        }
    }

    /// Branch-switch body, shared with merge's fast-forward path (which
    /// already holds the repository lock).
    fn switch_to_branch(&mut self, name: &str) -> GitletResult<()> {
        if !self.branches.contains(name) {
            return Err(GitletError::NoSuchBranch);
        }
        if name == self.branches.current {
            return Err(GitletError::CheckoutCurrentBranch);
        }

        let tip = self
            .branches
            .tip(name)
            .cloned()
            .ok_or(GitletError::BranchMissing)?;
        let target = self.objects.get_commit(&tip)?;
        let head = self.head_commit()?;
        self.check_untracked(&head, &target)?;

        clear_working_files(&self.root)?;
        self.materialize(&target)?;
        self.stage.update(&target);
        self.branches.switch(name)?;
        self.save_branches()?;
        self.save_stage()?;
        debug!(branch = name, "switched branch");
        Ok(())
    }

    /// Abort if any working-tree file untracked by `head` would be
    /// overwritten by materialising `target`.
    fn check_untracked(&self, head: &Commit, target: &Commit) -> GitletResult<()> {
        for name in working_file_names(&self.root)? {
            if !head.tracks(&name) && target.tracks(&name) {
                return Err(GitletError::UntrackedInTheWay);
            }
        }
        Ok(())
    }

    /// Write every file in a commit's tree into the working directory.
    fn materialize(&self, commit: &Commit) -> GitletResult<()> {
        for blob_id in commit.tree.values() {
            self.objects.get_blob(blob_id)?.recover(&self.root)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn init_repo() -> (TempDir, Repository) {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    fn write_file(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).unwrap();
    }

    fn read_file(dir: &TempDir, name: &str) -> String {
        fs::read_to_string(dir.path().join(name)).unwrap()
    }

    fn add_commit(repo: &mut Repository, dir: &TempDir, name: &str, contents: &str, msg: &str) {
        write_file(dir, name, contents);
        repo.add(name).unwrap();
        repo.commit(msg).unwrap();
    }

    #[test]
    fn test_init_creates_structure() {
        let (dir, repo) = init_repo();

        assert!(dir.path().join(".gitlet/objects").is_dir());
        assert!(dir.path().join(".gitlet/branches").is_file());
        assert!(dir.path().join(".gitlet/stage").is_file());

        let head = repo.head_commit().unwrap();
        assert_eq!(head.message, "initial commit");
        assert!(head.tree.is_empty());
        assert_eq!(repo.branches.current, "master");
    }

    #[test]
    fn test_init_twice_fails() {
        let (dir, _repo) = init_repo();
        let result = Repository::init(dir.path());
        assert!(matches!(result, Err(GitletError::AlreadyInitialized)));
    }

    #[test]
    fn test_open_without_init_fails() {
        let dir = tempdir().unwrap();
        let result = Repository::open(dir.path());
        assert!(matches!(result, Err(GitletError::NotInitialized)));
    }

    #[test]
    fn test_add_stages_and_stores_blob() {
        let (dir, mut repo) = init_repo();
        write_file(&dir, "a.txt", "hi");

        repo.add("a.txt").unwrap();
        let staged = repo.stage.blob_id("a.txt").cloned().unwrap();
        assert!(repo.objects.contains(&staged));

        // Reopening sees the persisted stage.
        let reopened = Repository::open(dir.path()).unwrap();
        assert_eq!(reopened.stage.blob_id("a.txt"), Some(&staged));
    }

    #[test]
    fn test_add_missing_file() {
        let (_dir, mut repo) = init_repo();
        let result = repo.add("ghost.txt");
        assert!(matches!(result, Err(GitletError::FileDoesNotExist)));
    }

    #[test]
    fn test_add_twice_is_idempotent_on_store() {
        let (dir, mut repo) = init_repo();
        write_file(&dir, "a.txt", "hi");

        repo.add("a.txt").unwrap();
        let count = repo.objects.ids().unwrap().len();
        repo.add("a.txt").unwrap();
        assert_eq!(repo.objects.ids().unwrap().len(), count);
    }

    #[test]
    fn test_commit_and_log() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "hi", "one");

        let head = repo.head_commit().unwrap();
        assert!(head.tracks("a.txt"));
        assert_eq!(head.parents.len(), 1);

        let log = repo.log().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].message, "one");
        assert_eq!(log[1].message, "initial commit");
    }

    #[test]
    fn test_commit_empty_message() {
        let (dir, mut repo) = init_repo();
        write_file(&dir, "a.txt", "hi");
        repo.add("a.txt").unwrap();

        let result = repo.commit("");
        assert!(matches!(result, Err(GitletError::EmptyCommitMessage)));
    }

    #[test]
    fn test_commit_without_staged_changes() {
        let (dir, mut repo) = init_repo();
        let result = repo.commit("nothing");
        assert!(matches!(result, Err(GitletError::NoChangesAdded)));

        // Re-adding an unchanged file stages the same tree again.
        add_commit(&mut repo, &dir, "a.txt", "hi", "one");
        repo.add("a.txt").unwrap();
        let result = repo.commit("still nothing");
        assert!(matches!(result, Err(GitletError::NoChangesAdded)));
    }

    #[test]
    fn test_stage_matches_head_after_commit() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "hi", "one");
        assert_eq!(repo.stage.tree, repo.head_commit().unwrap().tree);
    }

    #[test]
    fn test_rm_deletes_and_unstages() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "hi", "one");

        repo.rm("a.txt").unwrap();
        assert!(!dir.path().join("a.txt").exists());
        assert!(!repo.stage.contains("a.txt"));

        let report = repo.status().unwrap();
        assert_eq!(report.removed, vec!["a.txt"]);
    }

    #[test]
    fn test_rm_staged_only_keeps_working_file() {
        let (dir, mut repo) = init_repo();
        write_file(&dir, "new.txt", "n");
        repo.add("new.txt").unwrap();

        repo.rm("new.txt").unwrap();
        assert!(dir.path().join("new.txt").exists());
        assert!(!repo.stage.contains("new.txt"));
    }

    #[test]
    fn test_rm_without_reason() {
        let (dir, mut repo) = init_repo();
        write_file(&dir, "stray.txt", "s");

        let result = repo.rm("stray.txt");
        assert!(matches!(result, Err(GitletError::NoReasonToRemove)));
    }

    #[test]
    fn test_branch_and_switch() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "aaa", "one");

        repo.branch("dev").unwrap();
        add_commit(&mut repo, &dir, "b.txt", "bbb", "two");

        repo.checkout_branch("dev").unwrap();
        assert!(dir.path().join("a.txt").exists());
        assert!(!dir.path().join("b.txt").exists());
        assert_eq!(repo.branches.current, "dev");
        assert_eq!(repo.stage.tree, repo.head_commit().unwrap().tree);
    }

    #[test]
    fn test_checkout_roundtrip_preserves_bytes() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "original", "one");
        repo.branch("dev").unwrap();
        add_commit(&mut repo, &dir, "a.txt", "changed", "two");

        repo.checkout_branch("dev").unwrap();
        assert_eq!(read_file(&dir, "a.txt"), "original");
        repo.checkout_branch("master").unwrap();
        assert_eq!(read_file(&dir, "a.txt"), "changed");
    }

    #[test]
    fn test_branch_duplicate() {
        let (_dir, mut repo) = init_repo();
        repo.branch("dev").unwrap();
        assert!(matches!(
            repo.branch("dev"),
            Err(GitletError::BranchExists)
        ));
    }

    #[test]
    fn test_rm_branch() {
        let (_dir, mut repo) = init_repo();
        repo.branch("dev").unwrap();
        repo.rm_branch("dev").unwrap();
        assert!(!repo.branches.contains("dev"));

        assert!(matches!(
            repo.rm_branch("dev"),
            Err(GitletError::BranchMissing)
        ));
        assert!(matches!(
            repo.rm_branch("master"),
            Err(GitletError::CannotRemoveCurrentBranch)
        ));
    }

    #[test]
    fn test_checkout_branch_errors() {
        let (_dir, mut repo) = init_repo();
        assert!(matches!(
            repo.checkout_branch("nope"),
            Err(GitletError::NoSuchBranch)
        ));
        assert!(matches!(
            repo.checkout_branch("master"),
            Err(GitletError::CheckoutCurrentBranch)
        ));
    }

    #[test]
    fn test_checkout_file_restores_from_head() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "committed", "one");
        write_file(&dir, "a.txt", "scribbled");

        repo.checkout_file("a.txt").unwrap();
        assert_eq!(read_file(&dir, "a.txt"), "committed");
    }

    #[test]
    fn test_checkout_file_untracked_in_head() {
        let (_dir, mut repo) = init_repo();
        assert!(matches!(
            repo.checkout_file("ghost.txt"),
            Err(GitletError::FileNotInCommit)
        ));
    }

    #[test]
    fn test_checkout_file_at_commit_and_short_id() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "v1", "one");
        let first = repo.head_commit().unwrap().id;
        add_commit(&mut repo, &dir, "a.txt", "v2", "two");

        repo.checkout_file_at(&first, "a.txt").unwrap();
        assert_eq!(read_file(&dir, "a.txt"), "v1");

        write_file(&dir, "a.txt", "scribbled");
        repo.checkout_file_at(&first[..8], "a.txt").unwrap();
        assert_eq!(read_file(&dir, "a.txt"), "v1");
    }

    #[test]
    fn test_checkout_file_at_bad_ids() {
        let (_dir, mut repo) = init_repo();
        assert!(matches!(
            repo.checkout_file_at(&"0".repeat(40), "a.txt"),
            Err(GitletError::NoSuchCommit)
        ));
        assert!(matches!(
            repo.checkout_file_at("abc", "a.txt"),
            Err(GitletError::InvalidId(_))
        ));
    }

    #[test]
    fn test_checkout_file_at_blob_id_is_no_commit() {
        let (dir, mut repo) = init_repo();
        write_file(&dir, "a.txt", "hi");
        repo.add("a.txt").unwrap();
        let blob_id = repo.stage.blob_id("a.txt").cloned().unwrap();

        assert!(matches!(
            repo.checkout_file_at(&blob_id, "a.txt"),
            Err(GitletError::NoSuchCommit)
        ));
    }

    #[test]
    fn test_reset_moves_branch_tip() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "v1", "one");
        let first = repo.head_commit().unwrap().id;
        add_commit(&mut repo, &dir, "a.txt", "v2", "two");
        add_commit(&mut repo, &dir, "b.txt", "bbb", "three");

        repo.reset(&first[..8]).unwrap();
        assert_eq!(repo.branches.head, first);
        assert_eq!(repo.branches.tip("master"), Some(&first));
        assert_eq!(read_file(&dir, "a.txt"), "v1");
        assert!(!dir.path().join("b.txt").exists());
        assert_eq!(repo.stage.tree, repo.head_commit().unwrap().tree);
    }

    #[test]
    fn test_untracked_file_blocks_checkout() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "aaa", "one");
        repo.branch("dev").unwrap();
        repo.checkout_branch("dev").unwrap();
        add_commit(&mut repo, &dir, "x.txt", "1", "on dev");

        repo.checkout_branch("master").unwrap();
        write_file(&dir, "x.txt", "U");

        let result = repo.checkout_branch("dev");
        assert!(matches!(result, Err(GitletError::UntrackedInTheWay)));
        assert_eq!(read_file(&dir, "x.txt"), "U");
        assert_eq!(repo.branches.current, "master");
    }

    #[test]
    fn test_fast_forward_merge() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "aaa", "one");
        repo.branch("dev").unwrap();
        repo.checkout_branch("dev").unwrap();
        add_commit(&mut repo, &dir, "b.txt", "bbb", "two");

        repo.checkout_branch("master").unwrap();
        let outcome = repo.merge("dev").unwrap();
        assert_eq!(outcome, MergeOutcome::FastForwarded);
        assert_eq!(repo.branches.tip("master"), repo.branches.tip("dev"));
        assert!(dir.path().join("b.txt").exists());
    }

    #[test]
    fn test_merge_ancestor_is_noop() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "aaa", "one");
        repo.branch("dev").unwrap();
        add_commit(&mut repo, &dir, "a.txt", "aaa2", "two");

        let tip_before = repo.branches.head.clone();
        let outcome = repo.merge("dev").unwrap();
        assert_eq!(outcome, MergeOutcome::AlreadyAncestor);
        assert_eq!(repo.branches.head, tip_before);
    }

    #[test]
    fn test_merge_preflight_errors() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "aaa", "one");

        assert!(matches!(
            repo.merge("master"),
            Err(GitletError::MergeWithSelf)
        ));
        // Unknown branch reports before uncommitted changes.
        write_file(&dir, "b.txt", "b");
        repo.add("b.txt").unwrap();
        assert!(matches!(
            repo.merge("nope"),
            Err(GitletError::BranchMissing)
        ));

        repo.branch("dev").unwrap();
        assert!(matches!(
            repo.merge("dev"),
            Err(GitletError::UncommittedChanges)
        ));
    }

    #[test]
    fn test_merge_conflict_materialises_markers() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "A", "base");
        repo.branch("dev").unwrap();
        repo.checkout_branch("dev").unwrap();
        add_commit(&mut repo, &dir, "a.txt", "B", "B");
        repo.checkout_branch("master").unwrap();
        add_commit(&mut repo, &dir, "a.txt", "C", "C");

        let outcome = repo.merge("dev").unwrap();
        assert_eq!(outcome, MergeOutcome::Merged { conflict: true });
        assert_eq!(
            read_file(&dir, "a.txt"),
            "<<<<<<< HEAD\nC=======\nB>>>>>>>\n"
        );

        let merge_commit = repo.head_commit().unwrap();
        assert_eq!(merge_commit.parents.len(), 2);
        assert_eq!(merge_commit.message, "Merged dev into master.");
        // First parent is the current-branch chain.
        let log = repo.log().unwrap();
        assert_eq!(log[1].message, "C");
    }

    #[test]
    fn test_merge_takes_target_modification() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "aaa", "base a");
        add_commit(&mut repo, &dir, "b.txt", "bbb", "base b");
        repo.branch("dev").unwrap();
        repo.checkout_branch("dev").unwrap();
        add_commit(&mut repo, &dir, "b.txt", "patched", "patch b");
        repo.checkout_branch("master").unwrap();
        add_commit(&mut repo, &dir, "a.txt", "tweaked", "tweak a");

        let outcome = repo.merge("dev").unwrap();
        assert_eq!(outcome, MergeOutcome::Merged { conflict: false });
        assert_eq!(read_file(&dir, "b.txt"), "patched");
        assert_eq!(read_file(&dir, "a.txt"), "tweaked");

        let tree = &repo.head_commit().unwrap().tree;
        assert!(tree.contains_key("a.txt"));
        assert!(tree.contains_key("b.txt"));
    }

    #[test]
    fn test_merge_removes_file_deleted_in_target() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "aaa", "base a");
        add_commit(&mut repo, &dir, "b.txt", "bbb", "base b");
        repo.branch("dev").unwrap();
        repo.checkout_branch("dev").unwrap();
        repo.rm("b.txt").unwrap();
        repo.commit("drop b").unwrap();
        repo.checkout_branch("master").unwrap();
        add_commit(&mut repo, &dir, "a.txt", "tweaked", "tweak a");

        let outcome = repo.merge("dev").unwrap();
        assert_eq!(outcome, MergeOutcome::Merged { conflict: false });
        assert!(!dir.path().join("b.txt").exists());
        assert!(!repo.head_commit().unwrap().tracks("b.txt"));
    }

    #[test]
    fn test_merge_with_no_effective_changes() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "base", "base");
        repo.branch("dev").unwrap();
        repo.checkout_branch("dev").unwrap();
        add_commit(&mut repo, &dir, "a.txt", "M", "same change on dev");
        repo.checkout_branch("master").unwrap();
        add_commit(&mut repo, &dir, "a.txt", "M", "same change on master");

        let tip_before = repo.branches.head.clone();
        let result = repo.merge("dev");
        assert!(matches!(result, Err(GitletError::NothingToMerge)));
        assert_eq!(repo.branches.head, tip_before);
        assert_eq!(read_file(&dir, "a.txt"), "M");
    }

    #[test]
    fn test_merge_untracked_file_in_the_way() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "aaa", "base");
        repo.branch("dev").unwrap();
        repo.checkout_branch("dev").unwrap();
        add_commit(&mut repo, &dir, "x.txt", "from dev", "add x");
        repo.checkout_branch("master").unwrap();
        add_commit(&mut repo, &dir, "a.txt", "advance", "advance master");
        write_file(&dir, "x.txt", "U");

        let result = repo.merge("dev");
        assert!(matches!(result, Err(GitletError::UntrackedInTheWay)));
        assert_eq!(read_file(&dir, "x.txt"), "U");
    }

    #[test]
    fn test_find_by_message() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "v1", "same");
        add_commit(&mut repo, &dir, "a.txt", "v2", "same");
        add_commit(&mut repo, &dir, "a.txt", "v3", "different");

        assert_eq!(repo.find("same").unwrap().len(), 2);
        assert_eq!(repo.find("different").unwrap().len(), 1);
        assert!(repo.find("missing").unwrap().is_empty());
    }

    #[test]
    fn test_global_log_sees_all_branches() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "aaa", "one");
        repo.branch("dev").unwrap();
        repo.checkout_branch("dev").unwrap();
        add_commit(&mut repo, &dir, "b.txt", "bbb", "on dev");
        repo.checkout_branch("master").unwrap();

        // initial + one + on dev, despite HEAD not reaching "on dev".
        assert_eq!(repo.global_log().unwrap().len(), 3);
        assert_eq!(repo.log().unwrap().len(), 2);
    }

    #[test]
    fn test_split_of_branch_tips() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "aaa", "fork point");
        let fork = repo.head_commit().unwrap().id;
        repo.branch("dev").unwrap();
        repo.checkout_branch("dev").unwrap();
        add_commit(&mut repo, &dir, "a.txt", "dev side", "dev work");
        let dev_tip = repo.head_commit().unwrap().id;
        repo.checkout_branch("master").unwrap();
        add_commit(&mut repo, &dir, "a.txt", "master side", "master work");
        let master_tip = repo.head_commit().unwrap().id;

        let split = repo.split(&master_tip, &dev_tip).unwrap();
        assert_eq!(split.id, fork);
    }

    #[test]
    fn test_reachable_blobs_exist() {
        let (dir, mut repo) = init_repo();
        add_commit(&mut repo, &dir, "a.txt", "aaa", "one");
        repo.branch("dev").unwrap();
        repo.checkout_branch("dev").unwrap();
        add_commit(&mut repo, &dir, "b.txt", "bbb", "two");

        for commit in repo.global_log().unwrap() {
            for blob_id in commit.tree.values() {
                assert!(repo.objects.contains(blob_id));
                assert!(repo.objects.get_blob(blob_id).is_ok());
            }
            for parent in &commit.parents {
                assert!(repo.objects.contains(parent));
            }
        }
    }
}
