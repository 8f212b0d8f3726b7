//! Error types for gitlet operations.

use std::fmt;
use std::io;

/// All possible gitlet errors.
///
/// User-facing variants render the single-line diagnostics the command
/// surface promises; the process still exits 0 for those. Structural
/// variants (I/O, codec, missing internal objects) exit non-zero.
#[derive(Debug)]
pub enum GitletError {
    /// The current directory is not a gitlet repository.
    NotInitialized,
    /// A gitlet repository already exists here.
    AlreadyInitialized,
    /// `add` was given a file that is not in the working tree.
    FileDoesNotExist,
    /// `rm` was given a file that is neither staged nor tracked by HEAD.
    NoReasonToRemove,
    /// `commit` was given an empty message.
    EmptyCommitMessage,
    /// The staged tree is identical to the parent commit's tree.
    NoChangesAdded,
    /// A user-supplied commit id did not resolve to a commit.
    NoSuchCommit,
    /// The named file is not tracked by the requested commit.
    FileNotInCommit,
    /// `checkout` was given an unknown branch name.
    NoSuchBranch,
    /// `merge`/`rm-branch` was given an unknown branch name.
    BranchMissing,
    /// `branch` was given a name that is already taken.
    BranchExists,
    /// The current branch cannot be deleted.
    CannotRemoveCurrentBranch,
    /// Checking out the branch that is already current.
    CheckoutCurrentBranch,
    /// An untracked working-tree file would be overwritten.
    UntrackedInTheWay,
    /// Merging a branch into itself.
    MergeWithSelf,
    /// The stage or working tree diverges from HEAD.
    UncommittedChanges,
    /// The three-way merge produced no change to the current tip.
    NothingToMerge,
    /// A command was invoked with the wrong operand shape.
    IncorrectOperands,
    /// A short id prefix matched more than one object.
    AmbiguousId(String),
    /// An id was neither 40 nor 8 hex characters long.
    InvalidId(String),
    /// An object referenced by repository state is missing from the store.
    ObjectMissing(String),
    /// An object decoded as the wrong kind.
    KindMismatch { id: String, expected: &'static str },
    /// Repository state failed an internal consistency check.
    Corrupt(String),
    /// An I/O error occurred.
    Io(io::Error),
    /// JSON serialization/deserialization failed.
    Json(serde_json::Error),
    /// Could not acquire the repository lock within the timeout.
    LockTimeout,
}

impl fmt::Display for GitletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitletError::NotInitialized => {
                write!(f, "Not in an initialized Gitlet directory.")
            }
            GitletError::AlreadyInitialized => write!(
                f,
                "A Gitlet version-control system already exists in the current directory."
            ),
            GitletError::FileDoesNotExist => write!(f, "File does not exist."),
            GitletError::NoReasonToRemove => write!(f, "No reason to remove the file."),
            GitletError::EmptyCommitMessage => write!(f, "Please enter a commit message."),
            GitletError::NoChangesAdded => write!(f, "No changes added to the commit."),
            GitletError::NoSuchCommit => write!(f, "No commit with that id exists."),
            GitletError::FileNotInCommit => write!(f, "File does not exist in that commit."),
            GitletError::NoSuchBranch => write!(f, "No such branch exists."),
            GitletError::BranchMissing => {
                write!(f, "A branch with that name does not exist.")
            }
            GitletError::BranchExists => {
                write!(f, "A branch with that name already exists.")
            }
            GitletError::CannotRemoveCurrentBranch => {
                write!(f, "Cannot remove the current branch.")
            }
            GitletError::CheckoutCurrentBranch => {
                write!(f, "No need to checkout the current branch.")
            }
            GitletError::UntrackedInTheWay => write!(
                f,
                "There is an untracked file in the way; delete it, or add and commit it first."
            ),
            GitletError::MergeWithSelf => write!(f, "Cannot merge a branch with itself."),
            GitletError::UncommittedChanges => write!(f, "You have uncommitted changes."),
            GitletError::NothingToMerge => write!(f, "No changes to merge."),
            GitletError::IncorrectOperands => write!(f, "Incorrect operands."),
            GitletError::AmbiguousId(prefix) => {
                write!(f, "Ambiguous short id: multiple objects share prefix {prefix}.")
            }
            GitletError::InvalidId(id) => write!(f, "Invalid id format: {id}."),
            GitletError::ObjectMissing(id) => write!(f, "object not found: {id}"),
            GitletError::KindMismatch { id, expected } => {
                write!(f, "object {id} is not a {expected}")
            }
            GitletError::Corrupt(msg) => write!(f, "corrupt repository: {msg}"),
            GitletError::Io(e) => write!(f, "I/O error: {e}"),
            GitletError::Json(e) => write!(f, "JSON error: {e}"),
            GitletError::LockTimeout => {
                write!(f, "could not acquire repository lock within timeout")
            }
        }
    }
}

impl std::error::Error for GitletError {}

impl From<io::Error> for GitletError {
    fn from(e: io::Error) -> Self {
        GitletError::Io(e)
    }
}

impl From<serde_json::Error> for GitletError {
    fn from(e: serde_json::Error) -> Self {
        GitletError::Json(e)
    }
}

impl GitletError {
    /// Process exit code for this error: 0 for user-facing diagnostics,
    /// 1 for structural failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            GitletError::ObjectMissing(_)
            | GitletError::KindMismatch { .. }
            | GitletError::Corrupt(_)
            | GitletError::Io(_)
            | GitletError::Json(_)
            | GitletError::LockTimeout => 1,
            _ => 0,
        }
    }
}

/// Convenience alias for Results in gitlet.
pub type GitletResult<T> = Result<T, GitletError>;
