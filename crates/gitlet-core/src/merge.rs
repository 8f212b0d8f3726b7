//! The three-way merge rule and conflict materialisation.
//!
//! For every file name in the union of the split, current, and target
//! trees, the eight-case table classifies what the merge does with that
//! file. The classifier is pure — it sees only the three optional blob
//! ids; the repository layer carries out the actions.

/// What the three-way rule decided for one file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// Materialise the target's blob and stage it (cases 1 and 5).
    TakeTarget,
    /// Keep the current side and stage it (cases 2, 3, and 4).
    KeepCurrent,
    /// Delete the working file and unstage it (case 6).
    DeleteFile,
    /// Leave the file absent and unstage it (case 7).
    Unstage,
    /// Both sides changed it divergently (case 8).
    Conflict,
    /// No case fired; the file is the same everywhere that matters.
    Untouched,
}

impl MergeAction {
    /// True if carrying out this action changes repository state relative
    /// to the current tip. Actions that restate what the current tip
    /// already has do not count toward a mergeable change.
    pub fn changes_current(self) -> bool {
        matches!(
            self,
            MergeAction::TakeTarget | MergeAction::DeleteFile | MergeAction::Conflict
        )
    }
}

/// Apply the eight-case table to the split/current/target blob ids of a
/// single file name. The first matching case wins.
pub fn classify(s: Option<&str>, c: Option<&str>, t: Option<&str>) -> MergeAction {
    let eq_cs = c == s;
    let eq_ts = t == s;
    let eq_ct = c == t;

    // 1. Modified only in target
    if eq_cs && !eq_ts && t.is_some() {
        return MergeAction::TakeTarget;
    }
    // 2. Modified only in current
    if !eq_cs && eq_ts && c.is_some() {
        return MergeAction::KeepCurrent;
    }
    // 3. Same change on both sides
    if !eq_cs && !eq_ts && eq_ct && c.is_some() {
        return MergeAction::KeepCurrent;
    }
    // 4. Added only in current
    if s.is_none() && c.is_some() && t.is_none() {
        return MergeAction::KeepCurrent;
    }
    // 5. Added only in target
    if s.is_none() && c.is_none() && t.is_some() {
        return MergeAction::TakeTarget;
    }
    // 6. Removed only in target
    if s.is_some() && eq_cs && t.is_none() {
        return MergeAction::DeleteFile;
    }
    // 7. Removed only in current
    if s.is_some() && eq_ts && c.is_none() {
        return MergeAction::Unstage;
    }
    // 8. Divergent change
    if !eq_ct {
        return MergeAction::Conflict;
    }
    MergeAction::Untouched
}

/// The bytes of a conflict artifact: current above the separator, target
/// below, absent sides rendered empty.
pub fn conflict_bytes(current: Option<&[u8]>, target: Option<&[u8]>) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"<<<<<<< HEAD\n");
    if let Some(c) = current {
        bytes.extend_from_slice(c);
    }
    bytes.extend_from_slice(b"=======\n");
    if let Some(t) = target {
        bytes.extend_from_slice(t);
    }
    bytes.extend_from_slice(b">>>>>>>\n");
    bytes
}

/// How a merge command concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The target tip is already an ancestor of the current tip.
    AlreadyAncestor,
    /// The current tip was an ancestor of the target: resolved by a
    /// branch checkout.
    FastForwarded,
    /// A merge commit was created.
    Merged { conflict: bool },
}
