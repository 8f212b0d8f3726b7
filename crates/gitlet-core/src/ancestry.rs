//! Ancestor distances and split-point computation.
//!
//! The commit graph is a DAG keyed by id; walking parent edges from any
//! commit reaches the initial commit. Both parents of a merge commit
//! contribute edges.

use std::collections::{BTreeMap, VecDeque};

use crate::error::{GitletError, GitletResult};
use crate::object::ObjectStore;

/// Map every ancestor of `id` (including itself) to its minimum distance
/// in parent-edges, computed by BFS over the reversed DAG.
pub fn ancestors(objects: &ObjectStore, id: &str) -> GitletResult<BTreeMap<String, u32>> {
    let mut dist = BTreeMap::new();
    let mut queue = VecDeque::new();
    dist.insert(id.to_string(), 0u32);
    queue.push_back(id.to_string());

    while let Some(current) = queue.pop_front() {
        let commit = objects.get_commit(&current)?;
        let d = dist[&current];
        for parent in &commit.parents {
            if !dist.contains_key(parent) {
                dist.insert(parent.clone(), d + 1);
                queue.push_back(parent.clone());
            }
        }
    }
    Ok(dist)
}

/// The split point of two commits: the common ancestor minimising the sum
/// of distances to both.
///
/// Ties on the distance sum resolve to the lexicographically smallest
/// commit id, so the result is stable across processes and platforms.
pub fn split_point(objects: &ObjectStore, a: &str, b: &str) -> GitletResult<String> {
    let dist_a = ancestors(objects, a)?;
    let dist_b = ancestors(objects, b)?;

    let mut best: Option<(u32, &String)> = None;
    for (id, da) in &dist_a {
        if let Some(db) = dist_b.get(id) {
            let sum = da + db;
            match best {
                Some((best_sum, _)) if sum >= best_sum => {}
                _ => best = Some((sum, id)),
            }
        }
    }
    match best {
        Some((_, id)) => Ok(id.clone()),
        None => Err(GitletError::Corrupt(format!(
            "commits {a} and {b} share no common ancestor"
        ))),
    }
}
