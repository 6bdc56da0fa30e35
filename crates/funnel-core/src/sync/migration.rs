//! Sign-in migration planning
//!
//! The plan is a set difference by id: cache templates whose id the remote
//! store does not already hold for the new owner. Remote wins ties, so a
//! second run with no new cache-only ids plans nothing.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::FunnelTemplate;

/// What a migration pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Ids inserted into the remote store
    pub inserted: Vec<String>,

    /// Cache templates already present remotely, or owned by someone else
    pub skipped: usize,

    /// Ids whose insert failed; they stay candidates for the next pass
    pub failed: Vec<String>,
}

impl MigrationReport {
    /// Number of remote writes performed
    pub fn writes(&self) -> usize {
        self.inserted.len()
    }

    pub fn is_noop(&self) -> bool {
        self.inserted.is_empty() && self.failed.is_empty()
    }
}

/// Cache templates to insert for `owner`, stamped with the new owner
///
/// Returns the candidates and how many cache entries were skipped.
pub fn plan(
    cached: Vec<FunnelTemplate>,
    remote: &[FunnelTemplate],
    owner: &str,
) -> (Vec<FunnelTemplate>, usize) {
    let remote_ids: HashSet<&str> = remote.iter().map(|t| t.id.as_str()).collect();
    let total = cached.len();

    let candidates: Vec<FunnelTemplate> = cached
        .into_iter()
        .filter(|t| t.has_id())
        .filter(|t| !remote_ids.contains(t.id.as_str()))
        // Another identity's unsynced work waits for that identity
        .filter(|t| t.visible_to(owner))
        .map(|mut t| {
            t.owner_id = Some(owner.to_string());
            t
        })
        .collect();

    let skipped = total - candidates.len();
    (candidates, skipped)
}
