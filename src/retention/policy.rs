// ABOUTME: Retention policy: how many archives survive a prune.
// ABOUTME: Pure planning so the ordering rules can be checked without a host.

use crate::config::DEFAULT_KEEP;
use crate::types::ArchiveName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Never prune.
    KeepAll,
    /// Keep this many of the newest archives (always at least one).
    KeepLatest(u32),
}

impl RetentionPolicy {
    /// `0` disables pruning.
    pub fn from_keep(keep: u32) -> Self {
        match keep {
            0 => RetentionPolicy::KeepAll,
            n => RetentionPolicy::KeepLatest(n),
        }
    }

    /// Per-call override first, then the environment's setting.
    pub fn resolve(override_keep: Option<u32>, environment_keep: Option<u32>) -> Self {
        Self::from_keep(override_keep.or(environment_keep).unwrap_or(DEFAULT_KEEP))
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        RetentionPolicy::KeepLatest(DEFAULT_KEEP)
    }
}

/// Split `names` into (kept, deleted), deleting oldest first.
///
/// Both halves come back in chronological order whatever the input order.
pub fn plan_prune(
    names: &[ArchiveName],
    policy: RetentionPolicy,
) -> (Vec<ArchiveName>, Vec<ArchiveName>) {
    let mut sorted = names.to_vec();
    sorted.sort();
    sorted.dedup();

    match policy {
        RetentionPolicy::KeepAll => (sorted, Vec::new()),
        RetentionPolicy::KeepLatest(keep) => {
            let cut = sorted.len().saturating_sub(keep as usize);
            let kept = sorted.split_off(cut);
            (kept, sorted)
        }
    }
}
