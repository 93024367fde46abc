use serde_derive::{Deserialize, Serialize};

/// A data item identifier. Keys are small positive integers in this engine,
/// matching the `1..=n` key space the store is seeded with.
pub type Key = u64;

/// The signed integer value carried by every version.
pub type Val = i64;

/// A logical timestamp. Assigned once per transaction attempt by the
/// Scheduler's monotonic counter.
pub type Timestamp = u64;

/// One immutable (key, version) slot in a key's chain, plus its mutable
/// read/write timestamps.
///
/// `val`, `version` and `wts` never change after construction, except for
/// the in-place Thomas-write overwrite performed by
/// [`crate::store::Store::write`] (rule W2), which is the one place this
/// invariant is relaxed by design.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub key: Key,
    pub val: Val,
    /// Index of this record within its key's chain.
    pub version: u64,
    /// The committing transaction's timestamp.
    pub wts: Timestamp,
    /// The maximum timestamp of any transaction that has read this version.
    pub rts: Timestamp,
}

impl VersionRecord {
    pub fn new(key: Key, val: Val, version: u64, wts: Timestamp, rts: Timestamp) -> Self {
        Self { key, val, version, wts, rts }
    }

    /// Bumps `rts` to `max(rts, t)`. Callers must hold the per-key guard.
    pub fn bump_rts(&mut self, t: Timestamp) {
        self.rts = self.rts.max(t);
    }
}
