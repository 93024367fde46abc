use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use log::{debug, trace};
use rand::Rng;

use crate::error::CoreResult;
use crate::version::{Key, Timestamp, Val, VersionRecord};

/// Signals that a write lost to a conflicting reader (rule W1) and the
/// issuing transaction must abort. This is an internal control-flow signal,
/// not a member of [`crate::error::Error`]: it never escapes
/// [`crate::transaction::Transaction::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rollback;

type Chain = Arc<Mutex<Vec<VersionRecord>>>;

/// The versioned, thread-safe key-value store.
///
/// Each key owns an independent chain of [`VersionRecord`]s behind its own
/// `Arc<Mutex<..>>`, so concurrent transactions touching different keys
/// never block each other. The outer map is guarded separately and only held
/// long enough to clone out a key's chain handle, matching the "guards are
/// per-key, held only for one read/write" contract in the design.
pub struct Store {
    chains: Mutex<HashMap<Key, Chain>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self { chains: Mutex::new(HashMap::new()) }
    }

    /// Bootstraps keys `1..=n` with random values in `0..=50`, each as a
    /// single version with `wts = 0`, `rts = 0`. Calling it twice on a fresh
    /// store always produces chains of identical shape (one version each),
    /// modulo the RNG draw.
    pub fn seed(&self, n: u32) -> CoreResult<()> {
        let mut rng = rand::thread_rng();
        let mut chains = self.chains.lock()?;
        chains.clear();
        for key in 1..=u64::from(n) {
            let val: Val = rng.gen_range(0..=50);
            chains.insert(key, Arc::new(Mutex::new(vec![VersionRecord::new(key, val, 0, 0, 0)])));
        }
        Ok(())
    }

    /// Clones out the `Arc` handle for `key`'s chain, inserting an empty one
    /// if this is the first time the key has been touched.
    fn chain_for(&self, key: Key) -> CoreResult<Chain> {
        let mut chains = self.chains.lock()?;
        Ok(chains.entry(key).or_insert_with(|| Arc::new(Mutex::new(Vec::new()))).clone())
    }

    fn existing_chain_for(&self, key: Key) -> CoreResult<Option<Chain>> {
        Ok(self.chains.lock()?.get(&key).cloned())
    }

    /// Index of the version of `key` visible at `ts`: the version with the
    /// largest `wts <= ts`. Runs with the per-key chain mutex already held by
    /// the caller.
    fn visible_index(chain: &[VersionRecord], ts: Timestamp) -> usize {
        // Chains are short in practice and kept in wts order, so a linear
        // scan from the back is simplest and meets the O(n)-acceptable bar.
        chain
            .iter()
            .rposition(|v| v.wts <= ts)
            .expect("chain invariant: chain[0].wts == 0 is always <= ts")
    }

    /// Reads `key` as of `ts`, bumping the visible version's `rts` to
    /// `max(rts, ts)` before returning its value. Returns `None` if `key` was
    /// never seeded.
    pub fn read(&self, key: Key, ts: Timestamp) -> CoreResult<Option<Val>> {
        let chain = match self.existing_chain_for(key)? {
            Some(chain) => chain,
            None => return Ok(None),
        };
        let mut chain = chain.lock()?;
        if chain.is_empty() {
            return Ok(None);
        }
        let idx = Self::visible_index(&chain, ts);
        chain[idx].bump_rts(ts);
        trace!("read key={} ts={} -> val={} (version {})", key, ts, chain[idx].val, idx);
        Ok(Some(chain[idx].val))
    }

    /// Applies rules W1/W2/W3 from the design for a write of `new_val` to
    /// `key` by a transaction running at `ts`. Returns `Err(Rollback)` if the
    /// write loses to a conflicting reader.
    pub fn write(&self, key: Key, new_val: Val, ts: Timestamp) -> CoreResult<Result<(), Rollback>> {
        let chain = self.chain_for(key)?;
        let mut chain = chain.lock()?;

        if chain.is_empty() {
            // A key must be seeded (i.e. have an initial wts=0 version)
            // before any transaction can write it: a write always follows a
            // read in a well-formed program, and that read would already
            // have surfaced a ProgramError if the key did not exist.
            return Err(crate::error::Error::InvariantViolation(format!(
                "write to unseeded key={}",
                key
            )));
        }

        let idx = Self::visible_index(&chain, ts);

        // W1: read-too-new conflict.
        if chain[idx].rts > ts {
            debug!("write key={} ts={} rejected: visible rts={} > ts", key, ts, chain[idx].rts);
            return Ok(Err(Rollback));
        }

        // W2: same-writer overwrite (Thomas write rule).
        if chain[idx].wts == ts {
            chain[idx].val = new_val;
            trace!("write key={} ts={} overwrote its own version {}", key, ts, idx);
            return Ok(Ok(()));
        }

        if idx != chain.len() - 1 {
            // A later version already exists beyond the one visible to
            // `ts`. Under correct MV-TOCC execution this is unreachable: any
            // transaction that wrote that later version must first have
            // read the visible one, bumping its rts above `ts` and
            // triggering W1 above. Surfacing it as an invariant violation
            // rather than silently reordering the chain.
            return Err(crate::error::Error::InvariantViolation(format!(
                "write at ts={} for key={} would insert before an existing later version (wts={})",
                ts,
                key,
                chain.last().expect("chain non-empty").wts
            )));
        }

        // W3: append a new version.
        let version = chain.last().expect("chain non-empty").version + 1;
        chain.push(VersionRecord::new(key, new_val, version, ts, ts));
        trace!("write key={} ts={} appended version {}", key, ts, version);
        Ok(Ok(()))
    }

    /// A read-only snapshot of every chain, for diagnostics and tests. Takes
    /// each key's guard one at a time, so it never holds the whole store
    /// locked while cloning.
    pub fn snapshot(&self) -> CoreResult<BTreeMap<Key, Vec<VersionRecord>>> {
        let handles: Vec<(Key, Chain)> =
            self.chains.lock()?.iter().map(|(k, v)| (*k, v.clone())).collect();
        let mut out = BTreeMap::new();
        for (key, chain) in handles {
            out.insert(key, chain.lock()?.clone());
        }
        Ok(out)
    }

    /// Number of distinct keys currently known to the store.
    pub fn len(&self) -> CoreResult<usize> {
        Ok(self.chains.lock()?.len())
    }

    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len()? == 0)
    }
}
