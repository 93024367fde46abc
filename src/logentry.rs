use std::sync::Mutex;

use serde_derive::{Deserialize, Serialize};

use crate::version::{Key, Timestamp};

/// Whether a logged operation completed or lost a conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogOutcome {
    Ok,
    RolledBack,
}

/// One entry in the optional observability log described in §6: `{ts, txid,
/// op, key, outcome}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub ts: Timestamp,
    pub txid: u64,
    pub op: &'static str,
    pub key: Option<Key>,
    pub outcome: LogOutcome,
}

/// An append-only, thread-safe log of [`LogRecord`]s. Purely observational:
/// nothing in the core reads it back to make a decision, so its ordering
/// guarantee only needs to match the in-Store order for a given key, not
/// impose one.
#[derive(Default)]
pub struct LogChannel {
    records: Mutex<Vec<LogRecord>>,
}

impl LogChannel {
    pub fn new() -> Self {
        Self { records: Mutex::new(Vec::new()) }
    }

    pub fn record(&self, ts: Timestamp, txid: u64, op: &'static str, key: Option<Key>, outcome: LogOutcome) {
        let mut records = match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push(LogRecord { ts, txid, op, key, outcome });
    }

    /// A snapshot copy of every record logged so far, in append order.
    pub fn records(&self) -> Vec<LogRecord> {
        match self.records.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Records logged for a specific key, in append order, which for any
    /// given key matches the order its versions were produced in the Store.
    pub fn records_for(&self, key: Key) -> Vec<LogRecord> {
        self.records().into_iter().filter(|r| r.key == Some(key)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_preserve_append_order_per_key() {
        let log = LogChannel::new();
        log.record(1, 1, "read", Some(1), LogOutcome::Ok);
        log.record(2, 2, "write", Some(2), LogOutcome::Ok);
        log.record(3, 1, "write", Some(1), LogOutcome::RolledBack);

        let for_key_1 = log.records_for(1);
        assert_eq!(for_key_1.len(), 2);
        assert_eq!(for_key_1[0].op, "read");
        assert_eq!(for_key_1[1].outcome, LogOutcome::RolledBack);
    }
}
