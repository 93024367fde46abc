use std::sync::{Arc, Mutex};
use std::thread;

use log::{info, warn};

use crate::error::{CoreResult, Error};
use crate::logentry::LogChannel;
use crate::store::Store;
use crate::transaction::{Transaction, TransactionStatus};

/// Drives a batch of transactions to completion against a shared [`Store`],
/// assigning each (re)start a fresh, strictly increasing timestamp.
///
/// One OS thread is spawned per transaction in a pending batch (§5: this is
/// a small in-process engine, not an async service). The only ordering the
/// Scheduler itself promises is that timestamp assignment is serialized; it
/// does not order execution of transactions with distinct timestamps.
pub struct Scheduler {
    store: Arc<Store>,
    log: Option<Arc<LogChannel>>,
    gts: Mutex<u64>,
    pending: Vec<Transaction>,
    /// Maximum restart attempts per transaction before surfacing
    /// `Error::Starvation`. `None` means unbounded (the default; recommended
    /// to bound only for liveness testing, per the design).
    restart_cap: Option<u32>,
}

impl Scheduler {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store, log: None, gts: Mutex::new(0), pending: Vec::new(), restart_cap: None }
    }

    pub fn with_log(mut self, log: Arc<LogChannel>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn with_restart_cap(mut self, cap: u32) -> Self {
        self.restart_cap = Some(cap);
        self
    }

    /// Appends `transactions` to the pending queue without running anything.
    pub fn submit(&mut self, transactions: Vec<Transaction>) {
        self.pending.extend(transactions);
    }

    /// Issues the next timestamp. Serialized behind `gts`'s mutex so two
    /// concurrent (re)starts can never observe the same value.
    fn next_timestamp(&self) -> CoreResult<u64> {
        let mut gts = self.gts.lock()?;
        *gts += 1;
        Ok(*gts)
    }

    /// Runs passes over the pending queue until it is empty. Each pass:
    /// assigns a fresh timestamp and launches one thread per
    /// currently-pending transaction, joins them all, then requeues any that
    /// aborted (unless they have exhausted `restart_cap`). Returns the final
    /// committed transactions in the order they finished, or the first
    /// `ProgramError`/`Starvation`/`InvariantViolation` encountered.
    pub fn drive_to_completion(&mut self) -> CoreResult<Vec<Transaction>> {
        let mut committed = Vec::new();

        while !self.pending.is_empty() {
            let batch = std::mem::take(&mut self.pending);
            let mut handles = Vec::with_capacity(batch.len());

            for mut txn in batch {
                let ts = self.next_timestamp()?;
                txn.restart(ts);
                let store = self.store.clone();
                let log = self.log.clone();
                handles.push(thread::spawn(move || {
                    let result = txn.run(&store, log.as_deref());
                    (txn, result)
                }));
            }

            for handle in handles {
                let (txn, result) = handle.join().map_err(|_| {
                    Error::Internal("transaction worker thread panicked".to_string())
                })?;
                result?;

                match txn.status {
                    TransactionStatus::Committed => {
                        info!("txn {} committed at ts={}", txn.id, txn.ts);
                        committed.push(txn);
                    }
                    TransactionStatus::Aborted => {
                        if let Some(cap) = self.restart_cap {
                            if txn.attempts >= cap {
                                return Err(Error::Starvation { txid: txn.id, attempts: txn.attempts });
                            }
                        }
                        warn!("txn {} aborted, requeuing for restart (attempt {})", txn.id, txn.attempts);
                        self.pending.push(txn);
                    }
                    TransactionStatus::Pending | TransactionStatus::Active => {
                        return Err(Error::InvariantViolation(format!(
                            "txn {} left run() in non-terminal status {:?}",
                            txn.id, txn.status
                        )));
                    }
                }
            }
        }

        Ok(committed)
    }

    /// Sugar for [`Self::submit`] followed by [`Self::drive_to_completion`].
    pub fn schedule(&mut self, transactions: Vec<Transaction>) -> CoreResult<Vec<Transaction>> {
        self.submit(transactions);
        self.drive_to_completion()
    }
}
