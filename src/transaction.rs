use std::collections::HashMap;

use log::{info, trace};

use crate::error::{CoreResult, Error};
use crate::instruction::{Instruction, Program};
use crate::logentry::{LogChannel, LogOutcome};
use crate::store::Store;
use crate::version::{Key, Timestamp, Val};

/// Lifecycle of a single transaction attempt. A restart after `Aborted`
/// creates a fresh attempt starting back at `Pending` (see
/// [`crate::scheduler::Scheduler`]); it does not reuse this enum's
/// `Aborted` value in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Active,
    Committed,
    Aborted,
}

/// A transaction: a fixed id and program, plus the mutable state of its
/// current attempt (timestamp, status, private write-buffer cache).
pub struct Transaction {
    pub id: u64,
    pub ts: Timestamp,
    pub status: TransactionStatus,
    program: Program,
    cache: HashMap<Key, Val>,
    /// Number of attempts so far, including the current one. Used by the
    /// Scheduler to enforce a restart cap.
    pub attempts: u32,
}

impl Transaction {
    /// Builds a new transaction in `Pending` state with `ts = 0` (not yet
    /// assigned by the Scheduler). `program` must end with exactly one
    /// `Commit` instruction and contain no other `Commit`.
    pub fn new(id: u64, program: Program) -> Self {
        debug_assert!(
            program.iter().filter(|i| **i == Instruction::Commit).count() == 1,
            "program must contain exactly one Commit instruction"
        );
        debug_assert!(
            matches!(program.last(), Some(Instruction::Commit)),
            "Commit must be the last instruction"
        );
        Self {
            id,
            ts: 0,
            status: TransactionStatus::Pending,
            program,
            cache: HashMap::new(),
            attempts: 0,
        }
    }

    /// Prepares this transaction for a (re)start at a freshly assigned
    /// timestamp: clears the cache, keeps `id` and `program`, bumps the
    /// attempt counter.
    pub fn restart(&mut self, ts: Timestamp) {
        self.ts = ts;
        self.status = TransactionStatus::Active;
        self.cache.clear();
        self.attempts += 1;
    }

    /// Executes `instr` against `store`, updating the private cache. Returns
    /// `Ok(false)` to continue, `Ok(true)` if the instruction caused an abort
    /// (a Store rollback), and `Err` for a malformed program.
    fn execute(
        &mut self,
        store: &Store,
        log: Option<&LogChannel>,
        instr: &Instruction,
    ) -> CoreResult<bool> {
        trace!("txn {} ts={} executing {:?}", self.id, self.ts, instr);
        match instr {
            Instruction::Read(key) => {
                let val = store.read(*key, self.ts)?.ok_or_else(|| {
                    Error::ProgramError(format!("read of unknown key {}", key))
                })?;
                self.cache.insert(*key, val);
                Self::log_ok(log, self.ts, self.id, instr, Some(*key));
                Ok(false)
            }
            Instruction::Write(key) => {
                let val = self.cached(*key)?;
                match store.write(*key, val, self.ts)? {
                    Ok(()) => {
                        Self::log_ok(log, self.ts, self.id, instr, Some(*key));
                        Ok(false)
                    }
                    Err(crate::store::Rollback) => {
                        Self::log_rolled_back(log, self.ts, self.id, instr, Some(*key));
                        Ok(true)
                    }
                }
            }
            Instruction::Add(key, n) => {
                let v = self.cached(*key)?;
                self.cache.insert(*key, v.wrapping_add(*n));
                Ok(false)
            }
            Instruction::Sub(key, n) => {
                let v = self.cached(*key)?;
                self.cache.insert(*key, v.wrapping_sub(*n));
                Ok(false)
            }
            Instruction::Mul(key, n) => {
                let v = self.cached(*key)?;
                self.cache.insert(*key, v.wrapping_mul(*n));
                Ok(false)
            }
            Instruction::Div(key, n) => {
                if *n == 0 {
                    return Err(Error::ProgramError(format!(
                        "division by zero on key {} in txn {}",
                        key, self.id
                    )));
                }
                let v = self.cached(*key)?;
                self.cache.insert(*key, div_floor(v, *n));
                Ok(false)
            }
            Instruction::Commit => {
                self.status = TransactionStatus::Committed;
                Self::log_ok(log, self.ts, self.id, instr, None);
                Ok(false)
            }
        }
    }

    fn cached(&self, key: Key) -> CoreResult<Val> {
        self.cache.get(&key).copied().ok_or_else(|| {
            Error::ProgramError(format!(
                "key {} referenced before being read into the cache",
                key
            ))
        })
    }

    /// Runs the full program in order. Stops and marks the transaction
    /// `Aborted` as soon as a Store rollback occurs, leaving the remainder
    /// of the program unexecuted. Reaching `Commit` marks it `Committed`.
    /// A malformed program surfaces as `Err` and is not retried by the
    /// caller.
    pub fn run(&mut self, store: &Store, log: Option<&LogChannel>) -> CoreResult<()> {
        self.status = TransactionStatus::Active;
        for instr in self.program.clone() {
            if self.execute(store, log, &instr)? {
                self.status = TransactionStatus::Aborted;
                info!("txn {} ts={} aborted on {:?}", self.id, self.ts, instr);
                return Ok(());
            }
            if self.status == TransactionStatus::Committed {
                break;
            }
        }
        Ok(())
    }

    fn log_ok(log: Option<&LogChannel>, ts: Timestamp, txid: u64, instr: &Instruction, key: Option<Key>) {
        if let Some(log) = log {
            log.record(ts, txid, instr.op_name(), key, LogOutcome::Ok);
        }
    }

    fn log_rolled_back(
        log: Option<&LogChannel>,
        ts: Timestamp,
        txid: u64,
        instr: &Instruction,
        key: Option<Key>,
    ) {
        if let Some(log) = log {
            log.record(ts, txid, instr.op_name(), key, LogOutcome::RolledBack);
        }
    }
}

/// Floor division: rounds toward negative infinity, never toward zero.
/// Uses wrapping ops so `i64::MIN / -1` saturates instead of panicking,
/// matching the wrapping arithmetic used by the other ops.
fn div_floor(a: Val, b: Val) -> Val {
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    if (r != 0) && ((r < 0) != (b < 0)) {
        q.wrapping_sub(1)
    } else {
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s4_floor_division_semantics() {
        assert_eq!(div_floor(-7, 2), -4);
        assert_eq!(div_floor(7, 2), 3);
        assert_eq!(div_floor(-7, -2), 3);
        assert_eq!(div_floor(7, -2), -4);
    }

    #[test]
    fn s6_malformed_program_surfaces_program_error() {
        let store = Store::new();
        store.seed(1).unwrap();
        let mut txn = Transaction::new(1, vec![Instruction::Add(1, 1), Instruction::Commit]);
        txn.restart(1);
        let err = txn.run(&store, None).unwrap_err();
        assert!(matches!(err, Error::ProgramError(_)));
        // The transaction does not get marked Committed; the caller is
        // expected not to restart it (fatal per attempt).
        assert_ne!(txn.status, TransactionStatus::Committed);
    }

    #[test]
    fn commit_marks_status_committed() {
        let store = Store::new();
        store.seed(1).unwrap();
        let mut txn = Transaction::new(
            1,
            vec![Instruction::Read(1), Instruction::Add(1, 5), Instruction::Write(1), Instruction::Commit],
        );
        txn.restart(1);
        txn.run(&store, None).unwrap();
        assert_eq!(txn.status, TransactionStatus::Committed);
    }

    #[test]
    fn rollback_aborts_without_running_rest_of_program() {
        let store = Store::new();
        store.seed(1).unwrap();
        // Bump key 1's rts past ts=1 so the write below must roll back.
        store.read(1, 9).unwrap();

        let mut txn = Transaction::new(
            1,
            vec![Instruction::Read(1), Instruction::Write(1), Instruction::Commit],
        );
        txn.restart(1);
        txn.run(&store, None).unwrap();
        assert_eq!(txn.status, TransactionStatus::Aborted);
    }
}
