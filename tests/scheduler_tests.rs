use std::sync::Arc;

use pretty_assertions::assert_eq;

use tocc_store::instruction::Instruction;
use tocc_store::scheduler::Scheduler;
use tocc_store::store::Store;
use tocc_store::transaction::{Transaction, TransactionStatus};

fn read_add_write_commit(key: u64, delta: i64) -> Vec<Instruction> {
    vec![Instruction::Read(key), Instruction::Add(key, delta), Instruction::Write(key), Instruction::Commit]
}

/// P6 (liveness, unbounded restart mode): a batch of transactions that all
/// contend on the same key must still all eventually commit.
#[test]
fn p6_liveness_all_contending_transactions_eventually_commit() {
    let store = Arc::new(Store::new());
    store.seed(1).unwrap();

    let txns: Vec<Transaction> =
        (1..=8u64).map(|id| Transaction::new(id, read_add_write_commit(1, id as i64))).collect();

    let mut scheduler = Scheduler::new(store.clone());
    let committed = scheduler.schedule(txns).unwrap();

    assert_eq!(committed.len(), 8);
    assert!(committed.iter().all(|t| t.status == TransactionStatus::Committed));
}

/// P1/P5: after a batch of conflicting single-key transactions commits, the
/// chain's wts values are strictly increasing (P1), and the final value is
/// consistent with *some* total order over the committed transactions'
/// deltas (P5), since every program here is `Read; Add(delta); Write`, the
/// final value must equal the seed plus the sum of all committed deltas,
/// regardless of which interleaving actually executed.
#[test]
fn p1_p5_serializable_outcome_matches_sum_of_committed_deltas() {
    let store = Arc::new(Store::new());
    store.seed(1).unwrap();
    let seed_val = store.snapshot().unwrap()[&1][0].val;

    let deltas = [3i64, -2, 7, -10, 5];
    let txns: Vec<Transaction> = deltas
        .iter()
        .enumerate()
        .map(|(i, d)| Transaction::new(i as u64 + 1, read_add_write_commit(1, *d)))
        .collect();

    let mut scheduler = Scheduler::new(store.clone());
    let committed = scheduler.schedule(txns).unwrap();
    assert_eq!(committed.len(), deltas.len());

    let snap = store.snapshot().unwrap();
    let chain = &snap[&1];

    // P1: strictly increasing wts.
    for w in chain.windows(2) {
        assert!(w[0].wts < w[1].wts, "wts must be strictly increasing: {:?}", chain);
    }

    // P2: rts >= wts for every version.
    for v in chain {
        assert!(v.rts >= v.wts, "rts must be >= wts: {:?}", v);
    }

    let expected_final = seed_val + deltas.iter().sum::<i64>();
    assert_eq!(chain.last().unwrap().val, expected_final);
}

/// S5: two transactions writing the same key with a forced read-write
/// conflict both eventually commit, and the chain stays well-formed.
#[test]
fn s5_restart_progress_under_forced_conflict() {
    let store = Arc::new(Store::new());
    store.seed(1).unwrap();

    // Force a W1 rollback on the first attempt of whichever transaction
    // gets the earlier timestamp, by pre-bumping the initial version's rts.
    store.read(1, 3).unwrap();

    let mut scheduler = Scheduler::new(store.clone()).with_restart_cap(10);
    let t1 = Transaction::new(1, read_add_write_commit(1, 1));
    let t2 = Transaction::new(2, read_add_write_commit(1, 2));
    let committed = scheduler.schedule(vec![t1, t2]).unwrap();

    assert_eq!(committed.len(), 2);
    let snap = store.snapshot().unwrap();
    let chain = &snap[&1];
    for w in chain.windows(2) {
        assert!(w[0].wts < w[1].wts);
    }
}
