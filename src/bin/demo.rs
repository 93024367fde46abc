//! Thin demo binary: seeds a store, generates a batch of random transaction
//! programs, and drives a [`Scheduler`] to completion. This is the "random
//! workload generator used for demos" the design calls out as an external
//! collaborator of the core: it supplies `Transaction` inputs and nothing
//! more.

use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use log::{info, LevelFilter};
use rand::Rng;

use tocc_store::instruction::Instruction;
use tocc_store::logentry::LogChannel;
use tocc_store::scheduler::Scheduler;
use tocc_store::store::Store;
use tocc_store::transaction::Transaction;

#[derive(Debug, Parser)]
#[command(author, about = "Drive a random MV-TOCC transaction workload against an in-memory store")]
struct Args {
    /// Number of keys to seed the store with.
    #[clap(long, default_value = "10")]
    keys: u32,

    /// Number of transactions to generate.
    #[clap(long, default_value = "5")]
    txns: u32,

    /// Maximum number of operations per transaction, before the closing commit.
    #[clap(long, default_value = "5")]
    ops_per_txn: u32,

    /// Restart cap per transaction; omit for unbounded restarts.
    #[clap(long)]
    restart_cap: Option<u32>,

    #[clap(long, default_value = "info")]
    log_level: String,
}

const OPERATIONS: [&str; 6] = ["read", "add", "sub", "mul", "div", "write"];

fn init_logging(level: &str) -> anyhow::Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}", record.level(), message))
        })
        .level(LevelFilter::from_str(level)?)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

/// Generates one random transaction program: a mix of arithmetic ops against
/// a single randomly chosen key, always opened with a `Read` of that key
/// (so every arithmetic op has something in cache) and closed with
/// `Commit`. Mirrors `generateRandomInstructions` from the distilled
/// original workload generator, reshaped into a proper instruction list.
fn random_program(id: u64, num_keys: u32, ops_per_txn: u32) -> Transaction {
    let mut rng = rand::thread_rng();
    let key = rng.gen_range(1..=u64::from(num_keys));
    let mut program = vec![Instruction::Read(key)];

    for _ in 0..ops_per_txn {
        match OPERATIONS[rng.gen_range(0..OPERATIONS.len())] {
            "read" => program.push(Instruction::Read(key)),
            "add" => program.push(Instruction::Add(key, rng.gen_range(1..=20))),
            "sub" => program.push(Instruction::Sub(key, rng.gen_range(1..=20))),
            "mul" => program.push(Instruction::Mul(key, rng.gen_range(1..=4))),
            "div" => program.push(Instruction::Div(key, rng.gen_range(1..=4))),
            "write" => program.push(Instruction::Write(key)),
            _ => unreachable!(),
        }
    }
    program.push(Instruction::Commit);
    Transaction::new(id, program)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    eprintln!("tocc-store demo: {} keys, {} transactions", args.keys, args.txns);

    let store = Arc::new(Store::new());
    store.seed(args.keys)?;

    let transactions: Vec<Transaction> = (1..=u64::from(args.txns))
        .map(|id| random_program(id, args.keys, args.ops_per_txn))
        .collect();

    let log = Arc::new(LogChannel::new());
    let mut scheduler = Scheduler::new(store.clone()).with_log(log.clone());
    if let Some(cap) = args.restart_cap {
        scheduler = scheduler.with_restart_cap(cap);
    }

    let committed = scheduler.schedule(transactions)?;
    info!("{} transactions committed", committed.len());

    let snapshot = store.snapshot()?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}
