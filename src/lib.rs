//! `tocc-store` is an in-memory transactional key-value store over
//! integer-valued data items, enforcing serializable isolation via
//! Multi-Version Timestamp Ordering Concurrency Control (MV-TOCC).
//!
//! Concurrent transactions issue reads, arithmetic updates, and writes; the
//! [`Store`](store::Store) either admits a write in a way that is
//! serializable in timestamp order, or signals a rollback so the
//! [`Scheduler`](scheduler::Scheduler) can restart the offending transaction
//! with a fresh, later timestamp.
//!
//! ## Getting started
//!
//! ```rust
//! use std::sync::Arc;
//! use tocc_store::instruction::Instruction;
//! use tocc_store::scheduler::Scheduler;
//! use tocc_store::store::Store;
//! use tocc_store::transaction::Transaction;
//!
//! let store = Arc::new(Store::new());
//! store.seed(4).unwrap();
//!
//! let txn = Transaction::new(
//!     1,
//!     vec![
//!         Instruction::Read(1),
//!         Instruction::Add(1, 5),
//!         Instruction::Write(1),
//!         Instruction::Commit,
//!     ],
//! );
//!
//! let mut scheduler = Scheduler::new(store.clone());
//! let committed = scheduler.schedule(vec![txn]).unwrap();
//! assert_eq!(committed.len(), 1);
//! ```

pub mod error;
pub mod instruction;
pub mod logentry;
pub mod scheduler;
pub mod store;
pub mod transaction;
pub mod version;
