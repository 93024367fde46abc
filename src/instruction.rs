use serde_derive::{Deserialize, Serialize};

use crate::version::{Key, Val};

/// One step of a transaction's program.
///
/// Mirrors the seven operations in the design: reads and writes against the
/// Store, four arithmetic ops against the transaction's private cache, and a
/// terminal commit. Only `Commit` may appear as the last instruction, and it
/// must appear exactly once per program, enforced by
/// [`crate::transaction::Transaction::new`], not by this type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Read(Key),
    Write(Key),
    Add(Key, Val),
    Sub(Key, Val),
    Mul(Key, Val),
    Div(Key, Val),
    Commit,
}

/// A transaction's finite, ordered instruction list.
pub type Program = Vec<Instruction>;

impl Instruction {
    /// The key this instruction touches, if any. `Commit` touches none.
    pub fn key(&self) -> Option<Key> {
        match self {
            Instruction::Read(k)
            | Instruction::Write(k)
            | Instruction::Add(k, _)
            | Instruction::Sub(k, _)
            | Instruction::Mul(k, _)
            | Instruction::Div(k, _) => Some(*k),
            Instruction::Commit => None,
        }
    }

    /// Short operation name, used for tracing and the log channel.
    pub fn op_name(&self) -> &'static str {
        match self {
            Instruction::Read(_) => "read",
            Instruction::Write(_) => "write",
            Instruction::Add(..) => "add",
            Instruction::Sub(..) => "sub",
            Instruction::Mul(..) => "mul",
            Instruction::Div(..) => "div",
            Instruction::Commit => "commit",
        }
    }
}
