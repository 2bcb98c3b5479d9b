//! Instruction model and two-pass body emission.
//!
//! Bodies are built as a flat list of [`Instruction`]s, measured with the
//! operand-length table, then encoded into a byte stream whose string,
//! method and type operands are 4-byte tokens into per-body tables.

mod body;
mod instr;
mod materialize;
mod opcode;

pub use body::*;
pub use instr::*;
pub use materialize::*;
pub use opcode::*;

#[cfg(test)]
mod body_test;
