//! Interpreter for generated bodies
//!
//! Encoded bodies are decoded back into instructions (resolving string,
//! method and type tokens) and run on a small evaluation-stack machine.

mod decode;
mod generated;
mod interp;

pub use decode::*;
pub use generated::*;

#[cfg(test)]
mod vm_test;
