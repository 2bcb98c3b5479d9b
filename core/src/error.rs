use std::fmt;

use crate::emit::{OpCode, OperandKind};
use crate::typ::ValueType;

/// Failure raised while building a generated procedure.
///
/// Returned wrapped in `anyhow::Error`; use `downcast_ref::<AdaptError>()` to
/// branch on the kind.
#[derive(Debug, Clone, PartialEq)]
pub enum AdaptError {
    /// Return type or forwarded parameter type is not assignable.
    SignatureMismatch {
        context: String,
        expected: ValueType,
        actual: ValueType,
    },
    /// A name-keyed shape references parameters the target does not have.
    UnknownName(Vec<String>),
    /// More values (or a wider binding window) than target parameters.
    ArityMismatch { available: usize, supplied: usize },
    /// The parameter type cannot be turned into instructions.
    UnsupportedType(ValueType),
    /// The value is not an instance of (or not convertible to) the parameter type.
    ValueMismatch { value: String, expected: ValueType },
    /// A declared default was requested on a parameter without one.
    MissingDefault { parameter: String },
    /// Macro resolution was asked for an opcode outside the indexed-load family.
    InvalidMacro(OpCode),
    /// The operand does not match the opcode's operand kind.
    InvalidOperand { opcode: OpCode, expected: OperandKind },
    /// The operand kind has no entry in the length table.
    UnmeasurableOperand { opcode: OpCode, kind: OperandKind },
    /// An argument or local index does not fit the one-byte operand.
    LimitExceeded { what: &'static str, index: usize },
}

impl fmt::Display for AdaptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdaptError::SignatureMismatch {
                context,
                expected,
                actual,
            } => write!(f, "signature mismatch: {} (expected {}, got {})", context, expected, actual),
            AdaptError::UnknownName(names) => {
                write!(f, "unknown parameter name(s): {}", names.join(", "))
            }
            AdaptError::ArityMismatch { available, supplied } => write!(
                f,
                "parameter count exceeded: {} supplied, {} available",
                supplied, available
            ),
            AdaptError::UnsupportedType(ty) => write!(f, "parameters of type {} are not supported", ty),
            AdaptError::ValueMismatch { value, expected } => {
                write!(f, "cannot convert {} to {}", value, expected)
            }
            AdaptError::MissingDefault { parameter } => {
                write!(f, "parameter {} requires a value", parameter)
            }
            AdaptError::InvalidMacro(opcode) => write!(f, "unexpected macro opcode {}", opcode),
            AdaptError::InvalidOperand { opcode, expected } => {
                write!(f, "opcode {} expects a {:?} operand", opcode, expected)
            }
            AdaptError::UnmeasurableOperand { opcode, kind } => {
                write!(f, "unexpected operand type {:?} on {}", kind, opcode)
            }
            AdaptError::LimitExceeded { what, index } => {
                write!(f, "{} index {} does not fit a short operand", what, index)
            }
        }
    }
}

impl std::error::Error for AdaptError {}

/// Failure raised while decoding or running a generated body.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecError {
    ArgumentCount { procedure: String, expected: usize, got: usize },
    ArgumentType { procedure: String, index: usize, expected: ValueType, got: String },
    StackUnderflow { offset: usize },
    BadAddress { offset: usize },
    BadToken { offset: usize, token: u32 },
    UnsupportedOpcode { offset: usize, byte: u8 },
    Truncated { offset: usize },
    MissingReturn { offset: usize },
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::ArgumentCount {
                procedure,
                expected,
                got,
            } => write!(f, "{} expects {} argument(s), got {}", procedure, expected, got),
            ExecError::ArgumentType {
                procedure,
                index,
                expected,
                got,
            } => write!(
                f,
                "{}: argument {} must be {}, got {}",
                procedure, index, expected, got
            ),
            ExecError::StackUnderflow { offset } => write!(f, "evaluation stack underflow at IL_{:04x}", offset),
            ExecError::BadAddress { offset } => write!(f, "expected an address on the stack at IL_{:04x}", offset),
            ExecError::BadToken { offset, token } => {
                write!(f, "invalid token 0x{:08x} at IL_{:04x}", token, offset)
            }
            ExecError::UnsupportedOpcode { offset, byte } => {
                write!(f, "unsupported opcode 0x{:02x} at IL_{:04x}", byte, offset)
            }
            ExecError::Truncated { offset } => write!(f, "truncated instruction at IL_{:04x}", offset),
            ExecError::MissingReturn { offset } => write!(f, "body ends without ret at IL_{:04x}", offset),
        }
    }
}

impl std::error::Error for ExecError {}
