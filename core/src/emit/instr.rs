use std::{fmt, sync::Arc};

use anyhow::Result;

use super::opcode::{OpCode, OperandKind};
use crate::error::{AdaptError, ExecError};
use crate::method::Procedure;
use crate::typ::ValueType;
use crate::val::Value;

/// Callee referenced by `call` and `newobj`.
#[derive(Clone)]
pub enum MethodRef {
    Procedure(Arc<dyn Procedure>),
    /// Constructor of `U?` taking one `U`.
    NullableCtor(ValueType),
}

impl MethodRef {
    pub fn param_types(&self) -> Vec<ValueType> {
        match self {
            MethodRef::Procedure(target) => target.signature().param_types().cloned().collect(),
            MethodRef::NullableCtor(underlying) => vec![underlying.clone()],
        }
    }

    pub fn return_type(&self) -> ValueType {
        match self {
            MethodRef::Procedure(target) => target.signature().return_type.clone(),
            MethodRef::NullableCtor(underlying) => ValueType::nullable(underlying.clone()),
        }
    }

    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        match self {
            MethodRef::Procedure(target) => target.invoke(args),
            MethodRef::NullableCtor(underlying) => match args {
                [inner] => Ok(Value::some(inner.clone())),
                _ => Err(anyhow::Error::new(ExecError::ArgumentCount {
                    procedure: format!("{}?::.ctor", underlying),
                    expected: 1,
                    got: args.len(),
                })),
            },
        }
    }
}

impl PartialEq for MethodRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MethodRef::Procedure(a), MethodRef::Procedure(b)) => Arc::ptr_eq(a, b),
            (MethodRef::NullableCtor(a), MethodRef::NullableCtor(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodRef::Procedure(target) => {
                let sig = target.signature();
                let params: Vec<String> = sig.param_types().map(|t| t.to_string()).collect();
                write!(f, "{} {}({})", sig.return_type, target.name(), params.join(", "))
            }
            MethodRef::NullableCtor(underlying) => write!(f, "{}?::.ctor({})", underlying, underlying),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Byte(u8),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(Arc<str>),
    Method(MethodRef),
    Type(ValueType),
}

impl Operand {
    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::None => OperandKind::None,
            Operand::Byte(_) => OperandKind::Byte,
            Operand::Int32(_) => OperandKind::Int32,
            Operand::Int64(_) => OperandKind::Int64,
            Operand::Float32(_) => OperandKind::Float32,
            Operand::Float64(_) => OperandKind::Float64,
            Operand::String(_) => OperandKind::String,
            Operand::Method(_) => OperandKind::Method,
            Operand::Type(_) => OperandKind::Type,
        }
    }
}

/// One instruction of a procedure body.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub operand: Operand,
}

impl Instruction {
    pub fn new(opcode: OpCode, operand: Operand) -> Self {
        Self { opcode, operand }
    }

    pub fn bare(opcode: OpCode) -> Self {
        Self::new(opcode, Operand::None)
    }

    pub fn call(target: Arc<dyn Procedure>) -> Self {
        Self::new(OpCode::Call, Operand::Method(MethodRef::Procedure(target)))
    }

    /// Encoded length of this instruction.
    pub fn encoded_len(&self) -> Result<usize> {
        self.opcode.instruction_length()
    }

    /// Errors when the operand does not match the opcode's operand kind.
    pub fn check_operand(&self) -> Result<()> {
        let expected = self.opcode.operand_kind();
        if self.operand.kind() != expected {
            return Err(anyhow::Error::new(AdaptError::InvalidOperand {
                opcode: self.opcode,
                expected,
            }));
        }
        Ok(())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => Ok(()),
            Operand::Byte(b) => write!(f, "{}", b),
            Operand::Int32(v) => write!(f, "{}", v),
            Operand::Int64(v) => write!(f, "{}", v),
            Operand::Float32(v) => write!(f, "{:?}", v),
            Operand::Float64(v) => write!(f, "{:?}", v),
            Operand::String(s) => write!(f, "{:?}", s),
            Operand::Method(m) => write!(f, "{}", m),
            Operand::Type(t) => write!(f, "{}", t),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operand {
            Operand::None => write!(f, "{}", self.opcode),
            operand => write!(f, "{} {}", self.opcode, operand),
        }
    }
}

/// Canonicalizes an indexed argument/local load.
///
/// `ldarg.s` and `ldloc.s` with indices 0-3 collapse to their operand-free
/// forms; the address-taking forms always keep the index.
pub fn resolve_macro(opcode: OpCode, index: u8) -> Result<Instruction> {
    let short = |ops: [OpCode; 4]| match index {
        0..=3 => Instruction::bare(ops[index as usize]),
        _ => Instruction::new(opcode, Operand::Byte(index)),
    };
    match opcode {
        OpCode::LdargS => Ok(short([OpCode::Ldarg0, OpCode::Ldarg1, OpCode::Ldarg2, OpCode::Ldarg3])),
        OpCode::LdlocS => Ok(short([OpCode::Ldloc0, OpCode::Ldloc1, OpCode::Ldloc2, OpCode::Ldloc3])),
        OpCode::LdargaS | OpCode::LdlocaS => Ok(Instruction::new(opcode, Operand::Byte(index))),
        other => Err(anyhow::Error::new(AdaptError::InvalidMacro(other))),
    }
}

/// Narrows a slot index to the one-byte operand used by short forms.
pub(crate) fn short_index(what: &'static str, index: usize) -> Result<u8> {
    u8::try_from(index).map_err(|_| anyhow::Error::new(AdaptError::LimitExceeded { what, index }))
}
