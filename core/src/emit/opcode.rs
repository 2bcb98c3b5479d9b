use std::fmt;

use anyhow::Result;
use serde::Serialize;

use crate::error::AdaptError;

/// Operand encoding attached to an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperandKind {
    None,
    /// One raw byte: short constants and argument/local indices.
    Byte,
    Int32,
    Int64,
    Float32,
    Float64,
    /// Token into the body's string table.
    String,
    /// Token into the body's method table.
    Method,
    /// Token into the body's type table.
    Type,
    // Kinds below exist in the instruction set but have no length entry.
    BranchTarget,
    Field,
    Token,
}

impl OperandKind {
    /// Encoded operand size in bytes, `None` for kinds outside the table.
    pub const fn encoded_len(self) -> Option<usize> {
        match self {
            OperandKind::None => Some(0),
            OperandKind::Byte => Some(1),
            OperandKind::Int32 | OperandKind::Float32 => Some(4),
            OperandKind::Int64 | OperandKind::Float64 => Some(8),
            OperandKind::String | OperandKind::Method | OperandKind::Type => Some(4),
            OperandKind::BranchTarget | OperandKind::Field | OperandKind::Token => None,
        }
    }
}

/// Prefix byte of two-byte opcodes.
pub const PREFIX_FE: u8 = 0xFE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OpCode {
    Nop,
    Ldarg0,
    Ldarg1,
    Ldarg2,
    Ldarg3,
    Ldloc0,
    Ldloc1,
    Ldloc2,
    Ldloc3,
    LdargS,
    LdargaS,
    LdlocS,
    LdlocaS,
    LdcI4Zero,
    LdcI4One,
    LdcI4S,
    LdcI4,
    LdcI8,
    LdcR4,
    LdcR8,
    Dup,
    Pop,
    Call,
    Ret,
    Br,
    Ldstr,
    Newobj,
    Ldfld,
    Ldtoken,
    Initobj,
}

impl OpCode {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Nop => "nop",
            OpCode::Ldarg0 => "ldarg.0",
            OpCode::Ldarg1 => "ldarg.1",
            OpCode::Ldarg2 => "ldarg.2",
            OpCode::Ldarg3 => "ldarg.3",
            OpCode::Ldloc0 => "ldloc.0",
            OpCode::Ldloc1 => "ldloc.1",
            OpCode::Ldloc2 => "ldloc.2",
            OpCode::Ldloc3 => "ldloc.3",
            OpCode::LdargS => "ldarg.s",
            OpCode::LdargaS => "ldarga.s",
            OpCode::LdlocS => "ldloc.s",
            OpCode::LdlocaS => "ldloca.s",
            OpCode::LdcI4Zero => "ldc.i4.0",
            OpCode::LdcI4One => "ldc.i4.1",
            OpCode::LdcI4S => "ldc.i4.s",
            OpCode::LdcI4 => "ldc.i4",
            OpCode::LdcI8 => "ldc.i8",
            OpCode::LdcR4 => "ldc.r4",
            OpCode::LdcR8 => "ldc.r8",
            OpCode::Dup => "dup",
            OpCode::Pop => "pop",
            OpCode::Call => "call",
            OpCode::Ret => "ret",
            OpCode::Br => "br",
            OpCode::Ldstr => "ldstr",
            OpCode::Newobj => "newobj",
            OpCode::Ldfld => "ldfld",
            OpCode::Ldtoken => "ldtoken",
            OpCode::Initobj => "initobj",
        }
    }

    /// Opcode bytes as they appear in the code stream.
    pub const fn encoding(self) -> &'static [u8] {
        match self {
            OpCode::Nop => &[0x00],
            OpCode::Ldarg0 => &[0x02],
            OpCode::Ldarg1 => &[0x03],
            OpCode::Ldarg2 => &[0x04],
            OpCode::Ldarg3 => &[0x05],
            OpCode::Ldloc0 => &[0x06],
            OpCode::Ldloc1 => &[0x07],
            OpCode::Ldloc2 => &[0x08],
            OpCode::Ldloc3 => &[0x09],
            OpCode::LdargS => &[0x0E],
            OpCode::LdargaS => &[0x0F],
            OpCode::LdlocS => &[0x11],
            OpCode::LdlocaS => &[0x12],
            OpCode::LdcI4Zero => &[0x16],
            OpCode::LdcI4One => &[0x17],
            OpCode::LdcI4S => &[0x1F],
            OpCode::LdcI4 => &[0x20],
            OpCode::LdcI8 => &[0x21],
            OpCode::LdcR4 => &[0x22],
            OpCode::LdcR8 => &[0x23],
            OpCode::Dup => &[0x25],
            OpCode::Pop => &[0x26],
            OpCode::Call => &[0x28],
            OpCode::Ret => &[0x2A],
            OpCode::Br => &[0x38],
            OpCode::Ldstr => &[0x72],
            OpCode::Newobj => &[0x73],
            OpCode::Ldfld => &[0x7B],
            OpCode::Ldtoken => &[0xD0],
            OpCode::Initobj => &[PREFIX_FE, 0x15],
        }
    }

    pub const fn operand_kind(self) -> OperandKind {
        match self {
            OpCode::Nop
            | OpCode::Ldarg0
            | OpCode::Ldarg1
            | OpCode::Ldarg2
            | OpCode::Ldarg3
            | OpCode::Ldloc0
            | OpCode::Ldloc1
            | OpCode::Ldloc2
            | OpCode::Ldloc3
            | OpCode::LdcI4Zero
            | OpCode::LdcI4One
            | OpCode::Dup
            | OpCode::Pop
            | OpCode::Ret => OperandKind::None,
            OpCode::LdargS | OpCode::LdargaS | OpCode::LdlocS | OpCode::LdlocaS | OpCode::LdcI4S => OperandKind::Byte,
            OpCode::LdcI4 => OperandKind::Int32,
            OpCode::LdcI8 => OperandKind::Int64,
            OpCode::LdcR4 => OperandKind::Float32,
            OpCode::LdcR8 => OperandKind::Float64,
            OpCode::Ldstr => OperandKind::String,
            OpCode::Call | OpCode::Newobj => OperandKind::Method,
            OpCode::Initobj => OperandKind::Type,
            OpCode::Br => OperandKind::BranchTarget,
            OpCode::Ldfld => OperandKind::Field,
            OpCode::Ldtoken => OperandKind::Token,
        }
    }

    pub const fn size(self) -> usize {
        self.encoding().len()
    }

    /// Opcode size plus operand size. Fails for operand kinds outside the table.
    pub fn instruction_length(self) -> Result<usize> {
        let kind = self.operand_kind();
        match kind.encoded_len() {
            Some(operand) => Ok(self.size() + operand),
            None => Err(anyhow::Error::new(AdaptError::UnmeasurableOperand { opcode: self, kind })),
        }
    }

    /// Reads an opcode from the head of `code`, returning it with its byte length.
    pub fn decode(code: &[u8]) -> Option<(OpCode, usize)> {
        let first = *code.first()?;
        let single = match first {
            0x00 => OpCode::Nop,
            0x02 => OpCode::Ldarg0,
            0x03 => OpCode::Ldarg1,
            0x04 => OpCode::Ldarg2,
            0x05 => OpCode::Ldarg3,
            0x06 => OpCode::Ldloc0,
            0x07 => OpCode::Ldloc1,
            0x08 => OpCode::Ldloc2,
            0x09 => OpCode::Ldloc3,
            0x0E => OpCode::LdargS,
            0x0F => OpCode::LdargaS,
            0x11 => OpCode::LdlocS,
            0x12 => OpCode::LdlocaS,
            0x16 => OpCode::LdcI4Zero,
            0x17 => OpCode::LdcI4One,
            0x1F => OpCode::LdcI4S,
            0x20 => OpCode::LdcI4,
            0x21 => OpCode::LdcI8,
            0x22 => OpCode::LdcR4,
            0x23 => OpCode::LdcR8,
            0x25 => OpCode::Dup,
            0x26 => OpCode::Pop,
            0x28 => OpCode::Call,
            0x2A => OpCode::Ret,
            0x38 => OpCode::Br,
            0x72 => OpCode::Ldstr,
            0x73 => OpCode::Newobj,
            0x7B => OpCode::Ldfld,
            0xD0 => OpCode::Ldtoken,
            PREFIX_FE => {
                return match code.get(1)? {
                    0x15 => Some((OpCode::Initobj, 2)),
                    _ => None,
                };
            }
            _ => return None,
        };
        Some((single, 1))
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
