use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::emit::{Instruction, MethodBody, OpCode, Operand, OperandKind};
use crate::error::ExecError;

/// An instruction read back from a body, with its byte offset.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedInstr {
    pub offset: usize,
    pub instr: Instruction,
}

/// One row of a human-readable body listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingLine {
    pub offset: usize,
    pub mnemonic: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operand: Option<String>,
}

impl From<&DecodedInstr> for ListingLine {
    fn from(decoded: &DecodedInstr) -> Self {
        let operand = match &decoded.instr.operand {
            Operand::None => None,
            other => Some(other.to_string()),
        };
        Self {
            offset: decoded.offset,
            mnemonic: decoded.instr.opcode.mnemonic(),
            operand,
        }
    }
}

/// Decodes an encoded body, resolving tokens against the body's tables.
pub fn decode(body: &MethodBody) -> Result<Vec<DecodedInstr>> {
    let code = body.code();
    let mut out = Vec::new();
    let mut cursor = 0usize;

    while cursor < code.len() {
        let offset = cursor;
        let (opcode, width) = OpCode::decode(&code[cursor..]).ok_or_else(|| {
            anyhow::Error::new(ExecError::UnsupportedOpcode {
                offset,
                byte: code[cursor],
            })
        })?;
        cursor += width;

        let operand = match opcode.operand_kind() {
            OperandKind::None => Operand::None,
            OperandKind::Byte => Operand::Byte(read_array::<1>(code, &mut cursor, offset)?[0]),
            OperandKind::Int32 => Operand::Int32(i32::from_le_bytes(read_array(code, &mut cursor, offset)?)),
            OperandKind::Int64 => Operand::Int64(i64::from_le_bytes(read_array(code, &mut cursor, offset)?)),
            OperandKind::Float32 => Operand::Float32(f32::from_le_bytes(read_array(code, &mut cursor, offset)?)),
            OperandKind::Float64 => Operand::Float64(f64::from_le_bytes(read_array(code, &mut cursor, offset)?)),
            OperandKind::String => {
                let token = read_token(code, &mut cursor, offset)?;
                let s = body.string(token).ok_or_else(|| bad_token(offset, token))?;
                Operand::String(s.clone())
            }
            OperandKind::Method => {
                let token = read_token(code, &mut cursor, offset)?;
                let m = body.method(token).ok_or_else(|| bad_token(offset, token))?;
                Operand::Method(m.clone())
            }
            OperandKind::Type => {
                let token = read_token(code, &mut cursor, offset)?;
                let ty = body.ty(token).ok_or_else(|| bad_token(offset, token))?;
                Operand::Type(ty.clone())
            }
            OperandKind::BranchTarget | OperandKind::Field | OperandKind::Token => {
                return Err(anyhow::Error::new(ExecError::UnsupportedOpcode {
                    offset,
                    byte: code[offset],
                }));
            }
        };

        out.push(DecodedInstr {
            offset,
            instr: Instruction::new(opcode, operand),
        });
    }

    debug!(target: "rebind::vm", bytes = code.len(), instructions = out.len(), "decoded body");
    Ok(out)
}

fn read_array<const N: usize>(code: &[u8], cursor: &mut usize, offset: usize) -> Result<[u8; N]> {
    let end = *cursor + N;
    let bytes = code
        .get(*cursor..end)
        .ok_or_else(|| anyhow::Error::new(ExecError::Truncated { offset }))?;
    let mut buf = [0u8; N];
    buf.copy_from_slice(bytes);
    *cursor = end;
    Ok(buf)
}

fn read_token(code: &[u8], cursor: &mut usize, offset: usize) -> Result<u32> {
    read_array(code, cursor, offset).map(u32::from_le_bytes)
}

fn bad_token(offset: usize, token: u32) -> anyhow::Error {
    anyhow::Error::new(ExecError::BadToken { offset, token })
}
