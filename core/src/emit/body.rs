use std::sync::Arc;

use anyhow::Result;
use rustc_hash::FxHashMap;

use super::instr::{Instruction, MethodRef, Operand};
use super::materialize::LocalSlots;
use crate::typ::ValueType;

/// Table byte of string tokens.
pub const STRING_TABLE: u8 = 0x70;
/// Table byte of method tokens.
pub const METHOD_TABLE: u8 = 0x0A;
/// Table byte of type tokens.
pub const TYPE_TABLE: u8 = 0x1B;

#[inline]
pub const fn make_token(table: u8, row: usize) -> u32 {
    ((table as u32) << 24) | ((row as u32 + 1) & 0x00FF_FFFF)
}

/// Splits a token into its table byte and zero-based row.
#[inline]
pub const fn split_token(token: u32) -> (u8, Option<usize>) {
    let table = (token >> 24) as u8;
    let row = token & 0x00FF_FFFF;
    if row == 0 {
        (table, None)
    } else {
        (table, Some(row as usize - 1))
    }
}

/// Encoded procedure body: code bytes, declared locals and the tables that
/// string, method and type tokens point into.
#[derive(Debug, Clone, Default)]
pub struct MethodBody {
    pub(crate) code: Vec<u8>,
    pub(crate) locals: Vec<ValueType>,
    pub(crate) strings: Vec<Arc<str>>,
    pub(crate) methods: Vec<MethodRef>,
    pub(crate) types: Vec<ValueType>,
}

impl MethodBody {
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn locals(&self) -> &[ValueType] {
        &self.locals
    }

    pub(crate) fn string(&self, token: u32) -> Option<&Arc<str>> {
        match split_token(token) {
            (STRING_TABLE, Some(row)) => self.strings.get(row),
            _ => None,
        }
    }

    pub(crate) fn method(&self, token: u32) -> Option<&MethodRef> {
        match split_token(token) {
            (METHOD_TABLE, Some(row)) => self.methods.get(row),
            _ => None,
        }
    }

    pub(crate) fn ty(&self, token: u32) -> Option<&ValueType> {
        match split_token(token) {
            (TYPE_TABLE, Some(row)) => self.types.get(row),
            _ => None,
        }
    }
}

#[derive(Default)]
struct TokenTables {
    strings: Vec<Arc<str>>,
    string_rows: FxHashMap<Arc<str>, usize>,
    methods: Vec<MethodRef>,
    types: Vec<ValueType>,
    type_rows: FxHashMap<ValueType, usize>,
}

impl TokenTables {
    fn string(&mut self, s: &Arc<str>) -> u32 {
        let row = match self.string_rows.get(s) {
            Some(row) => *row,
            None => {
                self.strings.push(s.clone());
                self.string_rows.insert(s.clone(), self.strings.len() - 1);
                self.strings.len() - 1
            }
        };
        make_token(STRING_TABLE, row)
    }

    fn method(&mut self, m: &MethodRef) -> u32 {
        let row = match self.methods.iter().position(|known| known == m) {
            Some(row) => row,
            None => {
                self.methods.push(m.clone());
                self.methods.len() - 1
            }
        };
        make_token(METHOD_TABLE, row)
    }

    fn ty(&mut self, ty: &ValueType) -> u32 {
        let row = match self.type_rows.get(ty) {
            Some(row) => *row,
            None => {
                self.types.push(ty.clone());
                self.type_rows.insert(ty.clone(), self.types.len() - 1);
                self.types.len() - 1
            }
        };
        make_token(TYPE_TABLE, row)
    }
}

/// Two-pass body emitter.
///
/// Instructions and locals are collected first; `finish` measures the whole
/// stream, allocates the code buffer at exactly that size, declares the
/// locals in enqueue order and only then writes the instructions.
#[derive(Debug, Default)]
pub struct BodyBuilder {
    instructions: Vec<Instruction>,
    locals: LocalSlots,
}

impl BodyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instr: Instruction) {
        self.instructions.push(instr);
    }

    pub fn extend(&mut self, instrs: impl IntoIterator<Item = Instruction>) {
        self.instructions.extend(instrs);
    }

    pub fn locals_mut(&mut self) -> &mut LocalSlots {
        &mut self.locals
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Total encoded size of the collected instructions.
    pub fn measure(&self) -> Result<usize> {
        self.instructions.iter().map(Instruction::encoded_len).sum()
    }

    pub fn finish(mut self) -> Result<MethodBody> {
        let size = self.measure()?;
        let mut code = Vec::with_capacity(size);

        let mut locals = Vec::with_capacity(self.locals.len());
        while let Some(ty) = self.locals.dequeue() {
            locals.push(ty);
        }

        let mut tables = TokenTables::default();
        for instr in &self.instructions {
            encode_instruction(&mut code, instr, &mut tables)?;
        }
        debug_assert_eq!(code.len(), size, "measured and written body sizes differ");

        Ok(MethodBody {
            code,
            locals,
            strings: tables.strings,
            methods: tables.methods,
            types: tables.types,
        })
    }
}

fn encode_instruction(out: &mut Vec<u8>, instr: &Instruction, tables: &mut TokenTables) -> Result<()> {
    instr.check_operand()?;
    out.extend_from_slice(instr.opcode.encoding());
    match &instr.operand {
        Operand::None => {}
        Operand::Byte(b) => out.push(*b),
        Operand::Int32(v) => out.extend_from_slice(&v.to_le_bytes()),
        Operand::Int64(v) => out.extend_from_slice(&v.to_le_bytes()),
        Operand::Float32(v) => out.extend_from_slice(&v.to_le_bytes()),
        Operand::Float64(v) => out.extend_from_slice(&v.to_le_bytes()),
        Operand::String(s) => write_u32(out, tables.string(s)),
        Operand::Method(m) => write_u32(out, tables.method(m)),
        Operand::Type(t) => write_u32(out, tables.ty(t)),
    }
    Ok(())
}

fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}
