use std::collections::VecDeque;

use anyhow::Result;

use super::instr::{Instruction, MethodRef, Operand, resolve_macro, short_index};
use super::opcode::OpCode;
use crate::error::AdaptError;
use crate::typ::ValueType;
use crate::val::Value;

/// Locals requested while materializing, in the order they were needed.
///
/// A slot's load index is its position in the queue at enqueue time; locals
/// are declared by draining the queue in the same order.
#[derive(Debug, Default, Clone)]
pub struct LocalSlots {
    queue: VecDeque<ValueType>,
}

impl LocalSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, ty: ValueType) -> Result<u8> {
        let index = short_index("local", self.queue.len())?;
        self.queue.push_back(ty);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValueType> {
        self.queue.iter()
    }

    pub(crate) fn dequeue(&mut self) -> Option<ValueType> {
        self.queue.pop_front()
    }
}

/// Instructions that leave `value`, typed as `ty`, on top of the stack.
///
/// An absent value (`None`, `Null`, an empty nullable) zero-initializes a
/// fresh local of type `ty` and loads it. Nullable targets encode the
/// underlying value and wrap it with the nullable constructor.
pub fn materialize(value: Option<&Value>, ty: &ValueType, locals: &mut LocalSlots) -> Result<Vec<Instruction>> {
    if !ty.is_simple() {
        return Err(anyhow::Error::new(AdaptError::UnsupportedType(ty.clone())));
    }

    let value = match value {
        Some(v) if !v.is_absent() => v,
        _ => {
            let index = locals.enqueue(ty.clone())?;
            return Ok(vec![
                resolve_macro(OpCode::LdlocaS, index)?,
                Instruction::new(OpCode::Initobj, Operand::Type(ty.clone())),
                resolve_macro(OpCode::LdlocS, index)?,
            ]);
        }
    };

    let (value, ty, wrap) = match ty.nullable_underlying() {
        Some(underlying) => {
            let inner = match value {
                Value::Nullable(Some(inner)) => inner.as_ref(),
                other => other,
            };
            debug_assert!(!inner.is_absent(), "nullable value must be present");
            (inner, underlying, Some(underlying))
        }
        None => (value, ty, None),
    };

    if !value.is_instance_of(ty) {
        return Err(anyhow::Error::new(AdaptError::ValueMismatch {
            value: format!("{} of type {}", value, value.type_name()),
            expected: ty.clone(),
        }));
    }

    let load = match value {
        Value::Bool(true) => Instruction::bare(OpCode::LdcI4One),
        Value::Bool(false) => Instruction::bare(OpCode::LdcI4Zero),
        Value::U8(v) => Instruction::new(OpCode::LdcI4S, Operand::Byte(*v)),
        Value::I16(v) => Instruction::new(OpCode::LdcI4, Operand::Int32(*v as i32)),
        Value::I32(v) => Instruction::new(OpCode::LdcI4, Operand::Int32(*v)),
        Value::I64(v) => Instruction::new(OpCode::LdcI8, Operand::Int64(*v)),
        Value::F32(v) => Instruction::new(OpCode::LdcR4, Operand::Float32(*v)),
        Value::F64(v) => Instruction::new(OpCode::LdcR8, Operand::Float64(*v)),
        Value::Str(s) => Instruction::new(OpCode::Ldstr, Operand::String(s.clone())),
        _ => return Err(anyhow::Error::new(AdaptError::UnsupportedType(ty.clone()))),
    };

    let mut out = vec![load];
    if let Some(underlying) = wrap {
        out.push(Instruction::new(
            OpCode::Newobj,
            Operand::Method(MethodRef::NullableCtor(underlying.clone())),
        ));
    }
    Ok(out)
}
