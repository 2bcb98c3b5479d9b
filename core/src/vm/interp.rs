use anyhow::Result;

use super::decode::DecodedInstr;
use crate::emit::{MethodRef, OpCode, Operand};
use crate::error::ExecError;
use crate::typ::{DefaultValueResolver, ValueType};
use crate::val::Value;

/// Evaluation stack entry: a value or the address of an argument/local.
#[derive(Debug, Clone)]
enum Slot {
    Value(Value),
    Arg(usize),
    Local(usize),
}

struct Frame<'a> {
    name: &'a str,
    args: Vec<Value>,
    locals: Vec<Value>,
    stack: Vec<Slot>,
    resolver: &'a DefaultValueResolver,
}

impl Frame<'_> {
    fn zero(&self, ty: &ValueType) -> Value {
        self.resolver.zero_value(ty).unwrap_or(Value::Null)
    }

    fn push(&mut self, value: Value) {
        self.stack.push(Slot::Value(value));
    }

    fn pop_value(&mut self, offset: usize) -> Result<Value> {
        match self.stack.pop() {
            Some(Slot::Value(v)) => Ok(v),
            Some(Slot::Arg(_) | Slot::Local(_)) => Err(anyhow::Error::new(ExecError::BadAddress { offset })),
            None => Err(anyhow::Error::new(ExecError::StackUnderflow { offset })),
        }
    }

    fn arg(&self, index: usize, offset: usize) -> Result<Value> {
        self.args
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow::Error::new(ExecError::BadAddress { offset }))
    }

    fn local(&self, index: usize, offset: usize) -> Result<Value> {
        self.locals
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow::Error::new(ExecError::BadAddress { offset }))
    }

    fn store_through(&mut self, slot: Slot, value: Value, offset: usize) -> Result<()> {
        let target = match slot {
            Slot::Arg(index) => self.args.get_mut(index),
            Slot::Local(index) => self.locals.get_mut(index),
            Slot::Value(_) => None,
        };
        match target {
            Some(place) => {
                *place = value;
                Ok(())
            }
            None => Err(anyhow::Error::new(ExecError::BadAddress { offset })),
        }
    }

    fn call(&mut self, method: &MethodRef, offset: usize) -> Result<()> {
        let params = method.param_types();
        if self.stack.len() < params.len() {
            return Err(anyhow::Error::new(ExecError::StackUnderflow { offset }));
        }
        let mut args = Vec::with_capacity(params.len());
        for _ in 0..params.len() {
            args.push(self.pop_value(offset)?);
        }
        args.reverse();
        let args = args
            .into_iter()
            .zip(params.iter())
            .enumerate()
            .map(|(index, (arg, ty))| {
                let got = arg.type_name();
                arg.coerce_to(ty).ok_or_else(|| {
                    anyhow::Error::new(ExecError::ArgumentType {
                        procedure: method.to_string(),
                        index,
                        expected: ty.clone(),
                        got,
                    })
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let result = method.invoke(&args)?;
        if method.return_type() != ValueType::Unit {
            self.push(result);
        }
        Ok(())
    }
}

/// Runs a decoded body to its `ret`.
pub(crate) fn execute(
    name: &str,
    code: &[DecodedInstr],
    locals: &[ValueType],
    return_type: &ValueType,
    args: Vec<Value>,
    resolver: &DefaultValueResolver,
) -> Result<Value> {
    let mut frame = Frame {
        name,
        args,
        locals: Vec::with_capacity(locals.len()),
        stack: Vec::new(),
        resolver,
    };
    for ty in locals {
        let zero = frame.zero(ty);
        frame.locals.push(zero);
    }

    for DecodedInstr { offset, instr } in code {
        let offset = *offset;
        match (instr.opcode, &instr.operand) {
            (OpCode::Nop, _) => {}
            (OpCode::Ldarg0, _) => frame.push(frame.arg(0, offset)?),
            (OpCode::Ldarg1, _) => frame.push(frame.arg(1, offset)?),
            (OpCode::Ldarg2, _) => frame.push(frame.arg(2, offset)?),
            (OpCode::Ldarg3, _) => frame.push(frame.arg(3, offset)?),
            (OpCode::LdargS, Operand::Byte(i)) => frame.push(frame.arg(*i as usize, offset)?),
            (OpCode::LdargaS, Operand::Byte(i)) => frame.stack.push(Slot::Arg(*i as usize)),
            (OpCode::Ldloc0, _) => frame.push(frame.local(0, offset)?),
            (OpCode::Ldloc1, _) => frame.push(frame.local(1, offset)?),
            (OpCode::Ldloc2, _) => frame.push(frame.local(2, offset)?),
            (OpCode::Ldloc3, _) => frame.push(frame.local(3, offset)?),
            (OpCode::LdlocS, Operand::Byte(i)) => frame.push(frame.local(*i as usize, offset)?),
            (OpCode::LdlocaS, Operand::Byte(i)) => frame.stack.push(Slot::Local(*i as usize)),
            (OpCode::LdcI4Zero, _) => frame.push(Value::I32(0)),
            (OpCode::LdcI4One, _) => frame.push(Value::I32(1)),
            (OpCode::LdcI4S, Operand::Byte(b)) => frame.push(Value::I32(*b as i8 as i32)),
            (OpCode::LdcI4, Operand::Int32(v)) => frame.push(Value::I32(*v)),
            (OpCode::LdcI8, Operand::Int64(v)) => frame.push(Value::I64(*v)),
            (OpCode::LdcR4, Operand::Float32(v)) => frame.push(Value::F32(*v)),
            (OpCode::LdcR8, Operand::Float64(v)) => frame.push(Value::F64(*v)),
            (OpCode::Ldstr, Operand::String(s)) => frame.push(Value::Str(s.clone())),
            (OpCode::Dup, _) => {
                let top = frame
                    .stack
                    .last()
                    .cloned()
                    .ok_or_else(|| anyhow::Error::new(ExecError::StackUnderflow { offset }))?;
                frame.stack.push(top);
            }
            (OpCode::Pop, _) => {
                frame
                    .stack
                    .pop()
                    .ok_or_else(|| anyhow::Error::new(ExecError::StackUnderflow { offset }))?;
            }
            (OpCode::Initobj, Operand::Type(ty)) => {
                let slot = frame
                    .stack
                    .pop()
                    .ok_or_else(|| anyhow::Error::new(ExecError::StackUnderflow { offset }))?;
                let zero = frame.zero(ty);
                frame.store_through(slot, zero, offset)?;
            }
            (OpCode::Call | OpCode::Newobj, Operand::Method(method)) => frame.call(method, offset)?,
            (OpCode::Ret, _) => {
                if *return_type == ValueType::Unit {
                    return Ok(Value::Unit);
                }
                let value = frame.pop_value(offset)?;
                let got = value.type_name();
                return value.coerce_to(return_type).ok_or_else(|| {
                    anyhow::Error::new(ExecError::ArgumentType {
                        procedure: frame.name.to_string(),
                        index: 0,
                        expected: return_type.clone(),
                        got,
                    })
                });
            }
            (opcode, _) => {
                return Err(anyhow::Error::new(ExecError::UnsupportedOpcode {
                    offset,
                    byte: opcode.encoding()[0],
                }));
            }
        }
    }

    let end = code.last().map(|d| d.offset).unwrap_or(0);
    Err(anyhow::Error::new(ExecError::MissingReturn { offset: end }))
}
