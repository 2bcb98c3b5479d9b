pub(super) use std::sync::Arc;

pub(super) use crate::{
    emit::{BodyBuilder, Instruction, METHOD_TABLE, MethodBody, OpCode, Operand, make_token},
    error::ExecError,
    method::{NativeProcedure, Procedure, Signature},
    typ::{DefaultValueResolver, ValueType},
    val::Value,
    vm::{GeneratedProcedure, ListingLine, decode},
};

/// Wraps hand-assembled instructions into a callable procedure.
pub(super) fn procedure(params: &[ValueType], ret: ValueType, instrs: Vec<Instruction>) -> GeneratedProcedure {
    let mut builder = BodyBuilder::new();
    builder.extend(instrs);
    let body = builder.finish().unwrap();
    GeneratedProcedure::new(
        "test",
        Signature::of_types(params, ret),
        body,
        Arc::new(DefaultValueResolver::new()),
    )
}

pub(super) fn raw(code: Vec<u8>) -> MethodBody {
    MethodBody {
        code,
        ..MethodBody::default()
    }
}

pub(super) fn echo(ty: ValueType) -> Arc<dyn Procedure> {
    NativeProcedure::new("echo", Signature::of_types(&[ty.clone()], ty), |args| Ok(args[0].clone())).into_arc()
}

mod decoding;
mod execution;
