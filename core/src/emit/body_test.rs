use std::sync::Arc;

use super::*;
use crate::error::AdaptError;
use crate::method::{NativeProcedure, Procedure, Signature};
use crate::typ::ValueType;
use crate::val::Value;

fn sink() -> Arc<dyn Procedure> {
    NativeProcedure::new(
        "sink",
        Signature::of_types(&[ValueType::Str, ValueType::I32], ValueType::Unit),
        |_| Ok(Value::Unit),
    )
    .into_arc()
}

#[test]
fn test_tokens() {
    assert_eq!(make_token(STRING_TABLE, 0), 0x7000_0001);
    assert_eq!(make_token(METHOD_TABLE, 2), 0x0A00_0003);
    assert_eq!(split_token(0x1B00_0004), (TYPE_TABLE, Some(3)));
    assert_eq!(split_token(0x7000_0000), (STRING_TABLE, None));
}

#[test]
fn test_measured_size_matches_written_bytes() {
    let mut builder = BodyBuilder::new();
    builder.push(Instruction::bare(OpCode::Ldarg0));
    let text = materialize(Some(&Value::str("x")), &ValueType::Str, builder.locals_mut()).unwrap();
    builder.extend(text);
    let zeroed = materialize(None, &ValueType::I32, builder.locals_mut()).unwrap();
    builder.extend(zeroed);
    builder.push(Instruction::new(OpCode::LdcR8, Operand::Float64(1.0)));
    builder.push(Instruction::new(OpCode::LdcI8, Operand::Int64(-1)));
    builder.push(Instruction::call(sink()));
    builder.push(Instruction::bare(OpCode::Ret));

    let measured = builder.measure().unwrap();
    // 1 + 5 + (2 + 6 + 1) + 9 + 9 + 5 + 1
    assert_eq!(measured, 39);
    let body = builder.finish().unwrap();
    assert_eq!(body.code().len(), measured);
    assert_eq!(body.locals(), &[ValueType::I32]);
}

#[test]
fn test_encoding_layout() {
    let mut builder = BodyBuilder::new();
    builder.push(Instruction::new(OpCode::LdcI4, Operand::Int32(0x0102_0304)));
    builder.push(Instruction::new(OpCode::Ldstr, Operand::String("a".into())));
    builder.push(Instruction::new(OpCode::Initobj, Operand::Type(ValueType::I16)));
    let body = builder.finish().unwrap();
    assert_eq!(
        body.code(),
        &[
            0x20, 0x04, 0x03, 0x02, 0x01, // ldc.i4
            0x72, 0x01, 0x00, 0x00, 0x70, // ldstr
            0xFE, 0x15, 0x01, 0x00, 0x00, 0x1B, // initobj
        ]
    );
}

#[test]
fn test_token_tables_deduplicate() {
    let target = sink();
    let mut builder = BodyBuilder::new();
    for _ in 0..3 {
        builder.push(Instruction::new(OpCode::Ldstr, Operand::String("same".into())));
        builder.push(Instruction::call(target.clone()));
    }
    builder.push(Instruction::new(OpCode::Ldstr, Operand::String("other".into())));
    let body = builder.finish().unwrap();

    assert_eq!(body.strings.len(), 2);
    assert_eq!(body.methods.len(), 1);
    assert_eq!(body.string(make_token(STRING_TABLE, 1)).map(|s| s.as_ref()), Some("other"));
    assert!(body.string(make_token(METHOD_TABLE, 0)).is_none());
    assert!(body.method(make_token(METHOD_TABLE, 1)).is_none());
}

#[test]
fn test_locals_declared_in_enqueue_order() {
    let mut builder = BodyBuilder::new();
    for ty in [ValueType::F32, ValueType::Bool, ValueType::nullable(ValueType::I64)] {
        let instrs = materialize(None, &ty, builder.locals_mut()).unwrap();
        builder.extend(instrs);
    }
    let body = builder.finish().unwrap();
    assert_eq!(
        body.locals(),
        &[ValueType::F32, ValueType::Bool, ValueType::nullable(ValueType::I64)]
    );
}

#[test]
fn test_unmeasurable_instruction_fails_before_writing() {
    let mut builder = BodyBuilder::new();
    builder.push(Instruction::bare(OpCode::Ret));
    builder.push(Instruction::bare(OpCode::Br));
    let err = builder.finish().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AdaptError>(),
        Some(AdaptError::UnmeasurableOperand { opcode: OpCode::Br, .. })
    ));
}

#[test]
fn test_mismatched_operand_fails() {
    let mut builder = BodyBuilder::new();
    builder.push(Instruction::new(OpCode::LdcR4, Operand::Float64(1.0)));
    assert!(builder.finish().is_err());
}
