use super::*;

#[test]
fn test_forward_arguments_to_target() {
    let handle = procedure(
        &[ValueType::I64],
        ValueType::I64,
        vec![
            Instruction::bare(OpCode::Ldarg0),
            Instruction::call(echo(ValueType::I64)),
            Instruction::bare(OpCode::Ret),
        ],
    );
    assert_eq!(handle.invoke(&[Value::I64(-9)]).unwrap(), Value::I64(-9));
}

#[test]
fn test_short_constants_narrow_at_call() {
    let handle = procedure(
        &[],
        ValueType::U8,
        vec![
            Instruction::new(OpCode::LdcI4S, Operand::Byte(250)),
            Instruction::call(echo(ValueType::U8)),
            Instruction::bare(OpCode::Ret),
        ],
    );
    assert_eq!(handle.invoke(&[]).unwrap(), Value::U8(250));

    let handle = procedure(
        &[],
        ValueType::Bool,
        vec![
            Instruction::bare(OpCode::LdcI4One),
            Instruction::call(echo(ValueType::Bool)),
            Instruction::bare(OpCode::Ret),
        ],
    );
    assert_eq!(handle.invoke(&[]).unwrap(), Value::Bool(true));
}

#[test]
fn test_initobj_needs_a_declared_local() {
    let handle = procedure(
        &[],
        ValueType::F64,
        vec![
            Instruction::new(OpCode::LdlocaS, Operand::Byte(0)),
            Instruction::new(OpCode::Initobj, Operand::Type(ValueType::F64)),
            Instruction::bare(OpCode::Ldloc0),
            Instruction::bare(OpCode::Ret),
        ],
    );
    // No local was enqueued, so the address is out of range.
    let err = handle.invoke(&[]).unwrap_err();
    assert_eq!(err.downcast_ref::<ExecError>(), Some(&ExecError::BadAddress { offset: 2 }));
}

#[test]
fn test_initobj_through_argument_address() {
    let handle = procedure(
        &[ValueType::I32],
        ValueType::I32,
        vec![
            Instruction::new(OpCode::LdargaS, Operand::Byte(0)),
            Instruction::new(OpCode::Initobj, Operand::Type(ValueType::I32)),
            Instruction::bare(OpCode::Ldarg0),
            Instruction::bare(OpCode::Ret),
        ],
    );
    assert_eq!(handle.invoke(&[Value::I32(77)]).unwrap(), Value::I32(0));
}

#[test]
fn test_dup_and_pop() {
    let handle = procedure(
        &[],
        ValueType::I32,
        vec![
            Instruction::new(OpCode::LdcI4, Operand::Int32(3)),
            Instruction::bare(OpCode::Dup),
            Instruction::bare(OpCode::Pop),
            Instruction::bare(OpCode::Nop),
            Instruction::bare(OpCode::Ret),
        ],
    );
    assert_eq!(handle.invoke(&[]).unwrap(), Value::I32(3));
}

#[test]
fn test_nullable_constructor() {
    let nullable = ValueType::nullable(ValueType::I16);
    let handle = procedure(
        &[],
        nullable.clone(),
        vec![
            Instruction::new(OpCode::LdcI4, Operand::Int32(-3)),
            Instruction::new(
                OpCode::Newobj,
                Operand::Method(crate::emit::MethodRef::NullableCtor(ValueType::I16)),
            ),
            Instruction::bare(OpCode::Ret),
        ],
    );
    assert_eq!(handle.invoke(&[]).unwrap(), Value::some(Value::I16(-3)));
}

#[test]
fn test_unit_target_returns_unit() {
    let sink = NativeProcedure::new("sink", Signature::of_types(&[ValueType::Str], ValueType::Unit), |_| {
        Ok(Value::Unit)
    })
    .into_arc();
    let handle = procedure(
        &[ValueType::Str],
        ValueType::Unit,
        vec![
            Instruction::bare(OpCode::Ldarg0),
            Instruction::call(sink),
            Instruction::bare(OpCode::Ret),
        ],
    );
    assert_eq!(handle.invoke(&[Value::str("x")]).unwrap(), Value::Unit);
}

#[test]
fn test_stack_underflow() {
    let handle = procedure(&[], ValueType::I32, vec![Instruction::bare(OpCode::Pop), Instruction::bare(OpCode::Ret)]);
    let err = handle.invoke(&[]).unwrap_err();
    assert_eq!(err.downcast_ref::<ExecError>(), Some(&ExecError::StackUnderflow { offset: 0 }));
}

#[test]
fn test_missing_return() {
    let handle = procedure(&[], ValueType::I32, vec![Instruction::bare(OpCode::LdcI4Zero)]);
    let err = handle.invoke(&[]).unwrap_err();
    assert_eq!(err.downcast_ref::<ExecError>(), Some(&ExecError::MissingReturn { offset: 0 }));
}

#[test]
fn test_wrong_argument_count() {
    let handle = procedure(&[ValueType::I32, ValueType::I32], ValueType::Unit, vec![Instruction::bare(OpCode::Ret)]);
    let err = handle.invoke(&[Value::I32(1)]).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ExecError>(),
        Some(&ExecError::ArgumentCount {
            procedure: "test".into(),
            expected: 2,
            got: 1
        })
    );
}

#[test]
fn test_wrong_argument_type() {
    let handle = procedure(&[ValueType::F64], ValueType::Unit, vec![Instruction::bare(OpCode::Ret)]);
    let err = handle.invoke(&[Value::str("1.0")]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ExecError>(),
        Some(ExecError::ArgumentType {
            index: 0,
            expected: ValueType::F64,
            ..
        })
    ));
}

#[test]
fn test_host_arguments_are_not_truncated() {
    let handle = procedure(
        &[ValueType::U8],
        ValueType::U8,
        vec![
            Instruction::bare(OpCode::Ldarg0),
            Instruction::call(echo(ValueType::U8)),
            Instruction::bare(OpCode::Ret),
        ],
    );
    assert_eq!(handle.invoke(&[Value::U8(44)]).unwrap(), Value::U8(44));
    for arg in [Value::I32(300), Value::I32(-1), Value::I32(7)] {
        let err = handle.invoke(&[arg]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExecError>(),
            Some(ExecError::ArgumentType {
                index: 0,
                expected: ValueType::U8,
                ..
            })
        ));
    }

    let wide = procedure(
        &[ValueType::I64],
        ValueType::I64,
        vec![
            Instruction::bare(OpCode::Ldarg0),
            Instruction::call(echo(ValueType::I64)),
            Instruction::bare(OpCode::Ret),
        ],
    );
    assert_eq!(wide.invoke(&[Value::I32(-5)]).unwrap(), Value::I64(-5));
}

#[test]
fn test_callee_argument_type_is_checked() {
    let handle = procedure(
        &[],
        ValueType::I32,
        vec![
            Instruction::new(OpCode::Ldstr, Operand::String("no".into())),
            Instruction::call(echo(ValueType::I32)),
            Instruction::bare(OpCode::Ret),
        ],
    );
    let err = handle.invoke(&[]).unwrap_err();
    assert!(matches!(err.downcast_ref::<ExecError>(), Some(ExecError::ArgumentType { .. })));
}

#[test]
fn test_concurrent_invocations() {
    let handle = procedure(
        &[ValueType::I32],
        ValueType::I32,
        vec![
            Instruction::bare(OpCode::Ldarg0),
            Instruction::call(echo(ValueType::I32)),
            Instruction::bare(OpCode::Ret),
        ],
    )
    .into_arc();

    std::thread::scope(|s| {
        for i in 0..8 {
            let handle = handle.clone();
            s.spawn(move || assert_eq!(handle.invoke(&[Value::I32(i)]).unwrap(), Value::I32(i)));
        }
    });
}
