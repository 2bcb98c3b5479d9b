use super::*;

#[test]
fn test_decode_recovers_instructions_and_offsets() {
    let target = echo(ValueType::Str);
    let handle = procedure(
        &[],
        ValueType::Str,
        vec![
            Instruction::new(OpCode::Ldstr, Operand::String("hi".into())),
            Instruction::call(target.clone()),
            Instruction::bare(OpCode::Ret),
        ],
    );

    let decoded = handle.disassemble().unwrap();
    let offsets: Vec<usize> = decoded.iter().map(|d| d.offset).collect();
    assert_eq!(offsets, vec![0, 5, 10]);
    assert_eq!(decoded[0].instr, Instruction::new(OpCode::Ldstr, Operand::String("hi".into())));
    assert_eq!(decoded[1].instr, Instruction::call(target));
    assert_eq!(decoded[2].instr, Instruction::bare(OpCode::Ret));
}

#[test]
fn test_decode_is_cached() {
    let handle = procedure(&[], ValueType::I32, vec![Instruction::bare(OpCode::LdcI4One), Instruction::bare(OpCode::Ret)]);
    let first = handle.disassemble().unwrap().as_ptr();
    let second = handle.disassemble().unwrap().as_ptr();
    assert_eq!(first, second);
}

#[test]
fn test_all_operand_kinds_decode() {
    let instrs = vec![
        Instruction::new(OpCode::LdcI4S, Operand::Byte(0x80)),
        Instruction::new(OpCode::LdcI4, Operand::Int32(-5)),
        Instruction::new(OpCode::LdcI8, Operand::Int64(i64::MAX)),
        Instruction::new(OpCode::LdcR4, Operand::Float32(1.5)),
        Instruction::new(OpCode::LdcR8, Operand::Float64(-0.25)),
        Instruction::new(OpCode::LdlocaS, Operand::Byte(7)),
        Instruction::new(OpCode::Initobj, Operand::Type(ValueType::nullable(ValueType::I16))),
        Instruction::bare(OpCode::Ret),
    ];
    let handle = procedure(&[], ValueType::Unit, instrs.clone());
    let decoded: Vec<Instruction> = handle.disassemble().unwrap().iter().map(|d| d.instr.clone()).collect();
    assert_eq!(decoded, instrs);
}

#[test]
fn test_unknown_opcode_byte() {
    let err = decode(&raw(vec![0x16, 0x01])).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ExecError>(),
        Some(&ExecError::UnsupportedOpcode { offset: 1, byte: 0x01 })
    );
}

#[test]
fn test_unmeasurable_opcodes_are_rejected() {
    for byte in [0x38u8, 0x7B, 0xD0] {
        let err = decode(&raw(vec![byte, 0, 0, 0, 0])).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExecError>(),
            Some(&ExecError::UnsupportedOpcode { offset: 0, byte })
        );
    }
}

#[test]
fn test_truncated_operand() {
    let err = decode(&raw(vec![0x20, 0x01, 0x02])).unwrap_err();
    assert_eq!(err.downcast_ref::<ExecError>(), Some(&ExecError::Truncated { offset: 0 }));
}

#[test]
fn test_bad_token() {
    let token = make_token(METHOD_TABLE, 0);
    let mut code = vec![0x28];
    code.extend_from_slice(&token.to_le_bytes());
    let err = decode(&raw(code)).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ExecError>(),
        Some(&ExecError::BadToken { offset: 0, token })
    );
}

#[test]
fn test_token_from_wrong_table() {
    // A string token where a method token is expected.
    let mut code = vec![0x28];
    code.extend_from_slice(&0x7000_0001u32.to_le_bytes());
    let body = MethodBody {
        code,
        strings: vec!["s".into()],
        ..MethodBody::default()
    };
    assert!(decode(&body).is_err());
}

#[test]
fn test_listing_rows() {
    let handle = procedure(
        &[ValueType::I32],
        ValueType::I32,
        vec![
            Instruction::bare(OpCode::Ldarg0),
            Instruction::call(echo(ValueType::I32)),
            Instruction::bare(OpCode::Ret),
        ],
    );
    let listing = handle.listing().unwrap();
    assert_eq!(
        listing[0],
        ListingLine {
            offset: 0,
            mnemonic: "ldarg.0",
            operand: None
        }
    );
    assert_eq!(listing[1].operand.as_deref(), Some("I32 echo(I32)"));

    let json = serde_json::to_value(&listing).unwrap();
    assert_eq!(json[0], serde_json::json!({ "offset": 0, "mnemonic": "ldarg.0" }));
    assert_eq!(json[2]["offset"], 6);
    assert_eq!(json[2]["mnemonic"], "ret");
}
