//! Serde round-trip tests for `moxie_codec` value types.

#![cfg(feature = "serde")]

use moxie_codec::{
    decode, encode, CodecOptions, DecodeError, EncodeError, Encoding, Endian, Form, Instruction,
    OpcodeTable, Operand, OperandKind, Operands, Tag,
};

/// Helper: serialize to JSON, deserialize back, assert equality.
fn round_trip<T>(val: &T)
where
    T: serde::Serialize + serde::de::DeserializeOwned + PartialEq + core::fmt::Debug,
{
    let json = serde_json::to_string(val).expect("serialize");
    let back: T = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(val, &back, "round-trip mismatch for JSON: {json}");
}

// ─── Enums ──────────────────────────────────────────────────────────────────

#[test]
fn serde_form_tag_kind() {
    for form in Form::ALL {
        round_trip(&form);
    }
    for tag in [Tag::F1_NARG, Tag::F1_AiB4, Tag::F2_A8V, Tag::F3_PCREL, Tag::Bad] {
        round_trip(&tag);
    }
    round_trip(&OperandKind::Displacement);
    round_trip(&Endian::Little);
}

// ─── Operands ───────────────────────────────────────────────────────────────

#[test]
fn serde_operand() {
    round_trip(&Operand::Register(15));
    round_trip(&Operand::Immediate(u32::MAX));
    round_trip(&Operand::Address(0x8000_0000));
    round_trip(&Operand::Displacement(-512));
}

#[test]
fn serde_operands_list() {
    let ops = Operands::from_slice(&[Operand::Register(1), Operand::Immediate(2)]).unwrap();
    round_trip(&ops);
    round_trip(&Operands::new());

    let json = serde_json::to_string(&ops).unwrap();
    assert_eq!(json, r#"[{"Register":1},{"Immediate":2}]"#);

    let four = r#"[{"Register":1},{"Register":1},{"Register":1},{"Register":1}]"#;
    assert!(serde_json::from_str::<Operands>(four).is_err());
}

// ─── Encodings and instructions ─────────────────────────────────────────────

#[test]
fn serde_encoding() {
    round_trip(&Encoding {
        word: 0x0130,
        extension: Some(0xDEADBEEF),
    });
    round_trip(&encode("nop", &[]).unwrap());
}

#[test]
fn serde_instruction_references_static_entry() {
    let insn = decode(0x0130, Some(0xDEADBEEF)).unwrap();
    round_trip(&insn);

    let json = serde_json::to_string(&insn).unwrap();
    assert!(json.contains(r#""mnemonic":"ldi.l""#), "{json}");
    let back: Instruction = serde_json::from_str(&json).unwrap();
    let canonical = OpcodeTable::moxie().lookup_by_name("ldi.l").unwrap();
    assert!(core::ptr::eq(back.entry(), canonical));
}

#[test]
fn serde_instruction_unknown_mnemonic_rejected() {
    let json = r#"{"mnemonic":"frob","operands":[],"word_count":1}"#;
    assert!(serde_json::from_str::<Instruction>(json).is_err());
    let json = r#"{"mnemonic":"bad","operands":[],"word_count":1}"#;
    assert!(serde_json::from_str::<Instruction>(json).is_err());
}

#[test]
fn serde_instruction_operands_revalidated() {
    // wrong operand count
    let json = r#"{"mnemonic":"mov","operands":[],"word_count":9}"#;
    assert!(serde_json::from_str::<Instruction>(json).is_err());

    // register out of range, immediate wider than imm8
    let json = r#"{"mnemonic":"inc","operands":[{"Register":99},{"Immediate":100000}],"word_count":1}"#;
    assert!(serde_json::from_str::<Instruction>(json).is_err());

    // wrong operand kind
    let json = r#"{"mnemonic":"jsra","operands":[{"Register":1}],"word_count":2}"#;
    assert!(serde_json::from_str::<Instruction>(json).is_err());
}

#[test]
fn serde_instruction_word_count_from_tag() {
    let json = r#"{"mnemonic":"ldi.l","operands":[{"Register":3},{"Immediate":7}],"word_count":9}"#;
    let insn: Instruction = serde_json::from_str(json).unwrap();
    assert_eq!(insn.word_count(), 2);
    assert_eq!(insn.len_bytes(), 6);

    let json = r#"{"mnemonic":"mov","operands":[{"Register":1},{"Register":2}]}"#;
    let insn: Instruction = serde_json::from_str(json).unwrap();
    assert_eq!(insn.word_count(), 1);
    assert_eq!(insn.encode().unwrap().word, 0x0212);
}

#[test]
fn serde_every_defined_instruction() {
    for entry in OpcodeTable::moxie().defined() {
        let word = entry.form.layout().place_opcode(entry.opcode);
        round_trip(&decode(word, Some(7)).unwrap());
    }
}

#[test]
fn serde_opcode_entry_serializes() {
    let entry = OpcodeTable::moxie().lookup_by_name("beq").unwrap();
    let value = serde_json::to_value(entry).unwrap();
    assert_eq!(value["mnemonic"], "beq");
    assert_eq!(value["form"], "Form3");
    assert_eq!(value["tag"], "F3_PCREL");
    assert_eq!(value["serial"], 0);
}

// ─── Options and errors ─────────────────────────────────────────────────────

#[test]
fn serde_codec_options() {
    round_trip(&CodecOptions::default());
    round_trip(&CodecOptions {
        endian: Endian::Little,
        strict: true,
        base_address: 0x1000,
    });
}

#[test]
fn serde_errors() {
    round_trip(&EncodeError::OperandOutOfRange {
        mnemonic: "inc".into(),
        index: 1,
        value: 256,
        min: 0,
        max: 255,
    });
    round_trip(&EncodeError::OperandKindMismatch {
        mnemonic: "jsra".into(),
        index: 0,
        expected: OperandKind::Address,
        found: OperandKind::Register,
    });
    round_trip(&DecodeError::ReservedOpcode {
        form: Form::Form1,
        opcode: 0,
        word: 0x0012,
    });
    round_trip(&DecodeError::UnexpectedEnd {
        offset: 3,
        available: 1,
    });
}
