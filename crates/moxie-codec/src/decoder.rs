//! moxie instruction decoder.
//!
//! The form is selected from the top bits of the word, the opcode field is
//! used as a direct index into that form's table, and the operand fields
//! named by the entry's tag are extracted in assembler order.

use alloc::string::String;

use crate::error::DecodeError;
use crate::form::{Form, OperandKind, OperandSpec, Slot};
use crate::instruction::Instruction;
use crate::operand::{Operand, Operands};
use crate::table::OpcodeTable;

/// Decode one instruction word and its optional extension word.
///
/// `extension` is only read for tags that need it; passing one to a
/// single-word instruction is harmless and the result reports a word count
/// of 1.
///
/// # Examples
///
/// ```rust
/// use moxie_codec::{decode, Operand};
///
/// let insn = decode(0x0130, Some(0xDEADBEEF)).unwrap();
/// assert_eq!(insn.mnemonic(), "ldi.l");
/// assert_eq!(insn.operands(), &[Operand::Register(3), Operand::Immediate(0xDEADBEEF)]);
/// assert_eq!(insn.word_count(), 2);
/// ```
pub fn decode(word: u16, extension: Option<u32>) -> Result<Instruction, DecodeError> {
    decode_with(word, extension, false)
}

/// Decode with optional rejection of words whose unused operand bits are set.
pub(crate) fn decode_with(
    word: u16,
    extension: Option<u32>,
    strict: bool,
) -> Result<Instruction, DecodeError> {
    let form = Form::of_word(word);
    let layout = form.layout();
    let opcode = layout.extract_opcode(word);

    let entry = match OpcodeTable::moxie().lookup_by_number(form, opcode) {
        Some(entry) if !entry.is_reserved() => entry,
        _ => {
            trace_event!(trace, word, opcode, "reserved moxie opcode");
            return Err(DecodeError::ReservedOpcode { form, opcode, word });
        }
    };

    if strict {
        let unused = word & !(layout.fixed_mask() | entry.tag.operand_mask());
        if unused != 0 {
            trace_event!(trace, word, unused, "non-canonical moxie word");
            return Err(DecodeError::NonCanonical { word, unused });
        }
    }

    let mut operands = Operands::new();
    let mut word_count = 1;
    for spec in entry.tag.operand_specs() {
        let op = match spec.slot {
            Slot::Field { offset, width } => extract_field(spec, word, offset, width),
            Slot::Extension => {
                let Some(ext) = extension else {
                    trace_event!(trace, word, mnemonic = entry.mnemonic, "missing extension word");
                    return Err(DecodeError::TruncatedInstruction {
                        mnemonic: String::from(entry.mnemonic),
                        word,
                    });
                };
                word_count = 2;
                Operand::from_kind(spec.kind, i64::from(ext))
            }
        };
        operands.push(op);
    }

    Ok(Instruction::from_parts(entry, operands, word_count))
}

/// Address a FORM3 branch at `pc` transfers to for displacement `disp`.
///
/// `target = pc + 2 + 2 * disp`, wrapping at the 32-bit address space.
///
/// # Examples
///
/// ```rust
/// use moxie_codec::branch_target;
///
/// assert_eq!(branch_target(0x1000, 0), 0x1002);
/// assert_eq!(branch_target(0x1000, -3), 0x0ffc);
/// ```
#[inline]
pub fn branch_target(pc: u32, disp: i16) -> u32 {
    pc.wrapping_add(2).wrapping_add((i32::from(disp) * 2) as u32)
}

#[inline]
fn extract_field(spec: &OperandSpec, word: u16, offset: u8, width: u8) -> Operand {
    let raw = (word >> offset) & (((1u32 << width) - 1) as u16);
    let value = match spec.kind {
        OperandKind::Displacement => {
            let shift = 16 - width as u32;
            i64::from(((raw << shift) as i16) >> shift)
        }
        _ => i64::from(raw),
    };
    Operand::from_kind(spec.kind, value)
}
