//! The typed instruction value produced by the decoder.

use core::fmt;

use crate::encoder::{encode_entry, Encoding};
use crate::error::EncodeError;
use crate::form::{Form, Tag};
use crate::operand::{Operand, Operands};
use crate::table::OpcodeEntry;

/// A decoded (or validated) moxie instruction.
///
/// Holds a reference to its static opcode-table entry, the operands in
/// assembler order, and how many words the encoding occupies.
///
/// Deserialization re-validates the operands against the entry, and the
/// word count is recomputed from the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawInstruction"))]
pub struct Instruction {
    #[cfg_attr(
        feature = "serde",
        serde(rename = "mnemonic", serialize_with = "crate::table::serde_entry::serialize")
    )]
    entry: &'static OpcodeEntry,
    operands: Operands,
    word_count: u8,
}

/// Unchecked wire form of [`Instruction`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawInstruction {
    #[serde(rename = "mnemonic", deserialize_with = "crate::table::serde_entry::deserialize")]
    entry: &'static OpcodeEntry,
    operands: Operands,
}

#[cfg(feature = "serde")]
impl TryFrom<RawInstruction> for Instruction {
    type Error = EncodeError;

    fn try_from(raw: RawInstruction) -> Result<Self, EncodeError> {
        Self::new(raw.entry, &raw.operands)
    }
}

impl Instruction {
    /// Build an instruction, validating the operands against the entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use moxie_codec::{Instruction, OpcodeTable, Operand};
    ///
    /// let push = OpcodeTable::moxie().lookup_by_name("push").unwrap();
    /// let insn = Instruction::new(push, &[Operand::Register(1), Operand::Register(4)]).unwrap();
    /// assert_eq!(insn.to_string(), "push $sp, $r2");
    /// ```
    pub fn new(entry: &'static OpcodeEntry, operands: &[Operand]) -> Result<Self, EncodeError> {
        let encoding = encode_entry(entry, operands)?;
        Ok(Self::from_parts(entry, Operands::from_slice(operands).unwrap_or_default(), encoding.word_count()))
    }

    #[inline]
    pub(crate) fn from_parts(entry: &'static OpcodeEntry, operands: Operands, word_count: usize) -> Self {
        Self {
            entry,
            operands,
            word_count: word_count as u8,
        }
    }

    /// The opcode-table entry.
    #[inline]
    pub fn entry(&self) -> &'static OpcodeEntry {
        self.entry
    }

    /// Assembler mnemonic.
    #[inline]
    pub fn mnemonic(&self) -> &'static str {
        self.entry.mnemonic
    }

    /// Instruction form.
    #[inline]
    pub fn form(&self) -> Form {
        self.entry.form
    }

    /// Operand-shape tag.
    #[inline]
    pub fn tag(&self) -> Tag {
        self.entry.tag
    }

    /// Form-local opcode number.
    #[inline]
    pub fn opcode(&self) -> u8 {
        self.entry.opcode
    }

    /// Operands in assembler order.
    #[inline]
    pub fn operands(&self) -> &[Operand] {
        self.operands.as_slice()
    }

    /// 1, or 2 when an extension word was consumed.
    #[inline]
    pub fn word_count(&self) -> usize {
        self.word_count as usize
    }

    /// Encoded size in bytes.
    #[inline]
    pub fn len_bytes(&self) -> usize {
        if self.word_count == 2 {
            6
        } else {
            2
        }
    }

    /// Re-encode this instruction.
    pub fn encode(&self) -> Result<Encoding, EncodeError> {
        encode_entry(self.entry, &self.operands)
    }

    /// Target address of a PC-relative branch located at `pc`.
    pub fn branch_target(&self, pc: u32) -> Option<u32> {
        match self.operands.first() {
            Some(&Operand::Displacement(disp)) if self.entry.tag == Tag::F3_PCREL => {
                Some(crate::decoder::branch_target(pc, disp))
            }
            _ => None,
        }
    }

    /// Display with branch displacements resolved against `pc`.
    pub fn display_at(&self, pc: u32) -> AtAddress<'_> {
        AtAddress { insn: self, pc }
    }

    fn fmt_with(&self, f: &mut fmt::Formatter<'_>, pc: Option<u32>) -> fmt::Result {
        let ops = self.operands.as_slice();
        f.write_str(self.mnemonic())?;
        match (self.tag(), ops) {
            (Tag::F1_ABi, [a, b]) => write!(f, " {}, ({})", a, b),
            (Tag::F1_AiB, [a, b]) => write!(f, " ({}), {}", a, b),
            (Tag::F1_ABi4, [a, off, b]) => write!(f, " {}, {}({})", a, off, b),
            (Tag::F1_AiB4, [off, a, b]) => write!(f, " {}({}), {}", off, a, b),
            (Tag::F3_PCREL, [_]) if pc.is_some() => match pc.and_then(|pc| self.branch_target(pc)) {
                Some(target) => write!(f, " 0x{:x}", target),
                None => Ok(()),
            },
            _ => {
                for (i, op) in ops.iter().enumerate() {
                    f.write_str(if i == 0 { " " } else { ", " })?;
                    write!(f, "{}", op)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_with(f, None)
    }
}

/// [`Instruction`] display adapter that knows the instruction's address.
#[derive(Debug, Clone, Copy)]
pub struct AtAddress<'a> {
    insn: &'a Instruction,
    pc: u32,
}

impl fmt::Display for AtAddress<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.insn.fmt_with(f, Some(self.pc))
    }
}
