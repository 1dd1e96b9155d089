//! moxie instruction encoder.
//!
//! Packs a mnemonic and its operands into one 16-bit instruction word and,
//! for tags with a trailing `4`, a raw 32-bit extension word:
//!
//! ```text
//! FORM1:  [0 | opcode(7) | A(4) | B(4)]  [ext(32)]?
//! FORM2:  [10 | opcode(2) | A(4) | imm(8)]
//! FORM3:  [11 | opcode(4) | disp(10)]
//! ```
//!
//! Operand bits a tag does not use are left zero.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::codec::Endian;
use crate::error::EncodeError;
use crate::form::{OperandSpec, Slot};
use crate::operand::Operand;
use crate::table::{OpcodeEntry, OpcodeTable};

/// An encoded instruction: the 16-bit word and its optional extension word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Encoding {
    /// The instruction word.
    pub word: u16,
    /// The 32-bit extension word, present for long-immediate tags.
    pub extension: Option<u32>,
}

impl Encoding {
    /// Number of words: 1, or 2 with an extension word.
    #[inline]
    pub const fn word_count(&self) -> usize {
        if self.extension.is_some() {
            2
        } else {
            1
        }
    }

    /// Encoded size in bytes: 2 or 6.
    #[inline]
    pub const fn len_bytes(&self) -> usize {
        if self.extension.is_some() {
            6
        } else {
            2
        }
    }

    /// Serialize to bytes in the given byte order.
    pub fn to_bytes(&self, endian: Endian) -> InstrBytes {
        let mut bytes = InstrBytes::new();
        match endian {
            Endian::Big => bytes.extend_from_slice(&self.word.to_be_bytes()),
            Endian::Little => bytes.extend_from_slice(&self.word.to_le_bytes()),
        }
        if let Some(ext) = self.extension {
            match endian {
                Endian::Big => bytes.extend_from_slice(&ext.to_be_bytes()),
                Endian::Little => bytes.extend_from_slice(&ext.to_le_bytes()),
            }
        }
        bytes
    }

    /// Append the bytes to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>, endian: Endian) {
        out.extend_from_slice(&self.to_bytes(endian));
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.word)?;
        if let Some(ext) = self.extension {
            write!(f, " {:08x}", ext)?;
        }
        Ok(())
    }
}

/// Inline byte buffer for one encoded instruction (at most 6 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct InstrBytes {
    data: [u8; 6],
    len: u8,
}

impl InstrBytes {
    /// Create an empty buffer.
    #[inline]
    pub const fn new() -> Self {
        Self {
            data: [0; 6],
            len: 0,
        }
    }

    /// Append a slice of bytes.
    ///
    /// # Panics
    ///
    /// Panics if appending would exceed the 6-byte capacity.
    #[inline]
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        let start = self.len as usize;
        let end = start + bytes.len();
        assert!(end <= 6, "InstrBytes overflow: {} bytes", end);
        self.data[start..end].copy_from_slice(bytes);
        self.len = end as u8;
    }

    /// Returns the bytes as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}

impl Default for InstrBytes {
    fn default() -> Self {
        Self::new()
    }
}

impl core::ops::Deref for InstrBytes {
    type Target = [u8];
    #[inline]
    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for InstrBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice().iter()).finish()
    }
}

impl PartialEq<[u8]> for InstrBytes {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_slice() == other
    }
}

impl<const N: usize> PartialEq<[u8; N]> for InstrBytes {
    fn eq(&self, other: &[u8; N]) -> bool {
        self.as_slice() == &other[..]
    }
}

// ── Public entry points ─────────────────────────────────────────────────

/// Encode an instruction by mnemonic.
///
/// # Examples
///
/// ```rust
/// use moxie_codec::{encode, Operand};
///
/// let enc = encode("ldi.l", &[Operand::Register(3), Operand::Immediate(0xDEADBEEF)]).unwrap();
/// assert_eq!(enc.word, 0x0130);
/// assert_eq!(enc.extension, Some(0xDEADBEEF));
/// ```
pub fn encode(mnemonic: &str, operands: &[Operand]) -> Result<Encoding, EncodeError> {
    let entry = lookup(mnemonic)?;
    encode_entry(entry, operands)
}

/// Encode an instruction for a known table entry.
pub fn encode_entry(entry: &OpcodeEntry, operands: &[Operand]) -> Result<Encoding, EncodeError> {
    let form = match entry.tag.form() {
        Some(form) => form,
        None => {
            return Err(EncodeError::ReservedOpcode {
                form: entry.form,
                opcode: entry.opcode,
            })
        }
    };
    let specs = entry.tag.operand_specs();
    check_arity(entry, specs, operands.len())?;

    let mut word = form.layout().place_opcode(entry.opcode);
    let mut extension = None;
    for (index, (spec, op)) in specs.iter().zip(operands).enumerate() {
        if op.kind() != spec.kind {
            return Err(EncodeError::OperandKindMismatch {
                mnemonic: String::from(entry.mnemonic),
                index,
                expected: spec.kind,
                found: op.kind(),
            });
        }
        check_range(entry, index, spec, op.value())?;
        pack(&mut word, &mut extension, spec, op.value());
    }

    Ok(Encoding { word, extension })
}

/// Encode an instruction from untyped integer operands.
///
/// Each value is interpreted according to the instruction's operand specs,
/// so a front-end that has already parsed numbers (or a macro) does not need
/// to know operand kinds. Extension-word operands accept any value
/// representable in 32 bits, signed or unsigned; negative values are stored
/// in two's complement.
///
/// # Examples
///
/// ```rust
/// use moxie_codec::encode_values;
///
/// let enc = encode_values("ldo.l", &[2, -4, 3]).unwrap();
/// assert_eq!(enc.word, 0x0c23);
/// assert_eq!(enc.extension, Some(0xFFFF_FFFC));
/// ```
pub fn encode_values(mnemonic: &str, values: &[i64]) -> Result<Encoding, EncodeError> {
    let entry = lookup(mnemonic)?;
    if entry.tag.form().is_none() {
        return Err(EncodeError::ReservedOpcode {
            form: entry.form,
            opcode: entry.opcode,
        });
    }
    let specs = entry.tag.operand_specs();
    check_arity(entry, specs, values.len())?;

    let form = entry.form;
    let mut word = form.layout().place_opcode(entry.opcode);
    let mut extension = None;
    for (index, (spec, &value)) in specs.iter().zip(values).enumerate() {
        let value = match spec.slot {
            Slot::Extension if (i64::from(i32::MIN)..0).contains(&value) => {
                i64::from(value as u32)
            }
            _ => value,
        };
        check_range(entry, index, spec, value)?;
        pack(&mut word, &mut extension, spec, value);
    }

    Ok(Encoding { word, extension })
}

/// Compute the FORM3 displacement for a branch at `pc` to `target`.
///
/// The 10-bit field counts halfwords from the end of the branch
/// instruction: `target = pc + 2 + 2 * displacement`.
///
/// # Examples
///
/// ```rust
/// use moxie_codec::branch_displacement;
///
/// assert_eq!(branch_displacement(0x1000, 0x1002), Ok(0));
/// assert_eq!(branch_displacement(0x1000, 0x0ffc), Ok(-3));
/// ```
pub fn branch_displacement(pc: u32, target: u32) -> Result<i16, EncodeError> {
    let distance = i64::from(target) - (i64::from(pc) + 2);
    if distance % 2 != 0 {
        return Err(EncodeError::UnalignedBranch { pc, target });
    }
    let displacement = distance / 2;
    if !(-512..=511).contains(&displacement) {
        return Err(EncodeError::BranchOutOfRange {
            pc,
            target,
            displacement,
        });
    }
    Ok(displacement as i16)
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn lookup(mnemonic: &str) -> Result<&'static OpcodeEntry, EncodeError> {
    match OpcodeTable::moxie().lookup_by_name(mnemonic) {
        Some(entry) => Ok(entry),
        None => {
            trace_event!(debug, mnemonic, "unknown moxie mnemonic");
            Err(EncodeError::UnknownMnemonic {
                mnemonic: String::from(mnemonic),
            })
        }
    }
}

fn check_arity(entry: &OpcodeEntry, specs: &[OperandSpec], found: usize) -> Result<(), EncodeError> {
    if specs.len() == found {
        return Ok(());
    }
    Err(EncodeError::OperandCountMismatch {
        mnemonic: String::from(entry.mnemonic),
        expected: specs.len(),
        found,
    })
}

fn check_range(
    entry: &OpcodeEntry,
    index: usize,
    spec: &OperandSpec,
    value: i64,
) -> Result<(), EncodeError> {
    if spec.accepts(value) {
        return Ok(());
    }
    let (min, max) = spec.range();
    trace_event!(debug, mnemonic = entry.mnemonic, index, value, "operand out of range");
    Err(EncodeError::OperandOutOfRange {
        mnemonic: String::from(entry.mnemonic),
        index,
        value,
        min,
        max,
    })
}

/// Place a range-checked value into its slot.
#[inline]
fn pack(word: &mut u16, extension: &mut Option<u32>, spec: &OperandSpec, value: i64) {
    match spec.slot {
        Slot::Field { offset, width } => {
            let mask = (1u32 << width) - 1;
            *word |= (((value as u32) & mask) << offset) as u16;
        }
        Slot::Extension => *extension = Some(value as u32),
    }
}
