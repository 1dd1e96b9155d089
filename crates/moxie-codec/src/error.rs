//! Error types for encoding, decoding, and opcode-table validation.

use alloc::string::String;
use core::fmt;

use crate::form::{Form, OperandKind, Tag};

/// Encoding failed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EncodeError {
    /// The mnemonic is not in any opcode table.
    UnknownMnemonic {
        /// The mnemonic that was not recognized.
        mnemonic: String,
    },

    /// The entry passed to the encoder is a reserved slot.
    ReservedOpcode {
        /// Form of the reserved slot.
        form: Form,
        /// Opcode number of the reserved slot.
        opcode: u8,
    },

    /// Wrong number of operands for the instruction.
    OperandCountMismatch {
        /// Instruction mnemonic.
        mnemonic: String,
        /// Operands required by the instruction's tag.
        expected: usize,
        /// Operands supplied.
        found: usize,
    },

    /// An operand has the wrong kind (e.g. an address where a register goes).
    OperandKindMismatch {
        /// Instruction mnemonic.
        mnemonic: String,
        /// Zero-based operand position.
        index: usize,
        /// Kind required at this position.
        expected: OperandKind,
        /// Kind supplied.
        found: OperandKind,
    },

    /// An operand value does not fit its field.
    OperandOutOfRange {
        /// Instruction mnemonic.
        mnemonic: String,
        /// Zero-based operand position.
        index: usize,
        /// The offending value.
        value: i64,
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
    },

    /// Branch source and target differ by an odd number of bytes.
    UnalignedBranch {
        /// Address of the branch instruction.
        pc: u32,
        /// Requested target address.
        target: u32,
    },

    /// Branch target is further than a 10-bit displacement reaches.
    BranchOutOfRange {
        /// Address of the branch instruction.
        pc: u32,
        /// Requested target address.
        target: u32,
        /// Displacement in halfwords that would have been needed.
        displacement: i64,
    },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::UnknownMnemonic { mnemonic } => {
                write!(f, "unknown mnemonic '{}'", mnemonic)
            }
            EncodeError::ReservedOpcode { form, opcode } => {
                write!(f, "cannot encode reserved {} opcode 0x{:02x}", form, opcode)
            }
            EncodeError::OperandCountMismatch {
                mnemonic,
                expected,
                found,
            } => {
                write!(
                    f,
                    "'{}' takes {} operand(s), got {}",
                    mnemonic, expected, found
                )
            }
            EncodeError::OperandKindMismatch {
                mnemonic,
                index,
                expected,
                found,
            } => {
                write!(
                    f,
                    "'{}' operand {}: expected {}, got {}",
                    mnemonic, index, expected, found
                )
            }
            EncodeError::OperandOutOfRange {
                mnemonic,
                index,
                value,
                min,
                max,
            } => {
                write!(
                    f,
                    "'{}' operand {}: value {} out of range [{}..{}]",
                    mnemonic, index, value, min, max
                )
            }
            EncodeError::UnalignedBranch { pc, target } => {
                write!(
                    f,
                    "branch from 0x{:x} to odd distance target 0x{:x}",
                    pc, target
                )
            }
            EncodeError::BranchOutOfRange {
                pc,
                target,
                displacement,
            } => {
                write!(
                    f,
                    "branch from 0x{:x} to 0x{:x} out of range (displacement={}, range=-512..511)",
                    pc, target, displacement
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

/// Decoding failed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecodeError {
    /// The word selects a reserved ("bad") opcode slot.
    ReservedOpcode {
        /// Form selected by the word.
        form: Form,
        /// Opcode field value.
        opcode: u8,
        /// The instruction word.
        word: u16,
    },

    /// The instruction needs an extension word that was not supplied.
    TruncatedInstruction {
        /// Mnemonic of the instruction.
        mnemonic: String,
        /// The instruction word.
        word: u16,
    },

    /// A byte stream ended inside an instruction word.
    UnexpectedEnd {
        /// Byte offset of the partial word.
        offset: usize,
        /// Bytes left in the stream.
        available: usize,
    },

    /// Strict decoding: bits outside every operand field are set.
    NonCanonical {
        /// The instruction word.
        word: u16,
        /// The stray bits.
        unused: u16,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::ReservedOpcode { form, opcode, word } => {
                write!(
                    f,
                    "reserved {} opcode 0x{:02x} in word 0x{:04x}",
                    form, opcode, word
                )
            }
            DecodeError::TruncatedInstruction { mnemonic, word } => {
                write!(
                    f,
                    "'{}' (word 0x{:04x}) is missing its 32-bit extension word",
                    mnemonic, word
                )
            }
            DecodeError::UnexpectedEnd { offset, available } => {
                write!(
                    f,
                    "unexpected end of input at offset {} ({} byte(s) left)",
                    offset, available
                )
            }
            DecodeError::NonCanonical { word, unused } => {
                write!(
                    f,
                    "word 0x{:04x} sets unused bits 0x{:04x}",
                    word, unused
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

/// An opcode table violates its layout invariants.
///
/// The shipped tables are checked at compile time; this type is what
/// [`OpcodeTable::validate`](crate::OpcodeTable::validate) reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// A form's table does not have one entry per opcode number.
    WrongSize {
        /// The form.
        form: Form,
        /// Required entry count.
        expected: usize,
        /// Actual entry count.
        found: usize,
    },

    /// An entry's opcode number differs from its index.
    OpcodeMismatch {
        /// The form.
        form: Form,
        /// Position in the table.
        index: usize,
        /// Opcode number recorded in the entry.
        opcode: u8,
    },

    /// An entry's tag or form belongs to a different form's table.
    FormMismatch {
        /// The table's form.
        form: Form,
        /// Opcode number of the entry.
        opcode: u8,
        /// The entry's tag.
        tag: Tag,
    },

    /// `"bad"` used with a real tag, or a reserved tag with a real name.
    ReservedName {
        /// The form.
        form: Form,
        /// Opcode number of the entry.
        opcode: u8,
    },

    /// A mnemonic appears in more than one slot.
    DuplicateMnemonic {
        /// The repeated mnemonic.
        mnemonic: &'static str,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::WrongSize {
                form,
                expected,
                found,
            } => {
                write!(
                    f,
                    "{} table has {} entries, expected {}",
                    form, found, expected
                )
            }
            TableError::OpcodeMismatch {
                form,
                index,
                opcode,
            } => {
                write!(
                    f,
                    "{} table slot {} holds opcode 0x{:02x}",
                    form, index, opcode
                )
            }
            TableError::FormMismatch { form, opcode, tag } => {
                write!(
                    f,
                    "{} opcode 0x{:02x} has foreign tag {}",
                    form, opcode, tag
                )
            }
            TableError::ReservedName { form, opcode } => {
                write!(
                    f,
                    "{} opcode 0x{:02x} mixes the reserved name and a real tag",
                    form, opcode
                )
            }
            TableError::DuplicateMnemonic { mnemonic } => {
                write!(f, "mnemonic '{}' is defined more than once", mnemonic)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TableError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn error_unknown_mnemonic_display() {
        let err = EncodeError::UnknownMnemonic {
            mnemonic: "frob".into(),
        };
        assert_eq!(format!("{}", err), "unknown mnemonic 'frob'");
    }

    #[test]
    fn error_operand_out_of_range_display() {
        let err = EncodeError::OperandOutOfRange {
            mnemonic: "inc".into(),
            index: 1,
            value: 256,
            min: 0,
            max: 255,
        };
        assert_eq!(
            format!("{}", err),
            "'inc' operand 1: value 256 out of range [0..255]"
        );
    }

    #[test]
    fn error_count_mismatch_display() {
        let err = EncodeError::OperandCountMismatch {
            mnemonic: "mov".into(),
            expected: 2,
            found: 1,
        };
        assert_eq!(format!("{}", err), "'mov' takes 2 operand(s), got 1");
    }

    #[test]
    fn error_kind_mismatch_display() {
        let err = EncodeError::OperandKindMismatch {
            mnemonic: "jsra".into(),
            index: 0,
            expected: OperandKind::Address,
            found: OperandKind::Register,
        };
        assert_eq!(
            format!("{}", err),
            "'jsra' operand 0: expected address, got register"
        );
    }

    #[test]
    fn error_branch_out_of_range_display() {
        let err = EncodeError::BranchOutOfRange {
            pc: 0x100,
            target: 0x2000,
            displacement: 3967,
        };
        assert_eq!(
            format!("{}", err),
            "branch from 0x100 to 0x2000 out of range (displacement=3967, range=-512..511)"
        );
    }

    #[test]
    fn error_reserved_opcode_display() {
        let err = DecodeError::ReservedOpcode {
            form: Form::Form1,
            opcode: 0,
            word: 0x0012,
        };
        assert_eq!(
            format!("{}", err),
            "reserved FORM1 opcode 0x00 in word 0x0012"
        );
    }

    #[test]
    fn error_truncated_display() {
        let err = DecodeError::TruncatedInstruction {
            mnemonic: "ldi.l".into(),
            word: 0x0130,
        };
        assert_eq!(
            format!("{}", err),
            "'ldi.l' (word 0x0130) is missing its 32-bit extension word"
        );
    }

    #[test]
    fn error_unexpected_end_display() {
        let err = DecodeError::UnexpectedEnd {
            offset: 7,
            available: 1,
        };
        assert_eq!(
            format!("{}", err),
            "unexpected end of input at offset 7 (1 byte(s) left)"
        );
    }

    #[test]
    fn error_table_display() {
        let err = TableError::DuplicateMnemonic { mnemonic: "mov" };
        assert_eq!(format!("{}", err), "mnemonic 'mov' is defined more than once");
        let err = TableError::OpcodeMismatch {
            form: Form::Form3,
            index: 4,
            opcode: 5,
        };
        assert_eq!(format!("{}", err), "FORM3 table slot 4 holds opcode 0x05");
    }
}
