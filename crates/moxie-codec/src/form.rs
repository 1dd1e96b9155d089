//! Instruction forms and their bit layouts.
//!
//! Every moxie instruction starts with one 16-bit word. Its top bits select
//! one of three forms, each partitioning the remaining bits differently:
//!
//! ```text
//! FORM1:  0 ooooooo aaaa bbbb      (7-bit opcode, two 4-bit register fields)
//! FORM2:  10 oo aaaa vvvvvvvv      (2-bit opcode, register, 8-bit unsigned imm)
//! FORM3:  11 oooo vvvvvvvvvv       (4-bit opcode, 10-bit signed displacement)
//! ```
//!
//! Within FORM1 the [`Tag`] of the opcode decides which of the A/B fields
//! are used and whether a 32-bit extension word follows.

use core::fmt;

/// One of the three top-level instruction encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Form {
    /// `0ooooooo aaaabbbb`
    Form1,
    /// `10ooaaaa vvvvvvvv`
    Form2,
    /// `11oooovv vvvvvvvv`
    Form3,
}

impl Form {
    /// All forms, in selector order.
    pub const ALL: [Form; 3] = [Form::Form1, Form::Form2, Form::Form3];

    /// Select the form of an instruction word.
    ///
    /// Bit 15 is tested first: when it is clear the word is FORM1 and bit 14
    /// belongs to the opcode field. Only then does bit 14 pick FORM2 or FORM3.
    #[inline]
    pub const fn of_word(word: u16) -> Form {
        if word & 0x8000 == 0 {
            Form::Form1
        } else if word & 0x4000 == 0 {
            Form::Form2
        } else {
            Form::Form3
        }
    }

    /// Bit geometry of the selector and opcode fields.
    #[inline]
    pub const fn layout(self) -> FieldLayout {
        match self {
            Form::Form1 => FieldLayout {
                selector_width: 1,
                selector_value: 0b0,
                opcode_width: 7,
                opcode_offset: 8,
            },
            Form::Form2 => FieldLayout {
                selector_width: 2,
                selector_value: 0b10,
                opcode_width: 2,
                opcode_offset: 12,
            },
            Form::Form3 => FieldLayout {
                selector_width: 2,
                selector_value: 0b11,
                opcode_width: 4,
                opcode_offset: 10,
            },
        }
    }

    /// Number of opcode slots (and table entries) in this form.
    #[inline]
    pub const fn table_size(self) -> usize {
        1 << self.layout().opcode_width
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Form::Form1 => write!(f, "FORM1"),
            Form::Form2 => write!(f, "FORM2"),
            Form::Form3 => write!(f, "FORM3"),
        }
    }
}

/// Selector and opcode field placement for one [`Form`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    /// Number of leading selector bits (1 or 2).
    pub selector_width: u8,
    /// Value of the selector bits, right-aligned.
    pub selector_value: u16,
    /// Width of the opcode field in bits.
    pub opcode_width: u8,
    /// Bit position of the opcode field's least significant bit.
    pub opcode_offset: u8,
}

impl FieldLayout {
    /// Selector bits shifted into place at the top of the word.
    #[inline]
    pub const fn selector_bits(&self) -> u16 {
        self.selector_value << (16 - self.selector_width)
    }

    /// Mask covering the opcode field in place.
    #[inline]
    pub const fn opcode_mask(&self) -> u16 {
        field_mask(self.opcode_offset, self.opcode_width)
    }

    /// Mask covering selector and opcode bits.
    #[inline]
    pub const fn fixed_mask(&self) -> u16 {
        let selector = field_mask(16 - self.selector_width, self.selector_width);
        selector | self.opcode_mask()
    }

    /// Extract the opcode number from a word of this form.
    #[inline]
    pub const fn extract_opcode(&self, word: u16) -> u8 {
        ((word & self.opcode_mask()) >> self.opcode_offset) as u8
    }

    /// Build the selector+opcode part of a word.
    #[inline]
    pub const fn place_opcode(&self, opcode: u8) -> u16 {
        self.selector_bits() | (((opcode as u16) << self.opcode_offset) & self.opcode_mask())
    }
}

#[inline]
const fn field_mask(offset: u8, width: u8) -> u16 {
    (((1u32 << width) - 1) << offset) as u16
}

/// Where an operand lives in the encoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// A bit field inside the 16-bit instruction word.
    Field {
        /// Bit position of the field's least significant bit.
        offset: u8,
        /// Field width in bits.
        width: u8,
    },
    /// The 32-bit extension word that follows the instruction word.
    Extension,
}

impl Slot {
    /// Width of the slot in bits.
    #[inline]
    pub const fn width(&self) -> u8 {
        match self {
            Slot::Field { width, .. } => *width,
            Slot::Extension => 32,
        }
    }

    /// Mask of the bits this slot occupies in the instruction word
    /// (zero for the extension word).
    #[inline]
    pub const fn word_mask(&self) -> u16 {
        match self {
            Slot::Field { offset, width } => field_mask(*offset, *width),
            Slot::Extension => 0,
        }
    }
}

/// Semantic kind of an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperandKind {
    /// General-purpose register index, 0–15.
    Register,
    /// Unsigned immediate (8-bit in FORM2, raw 32-bit in an extension word).
    Immediate,
    /// Absolute 32-bit address carried in an extension word.
    Address,
    /// Signed PC-relative branch displacement, in halfwords.
    Displacement,
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandKind::Register => write!(f, "register"),
            OperandKind::Immediate => write!(f, "immediate"),
            OperandKind::Address => write!(f, "address"),
            OperandKind::Displacement => write!(f, "displacement"),
        }
    }
}

/// Kind and placement of one operand of a [`Tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandSpec {
    /// What the operand means.
    pub kind: OperandKind,
    /// Where its bits go.
    pub slot: Slot,
}

impl OperandSpec {
    /// Inclusive range of values this operand accepts.
    pub const fn range(&self) -> (i64, i64) {
        let width = self.slot.width() as u32;
        match self.kind {
            OperandKind::Displacement => (-(1i64 << (width - 1)), (1i64 << (width - 1)) - 1),
            _ => (0, (1i64 << width) - 1),
        }
    }

    /// Whether `value` lies in [`range`](Self::range).
    #[inline]
    pub const fn accepts(&self, value: i64) -> bool {
        let (min, max) = self.range();
        value >= min && value <= max
    }
}

// ── Operand slots ───────────────────────────────────────────────────────

const F1_REG_A: Slot = Slot::Field {
    offset: 4,
    width: 4,
};
const F1_REG_B: Slot = Slot::Field {
    offset: 0,
    width: 4,
};
const F2_REG_A: Slot = Slot::Field {
    offset: 8,
    width: 4,
};
const F2_IMM8: Slot = Slot::Field {
    offset: 0,
    width: 8,
};
const F3_DISP10: Slot = Slot::Field {
    offset: 0,
    width: 10,
};

const fn spec(kind: OperandKind, slot: Slot) -> OperandSpec {
    OperandSpec { kind, slot }
}

const REG_A: OperandSpec = spec(OperandKind::Register, F1_REG_A);
const REG_B: OperandSpec = spec(OperandKind::Register, F1_REG_B);
const IMM32: OperandSpec = spec(OperandKind::Immediate, Slot::Extension);
const ADDR32: OperandSpec = spec(OperandKind::Address, Slot::Extension);
const F2_REG: OperandSpec = spec(OperandKind::Register, F2_REG_A);
const F2_IMM: OperandSpec = spec(OperandKind::Immediate, F2_IMM8);
const F3_DISP: OperandSpec = spec(OperandKind::Displacement, F3_DISP10);

/// Instruction-form tag: the operand shape of an opcode-table entry.
///
/// The names follow the moxie opcode table. `F1_*` tags belong to FORM1,
/// a trailing `4` means a 32-bit extension word follows, `i` marks the
/// register used indirectly (`($rB)`).
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tag {
    /// No operands: `ret`, `nop`, `brk`.
    F1_NARG,
    /// One register in field A: `jsr $rA`.
    F1_A,
    /// Two registers: `mov $rA, $rB`.
    F1_AB,
    /// Load through B: `ld.l $rA, ($rB)`.
    F1_ABi,
    /// Store through A: `st.l ($rA), $rB`.
    F1_AiB,
    /// Register and 32-bit immediate: `ldi.l $rA, imm`.
    F1_A4,
    /// 32-bit absolute address: `jsra addr`.
    F1_M,
    /// 32-bit immediate only: `swi imm`.
    F1_4,
    /// Store register A to a 32-bit address: `sta.l addr, $rA`.
    F1_4A,
    /// Load with 32-bit offset: `ldo.l $rA, off($rB)`.
    F1_ABi4,
    /// Store with 32-bit offset: `sto.l off($rA), $rB`.
    F1_AiB4,
    /// FORM2 register and 8-bit unsigned immediate: `inc $rA, imm`.
    F2_A8V,
    /// FORM3 10-bit PC-relative branch: `beq disp`.
    F3_PCREL,
    /// Reserved opcode slot.
    Bad,
}

impl Tag {
    /// The form this tag is encoded in. `None` for [`Tag::Bad`].
    pub const fn form(self) -> Option<Form> {
        match self {
            Tag::F1_NARG
            | Tag::F1_A
            | Tag::F1_AB
            | Tag::F1_ABi
            | Tag::F1_AiB
            | Tag::F1_A4
            | Tag::F1_M
            | Tag::F1_4
            | Tag::F1_4A
            | Tag::F1_ABi4
            | Tag::F1_AiB4 => Some(Form::Form1),
            Tag::F2_A8V => Some(Form::Form2),
            Tag::F3_PCREL => Some(Form::Form3),
            Tag::Bad => None,
        }
    }

    /// Operands in assembler order, with their placement.
    pub const fn operand_specs(self) -> &'static [OperandSpec] {
        match self {
            Tag::F1_NARG | Tag::Bad => &[],
            Tag::F1_A => &[REG_A],
            Tag::F1_AB | Tag::F1_ABi | Tag::F1_AiB => &[REG_A, REG_B],
            Tag::F1_A4 => &[REG_A, IMM32],
            Tag::F1_M => &[ADDR32],
            Tag::F1_4 => &[IMM32],
            Tag::F1_4A => &[ADDR32, REG_A],
            Tag::F1_ABi4 => &[REG_A, IMM32, REG_B],
            Tag::F1_AiB4 => &[IMM32, REG_A, REG_B],
            Tag::F2_A8V => &[F2_REG, F2_IMM],
            Tag::F3_PCREL => &[F3_DISP],
        }
    }

    /// Number of operands.
    #[inline]
    pub const fn arity(self) -> usize {
        self.operand_specs().len()
    }

    /// Whether a 32-bit extension word follows the instruction word.
    pub const fn has_extension(self) -> bool {
        matches!(
            self,
            Tag::F1_A4 | Tag::F1_M | Tag::F1_4 | Tag::F1_4A | Tag::F1_ABi4 | Tag::F1_AiB4
        )
    }

    /// Number of words emitted: the instruction word plus the optional
    /// extension word.
    #[inline]
    pub const fn word_count(self) -> usize {
        if self.has_extension() {
            2
        } else {
            1
        }
    }

    /// Mask of instruction-word bits occupied by this tag's operand fields.
    pub const fn operand_mask(self) -> u16 {
        let specs = self.operand_specs();
        let mut mask = 0;
        let mut i = 0;
        while i < specs.len() {
            mask |= specs[i].slot.word_mask();
            i += 1;
        }
        mask
    }

    /// The tag's name as written in the opcode table (`"F1_AB"`).
    pub const fn name(self) -> &'static str {
        match self {
            Tag::F1_NARG => "F1_NARG",
            Tag::F1_A => "F1_A",
            Tag::F1_AB => "F1_AB",
            Tag::F1_ABi => "F1_ABi",
            Tag::F1_AiB => "F1_AiB",
            Tag::F1_A4 => "F1_A4",
            Tag::F1_M => "F1_M",
            Tag::F1_4 => "F1_4",
            Tag::F1_4A => "F1_4A",
            Tag::F1_ABi4 => "F1_ABi4",
            Tag::F1_AiB4 => "F1_AiB4",
            Tag::F2_A8V => "F2_A8V",
            Tag::F3_PCREL => "F3_PCREL",
            Tag::Bad => "BAD",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_dispatch_checks_bit15_first() {
        assert_eq!(Form::of_word(0x0000), Form::Form1);
        assert_eq!(Form::of_word(0x4000), Form::Form1);
        assert_eq!(Form::of_word(0x7FFF), Form::Form1);
        assert_eq!(Form::of_word(0x8000), Form::Form2);
        assert_eq!(Form::of_word(0xBFFF), Form::Form2);
        assert_eq!(Form::of_word(0xC000), Form::Form3);
        assert_eq!(Form::of_word(0xFFFF), Form::Form3);
    }

    #[test]
    fn layouts_cover_all_sixteen_bits() {
        for form in Form::ALL {
            let l = form.layout();
            assert_eq!(l.selector_width + l.opcode_width + l.opcode_offset, 16);
        }
    }

    #[test]
    fn table_sizes() {
        assert_eq!(Form::Form1.table_size(), 128);
        assert_eq!(Form::Form2.table_size(), 4);
        assert_eq!(Form::Form3.table_size(), 16);
    }

    #[test]
    fn opcode_extraction() {
        let l = Form::Form1.layout();
        assert_eq!(l.extract_opcode(0x0212), 0x02);
        assert_eq!(l.extract_opcode(0x7F00), 0x7F);
        let l = Form::Form2.layout();
        assert_eq!(l.extract_opcode(0xB000), 0x3);
        let l = Form::Form3.layout();
        assert_eq!(l.extract_opcode(0xE400), 0x9);
    }

    #[test]
    fn place_opcode_sets_selector() {
        assert_eq!(Form::Form1.layout().place_opcode(0x02), 0x0200);
        assert_eq!(Form::Form2.layout().place_opcode(0x01), 0x9000);
        assert_eq!(Form::Form3.layout().place_opcode(0x01), 0xC400);
    }

    #[test]
    fn fixed_masks() {
        assert_eq!(Form::Form1.layout().fixed_mask(), 0xFF00);
        assert_eq!(Form::Form2.layout().fixed_mask(), 0xF000);
        assert_eq!(Form::Form3.layout().fixed_mask(), 0xFC00);
    }

    #[test]
    fn operand_ranges() {
        let reg = Tag::F1_AB.operand_specs()[0];
        assert_eq!(reg.range(), (0, 15));
        let imm8 = Tag::F2_A8V.operand_specs()[1];
        assert_eq!(imm8.range(), (0, 255));
        let disp = Tag::F3_PCREL.operand_specs()[0];
        assert_eq!(disp.range(), (-512, 511));
        let imm32 = Tag::F1_A4.operand_specs()[1];
        assert_eq!(imm32.range(), (0, u32::MAX as i64));
    }

    #[test]
    fn extension_tags() {
        for tag in [Tag::F1_A4, Tag::F1_M, Tag::F1_4, Tag::F1_4A, Tag::F1_ABi4, Tag::F1_AiB4] {
            assert!(tag.has_extension(), "{tag}");
            assert_eq!(tag.word_count(), 2);
            let ext = tag
                .operand_specs()
                .iter()
                .filter(|s| s.slot == Slot::Extension)
                .count();
            assert_eq!(ext, 1, "{tag} must carry exactly one extension operand");
        }
        assert!(!Tag::F1_AB.has_extension());
        assert_eq!(Tag::F3_PCREL.word_count(), 1);
    }

    #[test]
    fn operand_masks() {
        assert_eq!(Tag::F1_NARG.operand_mask(), 0x0000);
        assert_eq!(Tag::F1_A.operand_mask(), 0x00F0);
        assert_eq!(Tag::F1_AB.operand_mask(), 0x00FF);
        assert_eq!(Tag::F1_4.operand_mask(), 0x0000);
        assert_eq!(Tag::F1_4A.operand_mask(), 0x00F0);
        assert_eq!(Tag::F2_A8V.operand_mask(), 0x0FFF);
        assert_eq!(Tag::F3_PCREL.operand_mask(), 0x03FF);
    }

    #[test]
    fn bad_has_no_form() {
        assert_eq!(Tag::Bad.form(), None);
        assert_eq!(Tag::Bad.arity(), 0);
        assert_eq!(Tag::F2_A8V.form(), Some(Form::Form2));
    }
}
