//! moxie opcode tables.
//!
//! One dense table per [`Form`], indexed by opcode number: FORM1 has 128
//! slots, FORM2 has 4, FORM3 has 16. Unassigned slots hold the reserved
//! `"bad"` entry, so decoding is a direct array index.
//!
//! The tables and the sorted mnemonic index are built by `const`
//! evaluation, and their invariants (density, index = opcode number, tags
//! in the right form, unique mnemonics) are checked in the same pass: a
//! broken table fails the build.

use core::fmt;

use crate::error::TableError;
use crate::form::{Form, Tag};

/// Mnemonic of reserved slots.
pub const RESERVED_MNEMONIC: &str = "bad";

/// One opcode-table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OpcodeEntry {
    /// Form-local opcode number; equals the entry's table index.
    pub opcode: u8,
    /// Form whose table holds this entry.
    pub form: Form,
    /// Operand shape.
    pub tag: Tag,
    /// Assembler mnemonic (`"bad"` for reserved slots).
    pub mnemonic: &'static str,
    /// Auxiliary numbering carried over from the opcode table. Always 0 in
    /// the shipped tables and never interpreted by the codec.
    pub serial: u32,
}

impl OpcodeEntry {
    const fn new(form: Form, opcode: u8, tag: Tag, mnemonic: &'static str) -> Self {
        Self {
            opcode,
            form,
            tag,
            mnemonic,
            serial: 0,
        }
    }

    const fn reserved(form: Form, opcode: u8) -> Self {
        Self::new(form, opcode, Tag::Bad, RESERVED_MNEMONIC)
    }

    /// `true` for reserved (`"bad"`) slots.
    #[inline]
    pub const fn is_reserved(&self) -> bool {
        matches!(self.tag, Tag::Bad)
    }
}

impl fmt::Display for OpcodeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} 0x{:02x} ({})",
            self.mnemonic, self.form, self.opcode, self.tag
        )
    }
}

// ── Table data ──────────────────────────────────────────────────────────

const fn reserved_slots<const N: usize>(form: Form) -> [OpcodeEntry; N] {
    let mut table = [OpcodeEntry::reserved(form, 0); N];
    let mut i = 0;
    while i < N {
        table[i] = OpcodeEntry::reserved(form, i as u8);
        i += 1;
    }
    table
}

const fn f1(opcode: u8, tag: Tag, mnemonic: &'static str) -> OpcodeEntry {
    OpcodeEntry::new(Form::Form1, opcode, tag, mnemonic)
}

const fn f2(opcode: u8, mnemonic: &'static str) -> OpcodeEntry {
    OpcodeEntry::new(Form::Form2, opcode, Tag::F2_A8V, mnemonic)
}

const fn f3(opcode: u8, mnemonic: &'static str) -> OpcodeEntry {
    OpcodeEntry::new(Form::Form3, opcode, Tag::F3_PCREL, mnemonic)
}

#[allow(clippy::enum_glob_use)]
const FORM1_TABLE: [OpcodeEntry; 128] = {
    use Tag::*;
    // 0x00, 0x12-0x18 and 0x3a-0x7f stay reserved.
    let mut t = reserved_slots::<128>(Form::Form1);
    t[0x01] = f1(0x01, F1_A4, "ldi.l");
    t[0x02] = f1(0x02, F1_AB, "mov");
    t[0x03] = f1(0x03, F1_M, "jsra");
    t[0x04] = f1(0x04, F1_NARG, "ret");
    t[0x05] = f1(0x05, F1_AB, "add.l");
    t[0x06] = f1(0x06, F1_AB, "push");
    t[0x07] = f1(0x07, F1_AB, "pop");
    t[0x08] = f1(0x08, F1_A4, "lda.l");
    t[0x09] = f1(0x09, F1_4A, "sta.l");
    t[0x0a] = f1(0x0a, F1_ABi, "ld.l");
    t[0x0b] = f1(0x0b, F1_AiB, "st.l");
    t[0x0c] = f1(0x0c, F1_ABi4, "ldo.l");
    t[0x0d] = f1(0x0d, F1_AiB4, "sto.l");
    t[0x0e] = f1(0x0e, F1_AB, "cmp");
    t[0x0f] = f1(0x0f, F1_NARG, "nop");
    t[0x10] = f1(0x10, F1_AB, "sex.b");
    t[0x11] = f1(0x11, F1_AB, "sex.s");
    t[0x19] = f1(0x19, F1_A, "jsr");
    t[0x1a] = f1(0x1a, F1_M, "jmpa");
    t[0x1b] = f1(0x1b, F1_A4, "ldi.b");
    t[0x1c] = f1(0x1c, F1_ABi, "ld.b");
    t[0x1d] = f1(0x1d, F1_A4, "lda.b");
    t[0x1e] = f1(0x1e, F1_AiB, "st.b");
    t[0x1f] = f1(0x1f, F1_4A, "sta.b");
    t[0x20] = f1(0x20, F1_A4, "ldi.s");
    t[0x21] = f1(0x21, F1_ABi, "ld.s");
    t[0x22] = f1(0x22, F1_A4, "lda.s");
    t[0x23] = f1(0x23, F1_AiB, "st.s");
    t[0x24] = f1(0x24, F1_4A, "sta.s");
    t[0x25] = f1(0x25, F1_A, "jmp");
    t[0x26] = f1(0x26, F1_AB, "and");
    t[0x27] = f1(0x27, F1_AB, "lshr");
    t[0x28] = f1(0x28, F1_AB, "ashl");
    t[0x29] = f1(0x29, F1_AB, "sub.l");
    t[0x2a] = f1(0x2a, F1_AB, "neg");
    t[0x2b] = f1(0x2b, F1_AB, "or");
    t[0x2c] = f1(0x2c, F1_AB, "not");
    t[0x2d] = f1(0x2d, F1_AB, "ashr");
    t[0x2e] = f1(0x2e, F1_AB, "xor");
    t[0x2f] = f1(0x2f, F1_AB, "mul.l");
    t[0x30] = f1(0x30, F1_4, "swi");
    t[0x31] = f1(0x31, F1_AB, "div.l");
    t[0x32] = f1(0x32, F1_AB, "udiv.l");
    t[0x33] = f1(0x33, F1_AB, "mod.l");
    t[0x34] = f1(0x34, F1_AB, "umod.l");
    t[0x35] = f1(0x35, F1_NARG, "brk");
    t[0x36] = f1(0x36, F1_ABi4, "ldo.b");
    t[0x37] = f1(0x37, F1_AiB4, "sto.b");
    t[0x38] = f1(0x38, F1_ABi4, "ldo.s");
    t[0x39] = f1(0x39, F1_AiB4, "sto.s");
    t
};

const FORM2_TABLE: [OpcodeEntry; 4] = [
    f2(0x00, "inc"),
    f2(0x01, "dec"),
    f2(0x02, "gsr"),
    f2(0x03, "ssr"),
];

const FORM3_TABLE: [OpcodeEntry; 16] = {
    // 0x0a-0x0f stay reserved.
    let mut t = reserved_slots::<16>(Form::Form3);
    t[0x00] = f3(0x00, "beq");
    t[0x01] = f3(0x01, "bne");
    t[0x02] = f3(0x02, "blt");
    t[0x03] = f3(0x03, "bgt");
    t[0x04] = f3(0x04, "bltu");
    t[0x05] = f3(0x05, "bgtu");
    t[0x06] = f3(0x06, "bge");
    t[0x07] = f3(0x07, "ble");
    t[0x08] = f3(0x08, "bgeu");
    t[0x09] = f3(0x09, "bleu");
    t
};

static FORM1: [OpcodeEntry; 128] = FORM1_TABLE;
static FORM2: [OpcodeEntry; 4] = FORM2_TABLE;
static FORM3: [OpcodeEntry; 16] = FORM3_TABLE;

// ── Mnemonic index ──────────────────────────────────────────────────────

/// Position of a defined mnemonic, kept sorted by name.
#[derive(Debug, Clone, Copy)]
struct NameSlot {
    mnemonic: &'static str,
    form: Form,
    opcode: u8,
}

const fn count_defined(table: &[OpcodeEntry]) -> usize {
    let mut n = 0;
    let mut i = 0;
    while i < table.len() {
        if !table[i].is_reserved() {
            n += 1;
        }
        i += 1;
    }
    n
}

const DEFINED: usize =
    count_defined(&FORM1_TABLE) + count_defined(&FORM2_TABLE) + count_defined(&FORM3_TABLE);

const fn append_defined(
    mut index: [NameSlot; DEFINED],
    mut n: usize,
    table: &[OpcodeEntry],
) -> ([NameSlot; DEFINED], usize) {
    let mut i = 0;
    while i < table.len() {
        let e = table[i];
        if !e.is_reserved() {
            index[n] = NameSlot {
                mnemonic: e.mnemonic,
                form: e.form,
                opcode: e.opcode,
            };
            n += 1;
        }
        i += 1;
    }
    (index, n)
}

/// Byte-wise comparison matching `<str as Ord>`: -1, 0 or 1.
const fn str_cmp(a: &str, b: &str) -> i8 {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut i = 0;
    while i < a.len() && i < b.len() {
        if a[i] < b[i] {
            return -1;
        }
        if a[i] > b[i] {
            return 1;
        }
        i += 1;
    }
    if a.len() < b.len() {
        -1
    } else if a.len() > b.len() {
        1
    } else {
        0
    }
}

const fn build_index() -> [NameSlot; DEFINED] {
    let empty = NameSlot {
        mnemonic: "",
        form: Form::Form1,
        opcode: 0,
    };
    let index = [empty; DEFINED];
    let (index, n) = append_defined(index, 0, &FORM1_TABLE);
    let (index, n) = append_defined(index, n, &FORM2_TABLE);
    let (mut index, _) = append_defined(index, n, &FORM3_TABLE);

    // insertion sort by mnemonic
    let mut i = 1;
    while i < DEFINED {
        let mut j = i;
        while j > 0 && str_cmp(index[j - 1].mnemonic, index[j].mnemonic) > 0 {
            let tmp = index[j];
            index[j] = index[j - 1];
            index[j - 1] = tmp;
            j -= 1;
        }
        i += 1;
    }
    index
}

const BY_NAME_INDEX: [NameSlot; DEFINED] = build_index();
static BY_NAME: [NameSlot; DEFINED] = BY_NAME_INDEX;

// ── Invariant checks ────────────────────────────────────────────────────

const fn same_form(a: Form, b: Form) -> bool {
    a as u8 == b as u8
}

const fn check_form(form: Form, table: &[OpcodeEntry]) -> Result<(), TableError> {
    if table.len() != form.table_size() {
        return Err(TableError::WrongSize {
            form,
            expected: form.table_size(),
            found: table.len(),
        });
    }
    let mut i = 0;
    while i < table.len() {
        let e = table[i];
        if e.opcode as usize != i {
            return Err(TableError::OpcodeMismatch {
                form,
                index: i,
                opcode: e.opcode,
            });
        }
        let foreign_tag = match e.tag.form() {
            Some(f) => !same_form(f, form),
            None => false,
        };
        if foreign_tag || !same_form(e.form, form) {
            return Err(TableError::FormMismatch {
                form,
                opcode: e.opcode,
                tag: e.tag,
            });
        }
        if (str_cmp(e.mnemonic, RESERVED_MNEMONIC) == 0) != e.is_reserved() {
            return Err(TableError::ReservedName {
                form,
                opcode: e.opcode,
            });
        }
        i += 1;
    }
    Ok(())
}

const fn check_unique(index: &[NameSlot]) -> Result<(), TableError> {
    let mut i = 1;
    while i < index.len() {
        if str_cmp(index[i - 1].mnemonic, index[i].mnemonic) == 0 {
            return Err(TableError::DuplicateMnemonic {
                mnemonic: index[i].mnemonic,
            });
        }
        i += 1;
    }
    Ok(())
}

const fn check_tables(
    form1: &[OpcodeEntry],
    form2: &[OpcodeEntry],
    form3: &[OpcodeEntry],
    index: &[NameSlot],
) -> Result<(), TableError> {
    if let Err(e) = check_form(Form::Form1, form1) {
        return Err(e);
    }
    if let Err(e) = check_form(Form::Form2, form2) {
        return Err(e);
    }
    if let Err(e) = check_form(Form::Form3, form3) {
        return Err(e);
    }
    check_unique(index)
}

const _: () = match check_tables(&FORM1_TABLE, &FORM2_TABLE, &FORM3_TABLE, &BY_NAME_INDEX) {
    Ok(()) => {}
    Err(_) => panic!("moxie opcode tables violate their layout invariants"),
};

// ── Lookup ──────────────────────────────────────────────────────────────

/// Read-only view of the three opcode tables plus the mnemonic index.
///
/// # Examples
///
/// ```rust
/// use moxie_codec::{Form, OpcodeTable, Tag};
///
/// let table = OpcodeTable::moxie();
/// let mov = table.lookup_by_name("mov").unwrap();
/// assert_eq!((mov.form, mov.opcode, mov.tag), (Form::Form1, 0x02, Tag::F1_AB));
/// assert_eq!(table.lookup_by_number(Form::Form3, 0x00).unwrap().mnemonic, "beq");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct OpcodeTable {
    form1: &'static [OpcodeEntry],
    form2: &'static [OpcodeEntry],
    form3: &'static [OpcodeEntry],
    by_name: &'static [NameSlot],
}

static MOXIE: OpcodeTable = OpcodeTable {
    form1: &FORM1,
    form2: &FORM2,
    form3: &FORM3,
    by_name: &BY_NAME,
};

impl OpcodeTable {
    /// The moxie opcode tables.
    #[inline]
    pub fn moxie() -> &'static OpcodeTable {
        &MOXIE
    }

    /// All slots of `form`'s table, reserved ones included, in opcode order.
    #[inline]
    pub fn entries(&self, form: Form) -> &'static [OpcodeEntry] {
        match form {
            Form::Form1 => self.form1,
            Form::Form2 => self.form2,
            Form::Form3 => self.form3,
        }
    }

    /// Direct index into `form`'s table. `None` only when `opcode` is past
    /// the end of the table; reserved slots are returned as entries.
    #[inline]
    pub fn lookup_by_number(&self, form: Form, opcode: u8) -> Option<&'static OpcodeEntry> {
        self.entries(form).get(opcode as usize)
    }

    /// Find the entry for a mnemonic across all forms.
    ///
    /// The reserved name `"bad"` is never found.
    pub fn lookup_by_name(&self, mnemonic: &str) -> Option<&'static OpcodeEntry> {
        let i = self
            .by_name
            .binary_search_by(|slot| slot.mnemonic.cmp(mnemonic))
            .ok()?;
        let slot = self.by_name[i];
        self.lookup_by_number(slot.form, slot.opcode)
    }

    /// Find a mnemonic in one form's table only.
    pub fn lookup_in_form(&self, form: Form, mnemonic: &str) -> Option<&'static OpcodeEntry> {
        self.lookup_by_name(mnemonic).filter(|e| e.form == form)
    }

    /// All defined mnemonics, sorted.
    pub fn mnemonics(&self) -> impl Iterator<Item = &'static str> {
        self.by_name.iter().map(|slot| slot.mnemonic)
    }

    /// All non-reserved entries, FORM1 first, in opcode order.
    pub fn defined(&self) -> impl Iterator<Item = &'static OpcodeEntry> {
        self.form1
            .iter()
            .chain(self.form2)
            .chain(self.form3)
            .filter(|e| !e.is_reserved())
    }

    /// Re-run the layout checks the build already performed.
    pub fn validate(&self) -> Result<(), TableError> {
        check_tables(self.form1, self.form2, self.form3, self.by_name)
    }
}

/// Serialize an entry reference by mnemonic; deserialize it back to the
/// canonical static entry.
#[cfg(feature = "serde")]
pub(crate) mod serde_entry {
    use alloc::string::String;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{OpcodeEntry, OpcodeTable};

    pub(crate) fn serialize<S: Serializer>(
        entry: &&'static OpcodeEntry,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(entry.mnemonic)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<&'static OpcodeEntry, D::Error> {
        let name = String::deserialize(deserializer)?;
        OpcodeTable::moxie()
            .lookup_by_name(&name)
            .ok_or_else(|| D::Error::custom(format_args!("unknown moxie mnemonic '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn tables_validate() {
        assert_eq!(OpcodeTable::moxie().validate(), Ok(()));
    }

    #[test]
    fn tables_are_dense() {
        let table = OpcodeTable::moxie();
        for form in Form::ALL {
            let entries = table.entries(form);
            assert_eq!(entries.len(), form.table_size());
            for n in 0..form.table_size() {
                let e = table.lookup_by_number(form, n as u8).unwrap();
                assert_eq!(e.opcode as usize, n);
                assert_eq!(e.form, form);
            }
        }
        assert!(table.lookup_by_number(Form::Form2, 4).is_none());
    }

    #[test]
    fn reserved_slots() {
        let table = OpcodeTable::moxie();
        let bad: Vec<u8> = table
            .entries(Form::Form1)
            .iter()
            .filter(|e| e.is_reserved())
            .map(|e| e.opcode)
            .collect();
        assert_eq!(bad[0], 0x00);
        assert_eq!(&bad[1..8], &[0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18]);
        assert_eq!(bad.len(), 1 + 7 + (0x80 - 0x3a));
        assert!(table.lookup_by_number(Form::Form3, 0x0f).unwrap().is_reserved());
        assert!(table.entries(Form::Form2).iter().all(|e| !e.is_reserved()));
    }

    #[test]
    fn defined_counts() {
        let table = OpcodeTable::moxie();
        assert_eq!(DEFINED, 64);
        assert_eq!(table.defined().count(), 64);
        assert_eq!(table.mnemonics().count(), 64);
    }

    #[test]
    fn mnemonics_sorted_and_unique() {
        let names: Vec<&str> = OpcodeTable::moxie().mnemonics().collect();
        for pair in names.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn lookup_by_name_every_defined_entry() {
        let table = OpcodeTable::moxie();
        for e in table.defined() {
            assert_eq!(table.lookup_by_name(e.mnemonic), Some(e));
        }
    }

    #[test]
    fn lookup_by_name_misses() {
        let table = OpcodeTable::moxie();
        assert!(table.lookup_by_name("bad").is_none());
        assert!(table.lookup_by_name("").is_none());
        assert!(table.lookup_by_name("MOV").is_none());
        assert!(table.lookup_by_name("ld.q").is_none());
    }

    #[test]
    fn lookup_in_form() {
        let table = OpcodeTable::moxie();
        assert_eq!(table.lookup_in_form(Form::Form2, "inc").unwrap().opcode, 0);
        assert!(table.lookup_in_form(Form::Form1, "inc").is_none());
        assert_eq!(table.lookup_in_form(Form::Form3, "bleu").unwrap().opcode, 9);
    }

    #[test]
    fn known_entries() {
        let table = OpcodeTable::moxie();
        let e = table.lookup_by_name("ldi.l").unwrap();
        assert_eq!((e.form, e.opcode, e.tag), (Form::Form1, 0x01, Tag::F1_A4));
        let e = table.lookup_by_name("swi").unwrap();
        assert_eq!((e.opcode, e.tag), (0x30, Tag::F1_4));
        let e = table.lookup_by_name("sto.s").unwrap();
        assert_eq!((e.opcode, e.tag), (0x39, Tag::F1_AiB4));
        let e = table.lookup_by_name("ssr").unwrap();
        assert_eq!((e.form, e.opcode), (Form::Form2, 0x03));
        assert!(table.defined().all(|e| e.serial == 0));
    }

    #[test]
    fn str_cmp_matches_ord() {
        for (a, b) in [("a", "b"), ("ld.l", "ld.b"), ("ld", "ld.l"), ("mov", "mov"), ("", "x")] {
            let expected = match a.cmp(b) {
                core::cmp::Ordering::Less => -1,
                core::cmp::Ordering::Equal => 0,
                core::cmp::Ordering::Greater => 1,
            };
            assert_eq!(str_cmp(a, b), expected, "{a} vs {b}");
        }
    }

    #[test]
    fn check_form_detects_faults() {
        let mut t = FORM2_TABLE;
        t[2].opcode = 3;
        assert_eq!(
            check_form(Form::Form2, &t),
            Err(TableError::OpcodeMismatch {
                form: Form::Form2,
                index: 2,
                opcode: 3
            })
        );

        let mut t = FORM2_TABLE;
        t[1].tag = Tag::F3_PCREL;
        assert!(matches!(
            check_form(Form::Form2, &t),
            Err(TableError::FormMismatch { opcode: 1, .. })
        ));

        let mut t = FORM3_TABLE;
        t[0x0a].mnemonic = "beq2";
        assert_eq!(
            check_form(Form::Form3, &t),
            Err(TableError::ReservedName {
                form: Form::Form3,
                opcode: 0x0a
            })
        );

        assert!(matches!(
            check_form(Form::Form3, &FORM2_TABLE),
            Err(TableError::WrongSize {
                expected: 16,
                found: 4,
                ..
            })
        ));
    }

    #[test]
    fn check_unique_detects_duplicates() {
        let mut index = BY_NAME_INDEX;
        index[1].mnemonic = index[0].mnemonic;
        assert_eq!(
            check_unique(&index),
            Err(TableError::DuplicateMnemonic {
                mnemonic: index[0].mnemonic
            })
        );
    }
}
