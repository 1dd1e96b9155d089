//! Operand values.

use core::fmt;

use crate::form::OperandKind;

/// moxie register names by index: frame pointer, stack pointer, then
/// `$r0`–`$r13`.
const REGISTER_NAMES: [&str; 16] = [
    "$fp", "$sp", "$r0", "$r1", "$r2", "$r3", "$r4", "$r5", "$r6", "$r7", "$r8", "$r9", "$r10",
    "$r11", "$r12", "$r13",
];

/// Assembler name of register `index`, or `None` outside 0–15.
#[inline]
pub fn register_name(index: u8) -> Option<&'static str> {
    REGISTER_NAMES.get(index as usize).copied()
}

/// A typed operand value.
///
/// Values are stored unvalidated; the encoder checks them against the
/// operand spec of the instruction being encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    /// Register index (valid: 0–15).
    Register(u8),
    /// Unsigned immediate: 8-bit in FORM2, raw 32-bit in an extension word.
    Immediate(u32),
    /// Absolute 32-bit address.
    Address(u32),
    /// PC-relative branch displacement in halfwords (valid: −512..=511).
    Displacement(i16),
}

impl Operand {
    /// The kind tag of this value.
    #[inline]
    pub const fn kind(&self) -> OperandKind {
        match self {
            Operand::Register(_) => OperandKind::Register,
            Operand::Immediate(_) => OperandKind::Immediate,
            Operand::Address(_) => OperandKind::Address,
            Operand::Displacement(_) => OperandKind::Displacement,
        }
    }

    /// The value widened to `i64`, for range checks.
    #[inline]
    pub const fn value(&self) -> i64 {
        match *self {
            Operand::Register(r) => r as i64,
            Operand::Immediate(v) | Operand::Address(v) => v as i64,
            Operand::Displacement(d) => d as i64,
        }
    }

    /// Build an operand of `kind` from an already range-checked value.
    #[inline]
    pub(crate) const fn from_kind(kind: OperandKind, value: i64) -> Operand {
        match kind {
            OperandKind::Register => Operand::Register(value as u8),
            OperandKind::Immediate => Operand::Immediate(value as u32),
            OperandKind::Address => Operand::Address(value as u32),
            OperandKind::Displacement => Operand::Displacement(value as i16),
        }
    }
}

impl Default for Operand {
    fn default() -> Self {
        Operand::Register(0)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Operand::Register(r) => match register_name(r) {
                Some(name) => f.write_str(name),
                None => write!(f, "$?{}", r),
            },
            Operand::Immediate(v) | Operand::Address(v) => write!(f, "0x{:x}", v),
            Operand::Displacement(d) => write!(f, "{}", d),
        }
    }
}

// ─── Operands: stack-allocated operand array ─────────────────────────

/// Stack-allocated operand list.
///
/// The widest moxie instructions (`ldo.l`, `sto.l`) take three operands.
#[derive(Clone, Copy)]
pub struct Operands {
    items: [Operand; 3],
    len: u8,
}

impl Operands {
    /// Maximum number of operands.
    pub const MAX_LEN: usize = 3;

    /// Creates a new empty operand list.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: [Operand::Register(0); 3],
            len: 0,
        }
    }

    /// Build a list from a slice, or `None` if it holds more than
    /// [`MAX_LEN`](Self::MAX_LEN) operands.
    pub fn from_slice(ops: &[Operand]) -> Option<Self> {
        if ops.len() > Self::MAX_LEN {
            return None;
        }
        let mut list = Self::new();
        list.items[..ops.len()].copy_from_slice(ops);
        list.len = ops.len() as u8;
        Some(list)
    }

    /// Appends an operand to the list.
    ///
    /// # Panics
    /// Panics if the list already holds three operands.
    #[inline]
    pub fn push(&mut self, op: Operand) {
        assert!(
            (self.len as usize) < Self::MAX_LEN,
            "Operands overflow: max {} operands",
            Self::MAX_LEN
        );
        self.items[self.len as usize] = op;
        self.len += 1;
    }

    /// Returns the number of operands.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the active operands as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Operand] {
        &self.items[..self.len as usize]
    }
}

impl core::ops::Deref for Operands {
    type Target = [Operand];
    #[inline]
    fn deref(&self) -> &[Operand] {
        self.as_slice()
    }
}

impl PartialEq for Operands {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Operands {}

impl PartialEq<[Operand]> for Operands {
    fn eq(&self, other: &[Operand]) -> bool {
        self.as_slice() == other
    }
}

impl<const N: usize> PartialEq<[Operand; N]> for Operands {
    fn eq(&self, other: &[Operand; N]) -> bool {
        self.as_slice() == &other[..]
    }
}

impl fmt::Debug for Operands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice().iter()).finish()
    }
}

impl Default for Operands {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a Operands {
    type Item = &'a Operand;
    type IntoIter = core::slice::Iter<'a, Operand>;
    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Operands {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for op in self.as_slice() {
            seq.serialize_element(op)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Operands {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = Operands;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a sequence of at most {} operands", Operands::MAX_LEN)
            }
            fn visit_seq<A: serde::de::SeqAccess<'de>>(self, mut seq: A) -> Result<Operands, A::Error> {
                let mut list = Operands::new();
                while let Some(op) = seq.next_element::<Operand>()? {
                    if list.len() == Operands::MAX_LEN {
                        return Err(serde::de::Error::invalid_length(
                            Operands::MAX_LEN + 1,
                            &self,
                        ));
                    }
                    list.push(op);
                }
                Ok(list)
            }
        }
        deserializer.deserialize_seq(V)
    }
}
