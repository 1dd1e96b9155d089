//! # moxie-codec — Instruction Encoder/Decoder for the moxie ISA
//!
//! `moxie-codec` converts between a typed instruction representation
//! (mnemonic plus operands) and the packed binary encoding used by the
//! moxie processor: one 16-bit instruction word, optionally followed by a
//! 32-bit extension word carrying a long immediate or absolute address.
//!
//! ## Quick Start
//!
//! ```rust
//! use moxie_codec::{decode, encode, Operand};
//!
//! let enc = encode("mov", &[Operand::Register(1), Operand::Register(2)]).unwrap();
//! assert_eq!(enc.word, 0x0212);
//!
//! let insn = decode(enc.word, enc.extension).unwrap();
//! assert_eq!(insn.mnemonic(), "mov");
//! ```
//!
//! ## Features
//!
//! - **Table driven** — opcode tables are dense `static` arrays indexed by
//!   opcode number; their invariants are checked at compile time.
//! - **Exact round trip** — `decode(encode(x)) == x` for every defined
//!   instruction and every in-range operand.
//! - **`no_std` + `alloc`** — the `std` feature only adds `std::error::Error`.
//! - **Byte streams** — [`Codec`] reads and writes big- or little-endian code.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
// Bit packing narrows and sign-changes integers all over the place.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap,
    clippy::unreadable_literal,
    clippy::match_same_arms,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args,
    clippy::doc_markdown,
    clippy::missing_errors_doc
)]

extern crate alloc;

/// Emit a `tracing` event when the `tracing` feature is enabled.
macro_rules! trace_event {
    ($level:ident, $($arg:tt)+) => {
        #[cfg(feature = "tracing")]
        ::tracing::$level!($($arg)+);
    };
}

/// Builder-style codec: endianness, strict decoding, byte streams.
pub mod codec;
/// Decode path: 16-bit word (+ extension word) to [`Instruction`].
pub mod decoder;
/// Encode path: mnemonic + operands to [`Encoding`].
pub mod encoder;
/// Error types.
pub mod error;
/// Instruction forms, form tags, and bit-field geometry.
pub mod form;
/// The decoded instruction value.
pub mod instruction;
/// Operand values and fixed-capacity operand lists.
pub mod operand;
/// Static opcode tables and name/number lookup.
pub mod table;

// Re-exports
pub use codec::{Codec, CodecOptions, DecodedItem, Decoder, Endian};
pub use decoder::{branch_target, decode};
pub use encoder::{branch_displacement, encode, encode_entry, encode_values, Encoding, InstrBytes};
pub use error::{DecodeError, EncodeError, TableError};
pub use form::{FieldLayout, Form, OperandKind, OperandSpec, Slot, Tag};
pub use instruction::{AtAddress, Instruction};
pub use operand::{register_name, Operand, Operands};
pub use table::{OpcodeEntry, OpcodeTable};
