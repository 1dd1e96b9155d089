//! Byte-level codec: endianness, decoding options and the stream decoder.

use alloc::vec::Vec;

use crate::decoder::decode_with;
use crate::encoder::{encode, Encoding};
use crate::error::{DecodeError, EncodeError};
use crate::instruction::Instruction;
use crate::operand::Operand;

/// Byte order of instruction words in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endian {
    /// Most significant byte first (`moxie-elf`).
    #[default]
    Big,
    /// Least significant byte first (`moxiel-elf`).
    Little,
}

impl Endian {
    #[inline]
    fn read_u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            Endian::Big => u16::from_be_bytes(bytes),
            Endian::Little => u16::from_le_bytes(bytes),
        }
    }

    #[inline]
    fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Endian::Big => u32::from_be_bytes(bytes),
            Endian::Little => u32::from_le_bytes(bytes),
        }
    }
}

/// Codec configuration.
///
/// # Examples
///
/// ```rust
/// use moxie_codec::{Codec, CodecOptions, Endian};
///
/// let codec = Codec::with_options(CodecOptions {
///     endian: Endian::Little,
///     strict: true,
///     base_address: 0x1000,
/// });
/// assert!(codec.options().strict);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodecOptions {
    /// Byte order for both the instruction word and the extension word.
    /// Default: big-endian.
    pub endian: Endian,
    /// Reject words that set bits outside every operand field.
    /// Default: off, matching the lenient behaviour of [`decode`](crate::decode).
    pub strict: bool,
    /// Address of the first byte of a decoded stream. Default: 0.
    pub base_address: u32,
}

/// Builder-pattern codec.
///
/// # Examples
///
/// ```rust
/// use moxie_codec::{Codec, Endian, Operand};
///
/// let mut codec = Codec::new();
/// codec.endian(Endian::Big).base_address(0x100);
///
/// let mut code = Vec::new();
/// codec.encode_into("inc", &[Operand::Register(2), Operand::Immediate(4)], &mut code)?;
/// codec.encode_into("ret", &[], &mut code)?;
/// assert_eq!(code, [0x82, 0x04, 0x04, 0x00]);
///
/// let names: Vec<_> = codec
///     .decode_bytes(&code)
///     .map(|item| item.result.map(|insn| insn.mnemonic()))
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(names, ["inc", "ret"]);
/// # Ok::<(), moxie_codec::EncodeError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec {
    options: CodecOptions,
}

impl Codec {
    /// Create a codec with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with the given options.
    #[must_use]
    pub fn with_options(options: CodecOptions) -> Self {
        Self { options }
    }

    /// Set the byte order.
    pub fn endian(&mut self, endian: Endian) -> &mut Self {
        self.options.endian = endian;
        self
    }

    /// Enable or disable strict decoding.
    pub fn strict(&mut self, strict: bool) -> &mut Self {
        self.options.strict = strict;
        self
    }

    /// Set the address of the first byte of decoded streams.
    pub fn base_address(&mut self, addr: u32) -> &mut Self {
        self.options.base_address = addr;
        self
    }

    /// Current options.
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Encode an instruction by mnemonic.
    pub fn encode(&self, mnemonic: &str, operands: &[Operand]) -> Result<Encoding, EncodeError> {
        encode(mnemonic, operands)
    }

    /// Encode an instruction and append its bytes to `out`.
    ///
    /// Returns the number of bytes written. Nothing is written on error.
    pub fn encode_into(
        &self,
        mnemonic: &str,
        operands: &[Operand],
        out: &mut Vec<u8>,
    ) -> Result<usize, EncodeError> {
        let encoding = encode(mnemonic, operands)?;
        encoding.write_to(out, self.options.endian);
        Ok(encoding.len_bytes())
    }

    /// Decode one word, honouring [`CodecOptions::strict`].
    pub fn decode(&self, word: u16, extension: Option<u32>) -> Result<Instruction, DecodeError> {
        decode_with(word, extension, self.options.strict)
    }

    /// Decode a byte stream instruction by instruction.
    pub fn decode_bytes<'a>(&self, bytes: &'a [u8]) -> Decoder<'a> {
        Decoder {
            bytes,
            offset: 0,
            options: self.options,
            done: false,
        }
    }
}

/// One step of a byte-stream decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedItem {
    /// Byte offset of the instruction word within the stream.
    pub offset: usize,
    /// `base_address + offset`, both wrapping modulo 2^32.
    pub address: u32,
    /// The decoded instruction or the reason this position failed.
    pub result: Result<Instruction, DecodeError>,
}

/// Iterator over the instructions of a byte stream.
///
/// A reserved or non-canonical word yields its error and decoding resumes
/// at the next word. A stream that ends inside a word or before a required
/// extension word yields one final error and stops.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    bytes: &'a [u8],
    offset: usize,
    options: CodecOptions,
    done: bool,
}

impl Decoder<'_> {
    /// Byte offset of the next word to decode.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn word_at(&self, offset: usize) -> Option<u16> {
        let b = self.bytes.get(offset..offset.checked_add(2)?)?;
        Some(self.options.endian.read_u16([b[0], b[1]]))
    }

    fn extension_at(&self, offset: usize) -> Option<u32> {
        let b = self.bytes.get(offset..offset.checked_add(4)?)?;
        Some(self.options.endian.read_u32([b[0], b[1], b[2], b[3]]))
    }
}

/// Offset into the stream as a 32-bit address delta, wrapping past 4 GiB.
fn stream_offset(offset: usize) -> u32 {
    u32::try_from(offset).unwrap_or_else(|_| (offset as u64 & u64::from(u32::MAX)) as u32)
}

impl Iterator for Decoder<'_> {
    type Item = DecodedItem;

    fn next(&mut self) -> Option<DecodedItem> {
        if self.done || self.offset >= self.bytes.len() {
            return None;
        }
        let offset = self.offset;
        let address = self.options.base_address.wrapping_add(stream_offset(offset));

        let Some(word) = self.word_at(offset) else {
            self.done = true;
            let available = self.bytes.len() - offset;
            trace_event!(debug, offset, available, "stream ends inside an instruction word");
            return Some(DecodedItem {
                offset,
                address,
                result: Err(DecodeError::UnexpectedEnd { offset, available }),
            });
        };

        let extension = self.extension_at(offset + 2);
        let result = decode_with(word, extension, self.options.strict);
        match &result {
            Ok(insn) => self.offset += insn.len_bytes(),
            Err(DecodeError::TruncatedInstruction { .. }) => {
                trace_event!(debug, offset, word, "stream ends before extension word");
                self.done = true;
            }
            Err(_) => {
                trace_event!(debug, offset, word, "undecodable word, skipping");
                self.offset += 2;
            }
        }

        Some(DecodedItem {
            offset,
            address,
            result,
        })
    }
}

impl core::iter::FusedIterator for Decoder<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Form;
    use alloc::vec;

    fn r(n: u8) -> Operand {
        Operand::Register(n)
    }

    #[test]
    fn defaults() {
        let codec = Codec::new();
        assert_eq!(codec.options().endian, Endian::Big);
        assert!(!codec.options().strict);
        assert_eq!(codec.options().base_address, 0);
    }

    #[test]
    fn builder_chains() {
        let mut codec = Codec::new();
        codec.endian(Endian::Little).strict(true).base_address(0x40);
        assert_eq!(
            *codec.options(),
            CodecOptions {
                endian: Endian::Little,
                strict: true,
                base_address: 0x40
            }
        );
    }

    #[test]
    fn encode_into_both_orders() {
        let ops = [r(3), Operand::Immediate(0xDEADBEEF)];
        let mut big = Vec::new();
        assert_eq!(Codec::new().encode_into("ldi.l", &ops, &mut big), Ok(6));
        assert_eq!(big, [0x01, 0x30, 0xDE, 0xAD, 0xBE, 0xEF]);

        let mut little = Vec::new();
        let mut codec = Codec::new();
        codec.endian(Endian::Little);
        assert_eq!(codec.encode_into("ldi.l", &ops, &mut little), Ok(6));
        assert_eq!(little, [0x30, 0x01, 0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn encode_into_writes_nothing_on_error() {
        let mut out = vec![1, 2];
        assert!(Codec::new().encode_into("frob", &[], &mut out).is_err());
        assert_eq!(out, [1, 2]);
    }

    #[test]
    fn decode_respects_strict() {
        let mut codec = Codec::new();
        assert!(codec.decode(0x0401, None).is_ok());
        codec.strict(true);
        assert!(matches!(
            codec.decode(0x0401, None),
            Err(DecodeError::NonCanonical { .. })
        ));
    }

    #[test]
    fn stream_offset_wraps_past_4gib() {
        assert_eq!(stream_offset(0), 0);
        assert_eq!(stream_offset(0x1234), 0x1234);
        #[cfg(target_pointer_width = "64")]
        {
            assert_eq!(stream_offset(0x1_0000_0002), 2);
            assert_eq!(stream_offset(0x2_FFFF_FFFE), 0xFFFF_FFFE);
        }
    }

    #[test]
    fn stream_offsets_and_addresses() {
        let bytes = [0x01, 0x30, 0xDE, 0xAD, 0xBE, 0xEF, 0x02, 0x12, 0xC0, 0x01];
        let mut codec = Codec::new();
        codec.base_address(0x1000);
        let items: Vec<DecodedItem> = codec.decode_bytes(&bytes).collect();
        assert_eq!(items.len(), 3);
        assert_eq!((items[0].offset, items[0].address), (0, 0x1000));
        assert_eq!((items[1].offset, items[1].address), (6, 0x1006));
        assert_eq!((items[2].offset, items[2].address), (8, 0x1008));
        let insn = items[2].result.as_ref().unwrap();
        assert_eq!(insn.mnemonic(), "beq");
        assert_eq!(insn.branch_target(items[2].address), Some(0x100C));
    }

    #[test]
    fn stream_little_endian() {
        let bytes = [0x30, 0x01, 0xEF, 0xBE, 0xAD, 0xDE];
        let mut codec = Codec::new();
        codec.endian(Endian::Little);
        let mut it = codec.decode_bytes(&bytes);
        let insn = it.next().unwrap().result.unwrap();
        assert_eq!(insn.operands(), &[r(3), Operand::Immediate(0xDEADBEEF)]);
        assert!(it.next().is_none());
    }

    #[test]
    fn stream_skips_reserved_words() {
        let bytes = [0x00, 0x00, 0x0F, 0x00];
        let items: Vec<DecodedItem> = Codec::new().decode_bytes(&bytes).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0].result,
            Err(DecodeError::ReservedOpcode {
                form: Form::Form1,
                opcode: 0,
                word: 0
            })
        );
        assert_eq!(items[1].result.as_ref().unwrap().mnemonic(), "nop");
    }

    #[test]
    fn stream_truncated_extension_stops() {
        let bytes = [0x01, 0x30, 0xDE, 0xAD];
        let mut it = Codec::new().decode_bytes(&bytes);
        assert!(matches!(
            it.next().unwrap().result,
            Err(DecodeError::TruncatedInstruction { word: 0x0130, .. })
        ));
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn stream_odd_trailing_byte() {
        let bytes = [0x0F, 0x00, 0x04];
        let items: Vec<DecodedItem> = Codec::new().decode_bytes(&bytes).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[1].result,
            Err(DecodeError::UnexpectedEnd {
                offset: 2,
                available: 1
            })
        );
    }

    #[test]
    fn stream_empty() {
        assert_eq!(Codec::new().decode_bytes(&[]).count(), 0);
    }
}
