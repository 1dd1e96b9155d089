#![no_main]
use libfuzzer_sys::fuzz_target;

use moxie_codec::{Codec, Endian};

fuzz_target!(|data: &[u8]| {
    // Stream decoding in both byte orders, lenient and strict.
    for endian in [Endian::Big, Endian::Little] {
        for strict in [false, true] {
            let mut codec = Codec::new();
            codec.endian(endian).strict(strict).base_address(0xFFFF_FF00);
            let mut consumed = 0;
            for item in codec.decode_bytes(data) {
                assert!(item.offset >= consumed);
                if let Ok(insn) = item.result {
                    consumed = item.offset + insn.len_bytes();
                    assert!(consumed <= data.len());
                    let _ = insn.display_at(item.address).to_string();
                }
            }
        }
    }
});
