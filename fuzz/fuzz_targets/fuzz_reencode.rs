#![no_main]
use libfuzzer_sys::fuzz_target;

use moxie_codec::{decode, Codec};

fuzz_target!(|input: (u16, u32)| {
    let (word, ext) = input;

    // Lenient: decode(encode(decode(w))) == decode(w).
    if let Ok(insn) = decode(word, Some(ext)) {
        let enc = insn.encode().expect("decoded instruction must re-encode");
        let again = decode(enc.word, enc.extension).expect("re-encoded word must decode");
        assert_eq!(again, insn);
    }

    // Strict: the word itself is reproduced.
    let mut codec = Codec::new();
    codec.strict(true);
    if let Ok(insn) = codec.decode(word, Some(ext)) {
        let enc = insn.encode().expect("decoded instruction must re-encode");
        assert_eq!(enc.word, word);
    }
});
