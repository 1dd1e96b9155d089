//! Disassembly example: encode a small routine, then walk the bytes back.
//!
//! Run with: `cargo run --example disassemble`

use moxie_codec::{Codec, Endian, OpcodeTable, Operand};

fn r(n: u8) -> Operand {
    Operand::Register(n)
}

fn main() {
    println!("=== moxie_codec disassembler ===\n");

    // --- Encode ---
    println!("1. Encode a memcpy-style loop (big-endian):");
    let mut codec = Codec::new();
    codec.endian(Endian::Big).base_address(0x1000);

    let program: &[(&str, &[Operand])] = &[
        ("ldi.l", &[r(4), Operand::Immediate(16)]),
        ("ld.b", &[r(5), r(2)]),
        ("st.b", &[r(3), r(5)]),
        ("inc", &[r(2), Operand::Immediate(1)]),
        ("inc", &[r(3), Operand::Immediate(1)]),
        ("dec", &[r(4), Operand::Immediate(1)]),
        ("cmp", &[r(4), r(6)]),
        ("bne", &[Operand::Displacement(-7)]),
        ("ret", &[]),
    ];
    let mut code = Vec::new();
    for (mnemonic, ops) in program {
        codec.encode_into(mnemonic, ops, &mut code).unwrap();
    }
    print_hex("   ", &code);

    // --- Decode ---
    println!("\n2. Listing:");
    for item in codec.decode_bytes(&code) {
        match item.result {
            Ok(insn) => {
                let bytes = &code[item.offset..item.offset + insn.len_bytes()];
                println!(
                    "   {:08x}:  {:<18} {}",
                    item.address,
                    hex(bytes),
                    insn.display_at(item.address)
                );
            }
            Err(e) => println!("   {:08x}:  <{}>", item.address, e),
        }
    }

    // --- Garbage in ---
    println!("\n3. Reserved words and a truncated tail (little-endian):");
    codec.endian(Endian::Little).base_address(0);
    let junk = [0x00, 0x00, 0x00, 0x0f, 0x30, 0x01, 0xEF, 0xBE];
    for item in codec.decode_bytes(&junk) {
        match item.result {
            Ok(insn) => println!("   {:04x}:  {}", item.offset, insn),
            Err(e) => println!("   {:04x}:  error: {}", item.offset, e),
        }
    }

    // --- Table ---
    println!("\n4. Defined mnemonics:");
    let names: Vec<&str> = OpcodeTable::moxie().mnemonics().collect();
    for chunk in names.chunks(10) {
        println!("   {}", chunk.join(" "));
    }

    println!("\n=== Done! ===");
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_hex(prefix: &str, bytes: &[u8]) {
    print!("{}", prefix);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && i % 16 == 0 {
            println!();
            print!("{}", prefix);
        }
        print!("{:02X} ", b);
    }
    println!();
}
