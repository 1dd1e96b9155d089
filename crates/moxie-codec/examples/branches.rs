//! Branch example: computing FORM3 displacements and resolving targets.
//!
//! Run with: `cargo run --example branches`

use moxie_codec::{branch_displacement, decode, encode, EncodeError, Operand};

fn main() {
    println!("=== moxie_codec branches ===\n");

    let pc = 0x2000;
    for target in [0x2002, 0x2000, 0x1F00, 0x23FE, 0x1C02] {
        let disp = branch_displacement(pc, target).unwrap();
        let enc = encode("beq", &[Operand::Displacement(disp)]).unwrap();
        let insn = decode(enc.word, None).unwrap();
        println!(
            "   {:08x}: {}   disp={:<5} -> {}",
            pc,
            enc,
            disp,
            insn.display_at(pc)
        );
    }

    println!("\nOut of reach:");
    for target in [0x2402, 0x1C00, 0x2003] {
        match branch_displacement(pc, target) {
            Ok(disp) => println!("   unexpectedly reachable: {}", disp),
            Err(EncodeError::UnalignedBranch { target, .. }) => {
                println!("   0x{:x} is not halfword aligned", target)
            }
            Err(e) => println!("   {}", e),
        }
    }

    println!("\n=== Done! ===");
}
