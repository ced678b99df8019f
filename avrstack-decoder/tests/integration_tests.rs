//! Decoder tests against assembled programs

use avrstack_assembler::{assemble, encode};
use avrstack_decoder::{decode, DecoderError, InstructionStream, Listing};
use avrstack_isa::{FirmwareImage, Instruction, Register};

// ============================================================================
// Assembled Programs
// ============================================================================

#[test]
fn test_decode_assembled_program() {
    let source = r#"
        main:
            push r28
            ldi r24, 0x2A
            call func
            pop r28
            ret
        func:
            sbrs r24, 7
            rjmp func
            ret
    "#;
    let image = assemble(source).unwrap();
    let listing = Listing::decode_image(&image).unwrap();
    let decoded: Vec<(u32, Instruction)> = listing.instructions().collect();

    assert_eq!(
        decoded,
        vec![
            (0, Instruction::Push { rr: Register::R28 }),
            (1, Instruction::Ldi { rd: Register::R24, k: 0x2A }),
            (2, Instruction::Call { k: Some(6) }),
            (4, Instruction::Pop { rd: Register::R28 }),
            (5, Instruction::Ret),
            (6, Instruction::Sbrs { rr: Register::R24, b: 7 }),
            (7, Instruction::Rjmp { k: Some(-2) }),
            (8, Instruction::Ret),
        ]
    );
}

#[test]
fn test_stream_and_listing_agree() {
    let image = assemble("lds r24, 0x0100\nbrne 1\nout 0x3D, r28\nret").unwrap();
    let listing = Listing::decode_image(&image).unwrap();

    assert_eq!(image.len_words(), listing.len_words());
    for (pc, instr) in listing.instructions() {
        assert_eq!(image.decode_at(pc).unwrap(), instr);
    }
    // Second word of lds is data, not an instruction boundary
    assert_eq!(
        listing.decode_at(1),
        Err(DecoderError::MidInstruction { pc: 1 })
    );
}

// ============================================================================
// Encoder / Decoder Agreement
// ============================================================================

#[test]
fn test_encode_then_decode_control_transfers() {
    let samples = [
        Instruction::Rjmp { k: Some(-2048) },
        Instruction::Rcall { k: Some(2047) },
        Instruction::Brbs { s: 7, k: Some(-64) },
        Instruction::Brbc { s: 0, k: Some(63) },
        Instruction::Jmp { k: Some(0x2A_5A5A) },
        Instruction::Call { k: Some(0x1_0000) },
        Instruction::Ijmp,
        Instruction::Eicall,
        Instruction::Reti,
    ];

    for instr in samples {
        let image = FirmwareImage::from_words(&encode(&instr).unwrap());
        assert_eq!(decode(&image, 0).unwrap(), instr, "{}", instr);
    }
}

#[test]
fn test_erased_flash_is_reserved() {
    let image = assemble(".org 4\nret").unwrap();
    assert_eq!(decode(&image, 0), Err(DecoderError::Reserved(0xFFFF)));
    assert_eq!(decode(&image, 2).unwrap(), Instruction::Ret);
}
