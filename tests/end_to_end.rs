//! End-to-end tests for the avrstack toolchain
//!
//! These tests verify the complete workflow:
//! 1. Assemble source code into a firmware image
//! 2. Write it as Intel HEX and load it back
//! 3. Analyse the loaded image
//! 4. Decode it back into a listing

use avrstack_analysis::{analyze, analyze_image, AnalysisConfig, StackBound};
use avrstack_assembler::assemble;
use avrstack_decoder::Listing;
use avrstack_isa::FirmwareImage;

fn load(source: &str) -> FirmwareImage {
    let hex = assemble(source).unwrap().to_ihex();
    FirmwareImage::from_ihex(&hex).unwrap()
}

// ============================================================================
// Assemble -> Load -> Analyse Tests
// ============================================================================

#[test]
fn test_push_pop_ret() {
    let image = load("push r16\npush r17\npush r18\npop r18\npop r17\npop r16\nret");
    assert_eq!(analyze_image(&image).unwrap().bound, StackBound::Bounded(3));
}

#[test]
fn test_call_into_three_pushes() {
    let source = r#"
            call f
            ret
        f:
            push r16
            push r17
            push r18
            ret
    "#;
    assert_eq!(analyze_image(&load(source)).unwrap().bound, StackBound::Bounded(5));
}

#[test]
fn test_rjmp_to_self() {
    assert_eq!(analyze_image(&load("here: rjmp here")).unwrap().bound, StackBound::Bounded(0));
}

#[test]
fn test_push_and_jump_back() {
    assert_eq!(
        analyze_image(&load("top: push r16\nrjmp top")).unwrap().bound,
        StackBound::Unbounded
    );
}

#[test]
fn test_large_device_return_address() {
    let source = r#"
            call f
            ret
        f:
            rcall g
            ret
        g:
            ret
    "#;
    let config = AnalysisConfig::new().with_return_address_bytes(3);
    assert_eq!(analyze(&load(source), config).unwrap().bound, StackBound::Bounded(6));
}

#[test]
fn test_interrupt_vector_entries() {
    let source = r#"
            jmp reset
            jmp isr
        reset:
            call main
        forever:
            rjmp forever
        main:
            push r28
            pop r28
            ret
        isr:
            push r0
            push r1
            push r24
            pop r24
            pop r1
            pop r0
            reti
    "#;
    let image = load(source);
    let reset = analyze(&image, AnalysisConfig::new().with_entry_point(0)).unwrap();
    let isr = analyze(&image, AnalysisConfig::new().with_entry_point(2)).unwrap();

    assert_eq!(reset.bound, StackBound::Bounded(3));
    assert_eq!(isr.bound, StackBound::Bounded(3));
    assert_eq!(reset.bound.merge(isr.bound), StackBound::Bounded(3));
}

// ============================================================================
// Assemble -> Decode Tests
// ============================================================================

#[test]
fn test_listing_text() {
    let image = load("start: push r28\nrcall start\nbrne start\ncall 0x34\nret");
    let text: Vec<String> = Listing::decode_image(&image)
        .unwrap()
        .instructions()
        .map(|(pc, instr)| format!("{:04x}: {}", pc * 2, instr))
        .collect();

    assert_eq!(
        text,
        vec![
            "0000: push r28",
            "0002: rcall .-4",
            "0004: brne .-6",
            "0006: call 0x68",
            "000a: ret",
        ]
    );
}
