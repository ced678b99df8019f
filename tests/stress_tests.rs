//! Stress tests for the stack analysis
//!
//! Large programs, deep call chains and many paths. Exploration uses an
//! explicit work-stack, so depth here is limited by memory, not by the
//! native call stack.

use avrstack_analysis::{analyze, analyze_image, AnalysisConfig, StackBound};
use avrstack_assembler::assemble;
use avrstack_decoder::Listing;
use avrstack_isa::{Instruction, Register};

// ============================================================================
// Large Program Tests
// ============================================================================

#[test]
fn test_10000_pushes() {
    let mut program = vec![Instruction::Push { rr: Register::R0 }; 10_000];
    program.push(Instruction::Ret);

    let report = analyze(&Listing::new(program), AnalysisConfig::default()).unwrap();
    assert_eq!(report.bound, StackBound::Bounded(10_000));
    assert_eq!(report.peak_pc, 10_000);
}

#[test]
fn test_deep_call_chain() {
    const DEPTH: u64 = 2_000;

    let mut source = String::new();
    for i in 0..DEPTH {
        source.push_str(&format!("f{}:\n    rcall f{}\n    ret\n", i, i + 1));
    }
    source.push_str(&format!("f{}:\n    push r1\n    pop r1\n    ret\n", DEPTH));

    let report = analyze_image(&assemble(&source).unwrap()).unwrap();
    assert_eq!(report.bound, StackBound::Bounded(2 * DEPTH + 1));
    assert_eq!(report.stats.max_ledger_len, DEPTH as usize);
}

// ============================================================================
// Path Explosion Tests
// ============================================================================

#[test]
fn test_sequential_diamonds() {
    // Each diamond doubles the number of paths; arm `b` pushes one byte
    const DIAMONDS: usize = 12;

    let mut source = String::new();
    for i in 0..DIAMONDS {
        source.push_str(&format!(
            "    breq b{i}\n    rjmp j{i}\nb{i}:\n    push r1\nj{i}:\n"
        ));
    }
    source.push_str("    ret\n");

    let report = analyze_image(&assemble(&source).unwrap()).unwrap();
    assert_eq!(report.bound, StackBound::Bounded(DIAMONDS as u64));
    assert!(report.stats.states_explored >= 1 << DIAMONDS);
}

#[test]
fn test_many_balanced_loops() {
    let mut source = String::new();
    for i in 0..300 {
        source.push_str(&format!(
            "l{i}:\n    push r24\n    pop r24\n    sub r24, r1\n    brne l{i}\n"
        ));
    }
    source.push_str("    ret\n");

    let report = analyze_image(&assemble(&source).unwrap()).unwrap();
    assert_eq!(report.bound, StackBound::Bounded(1));
}

#[test]
fn test_unbounded_stops_early() {
    // The growing loop comes first; the long tail is never explored
    let mut source = String::from("top:\n    push r1\n    brne top\n");
    for _ in 0..5_000 {
        source.push_str("    nop\n");
    }
    source.push_str("    ret\n");

    let report = analyze_image(&assemble(&source).unwrap()).unwrap();
    assert_eq!(report.bound, StackBound::Unbounded);
    assert!(report.stats.states_explored < 100);
}
