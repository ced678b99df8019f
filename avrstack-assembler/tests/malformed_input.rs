//! Tests for malformed input handling in the assembler

use avrstack_assembler::{assemble, AssemblerError};

// ============================================================================
// Invalid Instruction Tests
// ============================================================================

#[test]
fn test_unknown_instruction() {
    let err = assemble("foobar r1, r2").unwrap_err();
    assert_eq!(err.root(), &AssemblerError::UnknownInstruction("foobar".to_string()));
}

#[test]
fn test_error_reports_line() {
    let err = assemble("nop\nnop\npush").unwrap_err();
    assert!(matches!(err, AssemblerError::AtLine { line: 3, .. }));
    assert!(err.to_string().starts_with("line 3:"));
}

#[test]
fn test_blank_lines_are_fine() {
    let source = r#"

        ret

    "#;
    assert!(assemble(source).is_ok());
}

// ============================================================================
// Operand Tests
// ============================================================================

#[test]
fn test_missing_operand() {
    let err = assemble("mov r1").unwrap_err();
    assert!(matches!(
        err.root(),
        AssemblerError::OperandCount { expected: 2, found: 1, .. }
    ));
}

#[test]
fn test_extra_operand() {
    let err = assemble("push r1, r2").unwrap_err();
    assert!(matches!(err.root(), AssemblerError::OperandCount { .. }));
}

#[test]
fn test_register_out_of_range() {
    let err = assemble("push r32").unwrap_err();
    assert!(matches!(err.root(), AssemblerError::InvalidRegister(_)));
}

#[test]
fn test_immediate_needs_upper_register() {
    let err = assemble("ldi r4, 1").unwrap_err();
    assert!(matches!(err.root(), AssemblerError::InvalidRegister(_)));
}

#[test]
fn test_label_as_immediate() {
    let err = assemble("x: ldi r16, x").unwrap_err();
    assert!(matches!(err.root(), AssemblerError::InvalidImmediate(_)));
}

// ============================================================================
// Label Tests
// ============================================================================

#[test]
fn test_undefined_label() {
    let err = assemble("rjmp nowhere").unwrap_err();
    assert_eq!(err.root(), &AssemblerError::UndefinedLabel("nowhere".to_string()));
}

#[test]
fn test_branch_target_too_far() {
    let mut source = String::from("breq far\n");
    for _ in 0..100 {
        source.push_str("nop\n");
    }
    source.push_str("far: ret\n");
    let err = assemble(&source).unwrap_err();
    assert!(matches!(
        err.root(),
        AssemblerError::OperandOutOfRange { value: 100, .. }
    ));
}

// ============================================================================
// Syntax Tests
// ============================================================================

#[test]
fn test_unexpected_character() {
    let err = assemble("push r1\npop @r1").unwrap_err();
    assert!(matches!(err, AssemblerError::SyntaxError { line: 2, column: 5, .. }));
}

#[test]
fn test_unknown_directive() {
    let err = assemble(".section text").unwrap_err();
    assert!(matches!(err.root(), AssemblerError::InvalidDirective(_)));
}
