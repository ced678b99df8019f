//! Assembly parser
//!
//! Numeric control-transfer operands are the encoded field value: a word
//! displacement for relative forms and a word address for absolute forms.
//! Labels are resolved against the symbol table by the caller's `pc`.

use std::collections::HashMap;

use avrstack_isa::{Instruction, Register};
use logos::Logos;
use crate::error::{AssemblerError, Result};
use crate::lexer::Token;

/// Label name -> word address
pub type SymbolTable = HashMap<String, u32>;

/// Instruction or directive operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(Register),
    Number(i64),
    Label(String),
}

/// One parsed statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Label(String),
    Directive { name: String, args: Vec<Operand> },
    Instruction { mnemonic: String, operands: Vec<Operand> },
}

/// Statements of one source line (1-based line number)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub statements: Vec<Statement>,
}

/// Tokenize and parse a whole source file
pub fn parse_source(source: &str) -> Result<Vec<Line>> {
    let mut lines = Vec::new();
    let mut tokens = Vec::new();
    let mut number = 1;
    let mut line_start = 0;

    let mut lex = Token::lexer(source);
    while let Some(token) = lex.next() {
        let span = lex.span();
        match token {
            Ok(Token::Newline) => {
                flush_line(&mut lines, &mut tokens, number)?;
                number += 1;
                line_start = span.end;
            }
            Ok(token) => tokens.push((token, span.start - line_start + 1)),
            Err(()) => {
                return Err(AssemblerError::SyntaxError {
                    line: number,
                    column: span.start - line_start + 1,
                    message: format!("Unexpected input '{}'", lex.slice()),
                });
            }
        }
    }
    flush_line(&mut lines, &mut tokens, number)?;

    Ok(lines)
}

fn flush_line(
    lines: &mut Vec<Line>,
    tokens: &mut Vec<(Token, usize)>,
    number: usize,
) -> Result<()> {
    if tokens.is_empty() {
        return Ok(());
    }
    let statements = parse_line(tokens, number)?;
    tokens.clear();
    lines.push(Line { number, statements });
    Ok(())
}

/// line := (label ':')* [ (mnemonic | directive) operand (',' operand)* ]
fn parse_line(tokens: &[(Token, usize)], line: usize) -> Result<Vec<Statement>> {
    let syntax = |column: usize, message: &str| AssemblerError::SyntaxError {
        line,
        column,
        message: message.to_string(),
    };

    let mut statements = Vec::new();
    let mut rest = tokens;

    while let [(Token::Identifier(name), _), (Token::Colon, _), tail @ ..] = rest {
        statements.push(Statement::Label(name.clone()));
        rest = tail;
    }

    let Some(((head, column), tail)) = rest.split_first() else {
        return Ok(statements);
    };

    let operands = parse_operands(tail, line)?;
    match head {
        Token::Identifier(name) => statements.push(Statement::Instruction {
            mnemonic: name.to_lowercase(),
            operands,
        }),
        Token::Directive(name) => statements.push(Statement::Directive {
            name: name.to_lowercase(),
            args: operands,
        }),
        _ => return Err(syntax(*column, "Expected instruction, directive or label")),
    }

    Ok(statements)
}

fn parse_operands(tokens: &[(Token, usize)], line: usize) -> Result<Vec<Operand>> {
    let mut operands = Vec::new();
    let mut expect_operand = true;

    for (token, column) in tokens {
        let syntax = |message: &str| AssemblerError::SyntaxError {
            line,
            column: *column,
            message: message.to_string(),
        };

        if expect_operand {
            let operand = match token {
                Token::Register(index) => {
                    let reg = Register::from_index(usize::from(*index))
                        .ok_or_else(|| AssemblerError::InvalidRegister(format!("r{}", index)))?;
                    Operand::Register(reg)
                }
                Token::Identifier(name) => Operand::Label(name.clone()),
                other => match other.as_number() {
                    Some(n) => Operand::Number(n),
                    None => return Err(syntax("Expected operand")),
                },
            };
            operands.push(operand);
            expect_operand = false;
        } else if *token == Token::Comma {
            expect_operand = true;
        } else {
            return Err(syntax("Expected ','"));
        }
    }

    if expect_operand && !operands.is_empty() {
        let column = tokens.last().map(|(_, c)| *c).unwrap_or(0);
        return Err(AssemblerError::SyntaxError {
            line,
            column,
            message: "Trailing ','".to_string(),
        });
    }

    Ok(operands)
}

/// Width in words of the instruction a mnemonic assembles to
pub fn mnemonic_width(mnemonic: &str) -> Result<u32> {
    match mnemonic {
        "lds" | "sts" | "jmp" | "call" => Ok(2),
        "nop" | "mov" | "add" | "sub" | "cp" | "cpi" | "ldi" | "in" | "out" | "cli" | "sei"
        | "sleep" | "wdr" | "push" | "pop" | "cpse" | "sbrc" | "sbrs" | "sbic" | "sbis"
        | "brbs" | "brbc" | "rjmp" | "ijmp" | "eijmp" | "rcall" | "icall" | "eicall" | "ret"
        | "reti" => Ok(1),
        m if Instruction::branch_from_alias(m, None).is_some() => Ok(1),
        m => Err(AssemblerError::UnknownInstruction(m.to_string())),
    }
}

/// Parse a single instruction with numeric operands only
pub fn parse_instruction(text: &str) -> Result<Instruction> {
    let lines = parse_source(text)?;
    let statements: Vec<Statement> = lines.into_iter().flat_map(|l| l.statements).collect();
    match statements.as_slice() {
        [Statement::Instruction { mnemonic, operands }] => {
            build_instruction(mnemonic, operands, 0, &SymbolTable::new())
        }
        _ => Err(AssemblerError::SyntaxError {
            line: 1,
            column: 1,
            message: "Expected exactly one instruction".to_string(),
        }),
    }
}

/// Parse a register name such as `r16`
pub fn parse_register(name: &str) -> Result<Register> {
    let name = name.trim().to_lowercase();
    let index = name
        .strip_prefix('r')
        .and_then(|digits| digits.parse::<usize>().ok());
    index
        .and_then(Register::from_index)
        .ok_or(AssemblerError::InvalidRegister(name))
}

/// Build the instruction at word address `pc`
pub fn build_instruction(
    mnemonic: &str,
    operands: &[Operand],
    pc: u32,
    symbols: &SymbolTable,
) -> Result<Instruction> {
    let ops = Operands { mnemonic, operands, pc, symbols };

    let instr = match mnemonic {
        // ========== No operands ==========
        "nop" | "cli" | "sei" | "sleep" | "wdr" | "ijmp" | "eijmp" | "icall" | "eicall"
        | "ret" | "reti" => {
            ops.expect(0)?;
            match mnemonic {
                "nop" => Instruction::Nop,
                "cli" => Instruction::Cli,
                "sei" => Instruction::Sei,
                "sleep" => Instruction::Sleep,
                "wdr" => Instruction::Wdr,
                "ijmp" => Instruction::Ijmp,
                "eijmp" => Instruction::Eijmp,
                "icall" => Instruction::Icall,
                "eicall" => Instruction::Eicall,
                "ret" => Instruction::Ret,
                _ => Instruction::Reti,
            }
        }

        // ========== Two registers ==========
        "mov" | "add" | "sub" | "cp" | "cpse" => {
            ops.expect(2)?;
            let (rd, rr) = (ops.register(0)?, ops.register(1)?);
            match mnemonic {
                "mov" => Instruction::Mov { rd, rr },
                "add" => Instruction::Add { rd, rr },
                "sub" => Instruction::Sub { rd, rr },
                "cp" => Instruction::Cp { rd, rr },
                _ => Instruction::Cpse { rd, rr },
            }
        }

        // ========== Register, immediate ==========
        "ldi" | "cpi" => {
            ops.expect(2)?;
            let rd = ops.register(0)?;
            // Negative bytes are accepted in two's complement
            let k = ops.number(1, -128, 255)? as u8;
            if mnemonic == "ldi" {
                Instruction::Ldi { rd, k }
            } else {
                Instruction::Cpi { rd, k }
            }
        }
        "in" => {
            ops.expect(2)?;
            Instruction::In { rd: ops.register(0)?, a: ops.number(1, 0, 0x3F)? as u8 }
        }
        "out" => {
            ops.expect(2)?;
            Instruction::Out { a: ops.number(0, 0, 0x3F)? as u8, rr: ops.register(1)? }
        }
        "lds" => {
            ops.expect(2)?;
            Instruction::Lds { rd: ops.register(0)?, k: ops.number(1, 0, 0xFFFF)? as u16 }
        }
        "sts" => {
            ops.expect(2)?;
            Instruction::Sts { k: ops.number(0, 0, 0xFFFF)? as u16, rr: ops.register(1)? }
        }

        // ========== Stack ==========
        "push" => {
            ops.expect(1)?;
            Instruction::Push { rr: ops.register(0)? }
        }
        "pop" => {
            ops.expect(1)?;
            Instruction::Pop { rd: ops.register(0)? }
        }

        // ========== Skip ==========
        "sbrc" | "sbrs" => {
            ops.expect(2)?;
            let (rr, b) = (ops.register(0)?, ops.number(1, 0, 7)? as u8);
            if mnemonic == "sbrc" {
                Instruction::Sbrc { rr, b }
            } else {
                Instruction::Sbrs { rr, b }
            }
        }
        "sbic" | "sbis" => {
            ops.expect(2)?;
            let (a, b) = (ops.number(0, 0, 0x1F)? as u8, ops.number(1, 0, 7)? as u8);
            if mnemonic == "sbic" {
                Instruction::Sbic { a, b }
            } else {
                Instruction::Sbis { a, b }
            }
        }

        // ========== Control transfer ==========
        "brbs" | "brbc" => {
            ops.expect(2)?;
            let s = ops.number(0, 0, 7)? as u8;
            let k = Some(ops.relative(1, -64, 63)? as i8);
            if mnemonic == "brbs" {
                Instruction::Brbs { s, k }
            } else {
                Instruction::Brbc { s, k }
            }
        }
        "rjmp" | "rcall" => {
            ops.expect(1)?;
            let k = Some(ops.relative(0, -2048, 2047)? as i16);
            if mnemonic == "rjmp" {
                Instruction::Rjmp { k }
            } else {
                Instruction::Rcall { k }
            }
        }
        "jmp" | "call" => {
            ops.expect(1)?;
            let k = Some(ops.absolute(0)?);
            if mnemonic == "jmp" {
                Instruction::Jmp { k }
            } else {
                Instruction::Call { k }
            }
        }

        alias => {
            if Instruction::branch_from_alias(alias, None).is_none() {
                return Err(AssemblerError::UnknownInstruction(alias.to_string()));
            }
            ops.expect(1)?;
            let k = Some(ops.relative(0, -64, 63)? as i8);
            Instruction::branch_from_alias(alias, k)
                .ok_or_else(|| AssemblerError::UnknownInstruction(alias.to_string()))?
        }
    };

    Ok(instr)
}

struct Operands<'a> {
    mnemonic: &'a str,
    operands: &'a [Operand],
    pc: u32,
    symbols: &'a SymbolTable,
}

impl Operands<'_> {
    fn expect(&self, expected: usize) -> Result<()> {
        if self.operands.len() != expected {
            return Err(AssemblerError::OperandCount {
                mnemonic: self.mnemonic.to_string(),
                expected,
                found: self.operands.len(),
            });
        }
        Ok(())
    }

    fn out_of_range(&self, value: i64) -> AssemblerError {
        AssemblerError::OperandOutOfRange {
            mnemonic: self.mnemonic.to_string(),
            value,
        }
    }

    fn register(&self, index: usize) -> Result<Register> {
        match &self.operands[index] {
            Operand::Register(reg) => Ok(*reg),
            Operand::Number(n) => Err(AssemblerError::InvalidRegister(n.to_string())),
            Operand::Label(name) => Err(AssemblerError::InvalidRegister(name.clone())),
        }
    }

    fn number(&self, index: usize, min: i64, max: i64) -> Result<i64> {
        match &self.operands[index] {
            Operand::Number(n) if (min..=max).contains(n) => Ok(*n),
            Operand::Number(n) => Err(self.out_of_range(*n)),
            Operand::Register(reg) => Err(AssemblerError::InvalidImmediate(reg.to_string())),
            Operand::Label(name) => Err(AssemblerError::InvalidImmediate(name.clone())),
        }
    }

    fn label(&self, name: &str) -> Result<u32> {
        self.symbols
            .get(name)
            .copied()
            .ok_or_else(|| AssemblerError::UndefinedLabel(name.to_string()))
    }

    /// Word displacement from the instruction after `pc`
    fn relative(&self, index: usize, min: i64, max: i64) -> Result<i64> {
        let k = match &self.operands[index] {
            Operand::Number(n) => *n,
            Operand::Label(name) => i64::from(self.label(name)?) - (i64::from(self.pc) + 1),
            Operand::Register(reg) => {
                return Err(AssemblerError::InvalidImmediate(reg.to_string()))
            }
        };
        if !(min..=max).contains(&k) {
            return Err(self.out_of_range(k));
        }
        Ok(k)
    }

    fn absolute(&self, index: usize) -> Result<u32> {
        match &self.operands[index] {
            Operand::Number(n) => u32::try_from(*n)
                .ok()
                .filter(|k| *k <= crate::encoder::MAX_ABSOLUTE)
                .ok_or_else(|| self.out_of_range(*n)),
            Operand::Label(name) => self.label(name),
            Operand::Register(reg) => Err(AssemblerError::InvalidImmediate(reg.to_string())),
        }
    }
}
