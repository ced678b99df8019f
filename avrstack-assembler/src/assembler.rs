//! Two-pass assembler: labels are collected first, then every statement is
//! encoded at its word address.

use avrstack_isa::{FirmwareImage, WORD_BYTES};
use crate::encoder::encode;
use crate::error::{AssemblerError, Result};
use crate::parser::{build_instruction, mnemonic_width, parse_source, Line, Operand, Statement, SymbolTable};

/// Assemble source code into a firmware image
pub fn assemble(source: &str) -> Result<FirmwareImage> {
    let lines = parse_source(source)?;
    let symbols = collect_symbols(&lines)?;

    let mut image = FirmwareImage::new();
    let mut pc: u32 = 0;

    for line in &lines {
        for statement in &line.statements {
            emit(&mut image, &mut pc, statement, &symbols).map_err(|e| e.at_line(line.number))?;
        }
    }

    Ok(image)
}

/// First pass: word address of every label
pub fn collect_symbols(lines: &[Line]) -> Result<SymbolTable> {
    let mut symbols = SymbolTable::new();
    let mut pc: u32 = 0;

    for line in lines {
        for statement in &line.statements {
            advance(statement, &mut pc, &mut symbols).map_err(|e| e.at_line(line.number))?;
        }
    }

    Ok(symbols)
}

fn advance(statement: &Statement, pc: &mut u32, symbols: &mut SymbolTable) -> Result<()> {
    match statement {
        Statement::Label(name) => {
            if symbols.insert(name.clone(), *pc).is_some() {
                return Err(AssemblerError::DuplicateLabel(name.clone()));
            }
        }
        Statement::Directive { name, args } => *pc = directive_pc(name, args, *pc)?,
        Statement::Instruction { mnemonic, .. } => *pc += mnemonic_width(mnemonic)?,
    }
    Ok(())
}

fn emit(
    image: &mut FirmwareImage,
    pc: &mut u32,
    statement: &Statement,
    symbols: &SymbolTable,
) -> Result<()> {
    match statement {
        Statement::Label(_) => {}
        Statement::Directive { name, args } if name == "word" => {
            for value in word_values(args)? {
                write_words(image, *pc, &[value]);
                *pc += 1;
            }
        }
        Statement::Directive { name, args } => {
            *pc = directive_pc(name, args, *pc)?;
        }
        Statement::Instruction { mnemonic, operands } => {
            let instr = build_instruction(mnemonic, operands, *pc, symbols)?;
            let words = encode(&instr)?;
            write_words(image, *pc, &words);
            *pc += words.len() as u32;
        }
    }
    Ok(())
}

/// Location counter after a directive
fn directive_pc(name: &str, args: &[Operand], pc: u32) -> Result<u32> {
    match name {
        "word" => Ok(pc + word_values(args)?.len() as u32),
        "org" => match args {
            // Byte address, as in the device datasheets
            [Operand::Number(addr)] if *addr >= 0 && addr % 2 == 0 => u32::try_from(*addr / 2)
                .map_err(|_| AssemblerError::InvalidDirective(format!(".org {}", addr))),
            _ => Err(AssemblerError::InvalidDirective(format!(
                ".org expects one even byte address, got {:?}",
                args
            ))),
        },
        other => Err(AssemblerError::InvalidDirective(format!(".{}", other))),
    }
}

fn word_values(args: &[Operand]) -> Result<Vec<u16>> {
    if args.is_empty() {
        return Err(AssemblerError::InvalidDirective(".word expects a value".to_string()));
    }
    args.iter()
        .map(|arg| match arg {
            Operand::Number(n) if (0..=0xFFFF).contains(n) => Ok(*n as u16),
            other => Err(AssemblerError::InvalidDirective(format!(".word {:?}", other))),
        })
        .collect()
}

fn write_words(image: &mut FirmwareImage, pc: u32, words: &[u16]) {
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    image.write(pc * WORD_BYTES, &bytes);
}
