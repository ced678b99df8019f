//! Instruction encoding to 16-bit AVR words
//!
//! Two-word instructions (lds, sts, jmp, call) produce the opcode word
//! followed by the 16-bit operand word.

use avrstack_isa::{Instruction, Register};
use crate::error::{AssemblerError, Result};

/// Largest word address reachable by jmp/call
pub const MAX_ABSOLUTE: u32 = (1 << 22) - 1;

/// Encode an instruction to its program-memory words
pub fn encode(instr: &Instruction) -> Result<Vec<u16>> {
    let words = match instr {
        // ========== Data / ALU ==========
        Instruction::Nop => vec![0x0000],
        Instruction::Mov { rd, rr } => vec![encode_two_reg(0x2C00, *rd, *rr)],
        Instruction::Add { rd, rr } => vec![encode_two_reg(0x0C00, *rd, *rr)],
        Instruction::Sub { rd, rr } => vec![encode_two_reg(0x1800, *rd, *rr)],
        Instruction::Cp { rd, rr } => vec![encode_two_reg(0x1400, *rd, *rr)],
        Instruction::Cpi { rd, k } => vec![encode_upper_imm(instr, 0x3000, *rd, *k)?],
        Instruction::Ldi { rd, k } => vec![encode_upper_imm(instr, 0xE000, *rd, *k)?],
        Instruction::In { rd, a } => vec![encode_io(instr, 0xB000, *rd, *a)?],
        Instruction::Out { a, rr } => vec![encode_io(instr, 0xB800, *rr, *a)?],
        Instruction::Lds { rd, k } => vec![0x9000 | reg_field(*rd), *k],
        Instruction::Sts { k, rr } => vec![0x9200 | reg_field(*rr), *k],
        Instruction::Cli => vec![0x94F8],
        Instruction::Sei => vec![0x9478],
        Instruction::Sleep => vec![0x9588],
        Instruction::Wdr => vec![0x95A8],
        Instruction::Other(word) => vec![*word],

        // ========== Stack ==========
        Instruction::Push { rr } => vec![0x920F | reg_field(*rr)],
        Instruction::Pop { rd } => vec![0x900F | reg_field(*rd)],

        // ========== Skip ==========
        Instruction::Cpse { rd, rr } => vec![encode_two_reg(0x1000, *rd, *rr)],
        Instruction::Sbrc { rr, b } => vec![encode_reg_bit(instr, 0xFC00, *rr, *b)?],
        Instruction::Sbrs { rr, b } => vec![encode_reg_bit(instr, 0xFE00, *rr, *b)?],
        Instruction::Sbic { a, b } => vec![encode_io_bit(instr, 0x9900, *a, *b)?],
        Instruction::Sbis { a, b } => vec![encode_io_bit(instr, 0x9B00, *a, *b)?],

        // ========== Branch ==========
        Instruction::Brbs { s, k } => vec![encode_branch(instr, 0xF000, *s, *k)?],
        Instruction::Brbc { s, k } => vec![encode_branch(instr, 0xF400, *s, *k)?],

        // ========== Jump / Call ==========
        Instruction::Rjmp { k } => vec![encode_relative_12(instr, 0xC000, *k)?],
        Instruction::Rcall { k } => vec![encode_relative_12(instr, 0xD000, *k)?],
        Instruction::Jmp { k } => encode_absolute_22(instr, 0x940C, *k)?.to_vec(),
        Instruction::Call { k } => encode_absolute_22(instr, 0x940E, *k)?.to_vec(),
        Instruction::Ijmp => vec![0x9409],
        Instruction::Eijmp => vec![0x9419],
        Instruction::Icall => vec![0x9509],
        Instruction::Eicall => vec![0x9519],

        // ========== Return ==========
        Instruction::Ret => vec![0x9508],
        Instruction::Reti => vec![0x9518],
    };
    Ok(words)
}

fn out_of_range(instr: &Instruction, value: i64) -> AssemblerError {
    AssemblerError::OperandOutOfRange {
        mnemonic: instr.mnemonic().to_string(),
        value,
    }
}

/// Register in bits 8..4
fn reg_field(reg: Register) -> u16 {
    (reg.index() as u16) << 4
}

/// rd in bits 8..4, rr split across bit 9 and bits 3..0
fn encode_two_reg(base: u16, rd: Register, rr: Register) -> u16 {
    let rr = rr.index() as u16;
    base | ((rr & 0x10) << 5) | reg_field(rd) | (rr & 0x0F)
}

fn encode_upper_imm(instr: &Instruction, base: u16, rd: Register, k: u8) -> Result<u16> {
    if !rd.is_upper() {
        return Err(AssemblerError::InvalidRegister(format!(
            "{} requires r16-r31, got {}",
            instr.mnemonic(),
            rd
        )));
    }
    let k = u16::from(k);
    let rd = (rd.index() as u16 - 16) << 4;
    Ok(base | ((k & 0xF0) << 4) | rd | (k & 0x0F))
}

fn encode_io(instr: &Instruction, base: u16, reg: Register, a: u8) -> Result<u16> {
    if a > 0x3F {
        return Err(out_of_range(instr, i64::from(a)));
    }
    let a = u16::from(a);
    Ok(base | ((a & 0x30) << 5) | reg_field(reg) | (a & 0x0F))
}

fn encode_reg_bit(instr: &Instruction, base: u16, rr: Register, b: u8) -> Result<u16> {
    if b > 7 {
        return Err(out_of_range(instr, i64::from(b)));
    }
    Ok(base | reg_field(rr) | u16::from(b))
}

fn encode_io_bit(instr: &Instruction, base: u16, a: u8, b: u8) -> Result<u16> {
    if a > 0x1F {
        return Err(out_of_range(instr, i64::from(a)));
    }
    if b > 7 {
        return Err(out_of_range(instr, i64::from(b)));
    }
    Ok(base | (u16::from(a) << 3) | u16::from(b))
}

fn encode_branch(instr: &Instruction, base: u16, s: u8, k: Option<i8>) -> Result<u16> {
    let k = k.ok_or_else(|| AssemblerError::UnresolvedTarget(instr.mnemonic().to_string()))?;
    if s > 7 {
        return Err(out_of_range(instr, i64::from(s)));
    }
    if !(-64..=63).contains(&k) {
        return Err(out_of_range(instr, i64::from(k)));
    }
    Ok(base | (((k as u16) & 0x7F) << 3) | u16::from(s))
}

fn encode_relative_12(instr: &Instruction, base: u16, k: Option<i16>) -> Result<u16> {
    let k = k.ok_or_else(|| AssemblerError::UnresolvedTarget(instr.mnemonic().to_string()))?;
    if !(-2048..=2047).contains(&k) {
        return Err(out_of_range(instr, i64::from(k)));
    }
    Ok(base | ((k as u16) & 0x0FFF))
}

/// k21..17 in bits 8..4, k16 in bit 0, k15..0 in the second word
fn encode_absolute_22(instr: &Instruction, base: u16, k: Option<u32>) -> Result<[u16; 2]> {
    let k = k.ok_or_else(|| AssemblerError::UnresolvedTarget(instr.mnemonic().to_string()))?;
    if k > MAX_ABSOLUTE {
        return Err(out_of_range(instr, i64::from(k)));
    }
    let high = (k >> 16) as u16;
    let first = base | (((high >> 1) & 0x1F) << 4) | (high & 1);
    Ok([first, (k & 0xFFFF) as u16])
}
