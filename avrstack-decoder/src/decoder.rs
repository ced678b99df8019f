//! Instruction decoder

use avrstack_isa::{FirmwareImage, Instruction, Register};
use crate::error::{DecoderError, Result};
use tracing::trace;

/// Decode the instruction at word address `pc`
pub fn decode(image: &FirmwareImage, pc: u32) -> Result<Instruction> {
    let word = image.read_word(pc).ok_or(DecoderError::PcOutOfRange {
        pc,
        len: image.len_words(),
    })?;
    decode_word(word, image.read_word(pc + 1))
}

/// Decode one instruction word; `next` is the following word, consumed only
/// by two-word instructions
pub fn decode_word(word: u16, next: Option<u16>) -> Result<Instruction> {
    match word {
        0x0000 => return Ok(Instruction::Nop),
        0x9409 => return Ok(Instruction::Ijmp),
        0x9419 => return Ok(Instruction::Eijmp),
        0x9509 => return Ok(Instruction::Icall),
        0x9519 => return Ok(Instruction::Eicall),
        0x9508 => return Ok(Instruction::Ret),
        0x9518 => return Ok(Instruction::Reti),
        0x94F8 => return Ok(Instruction::Cli),
        0x9478 => return Ok(Instruction::Sei),
        0x9588 => return Ok(Instruction::Sleep),
        0x95A8 => return Ok(Instruction::Wdr),
        _ => {}
    }

    match word & 0xF000 {
        0xC000 => return Ok(Instruction::Rjmp { k: Some(relative_12(word)) }),
        0xD000 => return Ok(Instruction::Rcall { k: Some(relative_12(word)) }),
        0x3000 => {
            return Ok(Instruction::Cpi { rd: upper_rd(word), k: immediate_8(word) });
        }
        0xE000 => {
            return Ok(Instruction::Ldi { rd: upper_rd(word), k: immediate_8(word) });
        }
        0xF000 => return decode_bit_ops(word),
        _ => {}
    }

    match word & 0xFC00 {
        0x0C00 => return Ok(Instruction::Add { rd: rd5(word), rr: rr5(word) }),
        0x1800 => return Ok(Instruction::Sub { rd: rd5(word), rr: rr5(word) }),
        0x1400 => return Ok(Instruction::Cp { rd: rd5(word), rr: rr5(word) }),
        0x1000 => return Ok(Instruction::Cpse { rd: rd5(word), rr: rr5(word) }),
        0x2C00 => return Ok(Instruction::Mov { rd: rd5(word), rr: rr5(word) }),
        _ => {}
    }

    match word & 0xFE0F {
        0x920F => return Ok(Instruction::Push { rr: rd5(word) }),
        0x900F => return Ok(Instruction::Pop { rd: rd5(word) }),
        0x9000 => {
            let k = next.ok_or(DecoderError::Truncated(word))?;
            return Ok(Instruction::Lds { rd: rd5(word), k });
        }
        0x9200 => {
            let k = next.ok_or(DecoderError::Truncated(word))?;
            return Ok(Instruction::Sts { k, rr: rd5(word) });
        }
        _ => {}
    }

    match word & 0xFE0E {
        0x940C => return Ok(Instruction::Jmp { k: Some(absolute_22(word, next)?) }),
        0x940E => return Ok(Instruction::Call { k: Some(absolute_22(word, next)?) }),
        _ => {}
    }

    match word & 0xFF00 {
        0x9900 => return Ok(Instruction::Sbic { a: io_5(word), b: bit(word) }),
        0x9B00 => return Ok(Instruction::Sbis { a: io_5(word), b: bit(word) }),
        _ => {}
    }

    match word & 0xF800 {
        0xB000 => return Ok(Instruction::In { rd: rd5(word), a: io_6(word) }),
        0xB800 => return Ok(Instruction::Out { a: io_6(word), rr: rd5(word) }),
        _ => {}
    }

    trace!(word = format_args!("{:#06x}", word), "no stack or control effect modelled");
    Ok(Instruction::Other(word))
}

/// 0xF000-0xFFFF: conditional branches, skips on register bits, bld/bst
fn decode_bit_ops(word: u16) -> Result<Instruction> {
    match word & 0xFC00 {
        0xF000 => Ok(Instruction::Brbs { s: bit(word), k: Some(relative_7(word)) }),
        0xF400 => Ok(Instruction::Brbc { s: bit(word), k: Some(relative_7(word)) }),
        0xFC00 if word & 0x0008 != 0 => Err(DecoderError::Reserved(word)),
        0xFC00 => match word & 0x0200 {
            0 => Ok(Instruction::Sbrc { rr: rd5(word), b: bit(word) }),
            _ => Ok(Instruction::Sbrs { rr: rd5(word), b: bit(word) }),
        },
        // bld / bst
        _ => Ok(Instruction::Other(word)),
    }
}

/// 5-bit register in bits 8..4
fn rd5(word: u16) -> Register {
    register((word >> 4) & 0x1F)
}

/// 5-bit register split across bit 9 and bits 3..0
fn rr5(word: u16) -> Register {
    register((word & 0x0F) | ((word >> 5) & 0x10))
}

/// Register r16-r31 in bits 7..4
fn upper_rd(word: u16) -> Register {
    register(16 + ((word >> 4) & 0x0F))
}

fn register(index: u16) -> Register {
    // Every caller masks to five bits
    Register::from_index(index as usize).unwrap_or(Register::R0)
}

fn immediate_8(word: u16) -> u8 {
    (((word >> 4) & 0xF0) | (word & 0x0F)) as u8
}

fn bit(word: u16) -> u8 {
    (word & 0x07) as u8
}

fn io_5(word: u16) -> u8 {
    ((word >> 3) & 0x1F) as u8
}

fn io_6(word: u16) -> u8 {
    (((word >> 5) & 0x30) | (word & 0x0F)) as u8
}

/// Sign-extended 12-bit displacement of rjmp/rcall
fn relative_12(word: u16) -> i16 {
    ((word << 4) as i16) >> 4
}

/// Sign-extended 7-bit displacement in bits 9..3 of brbs/brbc
fn relative_7(word: u16) -> i8 {
    let raw = ((word >> 3) & 0x7F) as u8;
    ((raw << 1) as i8) >> 1
}

/// 22-bit word address of jmp/call: k21..17 in bits 8..4, k16 in bit 0,
/// k15..0 in the second word
fn absolute_22(word: u16, next: Option<u16>) -> Result<u32> {
    let low = next.ok_or(DecoderError::Truncated(word))?;
    let high = (u32::from((word >> 4) & 0x1F) << 1) | u32::from(word & 1);
    Ok((high << 16) | u32::from(low))
}
