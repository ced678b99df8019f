//! AVR Instruction Set (stack-relevant subset)
//!
//! Instructions are one or two 16-bit words. Control-transfer operands are
//! stored the way the hardware interprets them:
//! - relative displacements (`k`) are in words, measured from the *following*
//!   instruction
//! - absolute targets are word addresses
//!
//! A `None` target means the decoder could not resolve the destination.

use crate::effect::Effect;
use crate::register::Register;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decoded AVR instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    // ========== Data / ALU ==========
    /// NOP
    Nop,

    /// MOV: rd = rr
    Mov { rd: Register, rr: Register },

    /// ADD: rd = rd + rr
    Add { rd: Register, rr: Register },

    /// SUB: rd = rd - rr
    Sub { rd: Register, rr: Register },

    /// CP: compare rd with rr
    Cp { rd: Register, rr: Register },

    /// CPI: compare rd (r16-r31) with immediate
    Cpi { rd: Register, k: u8 },

    /// LDI: rd (r16-r31) = immediate
    Ldi { rd: Register, k: u8 },

    /// IN: rd = io[a]
    In { rd: Register, a: u8 },

    /// OUT: io[a] = rr
    Out { a: u8, rr: Register },

    /// LDS: rd = data[k] (two words)
    Lds { rd: Register, k: u16 },

    /// STS: data[k] = rr (two words)
    Sts { k: u16, rr: Register },

    /// CLI: clear global interrupt flag
    Cli,

    /// SEI: set global interrupt flag
    Sei,

    /// SLEEP
    Sleep,

    /// WDR: watchdog reset
    Wdr,

    /// Any other single-word instruction; no control or stack effect
    Other(u16),

    // ========== Stack ==========
    /// PUSH: stack <- rr, SP -= 1
    Push { rr: Register },

    /// POP: SP += 1, rd <- stack
    Pop { rd: Register },

    // ========== Skip ==========
    /// CPSE: skip next if rd == rr
    Cpse { rd: Register, rr: Register },

    /// SBRC: skip next if bit b of rr is cleared
    Sbrc { rr: Register, b: u8 },

    /// SBRS: skip next if bit b of rr is set
    Sbrs { rr: Register, b: u8 },

    /// SBIC: skip next if bit b of io[a] is cleared
    Sbic { a: u8, b: u8 },

    /// SBIS: skip next if bit b of io[a] is set
    Sbis { a: u8, b: u8 },

    // ========== Branch ==========
    /// BRBS: if SREG(s) set then PC += k + 1
    Brbs { s: u8, k: Option<i8> },

    /// BRBC: if SREG(s) cleared then PC += k + 1
    Brbc { s: u8, k: Option<i8> },

    // ========== Jump ==========
    /// RJMP: PC += k + 1
    Rjmp { k: Option<i16> },

    /// JMP: PC = k (two words)
    Jmp { k: Option<u32> },

    /// IJMP: PC = Z
    Ijmp,

    /// EIJMP: PC = EIND:Z
    Eijmp,

    // ========== Call ==========
    /// RCALL: push PC + 1, PC += k + 1
    Rcall { k: Option<i16> },

    /// CALL: push PC + 2, PC = k (two words)
    Call { k: Option<u32> },

    /// ICALL: push PC + 1, PC = Z
    Icall,

    /// EICALL: push PC + 1, PC = EIND:Z
    Eicall,

    // ========== Return ==========
    /// RET
    Ret,

    /// RETI: return from interrupt
    Reti,
}

const BRBS_ALIASES: [&str; 8] = ["brcs", "breq", "brmi", "brvs", "brlt", "brhs", "brts", "brie"];
const BRBC_ALIASES: [&str; 8] = ["brcc", "brne", "brpl", "brvc", "brge", "brhc", "brtc", "brid"];

impl Instruction {
    /// Get instruction mnemonic (branches use their flag alias)
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Nop => "nop",
            Instruction::Mov { .. } => "mov",
            Instruction::Add { .. } => "add",
            Instruction::Sub { .. } => "sub",
            Instruction::Cp { .. } => "cp",
            Instruction::Cpi { .. } => "cpi",
            Instruction::Ldi { .. } => "ldi",
            Instruction::In { .. } => "in",
            Instruction::Out { .. } => "out",
            Instruction::Lds { .. } => "lds",
            Instruction::Sts { .. } => "sts",
            Instruction::Cli => "cli",
            Instruction::Sei => "sei",
            Instruction::Sleep => "sleep",
            Instruction::Wdr => "wdr",
            Instruction::Other(_) => ".word",
            Instruction::Push { .. } => "push",
            Instruction::Pop { .. } => "pop",
            Instruction::Cpse { .. } => "cpse",
            Instruction::Sbrc { .. } => "sbrc",
            Instruction::Sbrs { .. } => "sbrs",
            Instruction::Sbic { .. } => "sbic",
            Instruction::Sbis { .. } => "sbis",
            Instruction::Brbs { s, .. } => BRBS_ALIASES[(*s & 7) as usize],
            Instruction::Brbc { s, .. } => BRBC_ALIASES[(*s & 7) as usize],
            Instruction::Rjmp { .. } => "rjmp",
            Instruction::Jmp { .. } => "jmp",
            Instruction::Ijmp => "ijmp",
            Instruction::Eijmp => "eijmp",
            Instruction::Rcall { .. } => "rcall",
            Instruction::Call { .. } => "call",
            Instruction::Icall => "icall",
            Instruction::Eicall => "eicall",
            Instruction::Ret => "ret",
            Instruction::Reti => "reti",
        }
    }

    /// Look up a conditional branch by its alias mnemonic
    pub fn branch_from_alias(mnemonic: &str, k: Option<i8>) -> Option<Self> {
        if let Some(s) = BRBS_ALIASES.iter().position(|m| *m == mnemonic) {
            return Some(Instruction::Brbs { s: s as u8, k });
        }
        BRBC_ALIASES
            .iter()
            .position(|m| *m == mnemonic)
            .map(|s| Instruction::Brbc { s: s as u8, k })
    }

    /// Width in 16-bit words
    pub fn width(&self) -> u32 {
        match self {
            Instruction::Lds { .. }
            | Instruction::Sts { .. }
            | Instruction::Jmp { .. }
            | Instruction::Call { .. } => 2,
            _ => 1,
        }
    }

    /// Classify the instruction by its effect on control flow and stack height
    pub fn effect(&self) -> Effect {
        match self {
            Instruction::Nop
            | Instruction::Mov { .. }
            | Instruction::Add { .. }
            | Instruction::Sub { .. }
            | Instruction::Cp { .. }
            | Instruction::Cpi { .. }
            | Instruction::Ldi { .. }
            | Instruction::In { .. }
            | Instruction::Out { .. }
            | Instruction::Lds { .. }
            | Instruction::Sts { .. }
            | Instruction::Cli
            | Instruction::Sei
            | Instruction::Sleep
            | Instruction::Wdr
            | Instruction::Other(_) => Effect::Next,

            Instruction::Push { .. } => Effect::Push,
            Instruction::Pop { .. } => Effect::Pop,

            Instruction::Cpse { .. }
            | Instruction::Sbrc { .. }
            | Instruction::Sbrs { .. }
            | Instruction::Sbic { .. }
            | Instruction::Sbis { .. } => Effect::Skip,

            Instruction::Brbs { k, .. } | Instruction::Brbc { k, .. } => {
                Effect::Branch(k.map(i32::from))
            }

            Instruction::Rjmp { k } => Effect::RelativeJump(k.map(i32::from)),
            Instruction::Jmp { k } => Effect::AbsoluteJump(*k),
            Instruction::Ijmp | Instruction::Eijmp => Effect::AbsoluteJump(None),

            Instruction::Rcall { k } => Effect::RelativeCall(k.map(i32::from)),
            Instruction::Call { k } => Effect::AbsoluteCall(*k),
            Instruction::Icall | Instruction::Eicall => Effect::AbsoluteCall(None),

            Instruction::Ret | Instruction::Reti => Effect::Return,
        }
    }
}

fn fmt_relative<T: Into<i32>>(f: &mut fmt::Formatter<'_>, k: Option<T>) -> fmt::Result {
    match k {
        // Assembler convention: displacement in bytes from the next instruction
        Some(k) => write!(f, ".{:+}", k.into() * 2),
        None => write!(f, "?"),
    }
}

fn fmt_absolute(f: &mut fmt::Formatter<'_>, k: Option<u32>) -> fmt::Result {
    match k {
        Some(k) => write!(f, "0x{:X}", u64::from(k) * 2),
        None => write!(f, "?"),
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.mnemonic();
        match self {
            Instruction::Mov { rd, rr }
            | Instruction::Add { rd, rr }
            | Instruction::Sub { rd, rr }
            | Instruction::Cp { rd, rr }
            | Instruction::Cpse { rd, rr } => write!(f, "{} {}, {}", m, rd, rr),
            Instruction::Cpi { rd, k } | Instruction::Ldi { rd, k } => {
                write!(f, "{} {}, 0x{:02X}", m, rd, k)
            }
            Instruction::In { rd, a } => write!(f, "{} {}, 0x{:02X}", m, rd, a),
            Instruction::Out { a, rr } => write!(f, "{} 0x{:02X}, {}", m, a, rr),
            Instruction::Lds { rd, k } => write!(f, "{} {}, 0x{:04X}", m, rd, k),
            Instruction::Sts { k, rr } => write!(f, "{} 0x{:04X}, {}", m, k, rr),
            Instruction::Other(word) => write!(f, "{} 0x{:04X}", m, word),
            Instruction::Push { rr } => write!(f, "{} {}", m, rr),
            Instruction::Pop { rd } => write!(f, "{} {}", m, rd),
            Instruction::Sbrc { rr, b } | Instruction::Sbrs { rr, b } => {
                write!(f, "{} {}, {}", m, rr, b)
            }
            Instruction::Sbic { a, b } | Instruction::Sbis { a, b } => {
                write!(f, "{} 0x{:02X}, {}", m, a, b)
            }
            Instruction::Brbs { k, .. } | Instruction::Brbc { k, .. } => {
                write!(f, "{} ", m)?;
                fmt_relative(f, *k)
            }
            Instruction::Rjmp { k } | Instruction::Rcall { k } => {
                write!(f, "{} ", m)?;
                fmt_relative(f, *k)
            }
            Instruction::Jmp { k } | Instruction::Call { k } => {
                write!(f, "{} ", m)?;
                fmt_absolute(f, *k)
            }
            _ => write!(f, "{}", m),
        }
    }
}
