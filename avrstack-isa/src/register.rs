//! General purpose register file (r0-r31)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of registers
pub const NUM_REGISTERS: usize = 32;

/// Register (r0-r31)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Register {
    R0 = 0,   // tmp register used by avr-gcc
    R1 = 1,   // zero register used by avr-gcc
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
    R8 = 8,
    R9 = 9,
    R10 = 10,
    R11 = 11,
    R12 = 12,
    R13 = 13,
    R14 = 14,
    R15 = 15,
    R16 = 16, // first register usable with immediates
    R17 = 17,
    R18 = 18,
    R19 = 19,
    R20 = 20,
    R21 = 21,
    R22 = 22,
    R23 = 23,
    R24 = 24,
    R25 = 25,
    R26 = 26, // X low
    R27 = 27, // X high
    R28 = 28, // Y low (frame pointer)
    R29 = 29, // Y high
    R30 = 30, // Z low
    R31 = 31, // Z high
}

const ALL: [Register; NUM_REGISTERS] = [
    Register::R0, Register::R1, Register::R2, Register::R3,
    Register::R4, Register::R5, Register::R6, Register::R7,
    Register::R8, Register::R9, Register::R10, Register::R11,
    Register::R12, Register::R13, Register::R14, Register::R15,
    Register::R16, Register::R17, Register::R18, Register::R19,
    Register::R20, Register::R21, Register::R22, Register::R23,
    Register::R24, Register::R25, Register::R26, Register::R27,
    Register::R28, Register::R29, Register::R30, Register::R31,
];

impl Register {
    pub const TMP: Self = Self::R0;
    pub const ZERO: Self = Self::R1;
    pub const XL: Self = Self::R26;
    pub const XH: Self = Self::R27;
    pub const YL: Self = Self::R28;
    pub const YH: Self = Self::R29;
    pub const ZL: Self = Self::R30;
    pub const ZH: Self = Self::R31;

    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        ALL.get(index).copied()
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Registers r16-r31 are the only ones addressable by `ldi`/`cpi`
    #[inline]
    pub fn is_upper(self) -> bool {
        self.index() >= 16
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.index())
    }
}
