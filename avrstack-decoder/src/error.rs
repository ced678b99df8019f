//! Decoder errors

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecoderError {
    #[error("Program counter 0x{pc:X} outside image of {len} words")]
    PcOutOfRange { pc: u32, len: u32 },

    #[error("Two-word instruction 0x{0:04X} truncated by end of image")]
    Truncated(u16),

    #[error("Reserved instruction encoding: 0x{0:04X}")]
    Reserved(u16),

    #[error("No instruction starts at 0x{pc:X}")]
    MidInstruction { pc: u32 },
}

pub type Result<T> = std::result::Result<T, DecoderError>;
