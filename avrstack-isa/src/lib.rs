//! # AVR Instruction Model
//!
//! Core types shared by the decoder, assembler and stack analyzer.
//!
//! ## Key Features
//! - 16-bit instruction words, program counter counted in words
//! - Closed [`Instruction`] enum covering the control-flow and stack
//!   instructions of the AVR core, plus a catch-all for everything else
//! - [`Effect`] classification used by the analyzer's dispatch
//! - Flat [`FirmwareImage`] populated from Intel HEX records

pub mod register;
pub mod instruction;
pub mod effect;
pub mod image;
pub mod ihex;
pub mod error;

pub use register::{Register, NUM_REGISTERS};
pub use instruction::Instruction;
pub use effect::Effect;
pub use image::FirmwareImage;
pub use error::{IsaError, Result};

/// Width of one instruction word in bytes
pub const WORD_BYTES: u32 = 2;

/// Value read from flash locations that were never programmed
pub const ERASED_BYTE: u8 = 0xFF;

/// Flash size addressable by a 22-bit word program counter
pub const MAX_FLASH_BYTES: u32 = 1 << 23;
