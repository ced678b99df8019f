//! Instruction stream seam between memory and the analyzer

use avrstack_isa::{FirmwareImage, Instruction};
use crate::decoder::decode;
use crate::error::Result;

/// A source of decoded instructions addressed by word
pub trait InstructionStream {
    /// Number of addressable words; a pc at or past this is off the end
    fn len_words(&self) -> u32;

    /// Decode the instruction starting at `pc`
    fn decode_at(&self, pc: u32) -> Result<Instruction>;
}

impl InstructionStream for FirmwareImage {
    fn len_words(&self) -> u32 {
        FirmwareImage::len_words(self)
    }

    fn decode_at(&self, pc: u32) -> Result<Instruction> {
        decode(self, pc)
    }
}

impl<S: InstructionStream + ?Sized> InstructionStream for &S {
    fn len_words(&self) -> u32 {
        (**self).len_words()
    }

    fn decode_at(&self, pc: u32) -> Result<Instruction> {
        (**self).decode_at(pc)
    }
}
