//! Pre-decoded instruction listing
//!
//! Lays instructions out at consecutive word addresses, two-word
//! instructions occupying two slots. Useful when instructions come from a
//! source other than raw flash, or when an image is decoded once and
//! analysed repeatedly.

use avrstack_isa::{FirmwareImage, Instruction};
use crate::decoder::decode;
use crate::error::{DecoderError, Result};
use crate::stream::InstructionStream;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// One entry per word; `None` marks the second word of a wide instruction
    slots: Vec<Option<Instruction>>,
}

impl Listing {
    pub fn new(instructions: impl IntoIterator<Item = Instruction>) -> Self {
        let mut slots = Vec::new();
        for instr in instructions {
            slots.push(Some(instr));
            for _ in 1..instr.width() {
                slots.push(None);
            }
        }
        Self { slots }
    }

    /// Linear sweep over an image from address 0
    pub fn decode_image(image: &FirmwareImage) -> Result<Self> {
        let mut instructions = Vec::new();
        let mut pc = 0;
        while pc < image.len_words() {
            let instr = decode(image, pc)?;
            pc += instr.width();
            instructions.push(instr);
        }
        debug!(
            words = image.len_words(),
            instructions = instructions.len(),
            "decoded listing"
        );
        Ok(Self::new(instructions))
    }

    /// Word address of every instruction, in layout order
    pub fn instructions(&self) -> impl Iterator<Item = (u32, Instruction)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(pc, slot)| slot.map(|instr| (pc as u32, instr)))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl InstructionStream for Listing {
    fn len_words(&self) -> u32 {
        self.slots.len() as u32
    }

    fn decode_at(&self, pc: u32) -> Result<Instruction> {
        match self.slots.get(pc as usize) {
            Some(Some(instr)) => Ok(*instr),
            Some(None) => Err(DecoderError::MidInstruction { pc }),
            None => Err(DecoderError::PcOutOfRange {
                pc,
                len: self.len_words(),
            }),
        }
    }
}
