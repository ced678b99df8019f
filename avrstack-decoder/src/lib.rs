//! # AVR Decoder
//!
//! Turns flash words into [`Instruction`](avrstack_isa::Instruction) values.
//!
//! The analyzer does not read memory itself; it walks an
//! [`InstructionStream`], which is implemented for raw
//! [`FirmwareImage`](avrstack_isa::FirmwareImage)s (decoded on demand) and
//! for pre-decoded [`Listing`]s.
//!
//! ## Example
//!
//! ```rust
//! use avrstack_isa::{FirmwareImage, Instruction, Register};
//! use avrstack_decoder::{decode, InstructionStream};
//!
//! // push r16; ret
//! let image = FirmwareImage::from_words(&[0x930F, 0x9508]);
//! assert_eq!(decode(&image, 0).unwrap(), Instruction::Push { rr: Register::R16 });
//! assert_eq!(image.decode_at(1).unwrap(), Instruction::Ret);
//! ```

pub mod error;
pub mod decoder;
pub mod stream;
pub mod listing;

pub use error::{DecoderError, Result};
pub use decoder::{decode, decode_word};
pub use stream::InstructionStream;
pub use listing::Listing;
