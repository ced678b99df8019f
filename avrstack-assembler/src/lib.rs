//! AVR Assembler
//!
//! Assemble the stack-relevant AVR subset into a firmware image. Used to
//! build analyzer test programs without an external toolchain.
//!
//! ## Example
//!
//! ```rust
//! use avrstack_assembler::assemble;
//!
//! let source = r#"
//!     push r16
//!     pop r16
//!     ret
//! "#;
//!
//! let image = assemble(source).unwrap();
//! assert_eq!(image.len_words(), 3);
//! ```

pub mod error;
pub mod lexer;
pub mod parser;
pub mod encoder;
pub mod assembler;

pub use error::{AssemblerError, Result};
pub use assembler::assemble;
pub use parser::{parse_instruction, parse_register};
pub use encoder::encode;
