//! Error types for image loading

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IsaError {
    #[error("Malformed Intel HEX record at line {line}")]
    MalformedRecord { line: usize },

    #[error("Byte count mismatch at line {line}: expected {expected} bytes, found {found} bytes")]
    ByteCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Checksum mismatch at line {line}: expected {expected:#04x}, found {found:#04x}")]
    ChecksumMismatch { line: usize, expected: u8, found: u8 },

    #[error("Unknown record type {kind:#04x} at line {line}")]
    UnknownRecordType { line: usize, kind: u8 },

    #[error("Data at line {line} ends at {end:#x}, beyond addressable flash")]
    AddressOutOfRange { line: usize, end: u64 },

    #[error("Missing end-of-file record")]
    MissingEndOfFile,
}

pub type Result<T> = std::result::Result<T, IsaError>;
