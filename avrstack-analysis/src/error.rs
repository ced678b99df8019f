//! Analysis error types

use avrstack_decoder::DecoderError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Decode error at word {pc:#06x}: {source}")]
    Decode {
        pc: u32,
        #[source]
        source: DecoderError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
