//! Assembler errors

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssemblerError {
    #[error("Syntax error at line {line}, column {column}: {message}")]
    SyntaxError {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Unknown instruction: {0}")]
    UnknownInstruction(String),

    #[error("Invalid register: {0}")]
    InvalidRegister(String),

    #[error("Invalid immediate value: {0}")]
    InvalidImmediate(String),

    #[error("Wrong operand count for {mnemonic}: expected {expected}, found {found}")]
    OperandCount {
        mnemonic: String,
        expected: usize,
        found: usize,
    },

    #[error("Operand {value} out of range for {mnemonic}")]
    OperandOutOfRange { mnemonic: String, value: i64 },

    #[error("Unresolved target in {0}")]
    UnresolvedTarget(String),

    #[error("Undefined label: {0}")]
    UndefinedLabel(String),

    #[error("Duplicate label: {0}")]
    DuplicateLabel(String),

    #[error("Invalid directive: {0}")]
    InvalidDirective(String),

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<AssemblerError>,
    },
}

impl AssemblerError {
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            AssemblerError::SyntaxError { .. } | AssemblerError::AtLine { .. } => self,
            other => AssemblerError::AtLine {
                line,
                source: Box::new(other),
            },
        }
    }

    /// The error without its line context
    pub fn root(&self) -> &AssemblerError {
        match self {
            AssemblerError::AtLine { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssemblerError>;
