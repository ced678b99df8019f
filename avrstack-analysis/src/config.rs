//! Analysis configuration

use crate::error::{AnalysisError, Result};

/// Bytes pushed by call/rcall on devices with up to 128 KiB of flash
pub const DEFAULT_RETURN_ADDRESS_BYTES: u8 = 2;

/// Largest return address any AVR core pushes
pub const MAX_RETURN_ADDRESS_BYTES: u8 = 4;

/// Analysis configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Word address where exploration starts
    pub entry_point: u32,

    /// Bytes a call adds to the stack height of the callee
    ///
    /// Three on devices with a 22-bit program counter.
    pub return_address_bytes: u8,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            entry_point: 0,
            return_address_bytes: DEFAULT_RETURN_ADDRESS_BYTES,
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry_point(mut self, entry_point: u32) -> Self {
        self.entry_point = entry_point;
        self
    }

    pub fn with_return_address_bytes(mut self, bytes: u8) -> Self {
        self.return_address_bytes = bytes;
        self
    }

    /// Height added on a call edge
    pub fn call_cost(&self) -> i64 {
        i64::from(self.return_address_bytes)
    }

    pub fn validate(&self) -> Result<()> {
        if self.return_address_bytes == 0 || self.return_address_bytes > MAX_RETURN_ADDRESS_BYTES {
            return Err(AnalysisError::InvalidConfig(format!(
                "return address size must be 1-{} bytes, got {}",
                MAX_RETURN_ADDRESS_BYTES, self.return_address_bytes
            )));
        }
        Ok(())
    }
}
