//! Flat firmware memory
//!
//! Program flash as a byte buffer. Instruction words are little-endian and
//! addressed in words, so word `pc` occupies bytes `2*pc` and `2*pc + 1`.

use crate::{ERASED_BYTE, WORD_BYTES};
use sha2::{Digest, Sha256};
use std::fmt;

/// Byte-addressable firmware image that grows on write
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FirmwareImage {
    bytes: Vec<u8>,
}

impl FirmwareImage {
    /// Create an empty image
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap raw flash contents
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Build an image from instruction words laid out from address 0
    pub fn from_words(words: &[u16]) -> Self {
        let bytes = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        Self { bytes }
    }

    /// Write `data` at byte address `addr`, growing the image as needed.
    /// Bytes between the old end and `addr` read as erased flash.
    pub fn write(&mut self, addr: u32, data: &[u8]) {
        let start = addr as usize;
        let end = start + data.len();
        if self.bytes.len() < end {
            self.bytes.resize(end, ERASED_BYTE);
        }
        self.bytes[start..end].copy_from_slice(data);
    }

    /// Size in bytes
    #[inline]
    pub fn len_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Size in instruction words (a trailing odd byte counts as a word)
    #[inline]
    pub fn len_words(&self) -> u32 {
        self.bytes.len().div_ceil(WORD_BYTES as usize) as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read the instruction word at word address `pc`
    pub fn read_word(&self, pc: u32) -> Option<u16> {
        let lo = *self.bytes.get(pc as usize * 2)?;
        let hi = self
            .bytes
            .get(pc as usize * 2 + 1)
            .copied()
            .unwrap_or(ERASED_BYTE);
        Some(u16::from_le_bytes([lo, hi]))
    }

    /// Raw image bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// SHA-256 of the image contents
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hasher.finalize().into()
    }

    /// SHA-256 of the image contents as lowercase hex
    pub fn digest_hex(&self) -> String {
        self.digest().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for FirmwareImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirmwareImage")
            .field("len_bytes", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_words_little_endian() {
        let image = FirmwareImage::from_words(&[0x9508, 0x920F]);
        assert_eq!(image.as_bytes(), &[0x08, 0x95, 0x0F, 0x92]);
        assert_eq!(image.len_words(), 2);
        assert_eq!(image.read_word(0), Some(0x9508));
        assert_eq!(image.read_word(1), Some(0x920F));
        assert_eq!(image.read_word(2), None);
    }

    #[test]
    fn test_write_grows_with_erased_fill() {
        let mut image = FirmwareImage::new();
        image.write(4, &[0x08, 0x95]);
        assert_eq!(image.len_bytes(), 6);
        assert_eq!(image.read_word(0), Some(0xFFFF));
        assert_eq!(image.read_word(2), Some(0x9508));
    }

    #[test]
    fn test_odd_length_pads_high_byte() {
        let image = FirmwareImage::from_bytes(vec![0x00, 0x00, 0x08]);
        assert_eq!(image.len_words(), 2);
        assert_eq!(image.read_word(1), Some(0xFF08));
    }

    #[test]
    fn test_digest_is_stable() {
        let a = FirmwareImage::from_words(&[0x0000, 0x9508]);
        let b = FirmwareImage::from_words(&[0x0000, 0x9508]);
        let c = FirmwareImage::from_words(&[0x9508]);
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest_hex().len(), 64);
    }

    #[test]
    fn test_empty_digest() {
        // SHA-256 of the empty string
        assert_eq!(
            FirmwareImage::new().digest_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
