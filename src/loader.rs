//! Program image loading.
//!
//! A program is a sequence of 32-bit words at consecutive word-aligned
//! addresses starting at [`CODE_BASE`]. Two input conventions are accepted
//! and auto-detected from the file content:
//!
//! * ASCII-bits: 32 characters of '0'/'1' per instruction, most significant
//!   bit first, with arbitrary whitespace between instructions.
//! * Binary: 4 bytes per instruction, little-endian.

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Address of the first instruction word
pub const CODE_BASE: u32 = 496;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read program image: {0}")]
    Io(#[from] std::io::Error),
    #[error("binary image length {0} is not a multiple of 4 bytes")]
    TruncatedWord(usize),
    #[error("ascii image holds {0} bits, which is not a multiple of 32")]
    TruncatedBits(usize),
}

/// The program image: words at consecutive word-aligned addresses from
/// `base`. All-zero words are legal placeholders.
#[derive(Debug, Clone)]
pub struct ProgramImage {
    base: u32,
    words: Vec<u32>,
}

fn is_ascii_image(bytes: &[u8]) -> bool {
    !bytes.is_empty()
        && bytes
            .iter()
            .all(|b| *b == b'0' || *b == b'1' || b.is_ascii_whitespace())
}

impl ProgramImage {
    pub fn from_words(words: Vec<u32>, base: u32) -> Self {
        Self { base, words }
    }

    /// Decode raw file content into an image, picking the convention from
    /// the bytes themselves.
    pub fn parse(bytes: &[u8], base: u32) -> Result<Self, LoadError> {
        let words = if is_ascii_image(bytes) {
            let bits: Vec<u8> = bytes
                .iter()
                .copied()
                .filter(|b| *b == b'0' || *b == b'1')
                .collect();
            if bits.len() % 32 != 0 {
                return Err(LoadError::TruncatedBits(bits.len()));
            }
            bits.chunks_exact(32)
                .map(|chunk| {
                    chunk
                        .iter()
                        .fold(0u32, |word, bit| (word << 1) | u32::from(*bit == b'1'))
                })
                .collect()
        } else {
            if bytes.len() % 4 != 0 {
                return Err(LoadError::TruncatedWord(bytes.len()));
            }
            bytes
                .chunks_exact(4)
                .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect()
        };
        Ok(Self { base, words })
    }

    pub fn load(path: impl AsRef<Path>, base: u32) -> Result<Self, LoadError> {
        Self::parse(&fs::read(path)?, base)
    }

    /// The word at a program address, if one exists there.
    pub fn word_at(&self, addr: u32) -> Option<u32> {
        if addr < self.base || (addr - self.base) % 4 != 0 {
            return None;
        }
        self.words.get(((addr - self.base) / 4) as usize).copied()
    }

    /// Iterate (address, word) pairs in program order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.words
            .iter()
            .enumerate()
            .map(|(i, word)| (self.base + 4 * i as u32, *word))
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_binary_little_endian() {
        let image = ProgramImage::parse(&[0x93, 0x00, 0x80, 0x00], CODE_BASE).unwrap();
        assert_eq!(image.len(), 1);
        assert_eq!(image.word_at(CODE_BASE), Some(0x0080_0093));
    }

    #[test]
    fn check_ascii_bits_msb_first() {
        // addi x1, x0, 8 = 0x00800093
        let text = b"00000000100000000000000010010011\n";
        let image = ProgramImage::parse(text, CODE_BASE).unwrap();
        assert_eq!(image.word_at(CODE_BASE), Some(0x0080_0093));
    }

    #[test]
    fn check_ascii_whitespace_between_words() {
        let text = b"00000000000000000000000000010011 \n 00000000000000000000000000000000\n";
        let image = ProgramImage::parse(text, CODE_BASE).unwrap();
        assert_eq!(image.len(), 2);
        assert_eq!(image.word_at(CODE_BASE), Some(0x13));
        assert_eq!(image.word_at(CODE_BASE + 4), Some(0));
    }

    #[test]
    fn check_truncated_inputs() {
        assert!(matches!(
            ProgramImage::parse(b"0101", CODE_BASE),
            Err(LoadError::TruncatedBits(4))
        ));
        assert!(matches!(
            ProgramImage::parse(&[0x93, 0x00, 0x80], CODE_BASE),
            Err(LoadError::TruncatedWord(3))
        ));
    }

    #[test]
    fn check_word_at_addressing() {
        let image = ProgramImage::from_words(vec![1, 2, 3], 496);
        assert_eq!(image.word_at(496), Some(1));
        assert_eq!(image.word_at(504), Some(3));
        assert_eq!(image.word_at(508), None);
        assert_eq!(image.word_at(492), None);
        assert_eq!(image.word_at(498), None);
    }

    #[test]
    fn check_iter_addresses() {
        let image = ProgramImage::from_words(vec![7, 8], 496);
        let pairs: Vec<(u32, u32)> = image.iter().collect();
        assert_eq!(pairs, vec![(496, 7), (500, 8)]);
    }
}
