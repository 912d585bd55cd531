//! picoMIPS memory subsystem.
//!
//! A flat 64 KiB byte store. Words are two consecutive bytes stored
//! big-endian: the high byte lives at `addr`, the low byte at `addr + 1`.
//! Word accesses need not be aligned; an odd address simply straddles
//! two neighbouring words.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of bytes in picoMIPS memory.
pub const MEMORY_SIZE: usize = 0x1_0000;

/// picoMIPS memory: 65536 bytes.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    /// Create a new memory with all bytes zeroed.
    pub fn new() -> Self {
        Self {
            bytes: vec![0; MEMORY_SIZE],
        }
    }

    /// Size of the memory in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Read a single byte. Every `u16` address is in range.
    #[inline]
    pub fn read_byte(&self, addr: u16) -> u8 {
        self.bytes[addr as usize]
    }

    /// Write a single byte.
    #[inline]
    pub fn write_byte(&mut self, addr: u16, value: u8) {
        self.bytes[addr as usize] = value;
    }

    /// Read the big-endian word at `addr`.
    pub fn read_word(&self, addr: u16) -> Result<u16, MemoryError> {
        let index = self.word_index(addr)?;
        Ok(u16::from_be_bytes([self.bytes[index], self.bytes[index + 1]]))
    }

    /// Write `value` as a big-endian word at `addr`.
    pub fn write_word(&mut self, addr: u16, value: u16) -> Result<(), MemoryError> {
        let index = self.word_index(addr)?;
        let [high, low] = value.to_be_bytes();
        self.bytes[index] = high;
        self.bytes[index + 1] = low;
        Ok(())
    }

    /// Write consecutive words starting at `addr`.
    ///
    /// Returns the address one past the last byte written. Nothing is
    /// written if the block does not fit.
    pub fn write_words(&mut self, addr: u16, words: &[u16]) -> Result<usize, MemoryError> {
        let start = addr as usize;
        let end = start + words.len() * 2;
        if end > self.size() {
            return Err(MemoryError::BlockOutOfRange {
                start,
                len: words.len(),
            });
        }

        for (i, &word) in words.iter().enumerate() {
            let [high, low] = word.to_be_bytes();
            self.bytes[start + 2 * i] = high;
            self.bytes[start + 2 * i + 1] = low;
        }

        Ok(end)
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// Words in `start..end`, stepping by two bytes.
    ///
    /// The range is clamped so that no word crosses the end of memory.
    pub fn dump(&self, start: usize, end: usize) -> Vec<(usize, u16)> {
        let end = end.min(self.size() - 1);
        (start..end)
            .step_by(2)
            .map(|i| (i, u16::from_be_bytes([self.bytes[i], self.bytes[i + 1]])))
            .collect()
    }

    fn word_index(&self, addr: u16) -> Result<usize, MemoryError> {
        let index = addr as usize;
        if index + 1 >= self.size() {
            return Err(MemoryError::AddressOutOfRange(addr));
        }
        Ok(index)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero bytes
        let non_zero = self.bytes.iter().filter(|&&b| b != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_bytes", &non_zero)
            .field("total_bytes", &self.size())
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum MemoryError {
    /// A word access whose second byte falls outside memory.
    #[error("word address {0:#06x} out of range")]
    AddressOutOfRange(u16),

    /// A block of words that does not fit in memory.
    #[error("{len} words at {start:#06x} run past the end of memory")]
    BlockOutOfRange { start: usize, len: usize },
}
