//! Program images and loading them into memory.
//!
//! A picoMIPS program is two segments: data words and code words, each
//! placed at its own base address. Loading clears memory, writes both
//! segments and reports the code base as the entry point.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::cpu::{Memory, MemoryError};

/// An ordered run of words starting at `base`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub base: u16,
    pub words: Vec<u16>,
}

impl Segment {
    pub fn new(base: u16, words: Vec<u16>) -> Self {
        Self { base, words }
    }

    /// Byte range covered by the segment.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.base as usize;
        start..start + self.words.len() * 2
    }

    fn overlaps(&self, other: &Segment) -> bool {
        let (a, b) = (self.range(), other.range());
        a.start < b.end && b.start < a.end
    }
}

/// A complete program: data plus code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramImage {
    pub name: String,
    pub description: String,
    pub data: Segment,
    pub code: Segment,
}

/// Where a program ended up in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedProgram {
    /// Initial program counter.
    pub entry: u16,
    pub data: std::ops::Range<usize>,
    pub code: std::ops::Range<usize>,
}

/// Load `image` into `mem`.
///
/// Memory is zeroed first, so nothing from a previous run survives.
pub fn load(mem: &mut Memory, image: &ProgramImage) -> Result<LoadedProgram, LoadError> {
    if image.code.words.is_empty() {
        return Err(LoadError::EmptyCode);
    }
    if image.data.overlaps(&image.code) {
        return Err(LoadError::Overlap {
            data: image.data.range(),
            code: image.code.range(),
        });
    }

    mem.clear();
    let data_end = mem.write_words(image.data.base, &image.data.words)?;
    let code_end = mem.write_words(image.code.base, &image.code.words)?;

    Ok(LoadedProgram {
        entry: image.code.base,
        data: image.data.base as usize..data_end,
        code: image.code.base as usize..code_end,
    })
}

/// Errors that can occur while loading a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("program has no code")]
    EmptyCode,

    #[error("data segment {data:#06x?} overlaps code segment {code:#06x?}")]
    Overlap {
        data: std::ops::Range<usize>,
        code: std::ops::Range<usize>,
    },

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(data: Segment, code: Segment) -> ProgramImage {
        ProgramImage {
            name: "test".into(),
            description: String::new(),
            data,
            code,
        }
    }

    #[test]
    fn test_load_places_segments() {
        let mut mem = Memory::new();
        let img = image(
            Segment::new(0x0100, vec![0xFFF6, 0x0014, 0x0000]),
            Segment::new(0x0200, vec![0x0003, 0xF000]),
        );

        let loaded = load(&mut mem, &img).unwrap();

        assert_eq!(loaded.entry, 0x0200);
        assert_eq!(loaded.data, 0x0100..0x0106);
        assert_eq!(loaded.code, 0x0200..0x0204);
        assert_eq!(mem.read_word(0x0100).unwrap(), 0xFFF6);
        assert_eq!(mem.read_word(0x0202).unwrap(), 0xF000);
    }

    #[test]
    fn test_load_clears_previous_contents() {
        let mut mem = Memory::new();
        mem.write_word(0x4000, 0xDEAD).unwrap();

        let img = image(Segment::new(0x0100, Vec::new()), Segment::new(0x0200, vec![0xF000]));
        load(&mut mem, &img).unwrap();

        assert_eq!(mem.read_word(0x4000).unwrap(), 0);
    }

    #[test]
    fn test_load_rejects_overlap() {
        let mut mem = Memory::new();
        let img = image(
            Segment::new(0x0100, vec![1, 2, 3]),
            Segment::new(0x0104, vec![0xF000]),
        );

        assert!(matches!(load(&mut mem, &img), Err(LoadError::Overlap { .. })));
    }

    #[test]
    fn test_load_rejects_empty_code() {
        let mut mem = Memory::new();
        let img = image(Segment::new(0x0100, vec![1]), Segment::new(0x0200, Vec::new()));

        assert_eq!(load(&mut mem, &img), Err(LoadError::EmptyCode));
    }

    #[test]
    fn test_load_rejects_segment_past_end() {
        let mut mem = Memory::new();
        let img = image(Segment::new(0x0100, Vec::new()), Segment::new(0xFFFE, vec![0x0003, 0xF000]));

        assert_eq!(
            load(&mut mem, &img),
            Err(LoadError::Memory(MemoryError::BlockOutOfRange { start: 0xFFFE, len: 2 }))
        );
    }
}
