//! picoMIPS register file.
//!
//! Eight 16-bit general purpose registers, r0 through r7. None of them is
//! wired to zero: programs that want an `r0 = 0` convention clear it
//! themselves (the usual opening `sub r0, r0, r0`).

use serde::{Serialize, Deserialize};

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// A register index in the range 0-7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reg(u8);

impl Reg {
    pub const R0: Reg = Reg(0);
    pub const R1: Reg = Reg(1);
    pub const R2: Reg = Reg(2);
    pub const R3: Reg = Reg(3);
    pub const R4: Reg = Reg(4);
    pub const R5: Reg = Reg(5);
    pub const R6: Reg = Reg(6);
    pub const R7: Reg = Reg(7);

    /// All registers in index order.
    pub const ALL: [Reg; REGISTER_COUNT] = [
        Reg::R0, Reg::R1, Reg::R2, Reg::R3,
        Reg::R4, Reg::R5, Reg::R6, Reg::R7,
    ];

    /// Create from an index, if it names a register.
    pub fn new(index: u8) -> Option<Self> {
        (usize::from(index) < REGISTER_COUNT).then_some(Reg(index))
    }

    /// Take the low three bits of an already shifted instruction field.
    #[inline]
    pub fn from_field(bits: u16) -> Self {
        Reg((bits & 0b111) as u8)
    }

    /// The register's index.
    #[inline]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// The register number as a 3-bit instruction field.
    #[inline]
    pub fn bits(self) -> u16 {
        u16::from(self.0)
    }
}

impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// The picoMIPS register file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    values: [u16; REGISTER_COUNT],
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        self.values = [0; REGISTER_COUNT];
    }

    /// Raw 16-bit contents of a register.
    #[inline]
    pub fn get(&self, reg: Reg) -> u16 {
        self.values[reg.index()]
    }

    /// Contents of a register read as a two's complement value.
    #[inline]
    pub fn get_signed(&self, reg: Reg) -> i16 {
        self.values[reg.index()] as i16
    }

    /// Overwrite a register.
    #[inline]
    pub fn set(&mut self, reg: Reg, value: u16) {
        self.values[reg.index()] = value;
    }

    /// A copy of all eight registers, r0 first.
    pub fn snapshot(&self) -> [u16; REGISTER_COUNT] {
        self.values
    }

    /// Iterate over `(register, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Reg, u16)> + '_ {
        Reg::ALL.into_iter().map(move |reg| (reg, self.get(reg)))
    }
}
