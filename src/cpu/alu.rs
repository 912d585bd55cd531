//! Register-type arithmetic and logic.
//!
//! Every operation works on raw 16-bit patterns and wraps modulo 2^16.
//! Division is the only operation that can fail.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Serialize, Deserialize};

use crate::cpu::execute::Fault;

/// ALU operation selected by the function field (bits 2-0) of a
/// register-type instruction.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(TryFromPrimitive, IntoPrimitive)]
pub enum AluOp {
    /// Bitwise AND
    And = 0,
    /// Bitwise OR
    Or = 1,
    /// Wrapping addition
    Add = 2,
    /// Wrapping subtraction
    Sub = 3,
    /// Wrapping multiplication, low 16 bits kept
    Mul = 4,
    /// Signed division, truncating toward zero
    Div = 5,
}

impl AluOp {
    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            AluOp::And => "and",
            AluOp::Or => "or",
            AluOp::Add => "add",
            AluOp::Sub => "sub",
            AluOp::Mul => "mul",
            AluOp::Div => "div",
        }
    }

    /// Apply the operation to `a` (rs) and `b` (rt).
    pub fn apply(self, a: u16, b: u16) -> Result<u16, Fault> {
        let result = match self {
            AluOp::And => a & b,
            AluOp::Or => a | b,
            AluOp::Add => a.wrapping_add(b),
            AluOp::Sub => a.wrapping_sub(b),
            AluOp::Mul => a.wrapping_mul(b),
            AluOp::Div => {
                if b == 0 {
                    return Err(Fault::DivisionByZero);
                }
                // -32768 / -1 wraps back to -32768
                (a as i16).wrapping_div(b as i16) as u16
            }
        };
        Ok(result)
    }
}
