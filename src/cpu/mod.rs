//! CPU emulation for picoMIPS.
//!
//! This module implements the complete picoMIPS architecture:
//! - 64 KiB byte-addressed memory with big-endian words
//! - 8 general purpose 16-bit registers, r0-r7
//! - 14 instructions in register, immediate and jump formats

pub mod memory;
pub mod registers;
pub mod alu;
pub mod decode;
pub mod execute;
pub mod machine;

pub use memory::{Memory, MemoryError, MEMORY_SIZE};
pub use registers::{Reg, Registers, REGISTER_COUNT};
pub use alu::AluOp;
pub use decode::{decode, encode, Instruction, Opcode};
pub use execute::{execute, Effect, Fault};
pub use machine::{Machine, MachineStatus, StepHook, StepOutcome, StepRecord};
