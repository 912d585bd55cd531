//! # picoMIPS Simulator
//!
//! An instruction-set simulator for picoMIPS, a small 16-bit teaching
//! architecture with eight general purpose registers, 64 KiB of
//! byte-addressed memory and fourteen instructions.
//!
//! The [`cpu`] module is the machine itself. Loading programs, tracing,
//! step limits and interactive pacing are layered on top of it and never
//! run inside the fetch-decode-execute loop.

pub mod cpu;
pub mod loader;
pub mod programs;
pub mod trace;
pub mod host;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use cpu::{Machine, MachineStatus, StepOutcome, Fault, Memory, Registers, Reg, Instruction};
pub use loader::{load, LoadError, LoadedProgram, ProgramImage, Segment};
pub use host::{RunReport, Session, SimConfig, Termination};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
