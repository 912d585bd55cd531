//! TUI debugger for the picoMIPS simulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Decoded code view around the PC
//! - Register file and machine status
//! - Scrollable memory view
//! - Step/run/breakpoint controls

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
