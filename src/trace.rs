//! Text rendering of machine state for diagnostics.
//!
//! The machine never formats anything itself; everything printable lives
//! here and is driven from a [`StepHook`] or from the command line.

use std::io::{self, Write};

use crate::cpu::{Machine, Memory, StepHook, StepOutcome, StepRecord, REGISTER_COUNT};

/// Words per row in a memory dump.
const DUMP_COLUMNS: usize = 8;

/// One line describing an executed step: `0200: 0003  sub r0, r0, r0`.
pub fn format_step(record: &StepRecord) -> String {
    format!("{:04X}: {:04X}  {}", record.pc, record.word, record.instruction)
}

/// Dump the words in `start..end`, eight per row, each row prefixed with
/// its address.
pub fn format_memory(mem: &Memory, name: Option<&str>, start: usize, end: usize) -> String {
    let mut out = String::new();
    if let Some(name) = name {
        out.push_str(&format!("[{}]\n", name));
    }

    for row in mem.dump(start, end).chunks(DUMP_COLUMNS) {
        out.push_str(&format!("{:04X}:", row[0].0));
        for (_, word) in row {
            out.push_str(&format!(" {:04X}", word));
        }
        out.push('\n');
    }
    out
}

/// Renders the register file, marking registers that changed since the
/// previous render as `old => new`.
#[derive(Debug, Clone, Default)]
pub struct RegisterView {
    previous: [u16; REGISTER_COUNT],
}

impl RegisterView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `current` in two columns (r0-r3 and r4-r7) and remember it.
    pub fn render(&mut self, current: &[u16; REGISTER_COUNT]) -> String {
        let half = REGISTER_COUNT / 2;
        let mut out = String::new();
        for i in 0..half {
            let left = self.cell(i, current[i]);
            let right = self.cell(i + half, current[i + half]);
            out.push_str(&format!("  {:<36}{}\n", left, right));
        }
        self.previous = *current;
        out
    }

    fn cell(&self, index: usize, value: u16) -> String {
        let old = self.previous[index];
        if old == value {
            format!("r{}: {:04X} ({})", index, old, old as i16)
        } else {
            format!(
                "r{}: {:04X} ({}) => {:04X} ({})",
                index, old, old as i16, value, value as i16
            )
        }
    }
}

/// Step hook that writes every executed instruction and the register
/// file to `out`.
///
/// A failed write stops the run; the error is kept for [`Tracer::finish`].
#[derive(Debug)]
pub struct Tracer<W: Write> {
    out: W,
    registers: RegisterView,
    error: Option<io::Error>,
}

impl<W: Write> Tracer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            registers: RegisterView::new(),
            error: None,
        }
    }

    /// Hand back the writer, or the first write error.
    pub fn finish(self) -> io::Result<W> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.out),
        }
    }

    fn write_step(&mut self, machine: &Machine, outcome: StepOutcome) -> io::Result<()> {
        if let Some(record) = machine.last_step() {
            writeln!(self.out, "{}", format_step(record))?;
        }
        write!(self.out, "{}", self.registers.render(&machine.regs.snapshot()))?;
        match outcome {
            StepOutcome::Continue => Ok(()),
            StepOutcome::Halted => writeln!(self.out, "halted at {:04X}", machine.pc),
            StepOutcome::Faulted(fault) => writeln!(self.out, "fault: {}", fault),
        }
    }
}

impl<W: Write> StepHook for Tracer<W> {
    fn after_step(&mut self, machine: &Machine, outcome: StepOutcome) -> bool {
        match self.write_step(machine, outcome) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("trace output failed: {}", err);
                self.error = Some(err);
                false
            }
        }
    }
}
