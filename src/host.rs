//! Host-side run control.
//!
//! Everything that sits between a user and the machine: loading a
//! program into a fresh machine, bounding runaway programs with a step
//! limit, pausing for confirmation between instructions, and summarising
//! how a run ended.

use std::io::{self, BufRead, Write};

use serde::{Serialize, Deserialize};

use crate::cpu::{Fault, Machine, MachineStatus, Memory, StepHook, StepOutcome, REGISTER_COUNT};
use crate::loader::{self, LoadError, LoadedProgram, ProgramImage};

/// Default step limit for command line runs.
pub const DEFAULT_MAX_STEPS: u64 = 10_000;

/// Run settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Stop after this many steps. `None` runs without a limit.
    pub max_steps: Option<u64>,
    /// Print every executed instruction and the register file.
    pub trace: bool,
    /// Wait for confirmation before each instruction.
    pub confirm: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_steps: Some(DEFAULT_MAX_STEPS),
            trace: false,
            confirm: false,
        }
    }
}

/// Stops a run once the machine has executed `limit` steps.
#[derive(Debug, Clone, Copy)]
pub struct Watchdog {
    limit: u64,
    expired: bool,
}

impl Watchdog {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            expired: false,
        }
    }

    /// Whether the limit was hit while the machine was still running.
    pub fn expired(&self) -> bool {
        self.expired
    }
}

impl StepHook for Watchdog {
    fn after_step(&mut self, machine: &Machine, outcome: StepOutcome) -> bool {
        if !outcome.is_terminal() && machine.steps() >= self.limit {
            self.expired = true;
            return false;
        }
        true
    }
}

/// Asks for confirmation after every instruction.
///
/// An empty line executes the next instruction, `c` runs to the end
/// without asking again, and `q` (or end of input) aborts the run.
#[derive(Debug)]
pub struct ConfirmPrompt<R, W> {
    input: R,
    output: W,
    enabled: bool,
    aborted: bool,
}

impl<R: BufRead, W: Write> ConfirmPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            enabled: true,
            aborted: false,
        }
    }

    /// Whether the user asked to stop.
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    fn ask(&mut self) -> io::Result<bool> {
        write!(self.output, "[enter] step  [c] continue  [q] quit > ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(false);
        }
        match line.trim() {
            "q" | "quit" => Ok(false),
            "c" | "continue" => {
                self.enabled = false;
                Ok(true)
            }
            _ => Ok(true),
        }
    }
}

impl<R: BufRead, W: Write> StepHook for ConfirmPrompt<R, W> {
    fn after_step(&mut self, _machine: &Machine, outcome: StepOutcome) -> bool {
        if !self.enabled || outcome.is_terminal() {
            return true;
        }
        match self.ask() {
            Ok(true) => true,
            Ok(false) => {
                self.aborted = true;
                false
            }
            Err(err) => {
                log::warn!("confirmation prompt failed: {}", err);
                self.aborted = true;
                false
            }
        }
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The program executed HALT.
    Halted,
    /// The machine faulted.
    Faulted(Fault),
    /// The host step limit expired first.
    StepLimit(u64),
    /// The user stopped the run.
    Aborted,
}

impl Termination {
    /// 0 for a normal halt, 1 for everything else.
    pub fn exit_code(self) -> i32 {
        match self {
            Termination::Halted => 0,
            Termination::Faulted(_) | Termination::StepLimit(_) | Termination::Aborted => 1,
        }
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Halted => write!(f, "halted"),
            Termination::Faulted(fault) => write!(f, "fault: {}", fault),
            Termination::StepLimit(limit) => write!(f, "step limit of {} reached", limit),
            Termination::Aborted => write!(f, "aborted"),
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub program: String,
    pub termination: Termination,
    pub exit_code: i32,
    pub steps: u64,
    pub pc: u16,
    pub registers: [u16; REGISTER_COUNT],
    /// Data segment contents after the run, as `(address, word)`.
    pub data: Vec<(usize, u16)>,
}

/// A program loaded into its own machine.
#[derive(Debug, Clone)]
pub struct Session {
    pub image: ProgramImage,
    pub program: LoadedProgram,
    pub machine: Machine,
}

impl Session {
    /// Build a fresh machine with `image` loaded.
    pub fn load(image: ProgramImage) -> Result<Self, LoadError> {
        let mut mem = Memory::new();
        let program = loader::load(&mut mem, &image)?;
        log::info!(
            "loaded {}: data {:#06x?}, code {:#06x?}, entry {:#06x}",
            image.name, program.data, program.code, program.entry
        );

        Ok(Self {
            machine: Machine::with_memory(mem, program.entry),
            image,
            program,
        })
    }

    /// Throw away all state and load the program again.
    pub fn reset(&mut self) -> Result<(), LoadError> {
        self.machine.reset(self.program.entry);
        self.program = loader::load(&mut self.machine.mem, &self.image)?;
        Ok(())
    }

    /// Run with the step limit from `config`, calling `hook` after every
    /// step. Returns how the run ended.
    pub fn run<H: StepHook>(&mut self, config: &SimConfig, hook: &mut H) -> RunReport {
        let mut watchdog = config.max_steps.map(Watchdog::new);
        let mut hooks = (&mut watchdog, hook);
        let status = self.machine.run_with_hook(&mut hooks);

        let termination = match status {
            MachineStatus::Halted => Termination::Halted,
            MachineStatus::Faulted(fault) => Termination::Faulted(fault),
            MachineStatus::Running => match watchdog {
                Some(w) if w.expired() => Termination::StepLimit(w.limit),
                _ => Termination::Aborted,
            },
        };
        log::info!("{} after {} steps: {}", self.image.name, self.machine.steps(), termination);

        self.report(termination)
    }

    fn report(&self, termination: Termination) -> RunReport {
        RunReport {
            program: self.image.name.clone(),
            termination,
            exit_code: termination.exit_code(),
            steps: self.machine.steps(),
            pc: self.machine.pc,
            registers: self.machine.regs.snapshot(),
            data: self.machine.mem.dump(self.program.data.start, self.program.data.end),
        }
    }
}

/// A hook that never interferes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHook;

impl StepHook for NoHook {
    fn after_step(&mut self, _machine: &Machine, _outcome: StepOutcome) -> bool {
        true
    }
}
