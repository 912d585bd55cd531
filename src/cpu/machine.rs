//! The picoMIPS machine and its fetch-decode-execute loop.

use serde::{Serialize, Deserialize};

use crate::cpu::decode::{self, Instruction};
use crate::cpu::execute::{self, Effect, Fault};
use crate::cpu::registers::REGISTER_COUNT;
use crate::cpu::{Memory, Registers};

/// Machine execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineStatus {
    /// Instructions are being executed.
    Running,
    /// A HALT instruction was executed.
    Halted,
    /// Execution stopped on a fault.
    Faulted(Fault),
}

impl MachineStatus {
    /// Process exit code for a finished run: 0 after a halt, 1 otherwise.
    pub fn exit_code(self) -> i32 {
        match self {
            MachineStatus::Halted => 0,
            MachineStatus::Running | MachineStatus::Faulted(_) => 1,
        }
    }
}

/// Result of a single [`Machine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    Continue,
    Halted,
    Faulted(Fault),
}

impl StepOutcome {
    /// Whether the machine stopped.
    pub fn is_terminal(self) -> bool {
        !matches!(self, StepOutcome::Continue)
    }
}

/// Read-only view of the last executed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Address the instruction was fetched from.
    pub pc: u16,
    /// The raw instruction word.
    pub word: u16,
    /// The decoded instruction.
    pub instruction: Instruction,
    /// Registers after execution.
    pub registers: [u16; REGISTER_COUNT],
    /// How the step ended.
    pub outcome: StepOutcome,
}

/// Host callback run after every step.
///
/// This is where tracing, interactive pacing and watchdogs plug in; the
/// machine itself never prints or waits.
pub trait StepHook {
    /// Called after `machine` executed a step. Return `false` to stop
    /// the run before the next step.
    fn after_step(&mut self, machine: &Machine, outcome: StepOutcome) -> bool;
}

impl<H: StepHook + ?Sized> StepHook for &mut H {
    fn after_step(&mut self, machine: &Machine, outcome: StepOutcome) -> bool {
        (**self).after_step(machine, outcome)
    }
}

impl<A: StepHook, B: StepHook> StepHook for (A, B) {
    fn after_step(&mut self, machine: &Machine, outcome: StepOutcome) -> bool {
        // Both hooks always see the step, even if the first wants to stop.
        let first = self.0.after_step(machine, outcome);
        let second = self.1.after_step(machine, outcome);
        first && second
    }
}

impl<H: StepHook> StepHook for Option<H> {
    fn after_step(&mut self, machine: &Machine, outcome: StepOutcome) -> bool {
        match self {
            Some(hook) => hook.after_step(machine, outcome),
            None => true,
        }
    }
}

/// A picoMIPS machine.
#[derive(Clone, Serialize, Deserialize)]
pub struct Machine {
    /// General purpose registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Program counter.
    pub pc: u16,
    status: MachineStatus,
    /// Number of steps executed.
    steps: u64,
    last_step: Option<StepRecord>,
}

impl Machine {
    /// Create a machine with zeroed memory and registers, PC at 0.
    pub fn new() -> Self {
        Self::with_memory(Memory::new(), 0)
    }

    /// Create a machine around an already loaded memory image.
    pub fn with_memory(mem: Memory, entry: u16) -> Self {
        Self {
            regs: Registers::new(),
            mem,
            pc: entry,
            status: MachineStatus::Running,
            steps: 0,
            last_step: None,
        }
    }

    /// Zero registers and memory and start over at `entry`.
    pub fn reset(&mut self, entry: u16) {
        self.regs.reset();
        self.mem.clear();
        self.pc = entry;
        self.status = MachineStatus::Running;
        self.steps = 0;
        self.last_step = None;
    }

    /// Execute a single instruction.
    ///
    /// Once the machine has halted or faulted this does nothing and
    /// returns the terminal outcome again.
    pub fn step(&mut self) -> StepOutcome {
        match self.status {
            MachineStatus::Running => {}
            MachineStatus::Halted => return StepOutcome::Halted,
            MachineStatus::Faulted(fault) => return StepOutcome::Faulted(fault),
        }

        self.last_step = None;
        let outcome = match self.cycle() {
            Ok(Effect::Continue) => StepOutcome::Continue,
            Ok(Effect::Halt) => {
                log::debug!("halted after {} steps", self.steps + 1);
                self.status = MachineStatus::Halted;
                StepOutcome::Halted
            }
            Err(fault) => {
                log::debug!("faulted after {} steps: {}", self.steps + 1, fault);
                self.status = MachineStatus::Faulted(fault);
                StepOutcome::Faulted(fault)
            }
        };

        self.steps += 1;
        if let Some(record) = self.last_step.as_mut() {
            record.registers = self.regs.snapshot();
            record.outcome = outcome;
        }

        outcome
    }

    /// One fetch-decode-execute cycle.
    fn cycle(&mut self) -> Result<Effect, Fault> {
        // Fetch
        let pc = self.pc;
        let word = self.mem.read_word(pc)?;

        // Advance PC before execute (branches are relative to it)
        self.pc = pc.wrapping_add(2);

        // Decode
        let instruction = decode::decode(word);
        log::trace!("{:04x}: {:04x} {}", pc, word, instruction);
        self.last_step = Some(StepRecord {
            pc,
            word,
            instruction,
            registers: self.regs.snapshot(),
            outcome: StepOutcome::Continue,
        });

        // Execute
        execute::execute(instruction, &mut self.regs, &mut self.mem, &mut self.pc)
    }

    /// Run until halt or fault.
    ///
    /// There is no step limit: a program that never halts never returns.
    /// Hosts that need a bound should use [`Machine::run_with_hook`].
    pub fn run(&mut self) -> MachineStatus {
        while !self.step().is_terminal() {}
        self.status
    }

    /// Run until halt, fault, or until `hook` asks to stop.
    ///
    /// If the hook stops the run early the status is still
    /// [`MachineStatus::Running`].
    pub fn run_with_hook<H: StepHook + ?Sized>(&mut self, hook: &mut H) -> MachineStatus {
        while self.is_running() {
            let outcome = self.step();
            if !hook.after_step(self, outcome) {
                break;
            }
        }
        self.status
    }

    /// Current status.
    pub fn status(&self) -> MachineStatus {
        self.status
    }

    /// Number of steps executed since creation or reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// The most recently executed instruction.
    ///
    /// `None` before the first step, and after a step that faulted while
    /// fetching.
    pub fn last_step(&self) -> Option<&StepRecord> {
        self.last_step.as_ref()
    }

    /// Check if the machine has halted normally.
    pub fn is_halted(&self) -> bool {
        self.status == MachineStatus::Halted
    }

    /// Check if the machine is still running.
    pub fn is_running(&self) -> bool {
        self.status == MachineStatus::Running
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("status", &self.status)
            .field("pc", &format_args!("{:#06x}", self.pc))
            .field("steps", &self.steps)
            .field("regs", &self.regs)
            .finish()
    }
}
