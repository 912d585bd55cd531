//! Instruction execution for picoMIPS.
//!
//! [`execute`] applies one decoded instruction to a register file, a
//! memory and a program counter. The program counter it receives has
//! already been advanced past the instruction, so branch and jump offsets
//! are relative to the following instruction.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::cpu::decode::Instruction;
use crate::cpu::memory::{Memory, MemoryError};
use crate::cpu::registers::{Reg, Registers};

/// What the machine should do after an instruction completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the next instruction.
    Continue,
    /// A HALT instruction was executed.
    Halt,
}

/// Execute a decoded instruction.
///
/// On error nothing has been written: the destination register or memory
/// word keeps its previous value.
pub fn execute(
    instr: Instruction,
    regs: &mut Registers,
    mem: &mut Memory,
    pc: &mut u16,
) -> Result<Effect, Fault> {
    match instr {
        // ==================== Register type ====================

        Instruction::Alu { op, rd, rs, rt } => {
            let result = op.apply(regs.get(rs), regs.get(rt))?;
            regs.set(rd, result);
        }

        // ==================== Immediate type ====================

        Instruction::Addi { rt, rs, imm } => {
            regs.set(rt, regs.get(rs).wrapping_add(imm as u16));
        }

        Instruction::Subi { rt, rs, imm } => {
            regs.set(rt, regs.get(rs).wrapping_sub(imm as u16));
        }

        Instruction::Lw { rt, rs, offset } => {
            let value = mem.read_word(effective_address(regs, rs, offset))?;
            regs.set(rt, value);
        }

        Instruction::Sw { rt, rs, offset } => {
            mem.write_word(effective_address(regs, rs, offset), regs.get(rt))?;
        }

        // ==================== Control flow ====================

        Instruction::Beq { rs, rt, offset } => {
            if regs.get(rs) == regs.get(rt) {
                *pc = relative_target(*pc, offset);
            }
        }

        Instruction::Jump { offset } => {
            *pc = relative_target(*pc, offset);
        }

        Instruction::Halt => return Ok(Effect::Halt),

        Instruction::Illegal { word } => return Err(Fault::IllegalInstruction(word)),
    }

    Ok(Effect::Continue)
}

/// `base + offset*2`, where offset counts words.
#[inline]
fn effective_address(regs: &Registers, base: Reg, offset: i16) -> u16 {
    regs.get(base).wrapping_add(offset.wrapping_mul(2) as u16)
}

#[inline]
fn relative_target(pc: u16, offset: i16) -> u16 {
    pc.wrapping_add(offset.wrapping_mul(2) as u16)
}

/// Errors that stop the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Fault {
    #[error("word access at {0:#06x} is out of range")]
    AddressOutOfRange(u16),

    #[error("division by zero")]
    DivisionByZero,

    #[error("illegal instruction {0:#06x}")]
    IllegalInstruction(u16),
}

impl From<MemoryError> for Fault {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::AddressOutOfRange(addr) => Fault::AddressOutOfRange(addr),
            // Only the loader writes blocks; clamp to the block's first word.
            MemoryError::BlockOutOfRange { start, .. } => {
                Fault::AddressOutOfRange(start.min(u16::MAX as usize) as u16)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::alu::AluOp;
    use crate::cpu::decode::decode;

    struct Fixture {
        regs: Registers,
        mem: Memory,
        pc: u16,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                regs: Registers::new(),
                mem: Memory::new(),
                pc: 0x0202,
            }
        }

        fn run(&mut self, instr: Instruction) -> Result<Effect, Fault> {
            execute(instr, &mut self.regs, &mut self.mem, &mut self.pc)
        }
    }

    fn alu(op: AluOp, rd: Reg, rs: Reg, rt: Reg) -> Instruction {
        Instruction::Alu { op, rd, rs, rt }
    }

    #[test]
    fn test_alu_writes_rd() {
        let mut fx = Fixture::new();
        fx.regs.set(Reg::R1, 0xFFF6);
        fx.regs.set(Reg::R2, 0x0014);

        fx.run(alu(AluOp::Mul, Reg::R3, Reg::R1, Reg::R1)).unwrap();
        fx.run(alu(AluOp::Mul, Reg::R4, Reg::R2, Reg::R2)).unwrap();
        fx.run(alu(AluOp::Add, Reg::R5, Reg::R3, Reg::R4)).unwrap();

        assert_eq!(fx.regs.get(Reg::R5), 500);
        assert_eq!(fx.pc, 0x0202);
    }

    #[test]
    fn test_div_by_zero_leaves_rd() {
        let mut fx = Fixture::new();
        fx.regs.set(Reg::R1, 10);
        fx.regs.set(Reg::R3, 0xBEEF);

        let result = fx.run(alu(AluOp::Div, Reg::R3, Reg::R1, Reg::R2));

        assert_eq!(result, Err(Fault::DivisionByZero));
        assert_eq!(fx.regs.get(Reg::R3), 0xBEEF);
    }

    #[test]
    fn test_addi_subi_signed_immediates() {
        let mut fx = Fixture::new();

        fx.run(Instruction::Addi { rt: Reg::R1, rs: Reg::R0, imm: -1 }).unwrap();
        assert_eq!(fx.regs.get(Reg::R1), 0xFFFF);

        fx.run(Instruction::Subi { rt: Reg::R2, rs: Reg::R1, imm: -32 }).unwrap();
        assert_eq!(fx.regs.get_signed(Reg::R2), 31);

        fx.run(Instruction::Addi { rt: Reg::R3, rs: Reg::R3, imm: 16 }).unwrap();
        assert_eq!(fx.regs.get(Reg::R3), 16);
    }

    #[test]
    fn test_addi_has_no_memory_side_effect() {
        let mut fx = Fixture::new();
        fx.run(decode(0xA481)).unwrap();

        assert_eq!(fx.regs.get(Reg::R2), 1);
        assert!(fx.mem.dump(0, 0x0800).iter().all(|&(_, w)| w == 0));
    }

    #[test]
    fn test_load_store_scale_offset() {
        let mut fx = Fixture::new();
        fx.regs.set(Reg::R0, 0x0100);
        fx.mem.write_word(0x0102, 0x0014).unwrap();

        fx.run(Instruction::Lw { rt: Reg::R2, rs: Reg::R0, offset: 1 }).unwrap();
        assert_eq!(fx.regs.get(Reg::R2), 0x0014);

        fx.run(Instruction::Sw { rt: Reg::R2, rs: Reg::R0, offset: -2 }).unwrap();
        assert_eq!(fx.mem.read_word(0x00FC).unwrap(), 0x0014);
    }

    #[test]
    fn test_load_out_of_range() {
        let mut fx = Fixture::new();
        fx.regs.set(Reg::R1, 0xFFFF);
        fx.regs.set(Reg::R2, 7);

        let result = fx.run(Instruction::Lw { rt: Reg::R2, rs: Reg::R1, offset: 0 });

        assert_eq!(result, Err(Fault::AddressOutOfRange(0xFFFF)));
        assert_eq!(fx.regs.get(Reg::R2), 7);
    }

    #[test]
    fn test_effective_address_wraps() {
        let mut fx = Fixture::new();
        fx.mem.write_word(0xFFFE, 0x1234).unwrap();

        // 0 + (-1 * 2) wraps to 0xFFFE
        fx.run(Instruction::Lw { rt: Reg::R1, rs: Reg::R0, offset: -1 }).unwrap();
        assert_eq!(fx.regs.get(Reg::R1), 0x1234);
    }

    #[test]
    fn test_beq_taken_only_when_equal() {
        let mut fx = Fixture::new();
        fx.regs.set(Reg::R1, 5);
        fx.regs.set(Reg::R2, 6);

        fx.run(Instruction::Beq { rs: Reg::R1, rt: Reg::R2, offset: 3 }).unwrap();
        assert_eq!(fx.pc, 0x0202);

        fx.regs.set(Reg::R2, 5);
        fx.run(Instruction::Beq { rs: Reg::R1, rt: Reg::R2, offset: 3 }).unwrap();
        assert_eq!(fx.pc, 0x0208);

        fx.run(Instruction::Beq { rs: Reg::R1, rt: Reg::R2, offset: -4 }).unwrap();
        assert_eq!(fx.pc, 0x0200);
    }

    #[test]
    fn test_jump_is_relative() {
        let mut fx = Fixture::new();
        fx.pc = 0x0216;

        fx.run(Instruction::Jump { offset: -4 }).unwrap();
        assert_eq!(fx.pc, 0x020E);

        fx.run(Instruction::Jump { offset: 2047 }).unwrap();
        assert_eq!(fx.pc, 0x020E_u16.wrapping_add(4094));
    }

    #[test]
    fn test_halt_and_illegal() {
        let mut fx = Fixture::new();

        assert_eq!(fx.run(Instruction::Halt), Ok(Effect::Halt));
        assert_eq!(
            fx.run(decode(0x2000)),
            Err(Fault::IllegalInstruction(0x2000))
        );
    }
}
