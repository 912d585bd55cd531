//! Instruction decoder for picoMIPS.
//!
//! Every instruction is one 16-bit word. The top nibble is the opcode and
//! selects one of four layouts:
//!
//! ```text
//! register   | op:4 | rs:3 | rt:3 | rd:3 | fn:3 |
//! immediate  | op:4 | rs:3 | rt:3 |    imm:6    |
//! jump       | op:4 |          addr:12          |
//! halt       | 1111 |        (ignored)          |
//! ```
//!
//! Immediates and jump addresses are two's complement fields and are
//! sign-extended to 16 bits when decoded.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Serialize, Deserialize};

use crate::cpu::alu::AluOp;
use crate::cpu::registers::Reg;

/// Opcode values (bits 15-12).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(TryFromPrimitive, IntoPrimitive)]
pub enum Opcode {
    Register = 0x0,
    Beq = 0x1,
    Jump = 0x3,
    Lw = 0x4,
    Sw = 0x5,
    Addi = 0xA,
    Subi = 0xB,
    Halt = 0xF,
}

/// Decoded picoMIPS instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Register type ====================

    /// `rd := rs <op> rt`
    Alu { op: AluOp, rd: Reg, rs: Reg, rt: Reg },

    // ==================== Immediate type ====================

    /// `rt := rs + imm`
    Addi { rt: Reg, rs: Reg, imm: i16 },

    /// `rt := rs - imm`
    Subi { rt: Reg, rs: Reg, imm: i16 },

    /// `rt := [rs + offset*2]`
    Lw { rt: Reg, rs: Reg, offset: i16 },

    /// `[rs + offset*2] := rt`
    Sw { rt: Reg, rs: Reg, offset: i16 },

    /// `if rs == rt then PC += offset*2`
    Beq { rs: Reg, rt: Reg, offset: i16 },

    // ==================== Jump type ====================

    /// `PC += offset*2`
    Jump { offset: i16 },

    /// Stop the machine normally.
    Halt,

    /// Unrecognised opcode or function code. Executing it faults.
    Illegal { word: u16 },
}

impl Instruction {
    /// Assembly mnemonic.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Alu { op, .. } => op.mnemonic(),
            Instruction::Addi { .. } => "addi",
            Instruction::Subi { .. } => "subi",
            Instruction::Lw { .. } => "lw",
            Instruction::Sw { .. } => "sw",
            Instruction::Beq { .. } => "beq",
            Instruction::Jump { .. } => "j",
            Instruction::Halt => "halt",
            Instruction::Illegal { .. } => "illegal",
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.mnemonic();
        match *self {
            Instruction::Alu { rd, rs, rt, .. } => write!(f, "{} {}, {}, {}", name, rd, rs, rt),
            Instruction::Addi { rt, rs, imm } | Instruction::Subi { rt, rs, imm } => {
                write!(f, "{} {}, {}, {}", name, rt, rs, imm)
            }
            Instruction::Lw { rt, rs, offset } | Instruction::Sw { rt, rs, offset } => {
                write!(f, "{} {}, {}({})", name, rt, offset, rs)
            }
            Instruction::Beq { rs, rt, offset } => write!(f, "{} {}, {}, {}", name, rs, rt, offset),
            Instruction::Jump { offset } => write!(f, "{} {}", name, offset),
            Instruction::Halt => f.write_str(name),
            Instruction::Illegal { word } => write!(f, "{} {:#06x}", name, word),
        }
    }
}

/// Sign-extend the low `width` bits of `field` to 16 bits.
#[inline]
pub fn sign_extend(field: u16, width: u32) -> i16 {
    let mask = (1u16 << width) - 1;
    let field = field & mask;
    if field & (1 << (width - 1)) != 0 {
        (field | !mask) as i16
    } else {
        field as i16
    }
}

/// Decode a 16-bit instruction word.
///
/// Decoding never fails: words that do not name an instruction become
/// [`Instruction::Illegal`], and the fault is raised when it executes.
pub fn decode(word: u16) -> Instruction {
    let Ok(opcode) = Opcode::try_from((word >> 12) as u8) else {
        return Instruction::Illegal { word };
    };

    let rs = Reg::from_field(word >> 9);
    let rt = Reg::from_field(word >> 6);
    let imm = sign_extend(word, 6);

    match opcode {
        Opcode::Register => {
            let rd = Reg::from_field(word >> 3);
            match AluOp::try_from((word & 0b111) as u8) {
                Ok(op) => Instruction::Alu { op, rd, rs, rt },
                Err(_) => Instruction::Illegal { word },
            }
        }
        Opcode::Addi => Instruction::Addi { rt, rs, imm },
        Opcode::Subi => Instruction::Subi { rt, rs, imm },
        Opcode::Lw => Instruction::Lw { rt, rs, offset: imm },
        Opcode::Sw => Instruction::Sw { rt, rs, offset: imm },
        Opcode::Beq => Instruction::Beq { rs, rt, offset: imm },
        Opcode::Jump => Instruction::Jump { offset: sign_extend(word, 12) },
        Opcode::Halt => Instruction::Halt,
    }
}

/// Encode an instruction back to its 16-bit word.
///
/// Immediates are truncated to their field width (6 bits, or 12 bits for
/// jumps), so out-of-range values wrap.
pub fn encode(instr: &Instruction) -> u16 {
    fn op(opcode: Opcode) -> u16 {
        u16::from(u8::from(opcode)) << 12
    }

    fn imm_type(opcode: Opcode, rs: Reg, rt: Reg, imm: i16) -> u16 {
        op(opcode) | rs.bits() << 9 | rt.bits() << 6 | (imm as u16 & 0x3F)
    }

    match *instr {
        Instruction::Alu { op: alu, rd, rs, rt } => {
            op(Opcode::Register)
                | rs.bits() << 9
                | rt.bits() << 6
                | rd.bits() << 3
                | u16::from(u8::from(alu))
        }
        Instruction::Addi { rt, rs, imm } => imm_type(Opcode::Addi, rs, rt, imm),
        Instruction::Subi { rt, rs, imm } => imm_type(Opcode::Subi, rs, rt, imm),
        Instruction::Lw { rt, rs, offset } => imm_type(Opcode::Lw, rs, rt, offset),
        Instruction::Sw { rt, rs, offset } => imm_type(Opcode::Sw, rs, rt, offset),
        Instruction::Beq { rs, rt, offset } => imm_type(Opcode::Beq, rs, rt, offset),
        Instruction::Jump { offset } => op(Opcode::Jump) | (offset as u16 & 0x0FFF),
        Instruction::Halt => op(Opcode::Halt),
        Instruction::Illegal { word } => word,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sign_extension() {
        assert_eq!(sign_extend(0x3F, 6), -1);
        assert_eq!(sign_extend(0x1F, 6), 31);
        assert_eq!(sign_extend(0x20, 6), -32);
        assert_eq!(sign_extend(0xFFF, 12), -1);
        assert_eq!(sign_extend(0x7FF, 12), 2047);
        assert_eq!(sign_extend(0x800, 12), -2048);
    }

    #[test]
    fn test_decode_register_type() {
        // mul r3, r1, r1
        assert_eq!(
            decode(0x025C),
            Instruction::Alu { op: AluOp::Mul, rd: Reg::R3, rs: Reg::R1, rt: Reg::R1 }
        );
        // add r5, r3, r4
        assert_eq!(
            decode(0x072A),
            Instruction::Alu { op: AluOp::Add, rd: Reg::R5, rs: Reg::R3, rt: Reg::R4 }
        );
    }

    #[test]
    fn test_decode_immediate_type() {
        assert_eq!(decode(0xA010), Instruction::Addi { rt: Reg::R0, rs: Reg::R0, imm: 16 });
        assert_eq!(decode(0x4081), Instruction::Lw { rt: Reg::R2, rs: Reg::R0, offset: 1 });
        assert_eq!(decode(0x50C2), Instruction::Sw { rt: Reg::R3, rs: Reg::R0, offset: 2 });
        assert_eq!(decode(0x1283), Instruction::Beq { rs: Reg::R1, rt: Reg::R2, offset: 3 });
        assert_eq!(decode(0xB07F), Instruction::Subi { rt: Reg::R1, rs: Reg::R0, imm: -1 });
    }

    #[test]
    fn test_decode_jump_and_halt() {
        assert_eq!(decode(0x3FFC), Instruction::Jump { offset: -4 });
        assert_eq!(decode(0x37FF), Instruction::Jump { offset: 2047 });
        assert_eq!(decode(0xF000), Instruction::Halt);
        assert_eq!(decode(0xF123), Instruction::Halt);
    }

    #[test]
    fn test_decode_illegal() {
        for nibble in [0x2u16, 0x6, 0x7, 0x8, 0x9, 0xC, 0xD, 0xE] {
            let word = nibble << 12 | 0x0123;
            assert_eq!(decode(word), Instruction::Illegal { word });
        }
        // Register type with function codes 6 and 7
        assert_eq!(decode(0x0006), Instruction::Illegal { word: 0x0006 });
        assert_eq!(decode(0x0007), Instruction::Illegal { word: 0x0007 });
    }

    #[test]
    fn test_display() {
        assert_eq!(decode(0x0003).to_string(), "sub r0, r0, r0");
        assert_eq!(decode(0xA481).to_string(), "addi r2, r2, 1");
        assert_eq!(decode(0x4040).to_string(), "lw r1, 0(r0)");
        assert_eq!(decode(0x1283).to_string(), "beq r1, r2, 3");
        assert_eq!(decode(0x3FFC).to_string(), "j -4");
        assert_eq!(decode(0xF000).to_string(), "halt");
        assert_eq!(decode(0x2000).to_string(), "illegal 0x2000");
    }

    #[test]
    fn test_encode_known_words() {
        let a = Instruction::Alu { op: AluOp::Sub, rd: Reg::R3, rs: Reg::R3, rt: Reg::R3 };
        assert_eq!(encode(&a), 0x06DB);
        assert_eq!(encode(&Instruction::Addi { rt: Reg::R1, rs: Reg::R1, imm: 1 }), 0xA241);
        assert_eq!(encode(&Instruction::Jump { offset: -4 }), 0x3FFC);
        assert_eq!(encode(&Instruction::Halt), 0xF000);
    }

    proptest! {
        #[test]
        fn prop_encode_inverts_decode(word: u16) {
            let instr = decode(word);
            prop_assert_eq!(decode(encode(&instr)), instr);
        }

        #[test]
        fn prop_immediates_stay_in_range(word: u16) {
            match decode(word) {
                Instruction::Addi { imm, .. } | Instruction::Subi { imm, .. } => {
                    prop_assert!((-32..=31).contains(&imm));
                }
                Instruction::Lw { offset, .. }
                | Instruction::Sw { offset, .. }
                | Instruction::Beq { offset, .. } => {
                    prop_assert!((-32..=31).contains(&offset));
                }
                Instruction::Jump { offset } => {
                    prop_assert!((-2048..=2047).contains(&offset));
                }
                _ => {}
            }
        }
    }
}
