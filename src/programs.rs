//! Built-in example programs.
//!
//! Both programs keep their operands in a small data block at 0x0100 and
//! their code at 0x0200, and leave the result in the third data word
//! (0x0104).

use crate::loader::{ProgramImage, Segment};

/// Base address of the data block.
pub const DATA_BASE: u16 = 0x0100;
/// Base address of the code.
pub const CODE_BASE: u16 = 0x0200;
/// Where both programs store their result.
pub const RESULT_ADDR: u16 = 0x0104;

/// Names of the built-in programs, in listing order.
pub const NAMES: [&str; 2] = ["square-sum", "range-sum"];

/// Look up a built-in program by name, with its default operands.
pub fn find(name: &str) -> Option<ProgramImage> {
    match name {
        "square-sum" => Some(square_sum(-10, 20)),
        "range-sum" => Some(range_sum(-2, 3)),
        _ => None,
    }
}

/// Look up a built-in program by name and replace its A and B operands.
pub fn with_operands(name: &str, a: Option<i16>, b: Option<i16>) -> Option<ProgramImage> {
    let mut image = find(name)?;
    if let Some(a) = a {
        image.data.words[0] = a as u16;
    }
    if let Some(b) = b {
        image.data.words[1] = b as u16;
    }
    Some(image)
}

/// `Y = A*A + B*B`.
///
/// ```text
/// 0200  0003  sub  r0, r0, r0
/// 0202  A010  addi r0, r0, 16
/// 0204  0004  mul  r0, r0, r0     ; r0 = 0x0100
/// 0206  4040  lw   r1, 0(r0)      ; A
/// 0208  4081  lw   r2, 1(r0)      ; B
/// 020A  025C  mul  r3, r1, r1
/// 020C  04A4  mul  r4, r2, r2
/// 020E  072A  add  r5, r3, r4
/// 0210  5142  sw   r5, 2(r0)      ; Y
/// 0212  F000  halt
/// ```
pub fn square_sum(a: i16, b: i16) -> ProgramImage {
    ProgramImage {
        name: "square-sum".into(),
        description: "Y = A*A + B*B".into(),
        data: Segment::new(DATA_BASE, vec![a as u16, b as u16, 0x0000]),
        code: Segment::new(
            CODE_BASE,
            vec![
                0x0003, 0xA010, 0x0004, 0x4040, 0x4081,
                0x025C, 0x04A4, 0x072A, 0x5142, 0xF000,
            ],
        ),
    }
}

/// `S = A + (A+1) + ... + B`.
///
/// The loop counts r1 up from A and stops when it reaches B + 1, so for
/// A > B + 1 it only stops after r1 wraps around past 0xFFFF.
///
/// ```text
/// 0200  0003  sub  r0, r0, r0
/// 0202  A010  addi r0, r0, 16
/// 0204  0004  mul  r0, r0, r0     ; r0 = 0x0100
/// 0206  4040  lw   r1, 0(r0)      ; counter = A
/// 0208  4081  lw   r2, 1(r0)      ; B
/// 020A  A481  addi r2, r2, 1      ; limit = B + 1
/// 020C  06DB  sub  r3, r3, r3     ; sum = 0
/// 020E  1283  beq  r1, r2, 3      ; -> 0216
/// 0210  065A  add  r3, r3, r1
/// 0212  A241  addi r1, r1, 1
/// 0214  3FFC  j    -4             ; -> 020E
/// 0216  50C2  sw   r3, 2(r0)      ; S
/// 0218  F000  halt
/// ```
pub fn range_sum(a: i16, b: i16) -> ProgramImage {
    ProgramImage {
        name: "range-sum".into(),
        description: "S = A + (A+1) + ... + B".into(),
        data: Segment::new(DATA_BASE, vec![a as u16, b as u16, 0x0000]),
        code: Segment::new(
            CODE_BASE,
            vec![
                0x0003, 0xA010, 0x0004, 0x4040, 0x4081, 0xA481, 0x06DB,
                0x1283, 0x065A, 0xA241, 0x3FFC, 0x50C2, 0xF000,
            ],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::{Machine, MachineStatus, Memory};
    use crate::loader::load;

    fn run_to_halt(image: &ProgramImage) -> Machine {
        let mut mem = Memory::new();
        let loaded = load(&mut mem, image).unwrap();
        let mut machine = Machine::with_memory(mem, loaded.entry);
        assert_eq!(machine.run(), MachineStatus::Halted);
        machine
    }

    #[test]
    fn test_square_sum() {
        let machine = run_to_halt(&find("square-sum").unwrap());

        assert_eq!(machine.mem.read_word(RESULT_ADDR).unwrap(), 500);
        assert_eq!(machine.steps(), 10);
        // Operands are untouched
        assert_eq!(machine.mem.read_word(DATA_BASE).unwrap(), 0xFFF6);
    }

    #[test]
    fn test_range_sum() {
        let machine = run_to_halt(&find("range-sum").unwrap());

        assert_eq!(machine.mem.read_word(RESULT_ADDR).unwrap(), 3);
    }

    #[test]
    fn test_range_sum_other_operands() {
        let machine = run_to_halt(&range_sum(1, 10));
        assert_eq!(machine.mem.read_word(RESULT_ADDR).unwrap(), 55);

        let machine = run_to_halt(&range_sum(-5, -1));
        assert_eq!(machine.mem.read_word(RESULT_ADDR).unwrap() as i16, -15);

        // A == B + 1: zero iterations
        let machine = run_to_halt(&range_sum(4, 3));
        assert_eq!(machine.mem.read_word(RESULT_ADDR).unwrap(), 0);
    }

    #[test]
    fn test_square_sum_wraps() {
        // 200*200 + 100*100 = 50000, which does not fit in i16
        let machine = run_to_halt(&square_sum(200, 100));
        assert_eq!(machine.mem.read_word(RESULT_ADDR).unwrap(), 50000);
    }

    #[test]
    fn test_with_operands() {
        let machine = run_to_halt(&with_operands("square-sum", Some(3), None).unwrap());
        // 3*3 + 20*20
        assert_eq!(machine.mem.read_word(RESULT_ADDR).unwrap(), 409);

        let machine = run_to_halt(&with_operands("range-sum", Some(0), Some(4)).unwrap());
        assert_eq!(machine.mem.read_word(RESULT_ADDR).unwrap(), 10);

        assert!(with_operands("nope", Some(1), Some(2)).is_none());
    }

    #[test]
    fn test_unknown_program() {
        assert!(find("fibonacci").is_none());
        assert!(NAMES.iter().all(|name| find(name).is_some()));
    }
}
