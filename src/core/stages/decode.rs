//! Decode (§4.1): resolves hazards are computed by the caller (`Core::tick`);
//! this stage only resolves branches. Runs every tick D is not frozen,
//! including ticks where `Core::tick` will discover a data hazard and roll
//! `pc` back afterward — see the caller for that restore.

use crate::core::{Core, BRANCH_TARGET_MASK};
use crate::isa::Opcode;

pub fn decode_stage(core: &mut Core) {
    let instr = core.pipeline.d.instr;
    if instr.is_bubble() || !instr.opcode.is_branch() {
        return;
    }

    // Register fields are a single hex digit (0..=15), so this is always
    // false; kept because the operation is defined for out-of-range fields.
    if instr.rd > 15 || instr.rs > 15 || instr.rt > 15 {
        core.pipeline.d.instr = crate::isa::Instruction::stall();
        return;
    }

    let taken = if instr.opcode == Opcode::Jal {
        true
    } else {
        let a = core.regs.read_operand(instr.rs, instr.imm);
        let b = core.regs.read_operand(instr.rt, instr.imm);
        match instr.opcode {
            Opcode::Beq => a == b,
            Opcode::Bne => a != b,
            Opcode::Blt => a < b,
            Opcode::Bgt => a > b,
            Opcode::Ble => a <= b,
            Opcode::Bge => a >= b,
            _ => false,
        }
    };

    if !taken {
        return;
    }

    let target = core.regs.read_operand(instr.rd, instr.imm) & BRANCH_TARGET_MASK;
    core.pc = target;
    if instr.opcode == Opcode::Jal {
        core.regs.write(15, instr.pc + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::Instruction;
    use rstest::rstest;

    fn branch(opcode: Opcode, rd: u8, rs: u8, rt: u8) -> Instruction {
        Instruction {
            pc: 10,
            opcode,
            rd,
            rs,
            rt,
            imm: 0,
        }
    }

    #[test]
    fn beq_taken_jumps_to_rd_masked_to_nine_bits() {
        let mut core = Core::new(0, vec![]);
        core.regs.write(2, 5);
        core.regs.write(3, 5);
        core.regs.write(4, 0x3_ABC);
        core.pipeline.d.instr = branch(Opcode::Beq, 4, 2, 3);
        decode_stage(&mut core);
        assert_eq!(core.pc, 0x0BC);
    }

    #[test]
    fn beq_not_taken_leaves_pc_alone() {
        let mut core = Core::new(0, vec![]);
        core.pc = 99;
        core.regs.write(2, 5);
        core.regs.write(3, 6);
        core.pipeline.d.instr = branch(Opcode::Beq, 4, 2, 3);
        decode_stage(&mut core);
        assert_eq!(core.pc, 99);
    }

    #[test]
    fn jal_is_always_taken_and_links_r15() {
        let mut core = Core::new(0, vec![]);
        core.regs.write(4, 0xABC);
        let mut instr = branch(Opcode::Jal, 4, 0, 0);
        instr.pc = 0x10;
        core.pipeline.d.instr = instr;
        decode_stage(&mut core);
        assert_eq!(core.pc, 0x0BC);
        assert_eq!(core.regs.read(15), 0x11);
    }

    #[rstest]
    #[case::beq_equal(Opcode::Beq, 5, 5, true)]
    #[case::beq_unequal(Opcode::Beq, 5, 6, false)]
    #[case::bne_unequal(Opcode::Bne, 5, 6, true)]
    #[case::bne_equal(Opcode::Bne, 5, 5, false)]
    #[case::blt_less(Opcode::Blt, 4, 5, true)]
    #[case::blt_not_less(Opcode::Blt, 5, 4, false)]
    #[case::bgt_greater(Opcode::Bgt, 6, 5, true)]
    #[case::bgt_not_greater(Opcode::Bgt, 5, 6, false)]
    #[case::ble_equal(Opcode::Ble, 5, 5, true)]
    #[case::ble_greater(Opcode::Ble, 6, 5, false)]
    #[case::bge_equal(Opcode::Bge, 5, 5, true)]
    #[case::bge_less(Opcode::Bge, 4, 5, false)]
    fn branch_condition_table(#[case] opcode: Opcode, #[case] rs_val: i32, #[case] rt_val: i32, #[case] taken: bool) {
        let mut core = Core::new(0, vec![]);
        core.pc = 50;
        core.regs.write(2, rs_val);
        core.regs.write(3, rt_val);
        core.pipeline.d.instr = branch(opcode, 4, 2, 3);
        decode_stage(&mut core);
        if taken {
            assert_ne!(core.pc, 50);
        } else {
            assert_eq!(core.pc, 50);
        }
    }

    #[test]
    fn non_branch_instruction_is_untouched() {
        let mut core = Core::new(0, vec![]);
        core.pc = 7;
        core.pipeline.d.instr = Instruction {
            pc: 3,
            opcode: Opcode::Add,
            rd: 2,
            rs: 3,
            rt: 4,
            imm: 0,
        };
        decode_stage(&mut core);
        assert_eq!(core.pc, 7);
    }
}
