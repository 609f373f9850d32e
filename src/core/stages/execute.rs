//! Execute (§4.1): the ALU, and the effective-address computation shared by
//! `lw`/`sw`. Branches and `jal` resolve entirely in decode; execute leaves
//! their `alu_result` at whatever fetch initialized it to (0).

use crate::core::Core;
use crate::isa::Opcode;

pub fn execute_stage(core: &mut Core) {
    let instr = core.pipeline.e.instr;
    if instr.is_bubble() {
        return;
    }

    let a = core.regs.read_operand(instr.rs, instr.imm);
    let b = core.regs.read_operand(instr.rt, instr.imm);

    let result = match instr.opcode {
        Opcode::Add => a.wrapping_add(b),
        Opcode::Sub => a.wrapping_sub(b),
        Opcode::And => a & b,
        Opcode::Or => a | b,
        Opcode::Xor => a ^ b,
        Opcode::Mul => a.wrapping_mul(b),
        Opcode::Sll => a.wrapping_shl((b & 0x1F) as u32),
        Opcode::Sra => a.wrapping_shr((b & 0x1F) as u32),
        Opcode::Srl => ((a as u32).wrapping_shr((b & 0x1F) as u32)) as i32,
        Opcode::Lw | Opcode::Sw => a.wrapping_add(b),
        Opcode::Beq
        | Opcode::Bne
        | Opcode::Blt
        | Opcode::Bgt
        | Opcode::Ble
        | Opcode::Bge
        | Opcode::Jal
        | Opcode::Halt
        | Opcode::Stall => core.pipeline.e.alu_result,
    };

    core.pipeline.e.alu_result = result;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::Instruction;
    use rstest::rstest;

    fn alu(opcode: Opcode, rs: u8, rt: u8) -> Instruction {
        Instruction {
            pc: 0,
            opcode,
            rd: 5,
            rs,
            rt,
            imm: 0,
        }
    }

    #[test]
    fn add_reads_operands_and_writes_alu_result() {
        let mut core = Core::new(0, vec![]);
        core.regs.write(2, 3);
        core.regs.write(3, 4);
        core.pipeline.e.instr = alu(Opcode::Add, 2, 3);
        execute_stage(&mut core);
        assert_eq!(core.pipeline.e.alu_result, 7);
    }

    #[test]
    fn imm_register_binds_to_instructions_own_immediate() {
        let mut core = Core::new(0, vec![]);
        core.regs.write(2, 10);
        let mut instr = alu(Opcode::Add, 2, 1);
        instr.imm = -3;
        core.pipeline.e.instr = instr;
        execute_stage(&mut core);
        assert_eq!(core.pipeline.e.alu_result, 7);
    }

    #[test]
    fn srl_is_logical_not_arithmetic() {
        let mut core = Core::new(0, vec![]);
        core.regs.write(2, -8);
        core.regs.write(3, 1);
        core.pipeline.e.instr = alu(Opcode::Srl, 2, 3);
        execute_stage(&mut core);
        assert_eq!(core.pipeline.e.alu_result, ((-8i32) as u32 >> 1) as i32);
    }

    #[test]
    fn lw_computes_effective_address_as_rs_plus_rt() {
        let mut core = Core::new(0, vec![]);
        core.regs.write(2, 100);
        core.regs.write(3, 4);
        core.pipeline.e.instr = alu(Opcode::Lw, 2, 3);
        execute_stage(&mut core);
        assert_eq!(core.pipeline.e.alu_result, 104);
    }

    #[rstest]
    #[case::add(Opcode::Add, 6, 3, 9)]
    #[case::sub(Opcode::Sub, 6, 3, 3)]
    #[case::and(Opcode::And, 0b1100, 0b1010, 0b1000)]
    #[case::or(Opcode::Or, 0b1100, 0b1010, 0b1110)]
    #[case::xor(Opcode::Xor, 0b1100, 0b1010, 0b0110)]
    #[case::mul(Opcode::Mul, 6, 3, 18)]
    #[case::sll(Opcode::Sll, 1, 3, 8)]
    #[case::sra(Opcode::Sra, -8, 1, -4)]
    fn alu_op_table(#[case] opcode: Opcode, #[case] rs_val: i32, #[case] rt_val: i32, #[case] expected: i32) {
        let mut core = Core::new(0, vec![]);
        core.regs.write(2, rs_val);
        core.regs.write(3, rt_val);
        core.pipeline.e.instr = alu(opcode, 2, 3);
        execute_stage(&mut core);
        assert_eq!(core.pipeline.e.alu_result, expected);
    }
}
