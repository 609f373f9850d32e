//! Parses IMEM text lines into [`Instruction`]s.

use super::{Instruction, Opcode};

/// Parses one IMEM line (§6): 8 hex digits, decomposed as
/// `opcode(2) rd(1) rs(1) rt(1) imm(3)`. Returns `None` for anything that
/// isn't exactly 8 hex digits, or whose opcode isn't in the table — per §7
/// this is reported and the line skipped, not a fatal error, so the caller
/// (not this function) does the logging and continues.
#[must_use]
pub fn parse_instruction(line: &str, pc: i32) -> Option<Instruction> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.len() != 8 || !line.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let opcode_code = u8::from_str_radix(&line[0..2], 16).ok()?;
    let rd = u8::from_str_radix(&line[2..3], 16).ok()?;
    let rs = u8::from_str_radix(&line[3..4], 16).ok()?;
    let rt = u8::from_str_radix(&line[4..5], 16).ok()?;
    let imm_raw = u16::from_str_radix(&line[5..8], 16).ok()?;

    let opcode = Opcode::from_code(opcode_code)?;
    let imm = sign_extend_12(imm_raw);

    Some(Instruction {
        pc,
        opcode,
        rd,
        rs,
        rt,
        imm,
    })
}

/// Sign-extends a 12-bit field (already masked to 12 bits by the caller's
/// 3-hex-digit parse) to `i16`.
fn sign_extend_12(raw: u16) -> i16 {
    let v = raw & 0x0FFF;
    if v & 0x0800 != 0 {
        (v | 0xF000) as i16
    } else {
        v as i16
    }
}
