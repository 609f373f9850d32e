//! Memory (§4.1): cache hit/miss handling for `lw`/`sw`, and the multi-phase
//! bus transaction a miss launches once granted. `(bool, Option<BusEvent>)`:
//! the bool is whether M produced a committed result this tick (the
//! `freeze_all` input back in `Core::tick`); the event, if any, becomes a
//! `bustrace.txt` line.

use crate::bus::{BUS_BLOCK_TRANSFER_DELAY, BUS_FIRST_WORD_DELAY};
use crate::cache::MesiState;
use crate::core::{BusEvent, Core};
use crate::isa::Opcode;

pub fn memory_stage(core: &mut Core, cycle: u64) -> (bool, Option<BusEvent>) {
    let instr = core.pipeline.m.instr;
    if instr.is_bubble() || !matches!(instr.opcode, Opcode::Lw | Opcode::Sw) {
        return (true, None);
    }

    if core.pending.is_some() {
        return step_pending(core, cycle);
    }

    let addr = core.pipeline.m.alu_result as u32;
    if core.cache.lookup(addr) {
        match instr.opcode {
            Opcode::Lw => {
                core.pipeline.m.alu_result = core.cache.read_word(addr);
                core.stats.read_hit += 1;
            }
            Opcode::Sw => {
                let value = core.regs.read_operand(instr.rd, instr.imm);
                core.cache.write_word(addr, value);
                core.stats.write_hit += 1;
            }
            _ => {}
        }
        return (true, None);
    }

    let is_write = instr.opcode == Opcode::Sw;
    let store_value = if is_write {
        core.regs.read_operand(instr.rd, instr.imm)
    } else {
        0
    };
    if is_write {
        core.stats.write_miss += 1;
    } else {
        core.stats.read_miss += 1;
    }
    core.start_pending(addr, is_write, store_value);
    (false, None)
}

fn step_pending(core: &mut Core, cycle: u64) -> (bool, Option<BusEvent>) {
    let Some(pending) = core.pending.as_mut() else {
        return (true, None);
    };
    if !pending.granted {
        return (false, None);
    }

    if pending.bus_delay > 0 {
        let first_tick = pending.bus_delay == BUS_FIRST_WORD_DELAY;
        let cmd = pending.cmd;
        let shared = pending.shared;
        let block_base = pending.addr - pending.addr % 4;
        pending.bus_delay -= 1;
        let event = first_tick.then_some(BusEvent::Request {
            cmd,
            addr: block_base,
            shared,
        });
        return (false, event);
    }

    if pending.extra_delay > 0 {
        pending.extra_delay -= 1;
        return (false, None);
    }

    if pending.block_delay > 0 {
        let word_idx = BUS_BLOCK_TRANSFER_DELAY - pending.block_delay;
        let block_base = pending.addr - pending.addr % 4;
        let data = pending.words[word_idx as usize];
        pending.block_delay -= 1;
        let done = pending.block_delay == 0;
        let event = Some(BusEvent::FlushWord {
            addr: block_base + word_idx,
            data,
        });
        if done {
            finish_pending(core, cycle);
            return (true, event);
        }
        return (false, event);
    }

    (true, None)
}

fn finish_pending(core: &mut Core, cycle: u64) {
    let Some(pending) = core.pending.take() else {
        return;
    };
    let block_base = pending.addr - pending.addr % 4;
    let new_state = if pending.is_write {
        MesiState::Modified
    } else if pending.shared {
        MesiState::Shared
    } else {
        MesiState::Exclusive
    };
    core.cache.install(block_base, pending.words, new_state, cycle);
    if pending.is_write {
        core.cache.write_word(pending.addr, pending.store_value);
    } else {
        core.pipeline.m.alu_result = core.cache.read_word(pending.addr);
    }
    core.hold_bus = false;
}
