//! A single core: its instruction memory, register file, cache, pipeline
//! registers, and the bus-facing bookkeeping for an in-flight miss.

pub mod pipeline;
pub mod regfile;
pub mod stages;
pub mod stats;

use crate::bus::{BusCmd, Grant, BUS_BLOCK_TRANSFER_DELAY, BUS_FIRST_WORD_DELAY, BUS_WRITEBACK_EXTRA_DELAY};
use crate::cache::{Cache, MesiState};
use crate::isa::Instruction;
use pipeline::{PipelineRegs, PipelineSlot};
use regfile::RegisterFile;
use stats::Statistics;

pub const NUM_CORES: usize = 4;
pub const IMEM_SIZE: usize = 1024;
/// `sra`/`bgt`/branch targets are masked to 9 bits (`& 0x1FF`), matching the
/// reserved sentinel slot at the top of a 1024-entry IMEM.
pub const BRANCH_TARGET_MASK: i32 = 0x1FF;

/// A bus event a core produced this tick, for the driver to turn into a
/// `bustrace.txt` line.
#[derive(Debug, Clone, Copy)]
pub enum BusEvent {
    Request { cmd: BusCmd, addr: u32, shared: bool },
    FlushWord { addr: u32, data: i32 },
}

/// State of an in-flight miss, from the tick it's first detected (before a
/// grant) through block installation.
#[derive(Debug, Clone)]
struct PendingTransfer {
    addr: u32,
    is_write: bool,
    store_value: i32,
    granted: bool,
    cmd: BusCmd,
    shared: bool,
    supplier_dirty: bool,
    words: [i32; 4],
    bus_delay: u32,
    extra_delay: u32,
    block_delay: u32,
}

#[derive(Debug)]
pub struct Core {
    pub id: usize,
    imem: Vec<Instruction>,
    pub regs: RegisterFile,
    pub cache: Cache,
    pub pipeline: PipelineRegs,
    pub stats: Statistics,
    pub pc: i32,
    hold_bus: bool,
    pending: Option<PendingTransfer>,
    halted: bool,
    ticks_elapsed: u64,
}

impl Core {
    #[must_use]
    pub fn new(id: usize, imem: Vec<Instruction>) -> Self {
        Self {
            id,
            imem,
            regs: RegisterFile::default(),
            cache: Cache::default(),
            pipeline: PipelineRegs::default(),
            stats: Statistics::default(),
            pc: 0,
            hold_bus: false,
            pending: None,
            halted: false,
            ticks_elapsed: 0,
        }
    }

    #[must_use]
    pub const fn hold_bus(&self) -> bool {
        self.hold_bus
    }

    /// True iff this core has a cache-miss memory op waiting for the bus and
    /// hasn't been granted yet.
    #[must_use]
    pub fn wants_bus(&self) -> bool {
        matches!(&self.pending, Some(p) if !p.granted)
    }

    #[must_use]
    pub fn is_writer(&self) -> bool {
        matches!(&self.pending, Some(p) if p.is_write)
    }

    /// Word address of the 4-word-aligned block containing the pending
    /// miss's effective address.
    #[must_use]
    pub fn pending_block_base(&self) -> u32 {
        self.pending.as_ref().map_or(0, |p| p.addr - (p.addr % 4))
    }

    /// Queried by the bus arbiter to find a cache-to-cache supplier: returns
    /// this core's state for the block at `addr`, if it holds one.
    #[must_use]
    pub fn sibling_state(&self, addr: u32) -> Option<MesiState> {
        self.cache.state_for(addr)
    }

    pub fn snoop_invalidate(&mut self, addr: u32) {
        self.cache.snoop_invalidate(addr);
    }

    pub fn snoop_downgrade(&mut self, addr: u32) {
        self.cache.snoop_downgrade(addr);
    }

    /// Reads this core's own (dirty) copy of a block, word by word, for a
    /// cache-to-cache supply. Caller guarantees a hit.
    #[must_use]
    pub fn read_owned_block(&self, block_base: u32) -> [i32; 4] {
        let mut out = [0; 4];
        for (i, word) in out.iter_mut().enumerate() {
            *word = self.cache.read_word(block_base + i as u32);
        }
        out
    }

    /// Called by the driver once arbitration grants this core the bus.
    /// `words` is the block content the requester will eventually install:
    /// either memory's copy or, if `grant.supplier` was this core's sibling,
    /// that sibling's flushed dirty copy.
    pub fn begin_transaction(&mut self, grant: &Grant, words: [i32; 4]) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        pending.granted = true;
        pending.cmd = grant.cmd;
        pending.shared = grant.shared;
        pending.supplier_dirty = grant.supplier.is_some();
        pending.words = words;
        pending.bus_delay = BUS_FIRST_WORD_DELAY;
        pending.extra_delay = if grant.supplier.is_some() {
            BUS_WRITEBACK_EXTRA_DELAY
        } else {
            0
        };
        pending.block_delay = BUS_BLOCK_TRANSFER_DELAY;
        self.hold_bus = true;
    }

    /// Runs one full tick: writeback, memory, execute, decode, fetch, in
    /// that order (§5: "stage bodies are evaluated in the order
    /// W→M→E→D→F"), then applies the advance rule (§4.1) to shift the five
    /// pipeline registers. Returns any bus event this core produced.
    pub fn tick(&mut self, cycle: u64) -> Option<BusEvent> {
        self.ticks_elapsed += 1;

        stages::writeback::writeback_stage(self);

        let (m_advanced, bus_event) = stages::memory::memory_stage(self, cycle);

        let freeze_all = !m_advanced;

        if !freeze_all {
            stages::execute::execute_stage(self);
        }

        let haz_e = hazard(self.pipeline.e.instr.rd, &self.pipeline.d.instr);
        let haz_m = hazard(self.pipeline.m.instr.rd, &self.pipeline.d.instr);
        let haz_w = self.pipeline.w.instr.opcode.writes_rd()
            && hazard(self.pipeline.w.instr.rd, &self.pipeline.d.instr);
        let freeze_fd = !freeze_all
            && self.pipeline.d.instr.opcode != crate::isa::Opcode::Halt
            && (haz_e || haz_m || haz_w);

        let pre_decode_pc = self.pc;
        if !freeze_all {
            stages::decode::decode_stage(self);
        }
        if freeze_all || freeze_fd {
            self.pc = pre_decode_pc;
        }

        if !freeze_all && !freeze_fd {
            stages::fetch::fetch_stage(self);
        }

        // Advance rule (§4.1), applied after every stage body has run.
        self.pipeline.w = if m_advanced {
            self.pipeline.m
        } else {
            PipelineSlot::bubble()
        };
        if !freeze_all {
            self.pipeline.m = self.pipeline.e;
        }
        if !freeze_all {
            self.pipeline.e = if freeze_fd {
                PipelineSlot::bubble()
            } else {
                self.pipeline.d
            };
        }
        if !freeze_all && !freeze_fd {
            self.pipeline.d = self.pipeline.f;
        }

        if self.pipeline.e.instr.opcode == crate::isa::Opcode::Halt {
            self.halted = true;
        }
        if self.halted && !freeze_all && !freeze_fd {
            self.pipeline.f = PipelineSlot::bubble();
        }

        if self.pipeline.w.instr.opcode == crate::isa::Opcode::Stall {
            self.stats.decode_stall_raw += 1;
        }
        if freeze_all {
            self.stats.mem_stall += 1;
        }
        self.stats.total_cycles = cycle;

        bus_event
    }

    /// A core is done once every pipeline register is a bubble after at
    /// least one tick, or fetch has reached the reserved sentinel slot.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.ticks_elapsed > 0
            && ((self.pipeline.f.is_bubble()
                && self.pipeline.d.is_bubble()
                && self.pipeline.e.is_bubble()
                && self.pipeline.m.is_bubble()
                && self.pipeline.w.is_bubble())
                || self.pc as usize >= IMEM_SIZE - 1)
    }

    pub(crate) fn imem_at(&self, pc: i32) -> Option<Instruction> {
        if pc < 0 || pc as usize >= self.imem.len() {
            None
        } else {
            Some(self.imem[pc as usize])
        }
    }

    pub(crate) fn start_pending(&mut self, addr: u32, is_write: bool, store_value: i32) {
        self.pending = Some(PendingTransfer {
            addr,
            is_write,
            store_value,
            granted: false,
            cmd: BusCmd::NoCmd,
            shared: false,
            supplier_dirty: false,
            words: [0; 4],
            bus_delay: 0,
            extra_delay: 0,
            block_delay: 0,
        });
    }

}

/// `HazE`/`HazM` predicate (§4.1): does `writer_rd` (not `$zero`/`$imm`)
/// collide with any of `reader`'s three register fields?
fn hazard(writer_rd: u8, reader: &Instruction) -> bool {
    writer_rd != 0
        && writer_rd != 1
        && (writer_rd == reader.rd || writer_rd == reader.rs || writer_rd == reader.rt)
}
