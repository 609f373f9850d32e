//! The top-level driver: four cores, one bus, one main memory. Owns the
//! per-tick sequence from §4.4 — probe for bus requesters, arbitrate,
//! service a winner's cache-to-cache or memory supply, then advance every
//! core's pipeline by one tick.

use crate::bus::{Bus, BusCmd, Grant};
use crate::core::{BusEvent, Core, NUM_CORES};
use crate::isa::Instruction;
use crate::memory::MainMemory;

/// One line of `bustrace.txt`: the bus command a core issued, or the data
/// word it's flushing, this cycle.
#[derive(Debug, Clone, Copy)]
pub struct BusTraceEvent {
    pub cycle: u64,
    pub origin: usize,
    pub cmd: BusCmd,
    pub addr: u32,
    pub data: i32,
    pub shared: bool,
}

/// One line of `coreNtrace.txt`: a post-tick snapshot of the five pipeline
/// registers' instructions and the writable register file.
#[derive(Debug, Clone, Copy)]
pub struct CoreTraceLine {
    pub cycle: u64,
    pub pcs: [Instruction; 5],
    pub regs: [i32; 14],
}

pub struct Processor {
    cores: [Core; NUM_CORES],
    bus: Bus,
    memory: MainMemory,
    cycle: u64,
    bus_trace: Vec<BusTraceEvent>,
    core_traces: [Vec<CoreTraceLine>; NUM_CORES],
}

impl Processor {
    #[must_use]
    pub fn new(imems: [Vec<Instruction>; NUM_CORES], memory: MainMemory) -> Self {
        let mut iter = imems.into_iter();
        let cores = std::array::from_fn(|id| {
            Core::new(
                id,
                iter.next().unwrap_or_default(),
            )
        });
        Self {
            cores,
            bus: Bus::default(),
            memory,
            cycle: 0,
            bus_trace: Vec::new(),
            core_traces: std::array::from_fn(|_| Vec::new()),
        }
    }

    #[must_use]
    pub fn cores(&self) -> &[Core; NUM_CORES] {
        &self.cores
    }

    #[must_use]
    pub fn memory(&self) -> &MainMemory {
        &self.memory
    }

    #[must_use]
    pub fn bus_trace(&self) -> &[BusTraceEvent] {
        &self.bus_trace
    }

    #[must_use]
    pub fn core_trace(&self, id: usize) -> &[CoreTraceLine] {
        &self.core_traces[id]
    }

    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Runs until every core has drained its pipeline, recording a
    /// `bustrace.txt` line for every bus event any core produces.
    pub fn run(&mut self) {
        while !self.all_done() {
            self.cycle += 1;
            self.arbitrate();
            for id in 0..NUM_CORES {
                if let Some(event) = self.cores[id].tick(self.cycle) {
                    self.record(id, event);
                }
                self.snapshot_core_trace(id);
            }
            self.release_if_drained();
        }
    }

    fn all_done(&self) -> bool {
        self.cores.iter().all(Core::is_done)
    }

    fn record(&mut self, origin: usize, event: BusEvent) {
        let line = match event {
            BusEvent::Request { cmd, addr, shared } => BusTraceEvent {
                cycle: self.cycle,
                origin,
                cmd,
                addr,
                data: 0,
                shared,
            },
            BusEvent::FlushWord { addr, data } => BusTraceEvent {
                cycle: self.cycle,
                origin,
                cmd: BusCmd::Flush,
                addr,
                data,
                shared: false,
            },
        };
        self.bus_trace.push(line);
    }

    fn snapshot_core_trace(&mut self, id: usize) {
        let core = &self.cores[id];
        let pipeline = &core.pipeline;
        let pcs = [
            pipeline.f.instr,
            pipeline.d.instr,
            pipeline.e.instr,
            pipeline.m.instr,
            pipeline.w.instr,
        ];
        let mut regs = [0; 14];
        for (slot, value) in regs.iter_mut().zip(core.regs.writable_regs()) {
            *slot = value;
        }
        self.core_traces[id].push(CoreTraceLine {
            cycle: self.cycle,
            pcs,
            regs,
        });
    }

    /// §4.4 steps 1-2: find a requester (a core with a cache-miss memory op
    /// waiting on the bus), grant it, resolve whether a sibling cache or
    /// main memory supplies the block, apply the resulting snoop to every
    /// other core, and arm the winner's delay counters.
    fn arbitrate(&mut self) {
        if !self.bus.is_free() {
            return;
        }

        let mut requesters = [false; NUM_CORES];
        let mut is_write = [false; NUM_CORES];
        let mut addrs = [0u32; NUM_CORES];
        for id in 0..NUM_CORES {
            requesters[id] = self.cores[id].wants_bus();
            is_write[id] = self.cores[id].is_writer();
            addrs[id] = self.cores[id].pending_block_base();
        }

        let cores = &self.cores;
        let Some(grant) = self.bus.arbitrate(
            requesters,
            is_write,
            |id| addrs[id],
            |other, winner| cores[other].sibling_state(addrs[winner]),
        ) else {
            return;
        };

        self.service_grant(&grant);
    }

    fn service_grant(&mut self, grant: &Grant) {
        let words = if let Some(supplier) = grant.supplier {
            let words = self.cores[supplier].read_owned_block(grant.block_base);
            self.memory.write_block(grant.block_base, words);
            words
        } else {
            self.memory.read_block(grant.block_base)
        };

        for id in 0..NUM_CORES {
            if id == grant.winner {
                continue;
            }
            match grant.cmd {
                BusCmd::BusRdX => self.cores[id].snoop_invalidate(grant.block_base),
                BusCmd::BusRd => self.cores[id].snoop_downgrade(grant.block_base),
                BusCmd::NoCmd | BusCmd::Flush => {}
            }
        }

        self.cores[grant.winner].begin_transaction(grant, words);
    }

    /// The granted core clears its own `hold_bus` flag the tick its last
    /// word flushes (`memory_stage`); once that happens the bus is free for
    /// the next arbitration.
    fn release_if_drained(&mut self) {
        if let Some(holder) = self.bus.holder() {
            if !self.cores[holder].hold_bus() {
                self.bus.release();
            }
        }
    }
}
