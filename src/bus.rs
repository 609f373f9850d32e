//! The shared bus: round-robin arbitration and the coherence decision at
//! grant time. Actually applying a grant (writing sibling caches, mutating
//! main memory, arming a core's delay counters) is done by
//! [`crate::processor::Processor`] — this module only decides *who* wins and
//! *what* the resulting transaction looks like, per the design note that
//! snoops are messages the arbiter hands back, not mutable aliases it reaches
//! through.

use crate::core::NUM_CORES;

pub const BUS_FIRST_WORD_DELAY: u32 = 17;
pub const BUS_BLOCK_TRANSFER_DELAY: u32 = 4;
pub const BUS_WRITEBACK_EXTRA_DELAY: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusCmd {
    NoCmd = 0,
    BusRd = 1,
    BusRdX = 2,
    Flush = 3,
}

/// The decision the arbiter hands back for one granted transaction. The
/// requester installs `new_state`; if `supplier` is `Some`, that core's
/// cache held the block Modified and must be flushed and downgraded before
/// the requester's install is visible.
#[derive(Debug, Clone, Copy)]
pub struct Grant {
    pub winner: usize,
    pub cmd: BusCmd,
    pub block_base: u32,
    pub shared: bool,
    pub supplier: Option<usize>,
}

/// Fixed-length rotation of the four core indices, modeled as a single head
/// pointer rather than a linked list (§9 design note).
#[derive(Debug, Clone, Copy)]
pub struct RoundRobin {
    next: usize,
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self { next: 0 }
    }
}

impl RoundRobin {
    /// Scans head-to-tail starting at `next` and returns the first core
    /// flagged as a requester, if any.
    #[must_use]
    pub fn pick(&self, requesters: [bool; NUM_CORES]) -> Option<usize> {
        (0..NUM_CORES)
            .map(|i| (self.next + i) % NUM_CORES)
            .find(|&core| requesters[core])
    }

    /// Rotates the winner to the tail of the queue: the next scan starts
    /// right after it.
    pub fn grant(&mut self, winner: usize) {
        self.next = (winner + 1) % NUM_CORES;
    }
}

/// Tracks which core, if any, currently holds the bus. Arbitration and the
/// resulting `hold_bus` bookkeeping are both driven from here so there is
/// one place that enforces "at most one core holds the bus" (§5).
#[derive(Debug, Default)]
pub struct Bus {
    queue: RoundRobin,
    holder: Option<usize>,
}

impl Bus {
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.holder.is_none()
    }

    #[must_use]
    pub const fn holder(&self) -> Option<usize> {
        self.holder
    }

    /// Runs round-robin arbitration and, on a hit, resolves the data-source
    /// rule from §4.3:
    ///
    /// 1. another cache holds Modified -> that cache supplies, requester
    ///    installs Exclusive-turned-Shared after flush (both end Shared);
    /// 2. another cache holds Shared/Exclusive -> memory supplies, response
    ///    is marked `shared` so the requester installs Shared;
    /// 3. nobody else has it -> memory supplies, requester installs
    ///    Exclusive (lw) or, after the following store, Modified (sw).
    pub fn arbitrate(
        &mut self,
        requesters: [bool; NUM_CORES],
        is_write: [bool; NUM_CORES],
        block_base_of: impl Fn(usize) -> u32,
        sibling_state: impl Fn(usize, usize) -> Option<crate::cache::MesiState>,
    ) -> Option<Grant> {
        if !self.is_free() {
            return None;
        }
        let winner = self.queue.pick(requesters)?;
        self.queue.grant(winner);
        self.holder = Some(winner);

        let block_base = block_base_of(winner);
        let cmd = if is_write[winner] {
            BusCmd::BusRdX
        } else {
            BusCmd::BusRd
        };

        let mut supplier = None;
        let mut shared = false;
        for other in 0..NUM_CORES {
            if other == winner {
                continue;
            }
            match sibling_state(other, winner) {
                Some(crate::cache::MesiState::Modified) => {
                    supplier = Some(other);
                    shared = matches!(cmd, BusCmd::BusRd);
                }
                Some(crate::cache::MesiState::Shared | crate::cache::MesiState::Exclusive) => {
                    shared = shared || matches!(cmd, BusCmd::BusRd);
                }
                _ => {}
            }
        }

        Some(Grant {
            winner,
            cmd,
            block_base,
            shared,
            supplier,
        })
    }

    /// Releases the bus once the holding core's transfer has fully drained.
    pub fn release(&mut self) {
        self.holder = None;
    }
}
