//! Per-core direct-mapped cache and the MESI state-transition table.

pub const NUM_BLOCKS: usize = 64;
pub const BLOCK_WORDS: usize = 4;

/// The four MESI states. Ordering doubles as the `tsramN.txt` state encoding
/// (§6): `Invalid=0, Shared=1, Exclusive=2, Modified=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MesiState {
    Invalid = 0,
    Shared = 1,
    Exclusive = 2,
    Modified = 3,
}

impl MesiState {
    #[must_use]
    pub const fn encoding(self) -> u32 {
        self as u32
    }
}

/// Coherence events a block can react to. Kept separate from the ordinary
/// hit/miss read-write path so the whole transition table lives in one
/// function (`next_state`) rather than scattered across cache and bus code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoherenceEvent {
    LocalWrite,
    /// Another core issued `BusRd` against this block.
    SnoopBusRd,
    /// Another core issued `BusRdX` against this block.
    SnoopBusRdX,
}

/// The single place MESI transitions are decided. `(Modified, SnoopBusRd) =>
/// Shared` encodes the spec's resolution of its own Open Question #1: a
/// dirty owner that supplies data for a `BusRd` ends in `Shared`, not
/// transiently `Exclusive`.
#[must_use]
pub const fn next_state(state: MesiState, event: CoherenceEvent) -> MesiState {
    use CoherenceEvent::{LocalWrite, SnoopBusRd, SnoopBusRdX};
    use MesiState::{Exclusive, Invalid, Modified, Shared};
    match (state, event) {
        (Invalid, _) => Invalid,
        (_, LocalWrite) => Modified,
        (_, SnoopBusRdX) => Invalid,
        (Modified | Exclusive | Shared, SnoopBusRd) => Shared,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CacheBlock {
    pub tag: u32,
    pub state: MesiState,
    pub data: [i32; BLOCK_WORDS],
    pub last_touch_cycle: u64,
}

impl Default for CacheBlock {
    fn default() -> Self {
        Self {
            tag: 0,
            state: MesiState::Invalid,
            data: [0; BLOCK_WORDS],
            last_touch_cycle: 0,
        }
    }
}

/// A word address decomposed per §3: `offset = A mod 4`,
/// `cache_index = (A div 4) mod 64`, `tag = A div (4*64)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressParts {
    pub offset: usize,
    pub index: usize,
    pub tag: u32,
}

#[must_use]
pub fn decompose(word_addr: u32) -> AddressParts {
    let offset = (word_addr % 4) as usize;
    let index = ((word_addr / 4) % NUM_BLOCKS as u32) as usize;
    let tag = word_addr / (4 * NUM_BLOCKS as u32);
    AddressParts { offset, index, tag }
}

#[derive(Debug, Clone)]
pub struct Cache {
    blocks: [CacheBlock; NUM_BLOCKS],
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            blocks: [CacheBlock::default(); NUM_BLOCKS],
        }
    }
}

impl Cache {
    #[must_use]
    pub fn block(&self, index: usize) -> &CacheBlock {
        &self.blocks[index]
    }

    /// Hit iff the resident block at this index is valid and its tag matches.
    #[must_use]
    pub fn lookup(&self, addr: u32) -> bool {
        let parts = decompose(addr);
        let b = &self.blocks[parts.index];
        b.state != MesiState::Invalid && b.tag == parts.tag
    }

    /// Returns the state of whatever block currently occupies this index,
    /// matched against `addr`'s tag. Used by the bus to decide who, if
    /// anyone, is a requester's snoop target.
    #[must_use]
    pub fn state_for(&self, addr: u32) -> Option<MesiState> {
        let parts = decompose(addr);
        let b = &self.blocks[parts.index];
        (b.tag == parts.tag && b.state != MesiState::Invalid).then_some(b.state)
    }

    /// Requires a hit.
    #[must_use]
    pub fn read_word(&self, addr: u32) -> i32 {
        let parts = decompose(addr);
        self.blocks[parts.index].data[parts.offset]
    }

    /// Requires a hit. Overwrites the word and transitions to Modified.
    pub fn write_word(&mut self, addr: u32, word: i32) {
        let parts = decompose(addr);
        let block = &mut self.blocks[parts.index];
        block.data[parts.offset] = word;
        block.state = next_state(block.state, CoherenceEvent::LocalWrite);
    }

    /// Unconditionally overwrites the resident block at `index`. Eviction of
    /// whatever was there is implicit and silent (§4.2/§7): memory stays
    /// consistent by construction because a dirty block is always flushed by
    /// the bus transaction machinery before this is called for an
    /// *installing* core, and a core never installs over its own dirty data
    /// without having just serviced that same address.
    pub fn install(&mut self, addr: u32, incoming: [i32; BLOCK_WORDS], state: MesiState, cycle: u64) {
        let parts = decompose(addr);
        self.blocks[parts.index] = CacheBlock {
            tag: parts.tag,
            state,
            data: incoming,
            last_touch_cycle: cycle,
        };
    }

    /// For a block matching `(tag, index)` of `addr`: any non-Invalid state
    /// becomes Invalid. A no-op if the block doesn't match or is already
    /// Invalid.
    pub fn snoop_invalidate(&mut self, addr: u32) {
        let parts = decompose(addr);
        let block = &mut self.blocks[parts.index];
        if block.tag == parts.tag && block.state != MesiState::Invalid {
            block.state = next_state(block.state, CoherenceEvent::SnoopBusRdX);
        }
    }

    /// For a block matching `(tag, index)` of `addr`: Modified or Exclusive
    /// becomes Shared. A no-op otherwise (including Shared, which stays
    /// Shared, and Invalid, which stays Invalid).
    pub fn snoop_downgrade(&mut self, addr: u32) {
        let parts = decompose(addr);
        let block = &mut self.blocks[parts.index];
        if block.tag == parts.tag
            && matches!(block.state, MesiState::Modified | MesiState::Exclusive)
        {
            block.state = next_state(block.state, CoherenceEvent::SnoopBusRd);
        }
    }

    /// `dsramN.txt`: 256 lines, one word per line, block-major order.
    pub fn for_each_word(&self, mut f: impl FnMut(i32)) {
        for block in &self.blocks {
            for word in block.data {
                f(word);
            }
        }
    }

    /// `tsramN.txt`: 64 lines, `(tag << 2) | state`.
    pub fn for_each_tag_state(&self, mut f: impl FnMut(u32)) {
        for block in &self.blocks {
            f((block.tag << 2) | block.state.encoding());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// I1 precursor: `decompose` always reconstructs the original word
        /// address from `tag`, `index`, `offset`, and `offset`/`index` never
        /// escape their block/cache bounds.
        #[test]
        fn decompose_reconstructs_address(word_addr in 0u32..10_000_000) {
            let parts = decompose(word_addr);
            prop_assert!(parts.offset < BLOCK_WORDS);
            prop_assert!(parts.index < NUM_BLOCKS);
            let rebuilt = parts.tag * (BLOCK_WORDS as u32 * NUM_BLOCKS as u32)
                + parts.index as u32 * BLOCK_WORDS as u32
                + parts.offset as u32;
            prop_assert_eq!(rebuilt, word_addr);
        }

        /// I1: a snooped `BusRdX` always leaves a block Invalid, regardless
        /// of the state it started in — the invariant a dirty/exclusive/
        /// shared owner can never survive another core's exclusive request.
        #[test]
        fn snoop_busrdx_always_ends_invalid(
            state in prop_oneof![
                Just(MesiState::Invalid),
                Just(MesiState::Shared),
                Just(MesiState::Exclusive),
                Just(MesiState::Modified),
            ]
        ) {
            prop_assert_eq!(next_state(state, CoherenceEvent::SnoopBusRdX), MesiState::Invalid);
        }

        /// I1: a snooped `BusRd` never leaves a block Modified or Exclusive
        /// — any owner that answers a shared read downgrades to Shared (or
        /// stays Invalid), so no two caches can disagree about exclusivity.
        #[test]
        fn snoop_busrd_never_leaves_exclusive_ownership(
            state in prop_oneof![
                Just(MesiState::Invalid),
                Just(MesiState::Shared),
                Just(MesiState::Exclusive),
                Just(MesiState::Modified),
            ]
        ) {
            let next = next_state(state, CoherenceEvent::SnoopBusRd);
            prop_assert!(matches!(next, MesiState::Invalid | MesiState::Shared));
        }
    }

    #[test]
    fn address_decomposition_matches_spec_example() {
        // A = 260 -> offset 0, index (260/4)%64 = 65%64 = 1, tag 260/256 = 1
        let parts = decompose(260);
        assert_eq!(parts.offset, 0);
        assert_eq!(parts.index, 1);
        assert_eq!(parts.tag, 1);
    }

    #[test]
    fn install_then_read_round_trips() {
        let mut cache = Cache::default();
        cache.install(260, [10, 20, 30, 40], MesiState::Shared, 0);
        assert!(cache.lookup(260));
        assert_eq!(cache.read_word(260), 10);
        assert_eq!(cache.read_word(261), 20);
    }

    #[test]
    fn write_word_sets_modified() {
        let mut cache = Cache::default();
        cache.install(260, [0, 0, 0, 0], MesiState::Exclusive, 0);
        cache.write_word(261, 99);
        assert_eq!(cache.read_word(261), 99);
        assert_eq!(cache.block(1).state, MesiState::Modified);
    }

    #[test]
    fn snoop_invalidate_clears_modified() {
        let mut cache = Cache::default();
        cache.install(260, [1, 2, 3, 4], MesiState::Modified, 0);
        cache.snoop_invalidate(260);
        assert_eq!(cache.block(1).state, MesiState::Invalid);
    }

    #[test]
    fn snoop_downgrade_leaves_shared_untouched() {
        let mut cache = Cache::default();
        cache.install(260, [1, 2, 3, 4], MesiState::Shared, 0);
        cache.snoop_downgrade(260);
        assert_eq!(cache.block(1).state, MesiState::Shared);
    }

    #[test]
    fn dirty_owner_snooped_by_busrd_ends_shared() {
        let mut cache = Cache::default();
        cache.install(260, [1, 2, 3, 4], MesiState::Modified, 0);
        cache.snoop_downgrade(260);
        assert_eq!(cache.block(1).state, MesiState::Shared);
    }
}
