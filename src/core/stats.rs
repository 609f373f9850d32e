//! Per-core statistics counters (§3, §6 `statsN.txt`).

#[derive(Debug, Default, Clone, Copy, serde::Serialize)]
pub struct Statistics {
    pub total_cycles: u64,
    pub total_instructions: u64,
    pub read_hit: u64,
    pub write_hit: u64,
    pub read_miss: u64,
    pub write_miss: u64,
    /// Raw count of ticks where W held STALL; not yet adjusted for the fixed
    /// fill and `mem_stall` per §4.1's bookkeeping rule.
    pub decode_stall_raw: u64,
    pub mem_stall: u64,
}

/// The fixed per-run drain fill subtracted out of `decode_stall_raw` so the
/// reported `decode_stall` reflects decode-induced stalls only (§4.1).
const FIXED_DRAIN_FILL: u64 = 4;

impl Statistics {
    /// `decode_stall` as reported in `statsN.txt`: the raw count, less the
    /// unavoidable drain fill and the memory-induced stalls already counted
    /// separately.
    #[must_use]
    pub fn decode_stall(&self) -> u64 {
        self.decode_stall_raw
            .saturating_sub(self.mem_stall)
            .saturating_sub(FIXED_DRAIN_FILL)
    }

    /// The eight `name value` lines of `statsN.txt`, in the required order.
    #[must_use]
    pub fn report_lines(&self) -> [(&'static str, u64); 8] {
        [
            ("cycles", self.total_cycles),
            ("instructions", self.total_instructions),
            ("read_hit", self.read_hit),
            ("write_hit", self.write_hit),
            ("read_miss", self.read_miss),
            ("write_miss", self.write_miss),
            ("decode_stall", self.decode_stall()),
            ("mem_stall", self.mem_stall),
        ]
    }
}
