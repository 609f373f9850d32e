//! The five pipeline registers and the scratch wrapper around an
//! [`Instruction`] that carries per-tick, non-architectural state.

use crate::isa::Instruction;

/// An instruction plus the scratch field §3 lists as "carried pipeline
/// scratch": `alu_result`. Kept off `Instruction` itself (§9 design note) so
/// decoded instructions stay plain, immutable data and only the in-flight
/// pipeline register mutates them. The bus/block/extra-delay counters for an
/// in-flight miss live on `Core`'s private `PendingTransfer` instead, since
/// that state outlives any single pipeline register's M slot as the
/// instruction it belongs to is re-examined tick after tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineSlot {
    pub instr: Instruction,
    pub alu_result: i32,
}

impl PipelineSlot {
    #[must_use]
    pub fn bubble() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_bubble(&self) -> bool {
        self.instr.is_bubble()
    }
}

/// The tuple `(F, D, E, M, W)` of pipeline registers (§3).
#[derive(Debug, Default)]
pub struct PipelineRegs {
    pub f: PipelineSlot,
    pub d: PipelineSlot,
    pub e: PipelineSlot,
    pub m: PipelineSlot,
    pub w: PipelineSlot,
}
