use crate::core::Core;
use crate::core::IMEM_SIZE;
use crate::core::pipeline::PipelineSlot;

/// Fetch (§4.1): emits `IMEM[PC]` with `alu_result=0`, or `STALL` once PC
/// runs past the image, then advances PC. Branch resolution (which may
/// override PC) happens in decode, evaluated earlier this same tick, so by
/// the time fetch runs it just reads whatever PC decode left behind.
pub fn fetch_stage(core: &mut Core) {
    let pc = core.pc;
    core.pipeline.f = if (pc as usize) < IMEM_SIZE {
        let instr = core.imem_at(pc).unwrap_or_default();
        PipelineSlot {
            instr,
            alu_result: 0,
        }
    } else {
        PipelineSlot::bubble()
    };
    core.pc = pc.wrapping_add(1);
}
