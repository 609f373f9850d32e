//! Writers for the fixed-format output files §6 specifies. Every function
//! here takes an already-open [`std::io::Write`] so callers (production code
//! writing real files, tests writing into a `Vec<u8>`) share the same
//! formatting logic.

use std::io::{self, Write};

use crate::bus::BusCmd;
use crate::cache::Cache;
use crate::core::regfile::RegisterFile;
use crate::core::stats::Statistics;
use crate::memory::MainMemory;
use crate::processor::{BusTraceEvent, CoreTraceLine};

/// One `coreNtrace.txt` line: `cycle pc_F pc_D pc_E pc_M pc_W R2 … R15`.
pub fn write_core_trace_line(out: &mut impl Write, line: &CoreTraceLine) -> io::Result<()> {
    write!(out, "{}", line.cycle)?;
    for instr in &line.pcs {
        write!(out, " {}", instr.pc_field())?;
    }
    for value in line.regs {
        write!(out, " {value:08X}")?;
    }
    writeln!(out)
}

pub fn write_core_trace(out: &mut impl Write, lines: &[CoreTraceLine]) -> io::Result<()> {
    for line in lines {
        write_core_trace_line(out, line)?;
    }
    Ok(())
}

pub fn write_bus_trace(out: &mut impl Write, events: &[BusTraceEvent]) -> io::Result<()> {
    for e in events {
        writeln!(
            out,
            "{} {} {} {:05X} {:08X} {}",
            e.cycle,
            e.origin,
            bus_cmd_code(e.cmd),
            e.addr,
            e.data,
            u8::from(e.shared)
        )?;
    }
    Ok(())
}

const fn bus_cmd_code(cmd: BusCmd) -> u8 {
    match cmd {
        BusCmd::NoCmd => 0,
        BusCmd::BusRd => 1,
        BusCmd::BusRdX => 2,
        BusCmd::Flush => 3,
    }
}

/// `regoutN.txt`: 14 lines, R2..R15.
pub fn write_regout(out: &mut impl Write, regs: &RegisterFile) -> io::Result<()> {
    for value in regs.writable_regs() {
        writeln!(out, "{value:08X}")?;
    }
    Ok(())
}

/// `dsramN.txt`: 256 lines, one word per line, block-major order.
pub fn write_dsram(out: &mut impl Write, cache: &Cache) -> io::Result<()> {
    let mut result = Ok(());
    cache.for_each_word(|word| {
        if result.is_ok() {
            result = writeln!(out, "{word:08X}");
        }
    });
    result
}

/// `tsramN.txt`: 64 lines, `(tag << 2) | state`.
pub fn write_tsram(out: &mut impl Write, cache: &Cache) -> io::Result<()> {
    let mut result = Ok(());
    cache.for_each_tag_state(|entry| {
        if result.is_ok() {
            result = writeln!(out, "{entry:08X}");
        }
    });
    result
}

/// `statsN.txt`: eight `name value` lines, in the fixed order.
pub fn write_stats(out: &mut impl Write, stats: &Statistics) -> io::Result<()> {
    for (name, value) in stats.report_lines() {
        writeln!(out, "{name} {value}")?;
    }
    Ok(())
}

/// `memout.txt`: every word from 0 through the last non-zero word.
pub fn write_memout(out: &mut impl Write, memory: &MainMemory) -> io::Result<()> {
    for word in memory.nonzero_prefix() {
        writeln!(out, "{word:08X}")?;
    }
    Ok(())
}
