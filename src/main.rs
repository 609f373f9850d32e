//! Entry point: parse the CLI, load IMEM/memin, run the simulator, and
//! write every fixed-format output file §6 specifies.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use coremesi::config::{Cli, FileNames};
use coremesi::core::NUM_CORES;
use coremesi::error::{Result, SimError};
use coremesi::isa::decoder::parse_instruction;
use coremesi::isa::{Instruction, Opcode};
use coremesi::memory::MainMemory;
use coremesi::processor::Processor;
use coremesi::trace;

/// Instructions appended after the last parsed line of every IMEM file, per
/// §6: one HALT, then up to 5 STALLs so the pipeline has enough fetches left
/// to fully drain once HALT reaches execute.
const DRAIN_STALLS: i32 = 5;

fn main() -> ExitCode {
    install_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("coremesi: {err}");
            ExitCode::FAILURE
        }
    }
}

fn install_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("COREMESI_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let files = cli.file_names()?;

    let imems = load_all_imems(&files.imem)?;
    let memory = load_memin(&files.memin)?;

    let mut processor = Processor::new(imems, memory);
    processor.run();

    write_outputs(&processor, &files)?;

    if let Some(path) = &cli.stats_json {
        write_stats_json(&processor, path)?;
    }

    Ok(())
}

fn load_all_imems(paths: &[std::path::PathBuf; NUM_CORES]) -> Result<[Vec<Instruction>; NUM_CORES]> {
    let mut imems: [Vec<Instruction>; NUM_CORES] = std::array::from_fn(|_| Vec::new());
    for (slot, path) in imems.iter_mut().zip(paths) {
        *slot = load_imem(path)?;
    }
    Ok(imems)
}

fn load_imem(path: &Path) -> Result<Vec<Instruction>> {
    let text = std::fs::read_to_string(path).map_err(|source| SimError::OpenFile {
        path: path.to_path_buf(),
        source,
    })?;

    let mut imem = Vec::new();
    let mut pc: i32 = 0;
    for (line_no, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_instruction(line, pc) {
            Some(instr) => {
                imem.push(instr);
                pc += 1;
            }
            None => {
                tracing::warn!(
                    file = %path.display(),
                    line = line_no + 1,
                    text = line,
                    "skipping malformed IMEM line"
                );
            }
        }
    }

    imem.push(Instruction {
        pc,
        opcode: Opcode::Halt,
        rd: 0,
        rs: 0,
        rt: 0,
        imm: 0,
    });
    pc += 1;

    for _ in 0..DRAIN_STALLS {
        imem.push(Instruction {
            pc,
            opcode: Opcode::Stall,
            rd: 0,
            rs: 0,
            rt: 0,
            imm: 0,
        });
        pc += 1;
    }

    Ok(imem)
}

fn load_memin(path: &Path) -> Result<MainMemory> {
    let text = std::fs::read_to_string(path).map_err(|source| SimError::OpenFile {
        path: path.to_path_buf(),
        source,
    })?;
    let words = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| u32::from_str_radix(l, 16).unwrap_or(0) as i32)
        .collect();
    Ok(MainMemory::from_words(words))
}

fn write_outputs(processor: &Processor, files: &FileNames) -> Result<()> {
    for id in 0..NUM_CORES {
        write_file(&files.core_trace[id], |w| {
            trace::write_core_trace(w, processor.core_trace(id))
        })?;
        write_file(&files.regout[id], |w| {
            trace::write_regout(w, &processor.cores()[id].regs)
        })?;
        write_file(&files.dsram[id], |w| {
            trace::write_dsram(w, &processor.cores()[id].cache)
        })?;
        write_file(&files.tsram[id], |w| {
            trace::write_tsram(w, &processor.cores()[id].cache)
        })?;
        write_file(&files.stats[id], |w| {
            trace::write_stats(w, &processor.cores()[id].stats)
        })?;
    }

    write_file(&files.bus_trace, |w| {
        trace::write_bus_trace(w, processor.bus_trace())
    })?;
    write_file(&files.memout, |w| trace::write_memout(w, processor.memory()))?;

    Ok(())
}

fn write_file(path: &Path, body: impl FnOnce(&mut BufWriter<File>) -> std::io::Result<()>) -> Result<()> {
    let file = File::create(path).map_err(|source| SimError::WriteFile {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    body(&mut writer).map_err(|source| SimError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

fn write_stats_json(processor: &Processor, path: &Path) -> Result<()> {
    let all: [_; NUM_CORES] = std::array::from_fn(|id| processor.cores()[id].stats);
    let file = File::create(path).map_err(|source| SimError::WriteFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(file, &all).map_err(|source| SimError::WriteFile {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::Other, source),
    })
}
