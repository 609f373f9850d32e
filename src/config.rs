//! CLI argument parsing and the file-path table it resolves to (§6).

use std::path::PathBuf;

use clap::Parser;

use crate::error::{Result, SimError};

/// Accepts either zero or exactly 27 positional file-path arguments; clap's
/// derive API can't express "0 or 27" directly, so this collects them
/// loosely and [`FileNames::resolve`] does the arity check.
#[derive(Debug, Parser)]
#[command(
    name = "coremesi",
    about = "Cycle-accurate simulator of a four-core MESI multi-processor"
)]
pub struct Cli {
    /// imem0..3 memin memout regout0..3 core0trace..3 bustrace dsram0..3 \
    /// tsram0..3 stats0..3, in that order. Supply all 27 or none.
    paths: Vec<PathBuf>,

    /// Also dump final per-core statistics as JSON at this path.
    #[arg(long)]
    pub stats_json: Option<PathBuf>,
}

/// The 27 named file roles spec §6 lists, resolved from either the default
/// names or the 27 positional CLI arguments.
#[derive(Debug, Clone)]
pub struct FileNames {
    pub imem: [PathBuf; 4],
    pub memin: PathBuf,
    pub memout: PathBuf,
    pub regout: [PathBuf; 4],
    pub core_trace: [PathBuf; 4],
    pub bus_trace: PathBuf,
    pub dsram: [PathBuf; 4],
    pub tsram: [PathBuf; 4],
    pub stats: [PathBuf; 4],
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            imem: std::array::from_fn(|i| PathBuf::from(format!("imem{i}.txt"))),
            memin: PathBuf::from("memin.txt"),
            memout: PathBuf::from("memout.txt"),
            regout: std::array::from_fn(|i| PathBuf::from(format!("regout{i}.txt"))),
            core_trace: std::array::from_fn(|i| PathBuf::from(format!("core{i}trace.txt"))),
            bus_trace: PathBuf::from("bustrace.txt"),
            dsram: std::array::from_fn(|i| PathBuf::from(format!("dsram{i}.txt"))),
            tsram: std::array::from_fn(|i| PathBuf::from(format!("tsram{i}.txt"))),
            stats: std::array::from_fn(|i| PathBuf::from(format!("stats{i}.txt"))),
        }
    }
}

impl FileNames {
    /// `paths` must be empty (defaults) or exactly 27 entries in the order
    /// §6 lists: imem0..3, memin, memout, regout0..3, core0trace..3,
    /// bustrace, dsram0..3, tsram0..3, stats0..3.
    pub fn resolve(paths: &[PathBuf]) -> Result<Self> {
        if paths.is_empty() {
            return Ok(Self::default());
        }
        if paths.len() != 27 {
            return Err(SimError::TooManyArguments { got: paths.len() });
        }

        let mut owned = paths.to_vec().into_iter();
        let mut take4 = |it: &mut std::vec::IntoIter<PathBuf>| -> [PathBuf; 4] {
            std::array::from_fn(|_| it.next().unwrap_or_default())
        };
        let imem = take4(&mut owned);
        let memin = owned.next().unwrap_or_default();
        let memout = owned.next().unwrap_or_default();
        let regout = take4(&mut owned);
        let core_trace = take4(&mut owned);
        let bus_trace = owned.next().unwrap_or_default();
        let dsram = take4(&mut owned);
        let tsram = take4(&mut owned);
        let stats = take4(&mut owned);

        Ok(Self {
            imem,
            memin,
            memout,
            regout,
            core_trace,
            bus_trace,
            dsram,
            tsram,
            stats,
        })
    }
}

impl Cli {
    pub fn file_names(&self) -> Result<FileNames> {
        FileNames::resolve(&self.paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_paths_resolve_to_defaults() {
        let names = FileNames::resolve(&[]).unwrap();
        assert_eq!(names.imem[0], PathBuf::from("imem0.txt"));
        assert_eq!(names.bus_trace, PathBuf::from("bustrace.txt"));
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let paths = vec![PathBuf::from("a"); 5];
        assert!(matches!(
            FileNames::resolve(&paths),
            Err(SimError::TooManyArguments { got: 5 })
        ));
    }

    #[test]
    fn exactly_27_paths_resolve_in_order() {
        let paths: Vec<PathBuf> = (0..27).map(|i| PathBuf::from(format!("f{i}"))).collect();
        let names = FileNames::resolve(&paths).unwrap();
        assert_eq!(names.imem[0], PathBuf::from("f0"));
        assert_eq!(names.imem[3], PathBuf::from("f3"));
        assert_eq!(names.memin, PathBuf::from("f4"));
        assert_eq!(names.memout, PathBuf::from("f5"));
        assert_eq!(names.regout[0], PathBuf::from("f6"));
        assert_eq!(names.core_trace[0], PathBuf::from("f10"));
        assert_eq!(names.bus_trace, PathBuf::from("f14"));
        assert_eq!(names.dsram[0], PathBuf::from("f15"));
        assert_eq!(names.tsram[0], PathBuf::from("f19"));
        assert_eq!(names.stats[0], PathBuf::from("f23"));
    }
}
