//! Error types for the simulator's I/O and input-parsing boundaries.
//!
//! Per-cycle simulation logic never fails: an out-of-range register index is
//! rewritten to `STALL` in place (see [`crate::isa::Instruction`]) rather than
//! raising an error, and a malformed instruction line is skipped with a
//! warning rather than aborting the run. [`SimError`] exists for the failures
//! that genuinely stop the simulator: missing input files, unwritable output
//! files, and a CLI invocation with the wrong argument count.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("could not read {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("expected 0 or 27 file-path arguments, got {got}")]
    TooManyArguments { got: usize },
}
