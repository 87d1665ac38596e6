//! Assembling and executing a program in one call.
//!
//! This module ties the parser, simulator, and dump extraction together
//! into the single entry point embedders call:
//! - [`assemble_and_run`]: parse source, execute it on a fresh machine, dump a window
//! - [`RunOutput`]: the result contract, serializable to the JSON shape consumers expect
//! - [`RunErr`]: the failure of whichever pipeline stage gave out first
//!
//! ## Example
//!
//! ```
//! use uvm::run::assemble_and_run;
//!
//! let out = assemble_and_run("CONST 862, 457", 456, 459).unwrap();
//!
//! assert_eq!(out.program, ["Instr(op=<Op.CONST: 1>, A=4, B=862, C=457, D=0)"]);
//! assert_eq!(out.memory[1].address, 457);
//! assert_eq!(out.memory[1].value, "862");
//! ```

use serde::Serialize;

use crate::err::ErrSpan;
use crate::parse::{parse_program, ParseErr};
use crate::sim::{DumpRange, MemCell, RangeErr, SimErr, Simulator};

/// The result of a successful [`assemble_and_run`] call.
///
/// Serializes with camelCase keys (`dumpStart`, `dumpEnd`), which is the
/// shape the presentation layer consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    /// The program listing, one record per instruction in execution order.
    pub program: Vec<String>,
    /// The first address of the dumped window.
    pub dump_start: usize,
    /// One past the last address of the dumped window.
    pub dump_end: usize,
    /// The dumped window, one record per address.
    pub memory: Vec<MemCell>,
}

/// Parses and executes a program, returning a window of the final memory.
///
/// The pipeline validates the dump window first, then parses the whole
/// source, then executes it on a fresh zeroed machine, and finally reads
/// out `[dump_start, dump_end)`. The first failing stage aborts the call;
/// no partial program or memory is returned.
pub fn assemble_and_run(src: &str, dump_start: i64, dump_end: i64) -> Result<RunOutput, RunErr> {
    let range = DumpRange::new(dump_start, dump_end)?;
    let program = parse_program(src)?;

    let mut sim = Simulator::new();
    sim.run(&program)?;

    Ok(RunOutput {
        program: program.listing(),
        dump_start: range.start(),
        dump_end: range.end(),
        memory: sim.dump(&range),
    })
}

/// Any error that can abort [`assemble_and_run`], tagged by pipeline stage.
#[derive(Debug)]
pub enum RunErr {
    /// The dump window was rejected.
    Range(RangeErr),
    /// The source failed to parse.
    Parse(ParseErr),
    /// An instruction failed during execution.
    Sim(SimErr),
}
impl From<RangeErr> for RunErr {
    fn from(value: RangeErr) -> Self {
        RunErr::Range(value)
    }
}
impl From<ParseErr> for RunErr {
    fn from(value: ParseErr) -> Self {
        RunErr::Parse(value)
    }
}
impl From<SimErr> for RunErr {
    fn from(value: SimErr) -> Self {
        RunErr::Sim(value)
    }
}
impl std::fmt::Display for RunErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunErr::Range(e) => e.fmt(f),
            RunErr::Parse(e) => e.fmt(f),
            RunErr::Sim(e)   => e.fmt(f),
        }
    }
}
impl std::error::Error for RunErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunErr::Range(e) => Some(e),
            RunErr::Parse(e) => Some(e),
            RunErr::Sim(e)   => Some(e),
        }
    }
}
impl crate::err::Error for RunErr {
    fn span(&self) -> Option<ErrSpan> {
        match self {
            RunErr::Range(e) => e.span(),
            RunErr::Parse(e) => e.span(),
            RunErr::Sim(e)   => e.span(),
        }
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            RunErr::Range(e) => e.help(),
            RunErr::Parse(e) => e.help(),
            RunErr::Sim(e)   => e.help(),
        }
    }
}
