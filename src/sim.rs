//! Simulating and executing UVM programs.
//!
//! This module is focused on executing parsed or decoded code (i.e., [`Program`]).
//!
//! This module consists of:
//! - [`Simulator`]: The struct that executes UVM programs.
//! - [`mem`]: The module handling the simulator's memory.
//! - [`DumpRange`]: A validated window of addresses to read out after a run.
//!
//! # Usage
//!
//! To simulate a program, instantiate a `Simulator` and run a program on it:
//!
//! ```
//! use uvm::parse::parse_program;
//! use uvm::sim::Simulator;
//!
//! let program = parse_program("CONST 7, 10").unwrap();
//!
//! let mut simulator = Simulator::new();
//! simulator.run(&program).unwrap();
//!
//! assert_eq!(simulator.mem.read(10), Ok(7));
//! ```
//!
//! After a run, a window of the final memory state can be read out with
//! [`Simulator::dump`] (address/value records) or [`Simulator::dump_words`]
//! (raw words):
//!
//! ```
//! # use uvm::parse::parse_program;
//! # use uvm::sim::{DumpRange, Simulator};
//! # let program = parse_program("CONST 7, 10").unwrap();
//! # let mut simulator = Simulator::new();
//! # simulator.run(&program).unwrap();
//! let range = DumpRange::new(9, 12).unwrap();
//! assert_eq!(simulator.dump_words(&range), [0, 7, 0]);
//! ```

pub mod mem;

use serde::Serialize;

use crate::ast::{Instr, Opcode, Program};

use self::mem::{Mem, MEM_SIZE};

/// Executes UVM programs.
///
/// A fresh simulator holds zeroed memory. Each call to [`Simulator::run`]
/// executes a program against the current memory in one linear pass;
/// the memory is not cleared between runs.
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    /// The simulator's memory.
    ///
    /// Note that this is held in the heap, as it is too large for the stack.
    pub mem: Mem,

    /// The number of instructions successfully run since this simulator was created.
    ///
    /// This can be set to 0 to reset the counter.
    pub instructions_run: u64,
}

impl Simulator {
    /// Creates a new simulator with zeroed memory.
    pub fn new() -> Self {
        Simulator::default()
    }

    /// Executes a program, one linear pass from its first instruction to its last.
    ///
    /// Execution stops at the first failing instruction. Memory keeps
    /// whatever the instructions before the failing one wrote.
    pub fn run(&mut self, program: &Program) -> Result<(), SimErr> {
        for instr in program {
            self.execute(instr)?;
        }

        Ok(())
    }

    /// Executes one instruction.
    fn execute(&mut self, instr: &Instr) -> Result<(), SimErr> {
        let Instr { op, b, c, d } = *instr;

        match op {
            // mem[C] = B
            Opcode::Const => {
                self.mem.write(c, i128::from(b))?;
            }
            // mem[C] = mem[mem[B]]
            Opcode::Load => {
                let addr = resolve(self.mem.read(b)?)?;
                let value = self.mem.read(addr)?;
                self.mem.write(c, i128::from(value))?;
            }
            // mem[mem[mem[C]]] = mem[mem[B]]
            Opcode::Store => {
                let src = resolve(self.mem.read(b)?)?;
                let value = self.mem.read(src)?;

                let outer = resolve(self.mem.read(c)?)?;
                let dest = resolve(self.mem.read(outer)?)?;
                self.mem.write(dest, i128::from(value))?;
            }
            // mem[C] = reverse of mem[mem[B] + D]
            Opcode::Bitrev => {
                let base = resolve(self.mem.read(b)?)?;
                let src = resolve_wide(i128::from(base) + i128::from(d))?;
                let value = self.mem.read(src)?;
                self.mem.write(c, i128::from(value.reverse_bits()))?;
            }
        }

        self.instructions_run = self.instructions_run.wrapping_add(1);
        Ok(())
    }

    /// Reads the window of memory named by `range`, one record per address.
    pub fn dump(&self, range: &DumpRange) -> Vec<MemCell> {
        (range.start..range.end)
            .map(|address| MemCell {
                address,
                value: self.mem.as_slice()[address].to_string(),
            })
            .collect()
    }

    /// Reads the window of memory named by `range` as raw words.
    pub fn dump_words(&self, range: &DumpRange) -> Vec<u64> {
        self.mem.as_slice()[range.start..range.end].to_vec()
    }
}

/// Verifies that a word holds a usable address, returning that address.
///
/// This is the sole path by which a stored word becomes an address:
/// every instruction that treats memory contents as a pointer goes
/// through this check.
pub fn resolve(value: u64) -> Result<i64, SimErr> {
    resolve_wide(i128::from(value))
}

// Bound check shared by resolve and BITREV's computed source,
// which can fall outside the u64 range in either direction.
fn resolve_wide(value: i128) -> Result<i64, SimErr> {
    match (0..MEM_SIZE as i128).contains(&value) {
        true => Ok(value as i64),
        false => Err(SimErr::BadPointer(value)),
    }
}

/// Errors that can occur during execution.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SimErr {
    /// An instruction accessed an address outside the memory.
    AccessOutOfBounds(i64),
    /// A word was used as a pointer, but its value does not name an address.
    BadPointer(i128),
}
impl std::fmt::Display for SimErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimErr::AccessOutOfBounds(addr) => write!(f, "address {addr} is out of bounds"),
            SimErr::BadPointer(value)       => write!(f, "pointer value {value} is not a valid address"),
        }
    }
}
impl std::error::Error for SimErr {}
impl crate::err::Error for SimErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            SimErr::AccessOutOfBounds(_) => Some(format!("addresses must lie in [0, {MEM_SIZE})").into()),
            SimErr::BadPointer(_) => Some(format!("a word used as a pointer must hold an address in [0, {MEM_SIZE})").into()),
        }
    }
}

/// A validated window of addresses to read out after a run.
///
/// `start` is inclusive and `end` is exclusive. Construction verifies
/// `0 <= start < end <= MEM_SIZE`, so an existing range always names
/// addresses inside the memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpRange {
    start: usize,
    end: usize,
}

impl DumpRange {
    /// Creates a dump range, failing unless `0 <= start < end <= MEM_SIZE`.
    pub fn new(start: i64, end: i64) -> Result<DumpRange, RangeErr> {
        if start < 0 || end <= start {
            return Err(RangeErr::InvalidWindow { start, end });
        }
        if end > MEM_SIZE as i64 {
            return Err(RangeErr::EndOutOfBounds { end });
        }

        Ok(DumpRange {
            start: start as usize,
            end: end as usize,
        })
    }

    /// The first address of the window.
    pub fn start(self) -> usize {
        self.start
    }

    /// One past the last address of the window.
    pub fn end(self) -> usize {
        self.end
    }
}

/// Errors that can occur from validating a dump window.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RangeErr {
    /// The window is not a well-formed range (negative start, or end not past start).
    InvalidWindow {
        /// The requested start of the window (inclusive).
        start: i64,
        /// The requested end of the window (exclusive).
        end: i64,
    },
    /// The window is well-formed but runs past the end of the memory.
    EndOutOfBounds {
        /// The requested end of the window (exclusive).
        end: i64,
    },
}
impl std::fmt::Display for RangeErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeErr::InvalidWindow { start, end } => write!(f, "invalid dump range [{start}, {end})"),
            RangeErr::EndOutOfBounds { end } => write!(f, "dump range end {end} exceeds memory size {MEM_SIZE}"),
        }
    }
}
impl std::error::Error for RangeErr {}
impl crate::err::Error for RangeErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            RangeErr::InvalidWindow { .. } => Some("the range must satisfy 0 <= start < end".into()),
            RangeErr::EndOutOfBounds { .. } => Some(format!("the last valid address is {}", MEM_SIZE - 1).into()),
        }
    }
}

/// One address/value record of a memory dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemCell {
    /// The address.
    pub address: usize,
    /// The word at that address, rendered in decimal.
    ///
    /// The value is carried as a string so that consumers without full
    /// 64-bit integers can still read the record exactly.
    pub value: String,
}

#[cfg(test)]
mod tests {
    use crate::parse::parse_program;
    use crate::sim::{resolve, DumpRange, MemCell, RangeErr, SimErr, Simulator};

    fn run_program(src: &str) -> Simulator {
        let program = parse_program(src).unwrap();
        let mut sim = Simulator::new();
        sim.run(&program).unwrap();
        sim
    }

    fn run_err(src: &str) -> SimErr {
        let program = parse_program(src).unwrap();
        let mut sim = Simulator::new();
        sim.run(&program).unwrap_err()
    }

    #[test]
    fn test_const() {
        let sim = run_program("CONST 7, 10");
        assert_eq!(sim.mem.read(10), Ok(7));
        assert_eq!(sim.instructions_run, 1);

        // negative values wrap from the top of the u64 range
        let sim = run_program("CONST -1, 0");
        assert_eq!(sim.mem.read(0), Ok(u64::MAX));
    }

    #[test]
    fn test_load() {
        let sim = run_program("CONST 10, 0\nCONST 5, 10\nLOAD 0, 1");
        assert_eq!(sim.mem.read(1), Ok(5));
    }

    #[test]
    fn test_store() {
        // mem[mem[mem[3]]] = mem[mem[1]]
        let sim = run_program("CONST 5, 0\nCONST 0, 1\nCONST 8, 2\nCONST 2, 3\nSTORE 1, 3");
        assert_eq!(sim.mem.read(8), Ok(5));
    }

    #[test]
    fn test_store_chain() {
        let sim = run_program(
            "CONST 300, 20\n\
             CONST 123, 300\n\
             CONST 500, 21\n\
             CONST 400, 500\n\
             STORE 20, 21",
        );
        assert_eq!(sim.mem.read(400), Ok(123));

        let range = DumpRange::new(398, 402).unwrap();
        assert_eq!(sim.dump_words(&range), [0, 0, 123, 0]);
    }

    #[test]
    fn test_bitrev() {
        let sim = run_program("CONST 100, 10\nCONST 5, 100\nBITREV 10, 0, 200");
        assert_eq!(sim.mem.read(200), Ok(5u64.reverse_bits()));

        // the offset is added to the resolved base
        let sim = run_program("CONST 100, 10\nCONST 1, 103\nBITREV 10, 3, 200");
        assert_eq!(sim.mem.read(200), Ok(1 << 63));
    }

    #[test]
    fn test_bitrev_sweep() {
        let mut src = String::from("CONST 100, 10\n");
        for i in 1..=9 {
            src += &format!("CONST {i}, {}\n", 99 + i);
        }
        for k in 0..9 {
            src += &format!("BITREV 10, {k}, {}\n", 200 + k);
        }

        let sim = run_program(&src);
        for (k, value) in (1u64..=9).enumerate() {
            assert_eq!(sim.mem.read(200 + k as i64), Ok(value.reverse_bits()));
        }
    }

    #[test]
    fn test_reverse_involution() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        assert_eq!(0u64.reverse_bits(), 0);
        assert_eq!(1u64.reverse_bits(), 1 << 63);
        assert_eq!((1u64 << 63).reverse_bits(), 1);

        // reversing twice through the machine gives the value back
        let mut rng = StdRng::seed_from_u64(0xB17);
        for _ in 0..64 {
            let x: u64 = rng.gen();
            let sim = run_program(&format!(
                "CONST {}, 0\n\
                 CONST 0, 1\n\
                 BITREV 1, 0, 2\n\
                 CONST 2, 3\n\
                 BITREV 3, 0, 4",
                x as i64,
            ));
            assert_eq!(sim.mem.read(2), Ok(x.reverse_bits()));
            assert_eq!(sim.mem.read(4), Ok(x));
        }
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve(0), Ok(0));
        assert_eq!(resolve(2047), Ok(2047));
        assert_eq!(resolve(2048), Err(SimErr::BadPointer(2048)));
        assert_eq!(resolve(u64::MAX), Err(SimErr::BadPointer(i128::from(u64::MAX))));
    }

    #[test]
    fn test_write_out_of_bounds() {
        assert_eq!(run_err("CONST 1, 5000"), SimErr::AccessOutOfBounds(5000));
        assert_eq!(run_err("CONST 1, -1"), SimErr::AccessOutOfBounds(-1));
    }

    #[test]
    fn test_bad_pointer() {
        // mem[0] holds 5000, which LOAD then uses as a pointer
        assert_eq!(run_err("CONST 5000, 0\nLOAD 0, 1"), SimErr::BadPointer(5000));
    }

    #[test]
    fn test_bitrev_src_out_of_range() {
        assert_eq!(run_err("CONST 2047, 0\nBITREV 0, 5, 1"), SimErr::BadPointer(2052));
        assert_eq!(run_err("BITREV 0, -3, 1"), SimErr::BadPointer(-3));
    }

    #[test]
    fn test_run_aborts_at_first_failure() {
        let program = parse_program("CONST 5000, 0\nLOAD 0, 1\nCONST 9, 2").unwrap();
        let mut sim = Simulator::new();

        assert_eq!(sim.run(&program), Err(SimErr::BadPointer(5000)));
        // the instruction after the failing one never ran
        assert_eq!(sim.mem.read(2), Ok(0));
        assert_eq!(sim.instructions_run, 1);
    }

    #[test]
    fn test_instructions_run_accumulates() {
        let program = parse_program("CONST 1, 0\nCONST 2, 1").unwrap();
        let mut sim = Simulator::new();
        sim.run(&program).unwrap();
        sim.run(&program).unwrap();
        assert_eq!(sim.instructions_run, 4);
    }

    #[test]
    fn test_dump_range() {
        assert!(DumpRange::new(0, 2048).is_ok());
        assert!(DumpRange::new(5, 6).is_ok());

        assert_eq!(
            DumpRange::new(-1, 5),
            Err(RangeErr::InvalidWindow { start: -1, end: 5 })
        );
        assert_eq!(
            DumpRange::new(5, 5),
            Err(RangeErr::InvalidWindow { start: 5, end: 5 })
        );
        assert_eq!(
            DumpRange::new(9, 2),
            Err(RangeErr::InvalidWindow { start: 9, end: 2 })
        );
        assert_eq!(
            DumpRange::new(0, 2049),
            Err(RangeErr::EndOutOfBounds { end: 2049 })
        );

        // the window shape is checked before the memory bound
        assert_eq!(
            DumpRange::new(-1, 9999),
            Err(RangeErr::InvalidWindow { start: -1, end: 9999 })
        );
    }

    #[test]
    fn test_dump() {
        let sim = run_program("CONST 7, 10");
        let range = DumpRange::new(9, 12).unwrap();

        assert_eq!(sim.dump_words(&range), [0, 7, 0]);
        assert_eq!(
            sim.dump(&range),
            [
                MemCell { address: 9, value: "0".to_string() },
                MemCell { address: 10, value: "7".to_string() },
                MemCell { address: 11, value: "0".to_string() },
            ]
        );
    }

    #[test]
    fn test_dump_renders_full_u64() {
        let sim = run_program("CONST -1, 0");
        let range = DumpRange::new(0, 1).unwrap();
        assert_eq!(sim.dump(&range)[0].value, "18446744073709551615");
    }
}
