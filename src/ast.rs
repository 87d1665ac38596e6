//! Components representing machine instructions and programs:
//! the data structures produced by the assembler and consumed by
//! the simulator and the binary encoder.
//!
//! The key data structures of this module:
//! - [`Opcode`]: the closed set of operations the machine implements
//! - [`Instr`]: a single instruction (operation plus field operands)
//! - [`Program`]: an ordered, immutable sequence of instructions

use std::fmt;
use std::str::FromStr;

/// The operations the machine implements.
///
/// This is a closed set, and every consumer matches on it exhaustively:
/// adding an opcode is a compile-time-checked change in the parser table,
/// the executor dispatch, the binary codec, and the listing formatter.
///
/// The discriminant is the ordinal shown in listing records (see
/// [`Instr`]'s `Display` impl); the tag constant used by the binary
/// encoding is separate (see [`Opcode::tag`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// `CONST value, dest`: write a literal value to an address.
    Const = 1,
    /// `LOAD src, dest`: copy a value through one level of indirection.
    Load = 2,
    /// `STORE valuePtr, destPtrPtr`: copy a value through two levels of
    /// indirection on both sides.
    Store = 3,
    /// `BITREV basePtr, offset, dest`: bit-reverse a word read at an offset
    /// from a base pointer.
    Bitrev = 4,
}

impl Opcode {
    /// The opcode-identifying tag constant.
    ///
    /// The tag is carried in listing records and is the dispatch nibble of
    /// the binary encoding. It has no execution semantics of its own.
    pub fn tag(self) -> u8 {
        match self {
            Opcode::Const  => 4,
            Opcode::Load   => 12,
            Opcode::Store  => 3,
            Opcode::Bitrev => 9,
        }
    }

    /// Looks up the opcode with the given tag constant, if one exists.
    pub fn from_tag(tag: u8) -> Option<Opcode> {
        match tag {
            4  => Some(Opcode::Const),
            12 => Some(Opcode::Load),
            3  => Some(Opcode::Store),
            9  => Some(Opcode::Bitrev),
            _  => None,
        }
    }

    /// The number of operands this opcode takes in assembly source.
    pub fn arity(self) -> usize {
        match self {
            Opcode::Const | Opcode::Load | Opcode::Store => 2,
            Opcode::Bitrev => 3,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Const  => f.write_str("CONST"),
            Opcode::Load   => f.write_str("LOAD"),
            Opcode::Store  => f.write_str("STORE"),
            Opcode::Bitrev => f.write_str("BITREV"),
        }
    }
}

impl FromStr for Opcode {
    type Err = ();

    /// Parses a mnemonic, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &*s.to_uppercase() {
            "CONST"  => Ok(Opcode::Const),
            "LOAD"   => Ok(Opcode::Load),
            "STORE"  => Ok(Opcode::Store),
            "BITREV" => Ok(Opcode::Bitrev),
            _ => Err(()),
        }
    }
}

/// A single machine instruction.
///
/// Operands are stored by field name (B, C, D) rather than by source
/// position; [`Instr::new`] performs the mapping from source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instr {
    /// The operation to perform.
    pub op: Opcode,
    /// Field B: the literal value for `CONST`, a pointer address otherwise.
    pub b: i64,
    /// Field C: the destination address (for `STORE`, the destination
    /// pointer-pointer address).
    pub c: i64,
    /// Field D: `BITREV`'s source offset. Fixed 0 for every other opcode.
    pub d: i64,
}

impl Instr {
    /// Builds an instruction from its operands in source order.
    /// `args.len()` must equal `op.arity()`.
    ///
    /// `CONST`, `LOAD`, and `STORE` map their operands left to right onto
    /// B and C, with D fixed 0. `BITREV` is irregular: its operands are
    /// `base, offset, dest`, stored as B=base, D=offset, C=dest.
    pub fn new(op: Opcode, args: &[i64]) -> Self {
        debug_assert_eq!(args.len(), op.arity());
        match op {
            Opcode::Const | Opcode::Load | Opcode::Store => {
                Instr { op, b: args[0], c: args[1], d: 0 }
            }
            Opcode::Bitrev => Instr { op, b: args[0], c: args[2], d: args[1] },
        }
    }
}

impl fmt::Display for Instr {
    /// Formats the instruction as the fixed listing record shown to users,
    /// e.g. `Instr(op=<Op.CONST: 1>, A=4, B=862, C=457, D=0)`.
    ///
    /// The record is display-only; nothing re-parses it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Instr { op, b, c, d } = *self;
        write!(
            f,
            "Instr(op=<Op.{op}: {}>, A={}, B={b}, C={c}, D={d})",
            op as u8,
            op.tag()
        )
    }
}

/// An ordered sequence of instructions.
///
/// A program is immutable once built: insertion order is execution order,
/// and nothing may reorder or edit the instructions afterwards. Programs
/// come out of the parser ([`crate::parse::parse_program`]), the binary
/// decoder ([`crate::encoding::decode_program`]), or a plain iterator of
/// instructions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    instrs: Vec<Instr>,
}

impl Program {
    /// The number of instructions in the program.
    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    /// Whether the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    /// Iterates over the instructions in execution order.
    pub fn iter(&self) -> std::slice::Iter<'_, Instr> {
        self.instrs.iter()
    }

    /// The formatted listing of the program: one record per instruction,
    /// in execution order.
    pub fn listing(&self) -> Vec<String> {
        self.instrs.iter().map(Instr::to_string).collect()
    }
}

impl std::ops::Index<usize> for Program {
    type Output = Instr;

    fn index(&self, index: usize) -> &Self::Output {
        &self.instrs[index]
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instr;
    type IntoIter = std::slice::Iter<'a, Instr>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Instr> for Program {
    fn from_iter<T: IntoIterator<Item = Instr>>(iter: T) -> Self {
        Program { instrs: iter.into_iter().collect() }
    }
}
