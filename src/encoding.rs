//! Reading and writing programs as binary instruction records.
//!
//! This module converts between a [`Program`] and the fixed-width binary
//! format the `uvm` CLI stores on disk:
//! - [`encode_instr`] and [`encode_program`]: serialize instructions into records
//! - [`decode_program`]: deserialize records back into a program
//!
//! ## Example
//!
//! ```
//! use uvm::encoding::{decode_program, encode_program};
//! use uvm::parse::parse_program;
//!
//! let program = parse_program("CONST 862, 457").unwrap();
//!
//! let bytes = encode_program(&program);
//! assert_eq!(bytes, [0xE4, 0x35, 0x00, 0x48, 0x0E, 0, 0, 0, 0, 0, 0]);
//! assert_eq!(decode_program(&bytes).unwrap(), program);
//! ```

use crate::ast::{Instr, Opcode, Program};

/// The size of one encoded instruction record, in bytes.
pub const INSTR_BYTES: usize = 11;

// Record layout:
//
// Each instruction is an 11-byte little-endian record of a packed value v.
// The low nibble of v is the opcode tag (Opcode::tag), which decides the
// layout of the remaining fields:
//
// - CONST (tag 4):           v[4..27]  = B,  v[27..53] = C
// - LOAD/STORE (tags 12, 3): v[4..30]  = B,  v[30..56] = C
// - BITREV (tag 9):          v[4..30]  = B,  v[30..56] = C,  v[56..63] = D
//
// Operands are masked to their field widths on encode and widened back as
// unsigned on decode. All live bits fit in the low 8 bytes; the last 3
// bytes of a record are always zero.

const fn mask(bits: u32) -> u64 {
    (1 << bits) - 1
}

/// Serializes one instruction into its 11-byte record.
pub fn encode_instr(instr: &Instr) -> [u8; INSTR_BYTES] {
    let Instr { op, b, c, d } = *instr;
    let tag = u64::from(op.tag());

    let v = match op {
        Opcode::Const => tag
            | (b as u64 & mask(23)) << 4
            | (c as u64 & mask(26)) << 27,
        Opcode::Load | Opcode::Store => tag
            | (b as u64 & mask(26)) << 4
            | (c as u64 & mask(26)) << 30,
        Opcode::Bitrev => tag
            | (b as u64 & mask(26)) << 4
            | (c as u64 & mask(26)) << 30
            | (d as u64 & mask(7)) << 56,
    };

    let mut record = [0; INSTR_BYTES];
    record[..8].copy_from_slice(&v.to_le_bytes());
    record
}

/// Serializes a program into the concatenation of its instruction records.
pub fn encode_program(program: &Program) -> Vec<u8> {
    program.iter().flat_map(encode_instr).collect()
}

/// Deserializes a sequence of 11-byte records into a program.
///
/// Instructions appear in the output in record order. An input whose
/// length is not a whole number of records is rejected, as is any record
/// whose tag nibble does not name an opcode.
pub fn decode_program(bytes: &[u8]) -> Result<Program, DecodeErr> {
    match bytes.len() % INSTR_BYTES {
        0 => bytes.chunks_exact(INSTR_BYTES).map(decode_instr).collect(),
        _ => Err(DecodeErr::Truncated { len: bytes.len() }),
    }
}

/// Deserializes one 11-byte record.
fn decode_instr(record: &[u8]) -> Result<Instr, DecodeErr> {
    let mut word = [0; 8];
    word.copy_from_slice(&record[..8]);
    let v = u64::from_le_bytes(word);

    let tag = (v & 0xF) as u8;
    let Some(op) = Opcode::from_tag(tag) else {
        return Err(DecodeErr::UnknownTag(tag));
    };

    let (b, c, d) = match op {
        Opcode::Const => ((v >> 4) & mask(23), (v >> 27) & mask(26), 0),
        Opcode::Load | Opcode::Store => ((v >> 4) & mask(26), (v >> 30) & mask(26), 0),
        Opcode::Bitrev => ((v >> 4) & mask(26), (v >> 30) & mask(26), (v >> 56) & mask(7)),
    };

    Ok(Instr {
        op,
        b: b as i64,
        c: c as i64,
        d: d as i64,
    })
}

/// Any errors that can occur from decoding binary records.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DecodeErr {
    /// A record's tag nibble does not name any opcode.
    UnknownTag(u8),
    /// The input's length is not a whole number of records.
    Truncated {
        /// The length of the input.
        len: usize,
    },
}
impl std::fmt::Display for DecodeErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTag(tag) => write!(f, "unknown opcode tag {tag}"),
            Self::Truncated { len } => {
                write!(f, "input of {len} bytes is not a whole number of {INSTR_BYTES}-byte records")
            }
        }
    }
}
impl std::error::Error for DecodeErr {}
impl crate::err::Error for DecodeErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            Self::UnknownTag(_) => Some("the opcode tags are 4 (CONST), 12 (LOAD), 3 (STORE), and 9 (BITREV)".into()),
            Self::Truncated { .. } => Some("a program is a sequence of 11-byte instruction records".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Instr, Opcode, Program};
    use crate::encoding::{decode_program, encode_instr, encode_program, DecodeErr, INSTR_BYTES};

    fn record(bytes: &[u8]) -> [u8; INSTR_BYTES] {
        let mut record = [0; INSTR_BYTES];
        record[..bytes.len()].copy_from_slice(bytes);
        record
    }

    #[test]
    fn test_encode() {
        assert_eq!(
            encode_instr(&Instr::new(Opcode::Const, &[862, 457])),
            record(&[0xE4, 0x35, 0x00, 0x48, 0x0E]),
        );
        assert_eq!(
            encode_instr(&Instr::new(Opcode::Load, &[317, 486])),
            record(&[0xDC, 0x13, 0x00, 0x80, 0x79]),
        );
        assert_eq!(
            encode_instr(&Instr::new(Opcode::Store, &[850, 879])),
            record(&[0x23, 0x35, 0x00, 0xC0, 0xDB]),
        );
        assert_eq!(
            encode_instr(&Instr::new(Opcode::Bitrev, &[117, 43, 402])),
            record(&[0x59, 0x07, 0x00, 0x80, 0x64, 0x00, 0x00, 0x2B]),
        );
    }

    #[test]
    fn test_encode_masks_operands() {
        // CONST's B field is 23 bits, so -1 encodes as its low 23 bits
        assert_eq!(
            encode_instr(&Instr::new(Opcode::Const, &[-1, 0])),
            record(&[0xF4, 0xFF, 0xFF, 0x07]),
        );
    }

    #[test]
    fn test_decode() {
        let bytes: Vec<u8> = [
            record(&[0xE4, 0x35, 0x00, 0x48, 0x0E]),
            record(&[0xDC, 0x13, 0x00, 0x80, 0x79]),
            record(&[0x23, 0x35, 0x00, 0xC0, 0xDB]),
            record(&[0x59, 0x07, 0x00, 0x80, 0x64, 0x00, 0x00, 0x2B]),
        ]
        .concat();

        let program = decode_program(&bytes).unwrap();
        assert_eq!(program.len(), 4);
        assert_eq!(program[0], Instr::new(Opcode::Const, &[862, 457]));
        assert_eq!(program[1], Instr::new(Opcode::Load, &[317, 486]));
        assert_eq!(program[2], Instr::new(Opcode::Store, &[850, 879]));
        assert_eq!(program[3], Instr::new(Opcode::Bitrev, &[117, 43, 402]));
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode_program(&[]).unwrap(), Program::default());
    }

    #[test]
    fn test_decode_unknown_tag() {
        assert_eq!(decode_program(&record(&[0x05])), Err(DecodeErr::UnknownTag(5)));
        assert_eq!(decode_program(&record(&[0x00])), Err(DecodeErr::UnknownTag(0)));
        assert_eq!(decode_program(&record(&[0x0F])), Err(DecodeErr::UnknownTag(15)));
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(decode_program(&[0u8; 10]), Err(DecodeErr::Truncated { len: 10 }));
        assert_eq!(decode_program(&[0u8; 12]), Err(DecodeErr::Truncated { len: 12 }));

        // a valid record followed by a partial one
        let mut bytes = encode_instr(&Instr::new(Opcode::Const, &[1, 2])).to_vec();
        bytes.push(0x04);
        assert_eq!(decode_program(&bytes), Err(DecodeErr::Truncated { len: 12 }));
    }

    #[test]
    fn test_round_trip() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        // operands bounded by their field widths survive the round trip
        let mut rng = StdRng::seed_from_u64(0x0BEC0DE);
        let program: Program = (0..512)
            .map(|_| match rng.gen_range(0..4) {
                0 => Instr::new(Opcode::Const, &[rng.gen_range(0..1 << 23), rng.gen_range(0..1 << 26)]),
                1 => Instr::new(Opcode::Load, &[rng.gen_range(0..1 << 26), rng.gen_range(0..1 << 26)]),
                2 => Instr::new(Opcode::Store, &[rng.gen_range(0..1 << 26), rng.gen_range(0..1 << 26)]),
                _ => Instr::new(
                    Opcode::Bitrev,
                    &[rng.gen_range(0..1 << 26), rng.gen_range(0..1 << 7), rng.gen_range(0..1 << 26)],
                ),
            })
            .collect();

        let bytes = encode_program(&program);
        assert_eq!(bytes.len(), program.len() * INSTR_BYTES);
        assert_eq!(decode_program(&bytes).unwrap(), program);
    }
}
