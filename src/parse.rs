//! Parsing UVM assembly source code.
//!
//! This module is used to convert UVM assembly source code into a
//! [`Program`] that can be executed by the simulator or written out
//! as binary records.
//!
//! The parser module notably consists of:
//! - [`parse_program`]: The main function which parses source code into a program
//! - [`ParseErr`]: The errors that can result from parsing
//!
//! ## Example
//!
//! ```
//! use uvm::parse::parse_program;
//!
//! let program = parse_program("
//!     CONST 862, 457    ; write 862 into address 457
//!     LOAD  457, 0      ; copy mem[mem[457]] into address 0
//! ").unwrap();
//!
//! assert_eq!(program.len(), 2);
//! assert_eq!(program[0].to_string(), "Instr(op=<Op.CONST: 1>, A=4, B=862, C=457, D=0)");
//! ```

pub mod lex;

use std::borrow::Cow;
use std::ops::Range;

use logos::Logos;

use crate::ast::{Instr, Opcode, Program};
use crate::err::ErrSpan;
use crate::parse::lex::{LexErr, Token};

type SpannedToken = (Result<Token, LexErr>, Range<usize>);

/// Parses UVM assembly source code into a program.
///
/// Each line of the source holds at most one instruction: a mnemonic
/// (case-insensitive) followed by comma-separated integer operands.
/// Blank lines and comment-only lines produce no instruction. The first
/// line that fails to parse aborts the whole parse.
pub fn parse_program(src: &str) -> Result<Program, ParseErr> {
    let tokens: Vec<SpannedToken> = Token::lexer(src)
        .spanned()
        .filter(|(t, _)| !matches!(t, Ok(Token::Comment)))
        .collect();

    // Comments are already gone, so a comment-only line is empty here.
    tokens
        .split(|(t, _)| matches!(t, Ok(Token::NewLine)))
        .filter_map(|line| parse_line(line, src).transpose())
        .collect()
}

/// Parses one line of tokens into an instruction (or `None` for a blank line).
fn parse_line(tokens: &[SpannedToken], src: &str) -> Result<Option<Instr>, ParseErr> {
    let [(first, first_span), rest @ ..] = tokens else {
        return Ok(None);
    };

    let Ok(Token::Word(mnemonic)) = first else {
        let span = line_span(src, first_span.start);
        let line = src[span.clone()].to_string();
        return Err(ParseErr::new(ParseErrKind::MalformedLine { line }, span));
    };

    // Operands are checked before the mnemonic is looked up,
    // so FOO x, 1 reports the operand rather than the unknown mnemonic.
    let mut operands = Vec::new();
    let mut last_span = first_span.clone();
    let mut sep = true;
    for (t, span) in rest {
        match t {
            Ok(Token::Comma) => sep = true,
            Ok(Token::Int(n)) if sep => {
                operands.push(*n);
                last_span = span.clone();
                sep = false;
            }
            // two operands without a comma between them
            Ok(Token::Int(_)) => {
                return Err(ParseErr::new(
                    ParseErrKind::InvalidOperand { mnemonic: mnemonic.clone() },
                    [last_span, span.clone()],
                ));
            }
            Err(LexErr::DoesNotFitI64) => {
                return Err(ParseErr::new(ParseErrKind::Lex(LexErr::DoesNotFitI64), span.clone()));
            }
            _ => {
                return Err(ParseErr::new(
                    ParseErrKind::InvalidOperand { mnemonic: mnemonic.clone() },
                    span.clone(),
                ));
            }
        }
    }

    let Ok(opcode) = mnemonic.parse::<Opcode>() else {
        return Err(ParseErr::new(
            ParseErrKind::UnknownMnemonic(mnemonic.to_uppercase()),
            first_span.clone(),
        ));
    };

    match operands.len() == opcode.arity() {
        true => Ok(Some(Instr::new(opcode, &operands))),
        false => Err(ParseErr::new(
            ParseErrKind::WrongArity {
                opcode,
                expected: opcode.arity(),
                got: operands.len(),
            },
            first_span.clone(),
        )),
    }
}

/// The span of the full source line holding byte position `pos`.
fn line_span(src: &str, pos: usize) -> Range<usize> {
    let start = src[..pos].rfind('\n').map_or(0, |i| i + 1);
    let end = src[pos..].find('\n').map_or(src.len(), |i| pos + i);
    let end = match src[..end].ends_with('\r') {
        true => end - 1,
        false => end,
    };

    start..end
}

/// Kinds of errors that can occur from parsing UVM assembly.
///
/// See [`ParseErr`] for this error type with span information included.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParseErrKind {
    /// Line does not start with an instruction mnemonic.
    MalformedLine {
        /// The text of the offending line.
        line: String,
    },
    /// An operand of this instruction is not an integer literal.
    InvalidOperand {
        /// The mnemonic, as written in the source.
        mnemonic: String,
    },
    /// The mnemonic does not name any instruction.
    UnknownMnemonic(String),
    /// The instruction was given the wrong number of operands.
    WrongArity {
        /// The instruction.
        opcode: Opcode,
        /// The number of operands it requires.
        expected: usize,
        /// The number of operands it was given.
        got: usize,
    },
    /// A token could not be produced from the source.
    Lex(LexErr),
}
impl std::fmt::Display for ParseErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedLine { line }      => write!(f, "invalid line: {line:?}"),
            Self::InvalidOperand { mnemonic } => write!(f, "operand of {mnemonic} must be an integer"),
            Self::UnknownMnemonic(m)          => write!(f, "unknown instruction {m}"),
            Self::WrongArity { opcode, expected, got } => {
                write!(f, "{opcode} requires {expected} arguments (found {got})")
            }
            Self::Lex(e) => e.fmt(f),
        }
    }
}

/// Error from parsing UVM assembly.
#[derive(Debug)]
pub struct ParseErr {
    /// The kind of error.
    pub kind: ParseErrKind,
    /// The span in the source associated with this error.
    pub span: ErrSpan,
}
impl ParseErr {
    /// Creates a new [`ParseErr`].
    pub fn new<E: Into<ErrSpan>>(kind: ParseErrKind, span: E) -> Self {
        ParseErr { kind, span: span.into() }
    }
}
impl std::fmt::Display for ParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}
impl std::error::Error for ParseErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ParseErrKind::Lex(e) => Some(e),
            _ => None,
        }
    }
}
impl crate::err::Error for ParseErr {
    fn span(&self) -> Option<ErrSpan> {
        Some(self.span.clone())
    }

    fn help(&self) -> Option<Cow<str>> {
        match &self.kind {
            ParseErrKind::MalformedLine { .. }  => Some("an instruction is a mnemonic followed by comma-separated integer operands".into()),
            ParseErrKind::InvalidOperand { .. } => Some("operands are comma-separated decimal integers".into()),
            ParseErrKind::UnknownMnemonic(_)    => Some("the mnemonics are CONST, LOAD, STORE, and BITREV".into()),
            ParseErrKind::WrongArity { opcode: Opcode::Const, .. }  => Some("usage: CONST value, dest".into()),
            ParseErrKind::WrongArity { opcode: Opcode::Load, .. }   => Some("usage: LOAD src, dest".into()),
            ParseErrKind::WrongArity { opcode: Opcode::Store, .. }  => Some("usage: STORE src, dest".into()),
            ParseErrKind::WrongArity { opcode: Opcode::Bitrev, .. } => Some("usage: BITREV base, offset, dest".into()),
            ParseErrKind::Lex(e) => e.help(),
        }
    }
}
