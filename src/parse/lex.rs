//! Tokenizing UVM assembly.
//!
//! This module holds the tokens that characterize UVM assembly ([`Token`]).
//! It is used by the parser to facilitate the conversion of assembly
//! source code into a program.

use std::num::IntErrorKind;

use logos::{Lexer, Logos};

/// A unit of information in UVM source code.
#[derive(Debug, Logos, PartialEq, Eq)]
#[logos(skip r"[ \t]+", error = LexErr)]
pub enum Token {
    // The Int regexes deliberately overmatch (e.g., 23rst matches even
    // though it isn't a number): the regex grabs everything that reads
    // as one unit, and the callback decides whether it's a valid literal.

    /// An integer literal (e.g., `9`, `-14`, `862`).
    #[regex(r"\d\w*", lex_int)]
    #[regex(r"-\w*", lex_int)]
    Int(i64),

    /// A word of letters, which is a mnemonic in any valid program.
    ///
    /// Mnemonics are case-insensitive; the parser normalizes them
    /// to uppercase before looking them up.
    #[regex(r"[A-Za-z]+", |lx| lx.slice().to_string())]
    Word(String),

    /// A comma, which delineates operands of an instruction.
    #[token(",")]
    Comma,

    /// A comment, which starts with a semicolon and spans the remaining part of the line.
    #[regex(r";.*")]
    Comment,

    /// A new line.
    #[regex(r"\r?\n")]
    NewLine,
}

/// Any errors raised in attempting to tokenize an input stream.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum LexErr {
    /// Numeric literal cannot fit within the range of an i64.
    DoesNotFitI64,
    /// Numeric literal could not be parsed because it has invalid digits (i.e., not 0-9).
    InvalidNumeric,
    /// Numeric literal has no digits in it (it's just `-`).
    InvalidDecEmpty,
    /// Int parsing failed but the reason why is unknown.
    UnknownIntErr,
    /// A symbol was used which does not occur in any token.
    #[default]
    InvalidSymbol,
}

impl std::fmt::Display for LexErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErr::DoesNotFitI64   => f.write_str("numeric token does not fit 64-bit signed integer"),
            LexErr::InvalidNumeric  => f.write_str("invalid decimal literal"),
            LexErr::InvalidDecEmpty => f.write_str("invalid decimal literal"),
            LexErr::UnknownIntErr   => f.write_str("could not parse integer"),
            LexErr::InvalidSymbol   => f.write_str("unrecognized symbol"),
        }
    }
}
impl std::error::Error for LexErr {}
impl crate::err::Error for LexErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            LexErr::DoesNotFitI64   => Some(format!("the range for an operand is [{}, {}]", i64::MIN, i64::MAX).into()),
            LexErr::InvalidNumeric  => Some("a decimal literal only consists of digits 0-9, with an optional leading -".into()),
            LexErr::InvalidDecEmpty => Some("there should be digits (0-9) here".into()),
            LexErr::UnknownIntErr   => None,
            LexErr::InvalidSymbol   => Some("this char does not occur in any UVM assembly token".into()),
        }
    }
}

/// Helper that converts an int error kind to its corresponding LexErr.
fn convert_int_error(e: &IntErrorKind, src: &str) -> LexErr {
    match e {
        IntErrorKind::Empty => LexErr::InvalidDecEmpty,
        IntErrorKind::InvalidDigit if src == "-" => LexErr::InvalidDecEmpty,
        IntErrorKind::InvalidDigit => LexErr::InvalidNumeric,
        IntErrorKind::PosOverflow  => LexErr::DoesNotFitI64,
        IntErrorKind::NegOverflow  => LexErr::DoesNotFitI64,
        _ => LexErr::UnknownIntErr,
    }
}
fn lex_int(lx: &Lexer<'_, Token>) -> Result<i64, LexErr> {
    let string = lx.slice();

    string.parse::<i64>()
        .map_err(|e| convert_int_error(e.kind(), string))
}
