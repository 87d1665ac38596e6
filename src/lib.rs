//! A UVM parser, assembler, and interpreter.
//!
//! UVM is a toy virtual machine: 2048 words of 64-bit memory, no
//! registers, and four instructions (CONST, LOAD, STORE, BITREV) that
//! move and transform words through pointer chains. This crate parses
//! its assembly language, encodes programs as binary records, and
//! executes them.
//!
//! # Usage
//!
//! To run UVM source code, it must be parsed and then executed:
//! ```
//! use uvm::parse::parse_program;
//! use uvm::sim::Simulator;
//!
//! let code = "
//!     CONST 10, 0     ; mem[0] = 10
//!     CONST 5, 10     ; mem[10] = 5
//!     LOAD 0, 1       ; mem[1] = mem[mem[0]]
//! ";
//! let program = parse_program(code).unwrap();
//!
//! let mut simulator = Simulator::new();
//! simulator.run(&program).unwrap(); // <-- Result can be handled accordingly
//! assert_eq!(simulator.mem.read(1), Ok(5));
//! ```
//!
//! The whole pipeline (validate a dump window, parse, execute, read the
//! window back out) is also available as one call:
//! ```
//! use uvm::run::assemble_and_run;
//!
//! let out = assemble_and_run("CONST 7, 10", 10, 11).unwrap();
//! assert_eq!(out.memory[0].value, "7");
//! ```
//!
//! Programs can also be stored as fixed-width binary records.
//! See the [`encoding`] module for more details.
#![warn(missing_docs)]

pub mod parse;
pub mod ast;
pub mod encoding;
pub mod sim;
pub mod run;
pub mod err;
