//! Command-line front end for the UVM assembler and interpreter.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use uvm::encoding::{decode_program, encode_program};
use uvm::err;
use uvm::parse::parse_program;
use uvm::run::assemble_and_run;
use uvm::sim::{DumpRange, Simulator};

#[derive(Parser)]
#[command(version, about = "Assembler and interpreter for the UVM toy machine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble a source file into binary instruction records
    Asm {
        /// Input assembly file (one instruction per line)
        input: PathBuf,
        /// Output binary file
        output: PathBuf,
        /// Print the program listing after assembling
        #[arg(long)]
        listing: bool,
    },
    /// Execute a binary file and write a JSON memory dump
    Run {
        /// Input binary file
        input: PathBuf,
        /// Output JSON dump file
        output: PathBuf,
        /// First address of the dump window (inclusive)
        start: i64,
        /// Last address of the dump window (exclusive)
        end: i64,
    },
    /// Assemble and execute a source file in one step
    Exec {
        /// Input assembly file
        input: PathBuf,
        /// First address of the dump window (inclusive)
        start: i64,
        /// Last address of the dump window (exclusive)
        end: i64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Asm { input, output, listing } => cmd_asm(input, output, *listing),
        Command::Run { input, output, start, end } => cmd_run(input, output, *start, *end),
        Command::Exec { input, start, end } => cmd_exec(input, *start, *end),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_asm(input: &Path, output: &Path, listing: bool) -> Result<(), String> {
    let src = fs::read_to_string(input).map_err(|e| read_fail(input, &e))?;
    let program = parse_program(&src).map_err(|e| err::report(&e, &src))?;

    fs::write(output, encode_program(&program)).map_err(|e| write_fail(output, &e))?;

    if listing {
        print_listing(&program.listing());
    }
    println!("compiled {} instructions into {}", program.len(), output.display());
    Ok(())
}

fn cmd_run(input: &Path, output: &Path, start: i64, end: i64) -> Result<(), String> {
    let bytes = fs::read(input).map_err(|e| read_fail(input, &e))?;
    let program = decode_program(&bytes).map_err(|e| err::report(&e, ""))?;
    let range = DumpRange::new(start, end).map_err(|e| err::report(&e, ""))?;

    let mut sim = Simulator::new();
    sim.run(&program).map_err(|e| err::report(&e, ""))?;

    let json = serde_json::to_string_pretty(&sim.dump_words(&range))
        .map_err(|e| format!("error: {e}"))?;
    fs::write(output, json).map_err(|e| write_fail(output, &e))?;

    println!("memory dumped to {}", output.display());
    Ok(())
}

fn cmd_exec(input: &Path, start: i64, end: i64) -> Result<(), String> {
    let src = fs::read_to_string(input).map_err(|e| read_fail(input, &e))?;
    let out = assemble_and_run(&src, start, end).map_err(|e| err::report(&e, &src))?;

    print_listing(&out.program);
    println!();
    for cell in &out.memory {
        println!("{:>4}  {}", cell.address, cell.value);
    }
    Ok(())
}

fn print_listing(listing: &[String]) {
    for (i, line) in listing.iter().enumerate() {
        println!("{i:03}: {line}");
    }
}

fn read_fail(path: &Path, e: &std::io::Error) -> String {
    format!("error: cannot read {}: {e}", path.display())
}

fn write_fail(path: &Path, e: &std::io::Error) -> String {
    format!("error: cannot write {}: {e}", path.display())
}
