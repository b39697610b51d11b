use clap::{Parser, ValueEnum};
use clap_num::maybe_hex;
use pipesim::instr::disassemble_line;
use pipesim::loader::{LoadError, ProgramImage, CODE_BASE};
use pipesim::pipeline::{SimError, Simulator};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Cycle-accurate simulator for an 8-stage in-order RISC-V integer pipeline
///
/// The input program is a sequence of 32-bit words starting at the code
/// base address, either as raw little-endian bytes or as lines of 32 ASCII
/// '0'/'1' characters; the two are told apart automatically. The `dis`
/// operation writes one disassembly line per word; `sim` executes the
/// program cycle by cycle and writes the full pipeline trace.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Path to the input program image
    input: PathBuf,

    /// Path to the output listing or trace file
    output: PathBuf,

    /// What to do with the program
    #[arg(value_enum)]
    operation: Operation,

    /// Address of the first instruction word (use 0x prefix for
    /// hexadecimal)
    #[arg(long, value_parser = maybe_hex::<u32>, default_value_t = CODE_BASE)]
    code_base: u32,

    /// Stop the simulation after this many cycles
    #[arg(long)]
    max_cycles: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Operation {
    /// Disassemble the image without executing it
    Dis,
    /// Simulate the pipeline and write the per-cycle trace
    Sim,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Load(#[from] LoadError),
    #[error("simulation failed: {0}")]
    Sim(#[from] SimError),
    #[error("could not write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} memory accesses were nullified; see the error log")]
    MemoryViolations(u64),
}

fn run(args: &Args) -> Result<(), CliError> {
    let program = ProgramImage::load(&args.input, args.code_base)?;
    let mut out = BufWriter::new(File::create(&args.output)?);
    match args.operation {
        Operation::Dis => {
            for (addr, word) in program.iter() {
                writeln!(out, "{}", disassemble_line(word, addr))?;
            }
        }
        Operation::Sim => {
            let mut sim = Simulator::new(program);
            sim.run(&mut out, args.max_cycles)?;
            if sim.memory_violations() > 0 {
                out.flush()?;
                return Err(CliError::MemoryViolations(sim.memory_violations()));
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pipesim: {e}");
            ExitCode::FAILURE
        }
    }
}
