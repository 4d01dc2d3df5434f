extern crate clap;
extern crate thiserror;

#[allow(dead_code)]
pub mod jit;
pub mod program;

use std::{collections::HashSet, process::ExitCode, time::Instant};

use clap::{Parser, ValueEnum};
use colored::Colorize;

use crate::jit::{codegen::InstructionStream, memory::Mmap, ExecutionHarness, JitError};

/// IA-32 machine code emitter, writes a hello world program straight into memory and jumps to it
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// What to do with the generated program, runs it if nothing is given
    #[arg(value_enum)]
    commands: Vec<Commands>,

    /// Text the generated program writes to stdout
    #[arg(short, long, default_value = program::HELLO_WORLD)]
    message: String,

    /// Status the generated program exits with (255 is reserved for harness failures)
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..255))]
    exit_code: u8,

    /// Log each phase to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Hash, PartialEq, Eq)]
enum Commands {
    /// Output the encoded bytes as hex
    Dump,
    /// Output the instruction listing
    Listing,
    /// Jump into the generated code (never returns)
    Run,
}

fn dump(stream: &InstructionStream) {
    let bytes = stream.to_vec_u8();
    for line in bytes.chunks(16) {
        let hex: Vec<String> = line.iter().map(|byte| format!("{:02X}", byte)).collect();
        println!("{}", hex.join(" "));
    }
}

fn listing(stream: &InstructionStream) {
    for (offset, instruction) in stream.offsets() {
        println!("{} {}", format!("{:04x}:", offset).dimmed(), instruction);
    }
}

fn execute(args: Args) -> Result<(), JitError> {
    let mut commands: HashSet<Commands> = HashSet::from_iter(args.commands.into_iter());
    if commands.is_empty() {
        commands.insert(Commands::Run);
    }

    // the message has to sit in the low 4GiB, its address is a 32 bit immediate
    let data_harness = ExecutionHarness::new(Mmap::low_address());
    let harness = ExecutionHarness::new(Mmap::default());

    if args.verbose {
        eprintln!("{}", "Starting encoding".blue());
    }
    let now = Instant::now();
    let stream = program::hello_world(&data_harness, &args.message, args.exit_code)?;
    if args.verbose {
        eprintln!(
            "{} {} bytes in {:.2?}",
            "Finished encoding".green(),
            stream.len(),
            now.elapsed()
        );
    }

    if commands.contains(&Commands::Dump) {
        dump(&stream);
    }

    if commands.contains(&Commands::Listing) {
        listing(&stream);
    }

    if !commands.contains(&Commands::Run) {
        return Ok(());
    }

    if args.verbose {
        eprintln!("{}", "Starting mapping".blue());
    }
    let now = Instant::now();
    let region = harness.load(&stream)?;
    if args.verbose {
        eprintln!(
            "{} {} bytes in {:.2?}",
            "Finished mapping".green(),
            region.len(),
            now.elapsed()
        );
        eprintln!("{}", "Jumping into generated code".blue());
    }

    // the stream ends in exit(), nothing after this runs
    unsafe { region.invoke() }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "Failed:".red(), err);
            ExitCode::from(err.exit_status() as u8)
        }
    }
}
