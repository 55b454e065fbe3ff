//! Thumb timing simulator CLI.
//!
//! Loads a flat program binary, runs the three-stage pipeline until the
//! program traps, and reports statistics. Exit codes: 0 only via `-h`,
//! 1 on CLI errors and fatal faults, and the trapping instruction's
//! immediate on BKPT or SVC.

use clap::Parser;
use std::process;

use thumb_core::config::Config;
use thumb_core::core::{Halt, Processor};

#[derive(Parser, Debug)]
#[command(
    name = "tsim",
    about = "Thumb timing simulator",
    long_about = "Cycle-approximate timing simulator for a Cortex-M0-class Thumb subset.\n\
                  Runs a flat binary image (word 0 = initial SP, word 4 = initial PC with\n\
                  the Thumb bit set) until the program hits BKPT or SVC.\n\n\
                  Example:\n  tsim -b software/hello.bin -m 32768 -w 2"
)]
struct Cli {
    /// Program binary file.
    #[arg(short = 'b', long = "binary")]
    binary: String,

    /// Memory size in words.
    #[arg(short = 'm', long = "mem-size")]
    mem_size_words: Option<u32>,

    /// Memory access width in words.
    #[arg(short = 'w', long = "access-width")]
    access_width_words: Option<u32>,

    /// Trace pipeline activity to stderr.
    #[arg(long)]
    trace: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // -h / --help land here too; only real errors exit nonzero.
            let is_error = e.use_stderr();
            let _ = e.print();
            process::exit(if is_error { 1 } else { 0 });
        }
    };

    let mut config = Config::default();
    config.general.trace = cli.trace;

    if let Some(words) = cli.mem_size_words {
        if words == 0 {
            eprintln!("Invalid value 0 for -m");
            process::exit(1);
        }
        config.memory.mem_size_words = words;
    }
    if let Some(words) = cli.access_width_words {
        if words == 0 {
            eprintln!("Invalid value 0 for -w");
            process::exit(1);
        }
        config.memory.access_width_words = words;
    }

    let mut proc = Processor::new(&config);

    if let Err(e) = proc.reset(&cli.binary) {
        eprintln!("Failed to reset processor: {}", e);
        process::exit(1);
    }

    loop {
        if let Err(e) = proc.tick() {
            eprintln!("{}", e);
            process::exit(1);
        }

        match proc.take_halt() {
            Some(Halt::Breakpoint(im)) => {
                proc.stats.print();
                println!("Hit breakpoint with value {}. Terminating...", im);
                process::exit(im as i32);
            }
            Some(Halt::Supervisor(im)) => {
                eprintln!("Reached SVC (im {}) instruction", im);
                process::exit(im as i32);
            }
            None => {}
        }
    }
}
