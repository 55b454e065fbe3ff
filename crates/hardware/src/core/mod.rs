//! Processor core: component ownership, tick ordering, and reset.
//!
//! The processor owns the five collaborators and ticks them in a strict
//! order every cycle: **execute → decode → fetch → memory**. The reverse
//! ordering matters: memory serves requests at the end of a cycle, so a
//! response becomes visible to fetch and execute at the start of the next
//! one, and execute always consumes the record decode produced on the
//! previous tick.

/// Instruction decode stage.
pub mod decode;
/// Execute stage and its memory sub-machine.
pub mod execute;
/// Instruction fetch stage.
pub mod fetch;

use crate::common::constants::RESET_VECTOR_SP_ADDRESS;
use crate::common::error::Fault;
use crate::common::reg::{Reg, RegFile};
use crate::config::Config;
use crate::console::Console;
use crate::mem::Memory;
use crate::sim::loader;
use crate::stats::Statistics;
use decode::DecodeUnit;
use execute::ExecuteUnit;
use fetch::FetchUnit;

/// Normal program termination.
///
/// BKPT and SVC both end the simulation with their immediate as the exit
/// code; they are distinct so a harness can tell a deliberate breakpoint
/// from a supervisor call (including the decoder's `SVC 66` placeholder).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Halt {
    /// BKPT with the given immediate.
    Breakpoint(u32),
    /// SVC with the given immediate.
    Supervisor(u32),
}

impl Halt {
    /// Returns the process exit code this halt carries.
    pub fn code(self) -> u32 {
        match self {
            Halt::Breakpoint(im) | Halt::Supervisor(im) => im,
        }
    }
}

/// The simulated processor.
pub struct Processor {
    /// Architectural register file.
    pub regs: RegFile,
    /// Backing store and request pipeline.
    pub mem: Memory,
    /// Simulated program output channel.
    pub console: Console,
    /// Cycle and instruction counters.
    pub stats: Statistics,
    /// Per-stage trace output to stderr.
    pub trace: bool,

    pub(crate) fetch: FetchUnit,
    pub(crate) decode: DecodeUnit,
    pub(crate) execute: ExecuteUnit,

    pub(crate) halt: Option<Halt>,
}

impl Processor {
    /// Builds a processor from the configuration.
    pub fn new(config: &Config) -> Self {
        let mem = Memory::new(
            config.memory.mem_size_words,
            config.memory.access_width_words,
            config.memory.pipeline_depth,
        );

        let mut stats = Statistics::new();
        stats.mem_size_words = mem.mem_size_words();
        stats.mem_access_width_words = mem.access_width_words();

        let fetch = FetchUnit::new(mem.access_width_words());

        Self {
            regs: RegFile::new(),
            mem,
            console: Console::new(),
            stats,
            trace: config.general.trace,
            fetch,
            decode: DecodeUnit::new(),
            execute: ExecuteUnit::new(),
            halt: None,
        }
    }

    /// Loads the program binary at `path` and initializes PC and SP from
    /// its reset vector.
    pub fn reset(&mut self, path: &str) -> Result<(), Fault> {
        let image = loader::load_binary(path)?;
        self.reset_from_image(&image)
    }

    /// Resets the processor from an in-memory program image.
    ///
    /// The word at byte 0 seeds the active stack pointer; the word at
    /// byte 4 must carry a Thumb (bit 0 set) entry address and seeds PC
    /// with bit 0 cleared.
    pub fn reset_from_image(&mut self, image: &[u8]) -> Result<(), Fault> {
        let (pc, size_bytes) = self.mem.load_image(image)?;

        if (pc & 0x1) == 0 {
            return Err(Fault::ArmResetVector(pc));
        }
        self.regs.write(Reg::Pc, pc & !0x1);

        let sp = self.mem.load_word(RESET_VECTOR_SP_ADDRESS)?;
        let active_sp = self.regs.active_sp();
        self.regs.write(active_sp, sp);

        self.stats.program_size_bytes = size_bytes;
        Ok(())
    }

    /// Simulates one clock cycle.
    ///
    /// When execute halts the program the rest of the tick is skipped, so
    /// the final counters match a core that stopped inside execute.
    pub fn tick(&mut self) -> Result<(), Fault> {
        self.stats.cycles += 1;

        execute::execute_stage(self)?;
        if self.halt.is_some() {
            return Ok(());
        }

        decode::decode_stage(self)?;
        fetch::fetch_stage(self)?;
        self.mem.tick()?;

        if self.trace {
            self.regs.dump();
        }

        Ok(())
    }

    /// Takes the pending halt, if the program has terminated.
    pub fn take_halt(&mut self) -> Option<Halt> {
        self.halt.take()
    }

    /// Runs until the program halts or a fault occurs.
    pub fn run(&mut self) -> Result<Halt, Fault> {
        loop {
            self.tick()?;
            if let Some(halt) = self.take_halt() {
                return Ok(halt);
            }
        }
    }
}
