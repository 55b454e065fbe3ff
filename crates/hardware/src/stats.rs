//! Simulation statistics collection and reporting.
//!
//! This module tracks the performance counters of the simulator:
//! 1. **Cycles:** Total ticks, fetch-memory cycles, execute-memory cycles,
//!    and cycles stalled waiting for a decoded instruction.
//! 2. **Instruction mix:** Per-mnemonic retirement counts.
//! 3. **Branches:** Taken and not-taken counters across every PC-writing
//!    instruction class.
//! 4. **Geometry:** Program size and memory configuration for the report.

use std::collections::BTreeMap;

/// Mnemonic taxonomy used for the instruction mix report.
///
/// Encodings of the same mnemonic (e.g. the seven ADD forms) fold into one
/// entry. BKPT, SVC, and CPS terminate or bypass normal retirement and are
/// not counted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Mnemonic {
    Adc,
    Add,
    And,
    Asr,
    B,
    Bic,
    Bl,
    Blx,
    Bx,
    Cmn,
    Cmp,
    Eor,
    Ldmia,
    Ldr,
    Ldrb,
    Ldrh,
    Ldrsb,
    Ldrsh,
    Lsl,
    Lsr,
    Mvn,
    Mov,
    Mul,
    Neg,
    Nop,
    Orr,
    Rev,
    Rev16,
    Revsh,
    Ror,
    Sbc,
    Push,
    Stmia,
    Str,
    Strb,
    Strh,
    Sub,
    Sxtb,
    Sxth,
    Tst,
    Uxtb,
    Uxth,
}

/// Coarse instruction classes for the report footer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstClass {
    Branch,
    Load,
    Store,
    Other,
}

impl Mnemonic {
    /// Returns the lowercase assembler mnemonic.
    pub fn as_str(self) -> &'static str {
        match self {
            Mnemonic::Adc => "adc",
            Mnemonic::Add => "add",
            Mnemonic::And => "and",
            Mnemonic::Asr => "asr",
            Mnemonic::B => "b",
            Mnemonic::Bic => "bic",
            Mnemonic::Bl => "bl",
            Mnemonic::Blx => "blx",
            Mnemonic::Bx => "bx",
            Mnemonic::Cmn => "cmn",
            Mnemonic::Cmp => "cmp",
            Mnemonic::Eor => "eor",
            Mnemonic::Ldmia => "ldmia",
            Mnemonic::Ldr => "ldr",
            Mnemonic::Ldrb => "ldrb",
            Mnemonic::Ldrh => "ldrh",
            Mnemonic::Ldrsb => "ldrsb",
            Mnemonic::Ldrsh => "ldrsh",
            Mnemonic::Lsl => "lsl",
            Mnemonic::Lsr => "lsr",
            Mnemonic::Mvn => "mvn",
            Mnemonic::Mov => "mov",
            Mnemonic::Mul => "mul",
            Mnemonic::Neg => "neg",
            Mnemonic::Nop => "nop",
            Mnemonic::Orr => "orr",
            Mnemonic::Rev => "rev",
            Mnemonic::Rev16 => "rev16",
            Mnemonic::Revsh => "revsh",
            Mnemonic::Ror => "ror",
            Mnemonic::Sbc => "sbc",
            Mnemonic::Push => "push",
            Mnemonic::Stmia => "stmia",
            Mnemonic::Str => "str",
            Mnemonic::Strb => "strb",
            Mnemonic::Strh => "strh",
            Mnemonic::Sub => "sub",
            Mnemonic::Sxtb => "sxtb",
            Mnemonic::Sxth => "sxth",
            Mnemonic::Tst => "tst",
            Mnemonic::Uxtb => "uxtb",
            Mnemonic::Uxth => "uxth",
        }
    }

    /// Classifies this mnemonic for the report footer.
    pub fn class(self) -> InstClass {
        match self {
            Mnemonic::B | Mnemonic::Bl | Mnemonic::Blx | Mnemonic::Bx => InstClass::Branch,
            Mnemonic::Ldmia
            | Mnemonic::Ldr
            | Mnemonic::Ldrb
            | Mnemonic::Ldrh
            | Mnemonic::Ldrsb
            | Mnemonic::Ldrsh => InstClass::Load,
            Mnemonic::Push
            | Mnemonic::Stmia
            | Mnemonic::Str
            | Mnemonic::Strb
            | Mnemonic::Strh => InstClass::Store,
            _ => InstClass::Other,
        }
    }
}

/// Simulation statistics tracked across a run.
#[derive(Clone, Debug, Default)]
pub struct Statistics {
    /// Total simulator cycles elapsed.
    pub cycles: u64,
    /// Cycles in which fetch placed (or attempted to place) a memory request.
    pub fetch_mem_cycles: u64,
    /// Cycles the execute unit spent in its memory sub-machine.
    pub execute_mem_cycles: u64,
    /// Cycles execute stalled for want of a decoded instruction.
    pub stalled_for_decode_cycles: u64,

    /// Program image size in bytes (header included).
    pub program_size_bytes: u32,
    /// Configured memory size in words.
    pub mem_size_words: u32,
    /// Configured wide access width in words.
    pub mem_access_width_words: u32,

    /// Branches taken, including unconditional branches and PC writes.
    pub branch_taken: u64,
    /// Conditional branches whose condition failed.
    pub branch_not_taken: u64,

    inst_counts: BTreeMap<Mnemonic, u64>,
}

impl Statistics {
    /// Creates a zeroed statistics block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the retirement of one instruction.
    pub fn record(&mut self, mnemonic: Mnemonic) {
        *self.inst_counts.entry(mnemonic).or_insert(0) += 1;
    }

    /// Returns the retirement count of one mnemonic.
    pub fn count(&self, mnemonic: Mnemonic) -> u64 {
        self.inst_counts.get(&mnemonic).copied().unwrap_or(0)
    }

    /// Returns the total number of retired instructions.
    pub fn total_instructions(&self) -> u64 {
        self.inst_counts.values().sum()
    }

    /// Prints the statistics report to stdout.
    pub fn print(&self) {
        let cyc = self.cycles.max(1);
        let pct = |part: u64| 100.0 * part as f64 / cyc as f64;

        println!("==========================================================");
        println!("THUMB TIMING SIMULATION STATISTICS");
        println!("==========================================================");
        println!(
            "mem_size                 {} bytes ({} words)",
            u64::from(self.mem_size_words) * 4,
            self.mem_size_words
        );
        println!(
            "mem_access_width         {} bytes ({} words)",
            self.mem_access_width_words * 4,
            self.mem_access_width_words
        );
        println!(
            "program_size             {} bytes",
            self.program_size_bytes
        );
        println!("----------------------------------------------------------");
        println!("sim_cycles               {}", self.cycles);
        println!(
            "fetch_mem_cycles         {} ({:.2}%)",
            self.fetch_mem_cycles,
            pct(self.fetch_mem_cycles)
        );
        println!(
            "execute_mem_cycles       {} ({:.2}%)",
            self.execute_mem_cycles,
            pct(self.execute_mem_cycles)
        );
        println!(
            "idle_mem_cycles          {} ({:.2}%)",
            self.cycles.saturating_sub(self.execute_mem_cycles),
            pct(self.cycles.saturating_sub(self.execute_mem_cycles))
        );
        println!(
            "stalls.decode            {} ({:.2}%)",
            self.stalled_for_decode_cycles,
            pct(self.stalled_for_decode_cycles)
        );
        println!("----------------------------------------------------------");
        println!("INSTRUCTION MIX");

        let mut branches = 0u64;
        let mut loads = 0u64;
        let mut stores = 0u64;
        let mut other = 0u64;
        for (&mnemonic, &count) in &self.inst_counts {
            println!("  op.{:<6} {}", mnemonic.as_str(), count);
            match mnemonic.class() {
                InstClass::Branch => branches += count,
                InstClass::Load => loads += count,
                InstClass::Store => stores += count,
                InstClass::Other => other += count,
            }
        }
        let total = self.total_instructions().max(1);
        let ipct = |part: u64| 100.0 * part as f64 / total as f64;

        // ADD/MOV into PC count as taken branches while classed by mnemonic,
        // and POP-with-PC branches while classed as a load, so the dedicated
        // branch counters are the authoritative pair.
        let branch_events = self.branch_taken + self.branch_not_taken;
        debug_assert!(branches + loads >= branch_events || branch_events == 0);

        println!("----------------------------------------------------------");
        println!(
            "branches.total           {} ({:.2}%)",
            branch_events,
            ipct(branch_events)
        );
        println!("branches.taken           {}", self.branch_taken);
        println!("branches.not_taken       {}", self.branch_not_taken);
        println!("loads                    {} ({:.2}%)", loads, ipct(loads));
        println!("stores                   {} ({:.2}%)", stores, ipct(stores));
        println!("other                    {} ({:.2}%)", other, ipct(other));
        println!("insts.total              {}", self.total_instructions());
        println!("==========================================================");
    }
}
