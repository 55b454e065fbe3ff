//! Fatal fault definitions.
//!
//! This module defines the error handling for the simulator. It provides:
//! 1. **Fault representation:** One closed enum covering every condition that
//!    ends a simulation abnormally (configuration, decode, execute, memory).
//! 2. **Error integration:** `Display` and `std::error::Error` so faults can
//!    be reported through standard Rust error paths.
//!
//! Program termination through BKPT or SVC is not a fault; it is surfaced
//! separately as a halt with an exit code.

use std::fmt;

/// Fatal simulation faults.
///
/// A fault models a processor state in which continued execution is
/// meaningless. There is no recovery: the front end prints the one-line
/// diagnostic and exits nonzero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// The program binary could not be read from disk.
    ImageRead {
        /// Path that was opened.
        path: String,
        /// Operating-system error text.
        reason: String,
    },

    /// The program binary does not fit in the configured memory.
    ImageTooLarge {
        /// Size of the image in bytes.
        size_bytes: u64,
        /// Configured memory size in words.
        mem_size_words: u32,
    },

    /// The reset vector holds an ARM (bit 0 clear) entry address.
    ArmResetVector(u32),

    /// A memory request or side-band access fell outside the backing store.
    OutOfBounds {
        /// Faulting byte address.
        byte_addr: u32,
        /// Configured memory size in words.
        mem_size_words: u32,
    },

    /// The request pipeline had no free slot when the execute unit relied on
    /// one being available.
    MemoryBusy,

    /// A memory response was not ready when the issuer expected it.
    ResponseNotReady {
        /// Token the issuer was waiting on.
        token: u32,
    },

    /// The instruction buffer is valid but no longer covers the PC.
    FetchOutOfSync {
        /// Base byte address of the instruction buffer.
        buffer_base: u32,
        /// Wide-access base of the current PC.
        pc_base: u32,
    },

    /// A single memory load named PC as its destination register.
    LoadIntoPc,

    /// A multiple load listed PC before the end of its register list.
    PcNotLastInList,

    /// A multiple memory access was staged with an empty register list.
    EmptyRegisterList,

    /// A sub-word store was staged with a signed access type.
    SignedStoreWidth,

    /// BX or BLX targeted an ARM (bit 0 clear) address.
    ArmModeBranch {
        /// Mnemonic of the faulting instruction.
        mnemonic: &'static str,
        /// Target address.
        target: u32,
    },

    /// ADD (register, high) wrote an unaligned branch target into PC.
    UnalignedBranchTarget(u32),

    /// A conditional branch carried one of the reserved condition codes.
    ReservedCondition(u32),

    /// The encoding is recognised but not supported by this core (SEV).
    UnsupportedInstruction(u16),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::ImageRead { path, reason } => {
                write!(f, "could not open '{}': {}", path, reason)
            }
            Fault::ImageTooLarge {
                size_bytes,
                mem_size_words,
            } => write!(
                f,
                "program binary is too large for memory ({} bytes, {} words available)",
                size_bytes, mem_size_words
            ),
            Fault::ArmResetVector(pc) => {
                write!(f, "reset vector contains an ARM address {:#010X}", pc)
            }
            Fault::OutOfBounds {
                byte_addr,
                mem_size_words,
            } => write!(
                f,
                "out-of-bounds memory access to byte address {:#010X} of {} words",
                byte_addr, mem_size_words
            ),
            Fault::MemoryBusy => {
                write!(f, "memory request pipeline busy when a free slot was expected")
            }
            Fault::ResponseNotReady { token } => {
                write!(f, "memory response for token {:#010X} not ready when expected", token)
            }
            Fault::FetchOutOfSync {
                buffer_base,
                pc_base,
            } => write!(
                f,
                "unpredictable state: instruction buffer ({:#010X}) is valid and out of sync \
                 with pc ({:#010X})",
                buffer_base, pc_base
            ),
            Fault::LoadIntoPc => write!(f, "cannot load into pc"),
            Fault::PcNotLastInList => {
                write!(f, "pc is not the last register in multiple memory load")
            }
            Fault::EmptyRegisterList => {
                write!(f, "multiple memory access instruction has empty register list")
            }
            Fault::SignedStoreWidth => write!(f, "signed sub-word stores not supported"),
            Fault::ArmModeBranch { mnemonic, target } => {
                write!(f, "{} cannot branch to ARM mode (target {:#010X})", mnemonic, target)
            }
            Fault::UnalignedBranchTarget(target) => {
                write!(f, "branching to unaligned address {:#010X}", target)
            }
            Fault::ReservedCondition(cond) => write!(f, "invalid condition flag {}", cond),
            Fault::UnsupportedInstruction(inst) => {
                write!(f, "unsupported instruction {:#06X}", inst)
            }
        }
    }
}

impl std::error::Error for Fault {}
