//! Register file.
//!
//! This module provides the architectural register state of the core:
//! 1. **Register naming:** The `Reg` enum covering R0-R12, the two stack
//!    pointers, LR, PC, xPSR, CONTROL, and a "no register" sentinel.
//! 2. **Storage:** A 19-entry word-addressed bank with same-cycle access.
//! 3. **Flag accessors:** Pure helpers over xPSR and CONTROL bit fields.

use crate::common::constants::bit_at;

/// Number of entries in the register file.
pub const REGFILE_SIZE: usize = 19;

/// Number of registers reachable by multiple load/store register lists.
pub const CORE_REGS_COUNT: u32 = 16;

/// Bit index of the N (negative) flag in xPSR.
pub const XPSR_N_BIT: u32 = 31;
/// Bit index of the Z (zero) flag in xPSR.
pub const XPSR_Z_BIT: u32 = 30;
/// Bit index of the C (carry) flag in xPSR.
pub const XPSR_C_BIT: u32 = 29;
/// Bit index of the V (overflow) flag in xPSR.
pub const XPSR_V_BIT: u32 = 28;
/// Bit index of the Q (saturation) flag in xPSR.
pub const XPSR_Q_BIT: u32 = 27;
/// Bit index of the T (Thumb state) flag in xPSR.
pub const XPSR_T_BIT: u32 = 24;
/// Bit index of the exception number field in xPSR.
pub const XPSR_EXCEPTION_BIT: u32 = 0;
/// Width of the exception number field in xPSR.
pub const XPSR_EXCEPTION_BITS: u32 = 9;

/// Bit index of the P (privileged) flag in CONTROL.
pub const CONTROL_P_BIT: u32 = 0;
/// Bit index of the S (active SP selector) flag in CONTROL.
pub const CONTROL_S_BIT: u32 = 1;

/// Architectural register names.
///
/// `Rnone` marks an unused operand slot in a decoded instruction; it is
/// never a valid read or write target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Reg {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
    R8 = 8,
    R9 = 9,
    R10 = 10,
    R11 = 11,
    R12 = 12,
    Msp = 13,
    Lr = 14,
    Pc = 15,
    Psp = 16,
    Xpsr = 17,
    Control = 18,
    Rnone = 19,
}

impl Reg {
    /// Maps a register number from an instruction encoding to a `Reg`.
    ///
    /// Numbers outside the register file map to the `Rnone` sentinel.
    pub fn from_index(idx: u32) -> Reg {
        match idx {
            0 => Reg::R0,
            1 => Reg::R1,
            2 => Reg::R2,
            3 => Reg::R3,
            4 => Reg::R4,
            5 => Reg::R5,
            6 => Reg::R6,
            7 => Reg::R7,
            8 => Reg::R8,
            9 => Reg::R9,
            10 => Reg::R10,
            11 => Reg::R11,
            12 => Reg::R12,
            13 => Reg::Msp,
            14 => Reg::Lr,
            15 => Reg::Pc,
            16 => Reg::Psp,
            17 => Reg::Xpsr,
            18 => Reg::Control,
            _ => Reg::Rnone,
        }
    }

    /// Returns the register file index of this register.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the lowercase assembler name of this register.
    pub fn name(self) -> &'static str {
        match self {
            Reg::R0 => "r0",
            Reg::R1 => "r1",
            Reg::R2 => "r2",
            Reg::R3 => "r3",
            Reg::R4 => "r4",
            Reg::R5 => "r5",
            Reg::R6 => "r6",
            Reg::R7 => "r7",
            Reg::R8 => "r8",
            Reg::R9 => "r9",
            Reg::R10 => "r10",
            Reg::R11 => "r11",
            Reg::R12 => "r12",
            Reg::Msp => "msp",
            Reg::Lr => "lr",
            Reg::Pc => "pc",
            Reg::Psp => "psp",
            Reg::Xpsr => "xpsr",
            Reg::Control => "control",
            Reg::Rnone => "rnone",
        }
    }
}

/// 19-entry word-addressed register bank.
///
/// All reads and writes complete in the same cycle; there is no latency.
/// Callers must not read or write through the `Rnone` sentinel.
#[derive(Clone, Debug, Default)]
pub struct RegFile {
    regs: [u32; REGFILE_SIZE],
}

impl RegFile {
    /// Creates a register file with every entry cleared.
    pub fn new() -> Self {
        Self {
            regs: [0; REGFILE_SIZE],
        }
    }

    /// Reads a register.
    #[inline]
    pub fn read(&self, reg: Reg) -> u32 {
        debug_assert!(reg != Reg::Rnone, "read through the no-register sentinel");
        self.regs[reg.index() % REGFILE_SIZE]
    }

    /// Writes a register.
    #[inline]
    pub fn write(&mut self, reg: Reg, data: u32) {
        debug_assert!(reg != Reg::Rnone, "write through the no-register sentinel");
        self.regs[reg.index() % REGFILE_SIZE] = data;
    }

    /// Returns the stack pointer selected by CONTROL.S.
    pub fn active_sp(&self) -> Reg {
        if self.control_s() == 0 {
            Reg::Msp
        } else {
            Reg::Psp
        }
    }

    /// Returns the CONTROL.S (active SP selector) bit.
    pub fn control_s(&self) -> u32 {
        bit_at(self.regs[Reg::Control.index()], CONTROL_S_BIT)
    }

    /// Returns the CONTROL.P (privileged) bit.
    pub fn control_p(&self) -> u32 {
        bit_at(self.regs[Reg::Control.index()], CONTROL_P_BIT)
    }

    /// Sets the CONTROL.S (active SP selector) bit.
    pub fn set_control_s(&mut self, flag: u32) {
        let r = Reg::Control.index();
        self.regs[r] = set_bit(self.regs[r], CONTROL_S_BIT, flag);
    }

    /// Sets the CONTROL.P (privileged) bit.
    pub fn set_control_p(&mut self, flag: u32) {
        let r = Reg::Control.index();
        self.regs[r] = set_bit(self.regs[r], CONTROL_P_BIT, flag);
    }

    /// Dumps the register file contents to stderr, one register per line.
    pub fn dump(&self) {
        eprintln!("RegFile: register file contents");
        for idx in 0..REGFILE_SIZE as u32 {
            let reg = Reg::from_index(idx);
            eprintln!("    {:<7}:{:#010X}", reg.name(), self.regs[reg.index()]);
        }
    }

    /// Returns the N flag of an xPSR value.
    #[inline]
    pub fn xpsr_n(xpsr: u32) -> u32 {
        bit_at(xpsr, XPSR_N_BIT)
    }

    /// Returns the Z flag of an xPSR value.
    #[inline]
    pub fn xpsr_z(xpsr: u32) -> u32 {
        bit_at(xpsr, XPSR_Z_BIT)
    }

    /// Returns the C flag of an xPSR value.
    #[inline]
    pub fn xpsr_c(xpsr: u32) -> u32 {
        bit_at(xpsr, XPSR_C_BIT)
    }

    /// Returns the V flag of an xPSR value.
    #[inline]
    pub fn xpsr_v(xpsr: u32) -> u32 {
        bit_at(xpsr, XPSR_V_BIT)
    }

    /// Returns the Q flag of an xPSR value.
    #[inline]
    pub fn xpsr_q(xpsr: u32) -> u32 {
        bit_at(xpsr, XPSR_Q_BIT)
    }

    /// Returns the T flag of an xPSR value.
    #[inline]
    pub fn xpsr_t(xpsr: u32) -> u32 {
        bit_at(xpsr, XPSR_T_BIT)
    }

    /// Returns an xPSR value with the N flag replaced.
    #[inline]
    pub fn set_xpsr_n(xpsr: u32, flag: u32) -> u32 {
        set_bit(xpsr, XPSR_N_BIT, flag)
    }

    /// Returns an xPSR value with the Z flag replaced.
    #[inline]
    pub fn set_xpsr_z(xpsr: u32, flag: u32) -> u32 {
        set_bit(xpsr, XPSR_Z_BIT, flag)
    }

    /// Returns an xPSR value with the C flag replaced.
    #[inline]
    pub fn set_xpsr_c(xpsr: u32, flag: u32) -> u32 {
        set_bit(xpsr, XPSR_C_BIT, flag)
    }

    /// Returns an xPSR value with the V flag replaced.
    #[inline]
    pub fn set_xpsr_v(xpsr: u32, flag: u32) -> u32 {
        set_bit(xpsr, XPSR_V_BIT, flag)
    }

    /// Returns an xPSR value with the Q flag replaced.
    #[inline]
    pub fn set_xpsr_q(xpsr: u32, flag: u32) -> u32 {
        set_bit(xpsr, XPSR_Q_BIT, flag)
    }

    /// Returns an xPSR value with the T flag replaced.
    #[inline]
    pub fn set_xpsr_t(xpsr: u32, flag: u32) -> u32 {
        set_bit(xpsr, XPSR_T_BIT, flag)
    }

    /// Returns the exception number field of an xPSR value.
    pub fn xpsr_exception(xpsr: u32) -> u32 {
        let mask = (0x1 << XPSR_EXCEPTION_BITS) - 1;
        (xpsr >> XPSR_EXCEPTION_BIT) & mask
    }

    /// Returns an xPSR value with the exception number field replaced.
    pub fn set_xpsr_exception(xpsr: u32, exception: u32) -> u32 {
        let mask = ((0x1 << XPSR_EXCEPTION_BITS) - 1) << XPSR_EXCEPTION_BIT;
        (xpsr & !mask) | ((exception << XPSR_EXCEPTION_BIT) & mask)
    }
}

/// Returns `val` with bit `pos` replaced by the low bit of `flag`.
#[inline]
fn set_bit(val: u32, pos: u32, flag: u32) -> u32 {
    (val & !(0x1 << pos)) | ((flag & 0x1) << pos)
}
