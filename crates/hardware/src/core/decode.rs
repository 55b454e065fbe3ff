//! Instruction decode stage.
//!
//! Decode pulls one halfword per tick from fetch and matches it against a
//! linear mask/match cascade, first match wins. Matching an encoding
//! captures the operand registers together with their values at this
//! cycle; while the decoded record stalls waiting for execute, those
//! captured values are refreshed from the register file every tick so
//! execute never consumes stale operands.
//!
//! The long branch-with-link is the single two-halfword encoding: the
//! first halfword stages the high immediate bits and latches the record
//! open; the second halfword completes the immediate.
//!
//! When decode runs ahead of execute it can pull a value that is not an
//! instruction at all (data following an unconditional branch). Rather
//! than reject it here, the cascade falls through to a synthetic `SVC 66`
//! placeholder: executing it terminates the simulation unless a flush
//! discards it first.

use crate::common::constants::{PLACEHOLDER_SVC_IMM, next_thumb_inst};
use crate::common::error::Fault;
use crate::common::reg::{Reg, RegFile};
use crate::core::Processor;
use crate::core::fetch;
use crate::isa::disasm::disassemble;
use crate::isa::instruction::{ALL_SLOTS, Condition, DecodedInst, Op, Slot};

/// State of the decode stage.
#[derive(Debug, Default)]
pub struct DecodeUnit {
    in_flight: Option<DecodedInst>,
    half_pending: bool,
    flush_pending: bool,
}

impl DecodeUnit {
    /// Creates an idle decode stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a flush; takes effect at the next decode tick.
    pub fn flush(&mut self) {
        self.flush_pending = true;
    }

    /// Hands the in-flight record to execute, if one is complete.
    pub fn take_next(&mut self) -> Option<DecodedInst> {
        if self.half_pending {
            return None;
        }
        self.in_flight.take()
    }
}

/// Result of matching one halfword.
pub enum DecodeOutcome {
    /// A complete record, ready for execute.
    Complete(DecodedInst),
    /// The first halfword of a two-halfword encoding; the record stays open.
    Partial(DecodedInst),
}

/// Builds the placeholder record for unpredictable or unrecognised input.
fn placeholder() -> DecodedInst {
    let mut d = DecodedInst::new();
    d.set_op(Op::Svc);
    d.set_imm(PLACEHOLDER_SVC_IMM);
    d
}

/// Runs one decode cycle.
pub fn decode_stage(p: &mut Processor) -> Result<(), Fault> {
    if p.decode.flush_pending {
        p.decode.half_pending = false;
        p.decode.in_flight = None;
        p.decode.flush_pending = false;

        if p.trace {
            eprintln!("Decode: flushing");
        }
        return Ok(());
    }

    if p.decode.in_flight.is_some() && !p.decode.half_pending {
        // Execute has not consumed the record: stall, and refresh the
        // captured operands in case they were loaded a while ago.
        if let Some(d) = p.decode.in_flight.as_mut() {
            refresh_operands(d, &p.regs);
        }
        if p.trace {
            eprintln!("Decode: stalled, pending execution");
        }
        return Ok(());
    }

    let Some(inst) = fetch::next_inst(p)? else {
        if p.trace {
            eprintln!("Decode: stalled, pending fetch");
        }
        return Ok(());
    };

    // PC reads as two halfwords beyond the fetch cursor.
    let pc = next_thumb_inst(p.regs.read(Reg::Pc));
    let active_sp = p.regs.active_sp();

    if p.decode.half_pending {
        p.decode.half_pending = false;

        if let Some(d) = p.decode.in_flight.as_mut() {
            if (inst & 0xD000) == 0xD000 {
                let im11 = u32::from(inst) & 0x7FF;
                let j1 = (u32::from(inst) >> 13) & 0x1;
                let j2 = (u32::from(inst) >> 11) & 0x1;

                let staged = d.imm();
                let s = (staged >> 24) & 0x1;
                let i1 = !(j1 ^ s) & 0x1;
                let i2 = !(j2 ^ s) & 0x1;

                d.set_imm(staged | (i1 << 23) | (i2 << 22) | (im11 << 1));

                if p.trace {
                    eprintln!("Decode: {}", disassemble(d));
                }
            } else {
                *d = placeholder();
                if p.trace {
                    eprintln!("Decode: unable to decode second half {:#06X}, issuing: {}",
                        inst,
                        disassemble(d));
                }
            }
        }
        return Ok(());
    }

    match decode_halfword(inst, pc, active_sp, &p.regs)? {
        DecodeOutcome::Complete(d) => {
            if p.trace {
                eprintln!("Decode: {}", disassemble(&d));
            }
            p.decode.in_flight = Some(d);
        }
        DecodeOutcome::Partial(d) => {
            if p.trace {
                eprintln!("Decode: bl first half");
            }
            p.decode.in_flight = Some(d);
            p.decode.half_pending = true;
        }
    }

    Ok(())
}

/// Refreshes the captured value of every live operand slot.
///
/// Stack-pointer slots are re-routed through the active SP selector first;
/// PC captures keep their corrected fetch address.
fn refresh_operands(d: &mut DecodedInst, regs: &RegFile) {
    for slot in ALL_SLOTS {
        let mut reg = d.register(slot);
        if reg == Reg::Msp || reg == Reg::Psp {
            reg = regs.active_sp();
        }
        if reg != Reg::Rnone && reg != Reg::Pc {
            d.set_register(slot, reg, regs.read(reg));
        }
    }
}

/// Matches one halfword against the dispatch cascade.
///
/// `pc` is the corrected fetch address captured for PC operands and
/// `active_sp` the stack pointer substituted wherever the encoding
/// references R13. The cascade is ordered; the first match wins.
pub fn decode_halfword(
    inst: u16,
    pc: u32,
    active_sp: Reg,
    regs: &RegFile,
) -> Result<DecodeOutcome, Fault> {
    use DecodeOutcome::{Complete, Partial};

    let w = u32::from(inst);
    let mut d = DecodedInst::new();

    // ADC (register)
    if (inst & 0xFFC0) == 0x4140 {
        let rdn = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Adc);
        d.set_register(Slot::Rdn, rdn, regs.read(rdn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        d.set_register(Slot::Xpsr, Reg::Xpsr, regs.read(Reg::Xpsr));
        return Ok(Complete(d));
    }

    // ADD(1) (immediate)
    if (inst & 0xFE00) == 0x1C00 {
        let rd = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Add1);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_imm((w >> 6) & 0x7);
        return Ok(Complete(d));
    }

    // ADD(2) (immediate)
    if (inst & 0xF800) == 0x3000 {
        let rdn = Reg::from_index((w >> 8) & 0x7);

        d.set_op(Op::Add2);
        d.set_register(Slot::Rdn, rdn, regs.read(rdn));
        d.set_imm(w & 0xFF);
        return Ok(Complete(d));
    }

    // ADD(3) (register)
    if (inst & 0xFE00) == 0x1800 {
        let rd = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);
        let rm = Reg::from_index((w >> 6) & 0x7);

        d.set_op(Op::Add3);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // ADD(4) (register, high); also covers ADD (SP plus register)
    if (inst & 0xFF00) == 0x4400 {
        let rdn = Reg::from_index((w & 0x7) | ((w >> 4) & 0x8));
        let rm = Reg::from_index((w >> 3) & 0xF);

        if rdn == Reg::Pc && rm == Reg::Pc {
            // Unpredictable: rdn == rm == pc.
            return Ok(Complete(placeholder()));
        }

        let ra = if rdn == Reg::Pc { pc } else { regs.read(rdn) };
        let rb = if rm == Reg::Pc { pc } else { regs.read(rm) };

        d.set_op(Op::Add4);
        d.set_register(Slot::Rdn, rdn, ra);
        d.set_register(Slot::Rm, rm, rb);
        return Ok(Complete(d));
    }

    // ADR / ADD(5) (PC plus immediate)
    if (inst & 0xF800) == 0xA000 {
        let rd = Reg::from_index((w >> 8) & 0x7);

        d.set_op(Op::Add5);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rm, Reg::Pc, pc);
        d.set_imm(w & 0xFF);
        return Ok(Complete(d));
    }

    // ADD(6) (SP plus immediate)
    if (inst & 0xF800) == 0xA800 {
        let rd = Reg::from_index((w >> 8) & 0x7);

        d.set_op(Op::Add6);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rm, active_sp, regs.read(active_sp));
        d.set_imm(w & 0xFF);
        return Ok(Complete(d));
    }

    // ADD(7) (SP plus immediate, in place)
    if (inst & 0xFF80) == 0xB000 {
        d.set_op(Op::Add7);
        d.set_register(Slot::Rd, active_sp, 0);
        d.set_register(Slot::Rm, active_sp, regs.read(active_sp));
        d.set_imm(w & 0x7F);
        return Ok(Complete(d));
    }

    // AND (register)
    if (inst & 0xFFC0) == 0x4000 {
        let rdn = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::And);
        d.set_register(Slot::Rdn, rdn, regs.read(rdn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // ASR(1) (immediate)
    if (inst & 0xF800) == 0x1000 {
        let rd = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Asr1);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rm, rm, regs.read(rm));
        d.set_imm((w >> 6) & 0x1F);
        return Ok(Complete(d));
    }

    // ASR(2) (register)
    if (inst & 0xFFC0) == 0x4100 {
        let rdn = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Asr2);
        d.set_register(Slot::Rdn, rdn, regs.read(rdn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // B(1) (conditional branch)
    if (inst & 0xF000) == 0xD000 {
        let cond = (w >> 8) & 0xF;

        if cond == Condition::U0 as u32 {
            // Branch with the reserved condition.
            return Ok(Complete(placeholder()));
        }
        if cond != Condition::U1 as u32 {
            d.set_op(Op::B1);
            d.set_register(Slot::Rm, Reg::Pc, pc);
            d.set_register(Slot::Xpsr, Reg::Xpsr, regs.read(Reg::Xpsr));
            d.set_imm(w & 0xFF);
            d.set_condition(Condition::from_bits(cond));
            return Ok(Complete(d));
        }

        // cond == 0xF: fall through to SVC.
    }

    // B(2) (unconditional branch)
    if (inst & 0xF800) == 0xE000 {
        d.set_op(Op::B2);
        d.set_register(Slot::Rm, Reg::Pc, pc);
        d.set_imm(w & 0x7FF);
        return Ok(Complete(d));
    }

    // BIC (register)
    if (inst & 0xFFC0) == 0x4380 {
        let rdn = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Bic);
        d.set_register(Slot::Rdn, rdn, regs.read(rdn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // BKPT
    if (inst & 0xFF00) == 0xBE00 {
        d.set_op(Op::Bkpt);
        d.set_imm(w & 0xFF);
        return Ok(Complete(d));
    }

    // BL (32-bit, first halfword)
    if (inst & 0xF800) == 0xF000 {
        let im10 = w & 0x3FF;
        let s = (w >> 10) & 0x1;

        d.set_op(Op::Bl);
        d.set_register(Slot::Rdn, Reg::Pc, pc);
        d.set_imm((im10 << 12) | (s << 24));
        return Ok(Partial(d));
    }

    // BLX (register)
    if (inst & 0xFF87) == 0x4780 {
        let rm = Reg::from_index((w >> 3) & 0xF);

        if rm == Reg::Pc {
            // BLX cannot take pc as its operand register.
            return Ok(Complete(placeholder()));
        }

        d.set_op(Op::Blx);
        d.set_register(Slot::Rdn, Reg::Pc, pc);
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // BX
    if (inst & 0xFF87) == 0x4700 {
        let rm = Reg::from_index((w >> 3) & 0xF);
        let rb = if rm == Reg::Pc { pc } else { regs.read(rm) };

        d.set_op(Op::Bx);
        d.set_register(Slot::Rdn, Reg::Pc, pc);
        d.set_register(Slot::Rm, rm, rb);
        return Ok(Complete(d));
    }

    // CMN (register)
    if (inst & 0xFFC0) == 0x42C0 {
        let rn = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Cmn);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // CMP(1) (immediate)
    if (inst & 0xF800) == 0x2800 {
        let rn = Reg::from_index((w >> 8) & 0x7);

        d.set_op(Op::Cmp1);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_imm(w & 0xFF);
        return Ok(Complete(d));
    }

    // CMP(2) (register)
    if (inst & 0xFFC0) == 0x4280 {
        let rn = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Cmp2);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // CMP(3) (register, high)
    if (inst & 0xFF00) == 0x4500 {
        let rn = Reg::from_index((w & 0x7) | ((w >> 4) & 0x8));
        let rm = Reg::from_index((w >> 3) & 0xF);

        if ((w >> 6) & 0x3) == 0x0 {
            // Unpredictable: both operands are low registers.
            return Ok(Complete(placeholder()));
        }
        if rn == Reg::Pc || rm == Reg::Pc {
            // Unpredictable: pc operand.
            return Ok(Complete(placeholder()));
        }

        d.set_op(Op::Cmp3);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // CPS, repurposed to emit the byte in r0
    if (inst & 0xFFEC) == 0xB660 {
        d.set_op(Op::Cps);
        d.set_register(Slot::Rm, Reg::R0, regs.read(Reg::R0));
        return Ok(Complete(d));
    }

    // CPY / MOV (register, high)
    if (inst & 0xFF00) == 0x4600 {
        let rd = Reg::from_index((w & 0x7) | ((w >> 4) & 0x8));
        let rm = Reg::from_index((w >> 3) & 0xF);
        let rb = if rm == Reg::Pc { pc } else { regs.read(rm) };

        d.set_op(Op::Cpy);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rm, rm, rb);
        return Ok(Complete(d));
    }

    // EOR (register)
    if (inst & 0xFFC0) == 0x4040 {
        let rdn = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Eor);
        d.set_register(Slot::Rdn, rdn, regs.read(rdn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // LDMIA
    if (inst & 0xF800) == 0xC800 {
        let rn = Reg::from_index((w >> 8) & 0x7);
        let rl = w & 0xFF;

        if rl == 0 {
            // Unpredictable: empty register list.
            return Ok(Complete(placeholder()));
        }

        d.set_op(Op::Ldmia);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_reg_list(rl);
        return Ok(Complete(d));
    }

    // LDR(1) (immediate)
    if (inst & 0xF800) == 0x6800 {
        let rt = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Ldr1);
        d.set_register(Slot::Rt, rt, 0);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_imm((w >> 6) & 0x1F);
        return Ok(Complete(d));
    }

    // LDR(2) (register)
    if (inst & 0xFE00) == 0x5800 {
        let rt = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);
        let rm = Reg::from_index((w >> 6) & 0x7);

        d.set_op(Op::Ldr2);
        d.set_register(Slot::Rt, rt, 0);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // LDR(3) (literal)
    if (inst & 0xF800) == 0x4800 {
        let rt = Reg::from_index((w >> 8) & 0x7);

        d.set_op(Op::Ldr3);
        d.set_register(Slot::Rt, rt, 0);
        d.set_register(Slot::Rn, Reg::Pc, pc);
        d.set_imm(w & 0xFF);
        return Ok(Complete(d));
    }

    // LDR(4) (SP-relative)
    if (inst & 0xF800) == 0x9800 {
        let rt = Reg::from_index((w >> 8) & 0x7);

        d.set_op(Op::Ldr4);
        d.set_register(Slot::Rt, rt, 0);
        d.set_register(Slot::Rn, active_sp, regs.read(active_sp));
        d.set_imm(w & 0xFF);
        return Ok(Complete(d));
    }

    // LDRB(1) (immediate)
    if (inst & 0xF800) == 0x7800 {
        let rt = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Ldrb1);
        d.set_register(Slot::Rt, rt, 0);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_imm((w >> 6) & 0x1F);
        return Ok(Complete(d));
    }

    // LDRB(2) (register)
    if (inst & 0xFE00) == 0x5C00 {
        let rt = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);
        let rm = Reg::from_index((w >> 6) & 0x7);

        d.set_op(Op::Ldrb2);
        d.set_register(Slot::Rt, rt, 0);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // LDRH(1) (immediate)
    if (inst & 0xF800) == 0x8800 {
        let rt = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Ldrh1);
        d.set_register(Slot::Rt, rt, 0);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_imm((w >> 6) & 0x1F);
        return Ok(Complete(d));
    }

    // LDRH(2) (register)
    if (inst & 0xFE00) == 0x5A00 {
        let rt = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);
        let rm = Reg::from_index((w >> 6) & 0x7);

        d.set_op(Op::Ldrh2);
        d.set_register(Slot::Rt, rt, 0);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // LDRSB (register)
    if (inst & 0xFE00) == 0x5600 {
        let rt = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);
        let rm = Reg::from_index((w >> 6) & 0x7);

        d.set_op(Op::Ldrsb);
        d.set_register(Slot::Rt, rt, 0);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // LDRSH (register)
    if (inst & 0xFE00) == 0x5E00 {
        let rt = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);
        let rm = Reg::from_index((w >> 6) & 0x7);

        d.set_op(Op::Ldrsh);
        d.set_register(Slot::Rt, rt, 0);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // LSL(1) (immediate)
    if (inst & 0xF800) == 0x0000 {
        let rd = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Lsl1);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rm, rm, regs.read(rm));
        d.set_imm((w >> 6) & 0x1F);
        return Ok(Complete(d));
    }

    // LSL(2) (register)
    if (inst & 0xFFC0) == 0x4080 {
        let rdn = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Lsl2);
        d.set_register(Slot::Rdn, rdn, regs.read(rdn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // LSR(1) (immediate)
    if (inst & 0xF800) == 0x0800 {
        let rd = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Lsr1);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rm, rm, regs.read(rm));
        d.set_imm((w >> 6) & 0x1F);
        return Ok(Complete(d));
    }

    // LSR(2) (register)
    if (inst & 0xFFC0) == 0x40C0 {
        let rdn = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Lsr2);
        d.set_register(Slot::Rdn, rdn, regs.read(rdn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // MOV(1) (immediate)
    if (inst & 0xF800) == 0x2000 {
        let rd = Reg::from_index((w >> 8) & 0x7);

        d.set_op(Op::Mov1);
        d.set_register(Slot::Rd, rd, 0);
        d.set_imm(w & 0xFF);
        return Ok(Complete(d));
    }

    // MOV(2) (register). Shadowed by LSL(1) with a zero shift, which has
    // identical result and N/Z behaviour; kept in cascade position.
    if (inst & 0xFFC0) == 0x0000 {
        let rd = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Mov2);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // MUL
    if (inst & 0xFFC0) == 0x4340 {
        let rdn = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Mul);
        d.set_register(Slot::Rdn, rdn, regs.read(rdn));
        d.set_register(Slot::Rn, rn, regs.read(rn));
        return Ok(Complete(d));
    }

    // MVN (register)
    if (inst & 0xFFC0) == 0x43C0 {
        let rd = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Mvn);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // NEG (RSB with zero immediate)
    if (inst & 0xFFC0) == 0x4240 {
        let rd = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Neg);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_imm(0);
        return Ok(Complete(d));
    }

    // NOP
    if inst == 0xBF00 {
        d.set_op(Op::Nop);
        return Ok(Complete(d));
    }

    // ORR (register)
    if (inst & 0xFFC0) == 0x4300 {
        let rdn = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Orr);
        d.set_register(Slot::Rdn, rdn, regs.read(rdn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // POP
    if (inst & 0xFE00) == 0xBC00 {
        let rl = (w & 0xFF) | (((w >> 8) & 0x1) << Reg::Pc as u32);

        if rl == 0 {
            // Unpredictable: empty register list.
            return Ok(Complete(placeholder()));
        }

        d.set_op(Op::Pop);
        d.set_register(Slot::Rn, active_sp, regs.read(active_sp));
        d.set_reg_list(rl);
        return Ok(Complete(d));
    }

    // PUSH
    if (inst & 0xFE00) == 0xB400 {
        let rl = (w & 0xFF) | (((w >> 8) & 0x1) << Reg::Lr as u32);

        if rl == 0 {
            // Unpredictable: empty register list.
            return Ok(Complete(placeholder()));
        }

        d.set_op(Op::Push);
        d.set_register(Slot::Rn, active_sp, regs.read(active_sp));
        d.set_reg_list(rl);
        return Ok(Complete(d));
    }

    // REV
    if (inst & 0xFFC0) == 0xBA00 {
        let rd = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Rev);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // REV16
    if (inst & 0xFFC0) == 0xBA40 {
        let rd = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Rev16);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // REVSH
    if (inst & 0xFFC0) == 0xBAC0 {
        let rd = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Revsh);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // ROR (register)
    if (inst & 0xFFC0) == 0x41C0 {
        let rdn = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Ror);
        d.set_register(Slot::Rdn, rdn, regs.read(rdn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // SBC (register)
    if (inst & 0xFFC0) == 0x4180 {
        let rdn = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Sbc);
        d.set_register(Slot::Rdn, rdn, regs.read(rdn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        d.set_register(Slot::Xpsr, Reg::Xpsr, regs.read(Reg::Xpsr));
        return Ok(Complete(d));
    }

    // SEV
    if inst == 0xBF40 {
        return Err(Fault::UnsupportedInstruction(inst));
    }

    // STMIA
    if (inst & 0xF800) == 0xC000 {
        let rn = Reg::from_index((w >> 8) & 0x7);
        let rl = w & 0xFF;

        if rl == 0 {
            // Unpredictable: empty register list.
            return Ok(Complete(placeholder()));
        }

        d.set_op(Op::Stmia);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_reg_list(rl);
        return Ok(Complete(d));
    }

    // STR(1) (immediate)
    if (inst & 0xF800) == 0x6000 {
        let rt = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Str1);
        d.set_register(Slot::Rt, rt, regs.read(rt));
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_imm((w >> 6) & 0x1F);
        return Ok(Complete(d));
    }

    // STR(2) (register)
    if (inst & 0xFE00) == 0x5000 {
        let rt = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);
        let rm = Reg::from_index((w >> 6) & 0x7);

        d.set_op(Op::Str2);
        d.set_register(Slot::Rt, rt, regs.read(rt));
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // STR(3) (SP-relative)
    if (inst & 0xF800) == 0x9000 {
        let rt = Reg::from_index((w >> 8) & 0x7);

        d.set_op(Op::Str3);
        d.set_register(Slot::Rt, rt, regs.read(rt));
        d.set_register(Slot::Rn, active_sp, regs.read(active_sp));
        d.set_imm(w & 0xFF);
        return Ok(Complete(d));
    }

    // STRB(1) (immediate)
    if (inst & 0xF800) == 0x7000 {
        let rt = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Strb1);
        d.set_register(Slot::Rt, rt, regs.read(rt));
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_imm((w >> 6) & 0x1F);
        return Ok(Complete(d));
    }

    // STRB(2) (register)
    if (inst & 0xFE00) == 0x5400 {
        let rt = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);
        let rm = Reg::from_index((w >> 6) & 0x7);

        d.set_op(Op::Strb2);
        d.set_register(Slot::Rt, rt, regs.read(rt));
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // STRH(1) (immediate)
    if (inst & 0xF800) == 0x8000 {
        let rt = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Strh1);
        d.set_register(Slot::Rt, rt, regs.read(rt));
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_imm((w >> 6) & 0x1F);
        return Ok(Complete(d));
    }

    // STRH(2) (register)
    if (inst & 0xFE00) == 0x5200 {
        let rt = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);
        let rm = Reg::from_index((w >> 6) & 0x7);

        d.set_op(Op::Strh2);
        d.set_register(Slot::Rt, rt, regs.read(rt));
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // SUB(1) (immediate)
    if (inst & 0xFE00) == 0x1E00 {
        let rd = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Sub1);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_imm((w >> 6) & 0x7);
        return Ok(Complete(d));
    }

    // SUB(2) (immediate)
    if (inst & 0xF800) == 0x3800 {
        let rdn = Reg::from_index((w >> 8) & 0x7);

        d.set_op(Op::Sub2);
        d.set_register(Slot::Rdn, rdn, regs.read(rdn));
        d.set_imm(w & 0xFF);
        return Ok(Complete(d));
    }

    // SUB(3) (register)
    if (inst & 0xFE00) == 0x1A00 {
        let rd = Reg::from_index(w & 0x7);
        let rn = Reg::from_index((w >> 3) & 0x7);
        let rm = Reg::from_index((w >> 6) & 0x7);

        d.set_op(Op::Sub3);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // SUB(4) (SP minus immediate)
    if (inst & 0xFF80) == 0xB080 {
        d.set_op(Op::Sub4);
        d.set_register(Slot::Rdn, active_sp, regs.read(active_sp));
        d.set_imm(w & 0x7F);
        return Ok(Complete(d));
    }

    // SVC
    if (inst & 0xFF00) == 0xDF00 {
        d.set_op(Op::Svc);
        d.set_imm(w & 0xFF);
        return Ok(Complete(d));
    }

    // SXTB
    if (inst & 0xFFC0) == 0xB240 {
        let rd = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Sxtb);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // SXTH
    if (inst & 0xFFC0) == 0xB200 {
        let rd = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Sxth);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // TST (register)
    if (inst & 0xFFC0) == 0x4200 {
        let rn = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Tst);
        d.set_register(Slot::Rn, rn, regs.read(rn));
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // UXTB
    if (inst & 0xFFC0) == 0xB2C0 {
        let rd = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Uxtb);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // UXTH
    if (inst & 0xFFC0) == 0xB280 {
        let rd = Reg::from_index(w & 0x7);
        let rm = Reg::from_index((w >> 3) & 0x7);

        d.set_op(Op::Uxth);
        d.set_register(Slot::Rd, rd, 0);
        d.set_register(Slot::Rm, rm, regs.read(rm));
        return Ok(Complete(d));
    }

    // No pattern matched.
    Ok(Complete(placeholder()))
}
