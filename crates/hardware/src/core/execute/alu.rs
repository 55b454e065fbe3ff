//! Arithmetic, logic, shift, and move semantics.
//!
//! This module implements the inline (non-memory) instruction bodies and
//! the condition-flag calculus:
//! 1. **Flag calculus:** N, Z, C, V computed carry-save over the 32-bit
//!    addition `op0 + op1 + cin`; subtraction passes `op1 = !rhs, cin = 1`,
//!    ADC and SBC thread the carry flag through `cin`.
//! 2. **Shifter carry:** Shift and rotate instructions latch the last bit
//!    shifted out into C, with the zero-shift forms leaving C untouched.
//! 3. **Data movement:** Moves, extensions, and byte-reversals.

use crate::common::constants::{BITS_PER_WORD, align_down, bit_at};
use crate::common::reg::{Reg, RegFile};
use crate::core::Processor;
use crate::stats::Mnemonic;

/// Mask selecting every bit of the addition except the MSB.
const MASK_BELOW_MSB: u32 = !(0x1 << (BITS_PER_WORD - 1));

/// Computes the carry out of bit 31 of `op0 + op1 + cin`.
///
/// The carry into the top bit is formed first, then the top bits are added
/// together with it; the second bit of that 2-bit sum is the carry out.
pub fn carry_from(op0: u32, op1: u32, cin: u32) -> u32 {
    let below = (op0 & MASK_BELOW_MSB)
        .wrapping_add(op1 & MASK_BELOW_MSB)
        .wrapping_add(cin);
    let top = (op0 >> 31) + (op1 >> 31) + (below >> 31);
    (top >> 1) & 0x1
}

/// Computes the signed-overflow flag of `op0 + op1 + cin`.
///
/// V is the XOR of the carry into the MSB and the carry out of the MSB.
pub fn overflow_from(op0: u32, op1: u32, cin: u32) -> u32 {
    let into_msb = ((op0 & MASK_BELOW_MSB)
        .wrapping_add(op1 & MASK_BELOW_MSB)
        .wrapping_add(cin))
        >> 31;
    let out_of_msb = (into_msb + (op0 >> 31) + (op1 >> 31)) >> 1;
    (into_msb ^ out_of_msb) & 0x1
}

/// Sets N and Z from `res`, leaving C, V, and Q untouched.
pub(crate) fn set_flags_nz(regs: &mut RegFile, res: u32) {
    let mut xpsr = regs.read(Reg::Xpsr);
    xpsr = RegFile::set_xpsr_z(xpsr, u32::from(res == 0));
    xpsr = RegFile::set_xpsr_n(xpsr, bit_at(res, BITS_PER_WORD - 1));
    regs.write(Reg::Xpsr, xpsr);
}

/// Sets all four condition flags for `res = op0 + op1 + cin` and clears Q
/// (no saturating operations in this ISA).
pub(crate) fn set_flags_nzcv(regs: &mut RegFile, res: u32, op0: u32, op1: u32, cin: u32) {
    let mut xpsr = regs.read(Reg::Xpsr);
    xpsr = RegFile::set_xpsr_z(xpsr, u32::from(res == 0));
    xpsr = RegFile::set_xpsr_n(xpsr, bit_at(res, BITS_PER_WORD - 1));
    xpsr = RegFile::set_xpsr_q(xpsr, 0);
    xpsr = RegFile::set_xpsr_c(xpsr, carry_from(op0, op1, cin));
    xpsr = RegFile::set_xpsr_v(xpsr, overflow_from(op0, op1, cin));
    regs.write(Reg::Xpsr, xpsr);
}

/// Replaces the C flag with the shifter carry.
pub(crate) fn set_carry(regs: &mut RegFile, flag: u32) {
    let xpsr = regs.read(Reg::Xpsr);
    regs.write(Reg::Xpsr, RegFile::set_xpsr_c(xpsr, flag));
}

pub(crate) fn adc(p: &mut Processor, rdn: Reg, drdn: u32, drm: u32, cflag: u32) {
    let res = drdn.wrapping_add(drm).wrapping_add(cflag);
    set_flags_nzcv(&mut p.regs, res, drdn, drm, cflag);
    p.regs.write(rdn, res);
    p.stats.record(Mnemonic::Adc);
}

pub(crate) fn add1(p: &mut Processor, rd: Reg, drn: u32, im: u32) {
    let res = drn.wrapping_add(im);
    set_flags_nzcv(&mut p.regs, res, drn, im, 0);
    p.regs.write(rd, res);
    p.stats.record(Mnemonic::Add);
}

pub(crate) fn add2(p: &mut Processor, rdn: Reg, drdn: u32, im: u32) {
    let res = drdn.wrapping_add(im);
    set_flags_nzcv(&mut p.regs, res, drdn, im, 0);
    p.regs.write(rdn, res);
    p.stats.record(Mnemonic::Add);
}

pub(crate) fn add3(p: &mut Processor, rd: Reg, drn: u32, drm: u32) {
    let res = drn.wrapping_add(drm);
    set_flags_nzcv(&mut p.regs, res, drn, drm, 0);
    p.regs.write(rd, res);
    p.stats.record(Mnemonic::Add);
}

/// ADD (SP or PC plus immediate): no flags. ADD(5) pre-aligns the captured
/// PC to a word boundary before calling this.
pub(crate) fn add6_add7(p: &mut Processor, rd: Reg, drm: u32, im: u32) {
    let res = drm.wrapping_add(im << 2);
    p.regs.write(rd, res);
    p.stats.record(Mnemonic::Add);
}

pub(crate) fn add5(p: &mut Processor, rd: Reg, drm: u32, im: u32) {
    add6_add7(p, rd, align_down(drm, 4), im);
}

pub(crate) fn and(p: &mut Processor, rdn: Reg, drdn: u32, drm: u32) {
    let res = drdn & drm;
    set_flags_nz(&mut p.regs, res);
    p.regs.write(rdn, res);
    p.stats.record(Mnemonic::And);
}

pub(crate) fn asr1(p: &mut Processor, rd: Reg, drm: u32, im: u32) {
    let res;
    if im == 0 {
        // Shifting by zero: result and C unchanged.
        res = drm;
    } else {
        res = ((drm as i32) >> im) as u32;
        set_carry(&mut p.regs, bit_at(drm, im - 1));
    }

    set_flags_nz(&mut p.regs, res);
    p.regs.write(rd, res);
    p.stats.record(Mnemonic::Asr);
}

pub(crate) fn asr2(p: &mut Processor, rdn: Reg, drdn: u32, drm: u32) {
    let res;
    if drm == 0 {
        res = drdn;
    } else if drm < BITS_PER_WORD {
        set_carry(&mut p.regs, bit_at(drdn, drm - 1));
        res = ((drdn as i32) >> drm) as u32;
    } else {
        // Shift by 32 or more collapses to the sign bit.
        let sign = bit_at(drdn, BITS_PER_WORD - 1);
        set_carry(&mut p.regs, sign);
        res = if sign == 1 { !0 } else { 0 };
    }

    set_flags_nz(&mut p.regs, res);
    p.regs.write(rdn, res);
    p.stats.record(Mnemonic::Asr);
}

pub(crate) fn bic(p: &mut Processor, rdn: Reg, drdn: u32, drm: u32) {
    let res = drdn & !drm;
    set_flags_nz(&mut p.regs, res);
    p.regs.write(rdn, res);
    p.stats.record(Mnemonic::Bic);
}

pub(crate) fn cmn(p: &mut Processor, drn: u32, drm: u32) {
    let res = drn.wrapping_add(drm);
    set_flags_nzcv(&mut p.regs, res, drn, drm, 0);
    p.stats.record(Mnemonic::Cmn);
}

pub(crate) fn cmp1(p: &mut Processor, drn: u32, im: u32) {
    let res = drn.wrapping_sub(im);
    set_flags_nzcv(&mut p.regs, res, drn, !im, 1);
    p.stats.record(Mnemonic::Cmp);
}

pub(crate) fn cmp2_cmp3(p: &mut Processor, drn: u32, drm: u32) {
    let res = drn.wrapping_sub(drm);
    set_flags_nzcv(&mut p.regs, res, drn, !drm, 1);
    p.stats.record(Mnemonic::Cmp);
}

pub(crate) fn eor(p: &mut Processor, rdn: Reg, drdn: u32, drm: u32) {
    let res = drdn ^ drm;
    set_flags_nz(&mut p.regs, res);
    p.regs.write(rdn, res);
    p.stats.record(Mnemonic::Eor);
}

pub(crate) fn lsl1(p: &mut Processor, rd: Reg, drm: u32, im: u32) {
    let res;
    if im == 0 {
        // Shifting by zero: result and C unchanged.
        res = drm;
    } else {
        set_carry(&mut p.regs, bit_at(drm, BITS_PER_WORD - im));
        res = drm << im;
    }

    set_flags_nz(&mut p.regs, res);
    p.regs.write(rd, res);
    p.stats.record(Mnemonic::Lsl);
}

pub(crate) fn lsl2(p: &mut Processor, rdn: Reg, drdn: u32, drm: u32) {
    let res;
    if drm == 0 {
        res = drdn;
    } else if drm == BITS_PER_WORD {
        set_carry(&mut p.regs, drdn & 0x1);
        res = 0;
    } else if drm > BITS_PER_WORD {
        set_carry(&mut p.regs, 0);
        res = 0;
    } else {
        set_carry(&mut p.regs, bit_at(drdn, BITS_PER_WORD - drm));
        res = drdn << drm;
    }

    set_flags_nz(&mut p.regs, res);
    p.regs.write(rdn, res);
    p.stats.record(Mnemonic::Lsl);
}

pub(crate) fn lsr1(p: &mut Processor, rd: Reg, drm: u32, im: u32) {
    let res;
    if im == 0 {
        // Shifting by zero: result and C unchanged.
        res = drm;
    } else {
        set_carry(&mut p.regs, bit_at(drm, im - 1));
        res = drm >> im;
    }

    set_flags_nz(&mut p.regs, res);
    p.regs.write(rd, res);
    p.stats.record(Mnemonic::Lsr);
}

pub(crate) fn lsr2(p: &mut Processor, rdn: Reg, drdn: u32, drm: u32) {
    let res;
    if drm == 0 {
        res = drdn;
    } else if drm == BITS_PER_WORD {
        set_carry(&mut p.regs, bit_at(drdn, BITS_PER_WORD - 1));
        res = 0;
    } else if drm > BITS_PER_WORD {
        set_carry(&mut p.regs, 0);
        res = 0;
    } else {
        set_carry(&mut p.regs, bit_at(drdn, drm - 1));
        res = drdn >> drm;
    }

    set_flags_nz(&mut p.regs, res);
    p.regs.write(rdn, res);
    p.stats.record(Mnemonic::Lsr);
}

pub(crate) fn mov1(p: &mut Processor, rd: Reg, im: u32) {
    p.regs.write(rd, im);
    set_flags_nz(&mut p.regs, im);
    p.stats.record(Mnemonic::Mov);
}

pub(crate) fn mov2(p: &mut Processor, rd: Reg, drm: u32) {
    set_flags_nz(&mut p.regs, drm);
    p.regs.write(rd, drm);
    p.stats.record(Mnemonic::Mov);
}

pub(crate) fn mul(p: &mut Processor, rdn: Reg, drdn: u32, drn: u32) {
    let res = drdn.wrapping_mul(drn);
    set_flags_nz(&mut p.regs, res);
    p.regs.write(rdn, res);
    p.stats.record(Mnemonic::Mul);
}

pub(crate) fn mvn(p: &mut Processor, rd: Reg, drm: u32) {
    let res = !drm;
    set_flags_nz(&mut p.regs, res);
    p.regs.write(rd, res);
    p.stats.record(Mnemonic::Mvn);
}

pub(crate) fn neg(p: &mut Processor, rd: Reg, drn: u32, im: u32) {
    let res = im.wrapping_sub(drn);
    set_flags_nz(&mut p.regs, res);
    p.regs.write(rd, res);
    p.stats.record(Mnemonic::Neg);
}

pub(crate) fn nop(p: &mut Processor) {
    p.stats.record(Mnemonic::Nop);
}

pub(crate) fn orr(p: &mut Processor, rdn: Reg, drdn: u32, drm: u32) {
    let res = drm | drdn;
    set_flags_nz(&mut p.regs, res);
    p.regs.write(rdn, res);
    p.stats.record(Mnemonic::Orr);
}

pub(crate) fn rev(p: &mut Processor, rd: Reg, drm: u32) {
    p.regs.write(rd, drm.swap_bytes());
    p.stats.record(Mnemonic::Rev);
}

pub(crate) fn rev16(p: &mut Processor, rd: Reg, drm: u32) {
    let res = ((drm & 0x00FF_00FF) << 8) | ((drm >> 8) & 0x00FF_00FF);
    p.regs.write(rd, res);
    p.stats.record(Mnemonic::Rev16);
}

pub(crate) fn revsh(p: &mut Processor, rd: Reg, drm: u32) {
    let swapped = ((drm & 0xFF) << 8) | ((drm >> 8) & 0xFF);
    let res = if bit_at(swapped, 15) == 0x1 {
        swapped | 0xFFFF_0000
    } else {
        swapped
    };
    p.regs.write(rd, res);
    p.stats.record(Mnemonic::Revsh);
}

pub(crate) fn ror(p: &mut Processor, rdn: Reg, drdn: u32, drm: u32) {
    let res;
    if drm == 0 {
        res = drdn;
    } else {
        let n = drm % BITS_PER_WORD;
        if n == 0 {
            set_carry(&mut p.regs, 0x1);
            res = drdn;
        } else {
            set_carry(&mut p.regs, bit_at(drdn, n - 1));
            res = drdn.rotate_right(n);
        }
    }

    set_flags_nz(&mut p.regs, res);
    p.regs.write(rdn, res);
    p.stats.record(Mnemonic::Ror);
}

pub(crate) fn sbc(p: &mut Processor, rdn: Reg, drdn: u32, drm: u32, cflag: u32) {
    let res = drdn.wrapping_add(!drm).wrapping_add(cflag);
    set_flags_nzcv(&mut p.regs, res, drdn, !drm, cflag);
    p.regs.write(rdn, res);
    p.stats.record(Mnemonic::Sbc);
}

pub(crate) fn sub1(p: &mut Processor, rd: Reg, drn: u32, im: u32) {
    let res = drn.wrapping_sub(im);
    set_flags_nzcv(&mut p.regs, res, drn, !im, 1);
    p.regs.write(rd, res);
    p.stats.record(Mnemonic::Sub);
}

pub(crate) fn sub2(p: &mut Processor, rdn: Reg, drdn: u32, im: u32) {
    let res = drdn.wrapping_sub(im);
    set_flags_nzcv(&mut p.regs, res, drdn, !im, 1);
    p.regs.write(rdn, res);
    p.stats.record(Mnemonic::Sub);
}

pub(crate) fn sub3(p: &mut Processor, rd: Reg, drn: u32, drm: u32) {
    let res = drn.wrapping_sub(drm);
    set_flags_nzcv(&mut p.regs, res, drn, !drm, 1);
    p.regs.write(rd, res);
    p.stats.record(Mnemonic::Sub);
}

/// SUB (SP minus immediate): no flags.
pub(crate) fn sub4(p: &mut Processor, rdn: Reg, drdn: u32, im: u32) {
    let res = drdn.wrapping_sub(im << 2);
    p.regs.write(rdn, res);
    p.stats.record(Mnemonic::Sub);
}

pub(crate) fn tst(p: &mut Processor, drm: u32, drn: u32) {
    set_flags_nz(&mut p.regs, drm & drn);
    p.stats.record(Mnemonic::Tst);
}

pub(crate) fn uxtb(p: &mut Processor, rd: Reg, drm: u32) {
    p.regs.write(rd, drm & 0xFF);
    p.stats.record(Mnemonic::Uxtb);
}

pub(crate) fn uxth(p: &mut Processor, rd: Reg, drm: u32) {
    p.regs.write(rd, drm & 0xFFFF);
    p.stats.record(Mnemonic::Uxth);
}

pub(crate) fn sxtb(p: &mut Processor, rd: Reg, drm: u32) {
    let mut res = drm & 0xFF;
    if bit_at(res, 7) != 0 {
        res |= 0xFFFF_FF00;
    }
    p.regs.write(rd, res);
    p.stats.record(Mnemonic::Sxtb);
}

pub(crate) fn sxth(p: &mut Processor, rd: Reg, drm: u32) {
    let mut res = drm & 0xFFFF;
    if bit_at(res, 15) != 0 {
        res |= 0xFFFF_0000;
    }
    p.regs.write(rd, res);
    p.stats.record(Mnemonic::Sxth);
}
