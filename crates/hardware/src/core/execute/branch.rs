//! Branch semantics and the condition-code calculus.
//!
//! Every PC-writing path lives here: the two direct branch encodings, the
//! link variants, the exchange variants, and the two data instructions
//! (ADD high-register and MOV high-register) that branch when their
//! destination is PC. All of them flush decode and fetch in the same tick;
//! the flush flags take effect at the next decode/fetch tick.

use crate::common::constants::{bit_at, prev_thumb_inst};
use crate::common::error::Fault;
use crate::common::reg::{Reg, RegFile};
use crate::core::Processor;
use crate::core::execute::flush_pipeline;
use crate::isa::instruction::Condition;
use crate::stats::Mnemonic;

/// Evaluates a branch condition against a captured xPSR value.
///
/// The reserved codes never reach execute (decode re-routes them) but
/// remain fatal if they do.
pub fn check_condition(cond: Condition, xpsr: u32) -> Result<bool, Fault> {
    let n = RegFile::xpsr_n(xpsr);
    let z = RegFile::xpsr_z(xpsr);
    let c = RegFile::xpsr_c(xpsr);
    let v = RegFile::xpsr_v(xpsr);

    match cond {
        Condition::Eq => Ok(z == 0x1),
        Condition::Ne => Ok(z == 0x0),
        Condition::Cs => Ok(c == 0x1),
        Condition::Cc => Ok(c == 0x0),
        Condition::Mi => Ok(n == 0x1),
        Condition::Pl => Ok(n == 0x0),
        Condition::Vs => Ok(v == 0x1),
        Condition::Vc => Ok(v == 0x0),
        Condition::Hi => Ok(c == 0x1 && z == 0x0),
        Condition::Ls => Ok(c == 0x0 || z == 0x1),
        Condition::Ge => Ok(n == v),
        Condition::Lt => Ok(n != v),
        Condition::Gt => Ok(z == 0x0 && n == v),
        Condition::Le => Ok(z == 0x1 || n != v),
        Condition::U0 | Condition::U1 => Err(Fault::ReservedCondition(cond as u32)),
    }
}

/// B(1): conditional branch over an 8-bit halfword offset.
pub(crate) fn b1(
    p: &mut Processor,
    rm: Reg,
    drm: u32,
    im: u32,
    dxpsr: u32,
    cond: Condition,
) -> Result<(), Fault> {
    if !check_condition(cond, dxpsr)? {
        p.stats.branch_not_taken += 1;
    } else {
        p.stats.branch_taken += 1;

        let im = if bit_at(im, 7) == 0x0 {
            im
        } else {
            im | ((!0u32) << 7)
        };
        let res = (im << 1).wrapping_add(drm);

        p.regs.write(rm, res);
        flush_pipeline(p);
    }

    p.stats.record(Mnemonic::B);
    Ok(())
}

/// B(2): unconditional branch over an 11-bit halfword offset.
pub(crate) fn b2(p: &mut Processor, rm: Reg, drm: u32, im: u32) {
    let im = if bit_at(im, 10) == 0x0 {
        im
    } else {
        im | ((!0u32) << 10)
    };
    let res = (im << 1).wrapping_add(drm);

    p.regs.write(rm, res);
    flush_pipeline(p);

    p.stats.branch_taken += 1;
    p.stats.record(Mnemonic::B);
}

/// BL: branch with link over the immediate assembled across both
/// halfwords. The S bit sits at position 24 of the assembled value, so
/// sign extension tests exactly that bit.
///
/// The Cortex-M0 manual gives BL four cycles; here the first of them is
/// the extra decode stall of the second halfword, and the remaining three
/// are the execute tick plus the refill bubble, so the timing matches.
pub(crate) fn bl(p: &mut Processor, rdn: Reg, drdn: u32, im: u32) {
    let im = if bit_at(im, 24) == 0x0 {
        im
    } else {
        im | ((!0u32) << 24)
    };
    let res = im.wrapping_add(drdn);

    p.regs.write(Reg::Lr, drdn | 0x1);
    p.regs.write(rdn, res);
    flush_pipeline(p);

    p.stats.record(Mnemonic::Bl);
    p.stats.branch_taken += 1;
}

/// BLX (register): branch with link and exchange. Only Thumb targets are
/// representable; an ARM target is fatal.
pub(crate) fn blx(p: &mut Processor, rdn: Reg, drdn: u32, drm: u32) -> Result<(), Fault> {
    if (drm & 0x1) != 0x1 {
        return Err(Fault::ArmModeBranch {
            mnemonic: "blx",
            target: drm,
        });
    }

    p.regs.write(rdn, drm & !0x1);
    p.regs.write(Reg::Lr, prev_thumb_inst(drdn) | 0x1);
    flush_pipeline(p);

    p.stats.record(Mnemonic::Blx);
    p.stats.branch_taken += 1;
    Ok(())
}

/// BX: branch and exchange. Only Thumb targets are representable.
pub(crate) fn bx(p: &mut Processor, rdn: Reg, drm: u32) -> Result<(), Fault> {
    if (drm & 0x1) != 0x1 {
        return Err(Fault::ArmModeBranch {
            mnemonic: "bx",
            target: drm,
        });
    }

    p.regs.write(rdn, drm & !0x1);
    flush_pipeline(p);

    p.stats.record(Mnemonic::Bx);
    p.stats.branch_taken += 1;
    Ok(())
}

/// ADD(4) (register, high): a plain add unless the destination is PC, in
/// which case it behaves as an always-taken branch. The target may not be
/// halfword-misaligned.
pub(crate) fn add4(p: &mut Processor, rdn: Reg, drdn: u32, drm: u32) -> Result<(), Fault> {
    let res = drdn.wrapping_add(drm);

    p.regs.write(rdn, res);

    if rdn == Reg::Pc {
        if bit_at(res, 0) != 0x0 {
            return Err(Fault::UnalignedBranchTarget(res));
        }

        flush_pipeline(p);
        p.stats.branch_taken += 1;
        p.stats.record(Mnemonic::B);
    } else {
        p.stats.record(Mnemonic::Add);
    }

    Ok(())
}

/// CPY / MOV (register, high): a plain move unless the destination is PC.
/// Compilers emit `mov pc, rx` with the Thumb bit set in `rx`, so the PC
/// form carries BX semantics including the bit-0 requirement.
pub(crate) fn cpy(p: &mut Processor, rd: Reg, drm: u32) -> Result<(), Fault> {
    if rd == Reg::Pc {
        return bx(p, rd, drm);
    }

    p.regs.write(rd, drm);
    p.stats.record(Mnemonic::Mov);
    Ok(())
}
