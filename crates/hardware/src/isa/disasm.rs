//! Decoded-instruction disassembler.
//!
//! Converts a decoded record into a human-readable mnemonic string for
//! trace output and test diagnostics. The text reflects what the decoder
//! captured, not the raw encoding, so the active stack pointer and the
//! placeholder SVC show up as such.

use crate::common::reg::{CORE_REGS_COUNT, Reg};
use crate::isa::instruction::{DecodedInst, Op, Slot};

/// Formats a register-list bitmap as `{r0, r1, ...}`.
fn reg_list(list: u32) -> String {
    let mut out = String::from("{");
    let mut comma = false;
    for i in 0..CORE_REGS_COUNT {
        if (list >> i) & 0x1 == 0 {
            continue;
        }
        if comma {
            out.push_str(", ");
        }
        comma = true;
        out.push_str(Reg::from_index(i).name());
    }
    out.push('}');
    out
}

/// Disassembles a decoded instruction into assembler-like text.
pub fn disassemble(inst: &DecodedInst) -> String {
    let rd = inst.register(Slot::Rd).name();
    let rt = inst.register(Slot::Rt).name();
    let rdn = inst.register(Slot::Rdn).name();
    let rm = inst.register(Slot::Rm).name();
    let rn = inst.register(Slot::Rn).name();
    let im = inst.imm();

    match inst.op() {
        Op::Nop => "nop".to_string(),
        Op::Adc => format!("adcs {}, {}", rdn, rm),
        Op::Add1 => format!("adds {}, {}, #{}", rd, rn, im),
        Op::Add2 => format!("adds {}, #{}", rdn, im),
        Op::Add3 => format!("adds {}, {}, {}", rd, rn, rm),
        Op::Add4 => format!("add {}, {}", rdn, rm),
        Op::Add5 | Op::Add6 | Op::Add7 => format!("add {}, {}, #{}", rd, rm, im),
        Op::And => format!("ands {}, {}", rdn, rm),
        Op::Asr1 => format!("asrs {}, {}, #{}", rd, rm, im),
        Op::Asr2 => format!("asrs {}, {}", rdn, rm),
        Op::B1 => format!("b{} #{}", inst.condition().suffix(), im),
        Op::B2 => format!("b #{}", im),
        Op::Bic => format!("bics {}, {}", rdn, rm),
        Op::Bkpt => format!("bkpt {}", im),
        Op::Bl => format!("bl #{}", im),
        Op::Blx => format!("blx {}", rm),
        Op::Bx => format!("bx {}", rm),
        Op::Cmn => format!("cmn {}, {}", rn, rm),
        Op::Cmp1 => format!("cmp {}, #{}", rn, im),
        Op::Cmp2 | Op::Cmp3 => format!("cmp {}, {}", rn, rm),
        Op::Cps => "cps".to_string(),
        Op::Cpy => format!("cpy {}, {}", rd, rm),
        Op::Eor => format!("eors {}, {}", rdn, rm),
        Op::Ldmia => format!("ldmia {}!, {}", rn, reg_list(inst.reg_list())),
        Op::Ldr1 | Op::Ldr3 | Op::Ldr4 => format!("ldr {}, [{}, #{}]", rt, rn, im),
        Op::Ldr2 => format!("ldr {}, [{}, {}]", rt, rn, rm),
        Op::Ldrb1 => format!("ldrb {}, [{}, #{}]", rt, rn, im),
        Op::Ldrb2 => format!("ldrb {}, [{}, {}]", rt, rn, rm),
        Op::Ldrh1 => format!("ldrh {}, [{}, #{}]", rt, rn, im),
        Op::Ldrh2 => format!("ldrh {}, [{}, {}]", rt, rn, rm),
        Op::Ldrsb => format!("ldrsb {}, [{}, {}]", rt, rn, rm),
        Op::Ldrsh => format!("ldrsh {}, [{}, {}]", rt, rn, rm),
        Op::Lsl1 => format!("lsls {}, {}, #{}", rd, rm, im),
        Op::Lsl2 => format!("lsls {}, {}", rdn, rm),
        Op::Lsr1 => format!("lsrs {}, {}, #{}", rd, rm, im),
        Op::Lsr2 => format!("lsrs {}, {}", rdn, rm),
        Op::Mov1 => format!("movs {}, #{}", rd, im),
        Op::Mov2 => format!("movs {}, {}", rd, rm),
        Op::Mul => format!("muls {}, {}", rdn, rn),
        Op::Mvn => format!("mvns {}, {}", rd, rm),
        Op::Neg => format!("negs {}, {}", rd, rn),
        Op::Orr => format!("orrs {}, {}", rdn, rm),
        Op::Pop => format!("pop {}", reg_list(inst.reg_list())),
        Op::Push => format!("push {}", reg_list(inst.reg_list())),
        Op::Rev => format!("rev {}, {}", rd, rm),
        Op::Rev16 => format!("rev16 {}, {}", rd, rm),
        Op::Revsh => format!("revsh {}, {}", rd, rm),
        Op::Ror => format!("rors {}, {}", rdn, rm),
        Op::Sbc => format!("sbcs {}, {}", rdn, rm),
        Op::Stmia => format!("stmia {}!, {}", rn, reg_list(inst.reg_list())),
        Op::Str1 | Op::Str3 => format!("str {}, [{}, #{}]", rt, rn, im),
        Op::Str2 => format!("str {}, [{}, {}]", rt, rn, rm),
        Op::Strb1 => format!("strb {}, [{}, #{}]", rt, rn, im),
        Op::Strb2 => format!("strb {}, [{}, {}]", rt, rn, rm),
        Op::Strh1 => format!("strh {}, [{}, #{}]", rt, rn, im),
        Op::Strh2 => format!("strh {}, [{}, {}]", rt, rn, rm),
        Op::Sub1 => format!("subs {}, {}, #{}", rd, rn, im),
        Op::Sub2 => format!("subs {}, #{}", rdn, im),
        Op::Sub3 => format!("subs {}, {}, {}", rd, rn, rm),
        Op::Sub4 => format!("sub {}, #{}", rdn, im),
        Op::Svc => format!("svc {}", im),
        Op::Sxtb => format!("sxtb {}, {}", rd, rm),
        Op::Sxth => format!("sxth {}, {}", rd, rm),
        Op::Tst => format!("tst {}, {}", rn, rm),
        Op::Uxtb => format!("uxtb {}, {}", rd, rm),
        Op::Uxth => format!("uxth {}, {}", rd, rm),
    }
}
