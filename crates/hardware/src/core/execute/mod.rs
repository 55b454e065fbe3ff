//! Execute stage: ISA semantics driven by a ten-state machine.
//!
//! Most instructions execute inline in the `NextInst` state. Memory
//! instructions transition into a multi-cycle sub-machine that places and
//! retrieves requests one word per tick. Branches and other PC writes
//! flush decode and fetch; a load that targets PC (POP/LDMIA with PC in
//! the list) defers its flush through the `FlushPipeline` state so the
//! one-cycle bubble of the original core is preserved.

/// Arithmetic, logic, shift, and move bodies plus the flag calculus.
pub mod alu;
/// Branch bodies and the condition-code calculus.
pub mod branch;
/// Load/store bodies and the memory sub-machine.
pub mod lsu;

use std::collections::VecDeque;

use crate::common::error::Fault;
use crate::common::reg::{Reg, RegFile};
use crate::core::{Halt, Processor};
use crate::isa::disasm::disassemble;
use crate::isa::instruction::{Op, Slot};
use lsu::{MemAccess, MultiStoreKind};

/// States of the execute unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecState {
    #[default]
    NextInst,
    LoadMemReq,
    LoadMemResp,
    StoreMemReq,
    StoreMemResp,
    MultipleLoadFirstMemReq,
    MultipleLoadMemReq,
    MultipleStoreFirstMemReq,
    MultipleStoreMemReq,
    FlushPipeline,
}

impl ExecState {
    /// Reports whether this state belongs to the memory sub-machine.
    pub fn is_memory(self) -> bool {
        !matches!(self, ExecState::NextInst | ExecState::FlushPipeline)
    }

    /// Returns the display name of this state.
    pub fn name(self) -> &'static str {
        match self {
            ExecState::NextInst => "NEXT_INST",
            ExecState::LoadMemReq => "LOAD_MEM_REQ",
            ExecState::LoadMemResp => "LOAD_MEM_RESP",
            ExecState::StoreMemReq => "STORE_MEM_REQ",
            ExecState::StoreMemResp => "STORE_MEM_RESP",
            ExecState::MultipleLoadFirstMemReq => "MULTIPLE_LOAD_FIRST_MEM_REQ",
            ExecState::MultipleLoadMemReq => "MULTIPLE_LOAD_MEM_REQ",
            ExecState::MultipleStoreFirstMemReq => "MULTIPLE_STORE_FIRST_MEM_REQ",
            ExecState::MultipleStoreMemReq => "MULTIPLE_STORE_MEM_REQ",
            ExecState::FlushPipeline => "FLUSH_PIPELINE",
        }
    }
}

/// Temporaries of an in-flight single load.
#[derive(Debug)]
pub(crate) struct LoadTmps {
    pub ptr: u32,
    pub byte_offset: u32,
    pub kind: MemAccess,
    pub dest: Reg,
    pub token: u32,
}

impl Default for LoadTmps {
    fn default() -> Self {
        Self {
            ptr: 0,
            byte_offset: 0,
            kind: MemAccess::Word,
            dest: Reg::Rnone,
            token: 0,
        }
    }
}

/// Temporaries of an in-flight single store.
#[derive(Debug)]
pub(crate) struct StoreTmps {
    pub ptr: u32,
    pub byte_offset: u32,
    pub kind: MemAccess,
    pub data: u32,
    pub token: u32,
}

impl Default for StoreTmps {
    fn default() -> Self {
        Self {
            ptr: 0,
            byte_offset: 0,
            kind: MemAccess::Word,
            data: 0,
            token: 0,
        }
    }
}

/// Temporaries of an in-flight multiple load.
#[derive(Debug)]
pub(crate) struct MultiLoadTmps {
    pub ptr: u32,
    pub byte_offset: u32,
    pub regs: VecDeque<Reg>,
    pub token: u32,
    pub base: Reg,
}

impl Default for MultiLoadTmps {
    fn default() -> Self {
        Self {
            ptr: 0,
            byte_offset: 0,
            regs: VecDeque::new(),
            token: 0,
            base: Reg::Rnone,
        }
    }
}

/// Temporaries of an in-flight multiple store.
#[derive(Debug)]
pub(crate) struct MultiStoreTmps {
    pub ptr: u32,
    pub byte_offset: u32,
    pub regs: VecDeque<Reg>,
    pub token: u32,
    pub base: Reg,
    pub kind: MultiStoreKind,
}

impl Default for MultiStoreTmps {
    fn default() -> Self {
        Self {
            ptr: 0,
            byte_offset: 0,
            regs: VecDeque::new(),
            token: 0,
            base: Reg::Rnone,
            kind: MultiStoreKind::Stmia,
        }
    }
}

/// State of the execute unit.
#[derive(Debug, Default)]
pub struct ExecuteUnit {
    state: ExecState,
    pub(crate) load: LoadTmps,
    pub(crate) store: StoreTmps,
    pub(crate) mload: MultiLoadTmps,
    pub(crate) mstore: MultiStoreTmps,
}

impl ExecuteUnit {
    /// Creates an idle execute unit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    pub fn state(&self) -> ExecState {
        self.state
    }

    /// Reports whether the pipeline is stalled behind execute.
    ///
    /// Fetch consults this to avoid prefetching lines that a multi-cycle
    /// instruction would only discard.
    pub fn is_stalled(&self) -> bool {
        self.state != ExecState::NextInst
    }
}

/// Flushes the upstream pipeline stages; the flags take effect at the
/// next decode/fetch tick.
pub(crate) fn flush_pipeline(p: &mut Processor) {
    p.decode.flush();
    p.fetch.flush();
}

/// Runs one execute cycle.
pub fn execute_stage(p: &mut Processor) -> Result<(), Fault> {
    let entry = p.execute.state;

    match entry {
        ExecState::NextInst => next_inst(p)?,
        ExecState::LoadMemReq => lsu::load_mem_req(p)?,
        ExecState::LoadMemResp => lsu::load_mem_resp(p)?,
        ExecState::StoreMemReq => lsu::store_mem_req(p)?,
        ExecState::StoreMemResp => lsu::store_mem_resp(p)?,
        ExecState::MultipleLoadFirstMemReq => lsu::multiple_load_first_mem_req(p)?,
        ExecState::MultipleLoadMemReq => lsu::multiple_load_mem_req(p)?,
        ExecState::MultipleStoreFirstMemReq => lsu::multiple_store_first_mem_req(p)?,
        ExecState::MultipleStoreMemReq => lsu::multiple_store_mem_req(p)?,
        ExecState::FlushPipeline => {
            flush_pipeline(p);
            p.execute.state = ExecState::NextInst;
        }
    }

    count_execute_cycles(p, entry);

    if p.trace {
        eprintln!(
            "Execute: {} -> {}",
            entry.name(),
            p.execute.state.name()
        );
    }

    Ok(())
}

/// Counts an execute-memory cycle for every tick spent in the memory
/// sub-machine, including the dispatch tick that enters it. The flush
/// bubble uses neither memory nor the register file and never counts.
fn count_execute_cycles(p: &mut Processor, entry: ExecState) {
    if entry.is_memory() || (entry == ExecState::NextInst && p.execute.state.is_memory()) {
        p.stats.execute_mem_cycles += 1;
    }
}

/// Pulls the next decoded record and dispatches on its operation.
fn next_inst(p: &mut Processor) -> Result<(), Fault> {
    let Some(inst) = p.decode.take_next() else {
        // No decoded instruction: the pipeline is stalled on decode.
        if p.trace {
            eprintln!("Execute: stalled, pending decode");
        }
        p.stats.stalled_for_decode_cycles += 1;
        return Ok(());
    };

    if p.trace {
        eprintln!("Execute: {}", disassemble(&inst));
    }

    let rd = inst.register(Slot::Rd);
    let rdn = inst.register(Slot::Rdn);
    let rt = inst.register(Slot::Rt);
    let rm = inst.register(Slot::Rm);
    let rn = inst.register(Slot::Rn);

    let drt = inst.value(Slot::Rt);
    let drdn = inst.value(Slot::Rdn);
    let drm = inst.value(Slot::Rm);
    let drn = inst.value(Slot::Rn);
    let dxpsr = inst.value(Slot::Xpsr);

    let rl = inst.reg_list();
    let im = inst.imm();
    let cond = inst.condition();
    let cflag = RegFile::xpsr_c(dxpsr);

    match inst.op() {
        // Multiple memory access.
        Op::Pop | Op::Ldmia => lsu::pop_ldmia(p, rn, drn, rl)?,
        Op::Push => lsu::push(p, rn, drn, rl)?,
        Op::Stmia => lsu::stmia(p, rn, drn, rl)?,

        // Single memory access.
        Op::Str1 | Op::Str3 => lsu::str1_str3(p, drt, drn, im)?,
        Op::Str2 => lsu::str2(p, drt, drn, drm)?,
        Op::Strb1 => lsu::strb1(p, drt, drn, im)?,
        Op::Strb2 => lsu::strb2(p, drt, drn, drm)?,
        Op::Strh1 => lsu::strh1(p, drt, drn, im)?,
        Op::Strh2 => lsu::strh2(p, drt, drn, drm)?,
        Op::Ldr1 | Op::Ldr4 => lsu::ldr1_ldr4(p, rt, drn, im)?,
        Op::Ldr2 => lsu::ldr2(p, rt, drn, drm)?,
        Op::Ldr3 => lsu::ldr3(p, rt, drn, im)?,
        Op::Ldrb1 => lsu::ldrb1(p, rt, drn, im)?,
        Op::Ldrb2 => lsu::ldrb2(p, rt, drn, drm)?,
        Op::Ldrh1 => lsu::ldrh1(p, rt, drn, im)?,
        Op::Ldrh2 => lsu::ldrh2(p, rt, drn, drm)?,
        Op::Ldrsb => lsu::ldrsb(p, rt, drn, drm)?,
        Op::Ldrsh => lsu::ldrsh(p, rt, drn, drm)?,

        // Branches.
        Op::B1 => branch::b1(p, rm, drm, im, dxpsr, cond)?,
        Op::B2 => branch::b2(p, rm, drm, im),
        Op::Bl => branch::bl(p, rdn, drdn, im),
        Op::Blx => branch::blx(p, rdn, drdn, drm)?,
        Op::Bx => branch::bx(p, rdn, drm)?,
        Op::Cpy => branch::cpy(p, rd, drm)?,
        Op::Add4 => branch::add4(p, rdn, drdn, drm)?,

        // Arithmetic and logic.
        Op::Adc => alu::adc(p, rdn, drdn, drm, cflag),
        Op::Add1 => alu::add1(p, rd, drn, im),
        Op::Add2 => alu::add2(p, rdn, drdn, im),
        Op::Add3 => alu::add3(p, rd, drn, drm),
        Op::Add5 => alu::add5(p, rd, drm, im),
        Op::Add6 | Op::Add7 => alu::add6_add7(p, rd, drm, im),
        Op::And => alu::and(p, rdn, drdn, drm),
        Op::Asr1 => alu::asr1(p, rd, drm, im),
        Op::Asr2 => alu::asr2(p, rdn, drdn, drm),
        Op::Bic => alu::bic(p, rdn, drdn, drm),
        Op::Cmn => alu::cmn(p, drn, drm),
        Op::Cmp1 => alu::cmp1(p, drn, im),
        Op::Cmp2 | Op::Cmp3 => alu::cmp2_cmp3(p, drn, drm),
        Op::Eor => alu::eor(p, rdn, drdn, drm),
        Op::Lsl1 => alu::lsl1(p, rd, drm, im),
        Op::Lsl2 => alu::lsl2(p, rdn, drdn, drm),
        Op::Lsr1 => alu::lsr1(p, rd, drm, im),
        Op::Lsr2 => alu::lsr2(p, rdn, drdn, drm),
        Op::Mov1 => alu::mov1(p, rd, im),
        Op::Mov2 => alu::mov2(p, rd, drm),
        Op::Mul => alu::mul(p, rdn, drdn, drn),
        Op::Mvn => alu::mvn(p, rd, drm),
        Op::Neg => alu::neg(p, rd, drn, im),
        Op::Nop => alu::nop(p),
        Op::Orr => alu::orr(p, rdn, drdn, drm),
        Op::Rev => alu::rev(p, rd, drm),
        Op::Rev16 => alu::rev16(p, rd, drm),
        Op::Revsh => alu::revsh(p, rd, drm),
        Op::Ror => alu::ror(p, rdn, drdn, drm),
        Op::Sbc => alu::sbc(p, rdn, drdn, drm, cflag),
        Op::Sub1 => alu::sub1(p, rd, drn, im),
        Op::Sub2 => alu::sub2(p, rdn, drdn, im),
        Op::Sub3 => alu::sub3(p, rd, drn, drm),
        Op::Sub4 => alu::sub4(p, rdn, drdn, im),
        Op::Tst => alu::tst(p, drm, drn),
        Op::Sxtb => alu::sxtb(p, rd, drm),
        Op::Sxth => alu::sxth(p, rd, drm),
        Op::Uxtb => alu::uxtb(p, rd, drm),
        Op::Uxth => alu::uxth(p, rd, drm),

        // Program termination and console output.
        Op::Bkpt => p.halt = Some(Halt::Breakpoint(im)),
        Op::Svc => p.halt = Some(Halt::Supervisor(im)),
        Op::Cps => p.console.putc((drm & 0xFF) as u8),
    }

    Ok(())
}
