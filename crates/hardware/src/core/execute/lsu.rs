//! Load/store semantics and the multi-cycle memory sub-machine.
//!
//! Single loads and stores stage their temporaries and issue the first
//! request in the same tick the instruction dispatches; the response is
//! retrieved one tick later. Stores are word-granular at the memory, so a
//! sub-word store side-band reads the current word, merges the field, and
//! writes the whole word back.
//!
//! Multiple loads and stores (POP, LDMIA, PUSH, STMIA) walk their register
//! list one word per tick, overlapping each retrieval with the next issue.
//! The base register is written up front, before any transfer completes.

use std::collections::VecDeque;

use crate::common::constants::{
    BITS_PER_BYTE, BYTES_PER_WORD, bit_at, byte_index, word_address, words_to_bytes,
};
use crate::common::error::Fault;
use crate::common::reg::{CORE_REGS_COUNT, Reg};
use crate::core::Processor;
use crate::core::execute::ExecState;
use crate::mem::Issuer;
use crate::stats::Mnemonic;

/// Access width and signedness of a single memory instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemAccess {
    SByte,
    UByte,
    SHalfword,
    UHalfword,
    Word,
}

/// Multiple-store flavour: STMIA walks upward from the base, PUSH moves
/// the base down first and fills the freed space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MultiStoreKind {
    Stmia,
    Push,
}

/// Extracts and extends the addressed field of a loaded word.
pub fn format_for_load(kind: MemAccess, data: u32, offset: u32) -> u32 {
    let byte_off = byte_index(offset);

    match kind {
        MemAccess::SByte => {
            let shift = byte_off * BITS_PER_BYTE;
            let field = (data >> shift) & 0xFF;
            if bit_at(field, 7) == 0x1 {
                field | 0xFFFF_FF00
            } else {
                field
            }
        }
        MemAccess::UByte => {
            let shift = byte_off * BITS_PER_BYTE;
            (data >> shift) & 0xFF
        }
        MemAccess::SHalfword => {
            let shift = (byte_off & !0x1) * BITS_PER_BYTE;
            let field = (data >> shift) & 0xFFFF;
            if bit_at(field, 15) == 0x1 {
                field | 0xFFFF_0000
            } else {
                field
            }
        }
        MemAccess::UHalfword => {
            let shift = (byte_off & !0x1) * BITS_PER_BYTE;
            (data >> shift) & 0xFFFF
        }
        MemAccess::Word => data,
    }
}

/// Merges a store value into the current word at its addressed field.
pub fn format_for_store(kind: MemAccess, current: u32, value: u32, offset: u32) -> Result<u32, Fault> {
    let byte_off = byte_index(offset);

    match kind {
        MemAccess::SByte | MemAccess::SHalfword => Err(Fault::SignedStoreWidth),
        MemAccess::UByte => {
            let shift = byte_off * BITS_PER_BYTE;
            let mask = 0xFFu32;
            Ok((current & !(mask << shift)) | ((value & mask) << shift))
        }
        MemAccess::UHalfword => {
            let shift = (byte_off & !0x1) * BITS_PER_BYTE;
            let mask = 0xFFFFu32;
            Ok((current & !(mask << shift)) | ((value & mask) << shift))
        }
        MemAccess::Word => Ok(value),
    }
}

/// Expands a register-list bitmap into transfer order (lowest first).
fn populate_register_list(rl: u32) -> Result<VecDeque<Reg>, Fault> {
    let mut regs = VecDeque::new();
    for i in 0..CORE_REGS_COUNT {
        if bit_at(rl, i) == 0x1 {
            regs.push_back(Reg::from_index(i));
        }
    }

    if regs.is_empty() {
        return Err(Fault::EmptyRegisterList);
    }
    Ok(regs)
}

/// Stages a single load and issues its request.
fn ldr(p: &mut Processor, rt: Reg, drn: u32, offset: u32, kind: MemAccess) -> Result<(), Fault> {
    p.execute.load.ptr = word_address(drn);
    p.execute.load.byte_offset = byte_index(drn).wrapping_add(offset);
    p.execute.load.kind = kind;
    p.execute.load.dest = rt;

    load_mem_req(p)
}

pub(crate) fn ldr1_ldr4(p: &mut Processor, rt: Reg, drn: u32, im: u32) -> Result<(), Fault> {
    ldr(p, rt, drn, im << 2, MemAccess::Word)?;
    p.stats.record(Mnemonic::Ldr);
    Ok(())
}

pub(crate) fn ldr2(p: &mut Processor, rt: Reg, drn: u32, drm: u32) -> Result<(), Fault> {
    ldr(p, rt, drn, drm, MemAccess::Word)?;
    p.stats.record(Mnemonic::Ldr);
    Ok(())
}

/// LDR(3) is PC-relative; the captured PC is word-aligned first.
pub(crate) fn ldr3(p: &mut Processor, rt: Reg, drn: u32, im: u32) -> Result<(), Fault> {
    ldr(p, rt, word_address(drn), im << 2, MemAccess::Word)?;
    p.stats.record(Mnemonic::Ldr);
    Ok(())
}

pub(crate) fn ldrb1(p: &mut Processor, rt: Reg, drn: u32, im: u32) -> Result<(), Fault> {
    ldr(p, rt, drn, im, MemAccess::UByte)?;
    p.stats.record(Mnemonic::Ldrb);
    Ok(())
}

pub(crate) fn ldrb2(p: &mut Processor, rt: Reg, drn: u32, drm: u32) -> Result<(), Fault> {
    ldr(p, rt, drn, drm, MemAccess::UByte)?;
    p.stats.record(Mnemonic::Ldrb);
    Ok(())
}

pub(crate) fn ldrh1(p: &mut Processor, rt: Reg, drn: u32, im: u32) -> Result<(), Fault> {
    ldr(p, rt, drn, im << 1, MemAccess::UHalfword)?;
    p.stats.record(Mnemonic::Ldrh);
    Ok(())
}

pub(crate) fn ldrh2(p: &mut Processor, rt: Reg, drn: u32, drm: u32) -> Result<(), Fault> {
    ldr(p, rt, drn, drm, MemAccess::UHalfword)?;
    p.stats.record(Mnemonic::Ldrh);
    Ok(())
}

pub(crate) fn ldrsb(p: &mut Processor, rt: Reg, drn: u32, drm: u32) -> Result<(), Fault> {
    ldr(p, rt, drn, drm, MemAccess::SByte)?;
    p.stats.record(Mnemonic::Ldrsb);
    Ok(())
}

pub(crate) fn ldrsh(p: &mut Processor, rt: Reg, drn: u32, drm: u32) -> Result<(), Fault> {
    ldr(p, rt, drn, drm, MemAccess::SHalfword)?;
    p.stats.record(Mnemonic::Ldrsh);
    Ok(())
}

/// Stages a single store and issues its request.
fn str(p: &mut Processor, drt: u32, drn: u32, offset: u32, kind: MemAccess) -> Result<(), Fault> {
    p.execute.store.ptr = word_address(drn);
    p.execute.store.byte_offset = byte_index(drn).wrapping_add(offset);
    p.execute.store.kind = kind;
    p.execute.store.data = drt;

    store_mem_req(p)
}

pub(crate) fn str1_str3(p: &mut Processor, drt: u32, drn: u32, im: u32) -> Result<(), Fault> {
    str(p, drt, drn, im << 2, MemAccess::Word)?;
    p.stats.record(Mnemonic::Str);
    Ok(())
}

pub(crate) fn str2(p: &mut Processor, drt: u32, drn: u32, drm: u32) -> Result<(), Fault> {
    str(p, drt, drn, drm, MemAccess::Word)?;
    p.stats.record(Mnemonic::Str);
    Ok(())
}

pub(crate) fn strb1(p: &mut Processor, drt: u32, drn: u32, im: u32) -> Result<(), Fault> {
    str(p, drt, drn, im, MemAccess::UByte)?;
    p.stats.record(Mnemonic::Strb);
    Ok(())
}

pub(crate) fn strb2(p: &mut Processor, drt: u32, drn: u32, drm: u32) -> Result<(), Fault> {
    str(p, drt, drn, drm, MemAccess::UByte)?;
    p.stats.record(Mnemonic::Strb);
    Ok(())
}

pub(crate) fn strh1(p: &mut Processor, drt: u32, drn: u32, im: u32) -> Result<(), Fault> {
    str(p, drt, drn, im << 1, MemAccess::UHalfword)?;
    p.stats.record(Mnemonic::Strh);
    Ok(())
}

pub(crate) fn strh2(p: &mut Processor, drt: u32, drn: u32, drm: u32) -> Result<(), Fault> {
    str(p, drt, drn, drm, MemAccess::UHalfword)?;
    p.stats.record(Mnemonic::Strh);
    Ok(())
}

/// POP and LDMIA: same transfer, different base register.
pub(crate) fn pop_ldmia(p: &mut Processor, rn: Reg, drn: u32, rl: u32) -> Result<(), Fault> {
    p.execute.mload.base = rn;
    p.execute.mload.ptr = drn;
    p.execute.mload.byte_offset = 0;
    p.execute.mload.regs = populate_register_list(rl)?;

    multiple_load_first_mem_req(p)?;
    p.stats.record(Mnemonic::Ldmia);
    Ok(())
}

pub(crate) fn stmia(p: &mut Processor, rn: Reg, drn: u32, rl: u32) -> Result<(), Fault> {
    p.execute.mstore.base = rn;
    p.execute.mstore.ptr = drn;
    p.execute.mstore.byte_offset = 0;
    p.execute.mstore.kind = MultiStoreKind::Stmia;
    p.execute.mstore.regs = populate_register_list(rl)?;

    multiple_store_first_mem_req(p)?;
    p.stats.record(Mnemonic::Stmia);
    Ok(())
}

pub(crate) fn push(p: &mut Processor, rn: Reg, drn: u32, rl: u32) -> Result<(), Fault> {
    p.execute.mstore.base = rn;
    p.execute.mstore.ptr = drn;
    p.execute.mstore.byte_offset = 0;
    p.execute.mstore.kind = MultiStoreKind::Push;
    p.execute.mstore.regs = populate_register_list(rl)?;

    multiple_store_first_mem_req(p)?;
    p.stats.record(Mnemonic::Push);
    Ok(())
}

/// Issues the staged single load.
pub(crate) fn load_mem_req(p: &mut Processor) -> Result<(), Fault> {
    if !p.mem.is_available() {
        return Err(Fault::MemoryBusy);
    }

    let byte_addr = p.execute.load.ptr.wrapping_add(p.execute.load.byte_offset);
    let Some(token) = p.mem.request_load(Issuer::Execute, byte_addr) else {
        return Err(Fault::MemoryBusy);
    };
    p.execute.load.token = token;

    p.execute.state = ExecState::LoadMemResp;
    Ok(())
}

/// Retrieves the single-load response and writes the destination.
pub(crate) fn load_mem_resp(p: &mut Processor) -> Result<(), Fault> {
    let Some(data) = p.mem.retrieve_load(p.execute.load.token) else {
        return Err(Fault::ResponseNotReady {
            token: p.execute.load.token,
        });
    };

    let data = format_for_load(p.execute.load.kind, data, p.execute.load.byte_offset);

    if p.execute.load.dest == Reg::Pc {
        return Err(Fault::LoadIntoPc);
    }

    p.regs.write(p.execute.load.dest, data);
    p.execute.state = ExecState::NextInst;
    Ok(())
}

/// Side-band reads the target word, merges the store field, and issues.
pub(crate) fn store_mem_req(p: &mut Processor) -> Result<(), Fault> {
    if !p.mem.is_available() {
        return Err(Fault::MemoryBusy);
    }

    let byte_addr = p.execute.store.ptr.wrapping_add(p.execute.store.byte_offset);
    let current = p.mem.load_word(byte_addr)?;
    let merged = format_for_store(
        p.execute.store.kind,
        current,
        p.execute.store.data,
        p.execute.store.byte_offset,
    )?;

    let Some(token) = p.mem.request_store(Issuer::Execute, byte_addr, merged) else {
        return Err(Fault::MemoryBusy);
    };
    p.execute.store.token = token;

    p.execute.state = ExecState::StoreMemResp;
    Ok(())
}

/// Confirms the single-store response.
pub(crate) fn store_mem_resp(p: &mut Processor) -> Result<(), Fault> {
    if !p.mem.retrieve_store(p.execute.store.token) {
        return Err(Fault::ResponseNotReady {
            token: p.execute.store.token,
        });
    }

    p.execute.state = ExecState::NextInst;
    Ok(())
}

/// First step of POP/LDMIA: write back the advanced base register and
/// issue the first load.
pub(crate) fn multiple_load_first_mem_req(p: &mut Processor) -> Result<(), Fault> {
    if !p.mem.is_available() {
        return Err(Fault::MemoryBusy);
    }

    let list_bytes = words_to_bytes(p.execute.mload.regs.len() as u32);
    let byte_addr = p.execute.mload.ptr.wrapping_add(p.execute.mload.byte_offset);

    // The base moves to one element past the transferred block before any
    // word arrives.
    let new_base = p
        .execute
        .mload
        .ptr
        .wrapping_add(p.execute.mload.byte_offset)
        .wrapping_add(list_bytes);
    p.regs.write(p.execute.mload.base, new_base);

    let Some(token) = p.mem.request_load(Issuer::Execute, byte_addr) else {
        return Err(Fault::MemoryBusy);
    };
    p.execute.mload.token = token;
    p.execute.mload.byte_offset = p.execute.mload.byte_offset.wrapping_add(BYTES_PER_WORD);

    p.execute.state = ExecState::MultipleLoadMemReq;
    Ok(())
}

/// Steady state of POP/LDMIA: retrieve the previous word, write its
/// destination, and issue the next load while words remain.
pub(crate) fn multiple_load_mem_req(p: &mut Processor) -> Result<(), Fault> {
    let byte_addr = p.execute.mload.ptr.wrapping_add(p.execute.mload.byte_offset);

    let Some(data) = p.mem.retrieve_load(p.execute.mload.token) else {
        return Err(Fault::ResponseNotReady {
            token: p.execute.mload.token,
        });
    };

    let Some(dest) = p.execute.mload.regs.pop_front() else {
        return Err(Fault::EmptyRegisterList);
    };

    if dest == Reg::Pc {
        p.regs.write(dest, data & !0x1);
        p.execute.state = ExecState::FlushPipeline;
        p.stats.branch_taken += 1;

        if !p.execute.mload.regs.is_empty() {
            return Err(Fault::PcNotLastInList);
        }
        return Ok(());
    }

    p.regs.write(dest, data);

    if !p.execute.mload.regs.is_empty() {
        if !p.mem.is_available() {
            return Err(Fault::MemoryBusy);
        }
        let Some(token) = p.mem.request_load(Issuer::Execute, byte_addr) else {
            return Err(Fault::MemoryBusy);
        };
        p.execute.mload.token = token;
        p.execute.mload.byte_offset = p.execute.mload.byte_offset.wrapping_add(BYTES_PER_WORD);
    } else {
        // The final load still needs this retrieval cycle before the next
        // instruction can dispatch.
        p.execute.state = ExecState::NextInst;
    }

    Ok(())
}

/// First step of PUSH/STMIA: write back the new base register and issue
/// the first store.
pub(crate) fn multiple_store_first_mem_req(p: &mut Processor) -> Result<(), Fault> {
    if !p.mem.is_available() {
        return Err(Fault::MemoryBusy);
    }

    let list_bytes = words_to_bytes(p.execute.mstore.regs.len() as u32);

    // PUSH moves the base pointer down before storing anything; STMIA
    // stores upward and lands the base past the block.
    let end_offset = match p.execute.mstore.kind {
        MultiStoreKind::Stmia => p.execute.mstore.byte_offset.wrapping_add(list_bytes),
        MultiStoreKind::Push => {
            let end = p.execute.mstore.byte_offset.wrapping_sub(list_bytes);
            p.execute.mstore.byte_offset = end;
            end
        }
    };

    let new_base = p.execute.mstore.ptr.wrapping_add(end_offset);
    p.regs.write(p.execute.mstore.base, new_base);

    request_next_store(p)?;

    p.execute.state = ExecState::MultipleStoreMemReq;
    Ok(())
}

/// Steady state of PUSH/STMIA: confirm the previous store and issue the
/// next while registers remain.
pub(crate) fn multiple_store_mem_req(p: &mut Processor) -> Result<(), Fault> {
    if !p.mem.retrieve_store(p.execute.mstore.token) {
        return Err(Fault::ResponseNotReady {
            token: p.execute.mstore.token,
        });
    }

    if !p.execute.mstore.regs.is_empty() {
        if !p.mem.is_available() {
            return Err(Fault::MemoryBusy);
        }
        request_next_store(p)?;
    } else {
        p.execute.state = ExecState::NextInst;
    }

    Ok(())
}

/// Pops the next source register, reads it live, and issues its store.
fn request_next_store(p: &mut Processor) -> Result<(), Fault> {
    let byte_addr = p.execute.mstore.ptr.wrapping_add(p.execute.mstore.byte_offset);

    let Some(src) = p.execute.mstore.regs.pop_front() else {
        return Err(Fault::EmptyRegisterList);
    };
    let data = p.regs.read(src);

    let Some(token) = p.mem.request_store(Issuer::Execute, byte_addr, data) else {
        return Err(Fault::MemoryBusy);
    };
    p.execute.mstore.token = token;
    p.execute.mstore.byte_offset = p.execute.mstore.byte_offset.wrapping_add(BYTES_PER_WORD);

    Ok(())
}
