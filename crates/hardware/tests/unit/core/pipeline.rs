//! Whole-pipeline scenarios: program output, branching, memory
//! round-trips, stall behaviour, and timing properties.

use thumb_core::common::Fault;
use thumb_core::common::reg::Reg;
use thumb_core::core::Halt;
use thumb_core::stats::Mnemonic;

use crate::common::builder as asm;
use crate::common::harness::{ProgramBuilder, boot, boot_code, run, run_to_halt};

#[test]
fn hello_world_via_cps() {
    let mut code = Vec::new();
    for &byte in b"hello world!\n" {
        code.push(asm::movs(0, u16::from(byte)));
        code.push(asm::cps());
    }
    code.push(asm::bkpt(0));

    let mut p = boot_code(&code);
    let halt = run_to_halt(&mut p);

    assert_eq!(halt, Halt::Breakpoint(0));
    assert_eq!(halt.code(), 0);
    assert_eq!(p.console.tx_log(), b"hello world!\n");
}

#[test]
fn bl_links_and_lands_on_target() {
    // BL occupies bytes 8 and 0xA; its captured PC is 0xC, so a +8
    // displacement lands at 0x14 with 0xD in the link register.
    let (hi, lo) = asm::bl(8);
    let mut p = boot_code(&[
        hi,
        lo,
        asm::nop(),
        asm::nop(),
        asm::nop(),
        asm::nop(),
        asm::bkpt(9),
    ]);
    let halt = run_to_halt(&mut p);

    assert_eq!(halt, Halt::Breakpoint(9));
    assert_eq!(p.regs.read(Reg::Lr), 0xD);
    assert_eq!(p.stats.count(Mnemonic::Bl), 1);
    assert_eq!(p.stats.branch_taken, 1);
}

#[test]
fn bl_branches_backwards() {
    // Layout: skip over a bkpt(1), then BL back to it.
    //   8: b +1        (to 0xC)
    //   A: bkpt 1      (BL target)
    //   C: bl -6       (captured pc 0x10, target 0xA)
    let (hi, lo) = asm::bl(-6);
    let mut p = boot_code(&[asm::b(0), asm::bkpt(1), hi, lo]);
    let halt = run_to_halt(&mut p);

    assert_eq!(halt, Halt::Breakpoint(1));
    assert_eq!(p.regs.read(Reg::Lr), 0x11);
}

#[test]
fn push_pop_round_trip_restores_registers_and_sp() {
    let mut p = boot_code(&[
        asm::movs(0, 1),
        asm::movs(1, 2),
        asm::movs(2, 3),
        asm::movs(3, 4),
        asm::push(0x0F, false),
        asm::movs(0, 0),
        asm::movs(1, 0),
        asm::movs(2, 0),
        asm::movs(3, 0),
        asm::pop(0x0F, false),
        asm::bkpt(0),
    ]);
    run_to_halt(&mut p);

    assert_eq!(p.regs.read(Reg::R0), 1);
    assert_eq!(p.regs.read(Reg::R1), 2);
    assert_eq!(p.regs.read(Reg::R2), 3);
    assert_eq!(p.regs.read(Reg::R3), 4);
    assert_eq!(p.regs.read(Reg::Msp), 0x400);
    assert_eq!(p.stats.count(Mnemonic::Push), 1);
    assert_eq!(p.stats.count(Mnemonic::Ldmia), 1);
}

#[test]
fn push_stores_below_the_stack_pointer() {
    let mut p = boot_code(&[
        asm::movs(0, 0xAA),
        asm::movs(1, 0xBB),
        asm::push(0x03, false),
        asm::bkpt(0),
    ]);
    run_to_halt(&mut p);

    assert_eq!(p.regs.read(Reg::Msp), 0x400 - 8);
    assert_eq!(p.mem.load_word(0x400 - 8).unwrap(), 0xAA);
    assert_eq!(p.mem.load_word(0x400 - 4).unwrap(), 0xBB);
}

#[test]
fn tight_loop_pays_the_flush_penalty() {
    // b #-2 branches to itself; each architectural iteration costs the
    // branch cycle plus the refill of the two-stage front end.
    let mut p = boot_code(&[asm::b(0x7FE)]);

    let mut guard = 0;
    while p.stats.branch_taken < 6 {
        p.tick().expect("fault in loop");
        guard += 1;
        assert!(guard < 1000, "loop failed to retire branches");
    }

    assert_eq!(p.stats.branch_taken, 6);
    assert!(
        p.stats.cycles >= 6 * (1 + 2),
        "flush cost unaccounted: {} cycles",
        p.stats.cycles
    );
    assert_eq!(p.stats.count(Mnemonic::B), 6);
}

#[test]
fn conditional_branch_taken_skips_the_shadow() {
    let mut p = boot_code(&[
        asm::movs(0, 0),
        asm::b_cond(0x0, 0), // beq to 0xE
        asm::movs(1, 7),     // skipped
        asm::bkpt(0),
    ]);
    run_to_halt(&mut p);

    assert_eq!(p.regs.read(Reg::R1), 0);
    assert_eq!(p.stats.branch_taken, 1);
    assert_eq!(p.stats.branch_not_taken, 0);
    assert_eq!(p.stats.count(Mnemonic::B), 1);
}

#[test]
fn conditional_branch_not_taken_falls_through() {
    let mut p = boot_code(&[
        asm::movs(0, 1),
        asm::b_cond(0x0, 0), // beq, Z clear
        asm::movs(1, 7),
        asm::bkpt(0),
    ]);
    run_to_halt(&mut p);

    assert_eq!(p.regs.read(Reg::R1), 7);
    assert_eq!(p.stats.branch_taken, 0);
    assert_eq!(p.stats.branch_not_taken, 1);
    assert_eq!(p.stats.count(Mnemonic::B), 1);
}

#[test]
fn bx_jumps_to_a_thumb_address() {
    let mut p = boot_code(&[
        asm::movs(0, 0x11), // 0x10 | thumb bit
        asm::bx(0),
        asm::nop(),
        asm::nop(),
        asm::bkpt(7),
    ]);
    let halt = run_to_halt(&mut p);

    assert_eq!(halt, Halt::Breakpoint(7));
    assert_eq!(p.stats.count(Mnemonic::Bx), 1);
    assert_eq!(p.stats.branch_taken, 1);
}

#[test]
fn blx_links_behind_the_call_site() {
    let mut p = boot_code(&[
        asm::movs(1, 0x11),
        asm::blx(1), // at 0xA: captured pc 0xE, so LR = 0xD
        asm::nop(),
        asm::nop(),
        asm::bkpt(3),
    ]);
    let halt = run_to_halt(&mut p);

    assert_eq!(halt, Halt::Breakpoint(3));
    assert_eq!(p.regs.read(Reg::Lr), 0xD);
    assert_eq!(p.stats.count(Mnemonic::Blx), 1);
}

#[test]
fn bx_to_arm_address_is_fatal() {
    let mut p = boot_code(&[asm::movs(0, 0x10), asm::bx(0)]);
    match run(&mut p, 1000) {
        Err(Fault::ArmModeBranch { mnemonic, target }) => {
            assert_eq!(mnemonic, "bx");
            assert_eq!(target, 0x10);
        }
        other => panic!("expected ARM-mode fault, got {:?}", other),
    }
}

#[test]
fn add_high_into_pc_branches() {
    let mut p = boot_code(&[
        asm::movs(0, 4),
        asm::add_hi(15, 0), // at 0xA: captured pc 0xE, target 0x12
        asm::nop(),
        asm::nop(),
        asm::nop(),
        asm::bkpt(1),
    ]);
    let halt = run_to_halt(&mut p);

    assert_eq!(halt, Halt::Breakpoint(1));
    assert_eq!(p.stats.branch_taken, 1);
    assert_eq!(p.stats.count(Mnemonic::B), 1);
}

#[test]
fn mov_high_into_pc_requires_the_thumb_bit() {
    let mut p = boot_code(&[
        asm::movs(0, 0x11),
        asm::mov_hi(15, 0), // mov pc, r0
        asm::nop(),
        asm::nop(),
        asm::bkpt(4),
    ]);
    let halt = run_to_halt(&mut p);

    assert_eq!(halt, Halt::Breakpoint(4));
    assert_eq!(p.stats.count(Mnemonic::Bx), 1);
}

#[test]
fn pop_into_pc_returns() {
    let mut p = boot_code(&[
        asm::movs(0, 0x11),
        asm::push(0x01, false),
        asm::pop(0, true), // pop {pc}
        asm::nop(),
        asm::bkpt(2),
    ]);
    let halt = run_to_halt(&mut p);

    assert_eq!(halt, Halt::Breakpoint(2));
    assert_eq!(p.stats.branch_taken, 1);
}

#[test]
fn stalled_decode_refreshes_captured_operands() {
    // The add is decoded while the load still owns the execute unit, so
    // its captured r0 is stale until the per-tick refresh replaces it
    // with the loaded value.
    let image = ProgramBuilder::new()
        .code(&[
            asm::movs(1, 0x40),
            asm::ldr_imm(0, 1, 0),
            asm::adds_imm8(0, 1),
            asm::bkpt(0),
        ])
        .word(0x40, 99)
        .build();
    let mut p = boot(&image);
    run_to_halt(&mut p);

    assert_eq!(p.regs.read(Reg::R0), 100);
}

#[test]
fn store_byte_merges_into_the_word() {
    let image = ProgramBuilder::new()
        .code(&[
            asm::movs(1, 0x40),
            asm::movs(0, 0xAA),
            asm::strb_imm(0, 1, 1),
            asm::ldr_imm(2, 1, 0),
            asm::bkpt(0),
        ])
        .word(0x40, 0x1122_3344)
        .build();
    let mut p = boot(&image);
    run_to_halt(&mut p);

    assert_eq!(p.regs.read(Reg::R2), 0x1122_AA44);
    assert_eq!(p.stats.count(Mnemonic::Strb), 1);
    assert_eq!(p.stats.count(Mnemonic::Ldr), 1);
}

#[test]
fn store_halfword_merges_into_the_word() {
    let image = ProgramBuilder::new()
        .code(&[
            asm::movs(1, 0x40),
            asm::movs(0, 0xAA),
            asm::strh_imm(0, 1, 1),
            asm::ldr_imm(2, 1, 0),
            asm::bkpt(0),
        ])
        .word(0x40, 0x1122_3344)
        .build();
    let mut p = boot(&image);
    run_to_halt(&mut p);

    assert_eq!(p.regs.read(Reg::R2), 0x00AA_3344);
}

#[test]
fn sub_word_loads_extract_and_extend() {
    let image = ProgramBuilder::new()
        .code(&[
            asm::movs(1, 0x40),
            asm::movs(3, 0),
            asm::ldrsb(2, 1, 3),
            asm::ldrsh(4, 1, 3),
            asm::ldrh_reg(5, 1, 3),
            asm::ldrb_reg(6, 1, 3),
            asm::ldrb_imm(7, 1, 2),
            asm::bkpt(0),
        ])
        .word(0x40, 0xFFEE_8081)
        .build();
    let mut p = boot(&image);
    run_to_halt(&mut p);

    assert_eq!(p.regs.read(Reg::R2), 0xFFFF_FF81);
    assert_eq!(p.regs.read(Reg::R4), 0xFFFF_8081);
    assert_eq!(p.regs.read(Reg::R5), 0x8081);
    assert_eq!(p.regs.read(Reg::R6), 0x81);
    assert_eq!(p.regs.read(Reg::R7), 0xEE);
    assert_eq!(p.stats.count(Mnemonic::Ldrsb), 1);
    assert_eq!(p.stats.count(Mnemonic::Ldrsh), 1);
}

#[test]
fn pc_relative_load_uses_the_aligned_corrected_pc() {
    // ldr r0, [pc, #1]: at byte 8 the captured PC is 0xC, so the load
    // targets 0x10.
    let image = ProgramBuilder::new()
        .code(&[0x4801, asm::bkpt(0)])
        .word(0x10, 0x5555_AAAA)
        .build();
    let mut p = boot(&image);
    run_to_halt(&mut p);

    assert_eq!(p.regs.read(Reg::R0), 0x5555_AAAA);
}

#[test]
fn stmia_ldmia_walk_the_base_register() {
    let mut p = boot_code(&[
        asm::movs(7, 0x40),
        asm::movs(0, 1),
        asm::movs(1, 2),
        asm::movs(2, 3),
        asm::stmia(7, 0x07),
        asm::movs(0, 0),
        asm::movs(1, 0),
        asm::movs(2, 0),
        asm::movs(7, 0x40),
        asm::ldmia(7, 0x07),
        asm::bkpt(0),
    ]);
    run_to_halt(&mut p);

    assert_eq!(p.regs.read(Reg::R0), 1);
    assert_eq!(p.regs.read(Reg::R1), 2);
    assert_eq!(p.regs.read(Reg::R2), 3);
    assert_eq!(p.regs.read(Reg::R7), 0x4C);
    assert_eq!(p.mem.load_word(0x40).unwrap(), 1);
    assert_eq!(p.mem.load_word(0x48).unwrap(), 3);
    assert_eq!(p.stats.count(Mnemonic::Stmia), 1);
    assert_eq!(p.stats.count(Mnemonic::Ldmia), 1);
}

#[test]
fn decode_ahead_of_a_dead_end_halts_via_the_placeholder() {
    // An empty-list POP is unpredictable; the decoder plants SVC 66 and
    // execution of it terminates the run, distinguishable from BKPT.
    let mut p = boot_code(&[asm::pop(0, false)]);
    let halt = run_to_halt(&mut p);

    assert_eq!(halt, Halt::Supervisor(66));
    assert_ne!(halt, Halt::Breakpoint(66));
}

#[test]
fn bl_with_a_mismatched_second_half_becomes_the_placeholder() {
    let (hi, _) = asm::bl(8);
    let mut p = boot_code(&[hi, asm::nop()]);
    let halt = run_to_halt(&mut p);

    assert_eq!(halt, Halt::Supervisor(66));
}

#[test]
fn svc_halts_with_its_immediate() {
    let mut p = boot_code(&[asm::svc(0x2A)]);
    let halt = run_to_halt(&mut p);
    assert_eq!(halt, Halt::Supervisor(0x2A));
    assert_eq!(halt.code(), 0x2A);
}

#[test]
fn sev_is_fatal_at_decode() {
    let mut p = boot_code(&[0xBF40]);
    match run(&mut p, 1000) {
        Err(Fault::UnsupportedInstruction(0xBF40)) => {}
        other => panic!("expected SEV fault, got {:?}", other),
    }
}

#[test]
fn single_load_spends_two_cycles_in_the_memory_machine() {
    let image = ProgramBuilder::new()
        .code(&[
            asm::movs(1, 0x40),
            asm::ldr_imm(0, 1, 0),
            asm::bkpt(0),
        ])
        .word(0x40, 42)
        .build();
    let mut p = boot(&image);
    run_to_halt(&mut p);

    assert_eq!(p.regs.read(Reg::R0), 42);
    assert_eq!(p.stats.execute_mem_cycles, 2);
    assert!(p.stats.fetch_mem_cycles >= 1);
    assert!(p.stats.stalled_for_decode_cycles >= 1);
}

#[test]
fn identical_runs_are_deterministic() {
    let code = [
        asm::movs(0, 1),
        asm::movs(1, 2),
        asm::push(0x03, false),
        asm::pop(0x03, false),
        asm::adds(2, 0, 1),
        asm::bkpt(0),
    ];

    let mut first = boot_code(&code);
    run_to_halt(&mut first);
    let mut second = boot_code(&code);
    run_to_halt(&mut second);

    assert_eq!(first.stats.cycles, second.stats.cycles);
    assert_eq!(
        first.stats.total_instructions(),
        second.stats.total_instructions()
    );
    assert_eq!(first.stats.execute_mem_cycles, second.stats.execute_mem_cycles);
    assert_eq!(first.stats.fetch_mem_cycles, second.stats.fetch_mem_cycles);
}

#[test]
fn nop_only_counts() {
    let mut p = boot_code(&[asm::nop(), asm::nop(), asm::bkpt(0)]);
    run_to_halt(&mut p);
    assert_eq!(p.stats.count(Mnemonic::Nop), 2);
    assert_eq!(p.stats.total_instructions(), 2);
}
