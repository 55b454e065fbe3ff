//! Statistics collection tests.

use thumb_core::stats::{InstClass, Mnemonic, Statistics};

#[test]
fn instruction_counts_accumulate() {
    let mut stats = Statistics::new();
    stats.record(Mnemonic::Add);
    stats.record(Mnemonic::Add);
    stats.record(Mnemonic::Ldr);

    assert_eq!(stats.count(Mnemonic::Add), 2);
    assert_eq!(stats.count(Mnemonic::Ldr), 1);
    assert_eq!(stats.count(Mnemonic::Mul), 0);
    assert_eq!(stats.total_instructions(), 3);
}

#[test]
fn mnemonics_classify_for_the_report() {
    assert_eq!(Mnemonic::B.class(), InstClass::Branch);
    assert_eq!(Mnemonic::Bl.class(), InstClass::Branch);
    assert_eq!(Mnemonic::Bx.class(), InstClass::Branch);
    assert_eq!(Mnemonic::Ldmia.class(), InstClass::Load);
    assert_eq!(Mnemonic::Ldrsh.class(), InstClass::Load);
    assert_eq!(Mnemonic::Push.class(), InstClass::Store);
    assert_eq!(Mnemonic::Strb.class(), InstClass::Store);
    assert_eq!(Mnemonic::Add.class(), InstClass::Other);
    assert_eq!(Mnemonic::Nop.class(), InstClass::Other);
}

#[test]
fn report_prints_without_counters() {
    // The report guards its divisions; an empty run must not panic.
    let stats = Statistics::new();
    stats.print();
}

#[test]
fn report_prints_with_counters() {
    let mut stats = Statistics::new();
    stats.cycles = 100;
    stats.fetch_mem_cycles = 40;
    stats.execute_mem_cycles = 10;
    stats.stalled_for_decode_cycles = 5;
    stats.branch_taken = 3;
    stats.branch_not_taken = 1;
    for _ in 0..4 {
        stats.record(Mnemonic::B);
    }
    stats.record(Mnemonic::Add);
    stats.print();
}
