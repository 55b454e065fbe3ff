//! Binary loading and reset tests.

use std::io::Write;
use tempfile::NamedTempFile;

use thumb_core::common::Fault;
use thumb_core::common::reg::Reg;
use thumb_core::core::Processor;
use thumb_core::sim::loader;

use crate::common::builder as asm;
use crate::common::harness::{ProgramBuilder, test_config};

/// Writes image bytes into a temporary file.
fn temp_binary(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn load_binary_round_trips_file_contents() {
    let data: Vec<u8> = (0..64u32).map(|i| (i * 3) as u8).collect();
    let file = temp_binary(&data);

    let loaded = loader::load_binary(file.path().to_str().unwrap()).expect("read");
    assert_eq!(loaded, data);
}

#[test]
fn load_binary_reports_missing_files() {
    match loader::load_binary("/nonexistent/program.bin") {
        Err(Fault::ImageRead { path, .. }) => assert_eq!(path, "/nonexistent/program.bin"),
        other => panic!("expected image-read fault, got {:?}", other),
    }
}

#[test]
fn reset_initializes_pc_and_active_sp() {
    let image = ProgramBuilder::new()
        .sp(0x0000_0200)
        .code(&[asm::bkpt(0)])
        .build();
    let file = temp_binary(&image);

    let mut p = Processor::new(&test_config());
    p.reset(file.path().to_str().unwrap()).expect("reset");

    // The Thumb bit is stripped from the entry PC; the SP seeds MSP
    // because CONTROL.S resets to zero.
    assert_eq!(p.regs.read(Reg::Pc), 0x8);
    assert_eq!(p.regs.read(Reg::Msp), 0x200);
    assert_eq!(p.regs.read(Reg::Psp), 0);
    assert_eq!(p.stats.program_size_bytes, image.len() as u32);
}

#[test]
fn arm_entry_address_is_rejected() {
    // Word 4 lacks the Thumb bit.
    let mut image = vec![0u8; 12];
    image[4..8].copy_from_slice(&0x0000_0008u32.to_le_bytes());

    let mut p = Processor::new(&test_config());
    match p.reset_from_image(&image) {
        Err(Fault::ArmResetVector(pc)) => assert_eq!(pc, 8),
        other => panic!("expected ARM reset-vector fault, got {:?}", other),
    }
}

#[test]
fn oversized_image_is_rejected_at_reset() {
    let mut config = test_config();
    config.memory.mem_size_words = 4;

    let mut p = Processor::new(&config);
    let image = vec![0u8; 64];
    assert!(matches!(
        p.reset_from_image(&image),
        Err(Fault::ImageTooLarge { .. })
    ));
}
