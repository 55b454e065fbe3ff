//! Global simulator constants and address arithmetic.
//!
//! This module defines system-wide constants used across the simulator:
//! 1. **Geometry constants:** Word, halfword, and byte sizes.
//! 2. **Address helpers:** Byte/word index extraction and alignment.
//! 3. **Reset vector layout:** Byte offsets of the initial SP and PC words.

/// Number of bytes in one memory word.
pub const BYTES_PER_WORD: u32 = 4;

/// Number of bits in one byte.
pub const BITS_PER_BYTE: u32 = 8;

/// Number of bits in one memory word.
pub const BITS_PER_WORD: u32 = BYTES_PER_WORD * BITS_PER_BYTE;

/// Number of bits in one halfword (one Thumb instruction).
pub const BITS_PER_HALFWORD: u32 = 16;

/// Size of a Thumb instruction in bytes.
pub const THUMB_INST_BYTES: u32 = 2;

/// Byte offset of the initial stack pointer in the reset vector table.
pub const RESET_VECTOR_SP_ADDRESS: u32 = 0x0000_0000;

/// Byte offset of the initial program counter in the reset vector table.
pub const RESET_VECTOR_PC_ADDRESS: u32 = 0x0000_0004;

/// Immediate carried by the synthetic SVC the decoder emits for
/// unpredictable or unrecognised encodings.
pub const PLACEHOLDER_SVC_IMM: u32 = 66;

/// Returns the byte offset of `addr` within its containing word.
#[inline]
pub fn byte_index(addr: u32) -> u32 {
    addr & (BYTES_PER_WORD - 1)
}

/// Returns `addr` rounded down to its containing word boundary.
#[inline]
pub fn word_address(addr: u32) -> u32 {
    addr & !(BYTES_PER_WORD - 1)
}

/// Returns the word index of the word containing byte address `addr`.
#[inline]
pub fn word_index(addr: u32) -> u32 {
    word_address(addr) >> 2
}

/// Returns bit `pos` of `val` as 0 or 1.
#[inline]
pub fn bit_at(val: u32, pos: u32) -> u32 {
    (val >> pos) & 0x1
}

/// Returns the address of the Thumb instruction following `addr`.
#[inline]
pub fn next_thumb_inst(addr: u32) -> u32 {
    addr.wrapping_add(THUMB_INST_BYTES)
}

/// Returns the address of the Thumb instruction preceding `addr`.
#[inline]
pub fn prev_thumb_inst(addr: u32) -> u32 {
    addr.wrapping_sub(THUMB_INST_BYTES)
}

/// Rounds `addr` down to a multiple of `align` (a power of two).
#[inline]
pub fn align_down(addr: u32, align: u32) -> u32 {
    addr & !(align - 1)
}

/// Converts a byte size to a word count, rounding up.
#[inline]
pub fn bytes_to_words(bytes: u32) -> u32 {
    bytes / BYTES_PER_WORD + u32::from(bytes % BYTES_PER_WORD != 0)
}

/// Converts a word count to a byte size.
#[inline]
pub fn words_to_bytes(words: u32) -> u32 {
    words * BYTES_PER_WORD
}
