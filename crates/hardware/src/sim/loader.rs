//! Program binary loading.
//!
//! Reads flat little-endian program images from disk. Image placement and
//! reset-vector interpretation live with [`crate::mem::Memory`] and
//! [`crate::core::Processor::reset_from_image`].

use std::fs;

use crate::common::error::Fault;

/// Reads a program binary from disk into a byte vector.
pub fn load_binary(path: &str) -> Result<Vec<u8>, Fault> {
    fs::read(path).map_err(|e| Fault::ImageRead {
        path: path.to_string(),
        reason: e.to_string(),
    })
}
