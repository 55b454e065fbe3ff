//! Simulator configuration.
//!
//! This module defines the configuration structures that parameterize the
//! simulator:
//! 1. **Defaults:** Baseline platform constants (memory geometry, request
//!    pipeline depth).
//! 2. **Structures:** Hierarchical config for general settings and memory.
//!
//! `Config::default()` is the platform configuration; the CLI overrides
//! individual fields from flags, and tests may deserialize from JSON.

use serde::Deserialize;

/// Default configuration constants for the simulator.
mod defaults {
    /// Memory size in 32-bit words (128 KiB).
    pub const MEM_SIZE_WORDS: u32 = 32 * 1024;

    /// Wide memory access width in words.
    ///
    /// Fetch caches `2 × MEM_ACCESS_WIDTH_WORDS` halfwords per fill.
    pub const MEM_ACCESS_WIDTH_WORDS: u32 = 2;

    /// Depth of the memory request pipeline.
    ///
    /// The ring carries one extra slot beyond this so served responses are
    /// not cleared before the issuer retrieves them.
    pub const MEM_PIPELINE_DEPTH: u32 = 2;
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use thumb_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.memory.mem_size_words, 32 * 1024);
/// assert_eq!(config.memory.access_width_words, 2);
/// assert!(!config.general.trace);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Memory geometry and latency settings.
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// General simulation settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
    /// Enable per-stage trace output (decoded disassembly, execute state
    /// transitions, fetch/memory activity) to stderr.
    #[serde(default)]
    pub trace: bool,
}

/// Memory geometry and request pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Memory size in 32-bit words (rounded up to a multiple of the access
    /// width at construction).
    #[serde(default = "MemoryConfig::default_mem_size")]
    pub mem_size_words: u32,

    /// Wide memory access width in words.
    #[serde(default = "MemoryConfig::default_access_width")]
    pub access_width_words: u32,

    /// Request pipeline depth.
    #[serde(default = "MemoryConfig::default_pipeline_depth")]
    pub pipeline_depth: u32,
}

impl MemoryConfig {
    /// Returns the default memory size in words.
    fn default_mem_size() -> u32 {
        defaults::MEM_SIZE_WORDS
    }

    /// Returns the default wide access width in words.
    fn default_access_width() -> u32 {
        defaults::MEM_ACCESS_WIDTH_WORDS
    }

    /// Returns the default request pipeline depth.
    fn default_pipeline_depth() -> u32 {
        defaults::MEM_PIPELINE_DEPTH
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            mem_size_words: defaults::MEM_SIZE_WORDS,
            access_width_words: defaults::MEM_ACCESS_WIDTH_WORDS,
            pipeline_depth: defaults::MEM_PIPELINE_DEPTH,
        }
    }
}
