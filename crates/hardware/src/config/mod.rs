//! Machine configuration.
//!
//! A [`Config`] is a tree of plain serde structs. Every section carries
//! `#[serde(default)]`, so a JSON document only has to name the fields it
//! overrides:
//!
//! ```json
//! { "translation": { "mode": "Direct" }, "memory": { "num_phys_pages": 8 } }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::MachineError;
use crate::common::constants::{
    DEFAULT_NUM_PHYS_PAGES, DEFAULT_NUM_VIRTUAL_PAGES, DEFAULT_PAGE_SIZE, DEFAULT_RANDOM_SEED,
    DEFAULT_TLB_SIZE, INSTRUCTION_SIZE,
};

/// Top-level machine configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub memory: MemoryConfig,
    pub translation: TranslationConfig,
}

/// Debugging switches.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Drop into the debugger after every user instruction.
    pub single_step: bool,
    /// Log every translation at trace level.
    pub trace: bool,
}

/// Physical and virtual memory geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub page_size: u32,
    pub num_phys_pages: usize,
    /// Pages in each thread's backing store.
    pub num_virtual_pages: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            num_phys_pages: DEFAULT_NUM_PHYS_PAGES,
            num_virtual_pages: DEFAULT_NUM_VIRTUAL_PAGES,
        }
    }
}

impl MemoryConfig {
    /// Size of main memory in bytes.
    pub fn memory_size(&self) -> usize {
        self.page_size as usize * self.num_phys_pages
    }

    /// Size of one backing store in bytes.
    pub fn backing_size(&self) -> usize {
        self.page_size as usize * self.num_virtual_pages
    }
}

/// Which translation strategy the machine is built with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationMode {
    /// TLB in front of the inverted page table.
    #[default]
    Cached,
    /// Every reference goes straight to the inverted page table.
    Direct,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub mode: TranslationMode,
    pub tlb_size: usize,
    /// Seed for the inverted table's random victim selection.
    pub random_seed: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            mode: TranslationMode::Cached,
            tlb_size: DEFAULT_TLB_SIZE,
            random_seed: DEFAULT_RANDOM_SEED,
        }
    }
}

impl Config {
    /// Parses a JSON configuration and validates it.
    pub fn from_json_str(text: &str) -> Result<Self, MachineError> {
        let config: Config = serde_json::from_str(text)
            .map_err(|e| MachineError::InvalidConfig(format!("malformed JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MachineError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            MachineError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    /// Rejects geometry the machine cannot be built with.
    pub fn validate(&self) -> Result<(), MachineError> {
        let mem = &self.memory;
        let xl = &self.translation;

        if mem.page_size == 0 || !mem.page_size.is_power_of_two() {
            return Err(invalid(format!(
                "page_size must be a non-zero power of two, got {}",
                mem.page_size
            )));
        }
        // A word access must never straddle two frames.
        if mem.page_size < INSTRUCTION_SIZE {
            return Err(invalid(format!(
                "page_size must be at least {} bytes, got {}",
                INSTRUCTION_SIZE, mem.page_size
            )));
        }
        if mem.num_phys_pages == 0 {
            return Err(invalid("num_phys_pages must be at least 1".into()));
        }
        if mem.num_virtual_pages == 0 {
            return Err(invalid("num_virtual_pages must be at least 1".into()));
        }
        if u32::try_from(mem.memory_size()).is_err() || u32::try_from(mem.backing_size()).is_err()
        {
            return Err(invalid("memory does not fit a 32-bit address space".into()));
        }
        if xl.mode == TranslationMode::Cached {
            if xl.tlb_size == 0 {
                return Err(invalid("tlb_size must be at least 1".into()));
            }
            if xl.tlb_size > mem.num_phys_pages {
                return Err(invalid(format!(
                    "tlb_size ({}) exceeds num_phys_pages ({})",
                    xl.tlb_size, mem.num_phys_pages
                )));
            }
        }
        if xl.random_seed == 0 {
            return Err(invalid("random_seed must be non-zero".into()));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> MachineError {
    MachineError::InvalidConfig(msg)
}
