//! Shared definitions used across the machine.
//!
//! Address newtypes, machine-wide constants and the error/exception
//! taxonomy live here so that the register file, the MMU and the system
//! layer agree on a single vocabulary.

/// Virtual and physical address newtypes.
pub mod addr;

/// Machine-wide constants: register layout, default geometry.
pub mod constants;

/// Exception kinds, translation results and fatal machine errors.
pub mod error;

pub use self::addr::{PhysAddr, VirtAddr};
pub use self::error::{AccessType, ExceptionType, MachineError, PageOp, TranslationResult};
