//! User-mode machine core for a teaching kernel.
//!
//! Emulates the register file of a user-mode processor, raises synchronous
//! traps into kernel code and translates user virtual addresses over a
//! fully simulated main memory, either through a TLB backed by a global
//! inverted page table or through the table alone. Pages that are not
//! resident are paged in on demand from per-thread backing stores.
//!
//! ```no_run
//! use vmachine::{Config, ExceptionType, Machine, MachineError, ThreadId, VirtualDisk};
//!
//! let config = Config::default();
//! let mut machine = Machine::new(&config)?;
//! let tid = ThreadId(1);
//! machine.register_thread(tid, Box::new(VirtualDisk::new(config.memory.backing_size())))?;
//! machine.switch_to(tid)?;
//!
//! let mut kernel = |_: &mut Machine, _: ExceptionType| -> Result<(), MachineError> { Ok(()) };
//! machine.write_mem(0x40, 4, 0xdead_beef, &mut kernel)?;
//! assert_eq!(machine.read_mem(0x40, 4, &mut kernel)?, Some(0xdead_beef));
//! # Ok::<(), vmachine::MachineError>(())
//! ```

pub mod common;
pub mod config;
pub mod core;
pub mod stats;
pub mod system;

pub use crate::common::{AccessType, ExceptionType, MachineError, TranslationResult};
pub use crate::config::{Config, TranslationMode};
pub use crate::core::arch::PrivilegeMode;
pub use crate::core::{ExceptionHandler, Machine};
pub use crate::stats::TranslationStats;
pub use crate::system::{BackingStore, FileDisk, ThreadId, VirtualDisk};
