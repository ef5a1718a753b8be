//! Storage the translation core runs over.
//!
//! Main memory is the only storage a user program executes against; every
//! page not resident there lives in its owning thread's backing store,
//! found through the [`SpaceTable`].

pub mod backing;
pub mod memory;
pub mod spaces;

pub use self::backing::{BackingStore, FileDisk, VirtualDisk};
pub use self::memory::MainMemory;
pub use self::spaces::{SpaceTable, ThreadId};
