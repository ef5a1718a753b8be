//! Architectural state: the register file and the privilege mode.

pub mod mode;
pub mod register_file;

pub use self::mode::PrivilegeMode;
pub use self::register_file::RegisterFile;
