pub mod arch;
pub mod exception;
pub mod machine;
pub mod mmu;

pub use self::exception::ExceptionHandler;
pub use self::machine::Machine;
