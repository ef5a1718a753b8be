//! Machine-wide constants.

/// Number of general-purpose registers.
pub const NUM_GP_REGS: usize = 32;

/// Total number of registers, GPRs plus the special registers below.
pub const NUM_TOTAL_REGS: usize = 40;

/// User stack pointer.
pub const STACK_REG: usize = 29;
/// Holds the return address for procedure calls.
pub const RET_ADDR_REG: usize = 31;
/// Double register holding the result of multiply and divide.
pub const HI_REG: usize = 32;
pub const LO_REG: usize = 33;
/// Current program counter.
pub const PC_REG: usize = 34;
/// Next program counter, for the branch delay slot.
pub const NEXT_PC_REG: usize = 35;
/// Previous program counter, for debugging.
pub const PREV_PC_REG: usize = 36;
/// Target register of the delayed load in flight.
pub const LOAD_REG: usize = 37;
/// Value the delayed load will deposit.
pub const LOAD_VALUE_REG: usize = 38;
/// Faulting virtual address on an exception.
pub const BAD_VADDR_REG: usize = 39;

/// Width of one instruction; the PC pipeline advances by this much.
pub const INSTRUCTION_SIZE: u32 = 4;

/// Default page size, equal to one disk sector.
pub const DEFAULT_PAGE_SIZE: u32 = 128;

/// Default number of physical frames in main memory.
pub const DEFAULT_NUM_PHYS_PAGES: usize = 32;

/// Default size of each address space's backing store, in pages.
pub const DEFAULT_NUM_VIRTUAL_PAGES: usize = 64;

/// Default number of TLB slots.
pub const DEFAULT_TLB_SIZE: usize = 4;

/// Default seed for the inverted table's random victim generator.
pub const DEFAULT_RANDOM_SEED: u64 = 123_456_789;
