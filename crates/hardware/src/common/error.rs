//! Exceptions and errors.
//!
//! Two disjoint families live here. [`ExceptionType`] tags conditions the
//! user program caused; they are forwarded to the kernel's exception
//! handler and never unwind Rust code. [`MachineError`] covers conditions
//! that end the simulated run: malformed configuration, backing store I/O
//! failures and executor bugs.

use std::{error, fmt, io};

use super::addr::PhysAddr;
use crate::system::ThreadId;

/// Kind of memory reference being translated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    Fetch,
    Read,
    Write,
}

impl AccessType {
    #[inline(always)]
    pub fn is_write(self) -> bool {
        self == AccessType::Write
    }
}

/// Cause of a trap into the kernel.
///
/// The dispatcher never branches on the kind; policy belongs to the
/// kernel's handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExceptionType {
    /// Sentinel; never raised.
    NoException,
    /// A program executed a system call.
    Syscall,
    /// No valid translation found.
    PageFault,
    /// Write attempted to a page marked read-only.
    ReadOnly,
    /// Translation resulted in an invalid physical address.
    BusError,
    /// Unaligned reference or one beyond the end of the address space.
    AddressError,
    /// Integer overflow in add or sub.
    Overflow,
    /// Unimplemented or reserved instruction.
    IllegalInstruction,
}

impl ExceptionType {
    /// Every kind, in cause-number order.
    pub const ALL: [ExceptionType; 8] = [
        ExceptionType::NoException,
        ExceptionType::Syscall,
        ExceptionType::PageFault,
        ExceptionType::ReadOnly,
        ExceptionType::BusError,
        ExceptionType::AddressError,
        ExceptionType::Overflow,
        ExceptionType::IllegalInstruction,
    ];

    /// Textual name used in debug output.
    pub fn name(self) -> &'static str {
        match self {
            ExceptionType::NoException => "no exception",
            ExceptionType::Syscall => "syscall",
            ExceptionType::PageFault => "page fault/no TLB entry",
            ExceptionType::ReadOnly => "page read only",
            ExceptionType::BusError => "bus error",
            ExceptionType::AddressError => "address error",
            ExceptionType::Overflow => "overflow",
            ExceptionType::IllegalInstruction => "illegal instruction",
        }
    }
}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of translating one virtual address.
///
/// Either a physical address or the exception the reference must raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranslationResult {
    pub paddr: PhysAddr,
    pub exception: Option<ExceptionType>,
}

impl TranslationResult {
    pub fn success(paddr: PhysAddr) -> Self {
        Self {
            paddr,
            exception: None,
        }
    }

    pub fn fault(exception: ExceptionType) -> Self {
        Self {
            paddr: PhysAddr(0),
            exception: Some(exception),
        }
    }

    #[inline(always)]
    pub fn is_ok(&self) -> bool {
        self.exception.is_none()
    }
}

/// Which half of a page replacement touched the backing store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageOp {
    PageIn,
    WriteBack,
}

impl fmt::Display for PageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageOp::PageIn => f.write_str("page-in"),
            PageOp::WriteBack => f.write_str("write-back"),
        }
    }
}

/// Fatal condition for the simulated run.
#[derive(Debug)]
pub enum MachineError {
    /// The configuration cannot describe a working machine.
    InvalidConfig(String),
    /// Translation was requested before any thread was scheduled.
    NoCurrentThread,
    /// No backing store is registered for this thread.
    UnknownThread(ThreadId),
    /// A backing store transfer failed.
    PageIo {
        tid: ThreadId,
        vpn: u32,
        op: PageOp,
        source: io::Error,
    },
    /// A physical access fell outside main memory.
    PhysicalBounds { paddr: PhysAddr, size: usize },
    /// The kernel's exception handler gave up on the run.
    Handler(String),
}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            MachineError::NoCurrentThread => f.write_str("no thread is currently running"),
            MachineError::UnknownThread(tid) => {
                write!(f, "no address space registered for thread {}", tid)
            }
            MachineError::PageIo {
                tid,
                vpn,
                op,
                source,
            } => write!(
                f,
                "{} of page {} for thread {} failed: {}",
                op, vpn, tid, source
            ),
            MachineError::PhysicalBounds { paddr, size } => {
                write!(f, "physical access of {} bytes at {} out of bounds", size, paddr)
            }
            MachineError::Handler(msg) => write!(f, "exception handler aborted: {}", msg),
        }
    }
}

impl error::Error for MachineError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            MachineError::PageIo { source, .. } => Some(source),
            _ => None,
        }
    }
}
