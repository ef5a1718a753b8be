//! Address types.
//!
//! Pages are not a fixed 4 KiB here: the page size comes from the
//! configuration, so page arithmetic takes it as a parameter.

use std::fmt;

/// A user-program virtual address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtAddr(pub u32);

/// A byte offset into simulated main memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysAddr(pub u32);

impl VirtAddr {
    #[inline(always)]
    pub fn new(addr: u32) -> Self {
        Self(addr)
    }

    #[inline(always)]
    pub fn val(&self) -> u32 {
        self.0
    }

    /// Virtual page number for a page of `page_size` bytes.
    #[inline(always)]
    pub fn vpn(&self, page_size: u32) -> u32 {
        self.0 / page_size
    }

    #[inline(always)]
    pub fn page_offset(&self, page_size: u32) -> u32 {
        self.0 % page_size
    }
}

impl PhysAddr {
    #[inline(always)]
    pub fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Builds the physical address of `offset` within frame `ppn`.
    #[inline(always)]
    pub fn from_frame(ppn: u32, offset: u32, page_size: u32) -> Self {
        Self(ppn * page_size + offset)
    }

    #[inline(always)]
    pub fn val(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
