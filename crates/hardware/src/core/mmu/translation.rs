//! The two translation strategies.
//!
//! [`CachedTranslation`] puts a TLB in front of the inverted page table;
//! [`DirectTranslation`] consults the table on every reference. Both page
//! in transparently on a miss, so the kernel never observes a page fault
//! for a page its thread owns.

use log::debug;

use super::inverted::{InvertedPageTable, PageIn};
use super::tlb::Tlb;
use crate::common::{AccessType, ExceptionType, MachineError, PhysAddr, TranslationResult};
use crate::config::TranslationMode;
use crate::stats::TranslationStats;
use crate::system::{MainMemory, SpaceTable, ThreadId};

/// The shared state a strategy translates against.
pub struct Pager<'a> {
    pub table: &'a mut InvertedPageTable,
    pub memory: &'a mut MainMemory,
    pub spaces: &'a mut SpaceTable,
    pub stats: &'a mut TranslationStats,
    pub page_size: u32,
}

impl Pager<'_> {
    /// Resident frame for `vpn` of `tid`, paging it in if needed.
    ///
    /// `reclaim` sees the chosen frame before any page transfer starts, so
    /// caches can drop it even when the transfer fails. Returns the frame
    /// and, when a page-in happened, its record.
    fn resident_frame(
        &mut self,
        tid: ThreadId,
        vpn: u32,
        reclaim: impl FnOnce(u32),
    ) -> Result<(u32, Option<PageIn>), MachineError> {
        if let Some(ppn) = self.table.find(tid, vpn) {
            return Ok((ppn, None));
        }
        if !self.spaces.contains(tid) {
            return Err(MachineError::UnknownThread(tid));
        }
        self.stats.page_faults += 1;
        let ppn = self.table.select_frame();
        reclaim(ppn);
        let page_in = self
            .table
            .replace_frame(ppn, tid, vpn, self.memory, self.spaces)?;
        if let Some(ev) = page_in.evicted {
            self.stats.evictions += 1;
            if ev.written_back {
                self.stats.write_backs += 1;
            }
        }
        Ok((page_in.ppn, Some(page_in)))
    }

    /// Records a reference to frame `ppn` in the inverted table.
    fn mark_frame(&mut self, ppn: u32, access: AccessType) {
        let e = self.table.entry_mut(ppn);
        e.used = true;
        if access.is_write() {
            e.dirty = true;
        }
    }
}

/// One translation strategy, chosen once when the machine is built.
pub trait Translation: Send {
    fn mode(&self) -> TranslationMode;

    /// Resolves `vpn` of `tid` to a frame, returning the physical address
    /// of `offset` within it or the exception the reference raises.
    fn translate(
        &mut self,
        pager: &mut Pager<'_>,
        tid: ThreadId,
        vpn: u32,
        offset: u32,
        access: AccessType,
    ) -> Result<TranslationResult, MachineError>;

    fn tlb(&self) -> Option<&Tlb> {
        None
    }

    /// Forgets cached mappings of `tid`.
    fn invalidate_thread(&mut self, _tid: ThreadId) {}

    /// Forgets every cached mapping.
    fn flush(&mut self) {}
}

/// TLB-first translation.
///
/// A hit never touches the inverted table except to propagate the dirty
/// bit. A miss refills a slot from the table, paging in first if the page
/// is not resident. Slots pointing at the frame a page-in is about to reuse
/// are invalidated before any transfer, so no slot outlives its frame's
/// mapping, not even when the transfer fails.
pub struct CachedTranslation {
    tlb: Tlb,
}

impl CachedTranslation {
    pub fn new(tlb_size: usize) -> Self {
        Self {
            tlb: Tlb::new(tlb_size),
        }
    }

    pub fn with_tlb(tlb: Tlb) -> Self {
        Self { tlb }
    }
}

impl Translation for CachedTranslation {
    fn mode(&self) -> TranslationMode {
        TranslationMode::Cached
    }

    fn translate(
        &mut self,
        pager: &mut Pager<'_>,
        tid: ThreadId,
        vpn: u32,
        offset: u32,
        access: AccessType,
    ) -> Result<TranslationResult, MachineError> {
        pager.stats.tlb_attempts += 1;

        let slot = match self.tlb.lookup(tid, vpn) {
            Some(slot) => {
                pager.stats.tlb_hits += 1;
                slot
            }
            None => {
                let tlb = &mut self.tlb;
                let (ppn, page_in) = pager.resident_frame(tid, vpn, |victim| {
                    let stale = tlb.invalidate_frame(victim);
                    if stale > 0 {
                        debug!("tlb: dropped {} stale slot(s) for ppn {}", stale, victim);
                    }
                })?;
                if page_in.is_none() {
                    pager.stats.tlb_refills += 1;
                }
                self.tlb.refill(tid, vpn, pager.table.entry(ppn))
            }
        };
        self.tlb.touch(slot);

        let entry = self.tlb.entry_mut(slot);
        if access.is_write() && entry.read_only {
            return Ok(TranslationResult::fault(ExceptionType::ReadOnly));
        }
        entry.used = true;
        if access.is_write() {
            entry.dirty = true;
        }
        let ppn = entry.physical_page;
        pager.mark_frame(ppn, access);

        Ok(TranslationResult::success(PhysAddr::from_frame(
            ppn,
            offset,
            pager.page_size,
        )))
    }

    fn tlb(&self) -> Option<&Tlb> {
        Some(&self.tlb)
    }

    fn invalidate_thread(&mut self, tid: ThreadId) {
        self.tlb.invalidate_thread(tid);
    }

    fn flush(&mut self) {
        self.tlb.flush();
    }
}

/// Table-only translation: every reference goes to the inverted table.
#[derive(Default)]
pub struct DirectTranslation;

impl DirectTranslation {
    pub fn new() -> Self {
        Self
    }
}

impl Translation for DirectTranslation {
    fn mode(&self) -> TranslationMode {
        TranslationMode::Direct
    }

    fn translate(
        &mut self,
        pager: &mut Pager<'_>,
        tid: ThreadId,
        vpn: u32,
        offset: u32,
        access: AccessType,
    ) -> Result<TranslationResult, MachineError> {
        let (ppn, _) = pager.resident_frame(tid, vpn, |_| {})?;
        if access.is_write() && pager.table.entry(ppn).read_only {
            return Ok(TranslationResult::fault(ExceptionType::ReadOnly));
        }
        pager.mark_frame(ppn, access);

        Ok(TranslationResult::success(PhysAddr::from_frame(
            ppn,
            offset,
            pager.page_size,
        )))
    }
}
