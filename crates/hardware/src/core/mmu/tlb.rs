//! Translation Lookaside Buffer.
//!
//! A small fully associative cache of recent mappings, consulted before the
//! inverted page table. Slots are tagged with the owning thread so two
//! address spaces never alias on equal page numbers. The TLB never does
//! I/O; a refill only repoints a slot at an already resident frame.

use log::debug;

use super::entry::TranslationEntry;
use super::policies::{LruPolicy, ReplacementPolicy, select_victim};
use crate::system::ThreadId;

pub struct Tlb {
    entries: Vec<TranslationEntry>,
    policy: Box<dyn ReplacementPolicy>,
}

impl Tlb {
    /// Creates an empty TLB of `size` slots with LRU replacement.
    pub fn new(size: usize) -> Self {
        Self::with_policy(size, Box::new(LruPolicy::new()))
    }

    pub fn with_policy(size: usize, policy: Box<dyn ReplacementPolicy>) -> Self {
        assert!(size > 0, "TLB needs at least one slot");
        Self {
            entries: (0..size)
                .map(|_| TranslationEntry::unassigned(0))
                .collect(),
            policy,
        }
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[TranslationEntry] {
        &self.entries
    }

    pub fn entry(&self, slot: usize) -> &TranslationEntry {
        &self.entries[slot]
    }

    pub fn entry_mut(&mut self, slot: usize) -> &mut TranslationEntry {
        &mut self.entries[slot]
    }

    /// Slot holding `vpn` of `tid`, if cached.
    pub fn lookup(&self, tid: ThreadId, vpn: u32) -> Option<usize> {
        self.entries.iter().position(|e| e.maps(tid, vpn))
    }

    /// Marks `slot` as the most recently used.
    pub fn touch(&mut self, slot: usize) {
        self.policy.update(&mut self.entries, slot);
    }

    /// Caches the mapping of `vpn` to `frame`, evicting a slot if full.
    ///
    /// `frame` is the inverted-table entry currently holding the page.
    /// Returns the slot filled.
    pub fn refill(&mut self, tid: ThreadId, vpn: u32, frame: &TranslationEntry) -> usize {
        let slot = select_victim(self.policy.as_mut(), &mut self.entries);
        let old = self.entries[slot];
        if old.valid {
            debug!(
                "tlb: evict slot {} (tid {:?} vpn {:?} -> ppn {})",
                slot, old.tid, old.virtual_page, old.physical_page
            );
        }

        let e = &mut self.entries[slot];
        e.virtual_page = Some(vpn);
        e.physical_page = frame.physical_page;
        e.tid = Some(tid);
        e.valid = true;
        e.read_only = frame.read_only;
        e.used = false;
        e.dirty = false;
        debug!(
            "tlb: refill slot {} with tid {} vpn {} -> ppn {}",
            slot, tid, vpn, frame.physical_page
        );
        slot
    }

    /// Drops every slot pointing at physical frame `ppn`.
    ///
    /// Returns how many slots were invalidated.
    pub fn invalidate_frame(&mut self, ppn: u32) -> usize {
        self.invalidate_where(|e| e.physical_page == ppn)
    }

    /// Drops every slot owned by `tid`.
    pub fn invalidate_thread(&mut self, tid: ThreadId) -> usize {
        self.invalidate_where(|e| e.tid == Some(tid))
    }

    /// Invalidates the whole TLB.
    pub fn flush(&mut self) {
        self.invalidate_where(|_| true);
    }

    pub fn valid_count(&self) -> usize {
        self.entries.iter().filter(|e| e.valid).count()
    }

    fn invalidate_where(&mut self, pred: impl Fn(&TranslationEntry) -> bool) -> usize {
        let mut count = 0;
        for e in self.entries.iter_mut().filter(|e| e.valid) {
            if pred(e) {
                e.invalidate();
                count += 1;
            }
        }
        count
    }
}
