use crate::system::ThreadId;

/// One mapping slot, shared by the TLB and the inverted page table.
///
/// In the inverted table `physical_page` is the slot's own index and never
/// changes; only the mapping fields are rewritten on replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranslationEntry {
    /// Mapped page, `None` while the slot has never been assigned.
    pub virtual_page: Option<u32>,
    pub physical_page: u32,
    /// Usable for translation.
    pub valid: bool,
    pub read_only: bool,
    /// Referenced since the mapping was installed.
    pub used: bool,
    /// Written since the mapping was installed.
    pub dirty: bool,
    /// Owning thread.
    pub tid: Option<ThreadId>,
    /// Recency rank for LRU replacement; larger is more recent.
    pub lru: i64,
}

impl TranslationEntry {
    /// An unassigned, invalid slot pointing at frame `physical_page`.
    pub fn unassigned(physical_page: u32) -> Self {
        Self {
            virtual_page: None,
            physical_page,
            valid: false,
            read_only: false,
            used: false,
            dirty: false,
            tid: None,
            lru: -1,
        }
    }

    /// Whether this slot currently maps `vpn` of thread `tid`.
    #[inline(always)]
    pub fn maps(&self, tid: ThreadId, vpn: u32) -> bool {
        self.valid && self.tid == Some(tid) && self.virtual_page == Some(vpn)
    }

    /// Drops the mapping but keeps `physical_page`.
    pub fn invalidate(&mut self) {
        *self = Self {
            lru: self.lru,
            ..Self::unassigned(self.physical_page)
        };
    }
}
