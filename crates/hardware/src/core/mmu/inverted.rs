//! Global inverted (reverse-mapped) page table.
//!
//! One entry per physical frame records which thread's virtual page is
//! resident there. Lookup is a scan by content, which is acceptable
//! because the frame count is small and fixed. Replacement implements
//! demand paging against the owning threads' backing stores.
//!
//! # Performance
//!
//! - `find()`: O(F) for F frames
//! - `replace()`: O(F) plus at most two page transfers

use log::debug;

use super::entry::TranslationEntry;
use super::policies::{RandomPolicy, ReplacementPolicy, select_victim};
use crate::common::{MachineError, PageOp};
use crate::system::{MainMemory, SpaceTable, ThreadId};

/// A mapping displaced by [`InvertedPageTable::replace`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Eviction {
    pub tid: ThreadId,
    pub vpn: u32,
    /// The frame was dirty and its bytes went back to the owner's store.
    pub written_back: bool,
}

/// Result of paging one virtual page into memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageIn {
    /// Frame now holding the page.
    pub ppn: u32,
    /// Previous resident of that frame, if it held a valid mapping.
    pub evicted: Option<Eviction>,
}

pub struct InvertedPageTable {
    entries: Vec<TranslationEntry>,
    policy: Box<dyn ReplacementPolicy>,
    page_size: u32,
}

impl InvertedPageTable {
    /// Creates a table of `num_frames` invalid entries with random
    /// replacement seeded by `seed`.
    pub fn new(num_frames: usize, page_size: u32, seed: u64) -> Self {
        Self::with_policy(num_frames, page_size, Box::new(RandomPolicy::new(seed)))
    }

    pub fn with_policy(
        num_frames: usize,
        page_size: u32,
        policy: Box<dyn ReplacementPolicy>,
    ) -> Self {
        Self {
            entries: (0..num_frames as u32)
                .map(TranslationEntry::unassigned)
                .collect(),
            policy,
            page_size,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TranslationEntry] {
        &self.entries
    }

    pub fn entry(&self, ppn: u32) -> &TranslationEntry {
        &self.entries[ppn as usize]
    }

    pub fn entry_mut(&mut self, ppn: u32) -> &mut TranslationEntry {
        &mut self.entries[ppn as usize]
    }

    /// Frame holding `vpn` of `tid`, if resident.
    pub fn find(&self, tid: ThreadId, vpn: u32) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.maps(tid, vpn))
            .map(|e| e.physical_page)
    }

    /// Frames currently owned by `tid`.
    pub fn frames_of(&self, tid: ThreadId) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|e| e.valid && e.tid == Some(tid))
            .map(|e| e.physical_page)
            .collect()
    }

    /// Pages `vpn` of thread `tid` into a frame.
    ///
    /// Takes the first free frame, otherwise a random one, then transfers
    /// the page as [`replace_frame`](Self::replace_frame) does.
    pub fn replace(
        &mut self,
        tid: ThreadId,
        vpn: u32,
        memory: &mut MainMemory,
        spaces: &mut SpaceTable,
    ) -> Result<PageIn, MachineError> {
        if !spaces.contains(tid) {
            return Err(MachineError::UnknownThread(tid));
        }
        let ppn = self.select_frame();
        self.replace_frame(ppn, tid, vpn, memory, spaces)
    }

    /// Chooses the frame the next page-in will use without touching it.
    pub fn select_frame(&mut self) -> u32 {
        let victim = select_victim(self.policy.as_mut(), &mut self.entries);
        self.entries[victim].physical_page
    }

    /// Pages `vpn` of thread `tid` into frame `ppn`.
    ///
    /// A dirty resident is written back to its *owner's* store before the
    /// frame is overwritten with the page read from `tid`'s store. Any store
    /// failure is fatal. A failed write-back leaves the old mapping intact;
    /// a failed read leaves the frame invalid.
    pub fn replace_frame(
        &mut self,
        ppn: u32,
        tid: ThreadId,
        vpn: u32,
        memory: &mut MainMemory,
        spaces: &mut SpaceTable,
    ) -> Result<PageIn, MachineError> {
        if !spaces.contains(tid) {
            return Err(MachineError::UnknownThread(tid));
        }

        let victim = ppn as usize;
        let old = self.entries[victim];

        let mut evicted = None;
        if let (true, Some(owner), Some(old_vpn)) = (old.valid, old.tid, old.virtual_page) {
            let written_back = old.dirty;
            if written_back {
                let offset = old_vpn as usize * self.page_size as usize;
                spaces
                    .get_mut(owner)?
                    .write_at(offset, memory.frame(victim))
                    .map_err(|source| MachineError::PageIo {
                        tid: owner,
                        vpn: old_vpn,
                        op: PageOp::WriteBack,
                        source,
                    })?;
                debug!(
                    "ipt: wrote back ppn {} to tid {} vpn {}",
                    ppn, owner, old_vpn
                );
            }
            evicted = Some(Eviction {
                tid: owner,
                vpn: old_vpn,
                written_back,
            });
        }

        self.entries[victim].invalidate();

        let store = spaces.get_mut(tid)?;
        let read_only = store.is_read_only(vpn);
        let offset = vpn as usize * self.page_size as usize;
        store
            .read_at(offset, memory.frame_mut(victim))
            .map_err(|source| MachineError::PageIo {
                tid,
                vpn,
                op: PageOp::PageIn,
                source,
            })?;

        let e = &mut self.entries[victim];
        e.virtual_page = Some(vpn);
        e.tid = Some(tid);
        e.valid = true;
        e.dirty = false;
        e.used = false;
        e.read_only = read_only;
        self.policy.update(&mut self.entries, victim);

        debug!("ipt: tid {} vpn {} paged into ppn {}", tid, vpn, ppn);
        Ok(PageIn { ppn, evicted })
    }

    /// Invalidates every frame owned by `tid` without writing back.
    ///
    /// Returns the frames released.
    pub fn release_thread(&mut self, tid: ThreadId) -> Vec<u32> {
        let frames = self.frames_of(tid);
        for &ppn in &frames {
            self.entries[ppn as usize].invalidate();
        }
        frames
    }
}
