use super::ReplacementPolicy;
use crate::core::mmu::entry::TranslationEntry;

/// Least-recently-used replacement over the entries' `lru` counters.
///
/// A reference ages every other slot by one and ranks the referenced slot
/// `len - 1`, so the minimum counter is always the stalest slot without
/// keeping timestamps.
#[derive(Default)]
pub struct LruPolicy;

impl LruPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl ReplacementPolicy for LruPolicy {
    fn update(&mut self, entries: &mut [TranslationEntry], slot: usize) {
        let top = entries.len() as i64 - 1;
        for (i, e) in entries.iter_mut().enumerate() {
            if i == slot {
                e.lru = top;
            } else {
                e.lru = e.lru.saturating_sub(1);
            }
        }
    }

    fn get_victim(&mut self, entries: &mut [TranslationEntry]) -> usize {
        // Ties go to the lowest slot.
        let mut victim = 0;
        for (i, e) in entries.iter().enumerate() {
            if e.lru < entries[victim].lru {
                victim = i;
            }
        }
        self.update(entries, victim);
        victim
    }
}
