//! Victim selection for the fixed-capacity translation tables.
//!
//! Each table keeps exactly one active policy: LRU for the TLB, random for
//! the inverted page table. Policies only choose among full tables;
//! [`select_victim`] hands out free slots first.

use super::entry::TranslationEntry;

pub use self::lru::LruPolicy;
pub use self::random::RandomPolicy;

mod lru;
mod random;

pub trait ReplacementPolicy: Send {
    /// Records a reference to `slot`.
    fn update(&mut self, entries: &mut [TranslationEntry], slot: usize);

    /// Picks the slot to evict when every slot is valid.
    fn get_victim(&mut self, entries: &mut [TranslationEntry]) -> usize;
}

/// First invalid slot, otherwise the policy's choice.
pub fn select_victim(policy: &mut dyn ReplacementPolicy, entries: &mut [TranslationEntry]) -> usize {
    match entries.iter().position(|e| !e.valid) {
        Some(slot) => slot,
        None => policy.get_victim(entries),
    }
}
