use super::ReplacementPolicy;
use crate::core::mmu::entry::TranslationEntry;

/// Uniform random replacement driven by a xorshift generator.
///
/// Seeded from the configuration so runs are reproducible.
pub struct RandomPolicy {
    state: u64,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        // xorshift never leaves the all-zero state.
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

impl ReplacementPolicy for RandomPolicy {
    fn update(&mut self, _entries: &mut [TranslationEntry], _slot: usize) {}

    fn get_victim(&mut self, entries: &mut [TranslationEntry]) -> usize {
        (self.next() % entries.len() as u64) as usize
    }
}
