use pretty_assertions::assert_eq;
use vmachine::ThreadId;
use vmachine::core::mmu::entry::TranslationEntry;
use vmachine::core::mmu::tlb::Tlb;

const T1: ThreadId = ThreadId(1);
const T2: ThreadId = ThreadId(2);

fn frame(ppn: u32) -> TranslationEntry {
    let mut e = TranslationEntry::unassigned(ppn);
    e.valid = true;
    e
}

/// Refill plus the reference the translation path records.
fn fill(tlb: &mut Tlb, tid: ThreadId, vpn: u32, ppn: u32) -> usize {
    let slot = tlb.refill(tid, vpn, &frame(ppn));
    tlb.touch(slot);
    slot
}

#[test]
fn test_new_tlb_is_empty() {
    let tlb = Tlb::new(4);
    assert_eq!(tlb.size(), 4);
    assert_eq!(tlb.valid_count(), 0);
    assert_eq!(tlb.lookup(T1, 0), None);
}

#[test]
fn test_refill_populates_slot() {
    let mut tlb = Tlb::new(4);
    let mut ro = frame(7);
    ro.read_only = true;
    let slot = tlb.refill(T1, 3, &ro);

    let e = tlb.entry(slot);
    assert_eq!(e.virtual_page, Some(3));
    assert_eq!(e.physical_page, 7);
    assert_eq!(e.tid, Some(T1));
    assert!(e.valid && e.read_only);
    assert!(!e.used && !e.dirty);
    assert_eq!(tlb.lookup(T1, 3), Some(slot));
}

#[test]
fn test_refill_uses_free_slots_first() {
    let mut tlb = Tlb::new(3);
    assert_eq!(fill(&mut tlb, T1, 0, 0), 0);
    assert_eq!(fill(&mut tlb, T1, 1, 1), 1);
    assert_eq!(fill(&mut tlb, T1, 2, 2), 2);
    assert_eq!(tlb.valid_count(), 3);
}

#[test]
fn test_lru_eviction_order_two_slots() {
    // A, B, C into two slots leaves {B, C}.
    let mut tlb = Tlb::new(2);
    fill(&mut tlb, T1, 0xA, 0);
    fill(&mut tlb, T1, 0xB, 1);
    fill(&mut tlb, T1, 0xC, 2);

    assert_eq!(tlb.lookup(T1, 0xA), None);
    assert!(tlb.lookup(T1, 0xB).is_some());
    assert!(tlb.lookup(T1, 0xC).is_some());
}

#[test]
fn test_hit_refreshes_recency() {
    let mut tlb = Tlb::new(2);
    fill(&mut tlb, T1, 0xA, 0);
    fill(&mut tlb, T1, 0xB, 1);
    let a = tlb.lookup(T1, 0xA).unwrap();
    tlb.touch(a);
    fill(&mut tlb, T1, 0xC, 2);

    assert!(tlb.lookup(T1, 0xA).is_some());
    assert_eq!(tlb.lookup(T1, 0xB), None);
}

#[test]
fn test_threads_do_not_alias() {
    let mut tlb = Tlb::new(4);
    fill(&mut tlb, T1, 5, 0);
    assert_eq!(tlb.lookup(T2, 5), None);
    fill(&mut tlb, T2, 5, 1);
    let s1 = tlb.lookup(T1, 5).unwrap();
    let s2 = tlb.lookup(T2, 5).unwrap();
    assert_eq!(tlb.entry(s1).physical_page, 0);
    assert_eq!(tlb.entry(s2).physical_page, 1);
}

#[test]
fn test_invalidate_frame() {
    let mut tlb = Tlb::new(4);
    fill(&mut tlb, T1, 0, 3);
    fill(&mut tlb, T1, 1, 4);
    assert_eq!(tlb.invalidate_frame(3), 1);
    assert_eq!(tlb.lookup(T1, 0), None);
    assert!(tlb.lookup(T1, 1).is_some());
    assert_eq!(tlb.invalidate_frame(3), 0);
}

#[test]
fn test_invalidate_thread_and_flush() {
    let mut tlb = Tlb::new(4);
    fill(&mut tlb, T1, 0, 0);
    fill(&mut tlb, T2, 0, 1);
    fill(&mut tlb, T2, 1, 2);
    assert_eq!(tlb.invalidate_thread(T2), 2);
    assert_eq!(tlb.valid_count(), 1);
    tlb.flush();
    assert_eq!(tlb.valid_count(), 0);
}
