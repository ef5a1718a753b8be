//! Demand paging under memory pressure.

use std::io;

use mockall::mock;
use pretty_assertions::assert_eq;
use vmachine::{BackingStore, Config, Machine, ThreadId, TranslationMode};

use crate::harness::{self, RecordingHandler, backing_page, frame_bytes, pattern};

mock! {
    pub Disk {}
    impl BackingStore for Disk {
        fn len(&self) -> usize;
        fn read_at(&mut self, offset: usize, buf: &mut [u8]) -> io::Result<()>;
        fn write_at(&mut self, offset: usize, data: &[u8]) -> io::Result<()>;
    }
}

fn one_frame(mode: TranslationMode) -> Config {
    harness::config(mode, 1, 1)
}

#[test]
fn test_write_back_goes_to_owner_before_overwrite() {
    for mode in [TranslationMode::Cached, TranslationMode::Direct] {
        let config = one_frame(mode);
        let mut m = harness::machine(&config, 2);
        let mut handler = RecordingHandler::default();

        // T1 dirties page 3, which owns the only frame.
        for i in 0..32u32 {
            assert!(m.write_mem(3 * 128 + i * 4, 4, 0xa5a5_0000 | i, &mut handler).unwrap());
        }
        let before = frame_bytes(&m, 0);
        let t2_page = backing_page(&mut m, 2, 5);

        // T2 faults on page 5 and takes the frame.
        m.switch_to(ThreadId(2)).unwrap();
        m.read_mem(5 * 128, 1, &mut handler).unwrap();

        assert_eq!(backing_page(&mut m, 1, 3), before, "{:?}", mode);
        assert_eq!(frame_bytes(&m, 0), t2_page, "{:?}", mode);
        assert_eq!(m.stats().write_backs, 1);
        assert_eq!(m.stats().evictions, 1);
        assert!(handler.seen.is_empty());
    }
}

#[test]
fn test_evicted_page_comes_back_intact() {
    let config = one_frame(TranslationMode::Cached);
    let mut m = harness::machine(&config, 1);
    let mut handler = RecordingHandler::default();

    m.write_mem(0, 4, 0xfeed_f00d, &mut handler).unwrap();
    // Thrash the single frame with another page.
    assert_eq!(
        m.read_mem(128, 1, &mut handler).unwrap(),
        Some(pattern(1, 128) as u32)
    );
    assert_eq!(m.read_mem(0, 4, &mut handler).unwrap(), Some(0xfeed_f00d));
    assert_eq!(m.read_mem(4, 1, &mut handler).unwrap(), Some(pattern(1, 4) as u32));
    assert_eq!(m.stats().page_faults, 3);
}

#[test]
fn test_clean_eviction_leaves_store_untouched() {
    let config = one_frame(TranslationMode::Direct);
    let mut m = Machine::new(&config).unwrap();
    let size = config.memory.backing_size();

    let mut owner = MockDisk::new();
    owner.expect_len().return_const(size);
    owner.expect_read_at().times(2).returning(|_, buf| {
        buf.fill(0x3c);
        Ok(())
    });
    owner.expect_write_at().times(0);
    m.register_thread(ThreadId(1), Box::new(owner)).unwrap();
    m.switch_to(ThreadId(1)).unwrap();

    let mut handler = RecordingHandler::default();
    assert_eq!(m.read_mem(0, 1, &mut handler).unwrap(), Some(0x3c));
    assert_eq!(m.read_mem(128, 1, &mut handler).unwrap(), Some(0x3c));
    assert_eq!(m.stats().evictions, 1);
    assert_eq!(m.stats().write_backs, 0);
}

#[test]
fn test_every_frame_used_before_any_eviction() {
    let config = harness::config(TranslationMode::Direct, 8, 4);
    let mut m = harness::machine(&config, 1);
    let mut handler = RecordingHandler::default();
    for vpn in 0..8u32 {
        m.read_mem(vpn * 128, 1, &mut handler).unwrap();
    }
    assert!(m.page_table().entries().iter().all(|e| e.valid));
    assert_eq!(m.stats().evictions, 0);

    m.read_mem(8 * 128, 1, &mut handler).unwrap();
    assert_eq!(m.stats().evictions, 1);
    assert_eq!(m.page_table().frames_of(ThreadId(1)).len(), 8);
}

#[test]
fn test_released_thread_dirty_pages_are_discarded() {
    let config = one_frame(TranslationMode::Cached);
    let mut m = harness::machine(&config, 2);
    let mut handler = RecordingHandler::default();
    m.write_mem(0, 4, 0xdead_beef, &mut handler).unwrap();

    let store = m.release_thread(ThreadId(1)).unwrap();
    assert_eq!(store.len(), config.memory.backing_size());

    m.switch_to(ThreadId(2)).unwrap();
    m.read_mem(0, 1, &mut handler).unwrap();
    assert_eq!(m.stats().write_backs, 0);
    assert_eq!(m.stats().evictions, 0);
}
