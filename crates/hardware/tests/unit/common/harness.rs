#![allow(dead_code)]

use vmachine::common::constants::BAD_VADDR_REG;
use vmachine::{
    BackingStore, Config, ExceptionHandler, ExceptionType, Machine, MachineError, PrivilegeMode,
    ThreadId, TranslationMode, VirtualDisk,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A configuration with the given strategy and geometry.
pub fn config(mode: TranslationMode, frames: usize, tlb_size: usize) -> Config {
    let mut config = Config::default();
    config.translation.mode = mode;
    config.memory.num_phys_pages = frames;
    config.translation.tlb_size = tlb_size;
    config
}

/// The byte thread `tid` initially holds at backing offset `offset`.
pub fn pattern(tid: u32, offset: usize) -> u8 {
    (offset as u32)
        .wrapping_mul(7)
        .wrapping_add(tid.wrapping_mul(61))
        .wrapping_add((offset as u32) >> 7) as u8
}

/// A backing store filled with [`pattern`] for `tid`.
pub fn patterned_disk(config: &Config, tid: u32) -> VirtualDisk {
    let size = config.memory.backing_size();
    VirtualDisk::from_bytes((0..size).map(|i| pattern(tid, i)).collect())
}

/// A machine with threads `1..=threads` registered on patterned stores and
/// thread 1 running.
pub fn machine(config: &Config, threads: u32) -> Machine {
    init_logging();
    let mut m = Machine::new(config).expect("valid config");
    for t in 1..=threads {
        m.register_thread(ThreadId(t), Box::new(patterned_disk(config, t)))
            .expect("register thread");
    }
    if threads > 0 {
        m.switch_to(ThreadId(1)).expect("switch");
    }
    m
}

/// Reads a whole page of `tid`'s backing store.
pub fn backing_page(m: &mut Machine, tid: u32, vpn: u32) -> Vec<u8> {
    let page = m.page_size() as usize;
    let mut buf = vec![0; page];
    m.store_mut(ThreadId(tid))
        .expect("registered")
        .read_at(vpn as usize * page, &mut buf)
        .expect("in range");
    buf
}

/// Reads a whole resident frame.
pub fn frame_bytes(m: &Machine, ppn: u32) -> Vec<u8> {
    m.memory.frame(ppn as usize).to_vec()
}

/// Kernel stand-in that records every trap it sees.
#[derive(Default)]
pub struct RecordingHandler {
    /// (kind, BadVAddr, mode during the handler)
    pub seen: Vec<(ExceptionType, u32, PrivilegeMode)>,
}

impl ExceptionHandler for RecordingHandler {
    fn handle(&mut self, machine: &mut Machine, which: ExceptionType) -> Result<(), MachineError> {
        self.seen.push((which, machine.read_register(BAD_VADDR_REG), machine.mode()));
        Ok(())
    }
}
