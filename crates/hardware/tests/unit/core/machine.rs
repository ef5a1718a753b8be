use mockall::mock;
use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use vmachine::common::constants::{BAD_VADDR_REG, LOAD_REG, LOAD_VALUE_REG};
use vmachine::{
    BackingStore, Config, ExceptionHandler, ExceptionType, Machine, MachineError, PrivilegeMode,
    ThreadId, TranslationMode, VirtualDisk,
};

use crate::common::harness::{self, RecordingHandler};

mock! {
    pub Kernel {}
    impl ExceptionHandler for Kernel {
        fn handle(&mut self, machine: &mut Machine, which: ExceptionType) -> Result<(), MachineError>;
    }
}

#[test]
fn test_new_rejects_invalid_config() {
    let mut config = Config::default();
    config.memory.num_phys_pages = 0;
    assert!(matches!(
        Machine::new(&config),
        Err(MachineError::InvalidConfig(_))
    ));
}

#[test]
fn test_new_machine_is_zeroed_user_mode() {
    let m = Machine::new(&Config::default()).unwrap();
    assert_eq!(m.mode(), PrivilegeMode::User);
    assert_eq!(m.current_thread(), None);
    assert!(m.page_table().entries().iter().all(|e| !e.valid));
    assert_eq!(m.tlb().map(|t| t.valid_count()), Some(0));
    assert!(m.memory.frame(0).iter().all(|&b| b == 0));
}

#[test]
fn test_direct_mode_has_no_tlb() {
    let config = harness::config(TranslationMode::Direct, 8, 4);
    let m = Machine::new(&config).unwrap();
    assert!(m.tlb().is_none());
    assert_eq!(m.translation_mode(), TranslationMode::Direct);
}

#[test]
fn test_raise_exception_enters_system_mode_and_returns() {
    let mut m = harness::machine(&Config::default(), 1);
    let mut handler = RecordingHandler::default();
    m.raise_exception(ExceptionType::Syscall, 0x1234, &mut handler)
        .unwrap();

    assert_eq!(
        handler.seen,
        vec![(ExceptionType::Syscall, 0x1234, PrivilegeMode::System)]
    );
    assert_eq!(m.mode(), PrivilegeMode::User);
    assert_eq!(m.read_register(BAD_VADDR_REG), 0x1234);
    assert_eq!(m.stats().exceptions, 1);
}

#[test]
fn test_raise_exception_flushes_delayed_load() {
    let mut m = harness::machine(&Config::default(), 1);
    m.delayed_load(9, 0xbeef);
    let mut handler = |m: &mut Machine, _: ExceptionType| -> Result<(), MachineError> {
        // The pending load must already have landed.
        assert_eq!(m.read_register(9), 0xbeef);
        Ok(())
    };
    m.raise_exception(ExceptionType::Overflow, 0, &mut handler)
        .unwrap();
    assert_eq!(m.read_register(LOAD_REG), 0);
    assert_eq!(m.read_register(LOAD_VALUE_REG), 0);
}

#[test]
fn test_handler_error_restores_user_mode() {
    let mut m = harness::machine(&Config::default(), 1);
    let mut handler = |_: &mut Machine, which: ExceptionType| -> Result<(), MachineError> {
        Err(MachineError::Handler(format!("unhandled {}", which)))
    };
    let err = m
        .raise_exception(ExceptionType::IllegalInstruction, 0, &mut handler)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "exception handler aborted: unhandled illegal instruction"
    );
    assert_eq!(m.mode(), PrivilegeMode::User);
}

#[test]
#[should_panic(expected = "no-exception")]
fn test_raising_sentinel_panics() {
    let mut m = harness::machine(&Config::default(), 1);
    let mut handler = RecordingHandler::default();
    let _ = m.raise_exception(ExceptionType::NoException, 0, &mut handler);
}

#[test]
fn test_translate_without_thread_is_error() {
    let mut m = harness::machine(&Config::default(), 0);
    let mut handler = RecordingHandler::default();
    assert!(matches!(
        m.read_mem(0, 4, &mut handler),
        Err(MachineError::NoCurrentThread)
    ));
}

#[test]
fn test_switch_to_unknown_thread_fails() {
    let mut m = harness::machine(&Config::default(), 1);
    assert!(matches!(
        m.switch_to(ThreadId(9)),
        Err(MachineError::UnknownThread(ThreadId(9)))
    ));
    assert_eq!(m.current_thread(), Some(ThreadId(1)));
}

#[test]
fn test_register_rejects_short_store() {
    let mut m = Machine::new(&Config::default()).unwrap();
    let err = m
        .register_thread(ThreadId(1), Box::new(VirtualDisk::new(16)))
        .unwrap_err();
    assert!(matches!(err, MachineError::InvalidConfig(_)));
}

#[test]
fn test_release_thread_drops_frames_and_tlb_slots() {
    let config = Config::default();
    let mut m = harness::machine(&config, 2);
    let mut handler = RecordingHandler::default();
    m.write_mem(0, 4, 1, &mut handler).unwrap();
    m.write_mem(128, 4, 2, &mut handler).unwrap();

    let store = m.release_thread(ThreadId(1));
    assert!(store.is_some());
    assert_eq!(m.current_thread(), None);
    assert!(m.page_table().frames_of(ThreadId(1)).is_empty());
    assert!(
        m.tlb()
            .unwrap()
            .entries()
            .iter()
            .all(|e| !e.valid || e.tid != Some(ThreadId(1)))
    );
    assert!(!m.spaces().contains(ThreadId(1)));
}

#[test]
fn test_store_mut_reaches_registered_stores_only() {
    let mut m = harness::machine(&Config::default(), 1);
    let mut handler = RecordingHandler::default();

    m.store_mut(ThreadId(1))
        .unwrap()
        .write_at(256, &0x5eed_u32.to_le_bytes())
        .unwrap();
    assert_eq!(m.read_mem(256, 4, &mut handler).unwrap(), Some(0x5eed));
    assert!(matches!(
        m.store_mut(ThreadId(4)),
        Err(MachineError::UnknownThread(ThreadId(4)))
    ));
}

#[test]
fn test_released_store_comes_back_with_its_written_pages() {
    let config = harness::config(TranslationMode::Cached, 1, 1);
    let mut m = harness::machine(&config, 2);
    let mut handler = RecordingHandler::default();

    // Dirty T1's only frame, then let T2 push it out.
    m.write_mem(0, 4, 0x7777_0001, &mut handler).unwrap();
    m.switch_to(ThreadId(2)).unwrap();
    m.read_mem(0, 4, &mut handler).unwrap();

    let mut store = m.release_thread(ThreadId(1)).unwrap();
    let mut word = [0u8; 4];
    store.read_at(0, &mut word).unwrap();
    assert_eq!(u32::from_le_bytes(word), 0x7777_0001);

    // T2 keeps paging without ever naming the released thread.
    for vpn in 0..8u32 {
        m.read_mem(vpn * 128, 4, &mut handler).unwrap();
    }
    assert!(handler.seen.is_empty());
}

#[test]
fn test_dump_state_includes_mode() {
    let m = Machine::new(&Config::default()).unwrap();
    let dump = m.dump_state();
    assert!(dump.contains("Machine registers:"));
    assert!(dump.contains("Mode:\tuser"));
}

#[test]
fn test_misaligned_read_dispatches_address_error_once() {
    let mut m = harness::machine(&Config::default(), 1);
    let mut kernel = MockKernel::new();
    kernel
        .expect_handle()
        .with(mockall::predicate::always(), eq(ExceptionType::AddressError))
        .times(1)
        .returning(|m, _| {
            assert_eq!(m.read_register(BAD_VADDR_REG), 0x42);
            assert_eq!(m.mode(), PrivilegeMode::System);
            Ok(())
        });

    assert_eq!(m.read_mem(0x42, 4, &mut kernel).unwrap(), None);
    assert_eq!(m.mode(), PrivilegeMode::User);
}

#[test]
fn test_page_faults_never_reach_kernel() {
    let config = harness::config(TranslationMode::Cached, 4, 2);
    let mut m = harness::machine(&config, 1);
    let mut kernel = MockKernel::new();
    kernel.expect_handle().times(0);

    for vpn in 0..16u32 {
        assert!(m.write_mem(vpn * 128, 4, vpn, &mut kernel).unwrap());
    }
    for vpn in 0..16u32 {
        assert_eq!(m.read_mem(vpn * 128, 4, &mut kernel).unwrap(), Some(vpn));
    }
    assert!(m.stats().page_faults >= 16);
    assert_eq!(m.stats().exceptions, 0);
}
