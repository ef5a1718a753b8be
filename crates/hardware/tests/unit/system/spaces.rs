use vmachine::system::SpaceTable;
use vmachine::{MachineError, ThreadId, VirtualDisk};

#[test]
fn test_insert_lookup_remove() {
    let mut spaces = SpaceTable::new();
    assert!(spaces.is_empty());
    assert!(spaces.insert(ThreadId(1), Box::new(VirtualDisk::new(8))).is_none());
    assert!(spaces.contains(ThreadId(1)));
    assert_eq!(spaces.get(ThreadId(1)).unwrap().len(), 8);

    let replaced = spaces.insert(ThreadId(1), Box::new(VirtualDisk::new(16)));
    assert_eq!(replaced.map(|s| s.len()), Some(8));
    assert_eq!(spaces.len(), 1);

    assert!(spaces.remove(ThreadId(1)).is_some());
    assert!(!spaces.contains(ThreadId(1)));
}

#[test]
fn test_unknown_thread_error() {
    let mut spaces = SpaceTable::new();
    assert!(matches!(
        spaces.get_mut(ThreadId(3)),
        Err(MachineError::UnknownThread(ThreadId(3)))
    ));
}
