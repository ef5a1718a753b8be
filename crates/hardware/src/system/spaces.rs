//! Thread identity and the thread → backing store registry.
//!
//! Inverted-table entries record their owner as a [`ThreadId`] key rather
//! than a reference, so frames never hold a thread alive; the owner's store
//! is looked up here at write-back time.

use std::collections::HashMap;
use std::fmt;

use super::backing::BackingStore;
use crate::common::MachineError;

/// Opaque identity of a simulated thread (and its address space).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub u32);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
pub struct SpaceTable {
    spaces: HashMap<ThreadId, Box<dyn BackingStore>>,
}

impl SpaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `store` for `tid`, returning the store it replaces.
    pub fn insert(
        &mut self,
        tid: ThreadId,
        store: Box<dyn BackingStore>,
    ) -> Option<Box<dyn BackingStore>> {
        self.spaces.insert(tid, store)
    }

    pub fn remove(&mut self, tid: ThreadId) -> Option<Box<dyn BackingStore>> {
        self.spaces.remove(&tid)
    }

    pub fn contains(&self, tid: ThreadId) -> bool {
        self.spaces.contains_key(&tid)
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    pub fn get(&self, tid: ThreadId) -> Result<&(dyn BackingStore + 'static), MachineError> {
        self.spaces
            .get(&tid)
            .map(|s| s.as_ref())
            .ok_or(MachineError::UnknownThread(tid))
    }

    pub fn get_mut(
        &mut self,
        tid: ThreadId,
    ) -> Result<&mut (dyn BackingStore + 'static), MachineError> {
        match self.spaces.get_mut(&tid) {
            Some(store) => Ok(store.as_mut()),
            None => Err(MachineError::UnknownThread(tid)),
        }
    }
}
