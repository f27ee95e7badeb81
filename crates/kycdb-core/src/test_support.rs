//! Shared test scaffolding: stable-memory allocation and a host store that
//! counts accesses and fails writes on demand.

use crate::kv::{KvError, KvRange, KvStore, MemoryKvStore};
use canic_cdk::structures::{
    DefaultMemoryImpl,
    memory::{MemoryId, MemoryManager, VirtualMemory},
};
use std::{cell::Cell, rc::Rc};

// Test-only stable memory allocation for in-memory stores.
pub(crate) fn test_memory(id: u8) -> VirtualMemory<DefaultMemoryImpl> {
    let manager = MemoryManager::init(DefaultMemoryImpl::default());

    manager.get(MemoryId::new(id))
}

///
/// FaultHandle
///
/// Shared control over a [`FaultyKvStore`] that stays usable after the
/// store has been moved into a collection.
///

#[derive(Clone, Default)]
pub(crate) struct FaultHandle(Rc<FaultState>);

#[derive(Default)]
struct FaultState {
    writes_left: Cell<Option<usize>>,
    reads: Cell<usize>,
    writes: Cell<usize>,
}

impl FaultHandle {
    /// Let `n` more writes succeed, then fail every write until healed.
    pub(crate) fn fail_after(&self, n: usize) {
        self.0.writes_left.set(Some(n));
    }

    pub(crate) fn heal(&self) {
        self.0.writes_left.set(None);
    }

    /// Total reads and writes seen so far.
    pub(crate) fn accesses(&self) -> usize {
        self.0.reads.get() + self.0.writes.get()
    }

    fn read(&self) {
        self.0.reads.set(self.0.reads.get() + 1);
    }

    fn write(&self) -> Result<(), KvError> {
        self.0.writes.set(self.0.writes.get() + 1);

        match self.0.writes_left.get() {
            Some(0) => Err(KvError::Unavailable("injected write failure".to_string())),
            Some(n) => {
                self.0.writes_left.set(Some(n - 1));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

///
/// FaultyKvStore
///

#[derive(Default)]
pub(crate) struct FaultyKvStore {
    pub(crate) inner: MemoryKvStore,
    faults: FaultHandle,
}

impl FaultyKvStore {
    pub(crate) fn new() -> (Self, FaultHandle) {
        let store = Self::default();
        let handle = store.faults.clone();

        (store, handle)
    }
}

impl KvStore for FaultyKvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        self.faults.read();
        self.inner.get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        self.faults.write()?;
        self.inner.put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KvError> {
        self.faults.write()?;
        self.inner.delete(key)
    }

    fn range<'a>(&'a self, lo: &[u8], hi: &[u8]) -> Result<KvRange<'a>, KvError> {
        self.faults.read();
        self.inner.range(lo, hi)
    }
}
