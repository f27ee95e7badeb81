use crate::kv::{KvError, KvRange, KvStore};
use std::{collections::BTreeMap, ops::Bound};

///
/// MemoryKvStore
///
/// Process-local ordered store. `Vec<u8>` ordering is byte-lexicographic,
/// which is exactly the ordering the index layer depends on.
///

#[derive(Clone, Debug, Default)]
pub struct MemoryKvStore {
    map: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryKvStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Snapshot all keys (diagnostics only).
    #[must_use]
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.map.keys().cloned().collect()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        Ok(self.map.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        self.map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KvError> {
        self.map.remove(key);
        Ok(())
    }

    fn range<'a>(&'a self, lo: &[u8], hi: &[u8]) -> Result<KvRange<'a>, KvError> {
        // BTreeMap::range panics on inverted bounds.
        if lo >= hi {
            return Ok(Box::new(std::iter::empty()));
        }

        let bounds = (Bound::Included(lo.to_vec()), Bound::Excluded(hi.to_vec()));
        let iter = self
            .map
            .range::<Vec<u8>, _>(bounds)
            .map(|(k, v)| Ok::<_, KvError>((k.clone(), v.clone())));

        Ok(Box::new(iter))
    }
}

///
/// TESTS
///
