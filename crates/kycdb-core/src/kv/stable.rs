use crate::kv::{KvError, KvRange, KvStore};
use canic_cdk::structures::{
    BTreeMap, DefaultMemoryImpl, Storable, memory::VirtualMemory, storable::Bound,
};
use std::{borrow::Cow, ops::Bound as RangeBound};

/// Max bytes for a single stable-memory key (protocol-level limit).
pub const MAX_STABLE_KEY_BYTES: u32 = 1024;

/// Max bytes for a single stable-memory value (protocol-level limit).
pub const MAX_STABLE_VALUE_BYTES: u32 = 4 * 1024 * 1024;

///
/// StableKey
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
struct StableKey(Vec<u8>);

impl Storable for StableKey {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.0)
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        Self(bytes.into_owned())
    }

    fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    const BOUND: Bound = Bound::Bounded {
        max_size: MAX_STABLE_KEY_BYTES,
        is_fixed_size: false,
    };
}

///
/// StableValue
///

#[derive(Clone, Debug, Eq, PartialEq)]
struct StableValue(Vec<u8>);

impl Storable for StableValue {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.0)
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        // Trusted store boundary: bounded by BOUND
        Self(bytes.into_owned())
    }

    fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    const BOUND: Bound = Bound::Bounded {
        max_size: MAX_STABLE_VALUE_BYTES,
        is_fixed_size: false,
    };
}

///
/// StableKvStore
///
/// Stable-memory backed ordered store for canister deployments.
/// Sizes are checked before every write; the underlying map traps on
/// oversized payloads instead of returning an error.
///

pub struct StableKvStore {
    map: BTreeMap<StableKey, StableValue, VirtualMemory<DefaultMemoryImpl>>,
}

impl StableKvStore {
    #[must_use]
    pub fn init(memory: VirtualMemory<DefaultMemoryImpl>) -> Self {
        Self {
            map: BTreeMap::init(memory),
        }
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn check_key(key: &[u8]) -> Result<(), KvError> {
        if key.len() > MAX_STABLE_KEY_BYTES as usize {
            return Err(KvError::KeyTooLarge {
                len: key.len(),
                max: MAX_STABLE_KEY_BYTES as usize,
            });
        }

        Ok(())
    }
}

impl KvStore for StableKvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        Self::check_key(key)?;

        Ok(self.map.get(&StableKey(key.to_vec())).map(|v| v.0))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        Self::check_key(key)?;
        if value.len() > MAX_STABLE_VALUE_BYTES as usize {
            return Err(KvError::Host(format!(
                "value exceeds max size: {} bytes (limit {MAX_STABLE_VALUE_BYTES})",
                value.len()
            )));
        }

        self.map
            .insert(StableKey(key.to_vec()), StableValue(value.to_vec()));

        Ok(())
    }

    fn max_key_len(&self) -> Option<usize> {
        Some(MAX_STABLE_KEY_BYTES as usize)
    }

    fn max_value_len(&self) -> Option<usize> {
        Some(MAX_STABLE_VALUE_BYTES as usize)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KvError> {
        Self::check_key(key)?;
        self.map.remove(&StableKey(key.to_vec()));

        Ok(())
    }

    fn range<'a>(&'a self, lo: &[u8], hi: &[u8]) -> Result<KvRange<'a>, KvError> {
        Self::check_key(lo)?;

        // Upper bounds may carry a sentinel byte past the key limit. Any
        // storable key below such a bound is at most its truncated prefix, so
        // a clamped bound stays inclusive.
        let max = MAX_STABLE_KEY_BYTES as usize;
        let upper = if hi.len() > max {
            let hi = &hi[..max];
            if lo > hi {
                return Ok(Box::new(std::iter::empty()));
            }
            RangeBound::Included(StableKey(hi.to_vec()))
        } else {
            if lo >= hi {
                return Ok(Box::new(std::iter::empty()));
            }
            RangeBound::Excluded(StableKey(hi.to_vec()))
        };

        let iter = self
            .map
            .range((RangeBound::Included(StableKey(lo.to_vec())), upper))
            .map(|entry| Ok::<_, KvError>((entry.key().0.clone(), entry.value().0)));

        Ok(Box::new(iter))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_memory;

    #[test]
    fn stable_store_scans_in_byte_order() {
        let mut store = StableKvStore::init(test_memory(0));
        for key in [&b"date\x0020160102"[..], b"date\x0020160101", b"name\x00al"] {
            store.put(key, b"id").unwrap();
        }

        let keys = store
            .range(b"date\x00", b"date\x00\xff")
            .unwrap()
            .map(|entry| entry.unwrap().0)
            .collect::<Vec<_>>();

        assert_eq!(
            keys,
            vec![b"date\x0020160101".to_vec(), b"date\x0020160102".to_vec()]
        );
    }

    #[test]
    fn stable_store_rejects_oversized_key() {
        let mut store = StableKvStore::init(test_memory(1));
        let key = vec![b'k'; MAX_STABLE_KEY_BYTES as usize + 1];

        let err = store.put(&key, b"v").unwrap_err();
        assert!(matches!(err, KvError::KeyTooLarge { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn stable_store_clamped_upper_bound_keeps_full_length_key() {
        let mut store = StableKvStore::init(test_memory(3));
        let max = MAX_STABLE_KEY_BYTES as usize;
        let full = vec![b'k'; max];
        let mut above = full.clone();
        above[max - 1] = b'l';
        store.put(&full, b"full").unwrap();
        store.put(&above, b"above").unwrap();

        // Sentinel-style bound one byte past the limit.
        let mut hi = full.clone();
        hi.push(0xFF);

        let keys = store
            .range(b"k", &hi)
            .unwrap()
            .map(|entry| entry.unwrap().0)
            .collect::<Vec<_>>();
        assert_eq!(keys, vec![full.clone()]);

        // An unclamped bound equal to the key stays exclusive.
        assert_eq!(store.range(b"k", &full).unwrap().count(), 0);
    }

    #[test]
    fn stable_store_delete_and_get() {
        let mut store = StableKvStore::init(test_memory(2));
        store.put(b"k", b"v").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));

        store.delete(b"k").unwrap();
        store.delete(b"k").unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
    }
}
