//! Ordered key-value store seam.
//!
//! The host supplies the store. The core relies only on:
//! - point `get` / `put` / `delete`
//! - ascending `range(lo, hi)` scans, lo inclusive and hi exclusive, ordered
//!   by raw key bytes
//! - optional `max_key_len` / `max_value_len` limits, checked before commit
//!
//! There is no multi-key atomicity here; see `commit` for how multi-write
//! operations stay recoverable on top of this.

mod memory;
mod stable;

pub use memory::MemoryKvStore;
pub use stable::{MAX_STABLE_KEY_BYTES, MAX_STABLE_VALUE_BYTES, StableKvStore};

use thiserror::Error as ThisError;

/// One `(key, value)` pair yielded by a range scan.
pub type KvEntry = (Vec<u8>, Vec<u8>);

/// Lazy, ordered range scan. Dropping it releases any scan-side resource.
pub type KvRange<'a> = Box<dyn Iterator<Item = Result<KvEntry, KvError>> + 'a>;

///
/// KvError
///
/// Failure reported by the host store.
///

#[derive(Debug, ThisError)]
pub enum KvError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("key exceeds max size: {len} bytes (limit {max})")]
    KeyTooLarge { len: usize, max: usize },

    #[error("host store error: {0}")]
    Host(String),
}

///
/// KvStore
///

pub trait KvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError>;

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvError>;

    /// Deleting an absent key is a no-op.
    fn delete(&mut self, key: &[u8]) -> Result<(), KvError>;

    /// Scan `[lo, hi)` in ascending byte order. An empty or inverted interval
    /// yields nothing.
    fn range<'a>(&'a self, lo: &[u8], hi: &[u8]) -> Result<KvRange<'a>, KvError>;

    /// Largest key the host accepts, if it enforces one.
    fn max_key_len(&self) -> Option<usize> {
        None
    }

    /// Largest value the host accepts, if it enforces one.
    fn max_value_len(&self) -> Option<usize> {
        None
    }
}

impl<S: KvStore + ?Sized> KvStore for Box<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        (**self).put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KvError> {
        (**self).delete(key)
    }

    fn range<'a>(&'a self, lo: &[u8], hi: &[u8]) -> Result<KvRange<'a>, KvError> {
        (**self).range(lo, hi)
    }

    fn max_key_len(&self) -> Option<usize> {
        (**self).max_key_len()
    }

    fn max_value_len(&self) -> Option<usize> {
        (**self).max_value_len()
    }
}
