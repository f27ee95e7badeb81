//! Secondary indexes simulated on top of the ordered store.
//!
//! An index entry is an ordinary store key
//! `tag ∥ 0x00 ∥ value ∥ 0x00 ∥ primaryId` whose value is the primary id.
//! Lookups are range scans over those keys; results come back ordered by
//! indexed value, then by primary id.

#[cfg(test)]
mod tests;

use crate::{
    entity::IndexField,
    error::{ErrorClass, ErrorOrigin, InternalError},
    key::{DateFormat, IndexKey},
    kv::{KvRange, KvStore},
};

///
/// IndexFamily
///
/// One tag and the entity field it indexes.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexFamily {
    tag: String,
    field: IndexField,
}

impl IndexFamily {
    pub fn new(tag: impl Into<String>, field: IndexField) -> Self {
        Self {
            tag: tag.into(),
            field,
        }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub const fn field(&self) -> IndexField {
        self.field
    }
}

///
/// IndexSet
///
/// Every index family of one collection plus the date format its date
/// family uses.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexSet {
    families: Vec<IndexFamily>,
    date: DateFormat,
}

impl IndexSet {
    #[must_use]
    pub const fn new(families: Vec<IndexFamily>, date: DateFormat) -> Self {
        Self { families, date }
    }

    #[must_use]
    pub fn families(&self) -> &[IndexFamily] {
        &self.families
    }

    #[must_use]
    pub const fn date_format(&self) -> DateFormat {
        self.date
    }

    /// Map a caller-supplied tag onto a family. Never touches the store.
    pub fn resolve(&self, tag: &str, origin: ErrorOrigin) -> Result<&IndexFamily, InternalError> {
        self.families
            .iter()
            .find(|family| family.tag == tag)
            .ok_or_else(|| InternalError::unknown_index(origin, tag))
    }

    /// The family keyed by modification date.
    pub fn date_family(&self, origin: ErrorOrigin) -> Result<&IndexFamily, InternalError> {
        self.families
            .iter()
            .find(|family| family.field == IndexField::DateModified)
            .ok_or_else(|| {
                InternalError::new(
                    ErrorClass::Config,
                    origin,
                    "collection has no date index",
                )
            })
    }
}

/// Write `{key → primaryId}`.
pub fn put_index_entry<S: KvStore + ?Sized>(
    store: &mut S,
    key: &IndexKey,
    primary_id: &str,
) -> Result<(), InternalError> {
    store
        .put(key.as_bytes(), primary_id.as_bytes())
        .map_err(|err| InternalError::index_write("insert", err))
}

/// Delete one entry. Deleting an absent entry is a no-op.
pub fn remove_index_entry<S: KvStore + ?Sized>(
    store: &mut S,
    key: &IndexKey,
) -> Result<(), InternalError> {
    store
        .delete(key.as_bytes())
        .map_err(|err| InternalError::index_write("remove", err))
}

/// Entries of `tag` whose indexed value starts with `value`.
pub fn range_by_tag_prefix<'a, S: KvStore + ?Sized>(
    store: &'a S,
    tag: &str,
    value: &str,
) -> Result<IndexRange<'a>, InternalError> {
    let (lo, hi) = IndexKey::prefix_bounds(tag, value)?;

    IndexRange::open(store, &lo, &hi)
}

/// Entries of the date family `tag` on or after `from`, up to the sentinel.
pub fn range_from_date<'a, S: KvStore + ?Sized>(
    store: &'a S,
    tag: &str,
    from: &str,
    format: DateFormat,
) -> Result<IndexRange<'a>, InternalError> {
    let (lo, hi) = IndexKey::date_bounds(tag, from, format)?;

    IndexRange::open(store, &lo, &hi)
}

/// Every entry of `tag`.
pub fn scan_family<'a, S: KvStore + ?Sized>(
    store: &'a S,
    tag: &str,
) -> Result<IndexRange<'a>, InternalError> {
    let (lo, hi) = IndexKey::family_bounds(tag);

    IndexRange::open(store, &lo, &hi)
}

///
/// IndexHit
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexHit {
    pub key: IndexKey,
    pub primary_id: String,
}

///
/// IndexRange
///
/// Lazy, ascending scan over index entries. Each item is checked: the key
/// must parse and the stored value must equal the key's primary-id suffix.
///

pub struct IndexRange<'a> {
    inner: KvRange<'a>,
}

impl<'a> IndexRange<'a> {
    fn open<S: KvStore + ?Sized>(store: &'a S, lo: &[u8], hi: &[u8]) -> Result<Self, InternalError> {
        let inner = store
            .range(lo, hi)
            .map_err(|err| InternalError::store("index range", err))?;

        Ok(Self { inner })
    }
}

impl Iterator for IndexRange<'_> {
    type Item = Result<IndexHit, InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (raw_key, raw_value) = match self.inner.next()? {
            Ok(entry) => entry,
            Err(err) => return Some(Err(InternalError::store("index range", err))),
        };

        Some(decode_hit(&raw_key, raw_value))
    }
}

fn decode_hit(raw_key: &[u8], raw_value: Vec<u8>) -> Result<IndexHit, InternalError> {
    let key = IndexKey::try_from_raw(raw_key)?;
    let primary_id = String::from_utf8(raw_value).map_err(|_| {
        InternalError::corruption(ErrorOrigin::Index, "index entry value is not UTF-8")
    })?;

    let parts = key.parts()?;
    if parts.primary_id != primary_id {
        return Err(InternalError::corruption(
            ErrorOrigin::Index,
            format!("index entry {key:?} points at '{primary_id}'"),
        ));
    }

    Ok(IndexHit { key, primary_id })
}
