//! Raw key layout for everything the core writes into the host store.
//!
//! Keyspace:
//! - `0x00 "commit"`                      commit marker (one slot)
//! - `0x01 ∥ primaryId`                   primary rows
//! - `tag ∥ 0x00 ∥ value ∥ 0x00 ∥ primaryId`  index entries
//!
//! Tags start with a printable byte, so the three regions never overlap.
//! Components must not contain `0x00`; that keeps "by value, then by
//! primary id" ordering intact and rules out spurious prefix matches where
//! the tail of one value runs into the head of an id.

use crate::error::{ErrorOrigin, InternalError};
use derive_more::Deref;
use std::fmt;

/// Separator between composite-key components.
pub const KEY_SEPARATOR: u8 = 0x00;

/// Leading byte of every primary-row key.
pub const ROW_PREFIX: u8 = 0x01;

/// Byte that exceeds any valid suffix. `0xFF` never occurs in UTF-8 text.
pub const HIGH_SENTINEL: u8 = 0xFF;

/// Reserved slot for the in-flight commit marker.
pub const COMMIT_MARKER_KEY: &[u8] = b"\x00commit";

// Reject a component that would break composite-key framing.
fn check_component(origin: ErrorOrigin, label: &str, value: &str) -> Result<(), InternalError> {
    if value.as_bytes().contains(&KEY_SEPARATOR) {
        return Err(InternalError::invalid_argument(
            origin,
            format!("{label} must not contain NUL bytes"),
        ));
    }

    Ok(())
}

///
/// DataKey
///
/// Store key of one primary row.
///

#[derive(Clone, Debug, Deref, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DataKey(Vec<u8>);

impl DataKey {
    pub fn new(primary_id: &str) -> Result<Self, InternalError> {
        check_component(ErrorOrigin::Store, "primary id", primary_id)?;

        let mut bytes = Vec::with_capacity(primary_id.len() + 1);
        bytes.push(ROW_PREFIX);
        bytes.extend_from_slice(primary_id.as_bytes());

        Ok(Self(bytes))
    }

    /// Validate raw bytes read back from the store or a commit marker.
    pub fn try_from_raw(bytes: &[u8]) -> Result<Self, InternalError> {
        match bytes.split_first() {
            Some((&ROW_PREFIX, rest))
                if !rest.contains(&KEY_SEPARATOR) && std::str::from_utf8(rest).is_ok() =>
            {
                Ok(Self(bytes.to_vec()))
            }
            _ => Err(InternalError::corruption(
                ErrorOrigin::Store,
                "data key corrupted: bad prefix or payload",
            )),
        }
    }

    /// Bounds covering every primary row.
    #[must_use]
    pub fn all_rows_bounds() -> (Vec<u8>, Vec<u8>) {
        (vec![ROW_PREFIX], vec![ROW_PREFIX + 1])
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn primary_id(&self) -> &str {
        // Constructed from &str or validated in try_from_raw.
        std::str::from_utf8(&self.0[1..]).unwrap_or_default()
    }
}

///
/// IndexKey
///
/// Composite index key: `tag ∥ 0x00 ∥ value ∥ 0x00 ∥ primaryId`.
/// Ordering of this type matches byte-level ordering.
///

#[derive(Clone, Deref, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct IndexKey(Vec<u8>);

impl IndexKey {
    pub fn build(tag: &str, value: &str, primary_id: &str) -> Result<Self, InternalError> {
        check_component(ErrorOrigin::Index, "index tag", tag)?;
        check_component(ErrorOrigin::Index, "indexed value", value)?;
        check_component(ErrorOrigin::Index, "primary id", primary_id)?;

        let mut bytes = Vec::with_capacity(tag.len() + value.len() + primary_id.len() + 2);
        bytes.extend_from_slice(tag.as_bytes());
        bytes.push(KEY_SEPARATOR);
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(KEY_SEPARATOR);
        bytes.extend_from_slice(primary_id.as_bytes());

        Ok(Self(bytes))
    }

    /// Validate raw bytes read back from the store or a commit marker.
    pub fn try_from_raw(bytes: &[u8]) -> Result<Self, InternalError> {
        let key = Self(bytes.to_vec());
        key.parts()?;

        Ok(key)
    }

    /// Split the key into `(tag, value, primary_id)`.
    pub fn parts(&self) -> Result<IndexKeyParts<'_>, InternalError> {
        let corrupt = || InternalError::corruption(ErrorOrigin::Index, "index key corrupted");

        let text = std::str::from_utf8(&self.0).map_err(|_| corrupt())?;
        let mut split = text.split('\0');
        let (Some(tag), Some(value), Some(primary_id), None) =
            (split.next(), split.next(), split.next(), split.next())
        else {
            return Err(corrupt());
        };
        if tag.is_empty() || primary_id.is_empty() {
            return Err(corrupt());
        }

        Ok(IndexKeyParts {
            tag,
            value,
            primary_id,
        })
    }

    /// Bounds for every entry of `tag` whose value starts with `value`.
    pub fn prefix_bounds(tag: &str, value: &str) -> Result<(Vec<u8>, Vec<u8>), InternalError> {
        check_component(ErrorOrigin::Index, "index tag", tag)?;
        check_component(ErrorOrigin::Index, "search value", value)?;

        let lo = family_prefix(tag, value.as_bytes());
        let mut hi = lo.clone();
        hi.push(HIGH_SENTINEL);

        Ok((lo, hi))
    }

    /// Bounds for every entry of the date family `tag` on or after `from`.
    pub fn date_bounds(
        tag: &str,
        from: &str,
        format: DateFormat,
    ) -> Result<(Vec<u8>, Vec<u8>), InternalError> {
        check_component(ErrorOrigin::Index, "index tag", tag)?;
        format.validate_bound(ErrorOrigin::Index, from)?;

        let lo = family_prefix(tag, from.as_bytes());
        let mut hi = family_prefix(tag, format.sentinel().as_bytes());
        hi.push(HIGH_SENTINEL);

        Ok((lo, hi))
    }

    /// Bounds covering the whole family `tag`.
    #[must_use]
    pub fn family_bounds(tag: &str) -> (Vec<u8>, Vec<u8>) {
        let lo = family_prefix(tag, &[]);
        let mut hi = tag.as_bytes().to_vec();
        hi.push(KEY_SEPARATOR + 1);

        (lo, hi)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexKey({:?})", String::from_utf8_lossy(&self.0))
    }
}

fn family_prefix(tag: &str, value: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(tag.len() + value.len() + 1);
    bytes.extend_from_slice(tag.as_bytes());
    bytes.push(KEY_SEPARATOR);
    bytes.extend_from_slice(value);

    bytes
}

///
/// IndexKeyParts
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IndexKeyParts<'a> {
    pub tag: &'a str,
    pub value: &'a str,
    pub primary_id: &'a str,
}

///
/// DateFormat
///
/// Fixed-width, digit-only, lexicographically sortable dates
/// (`YYYYMMDDhhmmss` at the default width). The range upper bound is the
/// all-9s string of the same width, so it must be re-derived whenever the
/// width changes.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DateFormat {
    width: usize,
}

impl DateFormat {
    #[must_use]
    pub const fn new(width: usize) -> Self {
        Self { width }
    }

    #[must_use]
    pub const fn width(self) -> usize {
        self.width
    }

    /// Upper sentinel: `width` copies of the maximal digit.
    #[must_use]
    pub fn sentinel(self) -> String {
        "9".repeat(self.width)
    }

    /// Entity dates must be exactly `width` ASCII digits.
    pub fn validate(self, origin: ErrorOrigin, label: &str, date: &str) -> Result<(), InternalError> {
        if date.len() != self.width || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InternalError::invalid_argument(
                origin,
                format!(
                    "{label} '{date}' must be exactly {} ASCII digits",
                    self.width
                ),
            ));
        }

        Ok(())
    }

    /// Range lower bounds may be any digit prefix of at most `width` digits.
    pub fn validate_bound(self, origin: ErrorOrigin, date: &str) -> Result<(), InternalError> {
        if date.len() > self.width || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InternalError::invalid_argument(
                origin,
                format!(
                    "date bound '{date}' must be at most {} ASCII digits",
                    self.width
                ),
            ));
        }

        Ok(())
    }
}

///
/// TESTS
///
