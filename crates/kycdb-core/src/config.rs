//! Index configuration.
//!
//! The `{tag → key family}` mapping and the date width are injected into the
//! stores instead of being spread through call sites as literals. The
//! defaults reproduce the legacy layout (`id`/`name`/`date` for records,
//! `by`/`for`/`date` for requests, 14-digit dates).

use crate::{
    DEFAULT_DATE_WIDTH,
    entity::IndexField,
    error::InternalError,
    index::{IndexFamily, IndexSet},
    key::{DateFormat, KEY_SEPARATOR},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Longest accepted index tag.
pub const MAX_TAG_BYTES: usize = 32;

/// Widest accepted date format.
pub const MAX_DATE_WIDTH: usize = 32;

///
/// IndexConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    pub date_width: usize,
    pub record: RecordIndexTags,
    pub request: RequestIndexTags,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            date_width: DEFAULT_DATE_WIDTH,
            record: RecordIndexTags::default(),
            request: RequestIndexTags::default(),
        }
    }
}

///
/// RecordIndexTags
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecordIndexTags {
    pub cust_id: String,
    pub cust_name: String,
    pub date_modified: String,
}

impl Default for RecordIndexTags {
    fn default() -> Self {
        Self {
            cust_id: "id".to_string(),
            cust_name: "name".to_string(),
            date_modified: "date".to_string(),
        }
    }
}

///
/// RequestIndexTags
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestIndexTags {
    pub req_by: String,
    pub rec_owner: String,
    pub date_modified: String,
}

impl Default for RequestIndexTags {
    fn default() -> Self {
        Self {
            req_by: "by".to_string(),
            rec_owner: "for".to_string(),
            date_modified: "date".to_string(),
        }
    }
}

impl IndexConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(source: &str) -> Result<Self, InternalError> {
        let config: Self = toml::from_str(source)
            .map_err(|err| InternalError::config(format!("index config parse failed: {err}")))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), InternalError> {
        if self.date_width == 0 || self.date_width > MAX_DATE_WIDTH {
            return Err(InternalError::config(format!(
                "date_width must be within 1..={MAX_DATE_WIDTH}, got {}",
                self.date_width
            )));
        }

        validate_tags(
            "record",
            &[
                &self.record.cust_id,
                &self.record.cust_name,
                &self.record.date_modified,
            ],
        )?;
        validate_tags(
            "request",
            &[
                &self.request.req_by,
                &self.request.rec_owner,
                &self.request.date_modified,
            ],
        )
    }

    #[must_use]
    pub const fn date_format(&self) -> DateFormat {
        DateFormat::new(self.date_width)
    }

    /// Index families of the record collection.
    #[must_use]
    pub fn record_indexes(&self) -> IndexSet {
        IndexSet::new(
            vec![
                IndexFamily::new(&self.record.cust_id, IndexField::CustId),
                IndexFamily::new(&self.record.cust_name, IndexField::CustName),
                IndexFamily::new(&self.record.date_modified, IndexField::DateModified),
            ],
            self.date_format(),
        )
    }

    /// Index families of the request collection.
    #[must_use]
    pub fn request_indexes(&self) -> IndexSet {
        IndexSet::new(
            vec![
                IndexFamily::new(&self.request.req_by, IndexField::ReqBy),
                IndexFamily::new(&self.request.rec_owner, IndexField::RecOwner),
                IndexFamily::new(&self.request.date_modified, IndexField::DateModified),
            ],
            self.date_format(),
        )
    }
}

// Tags must be distinct within a collection and must start with a printable
// byte so they never overlap the reserved row and marker regions.
fn validate_tags(collection: &str, tags: &[&String]) -> Result<(), InternalError> {
    let mut seen = BTreeSet::new();

    for tag in tags {
        let Some(first) = tag.bytes().next() else {
            return Err(InternalError::config(format!(
                "{collection} index tag must not be empty"
            )));
        };
        if first < 0x20 || tag.as_bytes().contains(&KEY_SEPARATOR) {
            return Err(InternalError::config(format!(
                "{collection} index tag '{}' contains reserved bytes",
                tag.escape_debug()
            )));
        }
        if tag.len() > MAX_TAG_BYTES {
            return Err(InternalError::config(format!(
                "{collection} index tag '{tag}' exceeds {MAX_TAG_BYTES} bytes"
            )));
        }
        if !seen.insert(tag.as_str()) {
            return Err(InternalError::config(format!(
                "{collection} index tag '{tag}' is used twice"
            )));
        }
    }

    Ok(())
}

///
/// TESTS
///
