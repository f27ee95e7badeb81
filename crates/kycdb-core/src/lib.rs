//! Core runtime for kycdb: the ordered key-value seam, composite-key
//! secondary indexes, the commit-marker protocol, and the record/request
//! stores with the access-granting workflow that spans them.
#![warn(unreachable_pub)]

pub mod access;
pub mod commit;
pub mod config;
pub mod entity;
pub mod error;
pub mod index;
pub mod key;
pub mod kv;
pub mod obs;
pub mod record;
pub mod request;
pub mod serialize;
pub mod store;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Default width of the fixed-width, lexicographically sortable date format
/// (`YYYYMMDDhhmmss`).
pub const DEFAULT_DATE_WIDTH: usize = 14;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, stores, serializers, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        entity::{EntityKind, IndexField},
        record::{NewRecord, Record},
        request::{Request, RequestStatus},
    };
}
