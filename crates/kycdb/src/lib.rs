//! ## Crate layout
//! - `core`: key layout, index manager, commit protocol, record/request
//!   stores and the access workflow.
//! - `contract`: string-argument `invoke` / `query` surface per collection,
//!   with JSON results.
//! - `error`: public error type with a stable kind + origin taxonomy.
//!
//! The `prelude` module carries what host glue code needs to wire a store
//! into the two contracts.

pub use kycdb_core as core;

pub mod contract;
pub mod error;

pub use error::Error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Host Prelude
///

pub mod prelude {
    pub use crate::{
        contract::{RecordList, RecordsContract, RequestList, RequestsContract},
        core::{
            access::{RecordReader as _, RecordWriter as _},
            config::IndexConfig,
            kv::{KvStore, MemoryKvStore, StableKvStore},
            prelude::*,
        },
        error::{Error, ErrorKind, ErrorOrigin},
    };
    pub use candid::CandidType;
    pub use serde::{Deserialize, Serialize};
}
