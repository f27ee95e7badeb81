//! String-argument contract surface.
//!
//! Each collection is exposed as one contract with an `invoke` entrypoint
//! for writes and a `query` entrypoint for reads. Arguments arrive as an
//! ordered list of strings; query results are JSON bytes.

mod records;
mod requests;
mod response;

pub use records::RecordsContract;
pub use requests::RequestsContract;
pub use response::{RecordList, RequestList};

use crate::error::Error;
use kycdb_core::{
    error::{ErrorOrigin, InternalError},
    serialize::to_json,
};
use serde::Serialize;

// Destructure exactly `N` positional arguments.
fn expect_args<'a, const N: usize>(
    function: &str,
    args: &[&'a str],
) -> Result<[&'a str; N], Error> {
    <[&str; N]>::try_from(args).map_err(|_| {
        InternalError::invalid_argument(
            ErrorOrigin::Interface,
            format!("{function} expects {N} argument(s), got {}", args.len()),
        )
        .into()
    })
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, Error> {
    to_json(value).map_err(|err| InternalError::from(err).into())
}

fn unknown_function(function: &str) -> Error {
    InternalError::unknown_function(function).into()
}

///
/// TESTS
///
