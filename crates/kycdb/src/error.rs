use candid::CandidType;
use derive_more::Display;
use kycdb_core::error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(CandidType, Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(err.class.into(), err.origin.into(), err.message)
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers and canister interfaces.
///

#[derive(CandidType, Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    UnknownIndex,
    IndexWrite,
    UpstreamLookup,
    NotAuthorized,
    Serialization,
    InvalidArgument,
    UnknownFunction,

    /// Stored bytes could not be trusted.
    Corruption,

    /// The host store failed.
    Store,
    Config,

    /// The caller cannot remediate this.
    Internal,
}

impl From<ErrorClass> for ErrorKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::NotFound => Self::NotFound,
            ErrorClass::AlreadyExists => Self::AlreadyExists,
            ErrorClass::UnknownIndex => Self::UnknownIndex,
            ErrorClass::IndexWrite => Self::IndexWrite,
            ErrorClass::UpstreamLookup => Self::UpstreamLookup,
            ErrorClass::NotAuthorized => Self::NotAuthorized,
            ErrorClass::Serialization => Self::Serialization,
            ErrorClass::InvalidArgument => Self::InvalidArgument,
            ErrorClass::UnknownFunction => Self::UnknownFunction,
            ErrorClass::Corruption => Self::Corruption,
            ErrorClass::Store => Self::Store,
            ErrorClass::Config => Self::Config,
            ErrorClass::Internal => Self::Internal,
        }
    }
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers and canister interfaces.
///

#[derive(CandidType, Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Access,
    Commit,
    Config,
    Index,
    Interface,
    Record,
    Request,
    Serialize,
    Store,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Access => Self::Access,
            CoreErrorOrigin::Commit => Self::Commit,
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Index => Self::Index,
            CoreErrorOrigin::Interface => Self::Interface,
            CoreErrorOrigin::Record => Self::Record,
            CoreErrorOrigin::Request => Self::Request,
            CoreErrorOrigin::Serialize => Self::Serialize,
            CoreErrorOrigin::Store => Self::Store,
        }
    }
}
