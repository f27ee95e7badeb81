use crate::kv::KvError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable classification.
/// Every failure in the core surfaces as one of these; nothing is retried
/// internally and nothing is swallowed.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Attach structured detail to an existing error.
    #[must_use]
    pub fn with_detail(mut self, detail: ErrorDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Point lookup on an absent primary key.
    pub fn not_found(origin: ErrorOrigin, entity: &str, id: impl Into<String>) -> Self {
        let id = id.into();

        Self::new(
            ErrorClass::NotFound,
            origin,
            format!("no {entity} with id '{id}'"),
        )
    }

    /// Duplicate primary key on create.
    pub fn already_exists(origin: ErrorOrigin, entity: &str, id: impl Into<String>) -> Self {
        let id = id.into();

        Self::new(
            ErrorClass::AlreadyExists,
            origin,
            format!("{entity} '{id}' already exists"),
        )
    }

    /// Unrecognized search tag.
    pub fn unknown_index(origin: ErrorOrigin, tag: &str) -> Self {
        Self::new(
            ErrorClass::UnknownIndex,
            origin,
            format!("no such index to search: '{tag}'"),
        )
    }

    /// A secondary-index write or delete failed in the host store.
    pub(crate) fn index_write(action: &str, err: KvError) -> Self {
        Self::new(
            ErrorClass::IndexWrite,
            ErrorOrigin::Index,
            format!("index {action} failed: {err}"),
        )
        .with_detail(ErrorDetail::Store(err))
    }

    /// A primary-row or marker operation failed in the host store.
    pub(crate) fn store(action: &str, err: KvError) -> Self {
        Self::new(
            ErrorClass::Store,
            ErrorOrigin::Store,
            format!("store {action} failed: {err}"),
        )
        .with_detail(ErrorDetail::Store(err))
    }

    /// Wrap a failed cross-collection read.
    pub fn upstream_lookup(id: &str, source: &Self) -> Self {
        Self::new(
            ErrorClass::UpstreamLookup,
            ErrorOrigin::Access,
            format!("record lookup for '{id}' failed: {}", source.display_with_class()),
        )
        .with_detail(ErrorDetail::Upstream {
            class: source.class,
            origin: source.origin,
        })
    }

    /// Caller is not the owner of the record it is trying to grant.
    pub fn not_authorized(caller: &str, rec_id: &str) -> Self {
        Self::new(
            ErrorClass::NotAuthorized,
            ErrorOrigin::Access,
            format!("caller '{caller}' is not the owner of record '{rec_id}'"),
        )
    }

    /// Construct a corruption error for a specific origin.
    pub(crate) fn corruption(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, origin, message.into())
    }

    /// Construct an invalid-argument error for a specific origin.
    pub fn invalid_argument(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidArgument, origin, message.into())
    }

    /// Construct an interface-origin unknown-function error.
    pub fn unknown_function(function: &str) -> Self {
        Self::new(
            ErrorClass::UnknownFunction,
            ErrorOrigin::Interface,
            format!("function call not recognised: '{function}'"),
        )
    }

    /// Construct a config-origin error.
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Config, ErrorOrigin::Config, message.into())
    }

    /// Construct a commit-origin invariant violation.
    pub(crate) fn commit_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Commit, message.into())
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self.class, ErrorClass::AlreadyExists)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Store(KvError),

    #[error("upstream {origin}:{class}")]
    Upstream {
        class: ErrorClass,
        origin: ErrorOrigin,
    },
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    NotFound,
    AlreadyExists,
    UnknownIndex,
    IndexWrite,
    UpstreamLookup,
    NotAuthorized,
    Serialization,
    InvalidArgument,
    UnknownFunction,
    Corruption,
    Store,
    Config,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::UnknownIndex => "unknown_index",
            Self::IndexWrite => "index_write",
            Self::UpstreamLookup => "upstream_lookup",
            Self::NotAuthorized => "not_authorized",
            Self::Serialization => "serialization",
            Self::InvalidArgument => "invalid_argument",
            Self::UnknownFunction => "unknown_function",
            Self::Corruption => "corruption",
            Self::Store => "store",
            Self::Config => "config",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Store,
    Index,
    Commit,
    Record,
    Request,
    Access,
    Serialize,
    Config,
    Interface,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Store => "store",
            Self::Index => "index",
            Self::Commit => "commit",
            Self::Record => "record",
            Self::Request => "request",
            Self::Access => "access",
            Self::Serialize => "serialize",
            Self::Config => "config",
            Self::Interface => "interface",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///
