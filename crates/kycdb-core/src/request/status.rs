use crate::error::{ErrorOrigin, InternalError};
use candid::CandidType;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

const ACCESS_GIVEN_PREFIX: &str = "Access Given on ";

///
/// RequestStatus
///
/// Persisted and exchanged as its display string: `"Pending"` or
/// `"Access Given on <date>"`.
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum RequestStatus {
    Pending,
    AccessGiven { on: String },
}

impl RequestStatus {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::AccessGiven { on } => write!(f, "{ACCESS_GIVEN_PREFIX}{on}"),
        }
    }
}

impl FromStr for RequestStatus {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "Pending" {
            return Ok(Self::Pending);
        }

        match s.strip_prefix(ACCESS_GIVEN_PREFIX) {
            Some(on) if !on.is_empty() => Ok(Self::AccessGiven { on: on.to_string() }),
            _ => Err(InternalError::invalid_argument(
                ErrorOrigin::Request,
                format!("unrecognised request status '{s}'"),
            )),
        }
    }
}

impl TryFrom<String> for RequestStatus {
    type Error = InternalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RequestStatus> for String {
    fn from(status: RequestStatus) -> Self {
        status.to_string()
    }
}

///
/// TESTS
///
