use candid::CandidType;
use kycdb_core::{record::Record, request::Request};
use serde::{Deserialize, Serialize};

///
/// RecordList
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordList {
    pub num_entries: u64,
    pub records: Vec<Record>,
}

impl FromIterator<Record> for RecordList {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let records: Vec<_> = iter.into_iter().collect();

        Self {
            num_entries: records.len() as u64,
            records,
        }
    }
}

///
/// RequestList
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestList {
    pub num_entries: u64,
    pub requests: Vec<Request>,
}

impl FromIterator<Request> for RequestList {
    fn from_iter<I: IntoIterator<Item = Request>>(iter: I) -> Self {
        let requests: Vec<_> = iter.into_iter().collect();

        Self {
            num_entries: requests.len() as u64,
            requests,
        }
    }
}
