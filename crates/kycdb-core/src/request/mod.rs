//! Requests: a party asking for access to a record, keyed by
//! `reqId = recId ∥ reqBy ∥ dateCreated`.

mod status;

#[cfg(test)]
mod tests;

pub use status::RequestStatus;

use crate::{
    access::RecordReader,
    config::IndexConfig,
    entity::{EntityKind, IndexField},
    error::{ErrorOrigin, InternalError},
    key::{DateFormat, IndexKey},
    kv::KvStore,
    store::{Collection, ConsistencyReport, EntityScan},
};
use candid::CandidType;
use serde::{Deserialize, Serialize};

///
/// Request
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub req_id: String,
    pub rec_id: String,
    pub req_by: String,
    pub rec_owner: String,
    pub status: RequestStatus,
    pub date_created: String,
    pub date_modified: String,
}

impl EntityKind for Request {
    const ENTITY_NAME: &'static str = "request";
    const ORIGIN: ErrorOrigin = ErrorOrigin::Request;

    fn primary_id(&self) -> &str {
        &self.req_id
    }

    fn field_value(&self, field: IndexField) -> Option<&str> {
        match field {
            IndexField::ReqBy => Some(&self.req_by),
            IndexField::RecOwner => Some(&self.rec_owner),
            IndexField::DateModified => Some(&self.date_modified),
            IndexField::CustId | IndexField::CustName => None,
        }
    }
}

///
/// RequestStore
///

pub struct RequestStore<S> {
    rows: Collection<Request, S>,
}

impl<S: KvStore> RequestStore<S> {
    /// Open the collection over `store`. The config is validated first so no
    /// tag can place index entries in the reserved key regions.
    pub fn new(store: S, config: &IndexConfig) -> Result<Self, InternalError> {
        config.validate()?;

        Ok(Self {
            rows: Collection::new(store, config.request_indexes()),
        })
    }

    #[must_use]
    pub fn debug(self) -> Self {
        Self {
            rows: self.rows.debug(),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        self.rows.store()
    }

    #[cfg(test)]
    pub(crate) const fn store_mut(&mut self) -> &mut S {
        self.rows.store_mut()
    }

    pub fn into_store(self) -> S {
        self.rows.into_store()
    }

    #[must_use]
    pub const fn date_format(&self) -> DateFormat {
        self.rows.indexes().date_format()
    }

    /// Open a pending request against `rec_id`; returns the new `reqId`.
    ///
    /// `recOwner` is copied from the record, read through `records`.
    pub fn add_request<R>(
        &mut self,
        records: &mut R,
        rec_id: &str,
        req_by: &str,
        date_created: &str,
    ) -> Result<String, InternalError>
    where
        R: RecordReader + ?Sized,
    {
        self.date_format()
            .validate(ErrorOrigin::Request, "dateCreated", date_created)?;

        let record = records
            .read_record(rec_id)
            .map_err(|err| InternalError::upstream_lookup(rec_id, &err))?;

        let request = Request {
            req_id: [rec_id, req_by, date_created].concat(),
            rec_id: rec_id.to_string(),
            req_by: req_by.to_string(),
            rec_owner: record.rec_owner,
            status: RequestStatus::Pending,
            date_created: date_created.to_string(),
            date_modified: date_created.to_string(),
        };

        self.rows.insert(&request)?;
        tracing::info!(req_id = %request.req_id, rec_id, "request added");

        Ok(request.req_id)
    }

    pub fn get_request(&mut self, req_id: &str) -> Result<Request, InternalError> {
        self.rows.get(req_id)
    }

    /// Prefix search on one of the request index families.
    pub fn search_by_index(
        &mut self,
        tag: &str,
        value: &str,
    ) -> Result<EntityScan<'_, Request, S>, InternalError> {
        self.rows.search(tag, value)
    }

    pub fn get_requests_modified_on_or_after(
        &mut self,
        date: &str,
    ) -> Result<EntityScan<'_, Request, S>, InternalError> {
        self.rows.modified_since(date)
    }

    /// Move a request to `status`, bump `dateModified` and re-key the date
    /// entry.
    pub fn transition(
        &mut self,
        req_id: &str,
        status: RequestStatus,
        date_modified: &str,
    ) -> Result<Request, InternalError> {
        self.date_format()
            .validate(ErrorOrigin::Request, "dateModified", date_modified)?;

        let before = self.rows.get(req_id)?;
        let after = Request {
            status,
            date_modified: date_modified.to_string(),
            ..before.clone()
        };
        self.rows.replace(&before, &after)?;

        Ok(after)
    }

    /// Index keys the stored request should currently have.
    pub fn index_entries(&mut self, req_id: &str) -> Result<Vec<IndexKey>, InternalError> {
        let request = self.rows.get(req_id)?;

        self.rows.expected_index_keys(&request)
    }

    pub fn verify_indexes(&mut self) -> Result<ConsistencyReport, InternalError> {
        self.rows.verify_indexes()
    }
}
