//! Granting access: the one workflow that writes across both collections.
//!
//! The request collection never reaches into record storage directly. It
//! reads and writes records only through [`RecordReader`] and
//! [`RecordWriter`], which the record store implements and tests can stub.

#[cfg(test)]
mod tests;

use crate::{
    error::{ErrorOrigin, InternalError},
    kv::KvStore,
    obs::sink::{MetricsEvent, record},
    record::{NewRecord, Record, RecordStore},
    request::{RequestStatus, RequestStore},
};

///
/// RecordReader
///

pub trait RecordReader {
    fn read_record(&mut self, rec_id: &str) -> Result<Record, InternalError>;
}

///
/// RecordWriter
///

pub trait RecordWriter: RecordReader {
    /// Create a record; `AlreadyExists` when its `recId` is taken.
    fn write_record(&mut self, new: NewRecord) -> Result<String, InternalError>;
}

impl<S: KvStore> RecordReader for RecordStore<S> {
    fn read_record(&mut self, rec_id: &str) -> Result<Record, InternalError> {
        self.get_record(rec_id)
    }
}

impl<S: KvStore> RecordWriter for RecordStore<S> {
    fn write_record(&mut self, new: NewRecord) -> Result<String, InternalError> {
        self.add_record(new)
    }
}

///
/// GrantOutcome
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GrantOutcome {
    /// The re-encrypted record was created by this call.
    Granted { rec_id: String },

    /// The record already existed from an earlier attempt; only the request
    /// transition ran.
    Resumed { rec_id: String },
}

impl GrantOutcome {
    #[must_use]
    pub fn rec_id(&self) -> &str {
        match self {
            Self::Granted { rec_id } | Self::Resumed { rec_id } => rec_id,
        }
    }
}

///
/// AccessWorkflow
///

pub struct AccessWorkflow<'a, S, W: ?Sized> {
    requests: &'a mut RequestStore<S>,
    records: &'a mut W,
}

impl<'a, S, W> AccessWorkflow<'a, S, W>
where
    S: KvStore,
    W: RecordWriter + ?Sized,
{
    pub const fn new(requests: &'a mut RequestStore<S>, records: &'a mut W) -> Self {
        Self { requests, records }
    }

    /// Give the requester a copy of the record encrypted for them, then mark
    /// the request as granted.
    ///
    /// `caller` is the authenticated identity of the invoker, supplied by the
    /// host. Only the record owner may grant. Re-running after a partial
    /// failure resumes instead of failing on the already-created copy.
    pub fn grant_access(
        &mut self,
        caller: &str,
        req_id: &str,
        enc_data: &str,
        date_modified: &str,
    ) -> Result<GrantOutcome, InternalError> {
        self.requests
            .date_format()
            .validate(ErrorOrigin::Access, "dateModified", date_modified)?;

        let request = self.requests.get_request(req_id)?;

        let source = self
            .records
            .read_record(&request.rec_id)
            .map_err(|err| InternalError::upstream_lookup(&request.rec_id, &err))?;

        if caller != source.rec_owner {
            record(MetricsEvent::AccessDenied);
            tracing::warn!(caller, req_id, rec_id = %source.rec_id, "access grant denied");

            return Err(InternalError::not_authorized(caller, &source.rec_id));
        }

        let copy = NewRecord {
            cust_id: source.cust_id,
            cust_name: source.cust_name,
            rec_owner: request.rec_owner,
            enc_for: request.req_by,
            enc_data: enc_data.to_string(),
            date_created: date_modified.to_string(),
        };
        let rec_id = copy.rec_id();

        let outcome = match self.records.write_record(copy) {
            Ok(rec_id) => GrantOutcome::Granted { rec_id },
            Err(err) if err.is_already_exists() => {
                tracing::info!(req_id, %rec_id, "granted record already present; resuming");
                GrantOutcome::Resumed { rec_id }
            }
            Err(err) => return Err(err),
        };

        self.requests.transition(
            req_id,
            RequestStatus::AccessGiven {
                on: date_modified.to_string(),
            },
            date_modified,
        )?;

        record(MetricsEvent::AccessGranted {
            resumed: matches!(outcome, GrantOutcome::Resumed { .. }),
        });
        tracing::info!(req_id, rec_id = outcome.rec_id(), "access granted");

        Ok(outcome)
    }
}
