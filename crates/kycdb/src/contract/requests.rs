use crate::{
    contract::{RequestList, encode, expect_args, unknown_function},
    error::Error,
};
use kycdb_core::{
    access::{AccessWorkflow, RecordWriter},
    config::IndexConfig,
    error::InternalError,
    kv::KvStore,
    request::RequestStore,
};

///
/// RequestsContract
///
/// | function                       | args                          |
/// |--------------------------------|-------------------------------|
/// | `addReq`                       | recId, reqBy, dateCreated     |
/// | `giveAccess`                   | reqId, encData, dateModified  |
/// | `getReq` / `reqId`             | reqId                         |
/// | `newReqs`                      | date                          |
/// | `searchReqIndex` / `searchIndex` | value, tag                  |
///
/// Writes reach the record collection through the `records` capability
/// passed to [`RequestsContract::invoke`].
///

pub struct RequestsContract<S> {
    requests: RequestStore<S>,
}

impl<S: KvStore> RequestsContract<S> {
    pub fn new(store: S, config: &IndexConfig) -> Result<Self, Error> {
        Ok(Self {
            requests: RequestStore::new(store, config)?,
        })
    }

    #[must_use]
    pub const fn from_requests(requests: RequestStore<S>) -> Self {
        Self { requests }
    }

    pub const fn requests(&mut self) -> &mut RequestStore<S> {
        &mut self.requests
    }

    /// `caller` is the host-authenticated identity of the invoker.
    pub fn invoke<W>(
        &mut self,
        records: &mut W,
        caller: &str,
        function: &str,
        args: &[&str],
    ) -> Result<(), Error>
    where
        W: RecordWriter + ?Sized,
    {
        tracing::debug!(function, caller, args = args.len(), "requests invoke");

        match function {
            "addReq" => {
                let [rec_id, req_by, date_created] = expect_args(function, args)?;
                self.requests
                    .add_request(records, rec_id, req_by, date_created)?;

                Ok(())
            }

            "giveAccess" => {
                let [req_id, enc_data, date_modified] = expect_args(function, args)?;
                AccessWorkflow::new(&mut self.requests, records).grant_access(
                    caller,
                    req_id,
                    enc_data,
                    date_modified,
                )?;

                Ok(())
            }

            _ => Err(unknown_function(function)),
        }
    }

    pub fn query(&mut self, function: &str, args: &[&str]) -> Result<Vec<u8>, Error> {
        tracing::debug!(function, args = args.len(), "requests query");

        match function {
            "getReq" | "reqId" => {
                let [req_id] = expect_args(function, args)?;
                let request = self.requests.get_request(req_id)?;

                encode(&request)
            }

            "newReqs" => {
                let [date] = expect_args(function, args)?;
                let list = self
                    .requests
                    .get_requests_modified_on_or_after(date)?
                    .collect::<Result<RequestList, InternalError>>()?;

                encode(&list)
            }

            "searchReqIndex" | "searchIndex" => {
                let [value, tag] = expect_args(function, args)?;
                let list = self
                    .requests
                    .search_by_index(tag, value)?
                    .collect::<Result<RequestList, InternalError>>()?;

                encode(&list)
            }

            _ => Err(unknown_function(function)),
        }
    }
}
