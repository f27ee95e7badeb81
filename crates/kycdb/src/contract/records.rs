use crate::{
    contract::{RecordList, encode, expect_args, unknown_function},
    error::Error,
};
use kycdb_core::{
    config::IndexConfig,
    error::InternalError,
    kv::KvStore,
    record::{NewRecord, RecordStore},
};

///
/// RecordsContract
///
/// | function                       | args                                                    |
/// |--------------------------------|---------------------------------------------------------|
/// | `addRec`                       | custId, custName, recOwner, encFor, encData, dateCreated |
/// | `updateRec`                    | recId, encData, dateModified                            |
/// | `getRec` / `recId`             | recId                                                   |
/// | `newRecs`                      | date                                                    |
/// | `searchRecIndex` / `searchIndex` | value, tag                                            |
///

pub struct RecordsContract<S> {
    records: RecordStore<S>,
}

impl<S: KvStore> RecordsContract<S> {
    pub fn new(store: S, config: &IndexConfig) -> Result<Self, Error> {
        Ok(Self {
            records: RecordStore::new(store, config)?,
        })
    }

    #[must_use]
    pub const fn from_records(records: RecordStore<S>) -> Self {
        Self { records }
    }

    /// The backing store, for cross-contract calls and diagnostics.
    pub const fn records(&mut self) -> &mut RecordStore<S> {
        &mut self.records
    }

    pub fn invoke(&mut self, function: &str, args: &[&str]) -> Result<(), Error> {
        tracing::debug!(function, args = args.len(), "records invoke");

        match function {
            "addRec" => {
                let [cust_id, cust_name, rec_owner, enc_for, enc_data, date_created] =
                    expect_args(function, args)?;
                self.records.add_record(NewRecord {
                    cust_id: cust_id.to_string(),
                    cust_name: cust_name.to_string(),
                    rec_owner: rec_owner.to_string(),
                    enc_for: enc_for.to_string(),
                    enc_data: enc_data.to_string(),
                    date_created: date_created.to_string(),
                })?;

                Ok(())
            }

            "updateRec" => {
                let [rec_id, enc_data, date_modified] = expect_args(function, args)?;
                self.records
                    .update_record(rec_id, enc_data, date_modified)?;

                Ok(())
            }

            _ => Err(unknown_function(function)),
        }
    }

    pub fn query(&mut self, function: &str, args: &[&str]) -> Result<Vec<u8>, Error> {
        tracing::debug!(function, args = args.len(), "records query");

        match function {
            "getRec" | "recId" => {
                let [rec_id] = expect_args(function, args)?;
                let record = self.records.get_record(rec_id)?;

                encode(&record)
            }

            "newRecs" => {
                let [date] = expect_args(function, args)?;
                let list = self
                    .records
                    .get_records_modified_on_or_after(date)?
                    .collect::<Result<RecordList, InternalError>>()?;

                encode(&list)
            }

            "searchRecIndex" | "searchIndex" => {
                let [value, tag] = expect_args(function, args)?;
                let list = self
                    .records
                    .search_by_index(tag, value)?
                    .collect::<Result<RecordList, InternalError>>()?;

                encode(&list)
            }

            _ => Err(unknown_function(function)),
        }
    }
}
