//! Records: consent-protected customer data, keyed by
//! `recId = custId ∥ recOwner ∥ encFor`.

#[cfg(test)]
mod tests;

use crate::{
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
/// Record
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub rec_id: String,
    pub cust_id: String,
    pub cust_name: String,
    pub rec_owner: String,
    pub enc_for: String,
    pub enc_data: String,
    pub date_created: String,
    pub date_modified: String,
}

impl EntityKind for Record {
    const ENTITY_NAME: &'static str = "record";
    const ORIGIN: ErrorOrigin = ErrorOrigin::Record;

    fn primary_id(&self) -> &str {
        &self.rec_id
    }

    fn field_value(&self, field: IndexField) -> Option<&str> {
        match field {
            IndexField::CustId => Some(&self.cust_id),
            IndexField::CustName => Some(&self.cust_name),
            IndexField::RecOwner => Some(&self.rec_owner),
            IndexField::DateModified => Some(&self.date_modified),
            IndexField::ReqBy => None,
        }
    }
}

///
/// NewRecord
///
/// Caller-supplied fields of a record about to be created.
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub cust_id: String,
    pub cust_name: String,
    pub rec_owner: String,
    pub enc_for: String,
    pub enc_data: String,
    pub date_created: String,
}

impl NewRecord {
    /// Plain concatenation, so distinct triples can collide
    /// (`"ab" ∥ "c"` and `"a" ∥ "bc"`).
    #[must_use]
    pub fn rec_id(&self) -> String {
        [
            self.cust_id.as_str(),
            self.rec_owner.as_str(),
            self.enc_for.as_str(),
        ]
        .concat()
    }

    fn into_record(self) -> Record {
        Record {
            rec_id: self.rec_id(),
            date_modified: self.date_created.clone(),
            cust_id: self.cust_id,
            cust_name: self.cust_name,
            rec_owner: self.rec_owner,
            enc_for: self.enc_for,
            enc_data: self.enc_data,
            date_created: self.date_created,
        }
    }
}

///
/// RecordStore
///

pub struct RecordStore<S> {
    rows: Collection<Record, S>,
}

impl<S: KvStore> RecordStore<S> {
    /// Open the collection over `store`. The config is validated first so no
    /// tag can place index entries in the reserved key regions.
    pub fn new(store: S, config: &IndexConfig) -> Result<Self, InternalError> {
        config.validate()?;

        Ok(Self {
            rows: Collection::new(store, config.record_indexes()),
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

    /// Create a record and its three index entries; returns the new `recId`.
    pub fn add_record(&mut self, new: NewRecord) -> Result<String, InternalError> {
        self.date_format()
            .validate(ErrorOrigin::Record, "dateCreated", &new.date_created)?;
        let record = new.into_record();
        if record.rec_id.is_empty() {
            return Err(InternalError::invalid_argument(
                ErrorOrigin::Record,
                "recId must not be empty",
            ));
        }

        self.rows.insert(&record)?;
        tracing::info!(rec_id = %record.rec_id, "record added");

        Ok(record.rec_id)
    }

    /// Replace `encData`, bump `dateModified` and re-key the date entry.
    pub fn update_record(
        &mut self,
        rec_id: &str,
        enc_data: &str,
        date_modified: &str,
    ) -> Result<(), InternalError> {
        self.date_format()
            .validate(ErrorOrigin::Record, "dateModified", date_modified)?;

        let before = self.rows.get(rec_id)?;
        let after = Record {
            enc_data: enc_data.to_string(),
            date_modified: date_modified.to_string(),
            ..before.clone()
        };

        self.rows.replace(&before, &after)
    }

    pub fn get_record(&mut self, rec_id: &str) -> Result<Record, InternalError> {
        self.rows.get(rec_id)
    }

    /// Prefix search on one of the record index families.
    pub fn search_by_index(
        &mut self,
        tag: &str,
        value: &str,
    ) -> Result<EntityScan<'_, Record, S>, InternalError> {
        self.rows.search(tag, value)
    }

    pub fn get_records_modified_on_or_after(
        &mut self,
        date: &str,
    ) -> Result<EntityScan<'_, Record, S>, InternalError> {
        self.rows.modified_since(date)
    }

    /// Index keys the stored record should currently have.
    pub fn index_entries(&mut self, rec_id: &str) -> Result<Vec<IndexKey>, InternalError> {
        let record = self.rows.get(rec_id)?;

        self.rows.expected_index_keys(&record)
    }

    pub fn verify_indexes(&mut self) -> Result<ConsistencyReport, InternalError> {
        self.rows.verify_indexes()
    }
}
