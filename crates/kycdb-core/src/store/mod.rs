//! Generic entity collection over one host store.
//!
//! A collection owns its store exclusively: primary rows, index entries and
//! the commit marker of one entity kind live in one keyspace. Every public
//! operation first runs commit recovery, so reads never observe a
//! half-applied commit.

mod scan;


pub use scan::EntityScan;

use crate::{
    commit::{CommitBatch, commit, ensure_recovered},
    entity::EntityKind,
    error::InternalError,
    index::{IndexSet, range_by_tag_prefix, range_from_date, scan_family},
    key::{DataKey, IndexKey},
    kv::KvStore,
    obs::sink::{ExecKind, MetricsEvent, Span, record},
    serialize::{from_json, to_json},
};
use std::{collections::BTreeSet, marker::PhantomData};

///
/// ConsistencyReport
///
/// Result of comparing stored index entries with the entries the stored
/// rows imply.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConsistencyReport {
    pub rows: u64,
    pub entries: u64,

    /// Entries with no matching row value.
    pub orphaned: Vec<IndexKey>,

    /// Entries a row implies that are not stored.
    pub missing: Vec<IndexKey>,
}

impl ConsistencyReport {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.orphaned.is_empty() && self.missing.is_empty()
    }
}

///
/// Collection
///

pub struct Collection<E, S> {
    store: S,
    indexes: IndexSet,
    debug: bool,
    _marker: PhantomData<E>,
}

impl<E, S> Collection<E, S>
where
    E: EntityKind,
    S: KvStore,
{
    #[must_use]
    pub const fn new(store: S, indexes: IndexSet) -> Self {
        Self {
            store,
            indexes,
            debug: false,
            _marker: PhantomData,
        }
    }

    /// Enable per-operation diagnostics.
    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    #[must_use]
    pub const fn indexes(&self) -> &IndexSet {
        &self.indexes
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub(crate) const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Finish any commit a previous invocation left unfinished.
    pub fn recover(&mut self) -> Result<(), InternalError> {
        if ensure_recovered(&mut self.store)? && self.debug {
            tracing::debug!(entity = E::ENTITY_NAME, "recovered unfinished commit");
        }

        Ok(())
    }

    /// Point lookup; `None` when absent.
    pub fn load(&mut self, id: &str) -> Result<Option<E>, InternalError> {
        self.recover()?;
        let mut span = Span::new(ExecKind::Load, E::ENTITY_NAME);

        let entity = self.read_row(id)?;
        span.set_rows(u64::from(entity.is_some()));

        Ok(entity)
    }

    /// Point lookup; `NotFound` when absent.
    pub fn get(&mut self, id: &str) -> Result<E, InternalError> {
        self.load(id)?
            .ok_or_else(|| InternalError::not_found(E::ORIGIN, E::ENTITY_NAME, id))
    }

    /// Create a new entity with all of its index entries in one commit.
    pub fn insert(&mut self, entity: &E) -> Result<(), InternalError> {
        self.recover()?;
        let _span = Span::new(ExecKind::Save, E::ENTITY_NAME);

        let id = entity.primary_id();
        let data_key = DataKey::new(id)?;
        if self.row_exists(&data_key)? {
            record(MetricsEvent::DuplicateRejected {
                collection: E::ENTITY_NAME,
            });
            return Err(InternalError::already_exists(E::ORIGIN, E::ENTITY_NAME, id));
        }

        let mut batch = CommitBatch::new(format!("{}.insert", E::ENTITY_NAME));
        for key in self.expected_index_keys(entity)? {
            batch.put_index(&key, id);
        }
        batch.put_row(&data_key, to_json(entity)?);

        self.apply(batch, id)
    }

    /// Overwrite an existing entity. Only families whose value changed are
    /// re-keyed; the old entry is removed and the new one written in the
    /// same commit as the row.
    pub fn replace(&mut self, before: &E, after: &E) -> Result<(), InternalError> {
        let id = after.primary_id();
        if before.primary_id() != id {
            return Err(InternalError::invalid_argument(
                E::ORIGIN,
                format!(
                    "cannot replace {} '{}' with '{id}'",
                    E::ENTITY_NAME,
                    before.primary_id()
                ),
            ));
        }

        self.recover()?;
        let _span = Span::new(ExecKind::Save, E::ENTITY_NAME);

        let mut batch = CommitBatch::new(format!("{}.replace", E::ENTITY_NAME));
        for family in self.indexes.families() {
            let old = before.field_value(family.field());
            let new = after.field_value(family.field());
            if old == new {
                continue;
            }
            if let Some(old) = old {
                batch.remove_index(&IndexKey::build(family.tag(), old, id)?);
            }
            if let Some(new) = new {
                batch.put_index(&IndexKey::build(family.tag(), new, id)?, id);
            }
        }
        batch.put_row(&DataKey::new(id)?, to_json(after)?);

        self.apply(batch, id)
    }

    /// Entities whose `tag` value starts with `value`, ordered by value then
    /// primary id. An unknown tag fails before the store is touched.
    pub fn search(&mut self, tag: &str, value: &str) -> Result<EntityScan<'_, E, S>, InternalError> {
        let family = self.indexes.resolve(tag, E::ORIGIN)?.tag().to_string();
        self.recover()?;
        let span = Span::new(ExecKind::Search, E::ENTITY_NAME);

        if self.debug {
            tracing::debug!(entity = E::ENTITY_NAME, tag, value, "index search");
        }
        let hits = range_by_tag_prefix(&self.store, &family, value)?;

        Ok(EntityScan::new(&self.store, hits, span))
    }

    /// Entities modified on or after `from`, ordered by date then id.
    pub fn modified_since(&mut self, from: &str) -> Result<EntityScan<'_, E, S>, InternalError> {
        let format = self.indexes.date_format();
        format.validate_bound(E::ORIGIN, from)?;
        let family = self.indexes.date_family(E::ORIGIN)?.tag().to_string();
        self.recover()?;
        let span = Span::new(ExecKind::Search, E::ENTITY_NAME);

        if self.debug {
            tracing::debug!(entity = E::ENTITY_NAME, from, "date range scan");
        }
        let hits = range_from_date(&self.store, &family, from, format)?;

        Ok(EntityScan::new(&self.store, hits, span))
    }

    /// Index keys implied by the current field values of `entity`.
    pub fn expected_index_keys(&self, entity: &E) -> Result<Vec<IndexKey>, InternalError> {
        let id = entity.primary_id();

        self.indexes
            .families()
            .iter()
            .filter_map(|family| {
                entity
                    .field_value(family.field())
                    .map(|value| IndexKey::build(family.tag(), value, id))
            })
            .collect()
    }

    /// Compare every stored entry of every family with the entries the rows
    /// imply.
    pub fn verify_indexes(&mut self) -> Result<ConsistencyReport, InternalError> {
        self.recover()?;

        let mut report = ConsistencyReport::default();
        let mut expected = BTreeSet::new();
        let (lo, hi) = DataKey::all_rows_bounds();
        let rows = self
            .store
            .range(&lo, &hi)
            .map_err(|err| InternalError::store("row range", err))?;
        for entry in rows {
            let (raw_key, raw_value) = entry.map_err(|err| InternalError::store("row range", err))?;
            let key = DataKey::try_from_raw(&raw_key)?;
            let entity: E = from_json(&raw_value)?;
            if entity.primary_id() != key.primary_id() {
                return Err(InternalError::corruption(
                    E::ORIGIN,
                    format!(
                        "row '{}' decoded as {} '{}'",
                        key.primary_id(),
                        E::ENTITY_NAME,
                        entity.primary_id()
                    ),
                ));
            }
            expected.extend(self.expected_index_keys(&entity)?);
            report.rows += 1;
        }

        let mut actual = BTreeSet::new();
        for family in self.indexes.families() {
            for hit in scan_family(&self.store, family.tag())? {
                actual.insert(hit?.key);
                report.entries += 1;
            }
        }

        report.orphaned = actual.difference(&expected).cloned().collect();
        report.missing = expected.difference(&actual).cloned().collect();
        if !report.is_consistent() {
            tracing::warn!(
                entity = E::ENTITY_NAME,
                orphaned = report.orphaned.len(),
                missing = report.missing.len(),
                "index consistency check failed"
            );
        }

        Ok(report)
    }

    fn apply(&mut self, batch: CommitBatch, id: &str) -> Result<(), InternalError> {
        let (inserts, removes) = batch.index_delta();
        let label = batch.label().to_string();

        commit(&mut self.store, batch)?;
        record(MetricsEvent::IndexDelta {
            collection: E::ENTITY_NAME,
            inserts,
            removes,
        });
        if self.debug {
            tracing::debug!(entity = E::ENTITY_NAME, id, %label, inserts, removes, "committed");
        }

        Ok(())
    }

    fn row_exists(&self, key: &DataKey) -> Result<bool, InternalError> {
        let row = self
            .store
            .get(key.as_bytes())
            .map_err(|err| InternalError::store("row read", err))?;

        Ok(row.is_some())
    }

    fn read_row(&self, id: &str) -> Result<Option<E>, InternalError> {
        let key = DataKey::new(id)?;
        let Some(bytes) = self
            .store
            .get(key.as_bytes())
            .map_err(|err| InternalError::store("row read", err))?
        else {
            return Ok(None);
        };

        Ok(Some(from_json(&bytes)?))
    }
}
