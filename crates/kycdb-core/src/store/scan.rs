use crate::{
    entity::EntityKind,
    error::InternalError,
    index::{IndexHit, IndexRange},
    key::DataKey,
    kv::KvStore,
    obs::sink::{MetricsEvent, Span, record},
    serialize::from_json,
};
use std::marker::PhantomData;

///
/// EntityScan
///
/// Lazy hydration over an index scan: one primary row is read and decoded
/// per `next()`. Any failure is yielded as an error; callers collecting into
/// `Result<Vec<_>, _>` abort on the first one. The search span stays open
/// until the scan is dropped, so it reports the rows actually hydrated.
///

pub struct EntityScan<'a, E, S> {
    store: &'a S,
    hits: IndexRange<'a>,
    collection: &'static str,
    scanned: u64,
    span: Span,
    _marker: PhantomData<E>,
}

impl<'a, E, S> EntityScan<'a, E, S>
where
    E: EntityKind,
    S: KvStore,
{
    pub(crate) fn new(store: &'a S, hits: IndexRange<'a>, span: Span) -> Self {
        Self {
            store,
            hits,
            collection: E::ENTITY_NAME,
            scanned: 0,
            span,
            _marker: PhantomData,
        }
    }

    fn hydrate(&self, hit: &IndexHit) -> Result<E, InternalError> {
        let key = DataKey::new(&hit.primary_id)?;
        let bytes = self
            .store
            .get(key.as_bytes())
            .map_err(|err| InternalError::store("row read", err))?
            .ok_or_else(|| {
                InternalError::corruption(
                    E::ORIGIN,
                    format!(
                        "index entry {:?} points at missing {} '{}'",
                        hit.key,
                        E::ENTITY_NAME,
                        hit.primary_id
                    ),
                )
            })?;

        let entity: E = from_json(&bytes)?;
        if entity.primary_id() != hit.primary_id {
            return Err(InternalError::corruption(
                E::ORIGIN,
                format!(
                    "row '{}' decoded as {} '{}'",
                    hit.primary_id,
                    E::ENTITY_NAME,
                    entity.primary_id()
                ),
            ));
        }

        Ok(entity)
    }
}

impl<E, S> Iterator for EntityScan<'_, E, S>
where
    E: EntityKind,
    S: KvStore,
{
    type Item = Result<E, InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        let hit = match self.hits.next()? {
            Ok(hit) => hit,
            Err(err) => return Some(Err(err)),
        };
        self.scanned += 1;

        Some(self.hydrate(&hit))
    }
}

impl<E, S> Drop for EntityScan<'_, E, S> {
    fn drop(&mut self) {
        self.span.set_rows(self.scanned);
        if self.scanned > 0 {
            record(MetricsEvent::RowsScanned {
                collection: self.collection,
                rows_scanned: self.scanned,
            });
        }
    }
}
