use crate::error::ErrorOrigin;
use derive_more::Display;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

///
/// IndexField
///
/// Entity fields that an index family can be keyed by.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum IndexField {
    CustId,
    CustName,
    ReqBy,
    RecOwner,
    DateModified,
}

///
/// EntityKind
///
/// A primary entity persisted as one JSON row plus its index entries.
///

pub trait EntityKind: Clone + Serialize + DeserializeOwned {
    /// Human-readable name used in errors and diagnostics.
    const ENTITY_NAME: &'static str;

    /// Error origin for failures raised on behalf of this entity.
    const ORIGIN: ErrorOrigin;

    fn primary_id(&self) -> &str;

    /// Current value of an indexed field, or `None` if the entity does not
    /// carry that field.
    fn field_value(&self, field: IndexField) -> Option<&str>;
}
