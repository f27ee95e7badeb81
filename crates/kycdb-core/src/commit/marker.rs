use crate::{
    error::{ErrorOrigin, InternalError},
    key::{DataKey, IndexKey},
    serialize::{deserialize_bounded, serialize},
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const COMMIT_ID_BYTES: usize = 16;

/// Upper bound on an encoded marker.
pub const MAX_COMMIT_BYTES: usize = 4 * 1024 * 1024;

///
/// CommitOpKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum CommitOpKind {
    Index,
    Row,
}

impl CommitOpKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Row => "row",
        }
    }
}

///
/// CommitOp
///
/// One staged write. `value: None` deletes the key.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CommitOp {
    pub kind: CommitOpKind,
    pub key: Vec<u8>,
    pub value: Option<Vec<u8>>,
}

impl CommitOp {
    // Index ops must name a well-formed composite key, and a put must store
    // exactly the key's primary id. Row ops must name a row key.
    fn validate(&self) -> Result<(), InternalError> {
        match self.kind {
            CommitOpKind::Index => {
                let key = IndexKey::try_from_raw(&self.key)?;
                if let Some(value) = &self.value {
                    let parts = key.parts()?;
                    if value.as_slice() != parts.primary_id.as_bytes() {
                        return Err(InternalError::corruption(
                            ErrorOrigin::Commit,
                            format!("commit index op {key:?} carries a foreign primary id"),
                        ));
                    }
                }
            }
            CommitOpKind::Row => {
                DataKey::try_from_raw(&self.key)?;
            }
        }

        Ok(())
    }
}

///
/// CommitBatch
///
/// Ops staged by one logical operation, in the order they were staged.
///

#[derive(Clone, Debug, Default)]
pub struct CommitBatch {
    label: String,
    ops: Vec<CommitOp>,
}

impl CommitBatch {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ops: Vec::new(),
        }
    }

    pub fn put_index(&mut self, key: &IndexKey, primary_id: &str) {
        self.ops.push(CommitOp {
            kind: CommitOpKind::Index,
            key: key.as_bytes().to_vec(),
            value: Some(primary_id.as_bytes().to_vec()),
        });
    }

    pub fn remove_index(&mut self, key: &IndexKey) {
        self.ops.push(CommitOp {
            kind: CommitOpKind::Index,
            key: key.as_bytes().to_vec(),
            value: None,
        });
    }

    pub fn put_row(&mut self, key: &DataKey, bytes: Vec<u8>) {
        self.ops.push(CommitOp {
            kind: CommitOpKind::Row,
            key: key.as_bytes().to_vec(),
            value: Some(bytes),
        });
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn ops(&self) -> &[CommitOp] {
        &self.ops
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Staged index `(inserts, removes)`.
    #[must_use]
    pub fn index_delta(&self) -> (u64, u64) {
        self.ops
            .iter()
            .filter(|op| op.kind == CommitOpKind::Index)
            .fold((0, 0), |(inserts, removes), op| match op.value {
                Some(_) => (inserts + 1, removes),
                None => (inserts, removes + 1),
            })
    }

    #[must_use]
    pub fn into_marker(self) -> CommitMarker {
        CommitMarker::new(self.label, self.ops)
    }
}

///
/// CommitMarker
///
/// Persisted form of a batch. The id is a digest of the contents, so two
/// markers with the same ops share an id.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CommitMarker {
    pub id: [u8; COMMIT_ID_BYTES],
    pub label: String,
    pub ops: Vec<CommitOp>,
}

impl CommitMarker {
    #[must_use]
    pub fn new(label: String, ops: Vec<CommitOp>) -> Self {
        let id = commit_id(&label, &ops);

        Self { id, label, ops }
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, InternalError> {
        let bytes = serialize(self)?;
        if bytes.len() > MAX_COMMIT_BYTES {
            return Err(InternalError::commit_invariant(format!(
                "commit marker '{}' exceeds {MAX_COMMIT_BYTES} bytes ({} bytes)",
                self.label,
                bytes.len()
            )));
        }

        Ok(bytes)
    }

    /// Decode and validate a persisted marker. Anything unreadable is
    /// corruption, never a silently skipped replay.
    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, InternalError> {
        let marker: Self = deserialize_bounded(bytes, MAX_COMMIT_BYTES).map_err(|err| {
            InternalError::corruption(
                ErrorOrigin::Commit,
                format!("commit marker corrupted: {err}"),
            )
        })?;

        if marker.id != commit_id(&marker.label, &marker.ops) {
            return Err(InternalError::corruption(
                ErrorOrigin::Commit,
                format!("commit marker '{}' failed its digest check", marker.label),
            ));
        }
        for op in &marker.ops {
            op.validate()?;
        }

        Ok(marker)
    }

    #[must_use]
    pub fn id_hex(&self) -> String {
        self.id.iter().map(|b| format!("{b:02x}")).collect()
    }
}

fn commit_id(label: &str, ops: &[CommitOp]) -> [u8; COMMIT_ID_BYTES] {
    let mut hasher = Sha256::new();
    hash_field(&mut hasher, label.as_bytes());
    for op in ops {
        hasher.update([match op.kind {
            CommitOpKind::Index => 0u8,
            CommitOpKind::Row => 1u8,
        }]);
        hash_field(&mut hasher, &op.key);
        match &op.value {
            Some(value) => {
                hasher.update([1u8]);
                hash_field(&mut hasher, value);
            }
            None => hasher.update([0u8]),
        }
    }

    let digest = hasher.finalize();
    let mut id = [0u8; COMMIT_ID_BYTES];
    id.copy_from_slice(&digest[..COMMIT_ID_BYTES]);

    id
}

// Length-prefix each field so adjacent fields cannot run together.
fn hash_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
