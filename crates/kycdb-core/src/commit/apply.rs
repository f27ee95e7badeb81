use crate::{
    commit::marker::{CommitBatch, CommitMarker, CommitOp, CommitOpKind},
    error::{ErrorOrigin, InternalError},
    index::{put_index_entry, remove_index_entry},
    key::{COMMIT_MARKER_KEY, IndexKey},
    kv::KvStore,
    obs::sink::{MetricsEvent, record},
};

/// Persist `batch` as a marker, apply it, then clear the marker.
///
/// On an apply failure the marker stays in place and the error is returned;
/// the next [`ensure_recovered`] finishes the job.
pub fn commit<S: KvStore + ?Sized>(store: &mut S, batch: CommitBatch) -> Result<(), InternalError> {
    if batch.is_empty() {
        return Ok(());
    }

    if read_marker(store)?.is_some() {
        return Err(InternalError::commit_invariant(
            "commit marker already present; recovery must run before a new commit",
        ));
    }

    let marker = batch.into_marker();
    let bytes = marker.encode()?;
    check_fits(store, &marker.ops, bytes.len())?;
    store
        .put(COMMIT_MARKER_KEY, &bytes)
        .map_err(|err| InternalError::store("commit marker write", err))?;

    if let Err(err) = apply_ops(store, &marker.ops) {
        record(MetricsEvent::CommitFailed);
        tracing::warn!(
            commit = %marker.id_hex(),
            label = %marker.label,
            error = %err.display_with_class(),
            "commit apply failed; marker kept for recovery"
        );

        return Err(err);
    }

    clear_marker(store)?;
    record(MetricsEvent::CommitApplied {
        ops: marker.ops.len() as u64,
    });

    Ok(())
}

/// Replay and clear an unfinished commit, if one is present.
///
/// Returns `true` when a marker was replayed.
pub fn ensure_recovered<S: KvStore + ?Sized>(store: &mut S) -> Result<bool, InternalError> {
    let Some(bytes) = read_marker(store)? else {
        return Ok(false);
    };

    let marker = CommitMarker::decode(&bytes)?;
    tracing::warn!(
        commit = %marker.id_hex(),
        label = %marker.label,
        ops = marker.ops.len(),
        "replaying unfinished commit"
    );

    apply_ops(store, &marker.ops)?;
    clear_marker(store)?;
    record(MetricsEvent::CommitRecovered {
        ops: marker.ops.len() as u64,
    });

    Ok(true)
}

// Ops the host cannot hold must never reach a persisted marker, or replay
// would fail on them forever.
fn check_fits<S: KvStore + ?Sized>(
    store: &S,
    ops: &[CommitOp],
    marker_len: usize,
) -> Result<(), InternalError> {
    if let Some(max) = store.max_value_len()
        && marker_len > max
    {
        return Err(InternalError::invalid_argument(
            ErrorOrigin::Commit,
            format!("commit marker too large for store: {marker_len} bytes (limit {max})"),
        ));
    }

    for op in ops {
        if let Some(max) = store.max_key_len()
            && op.key.len() > max
        {
            return Err(InternalError::invalid_argument(
                ErrorOrigin::Commit,
                format!(
                    "{} key too large for store: {} bytes (limit {max})",
                    op.kind.as_str(),
                    op.key.len()
                ),
            ));
        }

        let value_len = op.value.as_ref().map_or(0, Vec::len);
        if let Some(max) = store.max_value_len()
            && value_len > max
        {
            return Err(InternalError::invalid_argument(
                ErrorOrigin::Commit,
                format!(
                    "{} value too large for store: {value_len} bytes (limit {max})",
                    op.kind.as_str()
                ),
            ));
        }
    }

    Ok(())
}

fn read_marker<S: KvStore + ?Sized>(store: &S) -> Result<Option<Vec<u8>>, InternalError> {
    store
        .get(COMMIT_MARKER_KEY)
        .map_err(|err| InternalError::store("commit marker read", err))
}

fn clear_marker<S: KvStore + ?Sized>(store: &mut S) -> Result<(), InternalError> {
    store
        .delete(COMMIT_MARKER_KEY)
        .map_err(|err| InternalError::store("commit marker clear", err))
}

// Index ops first, then rows.
fn apply_ops<S: KvStore + ?Sized>(store: &mut S, ops: &[CommitOp]) -> Result<(), InternalError> {
    for op in ops.iter().filter(|op| op.kind == CommitOpKind::Index) {
        let key = IndexKey::try_from_raw(&op.key)?;
        match &op.value {
            Some(_) => put_index_entry(store, &key, key.parts()?.primary_id)?,
            None => remove_index_entry(store, &key)?,
        }
    }

    for op in ops.iter().filter(|op| op.kind == CommitOpKind::Row) {
        match &op.value {
            Some(value) => store
                .put(&op.key, value)
                .map_err(|err| InternalError::store("row write", err))?,
            None => store
                .delete(&op.key)
                .map_err(|err| InternalError::store("row delete", err))?,
        }
    }

    Ok(())
}
