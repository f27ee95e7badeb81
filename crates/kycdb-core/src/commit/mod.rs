//! Commit protocol for multi-key writes.
//!
//! The host store has no multi-key atomicity, so every mutation that touches
//! more than one key goes through a commit marker:
//! - the full op list is persisted under `COMMIT_MARKER_KEY` with one `put`
//! - index ops are applied, then row ops
//! - the marker is deleted
//!
//! A marker left behind by a failed apply is replayed by
//! [`ensure_recovered`], which every store entrypoint calls before doing
//! anything else. Puts and deletes are idempotent, so replay may run any
//! number of times.

mod apply;
mod marker;


pub use apply::{commit, ensure_recovered};
pub use marker::{CommitBatch, CommitMarker, CommitOp, CommitOpKind, MAX_COMMIT_BYTES};
