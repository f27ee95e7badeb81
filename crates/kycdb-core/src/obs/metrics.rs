use candid::CandidType;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for store and workflow operations.
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Serialize)]
pub(crate) struct EventState {
    pub(crate) ops: EventOps,
    pub(crate) collections: BTreeMap<String, CollectionCounters>,
}

///
/// EventOps
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Entrypoints
    pub load_calls: u64,
    pub save_calls: u64,
    pub search_calls: u64,

    // Rows touched
    pub rows_loaded: u64,
    pub rows_scanned: u64,

    // Index maintenance
    pub index_inserts: u64,
    pub index_removes: u64,
    pub duplicate_rejections: u64,

    // Commit protocol
    pub commits: u64,
    pub commit_failures: u64,
    pub recoveries: u64,

    // Access workflow
    pub grants: u64,
    pub grant_resumes: u64,
    pub grant_denials: u64,
}

///
/// CollectionCounters
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CollectionCounters {
    pub load_calls: u64,
    pub save_calls: u64,
    pub search_calls: u64,
    pub rows_loaded: u64,
    pub rows_scanned: u64,
    pub index_inserts: u64,
    pub index_removes: u64,
    pub duplicate_rejections: u64,
}

///
/// EventReport
/// Point-in-time snapshot of the counters.
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub ops: EventOps,
    pub collections: Vec<(String, CollectionCounters)>,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Mutate the global counter state.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|state| f(&mut state.borrow_mut()))
}

/// Per-collection counters, created on first use.
pub(crate) fn collection<'a>(state: &'a mut EventState, name: &str) -> &'a mut CollectionCounters {
    state.collections.entry(name.to_string()).or_default()
}

pub(crate) fn report() -> EventReport {
    EVENT_STATE.with(|state| {
        let state = state.borrow();

        EventReport {
            ops: state.ops.clone(),
            collections: state
                .collections
                .iter()
                .map(|(name, counters)| (name.clone(), counters.clone()))
                .collect(),
        }
    })
}

pub(crate) fn reset_all() {
    EVENT_STATE.with(|state| *state.borrow_mut() = EventState::default());
}
