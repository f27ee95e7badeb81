//! Metrics sink boundary.
//!
//! All instrumentation flows through `MetricsEvent` and `MetricsSink`.
//! This module is the only bridge between store logic and the global
//! metrics state.

use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecKind {
    Load,
    Save,
    Search,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    ExecStart {
        kind: ExecKind,
        collection: &'static str,
    },
    ExecFinish {
        kind: ExecKind,
        collection: &'static str,
        rows_touched: u64,
    },
    RowsScanned {
        collection: &'static str,
        rows_scanned: u64,
    },
    DuplicateRejected {
        collection: &'static str,
    },
    IndexDelta {
        collection: &'static str,
        inserts: u64,
        removes: u64,
    },
    CommitApplied {
        ops: u64,
    },
    CommitFailed,
    CommitRecovered {
        ops: u64,
    },
    AccessGranted {
        resumed: bool,
    },
    AccessDenied,
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink that writes into the thread-local counter state.
/// Used whenever no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::ExecStart { kind, collection } => {
                metrics::with_state_mut(|m| {
                    match kind {
                        ExecKind::Load => m.ops.load_calls = m.ops.load_calls.saturating_add(1),
                        ExecKind::Save => m.ops.save_calls = m.ops.save_calls.saturating_add(1),
                        ExecKind::Search => {
                            m.ops.search_calls = m.ops.search_calls.saturating_add(1);
                        }
                    }

                    let entry = metrics::collection(m, collection);
                    match kind {
                        ExecKind::Load => entry.load_calls = entry.load_calls.saturating_add(1),
                        ExecKind::Save => entry.save_calls = entry.save_calls.saturating_add(1),
                        ExecKind::Search => {
                            entry.search_calls = entry.search_calls.saturating_add(1);
                        }
                    }
                });
            }

            MetricsEvent::ExecFinish {
                kind,
                collection,
                rows_touched,
            } => {
                if kind == ExecKind::Save {
                    return;
                }
                metrics::with_state_mut(|m| {
                    m.ops.rows_loaded = m.ops.rows_loaded.saturating_add(rows_touched);
                    let entry = metrics::collection(m, collection);
                    entry.rows_loaded = entry.rows_loaded.saturating_add(rows_touched);
                });
            }

            MetricsEvent::RowsScanned {
                collection,
                rows_scanned,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_scanned = m.ops.rows_scanned.saturating_add(rows_scanned);
                    let entry = metrics::collection(m, collection);
                    entry.rows_scanned = entry.rows_scanned.saturating_add(rows_scanned);
                });
            }

            MetricsEvent::DuplicateRejected { collection } => {
                metrics::with_state_mut(|m| {
                    m.ops.duplicate_rejections = m.ops.duplicate_rejections.saturating_add(1);
                    let entry = metrics::collection(m, collection);
                    entry.duplicate_rejections = entry.duplicate_rejections.saturating_add(1);
                });
            }

            MetricsEvent::IndexDelta {
                collection,
                inserts,
                removes,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.index_inserts = m.ops.index_inserts.saturating_add(inserts);
                    m.ops.index_removes = m.ops.index_removes.saturating_add(removes);
                    let entry = metrics::collection(m, collection);
                    entry.index_inserts = entry.index_inserts.saturating_add(inserts);
                    entry.index_removes = entry.index_removes.saturating_add(removes);
                });
            }

            MetricsEvent::CommitApplied { .. } => {
                metrics::with_state_mut(|m| m.ops.commits = m.ops.commits.saturating_add(1));
            }

            MetricsEvent::CommitFailed => {
                metrics::with_state_mut(|m| {
                    m.ops.commit_failures = m.ops.commit_failures.saturating_add(1);
                });
            }

            MetricsEvent::CommitRecovered { .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.recoveries = m.ops.recoveries.saturating_add(1);
                });
            }

            MetricsEvent::AccessGranted { resumed } => {
                metrics::with_state_mut(|m| {
                    m.ops.grants = m.ops.grants.saturating_add(1);
                    if resumed {
                        m.ops.grant_resumes = m.ops.grant_resumes.saturating_add(1);
                    }
                });
            }

            MetricsEvent::AccessDenied => {
                metrics::with_state_mut(|m| {
                    m.ops.grant_denials = m.ops.grant_denials.saturating_add(1);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
/// The previous sink is restored on every exit, unwinding included.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| *cell.borrow_mut() = prev);
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// Span
/// RAII guard that emits `ExecStart` on creation and `ExecFinish` on drop.
///

pub struct Span {
    kind: ExecKind,
    collection: &'static str,
    rows: u64,
}

impl Span {
    #[must_use]
    pub fn new(kind: ExecKind, collection: &'static str) -> Self {
        record(MetricsEvent::ExecStart { kind, collection });

        Self {
            kind,
            collection,
            rows: 0,
        }
    }

    pub const fn set_rows(&mut self, rows: u64) {
        self.rows = rows;
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        record(MetricsEvent::ExecFinish {
            kind: self.kind,
            collection: self.collection,
            rows_touched: self.rows,
        });
    }
}

///
/// TESTS
///
