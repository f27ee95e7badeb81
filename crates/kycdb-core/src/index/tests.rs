use super::*;
use crate::{
    error::ErrorClass,
    kv::{KvStore, MemoryKvStore},
};

fn ids(range: IndexRange<'_>) -> Vec<String> {
    range.map(|hit| hit.unwrap().primary_id).collect()
}

fn seeded() -> MemoryKvStore {
    let mut store = MemoryKvStore::new();
    for (tag, value, id) in [
        ("name", "Alice", "r2"),
        ("name", "Alice", "r1"),
        ("name", "Alicia", "r3"),
        ("name", "Al", "ice"),
        ("name", "Bob", "r4"),
        ("date", "20160101000000", "r1"),
        ("date", "20160102000000", "r2"),
        ("date", "20160103000000", "r3"),
    ] {
        let key = IndexKey::build(tag, value, id).unwrap();
        put_index_entry(&mut store, &key, id).unwrap();
    }

    store
}

#[test]
fn prefix_scan_orders_by_value_then_id() {
    let store = seeded();

    assert_eq!(
        ids(range_by_tag_prefix(&store, "name", "Ali").unwrap()),
        ["r1", "r2", "r3"]
    );
}

#[test]
fn prefix_scan_never_matches_across_value_boundary() {
    let store = seeded();

    assert_eq!(
        ids(range_by_tag_prefix(&store, "name", "Alice").unwrap()),
        ["r1", "r2"]
    );
}

#[test]
fn date_scan_runs_to_the_sentinel() {
    let store = seeded();
    let format = DateFormat::new(14);

    assert_eq!(
        ids(range_from_date(&store, "date", "20160102000000", format).unwrap()),
        ["r2", "r3"]
    );
    assert_eq!(
        ids(range_from_date(&store, "date", "2016", format).unwrap()),
        ["r1", "r2", "r3"]
    );
}

#[test]
fn scans_are_restartable() {
    let store = seeded();

    let first = ids(scan_family(&store, "date").unwrap());
    let second = ids(scan_family(&store, "date").unwrap());
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn remove_missing_entry_is_noop() {
    let mut store = seeded();
    let key = IndexKey::build("name", "Nobody", "r9").unwrap();

    remove_index_entry(&mut store, &key).unwrap();
    assert_eq!(ids(scan_family(&store, "name").unwrap()).len(), 5);
}

#[test]
fn mismatched_entry_value_is_corruption() {
    let mut store = seeded();
    let key = IndexKey::build("name", "Carol", "r5").unwrap();
    store.put(key.as_bytes(), b"someone-else").unwrap();

    let err = range_by_tag_prefix(&store, "name", "Carol")
        .unwrap()
        .next()
        .unwrap()
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::Corruption);
}

#[test]
fn resolve_rejects_unknown_tag() {
    let set = IndexSet::new(
        vec![IndexFamily::new("id", IndexField::CustId)],
        DateFormat::new(14),
    );

    assert_eq!(set.resolve("id", ErrorOrigin::Record).unwrap().tag(), "id");
    let err = set.resolve("by", ErrorOrigin::Record).unwrap_err();
    assert_eq!(err.class, ErrorClass::UnknownIndex);
    assert!(set.date_family(ErrorOrigin::Record).is_err());
}
