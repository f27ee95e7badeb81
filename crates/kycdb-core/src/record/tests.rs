use super::*;
use crate::{
    error::ErrorClass,
    key::{COMMIT_MARKER_KEY, DataKey},
    kv::{MemoryKvStore, StableKvStore},
    test_support::{FaultyKvStore, test_memory},
};

const D1: &str = "20160101000000";
const D2: &str = "20160102000000";
const D3: &str = "20160103000000";

fn new_record(cust_id: &str, cust_name: &str, owner: &str, enc_for: &str) -> NewRecord {
    NewRecord {
        cust_id: cust_id.to_string(),
        cust_name: cust_name.to_string(),
        rec_owner: owner.to_string(),
        enc_for: enc_for.to_string(),
        enc_data: "cipher".to_string(),
        date_created: D1.to_string(),
    }
}

fn records() -> RecordStore<MemoryKvStore> {
    RecordStore::new(MemoryKvStore::new(), &IndexConfig::default()).unwrap()
}

fn rec_ids<S: KvStore>(scan: EntityScan<'_, Record, S>) -> Vec<String> {
    scan.map(|record| record.unwrap().rec_id).collect()
}

#[test]
fn add_then_get_round_trips() {
    let mut records = records();

    let rec_id = records
        .add_record(new_record("c1", "Alice", "o1", "o1"))
        .unwrap();

    assert_eq!(rec_id, "c1o1o1");
    let record = records.get_record(&rec_id).unwrap();
    assert_eq!(record.cust_name, "Alice");
    assert_eq!(record.enc_data, "cipher");
    assert_eq!(record.date_created, D1);
    assert_eq!(record.date_modified, D1);
}

#[test]
fn add_works_over_stable_memory() {
    let mut records = RecordStore::new(StableKvStore::init(test_memory(10)), &IndexConfig::default()).unwrap();

    records
        .add_record(new_record("c1", "Alice", "o1", "o1"))
        .unwrap();

    assert_eq!(rec_ids(records.search_by_index("name", "Al").unwrap()), ["c1o1o1"]);
    assert_eq!(records.store().len(), 4);
}

#[test]
fn oversized_key_is_rejected_before_marker_on_stable_memory() {
    let mut records =
        RecordStore::new(StableKvStore::init(test_memory(11)), &IndexConfig::default()).unwrap();

    let long_name = "N".repeat(1100);
    let err = records
        .add_record(new_record("c1", &long_name, "o1", "o1"))
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::InvalidArgument);
    assert!(records.store().is_empty());

    // nothing pending, so the collection keeps working
    records
        .add_record(new_record("c2", "Bob", "o2", "o2"))
        .unwrap();
    assert_eq!(records.get_record("c2o2o2").unwrap().cust_name, "Bob");
}

#[test]
fn empty_tag_config_is_rejected() {
    let mut config = IndexConfig::default();
    config.record.cust_name = String::new();

    let err = RecordStore::new(MemoryKvStore::new(), &config)
        .err()
        .unwrap();
    assert_eq!(err.class, ErrorClass::Config);
}

#[test]
fn duplicate_triple_is_rejected() {
    let mut records = records();
    records
        .add_record(new_record("c1", "Alice", "o1", "o1"))
        .unwrap();

    let mut again = new_record("c1", "Mallory", "o1", "o1");
    again.enc_data = "other".to_string();
    let err = records.add_record(again).unwrap_err();

    assert_eq!(err.class, ErrorClass::AlreadyExists);
    let record = records.get_record("c1o1o1").unwrap();
    assert_eq!(record.cust_name, "Alice");
    assert_eq!(record.enc_data, "cipher");
}

#[test]
fn missing_record_is_not_found() {
    let mut records = records();

    assert_eq!(
        records.get_record("nope").unwrap_err().class,
        ErrorClass::NotFound
    );
    assert_eq!(
        records.update_record("nope", "x", D2).unwrap_err().class,
        ErrorClass::NotFound
    );
}

#[test]
fn update_rekeys_date_index() {
    let mut records = records();
    let rec_id = records
        .add_record(new_record("c1", "Alice", "o1", "o1"))
        .unwrap();

    records.update_record(&rec_id, "fresh", D2).unwrap();

    assert!(rec_ids(records.search_by_index("date", D1).unwrap()).is_empty());
    assert_eq!(rec_ids(records.search_by_index("date", D2).unwrap()), [rec_id.clone()]);
    assert_eq!(rec_ids(records.search_by_index("id", "c1").unwrap()), [rec_id.clone()]);

    let record = records.get_record(&rec_id).unwrap();
    assert_eq!(record.enc_data, "fresh");
    assert_eq!(record.date_created, D1);
    assert_eq!(record.date_modified, D2);
    assert!(records.verify_indexes().unwrap().is_consistent());
}

#[test]
fn modified_on_or_after_is_ordered_and_inclusive() {
    let mut records = records();
    for (cust, date) in [("c1", D1), ("c2", D2), ("c3", D3)] {
        let rec_id = records
            .add_record(new_record(cust, "Name", "o1", "o1"))
            .unwrap();
        records.update_record(&rec_id, "x", date).unwrap();
    }

    assert_eq!(
        rec_ids(records.get_records_modified_on_or_after(D2).unwrap()),
        ["c2o1o1", "c3o1o1"]
    );
    assert_eq!(
        rec_ids(records.get_records_modified_on_or_after("2017").unwrap()),
        Vec::<String>::new()
    );
}

#[test]
fn search_on_unknown_tag_is_rejected() {
    let mut records = records();

    let err = records.search_by_index("for", "o1").err().unwrap();
    assert_eq!(err.class, ErrorClass::UnknownIndex);
}

#[test]
fn name_search_never_crosses_value_boundary() {
    let mut records = records();
    // value "Al" with a recId starting "ice" must not match a search for "Alice"
    records
        .add_record(new_record("ice", "Al", "o1", "o1"))
        .unwrap();
    records
        .add_record(new_record("c2", "Alice", "o1", "o1"))
        .unwrap();

    assert_eq!(
        rec_ids(records.search_by_index("name", "Alice").unwrap()),
        ["c2o1o1"]
    );
    assert_eq!(
        rec_ids(records.search_by_index("name", "Al").unwrap()),
        ["iceo1o1", "c2o1o1"]
    );
}

#[test]
fn corrupt_stored_record_aborts_search() {
    let mut records = records();
    records
        .add_record(new_record("c1", "Alice", "o1", "o1"))
        .unwrap();
    records
        .store_mut()
        .put(DataKey::new("c1o1o1").unwrap().as_bytes(), b"\x00\x01")
        .unwrap();

    let err = records
        .search_by_index("id", "c1")
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::Serialization);
}

#[test]
fn interrupted_add_is_repaired_on_next_access() {
    let (store, faults) = FaultyKvStore::new();
    let mut records = RecordStore::new(store, &IndexConfig::default()).unwrap();
    // marker and the `id` entry land; `name`, `date` and the row do not
    faults.fail_after(2);

    let err = records
        .add_record(new_record("c1", "Alice", "o1", "o1"))
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::IndexWrite);

    faults.heal();
    let record = records.get_record("c1o1o1").unwrap();
    assert_eq!(record.cust_name, "Alice");
    assert!(records.store().inner.get(COMMIT_MARKER_KEY).unwrap().is_none());

    let expected = records.index_entries("c1o1o1").unwrap();
    assert_eq!(expected.len(), 3);
    for key in &expected {
        assert!(records.store().inner.get(key.as_bytes()).unwrap().is_some());
    }
    assert!(records.verify_indexes().unwrap().is_consistent());
}

#[test]
fn malformed_inputs_are_rejected() {
    let mut records = records();

    let mut short_date = new_record("c1", "Alice", "o1", "o1");
    short_date.date_created = "2016".to_string();
    assert_eq!(
        records.add_record(short_date).unwrap_err().class,
        ErrorClass::InvalidArgument
    );

    assert_eq!(
        records
            .add_record(new_record("c\0", "Alice", "o1", "o1"))
            .unwrap_err()
            .class,
        ErrorClass::InvalidArgument
    );
    assert_eq!(
        records
            .add_record(new_record("", "Alice", "", ""))
            .unwrap_err()
            .class,
        ErrorClass::InvalidArgument
    );
    assert!(records.store().is_empty());
}

#[test]
fn json_uses_camel_case_field_names() {
    let record = new_record("c1", "Alice", "o1", "o2").into_record();
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["recId"], "c1o1o2");
    assert_eq!(json["encFor"], "o2");
    assert_eq!(json["dateModified"], D1);
}
