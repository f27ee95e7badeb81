use super::*;
use crate::{
    error::{ErrorClass, ErrorDetail},
    key::DataKey,
    kv::MemoryKvStore,
    record::{NewRecord, RecordStore},
};

const D1: &str = "20160101000000";
const D2: &str = "20160102000000";
const D3: &str = "20160103000000";

fn stores() -> (RecordStore<MemoryKvStore>, RequestStore<MemoryKvStore>) {
    let config = IndexConfig::default();
    let mut records = RecordStore::new(MemoryKvStore::new(), &config).unwrap();
    records
        .add_record(NewRecord {
            cust_id: "c1".to_string(),
            cust_name: "Alice".to_string(),
            rec_owner: "o1".to_string(),
            enc_for: "o1".to_string(),
            enc_data: "cipher".to_string(),
            date_created: D1.to_string(),
        })
        .unwrap();

    (records, RequestStore::new(MemoryKvStore::new(), &config).unwrap())
}

#[test]
fn duplicate_tag_config_is_rejected() {
    let mut config = IndexConfig::default();
    config.request.rec_owner = config.request.req_by.clone();

    let err = RequestStore::new(MemoryKvStore::new(), &config)
        .err()
        .unwrap();
    assert_eq!(err.class, ErrorClass::Config);
}

fn req_ids<S: KvStore>(scan: EntityScan<'_, Request, S>) -> Vec<String> {
    scan.map(|request| request.unwrap().req_id).collect()
}

#[test]
fn add_request_copies_owner_and_starts_pending() {
    let (mut records, mut requests) = stores();

    let req_id = requests
        .add_request(&mut records, "c1o1o1", "r1", D2)
        .unwrap();

    assert_eq!(req_id, format!("c1o1o1r1{D2}"));
    let request = requests.get_request(&req_id).unwrap();
    assert_eq!(request.rec_owner, "o1");
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.date_modified, D2);
    assert_eq!(requests.index_entries(&req_id).unwrap().len(), 3);
}

#[test]
fn add_request_for_missing_record_is_upstream_error() {
    let (mut records, mut requests) = stores();

    let err = requests
        .add_request(&mut records, "ghost", "r1", D2)
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::UpstreamLookup);
    assert!(matches!(
        err.detail,
        Some(ErrorDetail::Upstream {
            class: ErrorClass::NotFound,
            ..
        })
    ));
    assert!(requests.store().is_empty());
}

#[test]
fn duplicate_request_is_rejected() {
    let (mut records, mut requests) = stores();
    requests
        .add_request(&mut records, "c1o1o1", "r1", D2)
        .unwrap();

    let err = requests
        .add_request(&mut records, "c1o1o1", "r1", D2)
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::AlreadyExists);
}

#[test]
fn date_index_points_at_each_request() {
    let (mut records, mut requests) = stores();
    let first = requests
        .add_request(&mut records, "c1o1o1", "r1", D2)
        .unwrap();
    let second = requests
        .add_request(&mut records, "c1o1o1", "r2", D3)
        .unwrap();

    assert_eq!(
        req_ids(requests.get_requests_modified_on_or_after(D1).unwrap()),
        [first, second]
    );
}

#[test]
fn search_by_requester_and_owner() {
    let (mut records, mut requests) = stores();
    let first = requests
        .add_request(&mut records, "c1o1o1", "r1", D2)
        .unwrap();
    let second = requests
        .add_request(&mut records, "c1o1o1", "r2", D2)
        .unwrap();

    assert_eq!(req_ids(requests.search_by_index("by", "r1").unwrap()), [first.clone()]);
    assert_eq!(
        req_ids(requests.search_by_index("for", "o1").unwrap()),
        [first, second]
    );
    assert_eq!(
        requests.search_by_index("name", "Alice").err().unwrap().class,
        ErrorClass::UnknownIndex
    );
}

#[test]
fn transition_rekeys_date_and_keeps_other_entries() {
    let (mut records, mut requests) = stores();
    let req_id = requests
        .add_request(&mut records, "c1o1o1", "r1", D2)
        .unwrap();

    let updated = requests
        .transition(&req_id, RequestStatus::AccessGiven { on: D3.to_string() }, D3)
        .unwrap();

    assert_eq!(updated.date_created, D2);
    assert_eq!(updated.date_modified, D3);
    assert!(req_ids(requests.search_by_index("date", D2).unwrap()).is_empty());
    assert_eq!(req_ids(requests.search_by_index("date", D3).unwrap()), [req_id.clone()]);
    assert_eq!(req_ids(requests.search_by_index("by", "r1").unwrap()), [req_id]);
    assert!(requests.verify_indexes().unwrap().is_consistent());
}

#[test]
fn stored_request_json_shape() {
    let (mut records, mut requests) = stores();
    let req_id = requests
        .add_request(&mut records, "c1o1o1", "r1", D2)
        .unwrap();
    let key = DataKey::new(&req_id).unwrap();

    let raw = requests.store_mut().get(key.as_bytes()).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();

    assert_eq!(json["reqId"], req_id);
    assert_eq!(json["recOwner"], "o1");
    assert_eq!(json["status"], "Pending");
}
