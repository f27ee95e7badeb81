use super::*;
use crate::{
    config::IndexConfig,
    error::{ErrorClass, ErrorDetail, ErrorOrigin},
    kv::MemoryKvStore,
    test_support::FaultyKvStore,
};

const D1: &str = "20160101000000";
const D2: &str = "20160102000000";
const D3: &str = "20160103000000";

fn owner_record() -> NewRecord {
    NewRecord {
        cust_id: "c1".to_string(),
        cust_name: "Alice".to_string(),
        rec_owner: "o1".to_string(),
        enc_for: "o1".to_string(),
        enc_data: "for-owner".to_string(),
        date_created: D1.to_string(),
    }
}

fn setup<S: KvStore>(request_store: S) -> (RecordStore<MemoryKvStore>, RequestStore<S>, String) {
    let config = IndexConfig::default();
    let mut records = RecordStore::new(MemoryKvStore::new(), &config).unwrap();
    let mut requests = RequestStore::new(request_store, &config).unwrap();

    let rec_id = records.add_record(owner_record()).unwrap();
    let req_id = requests.add_request(&mut records, &rec_id, "r1", D2).unwrap();

    (records, requests, req_id)
}

///
/// UnreachableRecords
///

struct UnreachableRecords;

impl RecordReader for UnreachableRecords {
    fn read_record(&mut self, _rec_id: &str) -> Result<Record, InternalError> {
        Err(InternalError::new(
            ErrorClass::Store,
            ErrorOrigin::Store,
            "record canister unreachable",
        ))
    }
}

impl RecordWriter for UnreachableRecords {
    fn write_record(&mut self, _new: NewRecord) -> Result<String, InternalError> {
        unreachable!("write after failed read")
    }
}

#[test]
fn grant_creates_copy_and_marks_request() {
    let (mut records, mut requests, req_id) = setup(MemoryKvStore::new());

    let outcome = AccessWorkflow::new(&mut requests, &mut records)
        .grant_access("o1", &req_id, "for-r1", D3)
        .unwrap();

    assert_eq!(
        outcome,
        GrantOutcome::Granted {
            rec_id: "c1o1r1".to_string()
        }
    );

    let copy = records.get_record("c1o1r1").unwrap();
    assert_eq!(copy.cust_id, "c1");
    assert_eq!(copy.cust_name, "Alice");
    assert_eq!(copy.rec_owner, "o1");
    assert_eq!(copy.enc_for, "r1");
    assert_eq!(copy.enc_data, "for-r1");
    assert_eq!(copy.date_created, D3);

    let request = requests.get_request(&req_id).unwrap();
    assert_eq!(request.status.to_string(), format!("Access Given on {D3}"));
    assert_eq!(request.date_modified, D3);

    let since = requests
        .get_requests_modified_on_or_after(D3)
        .unwrap()
        .map(|r| r.unwrap().req_id)
        .collect::<Vec<_>>();
    assert_eq!(since, [req_id.clone()]);
    assert!(
        requests
            .search_by_index("date", D2)
            .unwrap()
            .next()
            .is_none()
    );
    assert!(records.verify_indexes().unwrap().is_consistent());
    assert!(requests.verify_indexes().unwrap().is_consistent());
}

#[test]
fn grant_resumes_after_interrupted_transition() {
    let (store, faults) = FaultyKvStore::new();
    let (mut records, mut requests, req_id) = setup(store);

    // the record copy lands, the request transition does not
    faults.fail_after(0);
    let err = AccessWorkflow::new(&mut requests, &mut records)
        .grant_access("o1", &req_id, "for-r1", D3)
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::Store);
    assert!(records.get_record("c1o1r1").is_ok());

    faults.heal();
    assert!(requests.get_request(&req_id).unwrap().status.is_pending());

    let outcome = AccessWorkflow::new(&mut requests, &mut records)
        .grant_access("o1", &req_id, "for-r1", D3)
        .unwrap();
    assert_eq!(
        outcome,
        GrantOutcome::Resumed {
            rec_id: "c1o1r1".to_string()
        }
    );
    assert_eq!(
        requests.get_request(&req_id).unwrap().status,
        RequestStatus::AccessGiven { on: D3.to_string() }
    );

    // a third run changes nothing
    let again = AccessWorkflow::new(&mut requests, &mut records)
        .grant_access("o1", &req_id, "for-r1", D3)
        .unwrap();
    assert_eq!(again.rec_id(), "c1o1r1");
    assert_eq!(records.get_record("c1o1r1").unwrap().enc_data, "for-r1");
    assert!(requests.verify_indexes().unwrap().is_consistent());
}

#[test]
fn non_owner_cannot_grant() {
    let (mut records, mut requests, req_id) = setup(MemoryKvStore::new());

    let err = AccessWorkflow::new(&mut requests, &mut records)
        .grant_access("r1", &req_id, "for-r1", D3)
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::NotAuthorized);
    assert!(records.get_record("c1o1r1").unwrap_err().is_not_found());
    assert!(requests.get_request(&req_id).unwrap().status.is_pending());
}

#[test]
fn grant_on_missing_request_is_not_found() {
    let (mut records, mut requests, _) = setup(MemoryKvStore::new());

    let err = AccessWorkflow::new(&mut requests, &mut records)
        .grant_access("o1", "nope", "x", D3)
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::NotFound);
    assert_eq!(err.origin, ErrorOrigin::Request);
}

#[test]
fn record_lookup_failure_is_upstream_error() {
    let (_, mut requests, req_id) = setup(MemoryKvStore::new());

    let err = AccessWorkflow::new(&mut requests, &mut UnreachableRecords)
        .grant_access("o1", &req_id, "x", D3)
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::UpstreamLookup);
    assert!(matches!(
        err.detail,
        Some(ErrorDetail::Upstream {
            class: ErrorClass::Store,
            ..
        })
    ));
}

#[test]
fn malformed_grant_date_is_rejected_up_front() {
    let (mut records, mut requests, req_id) = setup(MemoryKvStore::new());

    let err = AccessWorkflow::new(&mut requests, &mut records)
        .grant_access("o1", &req_id, "x", "tomorrow")
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::InvalidArgument);
    assert!(requests.get_request(&req_id).unwrap().status.is_pending());
}
