use coldchain_core::{CallId, CallRecord, CallStatus, ShipmentDetails, ShipmentId};
use coldchain_store::{CallHistory, Store};

fn record(id: &str, timestamp: i64) -> CallRecord {
    CallRecord {
        id: CallId::new(id).expect("call id"),
        to: "+917993557149".to_string(),
        from: "system".to_string(),
        status: CallStatus::Queued,
        duration: 0,
        timestamp,
        message: "Temperature alert".to_string(),
        shipment_details: Some(ShipmentDetails {
            shipment_id: Some(ShipmentId::new("SH-1").expect("shipment id")),
            number: Some("NUM-1".to_string()),
            contents: None,
            temperature: Some(9.5),
            location: Some("Muscat".to_string()),
        }),
    }
}

#[test]
fn calls_upsert_and_list_newest_first() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    let calls = store.calls("ops");

    calls.upsert(&record("CA-1", 100)).expect("upsert");
    calls.upsert(&record("CA-2", 200)).expect("upsert");

    let mut updated = record("CA-1", 100);
    updated.status = CallStatus::Completed;
    updated.duration = 42;
    calls.upsert(&updated).expect("upsert again");

    let listed = calls.list().expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id.as_str(), "CA-2");
    assert_eq!(listed[1], updated);

    assert!(store.calls("qa").list().expect("other owner").is_empty());
    assert_eq!(calls.clear().expect("clear"), 2);
}

#[test]
fn calls_without_details_round_trip() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    let calls = store.calls("ops");

    let mut bare = record("local_abc", 5);
    bare.shipment_details = None;
    bare.status = CallStatus::Failed;
    calls.upsert(&bare).expect("upsert");

    let loaded = calls
        .get(&bare.id)
        .expect("get")
        .expect("stored call");
    assert_eq!(loaded, bare);
}
