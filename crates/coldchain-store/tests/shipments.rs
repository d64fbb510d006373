use coldchain_core::{
    Alert, AlertId, AlertKind, Contacts, JourneyPoint, Place, PointStatus, ShipmentId,
    ShipmentRecord, ShipmentStatus, TemperatureReading, Thresholds,
};
use coldchain_store::{ShipmentRepository, Store, StoreErrorKind};

const NOW: i64 = 1_700_000_000;

fn store() -> Store {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    store
}

fn shipment(owner: &str, id: &str) -> ShipmentRecord {
    let thresholds = Thresholds::new(2.0, 8.0).expect("thresholds");
    ShipmentRecord {
        id: ShipmentId::new(id).expect("id"),
        owner: owner.to_string(),
        number: format!("NUM-{id}"),
        bill_of_lading: "BOL-1".to_string(),
        carrier: "Blue Dart".to_string(),
        contents: "Insulin".to_string(),
        status: ShipmentStatus::Delayed,
        origin: Place::new(Some("Mumbai"), Some("India")),
        destination: Place::from_city("Dubai"),
        departure_time: NOW - 3_600,
        estimated_delivery: NOW + 86_400,
        current_temperature: Some(9.5),
        temperature_history: vec![
            TemperatureReading {
                timestamp: NOW - 3_600,
                location: "Mumbai".to_string(),
                value: 5.0,
                value_f: 41.0,
                status: PointStatus::Completed,
            },
            TemperatureReading {
                timestamp: NOW,
                location: "Muscat".to_string(),
                value: 9.5,
                value_f: 49.1,
                status: PointStatus::Current,
            },
        ],
        journey: vec![
            JourneyPoint {
                location: "Mumbai".to_string(),
                timestamp: NOW - 3_600,
                temperature: 5.0,
                status: PointStatus::Completed,
            },
            JourneyPoint {
                location: "Muscat".to_string(),
                timestamp: NOW,
                temperature: 9.5,
                status: PointStatus::Current,
            },
        ],
        alerts: vec![Alert {
            id: AlertId::new(),
            kind: AlertKind::Critical,
            message: "Temperature above maximum threshold: 9.5°C".to_string(),
            timestamp: NOW,
            location: Some("Muscat".to_string()),
            read: false,
            temperature: Some(9.5),
            threshold: Some(thresholds),
        }],
        contacts: Some(Contacts {
            sender_name: Some("Asha".to_string()),
            role: Some("Dispatcher".to_string()),
            organization: None,
            phone: Some("+911234567890".to_string()),
            email: None,
        }),
        source_file: Some("upload.xlsx".to_string()),
    }
}

#[test]
fn create_and_get_round_trips_the_aggregate() {
    let store = store();
    let original = shipment("ops", "SH-1");
    store.shipments().create(&original).expect("create");

    let loaded = store
        .shipments()
        .get("ops", &original.id)
        .expect("get")
        .expect("stored shipment");
    assert_eq!(loaded, original);
    assert!(store
        .shipments()
        .get("qa", &original.id)
        .expect("get other owner")
        .is_none());
}

#[test]
fn list_keeps_insertion_order() {
    let store = store();
    let batch = vec![
        shipment("ops", "Z"),
        shipment("ops", "A"),
        shipment("ops", "M"),
    ];
    store.shipments().insert_batch(&batch).expect("insert");
    store
        .shipments()
        .create(&shipment("ops", "B"))
        .expect("create");

    let ids: Vec<String> = store
        .shipments()
        .list("ops")
        .expect("list")
        .into_iter()
        .map(|s| s.id.to_string())
        .collect();
    assert_eq!(ids, vec!["Z", "A", "M", "B"]);
}

#[test]
fn insert_batch_is_all_or_nothing() {
    let store = store();
    let batch = vec![shipment("ops", "A"), shipment("ops", "A")];
    let err = store.shipments().insert_batch(&batch).unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::DuplicateShipment);
    assert_eq!(store.shipments().count_for_owner("ops").expect("count"), 0);
}

#[test]
fn replace_for_owner_is_atomic() {
    let store = store();
    store
        .shipments()
        .insert_batch(&[shipment("ops", "OLD-1"), shipment("ops", "OLD-2")])
        .expect("seed");

    let bad = vec![shipment("ops", "NEW"), shipment("ops", "NEW")];
    let err = store
        .shipments()
        .replace_for_owner("ops", &bad)
        .unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::DuplicateShipment);
    assert_eq!(store.shipments().count_for_owner("ops").expect("count"), 2);

    let deleted = store
        .shipments()
        .replace_for_owner("ops", &[shipment("ops", "NEW")])
        .expect("replace");
    assert_eq!(deleted, 2);
    let ids: Vec<String> = store
        .shipments()
        .list("ops")
        .expect("list")
        .into_iter()
        .map(|s| s.id.to_string())
        .collect();
    assert_eq!(ids, vec!["NEW"]);
}

#[test]
fn update_rewrites_children() {
    let store = store();
    let mut record = shipment("ops", "SH-1");
    store.shipments().create(&record).expect("create");

    record.alerts[0].read = true;
    record.temperature_history.pop();
    record.status = ShipmentStatus::Delivered;
    store.shipments().update(&record).expect("update");

    let loaded = store
        .shipments()
        .get("ops", &record.id)
        .expect("get")
        .expect("stored");
    assert!(loaded.alerts[0].read);
    assert_eq!(loaded.temperature_history.len(), 1);
    assert_eq!(loaded.status, ShipmentStatus::Delivered);

    let missing = shipment("ops", "NOPE");
    let err = store.shipments().update(&missing).unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::NotFound);
}

#[test]
fn delete_cascades_children() {
    let store = store();
    let record = shipment("ops", "SH-1");
    store.shipments().create(&record).expect("create");

    assert!(store.shipments().delete("ops", &record.id).expect("delete"));
    assert!(!store.shipments().delete("ops", &record.id).expect("delete again"));

    let orphans: i64 = store
        .connection()
        .query_row("SELECT COUNT(*) FROM shipment_alerts;", [], |row| row.get(0))
        .expect("count alerts");
    assert_eq!(orphans, 0);
}

#[test]
fn subscribers_receive_owner_snapshots() {
    let store = store();
    let rx = store.shipments().subscribe("ops").expect("subscribe");
    assert!(rx.recv().expect("initial snapshot").is_empty());

    store
        .shipments()
        .replace_for_owner("ops", &[shipment("ops", "A"), shipment("ops", "B")])
        .expect("replace");
    assert_eq!(rx.recv().expect("after replace").len(), 2);

    store
        .shipments()
        .create(&shipment("qa", "C"))
        .expect("other owner");
    assert!(rx.try_recv().is_err());

    store.shipments().delete_for_owner("ops").expect("clear");
    assert!(rx.recv().expect("after clear").is_empty());
}
