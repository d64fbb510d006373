use crate::error::{Result, StoreError};
use crate::repo::{CallHistory, ShipmentRepository};
use crate::subscribe::{Snapshot, Subscribers};
use coldchain_core::{CallId, CallRecord, ShipmentId, ShipmentRecord};
use std::cell::RefCell;
use std::sync::mpsc::Receiver;

#[derive(Default)]
pub struct MemoryShipments {
    shipments: RefCell<Vec<ShipmentRecord>>,
    subscribers: Subscribers,
}

impl MemoryShipments {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self, owner: &str) -> Snapshot {
        self.shipments
            .borrow()
            .iter()
            .filter(|s| s.owner == owner)
            .cloned()
            .collect()
    }

    fn notify(&self, owner: &str) {
        if self.subscribers.watches(owner) {
            let snapshot = self.snapshot(owner);
            self.subscribers.publish(owner, &snapshot);
        }
    }
}

impl ShipmentRepository for MemoryShipments {
    fn list(&self, owner: &str) -> Result<Vec<ShipmentRecord>> {
        Ok(self.snapshot(owner))
    }

    fn get(&self, owner: &str, id: &ShipmentId) -> Result<Option<ShipmentRecord>> {
        Ok(self
            .shipments
            .borrow()
            .iter()
            .find(|s| s.owner == owner && &s.id == id)
            .cloned())
    }

    fn create(&self, shipment: &ShipmentRecord) -> Result<()> {
        self.insert_batch(std::slice::from_ref(shipment))
    }

    fn insert_batch(&self, shipments: &[ShipmentRecord]) -> Result<()> {
        {
            let mut stored = self.shipments.borrow_mut();
            for (index, shipment) in shipments.iter().enumerate() {
                let clash = stored
                    .iter()
                    .chain(&shipments[..index])
                    .any(|s| s.owner == shipment.owner && s.id == shipment.id);
                if clash {
                    return Err(StoreError::DuplicateShipment(shipment.id.to_string()));
                }
            }
            stored.extend(shipments.iter().cloned());
        }
        let mut owners: Vec<&str> = shipments.iter().map(|s| s.owner.as_str()).collect();
        owners.sort_unstable();
        owners.dedup();
        for owner in owners {
            self.notify(owner);
        }
        Ok(())
    }

    fn update(&self, shipment: &ShipmentRecord) -> Result<()> {
        {
            let mut stored = self.shipments.borrow_mut();
            let slot = stored
                .iter_mut()
                .find(|s| s.owner == shipment.owner && s.id == shipment.id)
                .ok_or_else(|| StoreError::NotFound(shipment.id.to_string()))?;
            *slot = shipment.clone();
        }
        self.notify(&shipment.owner);
        Ok(())
    }

    fn delete(&self, owner: &str, id: &ShipmentId) -> Result<bool> {
        let removed = {
            let mut stored = self.shipments.borrow_mut();
            let before = stored.len();
            stored.retain(|s| !(s.owner == owner && &s.id == id));
            before != stored.len()
        };
        if removed {
            self.notify(owner);
        }
        Ok(removed)
    }

    fn delete_for_owner(&self, owner: &str) -> Result<usize> {
        let removed = {
            let mut stored = self.shipments.borrow_mut();
            let before = stored.len();
            stored.retain(|s| s.owner != owner);
            before - stored.len()
        };
        self.notify(owner);
        Ok(removed)
    }

    fn subscribe(&self, owner: &str) -> Result<Receiver<Snapshot>> {
        Ok(self.subscribers.add(owner, self.snapshot(owner)))
    }
}

#[derive(Default)]
pub struct MemoryCalls {
    calls: RefCell<Vec<CallRecord>>,
}

impl MemoryCalls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CallHistory for MemoryCalls {
    fn upsert(&self, call: &CallRecord) -> Result<()> {
        let mut calls = self.calls.borrow_mut();
        match calls.iter_mut().find(|existing| existing.id == call.id) {
            Some(existing) => *existing = call.clone(),
            None => calls.push(call.clone()),
        }
        Ok(())
    }

    fn get(&self, id: &CallId) -> Result<Option<CallRecord>> {
        Ok(self.calls.borrow().iter().find(|c| &c.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<CallRecord>> {
        let mut calls = self.calls.borrow().clone();
        calls.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(calls)
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryCalls, MemoryShipments};
    use crate::error::StoreErrorKind;
    use crate::repo::{CallHistory, ShipmentRepository};
    use coldchain_core::{
        CallId, CallRecord, CallStatus, Place, ShipmentId, ShipmentRecord, ShipmentStatus,
    };

    fn shipment(owner: &str, id: &str) -> ShipmentRecord {
        ShipmentRecord {
            id: ShipmentId::new(id).unwrap(),
            owner: owner.to_string(),
            number: id.to_string(),
            bill_of_lading: String::new(),
            carrier: "Maersk".to_string(),
            contents: "Vaccines".to_string(),
            status: ShipmentStatus::InTransit,
            origin: Place::from_city("Pune"),
            destination: Place::from_city("Delhi"),
            departure_time: 0,
            estimated_delivery: 7 * 86_400,
            current_temperature: Some(5.0),
            temperature_history: Vec::new(),
            journey: Vec::new(),
            alerts: Vec::new(),
            contacts: None,
            source_file: None,
        }
    }

    #[test]
    fn replace_swaps_only_the_owner_set() {
        let repo = MemoryShipments::new();
        repo.insert_batch(&[shipment("ops", "A"), shipment("ops", "B"), shipment("qa", "A")])
            .unwrap();

        let deleted = repo.replace_for_owner("ops", &[shipment("ops", "C")]).unwrap();
        assert_eq!(deleted, 2);

        let ops: Vec<String> = repo
            .list("ops")
            .unwrap()
            .into_iter()
            .map(|s| s.id.to_string())
            .collect();
        assert_eq!(ops, vec!["C"]);
        assert_eq!(repo.list("qa").unwrap().len(), 1);
    }

    #[test]
    fn default_replace_reports_partial_failure() {
        let repo = MemoryShipments::new();
        repo.create(&shipment("ops", "A")).unwrap();

        let batch = [shipment("ops", "X"), shipment("ops", "X")];
        let err = repo.replace_for_owner("ops", &batch).unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::ReplaceFailed);
        assert!(repo.list("ops").unwrap().is_empty());
    }

    #[test]
    fn subscribe_streams_snapshots() {
        let repo = MemoryShipments::new();
        let rx = repo.subscribe("ops").unwrap();
        assert!(rx.recv().unwrap().is_empty());

        repo.create(&shipment("ops", "A")).unwrap();
        assert_eq!(rx.recv().unwrap().len(), 1);

        repo.create(&shipment("qa", "B")).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn calls_upsert_by_id() {
        let calls = MemoryCalls::new();
        let mut record = CallRecord {
            id: CallId::new("CA1").unwrap(),
            to: "+15550001111".to_string(),
            from: "system".to_string(),
            status: CallStatus::Queued,
            duration: 0,
            timestamp: 10,
            message: "alert".to_string(),
            shipment_details: None,
        };
        calls.upsert(&record).unwrap();
        record.status = CallStatus::Completed;
        calls.upsert(&record).unwrap();

        assert_eq!(calls.len(), 1);
        let stored = calls.get(&record.id).unwrap().unwrap();
        assert_eq!(stored.status, CallStatus::Completed);
    }
}
