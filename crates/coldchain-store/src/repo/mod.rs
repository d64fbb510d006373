pub mod calls;
pub mod shipments;

pub use calls::CallsRepo;
pub use shipments::ShipmentsRepo;

use crate::error::{Result, StoreError};
use crate::subscribe::Snapshot;
use coldchain_core::{CallId, CallRecord, ShipmentId, ShipmentRecord};
use std::sync::mpsc::Receiver;

/// Document-store view of the shipment collection, scoped by owner.
pub trait ShipmentRepository {
    fn list(&self, owner: &str) -> Result<Vec<ShipmentRecord>>;

    fn get(&self, owner: &str, id: &ShipmentId) -> Result<Option<ShipmentRecord>>;

    fn create(&self, shipment: &ShipmentRecord) -> Result<()>;

    /// Appends all shipments or none of them.
    fn insert_batch(&self, shipments: &[ShipmentRecord]) -> Result<()>;

    /// Overwrites the stored shipment with the same owner and id.
    fn update(&self, shipment: &ShipmentRecord) -> Result<()>;

    fn delete(&self, owner: &str, id: &ShipmentId) -> Result<bool>;

    fn delete_for_owner(&self, owner: &str) -> Result<usize>;

    /// Receives the owner's current set immediately, then again after every write.
    fn subscribe(&self, owner: &str) -> Result<Receiver<Snapshot>>;

    /// Swaps the owner's whole set for `shipments`, returning how many were removed.
    ///
    /// The default runs the two steps in sequence. A failed insert after a
    /// successful delete is reported as [`StoreError::ReplaceFailed`].
    fn replace_for_owner(&self, owner: &str, shipments: &[ShipmentRecord]) -> Result<usize> {
        let deleted = self.delete_for_owner(owner)?;
        self.insert_batch(shipments)
            .map_err(|source| StoreError::ReplaceFailed {
                deleted,
                source: Box::new(source),
            })?;
        Ok(deleted)
    }
}

/// Local record of placed calls, upserted by id.
pub trait CallHistory {
    fn upsert(&self, call: &CallRecord) -> Result<()>;

    fn get(&self, id: &CallId) -> Result<Option<CallRecord>>;

    /// Newest first.
    fn list(&self) -> Result<Vec<CallRecord>>;
}
