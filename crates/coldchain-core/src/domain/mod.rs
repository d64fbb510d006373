pub mod alert;
pub mod call;
pub mod ids;
pub mod journey;
pub mod phone;
pub mod shipment;

pub use alert::{Alert, AlertKind, Thresholds};
pub use call::{CallRecord, CallStatus, ShipmentDetails};
pub use ids::{AlertId, CallId, ShipmentId};
pub use journey::{JourneyPoint, PointStatus};
pub use phone::normalize_phone_target;
pub use shipment::{Contacts, Place, ShipmentRecord, ShipmentStatus, TemperatureReading};
