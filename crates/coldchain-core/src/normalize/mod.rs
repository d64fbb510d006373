pub mod fields;
pub mod row;
pub mod serial;

pub use fields::{normalize_header, CanonicalField, ReadingField, ShipmentField};
pub use row::{CellValue, RawRow};
pub use serial::{serial_to_timestamp, DEFAULT_REPORTING_OFFSET_SECS};
