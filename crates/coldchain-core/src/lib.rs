pub mod domain;
pub mod error;
pub mod normalize;
pub mod rules;
pub mod time;

pub use domain::*;
pub use error::CoreError;
pub use normalize::{CellValue, RawRow, ReadingField, ShipmentField};
pub use rules::*;
